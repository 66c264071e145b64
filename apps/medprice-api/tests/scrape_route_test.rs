use async_trait::async_trait;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use medprice_api::routes::{scrape, AppState, ScrapeRequest};
use medprice_api::{Server, Settings};
use medprice_core::scraper::service::PriceService;
use medprice_core::{
    DetailExtractor, DetailResult, ExtractError, SearchExtractor, SearchOutcome, SearchResult,
    NO_LINK,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Calls {
    search: AtomicUsize,
    detail: AtomicUsize,
}

struct FixtureSearch {
    link: Option<&'static str>,
    calls: Arc<Calls>,
}

#[async_trait]
impl SearchExtractor for FixtureSearch {
    async fn search(&self, medicine: &str) -> Result<SearchOutcome, ExtractError> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        match self.link {
            Some(link) => Ok(SearchOutcome::Found(SearchResult {
                name: format!("{medicine} 500mg Tablet"),
                discount: "No Discount".to_string(),
                link: link.to_string(),
            })),
            None => Err(ExtractError::Status(502)),
        }
    }
}

struct FixtureDetail {
    fail: bool,
    calls: Arc<Calls>,
}

#[async_trait]
impl DetailExtractor for FixtureDetail {
    async fn details(&self, _url: &str) -> Result<DetailResult, ExtractError> {
        self.calls.detail.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ExtractError::NavigationTimeout(Duration::from_secs(60)));
        }
        Ok(DetailResult {
            strip_size: "Strip of 10 Tablets".to_string(),
            total_price: "Rs. 35.00".to_string(),
        })
    }
}

fn service(link: Option<&'static str>, fail_detail: bool) -> (PriceService, Arc<Calls>) {
    let calls = Arc::new(Calls::default());
    let service = PriceService::new(
        Arc::new(FixtureSearch {
            link,
            calls: calls.clone(),
        }),
        Arc::new(FixtureDetail {
            fail: fail_detail,
            calls: calls.clone(),
        }),
    );
    (service, calls)
}

async fn call(price_service: PriceService, medicine: Option<&str>) -> (StatusCode, Value) {
    let state = Arc::new(AppState { price_service });
    let request = ScrapeRequest {
        medicine: medicine.map(str::to_string),
    };
    let response = scrape(State(state), Ok(Json(request))).await.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_successful_lookup_returns_five_string_fields() {
    let (service, calls) = service(Some("https://dawaai.pk/medicine/panadol"), false);

    let (status, body) = call(service, Some("Panadol")).await;

    assert_eq!(status, StatusCode::OK);
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 5);
    for key in ["name", "discount", "link", "stripSize", "totalPrice"] {
        assert!(object[key].is_string(), "{key} should be a string");
    }
    assert_eq!(body["totalPrice"], "Rs. 35.00");
    assert_eq!(calls.detail.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_medicine_is_bad_request() {
    for medicine in [None, Some("")] {
        let (service, calls) = service(Some("https://dawaai.pk/medicine/panadol"), false);

        let (status, body) = call(service, medicine).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Please provide a medicine name in the request body."
        );
        assert_eq!(calls.search.load(Ordering::SeqCst), 0);
        assert_eq!(calls.detail.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_no_link_is_server_error_without_detail_call() {
    let (service, calls) = service(Some(NO_LINK), false);

    let (status, body) = call(service, Some("Panadol")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Error fetching search data or missing product link"
    );
    assert_eq!(calls.detail.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_failure_is_server_error() {
    let (service, _) = service(None, false);

    let (status, body) = call(service, Some("Panadol")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Error fetching search data or missing product link"
    );
}

#[tokio::test]
async fn test_detail_failure_is_server_error() {
    let (service, _) = service(Some("https://dawaai.pk/medicine/panadol"), true);

    let (status, body) = call(service, Some("Panadol")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Error fetching product details");
}

#[tokio::test]
async fn test_same_input_gives_identical_json() {
    let (first, _) = service(Some("https://dawaai.pk/medicine/panadol"), false);
    let (second, _) = service(Some("https://dawaai.pk/medicine/panadol"), false);

    let (_, a) = call(first, Some("Panadol")).await;
    let (_, b) = call(second, Some("Panadol")).await;

    assert_eq!(serde_json::to_vec(&a).unwrap(), serde_json::to_vec(&b).unwrap());
}

#[tokio::test]
async fn test_served_router_handles_json_and_cors() {
    let (service, calls) = service(Some("https://dawaai.pk/medicine/panadol"), false);
    let server = Server::with_service(Settings::default(), service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server.router();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/scrape"))
        .json(&serde_json::json!({ "medicine": "Panadol" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Panadol 500mg Tablet");

    let response = client
        .post(format!("http://{addr}/scrape"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = client
        .request(reqwest::Method::OPTIONS, format!("http://{addr}/scrape"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

    assert_eq!(calls.search.load(Ordering::SeqCst), 1);
}

#[test]
fn test_truthy_scalars_are_accepted_as_names() {
    let parse = |body: &str| serde_json::from_str::<ScrapeRequest>(body).unwrap().medicine;

    assert_eq!(parse(r#"{"medicine": "Brufen"}"#).as_deref(), Some("Brufen"));
    assert_eq!(parse(r#"{"medicine": 500}"#).as_deref(), Some("500"));
    assert_eq!(parse(r#"{"medicine": true}"#).as_deref(), Some("true"));
    for falsy in [
        r#"{"medicine": ""}"#,
        r#"{"medicine": 0}"#,
        r#"{"medicine": false}"#,
        r#"{"medicine": null}"#,
        r#"{}"#,
    ] {
        assert_eq!(parse(falsy), None, "{falsy} should count as missing");
    }
}

#[tokio::test]
async fn test_numeric_medicine_is_searched_and_health_route_is_absent() {
    let (service, calls) = service(Some("https://dawaai.pk/medicine/panadol"), false);
    let server = Server::with_service(Settings::default(), service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server.router();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/scrape"))
        .json(&serde_json::json!({ "medicine": 500 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "500 500mg Tablet");
    assert_eq!(calls.search.load(Ordering::SeqCst), 1);

    let response = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}
