use axum::{
    extract::{rejection::JsonRejection, Json, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use medprice_core::scraper::service::PriceService;
use medprice_core::{CombinedResult, LookupError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub struct AppState {
    pub price_service: PriceService,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scrape", post(scrape))
        .layer(middleware::from_fn(cors))
        .with_state(state)
}

/// Allows any origin, and answers preflight requests directly.
async fn cors(req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,HEAD,PUT,PATCH,POST,DELETE"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    response
}

#[derive(Debug, Default, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default, deserialize_with = "truthy_medicine")]
    pub medicine: Option<String>,
}

/// Accepts any truthy scalar as a name: non-empty strings, non-zero numbers
/// and `true`. Everything else counts as missing.
fn truthy_medicine<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(name)) if !name.is_empty() => Some(name),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub struct ApiError(LookupError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: self.0.client_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn scrape(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<CombinedResult>, ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Unreadable scrape request body: {}", rejection);
            ScrapeRequest::default()
        }
    };

    match state.price_service.lookup(request.medicine.as_deref()).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            if matches!(e, LookupError::MissingMedicine) {
                tracing::info!("Rejected scrape request without medicine name");
            }
            Err(ApiError(e))
        }
    }
}
