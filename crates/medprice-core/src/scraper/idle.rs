//! Waiting for a page's network traffic to settle.
//!
//! A page counts as idle once no more than `max_in_flight` requests have been
//! outstanding for a whole `quiet_window`.

use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleOptions {
    pub max_in_flight: usize,
    pub quiet_window: Duration,
}

impl Default for IdleOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 2,
            quiet_window: Duration::from_millis(500),
        }
    }
}

/// Request lifecycle events, keyed by the browser's request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    Started(String),
    Finished(String),
    Failed(String),
}

/// Resolves once the in-flight count has stayed at or below the limit for
/// the whole quiet window, or when the stream ends. Never errors; the caller
/// bounds the total wait.
pub async fn wait_for_network_idle<S>(events: &mut S, options: IdleOptions)
where
    S: Stream<Item = NetworkEvent> + Unpin,
{
    let mut in_flight: HashSet<String> = HashSet::new();
    // Set while under the limit; only crossing above it clears the window.
    let mut deadline = Some(Instant::now() + options.quiet_window);

    loop {
        let next = match deadline {
            Some(at) => tokio::select! {
                _ = tokio::time::sleep_until(at) => return,
                next = events.next() => next,
            },
            None => events.next().await,
        };

        match next {
            Some(NetworkEvent::Started(id)) => {
                in_flight.insert(id);
            }
            Some(NetworkEvent::Finished(id)) | Some(NetworkEvent::Failed(id)) => {
                in_flight.remove(&id);
            }
            None => return,
        }

        if in_flight.len() > options.max_in_flight {
            deadline = None;
        } else if deadline.is_none() {
            deadline = Some(Instant::now() + options.quiet_window);
        }
        trace!("{} requests in flight", in_flight.len());
    }
}
