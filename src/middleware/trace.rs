use std::future::Future;
use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use crate::response::Response;

/// Runs `fut` inside a `request` span and logs how it ended.
///
/// Server errors log at `warn`, everything else at `info`.
pub(crate) async fn trace<F>(method: &http::Method, path: &str, fut: F) -> Response
where
    F: Future<Output = Response>,
{
    let span = info_span!("request", method = %method, path = %path);
    async move {
        let started = Instant::now();
        let response = fut.await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        if response.status_code() >= 500 {
            warn!(status = response.status_code(), latency_ms, "request failed");
        } else {
            info!(status = response.status_code(), latency_ms, "request completed");
        }
        response
    }
    .instrument(span)
    .await
}
