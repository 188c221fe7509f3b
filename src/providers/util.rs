use anyhow::Result;
use reqwest::Response;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Sends a request, retrying on transport errors and 5xx responses.
///
/// `retries` counts the extra attempts after the first one. When every attempt
/// fails, the last transport error is returned; a last 5xx response is handed
/// back as-is so the caller can report its status.
pub async fn send_with_retry<F, Fut>(mut send: F, retries: usize, delay_ms: u64) -> Result<Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let outcome = send().await;
        let retryable = match &outcome {
            Ok(response) => response.status().is_server_error(),
            Err(e) => !e.is_builder(),
        };

        if !retryable || attempt > retries {
            return Ok(outcome?);
        }

        match &outcome {
            Ok(response) => debug!(attempt, status = %response.status(), "Server error, retrying"),
            Err(e) => debug!(attempt, error = %e, "Request failed, retrying"),
        }
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
