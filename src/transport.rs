//! The HTTP exchange behind every gateway call.
//!
//! [`Transport::send`] encodes an envelope tree, passes the rate gate, posts
//! the body, retries network faults, then decodes and classifies whatever came
//! back. Only the redacted envelope is ever logged.

use crate::{
    classify::classify,
    codec,
    rate_limit::RateLimiter,
    redact::redact,
    retry::{RetryPredicate, RetryStrategy},
    Error, Response, Result,
};
use http::{HeaderMap, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

/// Marker whose presence in a request body means it carries attachment data.
///
/// Such requests and their responses are logged by status only.
pub(crate) const ATTACHMENT_MARKER: &str = "attachmentdata";

/// Sends envelopes to the gateway.
pub(crate) struct Transport {
    http_client: reqwest::Client,
    headers: HeaderMap,
    retry_strategy: RetryStrategy,
    retry_predicate: Box<dyn RetryPredicate>,
    timeout: Option<Duration>,
    rate_limiter: RateLimiter,
}

impl Transport {
    pub(crate) fn new(
        http_client: reqwest::Client,
        headers: HeaderMap,
        retry_strategy: RetryStrategy,
        retry_predicate: Box<dyn RetryPredicate>,
        timeout: Option<Duration>,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            http_client,
            headers,
            retry_strategy,
            retry_predicate,
            timeout,
            rate_limiter,
        }
    }

    /// Sends one envelope tree to `url` and returns the classified
    /// `operation` tree.
    ///
    /// Network faults are retried according to the retry strategy; every
    /// attempt waits on the rate gate first. Anything that produced an HTTP
    /// response is classified and returned or raised without a retry; a body
    /// that does not parse is [`Error::MalformedResponse`] whatever its status.
    pub(crate) async fn send(&self, url: &Url, envelope: &Value) -> Result<Response<Value>> {
        let body = codec::encode(envelope)?;
        let carries_attachment = contains_marker(&body);

        if !carries_attachment {
            tracing::info!(url = %url, request = %redact(envelope), "Sending request");
        }

        let start_time = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.rate_limiter.acquire().await;

            match self.execute_request(url, &body, attempt).await {
                Ok((status, headers, raw_body)) => {
                    let latency = start_time.elapsed();
                    return self.parse_response(
                        status,
                        headers,
                        raw_body,
                        carries_attachment,
                        latency,
                        attempt,
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt,
                        url = %url,
                        "Request failed"
                    );

                    if !self.retry_predicate.should_retry(&e, attempt) {
                        return Err(e);
                    }

                    match self.retry_strategy.delay_for_attempt(attempt) {
                        Some(delay) => {
                            tracing::info!(
                                delay_ms = delay.as_millis(),
                                attempt = attempt,
                                "Retrying request after delay"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return Err(Error::MaxRetriesExceeded {
                                attempts: attempt,
                                last_error: Box::new(e),
                            });
                        }
                    }
                }
            }
        }
    }

    /// Executes a single attempt, reading the whole body.
    async fn execute_request(
        &self,
        url: &Url,
        body: &[u8],
        attempt: usize,
    ) -> Result<(StatusCode, HeaderMap, String)> {
        tracing::debug!(url = %url, attempt = attempt, "Executing HTTP request");

        let mut request = self
            .http_client
            .post(url.clone())
            .headers(self.headers.clone())
            .body(body.to_vec());

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(Error::from_transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let raw_body = response.text().await.map_err(Error::from_transport)?;

        Ok((status, headers, raw_body))
    }

    /// Decodes and classifies a response.
    fn parse_response(
        &self,
        status: StatusCode,
        headers: HeaderMap,
        raw_body: String,
        carries_attachment: bool,
        latency: Duration,
        attempts: usize,
    ) -> Result<Response<Value>> {
        let outcome = match codec::decode(raw_body.as_bytes()) {
            Ok(tree) => {
                if carries_attachment {
                    tracing::info!(status = status.as_u16(), "Received response");
                } else {
                    tracing::info!(
                        status = status.as_u16(),
                        latency_ms = latency.as_millis(),
                        attempts = attempts,
                        response = %redact(&tree),
                        "Received response"
                    );
                }
                classify(status, &tree)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    status = status.as_u16(),
                    "Failed to decode response"
                );
                return Err(Error::MalformedResponse {
                    raw_response: raw_body,
                    status,
                    reason: e.to_string(),
                });
            }
        };

        if status != StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "Gateway rejected request");
        }

        let data = outcome.into_result()?;
        Ok(Response::new(data, raw_body, status, headers, latency, attempts))
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("retry_strategy", &self.retry_strategy)
            .field("timeout", &self.timeout)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

fn contains_marker(body: &[u8]) -> bool {
    body.windows(ATTACHMENT_MARKER.len())
        .any(|window| window == ATTACHMENT_MARKER.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_marker_detection() {
        assert!(contains_marker(b"<create_supdoc><attachmentdata>AAAA</attachmentdata>"));
        assert!(!contains_marker(b"<create><VENDOR/></create>"));
        assert!(!contains_marker(b""));
    }
}
