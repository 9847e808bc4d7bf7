//! Payload of a successful exchange, plus how the exchange went.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A classified, successful gateway response.
///
/// The transport hands out the `operation` tree as `data`; [`Client::call`]
/// narrows that to the `result` block. Derefs to `data`.
///
/// [`Client::call`]: crate::Client::call
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The classified payload.
    pub data: T,
    /// Body text exactly as received.
    pub raw_body: String,
    /// HTTP status, always `200 OK` for a classified success.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Time from the first attempt until the body was read, backoff included.
    pub latency: Duration,
    /// HTTP attempts it took, retries of network faults included.
    pub attempts: usize,
}

impl<T> Response<T> {
    pub(crate) fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        attempts: usize,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Replaces the payload, keeping the exchange details.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        let Response {
            data,
            raw_body,
            status,
            headers,
            latency,
            attempts,
        } = self;
        Response {
            data: f(data),
            raw_body,
            status,
            headers,
            latency,
            attempts,
        }
    }

    /// Whether a network fault forced at least one retry.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}
