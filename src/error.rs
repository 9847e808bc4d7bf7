//! Error types for gateway calls.
//!
//! Every failure the client can report is a variant of [`Error`]. Failures the
//! gateway itself reports (bad parameters, bad credentials, expired sessions and
//! so on) are grouped under [`Error::Api`] and told apart by [`ApiErrorKind`],
//! so callers can match on the kind without caring whether it arrived as an
//! HTTP status or inside a `200 OK` body.

use crate::codec::CodecError;
use http::StatusCode;
use serde_json::Value;
use std::fmt;

/// The main error type for gateway calls.
///
/// # Examples
///
/// ```no_run
/// use intacct_link::{ApiErrorKind, Client, Error};
///
/// # async fn example(client: Client) -> Result<(), Error> {
/// match client.query_single("APBILL", &["RECORDNO"], None).await {
///     Ok(Some(bill)) => println!("found {}", bill),
///     Ok(None) => println!("no such bill"),
///     Err(Error::Api { kind: ApiErrorKind::ExpiredToken, .. }) => {
///         eprintln!("session expired, build a new client");
///     }
///     Err(e) => eprintln!("call failed: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection refused, broken exchange, etc.).
    ///
    /// These are retried by the transport before they reach the caller.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The response body could not be parsed as an XML envelope.
    #[error("Error: {raw_response}, Status code: {}", .status.as_u16())]
    MalformedResponse {
        /// The raw response body
        raw_response: String,
        /// The HTTP status code
        status: StatusCode,
        /// Why the body was rejected
        reason: String,
    },

    /// The gateway rejected the call, either through the HTTP status or
    /// through a failure status inside the envelope.
    #[error("{kind}: {details}")]
    Api {
        /// What kind of rejection this is
        kind: ApiErrorKind,
        /// The HTTP status code the response arrived with
        status: StatusCode,
        /// The server-supplied error payload, `null` if there was none
        details: Value,
    },

    /// Catch-all for failures that do not map onto an [`ApiErrorKind`],
    /// including a failed login handshake.
    #[error("Error: {message}: {details}")]
    Sdk {
        /// What went wrong
        message: String,
        /// The server-supplied error payload, `null` if there was none
        details: Value,
    },

    /// A `200 OK` response whose statuses matched none of the known outcomes.
    #[error("Unexpected response shape: {response}")]
    UnexpectedResponse {
        /// The full decoded response tree
        response: Value,
    },

    /// Maximum number of retries was exceeded.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// The number of attempts made
        attempts: usize,
        /// The last error encountered
        last_error: Box<Error>,
    },

    /// The request tree could not be encoded as an envelope.
    #[error("Failed to encode request: {0}")]
    Encode(#[from] CodecError),

    /// The operation handed to the client is not usable.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Invalid configuration was provided.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided or returned by the login handshake.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Maps a transport error from `reqwest`, separating timeouts out.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(err)
        }
    }

    /// Returns `true` for network-level faults, the only failures the
    /// transport retries.
    ///
    /// # Examples
    ///
    /// ```
    /// use intacct_link::{ApiErrorKind, Error};
    /// use http::StatusCode;
    ///
    /// assert!(Error::Timeout.is_retryable());
    ///
    /// let err = Error::Api {
    ///     kind: ApiErrorKind::InternalServerError,
    ///     status: StatusCode::INTERNAL_SERVER_ERROR,
    ///     details: serde_json::Value::Null,
    /// };
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout)
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::MalformedResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::MalformedResponse { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns the gateway rejection kind, if this is an [`Error::Api`].
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns the server-supplied error payload, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Error::Api { details, .. } | Error::Sdk { details, .. } => Some(details),
            Error::UnexpectedResponse { response } => Some(response),
            _ => None,
        }
    }
}

/// The kinds of rejection the gateway reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// HTTP 400, or a `failure` control status in a `200 OK` body.
    WrongParams,
    /// HTTP 401, or a `failure` authentication status in a `200 OK` body.
    InvalidToken,
    /// HTTP 498.
    ExpiredToken,
    /// HTTP 403.
    NoPrivilege,
    /// HTTP 404.
    NotFound,
    /// HTTP 500.
    InternalServerError,
}

impl ApiErrorKind {
    /// Maps an HTTP status onto the rejection kind it signals.
    ///
    /// Returns `None` for `200 OK` and for statuses outside the gateway's
    /// contract.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            400 => Some(ApiErrorKind::WrongParams),
            401 => Some(ApiErrorKind::InvalidToken),
            403 => Some(ApiErrorKind::NoPrivilege),
            404 => Some(ApiErrorKind::NotFound),
            498 => Some(ApiErrorKind::ExpiredToken),
            500 => Some(ApiErrorKind::InternalServerError),
            _ => None,
        }
    }

    /// A short human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorKind::WrongParams => "Some of the parameters are wrong",
            ApiErrorKind::InvalidToken => "Invalid token / Incorrect credentials",
            ApiErrorKind::ExpiredToken => "Expired token, try to refresh it",
            ApiErrorKind::NoPrivilege => "Forbidden, the user has insufficient privilege",
            ApiErrorKind::NotFound => "Not found item with ID",
            ApiErrorKind::InternalServerError => "Internal server error",
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A specialized `Result` type for gateway calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (400, Some(ApiErrorKind::WrongParams)),
            (401, Some(ApiErrorKind::InvalidToken)),
            (403, Some(ApiErrorKind::NoPrivilege)),
            (404, Some(ApiErrorKind::NotFound)),
            (498, Some(ApiErrorKind::ExpiredToken)),
            (500, Some(ApiErrorKind::InternalServerError)),
            (200, None),
            (502, None),
            (429, None),
        ];

        for (code, expected) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(ApiErrorKind::from_status(status), expected, "status {}", code);
        }
    }

    #[test]
    fn test_malformed_response_display() {
        let err = Error::MalformedResponse {
            raw_response: "<html>oops".to_string(),
            status: StatusCode::OK,
            reason: "unexpected end of stream".to_string(),
        };
        assert_eq!(err.to_string(), "Error: <html>oops, Status code: 200");
        assert_eq!(err.raw_response(), Some("<html>oops"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_api_error_accessors() {
        let err = Error::Api {
            kind: ApiErrorKind::NotFound,
            status: StatusCode::NOT_FOUND,
            details: Value::String("no such record".to_string()),
        };
        assert_eq!(err.api_kind(), Some(ApiErrorKind::NotFound));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.details(), Some(&Value::String("no such record".to_string())));
        assert!(err.to_string().starts_with("Not found item with ID"));
    }
}
