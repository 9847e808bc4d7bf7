//! Login handshake and the session it produces.

use crate::{
    envelope::{Authentication, Control, Envelope, Function},
    transport::Transport,
    Error, Result,
};
use serde_json::Value;
use url::Url;

/// Everything needed to log in.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Company id
    pub company_id: String,
    /// Web services sender id
    pub sender_id: String,
    /// Web services sender password
    pub sender_password: String,
    /// User id
    pub user_id: String,
    /// User password
    pub user_password: String,
    /// Entity to log into
    pub location_id: Option<String>,
    /// Whether to log into `location_id` rather than the top-level company
    pub use_locations: bool,
}

impl Credentials {
    /// A control block signed with these sender credentials.
    pub(crate) fn control(&self) -> Control {
        Control::new(&self.sender_id, &self.sender_password)
    }

    fn login(&self) -> Authentication {
        let location_id = if self.use_locations {
            self.location_id.clone().filter(|id| !id.is_empty())
        } else {
            None
        };
        Authentication::Login {
            user_id: self.user_id.clone(),
            company_id: self.company_id.clone(),
            password: self.user_password.clone(),
            location_id,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("company_id", &self.company_id)
            .field("sender_id", &self.sender_id)
            .field("sender_password", &crate::redact::MASK)
            .field("user_id", &self.user_id)
            .field("user_password", &crate::redact::MASK)
            .field("location_id", &self.location_id)
            .field("use_locations", &self.use_locations)
            .finish()
    }
}

/// An open API session: where to send calls and how to authenticate them.
#[derive(Clone)]
pub struct Session {
    endpoint: Url,
    session_id: String,
}

impl Session {
    /// Performs the login handshake against `login_url`.
    ///
    /// # Errors
    ///
    /// Any rejection of the login, or a success without session details,
    /// becomes [`Error::Sdk`]. Network faults keep their own variants once the
    /// transport has given up retrying them.
    pub(crate) async fn establish(
        transport: &Transport,
        login_url: &Url,
        credentials: &Credentials,
    ) -> Result<Self> {
        let envelope = Envelope::new(
            credentials.control(),
            credentials.login(),
            Function::new("getAPISession", Value::Null),
        );

        let response = transport
            .send(login_url, &envelope.to_tree())
            .await
            .map_err(login_failure)?;

        let api = response
            .data
            .pointer("/result/data/api")
            .ok_or_else(|| missing_session(&response.data))?;
        let endpoint = api
            .get("endpoint")
            .and_then(Value::as_str)
            .ok_or_else(|| missing_session(&response.data))?;
        let session_id = api
            .get("sessionid")
            .and_then(Value::as_str)
            .ok_or_else(|| missing_session(&response.data))?;

        let session = Self {
            endpoint: Url::parse(endpoint)?,
            session_id: session_id.to_string(),
        };
        tracing::info!(endpoint = %session.endpoint, "API session established");
        Ok(session)
    }

    /// The endpoint every call of this session goes to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub(crate) fn authentication(&self) -> Authentication {
        Authentication::Session(self.session_id.clone())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint.as_str())
            .field("session_id", &crate::redact::MASK)
            .finish()
    }
}

fn login_failure(err: Error) -> Error {
    match err {
        Error::Api { details, .. } | Error::Sdk { details, .. } => Error::Sdk {
            message: "Login failed".to_string(),
            details,
        },
        Error::UnexpectedResponse { response } => Error::Sdk {
            message: "Login failed".to_string(),
            details: response,
        },
        other => other,
    }
}

fn missing_session(operation: &Value) -> Error {
    Error::Sdk {
        message: "Login response carries no session".to_string(),
        details: operation.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(use_locations: bool, location_id: Option<&str>) -> Credentials {
        Credentials {
            company_id: "acme".to_string(),
            sender_id: "sender".to_string(),
            sender_password: "sender-secret".to_string(),
            user_id: "user".to_string(),
            user_password: "user-secret".to_string(),
            location_id: location_id.map(str::to_string),
            use_locations,
        }
    }

    #[test]
    fn test_location_only_when_enabled() {
        let with = Envelope::new(
            credentials(true, Some("LOC1")).control(),
            credentials(true, Some("LOC1")).login(),
            Function::new("getAPISession", Value::Null),
        )
        .to_tree();
        assert_eq!(
            with["request"]["operation"]["authentication"]["login"]["locationid"],
            "LOC1"
        );

        for creds in [credentials(false, Some("LOC1")), credentials(true, None), credentials(true, Some(""))] {
            let tree = Envelope::new(
                creds.control(),
                creds.login(),
                Function::new("getAPISession", Value::Null),
            )
            .to_tree();
            assert!(tree["request"]["operation"]["authentication"]["login"]
                .get("locationid")
                .is_none());
        }
    }

    #[test]
    fn test_login_failure_is_generic() {
        let err = login_failure(Error::Api {
            kind: crate::ApiErrorKind::InvalidToken,
            status: http::StatusCode::OK,
            details: Value::String("bad password".to_string()),
        });
        match err {
            Error::Sdk { message, details } => {
                assert_eq!(message, "Login failed");
                assert_eq!(details, "bad password");
            }
            other => panic!("expected Sdk, got {:?}", other),
        }

        assert!(matches!(login_failure(Error::Timeout), Error::Timeout));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", credentials(false, None));
        assert!(!debug.contains("sender-secret"));
        assert!(!debug.contains("user-secret"));
    }
}
