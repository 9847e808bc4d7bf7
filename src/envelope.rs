//! Request envelope model.
//!
//! An [`Envelope`] is the typed form of one gateway request: a control block
//! identifying the sender, an authentication block, and a single function
//! invocation. [`Envelope::to_tree`] renders it into the tree the
//! [`codec`](crate::codec) serializes.

use serde_json::{json, Map, Value};

/// Protocol version sent in every control block.
pub const DTD_VERSION: &str = "3.0";

/// The control block: sender identity and protocol flags.
#[derive(Clone)]
pub struct Control {
    sender_id: String,
    sender_password: String,
    control_id: String,
}

impl Control {
    /// Creates a control block with a fresh timestamp correlation id.
    pub fn new(sender_id: impl Into<String>, sender_password: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            sender_password: sender_password.into(),
            control_id: chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        }
    }

    /// The per-call correlation id.
    pub fn control_id(&self) -> &str {
        &self.control_id
    }

    fn to_tree(&self) -> Value {
        json!({
            "senderid": self.sender_id,
            "password": self.sender_password,
            "controlid": self.control_id,
            "uniqueid": false,
            "dtdversion": DTD_VERSION,
            "includewhitespace": false,
        })
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("sender_id", &self.sender_id)
            .field("sender_password", &crate::redact::MASK)
            .field("control_id", &self.control_id)
            .finish()
    }
}

/// How a request authenticates.
#[derive(Clone)]
pub enum Authentication {
    /// The login triple, used once to open a session.
    Login {
        /// User id
        user_id: String,
        /// Company id
        company_id: String,
        /// User password
        password: String,
        /// Entity to log into, for location-scoped logins
        location_id: Option<String>,
    },
    /// A session id issued by the login handshake.
    Session(String),
}

impl Authentication {
    fn to_tree(&self) -> Value {
        match self {
            Authentication::Login {
                user_id,
                company_id,
                password,
                location_id,
            } => {
                let mut login = Map::new();
                login.insert("userid".to_string(), json!(user_id));
                login.insert("companyid".to_string(), json!(company_id));
                login.insert("password".to_string(), json!(password));
                if let Some(location_id) = location_id {
                    login.insert("locationid".to_string(), json!(location_id));
                }
                json!({ "login": login })
            }
            Authentication::Session(session_id) => json!({ "sessionid": session_id }),
        }
    }
}

impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authentication::Login {
                user_id,
                company_id,
                location_id,
                ..
            } => f
                .debug_struct("Login")
                .field("user_id", user_id)
                .field("company_id", company_id)
                .field("password", &crate::redact::MASK)
                .field("location_id", location_id)
                .finish(),
            Authentication::Session(_) => f.debug_tuple("Session").field(&crate::redact::MASK).finish(),
        }
    }
}

/// A single function invocation, keyed by its own correlation id.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    control_id: String,
    verb: String,
    payload: Value,
}

impl Function {
    /// Creates a function invocation with a fresh UUID correlation id.
    pub fn new(verb: impl Into<String>, payload: Value) -> Self {
        Self {
            control_id: uuid::Uuid::new_v4().to_string(),
            verb: verb.into(),
            payload,
        }
    }

    /// The function's correlation id.
    pub fn control_id(&self) -> &str {
        &self.control_id
    }

    /// The function name.
    pub fn verb(&self) -> &str {
        &self.verb
    }

    fn to_tree(&self) -> Value {
        let mut function = Map::new();
        function.insert("@controlid".to_string(), json!(self.control_id));
        function.insert(self.verb.clone(), self.payload.clone());
        Value::Object(function)
    }
}

/// A complete request envelope.
#[derive(Debug, Clone)]
pub struct Envelope {
    control: Control,
    authentication: Authentication,
    function: Function,
}

impl Envelope {
    /// Assembles an envelope around exactly one function.
    pub fn new(control: Control, authentication: Authentication, function: Function) -> Self {
        Self {
            control,
            authentication,
            function,
        }
    }

    /// The function this envelope carries.
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Renders the envelope as a tree rooted at `request`.
    pub fn to_tree(&self) -> Value {
        json!({
            "request": {
                "control": self.control.to_tree(),
                "operation": {
                    "authentication": self.authentication.to_tree(),
                    "content": {
                        "function": self.function.to_tree(),
                    },
                },
            }
        })
    }
}

/// Formats a timestamp the way the gateway expects dates in payloads
/// (`MM/DD/YYYY HH:MM:SS`).
pub fn format_date(datetime: chrono::NaiveDateTime) -> String {
    datetime.format("%m/%d/%Y %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_envelope_shape() {
        let envelope = Envelope::new(
            Control::new("acme", "sender-secret"),
            Authentication::Session("sess-1".to_string()),
            Function::new("lookup", json!({"object": "APBILL"})),
        );
        let tree = envelope.to_tree();
        let request = &tree["request"];

        assert_eq!(request["control"]["senderid"], "acme");
        assert_eq!(request["control"]["password"], "sender-secret");
        assert_eq!(request["control"]["dtdversion"], "3.0");
        assert_eq!(request["control"]["uniqueid"], false);
        assert_eq!(request["operation"]["authentication"], json!({"sessionid": "sess-1"}));

        let function = request["operation"]["content"]["function"].as_object().unwrap();
        assert_eq!(function.len(), 2);
        assert_eq!(function["@controlid"], envelope.function().control_id());
        assert_eq!(function["lookup"], json!({"object": "APBILL"}));
    }

    #[test]
    fn test_login_block_location() {
        let login = |location_id: Option<&str>| Authentication::Login {
            user_id: "u".to_string(),
            company_id: "c".to_string(),
            password: "p".to_string(),
            location_id: location_id.map(str::to_string),
        };

        assert_eq!(
            login(Some("LOC1")).to_tree(),
            json!({"login": {"userid": "u", "companyid": "c", "password": "p", "locationid": "LOC1"}})
        );
        assert_eq!(
            login(None).to_tree(),
            json!({"login": {"userid": "u", "companyid": "c", "password": "p"}})
        );
    }

    #[test]
    fn test_function_ids_are_unique() {
        let a = Function::new("read", Value::Null);
        let b = Function::new("read", Value::Null);
        assert_ne!(a.control_id(), b.control_id());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let control = Control::new("acme", "sender-secret");
        let auth = Authentication::Session("sess-1".to_string());
        assert!(!format!("{:?}", control).contains("sender-secret"));
        assert!(!format!("{:?}", auth).contains("sess-1"));
    }

    #[test]
    fn test_format_date() {
        let datetime = chrono::NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 1)
            .unwrap();
        assert_eq!(format_date(datetime), "03/07/2024 09:05:01");
    }
}
