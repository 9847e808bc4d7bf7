//! Connector settings as they arrive from the embedding application.

use crate::{session::Credentials, Error, Result};
use serde::Deserialize;

/// The public XML gateway.
pub const DEFAULT_API_URL: &str = "https://api.intacct.com/ia/xml/xmlgw.phtml";

/// Connector configuration.
///
/// # Examples
///
/// ```
/// use intacct_link::Config;
///
/// let config = Config::from_json(r#"{
///     "company_id": "acme",
///     "sender_id": "acme-sender",
///     "sender_password": "s3cret",
///     "user_id": "xml_user",
///     "user_password": "hunter2"
/// }"#).unwrap();
///
/// assert_eq!(config.api_url, intacct_link::config::DEFAULT_API_URL);
/// assert!(!config.use_locations);
/// ```
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Gateway URL used for the login handshake.
    #[serde(default = "default_api_url")]
    pub api_url: String,
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
    /// Sent as `User-Agent` when present
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Log into `location_id` rather than the top-level company
    #[serde(default)]
    pub use_locations: bool,
    /// Entity to log into
    #[serde(default)]
    pub location_id: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Config {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigurationError(format!("Invalid configuration: {}", e)))
    }

    /// The login credentials this configuration describes.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            company_id: self.company_id.clone(),
            sender_id: self.sender_id.clone(),
            sender_password: self.sender_password.clone(),
            user_id: self.user_id.clone(),
            user_password: self.user_password.clone(),
            location_id: self.location_id.clone(),
            use_locations: self.use_locations,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("credentials", &self.credentials())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
