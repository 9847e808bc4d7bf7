//! Session-bound gateway client.
//!
//! The [`Client`] type is the main entry point. [`ClientBuilder::build`] logs
//! in before handing the client out, so every `Client` holds a live session.

use crate::{
    config::Config,
    envelope::{Envelope, Function},
    operation::Operation,
    rate_limit::{RateLimitConfig, RateLimiter},
    retry::{RetryOnRetryable, RetryPredicate, RetryStrategy},
    session::{Credentials, Session},
    transport::Transport,
    Error, Response, Result,
};
use http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A logged-in gateway client.
///
/// Cloning is cheap; clones share the session and the rate gate.
///
/// # Examples
///
/// ```no_run
/// use intacct_link::{Client, Credentials};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), intacct_link::Error> {
/// let client = Client::builder()
///     .credentials(Credentials {
///         company_id: "acme".to_string(),
///         sender_id: "acme-sender".to_string(),
///         sender_password: "s3cret".to_string(),
///         user_id: "xml_user".to_string(),
///         user_password: "hunter2".to_string(),
///         ..Default::default()
///     })
///     .build()
///     .await?;
///
/// let vendors = client.list_entities("VENDOR", &["VENDORID", "NAME"], None).await?;
/// println!("{} vendors", vendors.len());
///
/// client
///     .format_and_send_request(json!({"create": {
///         "object": "VENDOR",
///         "VENDOR": {"VENDORID": "V100", "NAME": "Acme Supplies"}
///     }}))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    transport: Transport,
    session: Session,
    credentials: Credentials,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The session this client authenticates with.
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Sends a collaborator-supplied `{verb: payload}` mapping and returns the
    /// response's `result` block.
    ///
    /// The payload's `object` entry names the target object; it is dropped
    /// from `create*` and `update*` payloads before sending.
    pub async fn format_and_send_request(&self, operation: Value) -> Result<Value> {
        self.send(Operation::from_tree(operation)?).await
    }

    /// Sends one operation and returns the response's `result` block.
    pub async fn send(&self, operation: Operation) -> Result<Value> {
        Ok(self.call(operation).await?.data)
    }

    /// Like [`send`](Self::send), but keeps the details of the HTTP exchange
    /// (raw body, headers, latency, attempts) next to the `result` block.
    ///
    /// ```no_run
    /// # use intacct_link::{Client, Operation};
    /// # async fn example(client: Client) -> Result<(), intacct_link::Error> {
    /// let response = client.call(Operation::lookup("VENDOR")).await?;
    /// if response.was_retried() {
    ///     println!("needed {} attempts ({:?})", response.attempts, response.latency);
    /// }
    /// println!("{}", response["data"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call(&self, operation: Operation) -> Result<Response<Value>> {
        let object = operation.object().unwrap_or_default().to_string();
        let (verb, payload) = operation.into_parts();
        tracing::info!(object = %object, verb = %verb, "Creating request");

        let envelope = Envelope::new(
            self.inner.credentials.control(),
            self.inner.session.authentication(),
            Function::new(verb.as_str(), payload),
        );

        let response = self
            .inner
            .transport
            .send(self.inner.session.endpoint(), &envelope.to_tree())
            .await?;

        if response.data.get("result").is_none() {
            return Err(Error::UnexpectedResponse {
                response: response.data,
            });
        }
        Ok(response.map(|mut operation| operation["result"].take()))
    }

    /// Posts a journal entry batch (`GLBATCH`).
    pub async fn post_journal(&self, journal: Value) -> Result<Value> {
        self.send(Operation::create("GLBATCH", journal)).await
    }

    /// Deletes a journal entry batch by record number.
    pub async fn delete_journal(&self, record_no: &str) -> Result<Value> {
        self.send(Operation::delete("GLBATCH", record_no)).await
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use intacct_link::{ClientBuilder, Config, RetryStrategy};
/// use std::time::Duration;
///
/// # async fn example(config: Config) -> Result<(), intacct_link::Error> {
/// let client = ClientBuilder::from_config(&config)?
///     .timeout(Duration::from_secs(60))
///     .retry_strategy(RetryStrategy::Linear {
///         delay: Duration::from_secs(2),
///         max_retries: 2,
///     })
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    api_url: Option<Url>,
    credentials: Option<Credentials>,
    headers: HeaderMap,
    retry_strategy: RetryStrategy,
    retry_predicate: Option<Box<dyn RetryPredicate>>,
    timeout: Option<Duration>,
    rate_limit_config: RateLimitConfig,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    ///
    /// Requests carry `Content-Type: application/xml`, network faults are
    /// retried with [`RetryStrategy::network_default`], and calls are limited
    /// to 10 per second.
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/xml"));

        Self {
            api_url: None,
            credentials: None,
            headers,
            retry_strategy: RetryStrategy::network_default(),
            retry_predicate: None,
            timeout: None,
            rate_limit_config: RateLimitConfig::default(),
        }
    }

    /// Starts a builder from a [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or the user agent is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::new()
            .api_url(&config.api_url)?
            .credentials(config.credentials());
        if let Some(user_agent) = &config.user_agent {
            builder = builder.header("User-Agent", user_agent)?;
        }
        Ok(builder)
    }

    /// Sets the gateway URL used for the login handshake.
    ///
    /// Defaults to [`DEFAULT_API_URL`](crate::config::DEFAULT_API_URL).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn api_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.api_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the login credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Adds a header sent with every request.
    ///
    /// A header of the same name, `Content-Type` included, is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets the retry strategy for network faults.
    pub fn retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }

    /// Sets a custom retry predicate.
    ///
    /// By default, requests are retried based on `Error::is_retryable()`.
    pub fn retry_predicate(mut self, predicate: Box<dyn RetryPredicate>) -> Self {
        self.retry_predicate = Some(predicate);
        self
    }

    /// Sets the per-attempt request timeout. None is set by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the outbound rate limit.
    pub fn rate_limit_config(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit_config = config;
        self
    }

    /// Logs in and returns the ready client.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials were provided, the HTTP client
    /// cannot be built, or the login handshake fails.
    pub async fn build(self) -> Result<Client> {
        let credentials = self
            .credentials
            .ok_or_else(|| Error::ConfigurationError("Credentials are required".to_string()))?;
        let api_url = match self.api_url {
            Some(url) => url,
            None => Url::parse(crate::config::DEFAULT_API_URL)?,
        };

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let retry_predicate = self
            .retry_predicate
            .unwrap_or_else(|| Box::new(RetryOnRetryable));

        let transport = Transport::new(
            http_client,
            self.headers,
            self.retry_strategy,
            retry_predicate,
            self.timeout,
            RateLimiter::new(self.rate_limit_config),
        );

        let session = Session::establish(&transport, &api_url, &credentials).await?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                session,
                credentials,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
