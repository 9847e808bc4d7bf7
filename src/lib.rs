//! # intacct-link - An async client for the Sage Intacct XML gateway
//!
//! intacct-link speaks the gateway's XML envelope protocol on top of `reqwest`.
//! It logs in once, signs every call with the resulting session, pages through
//! large collections, and turns the gateway's layered failure statuses into a
//! single typed [`Error`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use intacct_link::{Client, Config};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), intacct_link::Error> {
//!     let config = Config::from_json(&std::fs::read_to_string("config.json").unwrap())?;
//!     let client = Client::builder().credentials(config.credentials()).build().await?;
//!
//!     // Every vendor, 1000 per page
//!     let vendors = client.list_entities("VENDOR", &["VENDORID", "NAME"], None).await?;
//!     println!("{} vendors", vendors.len());
//!
//!     // One filtered lookup
//!     let filter = json!({"equalto": {"field": "RECORDID", "value": "BILL-1"}});
//!     if let Some(bill) = client.query_single("APBILL", &["RECORDNO"], Some(&filter)).await? {
//!         println!("bill {}", bill["RECORDNO"]);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Envelope codec** - JSON-like trees to and from gateway XML, attributes and all
//! - **Session login** - The client only exists once the handshake has succeeded
//! - **Pagination** - Count query plus offset pages for whole collections
//! - **Rate limiting** - At most 10 calls per second by default
//! - **Retries** - Exponential backoff on network faults, never on gateway replies
//! - **Redacted logging** - Structured `tracing` events with credentials masked
//!
//! ## Error Handling
//!
//! Gateway-reported failures share one variant, told apart by [`ApiErrorKind`]:
//!
//! ```no_run
//! use intacct_link::{ApiErrorKind, Client, Error};
//! use serde_json::json;
//!
//! # async fn example(client: Client) -> Result<(), Error> {
//! match client.format_and_send_request(json!({"delete": {"object": "GLBATCH", "keys": "42"}})).await {
//!     Ok(result) => println!("deleted: {}", result),
//!     Err(Error::Api { kind: ApiErrorKind::WrongParams, details, .. }) => {
//!         eprintln!("rejected: {}", details);
//!     }
//!     Err(Error::MaxRetriesExceeded { attempts, .. }) => {
//!         eprintln!("gateway unreachable after {} attempts", attempts);
//!     }
//!     Err(e) => eprintln!("call failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod classify;
pub mod codec;
pub mod config;
pub mod envelope;
mod error;
pub mod objects;
pub mod operation;
mod query;
pub mod rate_limit;
pub mod redact;
mod response;
pub mod retry;
pub mod session;
pub mod support_id;
mod transport;

pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use error::{ApiErrorKind, Error, Result};
pub use operation::{Operation, Verb};
pub use query::PAGE_SIZE;
pub use response::Response;
pub use retry::{RetryPredicate, RetryStrategy};
pub use serde_json::Value;
pub use session::{Credentials, Session};
