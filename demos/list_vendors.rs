//! Lists every vendor of a company, then looks one up by id.
//!
//! This example shows how to:
//! - Load connector settings from a JSON file
//! - Log in and page through a whole collection
//! - Run a filtered single query
//!
//! Run with: `cargo run --example list_vendors -- config.json [VENDORID]`

use intacct_link::{ClientBuilder, Config, Error};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("intacct_link=info,list_vendors=info")
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: list_vendors <config.json> [VENDORID]");
        std::process::exit(2);
    };
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| Error::ConfigurationError(format!("Cannot read {}: {}", path, e)))?;
    let config = Config::from_json(&raw)?;

    let client = ClientBuilder::from_config(&config)?.build().await?;

    let vendors = client
        .get_entity("accounts_payable_vendors", &["RECORDNO", "VENDORID", "NAME"])
        .await?;
    println!("Fetched {} vendors", vendors.len());
    for vendor in vendors.iter().take(5) {
        println!("  {} {}", vendor["VENDORID"], vendor["NAME"]);
    }

    if let Some(vendor_id) = args.next() {
        let filter = json!({"equalto": {"field": "VENDORID", "value": vendor_id}});
        match client
            .query_single("VENDOR", &["RECORDNO", "NAME"], Some(&filter))
            .await?
        {
            Some(vendor) => println!("Found {}: {}", vendor_id, vendor),
            None => println!("No vendor {}", vendor_id),
        }
    }

    Ok(())
}
