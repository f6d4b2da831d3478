//! Operator utility to check the SAP session cookie against the search service.
//!
//! Runs the customer lookup for one MK with the percent-decoded cookie (what
//! the server sends) and with the cookie exactly as configured, and prints
//! what SAP answered to each.
//!
//! Usage: `sap_probe <MK>`

use autoline_sap_bridge::config::Config;
use autoline_sap_bridge::models::SapLookupResult;
use autoline_sap_bridge::integrations::sap_search::SapSearchClient;
use autoline_sap_bridge::integrations::sap_session::{CookieEncoding, SapSession};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mk = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: sap_probe <MK>"))?;
    let config = Config::from_env()?;

    println!("SAP search: {}", config.sap_search_url);
    println!("Customer MK: {}", mk);

    let mut working = Vec::new();
    for (label, encoding) in [
        ("decoded cookie", CookieEncoding::Decoded),
        ("cookie as configured", CookieEncoding::AsConfigured),
    ] {
        let session = SapSession::with_cookie_encoding(&config, encoding);
        println!();
        println!("== {} (fingerprint {})", label, session.fingerprint());

        let client = SapSearchClient::with_session(&config, session)?;
        println!("URL: {}", client.lookup_url(&mk));

        let outcome = client.lookup_customer_code(&mk).await;
        match &outcome {
            SapLookupResult::Found(code) => println!("OK - SAP customer {}", code),
            SapLookupResult::NotFound => println!("OK - no SAP customer for this MK"),
            SapLookupResult::SessionExpired => println!("FAILED - 403, session rejected"),
            SapLookupResult::Error(msg) => println!("FAILED - {}", msg),
        }

        if matches!(outcome, SapLookupResult::Found(_) | SapLookupResult::NotFound) {
            working.push(label);
        }
    }

    println!();
    if working.is_empty() {
        println!("No variant worked. The cookie has most likely expired or was copied incorrectly;");
        println!("fetch a fresh SAP_SESSION_COOKIE and try again.");
    } else {
        println!("Working: {}", working.join(", "));
    }

    Ok(())
}
