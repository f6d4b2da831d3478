//! Autoline dealer-management REST client.
//!
//! Customers live in two registers: the sales ledger for companies and the
//! social-id register for natural persons. Both answer with a bare record or
//! a one-element array.

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{AutolineRecord, CustomerKind};
use serde_json::Value;
use std::time::Duration;

/// Client for the Autoline dealer-management REST API (`/SpotFlow`).
#[derive(Clone)]
pub struct AutolineClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl AutolineClient {
    /// Creates a new `AutolineClient`.
    ///
    /// # Arguments
    ///
    /// * `config` - Provides the base URL, bearer token and request timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Autoline client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.autoline_base_url.clone(),
            token: config.autoline_token.clone(),
        })
    }

    /// Endpoint for a customer: sales ledger for companies, social-id register otherwise.
    pub fn customer_url(&self, mk: &str, kind: CustomerKind) -> String {
        let mk = urlencoding::encode(mk);
        match kind {
            CustomerKind::Corporate => format!("{}/SpotFlow/salesLedger/byid/{}", self.base_url, mk),
            CustomerKind::Individual => {
                format!("{}/SpotFlow/CustomerBySocialId/byid/{}", self.base_url, mk)
            }
        }
    }

    /// Gets a customer from Autoline.
    ///
    /// # Arguments
    ///
    /// * `mk` - The Autoline customer identifier.
    /// * `kind` - Which register to read.
    ///
    /// # Returns
    ///
    /// * `Result<serde_json::Value, AppError>` - The raw payload: a record object,
    ///   or an array whose first element is the record.
    #[tracing::instrument(skip(self, kind), fields(kind = kind.as_str()))]
    pub async fn fetch_customer(&self, mk: &str, kind: CustomerKind) -> Result<Value, AppError> {
        let url = self.customer_url(mk, kind);
        tracing::info!("Fetching customer {} from Autoline: {}", mk, url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Autoline returned {}: {}",
                status,
                crate::errors::body_excerpt(&error_text, 300)
            )));
        }

        let data = response.json().await?;

        tracing::info!("✓ Autoline customer {} retrieved", mk);
        Ok(data)
    }
}

/// Picks the customer record out of an Autoline payload.
///
/// Autoline answers either with the record itself or with an array whose
/// first element is the record. An empty object is not a record.
pub fn normalize_record(payload: &Value) -> Option<&AutolineRecord> {
    let record = match payload {
        Value::Object(record) => record,
        Value::Array(items) => items.first().and_then(Value::as_object)?,
        _ => return None,
    };
    (!record.is_empty()).then_some(record)
}

/// Mutable access to the same record [`normalize_record`] selects.
pub fn normalize_record_mut(payload: &mut Value) -> Option<&mut AutolineRecord> {
    match payload {
        Value::Object(record) => Some(record),
        Value::Array(items) => items.first_mut().and_then(Value::as_object_mut),
        _ => None,
    }
}
