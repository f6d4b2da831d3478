//! SAP customer creation (`ZSD_SP_CREATE_CUSTOMER_SRV`).

use crate::config::Config;
use crate::errors::{body_excerpt, AppError};
use crate::models::{SapCreateRequestBody, SapCreateResult};
use crate::probe::{scalar_text, Probe};
use crate::sap_session::{build_http_client, SapSession};
use reqwest::StatusCode;
use serde_json::Value;

/// Keys SAP has used for the assigned customer code, in priority order.
pub const CODE_KEYS: [&str; 5] = [
    "Customer",
    "CustomerCode",
    "BusinessPartner",
    "CustomerNumber",
    "AutolineMk",
];

const COLLECTION_KEYS: [&str; 3] = ["results", "value", "items"];
const MIN_ALNUM_CODE_LEN: usize = 6;
const ERROR_EXCERPT_CHARS: usize = 500;

/// Where in the create response the code was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    TopLevel(&'static str),
    /// Under the OData v2 `d` envelope.
    Envelope(&'static str),
    /// Inside the first matching element of a `results`/`value`/`items` array.
    Collection(&'static str),
    /// Any key containing "customer" with a code-looking value.
    Heuristic(String),
}

/// Extracts the assigned customer code from a decoded create response.
///
/// The heuristic last step can pick up unrelated fields such as a
/// `TotalCustomers` counter; the earlier, explicit steps always take priority.
pub fn extract_created_code(response: &Value) -> Probe<CodeSource> {
    if let Some((code, key)) = first_code_key(response) {
        return found(code, CodeSource::TopLevel(key));
    }

    let envelope = response.get("d");
    if let Some((code, key)) = envelope.and_then(first_code_key) {
        return found(code, CodeSource::Envelope(key));
    }

    for container in [Some(response), envelope].into_iter().flatten() {
        for collection in COLLECTION_KEYS {
            let Some(items) = container.get(collection).and_then(Value::as_array) else {
                continue;
            };
            if let Some((code, key)) = items.iter().find_map(first_code_key) {
                return found(code, CodeSource::Collection(key));
            }
        }
    }

    match scan_customer_keys(response) {
        Some((key, value)) => found(value, CodeSource::Heuristic(key)),
        None => Probe::NotFound,
    }
}

fn found(value: String, method: CodeSource) -> Probe<CodeSource> {
    Probe::Found { value, method }
}

fn first_code_key(value: &Value) -> Option<(String, &'static str)> {
    let object = value.as_object()?;
    CODE_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(scalar_text).map(|v| (v, *key)))
}

fn scan_customer_keys(value: &Value) -> Option<(String, String)> {
    match value {
        Value::Object(object) => {
            for (key, child) in object {
                if key.to_lowercase().contains("customer") {
                    if let Some(code) = code_like(child) {
                        return Some((key.clone(), code));
                    }
                }
            }
            object.values().find_map(scan_customer_keys)
        }
        Value::Array(items) => items.iter().find_map(scan_customer_keys),
        _ => None,
    }
}

/// Numeric values, or alphanumeric strings long enough to be a code.
fn code_like(value: &Value) -> Option<String> {
    let text = scalar_text(value)?;
    let numeric = text.chars().all(|c| c.is_ascii_digit());
    let long_alnum =
        text.len() >= MIN_ALNUM_CODE_LEN && text.chars().all(|c| c.is_ascii_alphanumeric());
    (numeric || long_alnum).then_some(text)
}

/// Turns an HTTP answer from the create service into an outcome.
pub fn interpret_response(status: StatusCode, body: &str) -> SapCreateResult {
    if status != StatusCode::OK && status != StatusCode::CREATED {
        return SapCreateResult::Failure {
            message: format!(
                "SAP create returned status {}: {}",
                status.as_u16(),
                body_excerpt(body, ERROR_EXCERPT_CHARS)
            ),
        };
    }

    let decoded: Value = match serde_json::from_str(body) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("SAP create response is not JSON ({}), assuming success", e);
            return SapCreateResult::Success {
                code: None,
                message: "Customer created in SAP (response could not be decoded)".to_string(),
            };
        }
    };

    match extract_created_code(&decoded) {
        Probe::Found { value, method } => {
            tracing::debug!(?method, "SAP created customer code matched");
            SapCreateResult::Success {
                message: format!("Customer created in SAP with code {}", value),
                code: Some(value),
            }
        }
        Probe::NotFound => {
            tracing::warn!("SAP create response carries no customer code: {}", body_excerpt(body, 200));
            SapCreateResult::Success {
                code: None,
                message: "Customer created in SAP".to_string(),
            }
        }
    }
}

/// Client for the SAP customer creation service.
#[derive(Clone)]
pub struct SapCreateClient {
    client: reqwest::Client,
    create_url: String,
    session: SapSession,
}

impl SapCreateClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            client: build_http_client(config)?,
            create_url: config.sap_create_url.clone(),
            session: SapSession::from_config(config),
        })
    }

    /// Submits a mapped customer to SAP.
    #[tracing::instrument(skip_all, fields(mk = %body.autoline_mk, cookie = %self.session.fingerprint()))]
    pub async fn create_customer(&self, body: &SapCreateRequestBody) -> SapCreateResult {
        tracing::info!("Creating SAP customer for MK {}", body.autoline_mk);

        let request = self
            .client
            .post(&self.create_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);

        let response = match self.session.authorize(request).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("SAP create request failed: {}", e);
                return SapCreateResult::Failure {
                    message: format!("SAP create request failed: {}", e),
                };
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to read SAP create response ({}): {}", status, e);
                String::new()
            }
        };
        let outcome = interpret_response(status, &text);

        match &outcome {
            SapCreateResult::Success { code, .. } => {
                tracing::info!("✓ SAP customer created for MK {}: {:?}", body.autoline_mk, code)
            }
            SapCreateResult::Failure { message } => tracing::error!("{}", message),
        }
        outcome
    }
}
