//! SAP customer search (`ZSD_SP_SEARCH_CUSTOMER_SRV`).
//!
//! The service answers with an Atom/OData XML envelope whose namespace
//! prefixes are not stable across SAP releases, so the customer code is
//! located through an ordered chain of increasingly loose element matches.

use crate::config::Config;
use crate::errors::{body_excerpt, AppError};
use crate::models::SapLookupResult;
use crate::probe::Probe;
use crate::sap_session::{build_http_client, SapSession};
use reqwest::StatusCode;

pub const ODATA_METADATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";
pub const ODATA_DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";

const CUSTOMER_TAG: &str = "Customer";
const ERROR_EXCERPT_CHARS: usize = 500;

/// Element matchers for the customer code, loosest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMethod {
    /// `m:properties/d:Customer`
    PropertiesPath,
    /// `d:Customer` anywhere in the document
    DataNamespace,
    /// any element whose local name is `Customer`
    LocalName,
    /// any element whose local name contains `Customer`
    NameContains,
}

impl LookupMethod {
    pub const CHAIN: [LookupMethod; 4] = [
        LookupMethod::PropertiesPath,
        LookupMethod::DataNamespace,
        LookupMethod::LocalName,
        LookupMethod::NameContains,
    ];

    fn matches(self, node: roxmltree::Node<'_, '_>) -> bool {
        let tag = node.tag_name();
        match self {
            LookupMethod::PropertiesPath => {
                tag.namespace() == Some(ODATA_DATA_NS)
                    && tag.name() == CUSTOMER_TAG
                    && node.parent_element().is_some_and(|parent| {
                        parent.tag_name().namespace() == Some(ODATA_METADATA_NS)
                            && parent.tag_name().name() == "properties"
                    })
            }
            LookupMethod::DataNamespace => {
                tag.namespace() == Some(ODATA_DATA_NS) && tag.name() == CUSTOMER_TAG
            }
            LookupMethod::LocalName => tag.name() == CUSTOMER_TAG,
            LookupMethod::NameContains => tag.name().contains(CUSTOMER_TAG),
        }
    }
}

/// Finds the customer code in an OData XML payload.
///
/// Elements with blank text never count as a match; the chain moves on.
pub fn extract_customer_code(xml: &str) -> Result<Probe<LookupMethod>, roxmltree::Error> {
    let doc = roxmltree::Document::parse(xml)?;

    for method in LookupMethod::CHAIN {
        let hit = doc
            .descendants()
            .filter(|node| node.is_element() && method.matches(*node))
            .find_map(|node| {
                node.text()
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            });
        if let Some(value) = hit {
            return Ok(Probe::Found { value, method });
        }
    }

    Ok(Probe::NotFound)
}

/// Turns an HTTP answer from the search service into a lookup outcome.
pub fn interpret_response(status: StatusCode, body: &str) -> SapLookupResult {
    match status {
        StatusCode::OK => {
            if body.trim().is_empty() {
                return SapLookupResult::Error("empty response".to_string());
            }
            match extract_customer_code(body) {
                Ok(Probe::Found { value, method }) => {
                    tracing::debug!(?method, "SAP customer code matched");
                    SapLookupResult::Found(value)
                }
                Ok(Probe::NotFound) => SapLookupResult::NotFound,
                Err(e) => SapLookupResult::Error(format!("Invalid XML from SAP: {}", e)),
            }
        }
        StatusCode::FORBIDDEN => SapLookupResult::SessionExpired,
        StatusCode::NOT_FOUND => SapLookupResult::NotFound,
        other => SapLookupResult::Error(format!(
            "SAP returned status {}: {}",
            other.as_u16(),
            body_excerpt(body, ERROR_EXCERPT_CHARS)
        )),
    }
}

/// Transport failures mentioning a 404 are treated as "no such customer".
pub fn interpret_transport_error(message: &str) -> SapLookupResult {
    if message.contains("404") || message.contains("Not Found") {
        SapLookupResult::NotFound
    } else {
        SapLookupResult::Error(format!("SAP request failed: {}", message))
    }
}

/// Client for the SAP customer search service.
#[derive(Clone)]
pub struct SapSearchClient {
    client: reqwest::Client,
    search_url: String,
    sap_client: String,
    session: SapSession,
}

impl SapSearchClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Self::with_session(config, SapSession::from_config(config))
    }

    pub fn with_session(config: &Config, session: SapSession) -> Result<Self, AppError> {
        Ok(Self {
            client: build_http_client(config)?,
            search_url: config.sap_search_url.clone(),
            sap_client: config.sap_client.clone(),
            session,
        })
    }

    /// OData key URL for an MK. The other search keys are sent empty.
    pub fn lookup_url(&self, mk: &str) -> String {
        let mk = urlencoding::encode(&mk.replace('\'', "''")).into_owned();
        format!(
            "{}/ENTITYSet(BusinessPartner='',MobileNumber='',NationalID='',AutolineMK='{}')?sap-client={}",
            self.search_url, mk, self.sap_client
        )
    }

    /// Looks up the SAP customer code for an Autoline MK. Never fails; see [`SapLookupResult`].
    #[tracing::instrument(skip(self), fields(cookie = %self.session.fingerprint()))]
    pub async fn lookup_customer_code(&self, mk: &str) -> SapLookupResult {
        let url = self.lookup_url(mk);
        tracing::info!("Searching SAP customer for MK {}", mk);

        let response = match self.session.authorize(self.client.get(&url)).send().await {
            Ok(response) => response,
            Err(e) => {
                let outcome = interpret_transport_error(&e.to_string());
                tracing::warn!("SAP search transport failure: {} -> {:?}", e, outcome.status());
                return outcome;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to read SAP search response: {}", e);
                return SapLookupResult::Error(format!("Failed to read SAP response: {}", e));
            }
        };

        let outcome = interpret_response(status, &body);
        match &outcome {
            SapLookupResult::Found(code) => tracing::info!("✓ SAP customer {} found for MK {}", code, mk),
            SapLookupResult::NotFound => tracing::debug!("No SAP customer for MK {}", mk),
            SapLookupResult::SessionExpired => {
                tracing::warn!("SAP returned 403 for MK {} - session cookie may be expired", mk)
            }
            SapLookupResult::Error(msg) => tracing::error!("SAP search failed: {}", msg),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(properties: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<entry xmlns="http://www.w3.org/2005/Atom"
       xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata"
       xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices">
  <id>ENTITYSet</id>
  <content type="application/xml">
    <m:properties>{}</m:properties>
  </content>
</entry>"#,
            properties
        )
    }

    #[test]
    fn test_properties_path_match() {
        let xml = entry("<d:AutolineMK>18643</d:AutolineMK><d:Customer>0000123456</d:Customer>");
        let probe = extract_customer_code(&xml).unwrap();
        assert_eq!(probe.value(), Some("0000123456"));
        assert_eq!(probe.method(), Some(&LookupMethod::PropertiesPath));
        assert_eq!(
            interpret_response(StatusCode::OK, &xml),
            SapLookupResult::Found("0000123456".to_string())
        );
    }

    #[test]
    fn test_empty_customer_element_is_not_a_match() {
        let xml = entry("<d:AutolineMK>18643</d:AutolineMK><d:Customer>   </d:Customer>");
        assert_eq!(extract_customer_code(&xml).unwrap(), Probe::NotFound);
        assert_eq!(interpret_response(StatusCode::OK, &xml), SapLookupResult::NotFound);

        let xml = entry("<d:Customer/>");
        assert_eq!(interpret_response(StatusCode::OK, &xml), SapLookupResult::NotFound);
    }

    #[test]
    fn test_data_namespace_outside_properties() {
        let xml = r#"<feed xmlns:x="http://schemas.microsoft.com/ado/2007/08/dataservices"><x:Customer>42</x:Customer></feed>"#;
        let probe = extract_customer_code(xml).unwrap();
        assert_eq!(probe.value(), Some("42"));
        assert_eq!(probe.method(), Some(&LookupMethod::DataNamespace));
    }

    #[test]
    fn test_foreign_namespace_matched_by_local_name() {
        let xml = r#"<root xmlns:z="urn:other"><z:Customer> 0000999 </z:Customer></root>"#;
        let probe = extract_customer_code(xml).unwrap();
        assert_eq!(probe.value(), Some("0000999"));
        assert_eq!(probe.method(), Some(&LookupMethod::LocalName));
    }

    #[test]
    fn test_substring_match_is_last_resort() {
        let xml = r#"<root><CustomerCode>555</CustomerCode></root>"#;
        let probe = extract_customer_code(xml).unwrap();
        assert_eq!(probe.value(), Some("555"));
        assert_eq!(probe.method(), Some(&LookupMethod::NameContains));
    }

    #[test]
    fn test_blank_strict_match_falls_through_to_next_method() {
        let xml = entry("<d:Customer></d:Customer><d:CustomerNumber>777</d:CustomerNumber>");
        let probe = extract_customer_code(&xml).unwrap();
        assert_eq!(probe.value(), Some("777"));
        assert_eq!(probe.method(), Some(&LookupMethod::NameContains));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            interpret_response(StatusCode::FORBIDDEN, "denied"),
            SapLookupResult::SessionExpired
        );
        assert_eq!(
            interpret_response(StatusCode::NOT_FOUND, ""),
            SapLookupResult::NotFound
        );
        match interpret_response(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            SapLookupResult::Error(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("boom"));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_malformed_bodies() {
        assert_eq!(
            interpret_response(StatusCode::OK, "  \n"),
            SapLookupResult::Error("empty response".to_string())
        );
        match interpret_response(StatusCode::OK, "<entry><unclosed></entry>") {
            SapLookupResult::Error(msg) => assert!(msg.starts_with("Invalid XML from SAP")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_error_classification() {
        assert_eq!(
            interpret_transport_error("HTTP status client error (404 Not Found)"),
            SapLookupResult::NotFound
        );
        assert!(matches!(
            interpret_transport_error("connection refused"),
            SapLookupResult::Error(_)
        ));
    }
}
