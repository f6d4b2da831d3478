//! SAP credentials and session cookie handling.
//!
//! The session id is rotated out-of-band and only ever logged as a short
//! fingerprint.

use crate::config::Config;
use crate::errors::AppError;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Credentials shared by every SAP OData call.
///
/// SAP wants Basic auth plus the session cookie pair
/// (`SAP_SESSIONID_*` and `sap-usercontext`) on each request.
#[derive(Clone)]
pub struct SapSession {
    username: String,
    password: String,
    cookie_header: String,
    fingerprint: String,
}

impl SapSession {
    /// Builds the session from configuration, percent-decoding the cookie.
    pub fn from_config(config: &Config) -> Self {
        Self::with_cookie_encoding(config, CookieEncoding::Decoded)
    }

    /// Builds the session with an explicit cookie encoding.
    ///
    /// Production always decodes; the raw form exists for diagnostics.
    pub fn with_cookie_encoding(config: &Config, encoding: CookieEncoding) -> Self {
        let raw = config.sap_session_cookie.clone().unwrap_or_default();
        let session_id = match encoding {
            CookieEncoding::Decoded => decode_cookie(&raw),
            CookieEncoding::AsConfigured => raw.trim().to_string(),
        };

        let cookie_header = format!(
            "{}={}; sap-usercontext={}",
            config.sap_session_cookie_name,
            session_id,
            config.sap_user_context()
        );

        Self {
            username: config.sap_username.clone(),
            password: config.sap_password.clone(),
            fingerprint: fingerprint(&session_id),
            cookie_header,
        }
    }

    /// Attaches Basic auth, the session cookies and SAP's CSRF-bypass header.
    pub fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .basic_auth(&self.username, Some(&self.password))
            .header("X-Requested-With", "X")
            .header(reqwest::header::COOKIE, &self.cookie_header)
    }

    /// Short SHA-256 fingerprint of the session id, safe to log.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl std::fmt::Debug for SapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SapSession")
            .field("username", &self.username)
            .field("cookie", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieEncoding {
    Decoded,
    AsConfigured,
}

/// HTTP client used for SAP calls, honouring the TLS and timeout settings.
pub fn build_http_client(config: &Config) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .danger_accept_invalid_certs(config.sap_accept_invalid_certs)
        .build()
        .map_err(|e| AppError::ExternalApiError(format!("Failed to create SAP client: {}", e)))
}

/// Percent-decodes a session cookie. SAP rejects `%3d` where it expects `=`.
pub fn decode_cookie(raw: &str) -> String {
    let raw = raw.trim();
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            tracing::warn!("SAP session cookie is not valid percent-encoding ({}), sending as-is", e);
            raw.to_string()
        }
    }
}

fn fingerprint(session_id: &str) -> String {
    if session_id.is_empty() {
        return "none".to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cookie: Option<&str>) -> Config {
        Config {
            port: 8000,
            autoline_base_url: "http://autoline.test".to_string(),
            autoline_token: "token".to_string(),
            sap_search_url: "http://sap.test/search".to_string(),
            sap_create_url: "http://sap.test/create".to_string(),
            sap_client: "100".to_string(),
            sap_username: "MB.INTG".to_string(),
            sap_password: "secret".to_string(),
            sap_session_cookie: cookie.map(str::to_string),
            sap_session_cookie_name: "SAP_SESSIONID_PS4_100".to_string(),
            sap_accept_invalid_certs: false,
            http_timeout_secs: 30,
        }
    }

    #[test]
    fn test_decode_cookie() {
        assert_eq!(decode_cookie("hs_W2VvZMZ%3d"), "hs_W2VvZMZ=");
        assert_eq!(decode_cookie("abc%3D"), "abc=");
        assert_eq!(decode_cookie(" plain "), "plain");
    }

    #[test]
    fn test_cookie_header_uses_decoded_value() {
        let session = SapSession::from_config(&config(Some("abc%3d")));
        assert_eq!(
            session.cookie_header,
            "SAP_SESSIONID_PS4_100=abc=; sap-usercontext=sap-client=100"
        );
    }

    #[test]
    fn test_cookie_header_as_configured() {
        let session =
            SapSession::with_cookie_encoding(&config(Some("abc%3d")), CookieEncoding::AsConfigured);
        assert!(session.cookie_header.starts_with("SAP_SESSIONID_PS4_100=abc%3d;"));
    }

    #[test]
    fn test_fingerprint_hides_cookie() {
        let session = SapSession::from_config(&config(Some("abc%3d")));
        assert_eq!(session.fingerprint().len(), 12);
        assert!(!format!("{:?}", session).contains("abc="));
        assert_eq!(SapSession::from_config(&config(None)).fingerprint(), "none");
    }
}
