use serde::Deserialize;

const DEFAULT_AUTOLINE_BASE_URL: &str = "http://41.33.17.242:7050";
const DEFAULT_SAP_SEARCH_URL: &str =
    "https://prd.sap.aboughalymotors.com/sap/opu/odata/sap/ZSD_SP_SEARCH_CUSTOMER_SRV";
const DEFAULT_SAP_CREATE_URL: &str =
    "https://prd.sap.aboughalymotors.com/sap/opu/odata/sap/ZSD_SP_CREATE_CUSTOMER_SRV/ENTITYSet";
const DEFAULT_SAP_SESSION_COOKIE_NAME: &str = "SAP_SESSIONID_PS4_100";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub autoline_base_url: String,
    pub autoline_token: String,
    pub sap_search_url: String,
    pub sap_create_url: String,
    pub sap_client: String,
    pub sap_username: String,
    pub sap_password: String,
    pub sap_session_cookie: Option<String>, // Rotated out-of-band, may be absent
    pub sap_session_cookie_name: String,
    pub sap_accept_invalid_certs: bool,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            autoline_base_url: validate_url(
                "AUTOLINE_BASE_URL",
                var_or("AUTOLINE_BASE_URL", DEFAULT_AUTOLINE_BASE_URL),
            )?,
            autoline_token: required("AUTOLINE_TOKEN")?,
            sap_search_url: validate_url(
                "SAP_SEARCH_URL",
                var_or("SAP_SEARCH_URL", DEFAULT_SAP_SEARCH_URL),
            )?,
            sap_create_url: validate_url(
                "SAP_CREATE_URL",
                var_or("SAP_CREATE_URL", DEFAULT_SAP_CREATE_URL),
            )?,
            sap_client: var_or("SAP_CLIENT", "100"),
            sap_username: required("SAP_USERNAME")?,
            sap_password: required("SAP_PASSWORD")?,
            sap_session_cookie: std::env::var("SAP_SESSION_COOKIE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            sap_session_cookie_name: var_or(
                "SAP_SESSION_COOKIE_NAME",
                DEFAULT_SAP_SESSION_COOKIE_NAME,
            ),
            sap_accept_invalid_certs: parse_flag(
                "SAP_ACCEPT_INVALID_CERTS",
                std::env::var("SAP_ACCEPT_INVALID_CERTS").ok().as_deref(),
            )?,
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("HTTP_TIMEOUT_SECS must be a whole number"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Autoline Base URL: {}", config.autoline_base_url);
        tracing::debug!("SAP Search URL: {}", config.sap_search_url);
        tracing::debug!("SAP Create URL: {}", config.sap_create_url);
        tracing::debug!("SAP client: {}", config.sap_client);
        if config.sap_session_cookie.is_none() {
            tracing::warn!(
                "SAP_SESSION_COOKIE not set - SAP calls will most likely be rejected with 403"
            );
        }
        if config.sap_accept_invalid_certs {
            tracing::warn!("SAP TLS certificate verification is disabled");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Value of the `sap-usercontext` cookie SAP expects next to the session id.
    pub fn sap_user_context(&self) -> String {
        format!("sap-client={}", self.sap_client)
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))
        .and_then(|value| {
            if value.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            Ok(value)
        })
}

fn validate_url(name: &str, raw: String) -> anyhow::Result<String> {
    let parsed = url::Url::parse(&raw)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_flag(name: &str, raw: Option<&str>) -> anyhow::Result<bool> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") | Some("on") => Ok(true),
        Some("0") | Some("false") | Some("no") | Some("off") => Ok(false),
        Some(other) => anyhow::bail!("{} must be true or false, got '{}'", name, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_strips_trailing_slash() {
        let url = validate_url("X", "https://sap.example.com/odata/".to_string()).unwrap();
        assert_eq!(url, "https://sap.example.com/odata");
    }

    #[test]
    fn test_validate_url_rejects_other_schemes() {
        assert!(validate_url("X", "ftp://sap.example.com".to_string()).is_err());
        assert!(validate_url("X", "not a url".to_string()).is_err());
    }

    #[test]
    fn test_required_credentials_have_no_fallback() {
        std::env::remove_var("AUTOLINE_SAP_BRIDGE_TEST_UNSET");
        assert!(required("AUTOLINE_SAP_BRIDGE_TEST_UNSET").is_err());

        std::env::set_var("AUTOLINE_SAP_BRIDGE_TEST_BLANK", "  ");
        assert!(required("AUTOLINE_SAP_BRIDGE_TEST_BLANK").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("F", None).unwrap());
        assert!(parse_flag("F", Some("TRUE")).unwrap());
        assert!(parse_flag("F", Some(" 1 ")).unwrap());
        assert!(!parse_flag("F", Some("off")).unwrap());
        assert!(parse_flag("F", Some("maybe")).is_err());
    }
}
