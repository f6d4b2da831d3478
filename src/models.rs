use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// ============ Request / Response Models ============

/// Body of both `POST /api/search/` and `POST /api/generate-sap-code/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CustomerRequest {
    /// Autoline customer identifier (MK).
    pub customer_mk: Option<String>,
    /// Look the MK up in the sales ledger instead of the individual register.
    pub is_corporate: bool,
}

impl CustomerRequest {
    /// Trimmed MK, `None` when missing or blank.
    pub fn mk(&self) -> Option<&str> {
        self.customer_mk
            .as_deref()
            .map(str::trim)
            .filter(|mk| !mk.is_empty())
    }

    pub fn kind(&self) -> CustomerKind {
        CustomerKind::from_flag(self.is_corporate)
    }
}

/// Response of `POST /api/search/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub success: bool,
    /// Autoline payload (object or array) with `SAP_customer` merged into the record.
    #[schema(value_type = Object)]
    pub customer_data: Value,
    pub sap_customer_code: Option<String>,
    pub has_sap_record: bool,
    pub sap_status: SapStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sap_error: Option<String>,
}

/// Response of `POST /api/generate-sap-code/`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub sap_customer_code: Option<String>,
}

// ============ Domain Models ============

/// One Autoline customer record, individual or corporate. Keys drift in casing.
pub type AutolineRecord = serde_json::Map<String, Value>;

/// Which Autoline register a customer lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerKind {
    Individual,
    Corporate,
}

impl CustomerKind {
    pub fn from_flag(is_corporate: bool) -> Self {
        if is_corporate {
            CustomerKind::Corporate
        } else {
            CustomerKind::Individual
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerKind::Individual => "individual",
            CustomerKind::Corporate => "corporate",
        }
    }
}

/// Wire tag of a [`SapLookupResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SapStatus {
    Found,
    NotFound,
    SessionExpired,
    Error,
}

/// Outcome of searching SAP for the customer code of an Autoline MK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SapLookupResult {
    Found(String),
    NotFound,
    /// SAP answered 403, the session cookie is presumed stale.
    SessionExpired,
    Error(String),
}

impl SapLookupResult {
    pub fn status(&self) -> SapStatus {
        match self {
            SapLookupResult::Found(_) => SapStatus::Found,
            SapLookupResult::NotFound => SapStatus::NotFound,
            SapLookupResult::SessionExpired => SapStatus::SessionExpired,
            SapLookupResult::Error(_) => SapStatus::Error,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            SapLookupResult::Found(code) => Some(code),
            _ => None,
        }
    }

    /// Operator-facing message for the outcomes that need attention.
    pub fn error_message(&self) -> Option<String> {
        match self {
            SapLookupResult::SessionExpired => Some(
                "SAP session expired (HTTP 403). Refresh SAP_SESSION_COOKIE and restart the service."
                    .to_string(),
            ),
            SapLookupResult::Error(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

/// Customer-creation payload expected by the SAP create service.
///
/// Every key is always serialized; missing source data becomes `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SapCreateRequestBody {
    /// National ID for individuals, tax registration number for companies.
    #[serde(rename = "NationalId")]
    pub national_id: String,
    #[serde(rename = "AutolineMk")]
    pub autoline_mk: String,
    #[serde(rename = "Name")]
    pub name: String,
    /// Individual first name, or the Arabic contact name for companies.
    #[serde(rename = "Firstname")]
    pub first_name: String,
    /// Individual last name, or the English contact name for companies.
    #[serde(rename = "Lastname")]
    pub last_name: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Street")]
    pub street: String,
    #[serde(rename = "Telephone")]
    pub telephone: String,
    #[serde(rename = "MobilePhone")]
    pub mobile_phone: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "ArabicName")]
    pub arabic_name: String,
    #[serde(rename = "ReferringUser")]
    pub referring_user: String,
}

/// Outcome of a customer-creation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SapCreateResult {
    /// SAP accepted the request. The assigned code is not always recoverable.
    Success {
        code: Option<String>,
        message: String,
    },
    Failure {
        message: String,
    },
}
