//! Autoline ↔ SAP orchestration shared by the HTTP handlers.
//!
//! Search: fetch Autoline + look the MK up in SAP (concurrently), merge.
//! Generate: fetch Autoline → map → create in SAP.
//!
//! Nothing is kept between calls; each operation is an independent round trip.

use crate::autoline_client::{normalize_record, normalize_record_mut, AutolineClient};
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{
    AutolineRecord, CustomerKind, GenerateResponse, SapCreateRequestBody, SapCreateResult,
    SearchResponse,
};
use crate::sap_create::SapCreateClient;
use crate::sap_lookup::SapSearchClient;
use crate::sap_mapper::{map_corporate, map_individual};
use serde_json::Value;

/// Single message for every Autoline failure; callers cannot act on the detail.
pub const AUTOLINE_FAILURE: &str = "Failed to retrieve Autoline data";

/// Key under which the SAP code is merged into the Autoline record.
pub const SAP_CUSTOMER_FIELD: &str = "SAP_customer";

#[derive(Clone)]
pub struct CustomerBridge {
    autoline: AutolineClient,
    sap_search: SapSearchClient,
    sap_create: SapCreateClient,
}

impl CustomerBridge {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            autoline: AutolineClient::new(config)?,
            sap_search: SapSearchClient::new(config)?,
            sap_create: SapCreateClient::new(config)?,
        })
    }

    /// Autoline record plus its SAP customer code, if SAP knows the MK.
    pub async fn search(&self, mk: &str, kind: CustomerKind) -> Result<SearchResponse, AppError> {
        let (autoline, sap) = tokio::join!(
            self.autoline.fetch_customer(mk, kind),
            self.sap_search.lookup_customer_code(mk)
        );

        let mut customer_data = autoline.map_err(|e| {
            tracing::error!("Autoline fetch failed for MK {}: {}", mk, e);
            AppError::ExternalApiError(AUTOLINE_FAILURE.to_string())
        })?;
        if normalize_record(&customer_data).is_none() {
            tracing::error!("Autoline returned no customer record for MK {}", mk);
            return Err(AppError::ExternalApiError(AUTOLINE_FAILURE.to_string()));
        }

        let code = sap.code().map(str::to_string);
        merge_sap_code(&mut customer_data, code.as_deref());

        tracing::info!(
            "Search complete for MK {}: sap_status={:?}, has_sap_record={}",
            mk,
            sap.status(),
            code.is_some()
        );

        Ok(SearchResponse {
            success: true,
            customer_data,
            has_sap_record: code.is_some(),
            sap_customer_code: code,
            sap_status: sap.status(),
            sap_error: sap.error_message(),
        })
    }

    /// Creates the Autoline customer in SAP and returns the assigned code.
    pub async fn generate_sap_code(
        &self,
        mk: &str,
        kind: CustomerKind,
    ) -> Result<GenerateResponse, AppError> {
        let payload = self.autoline.fetch_customer(mk, kind).await.map_err(|e| {
            tracing::error!("Autoline fetch failed for MK {}: {}", mk, e);
            AppError::ExternalApiError(AUTOLINE_FAILURE.to_string())
        })?;

        let record = normalize_record(&payload)
            .ok_or_else(|| {
                AppError::ExternalApiError("Autoline returned no customer record".to_string())
            })
            .with_context(|| format!("Generating SAP code for MK {}", mk))?;

        let body = map_record(record, mk, kind);

        match self.sap_create.create_customer(&body).await {
            SapCreateResult::Success { code, message } => Ok(GenerateResponse {
                success: true,
                message,
                sap_customer_code: code,
            }),
            SapCreateResult::Failure { message } => Err(AppError::ExternalApiError(message)),
        }
    }
}

/// Selects the mapper for the customer kind.
pub fn map_record(record: &AutolineRecord, mk: &str, kind: CustomerKind) -> SapCreateRequestBody {
    match kind {
        CustomerKind::Individual => map_individual(record, mk),
        CustomerKind::Corporate => map_corporate(record, mk),
    }
}

/// Writes `SAP_customer` (code or null) into the record, keeping the payload shape.
pub fn merge_sap_code(payload: &mut Value, code: Option<&str>) {
    if let Some(record) = normalize_record_mut(payload) {
        let value = code.map_or(Value::Null, |c| Value::String(c.to_string()));
        record.insert(SAP_CUSTOMER_FIELD.to_string(), value);
    }
}
