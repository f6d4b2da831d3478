//! Autoline ↔ SAP customer bridge.
//!
//! Looks up Autoline dealer-management customers by MK, finds the matching
//! SAP customer code through the SAP OData search service, and creates
//! missing customers in SAP by mapping Autoline's loosely-keyed records into
//! SAP's customer-creation schema.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core mapping and orchestration logic.
//! - `integrations`: External service clients.
//! - `autoline_client`: Autoline REST client and record normalization.
//! - `bridge`: Search / generate orchestration.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and OpenAPI document.
//! - `models`: Request, response and domain models.
//! - `probe`: First-match-wins probing over drifting keys.
//! - `sap_create`: SAP customer creation client and response parsing.
//! - `sap_lookup`: SAP customer search client and XML probing.
//! - `sap_mapper`: Autoline → SAP field mapping.
//! - `sap_session`: SAP credentials and session cookie handling.

pub mod api;
pub mod core;
pub mod integrations;

pub mod autoline_client;
pub mod bridge;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod probe;
pub mod sap_create;
pub mod sap_lookup;
pub mod sap_mapper;
pub mod sap_session;
