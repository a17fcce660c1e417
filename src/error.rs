//! Application error types with MCP protocol conversion.

use rmcp::model::ErrorCode;
use thiserror::Error;

use crate::models::CatalogError;
use crate::oracle::OracleError;

/// Application-level errors for archgrade.
///
/// Phase 1 rejections and Phase 2 warnings are not errors: they are carried in
/// the `EvaluationResult`. Only conditions that stop an evaluation from
/// producing a result end up here.
#[derive(Error, Debug)]
pub enum AppError {
    // Evaluation errors
    #[error("Provider {0} not supported")]
    UnsupportedProvider(String),

    // Catalog errors
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    // Oracle errors (only surfaced when building an oracle from configuration)
    #[error("Qualitative oracle error: {0}")]
    Oracle(#[from] OracleError),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Qualitative scoring requested but no oracle is configured")]
    OracleNotConfigured,
}

impl From<AppError> for rmcp::model::ErrorData {
    fn from(err: AppError) -> Self {
        let (code, app_code) = match &err {
            AppError::UnsupportedProvider(_) => (ErrorCode::INVALID_PARAMS, "UNSUPPORTED_PROVIDER"),
            AppError::Catalog(_) => (ErrorCode::INTERNAL_ERROR, "CATALOG_ERROR"),
            AppError::Oracle(_) => (ErrorCode::INTERNAL_ERROR, "ORACLE_ERROR"),
            AppError::Config(_) => (ErrorCode::INTERNAL_ERROR, "CONFIG_ERROR"),
            AppError::OracleNotConfigured => (ErrorCode::INVALID_REQUEST, "ORACLE_NOT_CONFIGURED"),
        };

        rmcp::model::ErrorData::new(code, format!("[{}] {}", app_code, err), None)
    }
}
