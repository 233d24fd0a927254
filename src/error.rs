use crate::schema::StatementType;
use std::time::Duration;
use thiserror::Error;

/// Why a call to the generative text service did not produce text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned no text")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("No {statement_type} data for the requested company/year")]
    EmptyStatement { statement_type: StatementType },

    #[error("AI analysis is not configured")]
    AiUnavailable,

    #[error("AI service error: {0}")]
    AiService(ServiceFailure),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Disclosure source error: {0}")]
    Source(String),

    #[error("Comparison needs at least 2 companies, got {0}")]
    InsufficientCompanies(usize),

    #[error("Invalid business year {0}")]
    InvalidYear(i32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ServiceFailure> for AnalyzerError {
    fn from(failure: ServiceFailure) -> Self {
        Self::AiService(failure)
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(feature = "gemini")]
impl From<reqwest::Error> for ServiceFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url().to_string())
    }
}
