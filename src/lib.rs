//! # DART Statement Analyzer
//!
//! A library for turning the raw key-account rows of a Korean corporate disclosure into
//! canonical statements, headline metrics and an AI-written assessment.
//!
//! ## Core Concepts
//!
//! - **Line Items**: Raw rows as disclosed (account name, consolidated/separate flag, current and
//!   previous period amounts, display ordinal)
//! - **Normalized Statements**: One row per `(fs_div, account_name)`, missing amounts zeroed,
//!   disclosure order preserved
//! - **Key Metrics**: Six headline accounts with change and change rate, plus debt ratio and
//!   margins
//! - **Analysis Reports**: A structured assessment when the model answers in the expected shape,
//!   otherwise the raw text flagged with `parsing_error`
//!
//! ## Example
//!
//! ```rust,ignore
//! use dart_statement_analyzer::*;
//!
//! let items = vec![
//!     LineItem::new("자산총계", FsDiv::Consolidated, StatementType::BalanceSheet,
//!         Some(1_000_000), Some(800_000), 1),
//!     LineItem::new("매출액", FsDiv::Consolidated, StatementType::IncomeStatement,
//!         Some(500_000), Some(450_000), 1),
//! ];
//!
//! let processed = process_line_items(&items).unwrap();
//! let assets = processed.key_metrics.get(MetricName::TotalAssets).unwrap();
//! assert_eq!(assets.change_rate, 25.0);
//! ```

pub mod config;
pub mod error;
pub mod ingestion;
pub mod llm;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod source;
pub mod utils;

#[cfg(feature = "opendart")]
pub mod opendart;

pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, Result, ServiceFailure};
pub use ingestion::{convert_records, parse_amount, DartAccountRecord, DartResponse};
pub use llm::{AnalysisOrchestrator, CompanySnapshot, ComparisonReport, TextGenerator};
pub use metrics::*;
pub use normalizer::{normalize, normalize_pair};
pub use pipeline::*;
pub use report::*;
pub use schema::*;
pub use source::*;
pub use utils::*;

#[cfg(feature = "gemini")]
pub use llm::GeminiClient;
#[cfg(feature = "opendart")]
pub use opendart::OpenDartClient;

use log::debug;
use serde::{Deserialize, Serialize};

/// Both canonical statements of one filing and the metrics derived from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedStatements {
    pub balance_sheet: NormalizedStatement,
    pub income_statement: NormalizedStatement,
    pub key_metrics: KeyMetrics,
}

pub struct StatementProcessor;

impl StatementProcessor {
    /// Normalizes a filing's mixed line items and derives its key metrics.
    pub fn process(raw_items: &[LineItem]) -> Result<ProcessedStatements> {
        let (balance_sheet, income_statement) = normalize_pair(raw_items)?;
        let key_metrics = compute_key_metrics(&balance_sheet, &income_statement);

        debug!(
            "Processed {} line items into {} + {} rows, {} key metrics",
            raw_items.len(),
            balance_sheet.len(),
            income_statement.len(),
            key_metrics.metrics.len()
        );

        Ok(ProcessedStatements {
            balance_sheet,
            income_statement,
            key_metrics,
        })
    }
}

pub fn process_line_items(raw_items: &[LineItem]) -> Result<ProcessedStatements> {
    StatementProcessor::process(raw_items)
}
