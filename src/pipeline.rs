use crate::error::{AnalyzerError, ServiceFailure};
use crate::llm::{AnalysisOrchestrator, CompanySnapshot, ComparisonReport};
use crate::metrics::{compute_key_metrics, KeyMetrics};
use crate::normalizer::normalize;
use crate::report::AnalysisReport;
use crate::schema::{CompanyInfo, LineItem, NormalizedStatement, StatementType};
use crate::source::{CompanyDirectory, DisclosureSource};
use crate::utils::validate_business_year;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Statements and derived metrics for one company and business year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialData {
    pub company: CompanyInfo,
    pub year: i32,
    pub balance_sheet: NormalizedStatement,
    pub income_statement: NormalizedStatement,
    pub key_metrics: KeyMetrics,
    pub summary: StatementSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub total_items: usize,
    pub balance_sheet_items: usize,
    pub income_statement_items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiStatus {
    pub enabled: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoData,
    CompanyNotFound,
    AiUnavailable,
    AiServiceRetryable,
    SourceUnavailable,
    InvalidRequest,
}

/// Caller-facing failure: a category, a message fit for display and the underlying cause.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct PipelineFailure {
    pub kind: FailureKind,
    pub message: String,
    #[source]
    pub source: AnalyzerError,
}

impl PipelineFailure {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::AiServiceRetryable | FailureKind::SourceUnavailable
        )
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl From<AnalyzerError> for PipelineFailure {
    fn from(source: AnalyzerError) -> Self {
        let (kind, message) = match &source {
            AnalyzerError::EmptyStatement { .. } => (
                FailureKind::NoData,
                "재무제표 데이터를 찾을 수 없습니다.".to_string(),
            ),
            AnalyzerError::CompanyNotFound(_) => (
                FailureKind::CompanyNotFound,
                "회사를 찾을 수 없습니다.".to_string(),
            ),
            AnalyzerError::AiUnavailable => (
                FailureKind::AiUnavailable,
                "AI 분석 기능이 비활성화되어 있습니다. Gemini API 키를 설정해주세요.".to_string(),
            ),
            AnalyzerError::AiService(failure) => (
                FailureKind::AiServiceRetryable,
                match failure {
                    ServiceFailure::Timeout(_) => {
                        "AI 분석 요청 시간이 초과되었습니다. 잠시 후 다시 시도해주세요.".to_string()
                    }
                    _ => "AI 분석 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.".to_string(),
                },
            ),
            AnalyzerError::Source(_) | AnalyzerError::Io(_) => (
                FailureKind::SourceUnavailable,
                "재무제표 조회 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.".to_string(),
            ),
            AnalyzerError::InvalidYear(year) => (
                FailureKind::InvalidRequest,
                format!("{}년은 조회할 수 없는 사업연도입니다.", year),
            ),
            AnalyzerError::InsufficientCompanies(_) => (
                FailureKind::InvalidRequest,
                "비교하려면 2개 이상의 회사를 선택해주세요.".to_string(),
            ),
            AnalyzerError::Config(_) | AnalyzerError::Serialization(_) => (
                FailureKind::InvalidRequest,
                format!("요청을 처리할 수 없습니다: {}", source),
            ),
        };

        Self {
            kind,
            message,
            source,
        }
    }
}

/// Entry point tying the disclosure source, the metric derivation and AI analysis together.
///
/// Every component error crosses into a [`PipelineFailure`] here and nowhere else.
#[derive(Clone)]
pub struct FinancialPipeline {
    source: Arc<dyn DisclosureSource>,
    directory: Arc<dyn CompanyDirectory>,
    orchestrator: AnalysisOrchestrator,
}

impl FinancialPipeline {
    pub fn new(
        source: Arc<dyn DisclosureSource>,
        directory: Arc<dyn CompanyDirectory>,
        orchestrator: AnalysisOrchestrator,
    ) -> Self {
        Self {
            source,
            directory,
            orchestrator,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.orchestrator.is_enabled()
    }

    pub fn ai_status(&self) -> AiStatus {
        let enabled = self.ai_enabled();
        AiStatus {
            enabled,
            message: if enabled {
                "AI 분석 기능이 사용 가능합니다.".to_string()
            } else {
                "Gemini API 키를 설정해주세요.".to_string()
            },
        }
    }

    pub async fn get_financial_data(
        &self,
        corp_code: &str,
        year: i32,
    ) -> Result<FinancialData, PipelineFailure> {
        let company = self.resolve_company(corp_code, year)?;
        self.load(company, year).await
    }

    /// Runs the full pipeline and asks the model for an assessment.
    ///
    /// When AI is disabled this fails before the source is touched.
    pub async fn get_ai_analysis(
        &self,
        corp_code: &str,
        year: i32,
    ) -> Result<AnalysisReport, PipelineFailure> {
        if !self.ai_enabled() {
            return Err(AnalyzerError::AiUnavailable.into());
        }

        let data = self.get_financial_data(corp_code, year).await?;

        self.orchestrator
            .analyze(
                &data.company,
                year,
                &data.balance_sheet,
                &data.income_statement,
                &data.key_metrics,
            )
            .await
            .map_err(|err| {
                warn!("AI analysis for {} {} failed: {}", corp_code, year, err);
                PipelineFailure::from(err)
            })
    }

    /// Loads every company then asks for one comparison across them.
    pub async fn compare_companies(
        &self,
        corp_codes: &[&str],
        year: i32,
    ) -> Result<ComparisonReport, PipelineFailure> {
        if !self.ai_enabled() {
            return Err(AnalyzerError::AiUnavailable.into());
        }
        if corp_codes.len() < 2 {
            return Err(AnalyzerError::InsufficientCompanies(corp_codes.len()).into());
        }

        let mut snapshots = Vec::with_capacity(corp_codes.len());
        for corp_code in corp_codes {
            let data = self.get_financial_data(corp_code, year).await?;
            snapshots.push(CompanySnapshot {
                company: data.company,
                key_metrics: data.key_metrics,
            });
        }

        Ok(self.orchestrator.compare(&snapshots, year).await?)
    }

    fn resolve_company(&self, corp_code: &str, year: i32) -> Result<CompanyInfo, PipelineFailure> {
        validate_business_year(year)?;

        self.directory.lookup(corp_code).ok_or_else(|| {
            warn!("Unknown corp code {}", corp_code);
            PipelineFailure::from(AnalyzerError::CompanyNotFound(corp_code.to_string()))
        })
    }

    async fn load(
        &self,
        company: CompanyInfo,
        year: i32,
    ) -> Result<FinancialData, PipelineFailure> {
        let items = self.source.fetch_filing(&company.corp_code, year).await?;
        let (bs_items, is_items): (Vec<LineItem>, Vec<LineItem>) = items
            .into_iter()
            .partition(|item| item.statement_type == StatementType::BalanceSheet);

        let no_data = |err: AnalyzerError| {
            PipelineFailure::from(err).with_message(format!(
                "{}의 {}년 재무제표 데이터를 찾을 수 없습니다.",
                company.corp_name, year
            ))
        };
        let balance_sheet = normalize(&bs_items, StatementType::BalanceSheet).map_err(no_data)?;
        let income_statement =
            normalize(&is_items, StatementType::IncomeStatement).map_err(no_data)?;

        let key_metrics = compute_key_metrics(&balance_sheet, &income_statement);
        let summary = summarize(&bs_items, &is_items);

        info!(
            "Loaded {} {}: {} balance sheet rows, {} income statement rows, {} key metrics",
            company.corp_name,
            year,
            balance_sheet.len(),
            income_statement.len(),
            key_metrics.metrics.len()
        );

        Ok(FinancialData {
            company,
            year,
            balance_sheet,
            income_statement,
            key_metrics,
            summary,
        })
    }
}

fn summarize(bs_items: &[LineItem], is_items: &[LineItem]) -> StatementSummary {
    StatementSummary {
        total_items: bs_items.len() + is_items.len(),
        balance_sheet_items: bs_items.len(),
        income_statement_items: is_items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FsDiv;
    use std::time::Duration;

    #[test]
    fn test_failure_classification() {
        let no_data = PipelineFailure::from(AnalyzerError::EmptyStatement {
            statement_type: StatementType::BalanceSheet,
        });
        assert_eq!(no_data.kind, FailureKind::NoData);
        assert!(!no_data.is_retryable());

        let timeout = PipelineFailure::from(AnalyzerError::AiService(ServiceFailure::Timeout(
            Duration::from_millis(500),
        )));
        assert_eq!(timeout.kind, FailureKind::AiServiceRetryable);
        assert!(timeout.is_retryable());
        assert!(timeout.message.contains("시간이 초과"));
        assert!(timeout.source.to_string().contains("500ms"));

        let source = PipelineFailure::from(AnalyzerError::Source("connection reset".into()));
        assert_eq!(source.kind, FailureKind::SourceUnavailable);
        assert!(source.is_retryable());

        let year = PipelineFailure::from(AnalyzerError::InvalidYear(1999));
        assert_eq!(year.kind, FailureKind::InvalidRequest);
        assert!(year.message.contains("1999"));
    }

    #[test]
    fn test_failure_keeps_source() {
        use std::error::Error;

        let failure = PipelineFailure::from(AnalyzerError::CompanyNotFound("00000000".into()));
        assert_eq!(failure.kind, FailureKind::CompanyNotFound);
        let cause = failure.source().unwrap().to_string();
        assert!(cause.contains("00000000"));
    }

    #[test]
    fn test_summarize_counts_raw_items() {
        let item = |fs_div, statement_type| {
            LineItem::new("자산총계", fs_div, statement_type, Some(1), None, 1)
        };
        let bs = vec![
            item(FsDiv::Consolidated, StatementType::BalanceSheet),
            item(FsDiv::Separate, StatementType::BalanceSheet),
        ];
        let is = vec![item(FsDiv::Consolidated, StatementType::IncomeStatement)];

        let summary = summarize(&bs, &is);
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.balance_sheet_items, 2);
        assert_eq!(summary.income_statement_items, 1);
    }
}
