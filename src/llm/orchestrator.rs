use crate::error::{AnalyzerError, Result};
use crate::llm::generator::TextGenerator;
use crate::llm::prompts::{
    build_analysis_prompt, build_comparison_prompt, AnalysisPromptInput, ComparisonEntry,
};
use crate::metrics::KeyMetrics;
use crate::report::AnalysisReport;
use crate::schema::{CompanyInfo, NormalizedStatement};
use chrono::{Local, NaiveDateTime};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// A company and its derived metrics, as fed into a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySnapshot {
    pub company: CompanyInfo,
    pub key_metrics: KeyMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub year: i32,
    pub companies: Vec<String>,
    /// Free-form text returned by the model.
    pub analysis: String,
    pub generated_at: NaiveDateTime,
}

/// Builds analysis requests, calls the generator once per request and parses the answer.
///
/// Whether AI analysis is available is fixed at construction: an orchestrator built
/// without a generator fails every request with [`AnalyzerError::AiUnavailable`].
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl AnalysisOrchestrator {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    pub fn with_generator(generator: impl TextGenerator + 'static) -> Self {
        Self::new(Some(Arc::new(generator)))
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    fn generator(&self) -> Result<&dyn TextGenerator> {
        self.generator
            .as_deref()
            .ok_or(AnalyzerError::AiUnavailable)
    }

    /// Produces a structured assessment, or a raw one when the answer cannot be parsed.
    ///
    /// Transport failures are returned as errors; they never degrade into a raw report.
    pub async fn analyze(
        &self,
        company: &CompanyInfo,
        year: i32,
        balance_sheet: &NormalizedStatement,
        income_statement: &NormalizedStatement,
        key_metrics: &KeyMetrics,
    ) -> Result<AnalysisReport> {
        let generator = self.generator()?;

        let prompt = build_analysis_prompt(&AnalysisPromptInput {
            company,
            year,
            balance_sheet,
            income_statement,
            key_metrics,
        });

        info!(
            "Requesting AI analysis for {} ({}) {}",
            company.corp_name, company.corp_code, year
        );
        debug!("Analysis prompt is {} characters", prompt.chars().count());

        let started = Instant::now();
        let response = generator.generate(&prompt).await?;
        info!(
            "AI analysis for {} answered in {:.1}s",
            company.corp_code,
            started.elapsed().as_secs_f64()
        );

        Ok(AnalysisReport::parse(&response))
    }

    /// Asks for a free-form comparison of two or more companies.
    pub async fn compare(
        &self,
        companies: &[CompanySnapshot],
        year: i32,
    ) -> Result<ComparisonReport> {
        let generator = self.generator()?;

        if companies.len() < 2 {
            return Err(AnalyzerError::InsufficientCompanies(companies.len()));
        }

        let entries: Vec<ComparisonEntry<'_>> = companies
            .iter()
            .map(|snapshot| ComparisonEntry {
                company: &snapshot.company,
                key_metrics: &snapshot.key_metrics,
            })
            .collect();
        let prompt = build_comparison_prompt(&entries, year);

        info!("Requesting comparison of {} companies for {}", companies.len(), year);
        let analysis = generator.generate(&prompt).await?;

        Ok(ComparisonReport {
            year,
            companies: companies
                .iter()
                .map(|snapshot| snapshot.company.corp_name.clone())
                .collect(),
            analysis,
            generated_at: Local::now().naive_local(),
        })
    }
}
