use crate::config::{AnalyzerConfig, DEFAULT_REPORT_CODE};
use crate::error::{AnalyzerError, Result};
use crate::ingestion::{convert_records, DartResponse};
use crate::schema::{LineItem, StatementType};
use crate::source::DisclosureSource;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;

const OPENDART_BASE_URL: &str = "https://opendart.fss.or.kr/api";
const SINGLE_ACCOUNT_ENDPOINT: &str = "fnlttSinglAcnt.json";

/// OpenDART single-company key-account client.
#[derive(Clone)]
pub struct OpenDartClient {
    client: Client,
    api_key: String,
    base_url: String,
    report_code: String,
    timeout: Duration,
}

impl OpenDartClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENDART_BASE_URL.to_string(),
            report_code: DEFAULT_REPORT_CODE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let api_key = config
            .opendart_api_key
            .clone()
            .ok_or_else(|| AnalyzerError::Config("OPENDART_API_KEY is not set".to_string()))?;

        Ok(Self::new(api_key).with_report_code(config.opendart_report_code.clone()))
    }

    pub fn with_report_code(mut self, report_code: impl Into<String>) -> Self {
        self.report_code = report_code.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches every key account of the filing, both statement kinds and both `fs_div`s,
    /// in one request.
    ///
    /// A non-`000` status yields an empty list.
    pub async fn fetch_key_accounts(&self, corp_code: &str, year: i32) -> Result<Vec<LineItem>> {
        let url = format!("{}/{}", self.base_url, SINGLE_ACCOUNT_ENDPOINT);
        let year = year.to_string();
        debug!("GET {} corp_code={} bsns_year={}", url, corp_code, year);

        let res = self
            .client
            .get(&url)
            .query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("corp_code", corp_code),
                ("bsns_year", year.as_str()),
                ("reprt_code", self.report_code.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(source_error)?;

        let status = res.status();
        if !status.is_success() {
            return Err(AnalyzerError::Source(format!(
                "OpenDART returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: DartResponse = res.json().await.map_err(source_error)?;

        if body.is_no_data() {
            debug!("OpenDART has no filing for {} {}", corp_code, year);
            return Ok(Vec::new());
        }
        if !body.is_ok() {
            warn!(
                "OpenDART status {} for {} {}: {}",
                body.status, corp_code, year, body.message
            );
            return Ok(Vec::new());
        }

        Ok(convert_records(&body.list))
    }
}

fn source_error(err: reqwest::Error) -> AnalyzerError {
    AnalyzerError::Source(err.without_url().to_string())
}

#[async_trait]
impl DisclosureSource for OpenDartClient {
    async fn fetch_line_items(
        &self,
        corp_code: &str,
        year: i32,
        statement_type: StatementType,
    ) -> Result<Vec<LineItem>> {
        let items = self.fetch_key_accounts(corp_code, year).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.statement_type == statement_type)
            .collect())
    }

    async fn fetch_filing(&self, corp_code: &str, year: i32) -> Result<Vec<LineItem>> {
        self.fetch_key_accounts(corp_code, year).await
    }
}
