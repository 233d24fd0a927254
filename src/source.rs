use crate::error::Result;
use crate::schema::{CompanyInfo, LineItem, StatementType};
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Supplies raw statement entries for a company and business year.
///
/// "Not found" and malformed data are reported as an empty list; only transport
/// failures are errors.
#[async_trait]
pub trait DisclosureSource: Send + Sync {
    async fn fetch_line_items(
        &self,
        corp_code: &str,
        year: i32,
        statement_type: StatementType,
    ) -> Result<Vec<LineItem>>;

    /// Every line item of the filing, both statement types.
    ///
    /// Sources that receive the whole filing in one response should override this so a
    /// filing costs one request.
    async fn fetch_filing(&self, corp_code: &str, year: i32) -> Result<Vec<LineItem>> {
        let (mut items, income_statement) = futures::try_join!(
            self.fetch_line_items(corp_code, year, StatementType::BalanceSheet),
            self.fetch_line_items(corp_code, year, StatementType::IncomeStatement),
        )?;
        items.extend(income_statement);
        Ok(items)
    }
}

/// Resolves a company's identity record from its corp code.
pub trait CompanyDirectory: Send + Sync {
    fn lookup(&self, corp_code: &str) -> Option<CompanyInfo>;
}

/// Line items held in memory, keyed by `(corp_code, year)`.
#[derive(Debug, Clone, Default)]
pub struct StaticDisclosureSource {
    filings: HashMap<(String, i32), Vec<LineItem>>,
}

impl StaticDisclosureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, corp_code: impl Into<String>, year: i32, items: Vec<LineItem>) {
        self.filings
            .entry((corp_code.into(), year))
            .or_default()
            .extend(items);
    }

    pub fn with_filing(
        mut self,
        corp_code: impl Into<String>,
        year: i32,
        items: Vec<LineItem>,
    ) -> Self {
        self.insert(corp_code, year, items);
        self
    }
}

#[async_trait]
impl DisclosureSource for StaticDisclosureSource {
    async fn fetch_line_items(
        &self,
        corp_code: &str,
        year: i32,
        statement_type: StatementType,
    ) -> Result<Vec<LineItem>> {
        Ok(self
            .filings
            .get(&(corp_code.to_string(), year))
            .map(|items| {
                items
                    .iter()
                    .filter(|item| item.statement_type == statement_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryMetadata {
    pub total_count: usize,
    pub download_date: String,
    pub source: String,
}

/// On-disk layout of the exported corp code list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFile {
    #[serde(default)]
    pub metadata: RegistryMetadata,
    pub companies: Vec<CompanyInfo>,
}

/// Static company list with lookup by corp code.
#[derive(Debug, Clone, Default)]
pub struct CompanyRegistry {
    companies: HashMap<String, CompanyInfo>,
}

impl CompanyRegistry {
    pub fn new(companies: impl IntoIterator<Item = CompanyInfo>) -> Self {
        Self {
            companies: companies
                .into_iter()
                .map(|company| (company.corp_code.clone(), company))
                .collect(),
        }
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let file: RegistryFile = serde_json::from_reader(reader)?;
        info!(
            "Loaded {} companies into the registry (source: {}, downloaded: {})",
            file.companies.len(),
            file.metadata.source,
            file.metadata.download_date
        );
        Ok(Self::new(file.companies))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_reader(json.as_bytes())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }
}

impl CompanyDirectory for CompanyRegistry {
    fn lookup(&self, corp_code: &str) -> Option<CompanyInfo> {
        self.companies.get(corp_code.trim()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FsDiv;

    #[test]
    fn test_registry_from_json() {
        let registry = CompanyRegistry::from_json_str(
            r#"{
                "metadata": {
                    "total_count": 2,
                    "download_date": "2024-01-05 10:00:00",
                    "source": "OpenDart API"
                },
                "companies": [
                    {
                        "corp_code": "00126380",
                        "corp_name": "삼성전자",
                        "corp_eng_name": "SAMSUNG ELECTRONICS CO,.LTD",
                        "stock_code": "005930",
                        "modify_date": "20230110"
                    },
                    {
                        "corp_code": "00434003",
                        "corp_name": "다코",
                        "corp_eng_name": "Daco corporation",
                        "stock_code": "",
                        "modify_date": "20170630"
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        let samsung = registry.lookup("00126380").unwrap();
        assert_eq!(samsung.corp_name, "삼성전자");
        assert_eq!(registry.lookup(" 00434003 ").unwrap().listed_stock_code(), None);
        assert!(registry.lookup("99999999").is_none());
    }

    #[test]
    fn test_registry_rejects_malformed_json() {
        assert!(CompanyRegistry::from_json_str("{\"companies\": 3}").is_err());
    }

    fn samsung_source() -> StaticDisclosureSource {
        let item = |name: &str, statement_type| {
            LineItem::new(name, FsDiv::Consolidated, statement_type, Some(1), Some(1), 1)
        };
        StaticDisclosureSource::new().with_filing(
            "00126380",
            2023,
            vec![
                item("자산총계", StatementType::BalanceSheet),
                item("매출액", StatementType::IncomeStatement),
            ],
        )
    }

    #[tokio::test]
    async fn test_static_source_filters_statement_type() {
        let source = samsung_source();

        let bs = source
            .fetch_line_items("00126380", 2023, StatementType::BalanceSheet)
            .await
            .unwrap();
        assert_eq!(bs.len(), 1);
        assert_eq!(bs[0].account_name, "자산총계");

        let missing = source
            .fetch_line_items("00126380", 2022, StatementType::BalanceSheet)
            .await
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_default_filing_combines_both_statements() {
        let items = samsung_source().fetch_filing("00126380", 2023).await.unwrap();

        let names: Vec<&str> = items.iter().map(|item| item.account_name.as_str()).collect();
        assert_eq!(names, vec!["자산총계", "매출액"]);
    }
}
