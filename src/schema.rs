use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FsDiv {
    #[schemars(description = "Consolidated across subsidiaries (OpenDART code CFS)")]
    Consolidated,

    #[schemars(description = "Single legal entity (OpenDART code OFS)")]
    Separate,
}

impl FsDiv {
    /// Resolves a raw basis code. Accepts the OpenDART codes (`CFS`, `OFS`) and the
    /// spelled-out names, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "CFS" | "CONSOLIDATED" => Some(Self::Consolidated),
            "OFS" | "SEPARATE" => Some(Self::Separate),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Consolidated => "CFS",
            Self::Separate => "OFS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Consolidated => "연결재무제표",
            Self::Separate => "재무제표",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementType {
    #[serde(alias = "BS")]
    BalanceSheet,

    #[serde(alias = "IS")]
    IncomeStatement,
}

impl StatementType {
    /// Resolves an OpenDART `sj_div` code. Cash flow and equity-change statements are not modelled.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "BS" | "BALANCE_SHEET" => Some(Self::BalanceSheet),
            "IS" | "INCOME_STATEMENT" => Some(Self::IncomeStatement),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "BS",
            Self::IncomeStatement => "IS",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "재무상태표",
            Self::IncomeStatement => "손익계산서",
        }
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BalanceSheet => f.write_str("balance sheet"),
            Self::IncomeStatement => f.write_str("income statement"),
        }
    }
}

/// One unnormalized statement entry as delivered by a disclosure source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub account_name: String,

    /// Raw basis code. Anything [`FsDiv::from_code`] does not recognize is dropped during
    /// normalization.
    pub fs_div: String,

    pub statement_type: StatementType,

    #[serde(default)]
    pub current_period_amount: Option<i64>,

    #[serde(default)]
    pub previous_period_amount: Option<i64>,

    /// Source-defined presentation order.
    #[serde(default)]
    pub ordinal: i64,
}

impl LineItem {
    pub fn new(
        account_name: impl Into<String>,
        fs_div: FsDiv,
        statement_type: StatementType,
        current_period_amount: Option<i64>,
        previous_period_amount: Option<i64>,
        ordinal: i64,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            fs_div: fs_div.code().to_string(),
            statement_type,
            current_period_amount,
            previous_period_amount,
            ordinal,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Period {
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct StatementRow {
    pub account_name: String,
    pub fs_div: FsDiv,
    pub current: Period,
    pub previous: Period,
}

/// Canonical, ordered and deduplicated rows of one statement type.
///
/// Within one basis every `account_name` appears at most once, and rows are kept in
/// source presentation order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct NormalizedStatement {
    pub statement_type: StatementType,
    pub rows: Vec<StatementRow>,
}

impl NormalizedStatement {
    pub fn rows_for(&self, fs_div: FsDiv) -> impl Iterator<Item = &StatementRow> {
        self.rows.iter().filter(move |row| row.fs_div == fs_div)
    }

    pub fn find(&self, fs_div: FsDiv, account_name: &str) -> Option<&StatementRow> {
        self.rows_for(fs_div)
            .find(|row| row.account_name == account_name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Identity record of a disclosing company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct CompanyInfo {
    pub corp_code: String,
    pub corp_name: String,
    #[serde(default)]
    pub corp_eng_name: String,
    /// Blank for unlisted companies.
    #[serde(default)]
    pub stock_code: String,
    #[serde(default)]
    pub modify_date: String,
}

impl CompanyInfo {
    pub fn listed_stock_code(&self) -> Option<&str> {
        let code = self.stock_code.trim();
        (!code.is_empty()).then_some(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_codes() {
        assert_eq!(FsDiv::from_code("CFS"), Some(FsDiv::Consolidated));
        assert_eq!(FsDiv::from_code(" ofs "), Some(FsDiv::Separate));
        assert_eq!(FsDiv::from_code("consolidated"), Some(FsDiv::Consolidated));
        assert_eq!(FsDiv::from_code("XYZ"), None);
        assert_eq!(FsDiv::from_code(""), None);
    }

    #[test]
    fn test_statement_type_deserializes_codes() {
        let bs: StatementType = serde_json::from_str("\"BS\"").unwrap();
        let is: StatementType = serde_json::from_str("\"INCOME_STATEMENT\"").unwrap();
        assert_eq!(bs, StatementType::BalanceSheet);
        assert_eq!(is, StatementType::IncomeStatement);
        assert_eq!(StatementType::from_code("CF"), None);
    }

    #[test]
    fn test_line_item_missing_amounts_deserialize_as_none() {
        let item: LineItem = serde_json::from_str(
            r#"{"account_name":"자산총계","fs_div":"CFS","statement_type":"BS"}"#,
        )
        .unwrap();
        assert_eq!(item.current_period_amount, None);
        assert_eq!(item.previous_period_amount, None);
        assert_eq!(item.ordinal, 0);
    }

    #[test]
    fn test_listed_stock_code() {
        let mut company = CompanyInfo {
            corp_code: "00126380".to_string(),
            corp_name: "삼성전자".to_string(),
            corp_eng_name: "SAMSUNG ELECTRONICS CO,.LTD".to_string(),
            stock_code: "005930".to_string(),
            modify_date: "20230110".to_string(),
        };
        assert_eq!(company.listed_stock_code(), Some("005930"));
        company.stock_code = " ".to_string();
        assert_eq!(company.listed_stock_code(), None);
    }
}
