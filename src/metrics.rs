use crate::schema::{FsDiv, NormalizedStatement, StatementType};
use crate::utils::{change_rate, ratio_percent};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    Revenue,
    OperatingProfit,
    NetIncome,
    TotalAssets,
    TotalLiabilities,
    TotalEquity,
}

impl MetricName {
    pub const ALL: [MetricName; 6] = [
        MetricName::Revenue,
        MetricName::OperatingProfit,
        MetricName::NetIncome,
        MetricName::TotalAssets,
        MetricName::TotalLiabilities,
        MetricName::TotalEquity,
    ];

    /// Canonical account name the metric is read from.
    pub fn account_name(&self) -> &'static str {
        match self {
            Self::Revenue => "매출액",
            Self::OperatingProfit => "영업이익",
            Self::NetIncome => "당기순이익",
            Self::TotalAssets => "자산총계",
            Self::TotalLiabilities => "부채총계",
            Self::TotalEquity => "자본총계",
        }
    }

    pub fn statement_type(&self) -> StatementType {
        match self {
            Self::Revenue | Self::OperatingProfit | Self::NetIncome => {
                StatementType::IncomeStatement
            }
            Self::TotalAssets | Self::TotalLiabilities | Self::TotalEquity => {
                StatementType::BalanceSheet
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "매출액",
            Self::OperatingProfit => "영업이익",
            Self::NetIncome => "당기순이익",
            Self::TotalAssets => "총자산",
            Self::TotalLiabilities => "총부채",
            Self::TotalEquity => "자본총계",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct KeyMetric {
    pub name: MetricName,
    pub account_name: String,
    pub current: i64,
    pub previous: i64,
    pub change: i64,
    /// Percent change against the previous period; 0 when the previous period is 0.
    pub change_rate: f64,
}

impl KeyMetric {
    pub fn new(name: MetricName, current: i64, previous: i64) -> Self {
        Self {
            name,
            account_name: name.account_name().to_string(),
            current,
            previous,
            change: current.saturating_sub(previous),
            change_rate: change_rate(current, previous),
        }
    }
}

/// Percent ratios on current-period amounts. A missing or zero denominator yields 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FinancialRatios {
    /// Total liabilities over total equity.
    pub debt_ratio: f64,
    pub operating_margin: f64,
    pub net_margin: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct KeyMetrics {
    /// Only metrics whose canonical account exists on the consolidated basis.
    pub metrics: BTreeMap<MetricName, KeyMetric>,
    pub ratios: FinancialRatios,
}

impl KeyMetrics {
    pub fn get(&self, name: MetricName) -> Option<&KeyMetric> {
        self.metrics.get(&name)
    }

    pub fn contains(&self, name: MetricName) -> bool {
        self.metrics.contains_key(&name)
    }

    fn current_of(&self, name: MetricName) -> Option<i64> {
        self.get(name).map(|m| m.current)
    }
}

pub fn compute_key_metrics(
    balance_sheet: &NormalizedStatement,
    income_statement: &NormalizedStatement,
) -> KeyMetrics {
    let mut metrics = BTreeMap::new();

    for name in MetricName::ALL {
        let statement = match name.statement_type() {
            StatementType::BalanceSheet => balance_sheet,
            StatementType::IncomeStatement => income_statement,
        };

        if let Some(row) = statement.find(FsDiv::Consolidated, name.account_name()) {
            metrics.insert(
                name,
                KeyMetric::new(name, row.current.amount, row.previous.amount),
            );
        } else {
            debug!(
                "Key metric {:?} unavailable: no consolidated '{}' row",
                name,
                name.account_name()
            );
        }
    }

    let mut key_metrics = KeyMetrics {
        metrics,
        ratios: FinancialRatios::default(),
    };
    key_metrics.ratios = compute_ratios(&key_metrics);
    key_metrics
}

fn compute_ratios(key_metrics: &KeyMetrics) -> FinancialRatios {
    let numerator = |name: MetricName| key_metrics.current_of(name).unwrap_or(0);

    FinancialRatios {
        debt_ratio: ratio_percent(
            numerator(MetricName::TotalLiabilities),
            key_metrics.current_of(MetricName::TotalEquity),
        ),
        operating_margin: ratio_percent(
            numerator(MetricName::OperatingProfit),
            key_metrics.current_of(MetricName::Revenue),
        ),
        net_margin: ratio_percent(
            numerator(MetricName::NetIncome),
            key_metrics.current_of(MetricName::Revenue),
        ),
    }
}
