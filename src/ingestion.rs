use crate::schema::{LineItem, StatementType};
use log::debug;
use serde::{Deserialize, Serialize};

/// OpenDART status for a successful query.
pub const DART_STATUS_OK: &str = "000";
/// OpenDART status for "no data for the requested filing".
pub const DART_STATUS_NO_DATA: &str = "013";

/// One row of the OpenDART `fnlttSinglAcnt` response. All values arrive as strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DartAccountRecord {
    pub rcept_no: String,
    pub bsns_year: String,
    pub stock_code: String,
    pub reprt_code: String,
    pub account_nm: String,
    /// `CFS` consolidated, `OFS` separate.
    pub fs_div: String,
    pub fs_nm: String,
    /// `BS` balance sheet, `IS` income statement.
    pub sj_div: String,
    pub sj_nm: String,
    pub thstrm_nm: String,
    pub thstrm_dt: String,
    pub thstrm_amount: Option<String>,
    pub frmtrm_nm: String,
    pub frmtrm_dt: String,
    pub frmtrm_amount: Option<String>,
    pub ord: Option<String>,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DartResponse {
    pub status: String,
    pub message: String,
    pub list: Vec<DartAccountRecord>,
}

impl DartResponse {
    pub fn is_ok(&self) -> bool {
        self.status == DART_STATUS_OK
    }

    pub fn is_no_data(&self) -> bool {
        self.status == DART_STATUS_NO_DATA
    }
}

/// Parses a disclosed amount such as `"1,234,567"` or `"-5,000"`.
///
/// `-`, blank and unparseable values count as absent.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<i64>().ok()
}

impl DartAccountRecord {
    /// Converts to a [`LineItem`]; statements other than BS/IS yield `None`.
    pub fn to_line_item(&self) -> Option<LineItem> {
        let statement_type = StatementType::from_code(&self.sj_div)?;

        Some(LineItem {
            account_name: self.account_nm.trim().to_string(),
            fs_div: self.fs_div.clone(),
            statement_type,
            current_period_amount: self.thstrm_amount.as_deref().and_then(parse_amount),
            previous_period_amount: self.frmtrm_amount.as_deref().and_then(parse_amount),
            ordinal: self
                .ord
                .as_deref()
                .and_then(|o| o.trim().parse::<i64>().ok())
                .unwrap_or(0),
        })
    }
}

pub fn convert_records(records: &[DartAccountRecord]) -> Vec<LineItem> {
    let items: Vec<LineItem> = records
        .iter()
        .filter_map(DartAccountRecord::to_line_item)
        .collect();

    debug!(
        "Converted {} of {} OpenDART records into line items",
        items.len(),
        records.len()
    );
    items
}
