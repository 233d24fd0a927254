use crate::error::{AnalyzerError, Result};
use chrono::{Datelike, Local};

/// First business year OpenDART serves structured statements for.
pub const FIRST_DISCLOSURE_YEAR: i32 = 2015;

/// Percent change from `previous` to `current`.
///
/// Defined as 0 when `previous` is 0, whatever `current` is.
pub fn change_rate(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    (current as f64 - previous as f64) / previous as f64 * 100.0
}

/// `numerator / denominator * 100`, or 0 when the denominator is missing or zero.
pub fn ratio_percent(numerator: i64, denominator: Option<i64>) -> f64 {
    match denominator {
        Some(d) if d != 0 => numerator as f64 / d as f64 * 100.0,
        _ => 0.0,
    }
}

/// Renders a won amount with Korean units (조, 억, 만).
pub fn format_amount(amount: i64) -> String {
    if amount == 0 {
        return "0원".to_string();
    }

    let abs_amount = amount.unsigned_abs();
    let value = amount as f64;

    if abs_amount >= 1_000_000_000_000 {
        format!("{:.1}조원", value / 1_000_000_000_000.0)
    } else if abs_amount >= 100_000_000 {
        format!("{:.1}억원", value / 100_000_000.0)
    } else if abs_amount >= 10_000 {
        format!("{:.0}만원", value / 10_000.0)
    } else {
        format!("{}원", group_thousands(amount))
    }
}

pub fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if amount < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Returns the body of the first ```` ```json ```` fenced block, if any.
pub fn extract_fenced_json(raw: &str) -> Option<&str> {
    let start = raw.find("```json")? + "```json".len();
    let rest = &raw[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Truncates to `max_chars` characters, appending `...` when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

pub fn validate_business_year(year: i32) -> Result<()> {
    let current_year = Local::now().year();
    if !(FIRST_DISCLOSURE_YEAR..=current_year).contains(&year) {
        return Err(AnalyzerError::InvalidYear(year));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_rate() {
        assert!((change_rate(1_000_000, 800_000) - 25.0).abs() < 1e-9);
        assert!((change_rate(80, 100) - -20.0).abs() < 1e-9);
        assert_eq!(change_rate(123, 0), 0.0);
        assert_eq!(change_rate(0, 0), 0.0);
    }

    #[test]
    fn test_ratio_percent() {
        assert!((ratio_percent(1, Some(4)) - 25.0).abs() < 1e-9);
        assert_eq!(ratio_percent(1, Some(0)), 0.0);
        assert_eq!(ratio_percent(1, None), 0.0);
    }

    #[test]
    fn test_format_amount_units() {
        assert_eq!(format_amount(0), "0원");
        assert_eq!(format_amount(2_500_000_000_000), "2.5조원");
        assert_eq!(format_amount(-150_000_000), "-1.5억원");
        assert_eq!(format_amount(350_000), "35만원");
        assert_eq!(format_amount(9_999), "9,999원");
        assert_eq!(format_amount(-512), "-512원");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(100), "100");
        assert_eq!(group_thousands(-1_000), "-1,000");
    }

    #[test]
    fn test_extract_fenced_json() {
        let raw = "분석 결과입니다.\n```json\n{\"a\": 1}\n```\n끝";
        assert_eq!(extract_fenced_json(raw), Some("{\"a\": 1}"));
        assert_eq!(extract_fenced_json("no fence here"), None);
        assert_eq!(extract_fenced_json("```json {\"unterminated\": true}"), None);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("가나다라", 2), "가나...");
        assert_eq!(truncate_chars("가나", 2), "가나");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_validate_business_year() {
        assert!(validate_business_year(2023).is_ok());
        assert!(validate_business_year(2014).is_err());
        assert!(validate_business_year(Local::now().year() + 1).is_err());
    }
}
