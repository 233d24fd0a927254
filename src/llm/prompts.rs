// Prompt construction for the analysis and comparison requests.
// Everything here is a pure function of its inputs.

use crate::metrics::{KeyMetrics, MetricName};
use crate::schema::{CompanyInfo, FsDiv, NormalizedStatement};
use crate::utils::format_amount;

pub const SYSTEM_PROMPT_ANALYST: &str = r#"
You are a senior financial analyst covering Korean listed and unlisted companies.
You read statements disclosed through OpenDART (amounts in KRW) and write objective,
balanced assessments in Korean.

## RULES
- Base every judgement on the figures provided. Do not invent numbers.
- Scores are on a 0.0 to 5.0 scale.
- When asked for JSON, return ONLY the JSON document, without commentary.
"#;

const ANALYSIS_REQUEST: &str = r#"
## 분석 요청사항
다음 항목들을 포함하여 전문적이고 실용적인 분석을 제공해주세요:

1. **재무 건전성 평가** (5점 만점)
   - 수익성, 안정성, 성장성, 활동성 관점에서 평가
   - 각 항목별 점수와 근거 제시

2. **주요 강점과 약점**
   - 재무적 강점 3가지
   - 개선이 필요한 약점 3가지

3. **전년 대비 변화 분석**
   - 주요 지표 변화의 원인 분석
   - 긍정적/부정적 변화 요인

4. **투자 관점 분석**
   - 투자 매력도 평가 (HIGH / MEDIUM / LOW)
   - 리스크 요인 식별
   - 투자 시 고려사항

5. **향후 전망 및 권고사항**
   - 단기/중기 전망
   - 경영진에게 권고할 사항

응답은 다음 JSON 형식으로만 제공해주세요:

```json
{
    "overall_score": 4.2,
    "financial_health": {
        "profitability": { "score": 4.5, "comment": "..." },
        "stability": { "score": 4.0, "comment": "..." },
        "growth": { "score": 4.0, "comment": "..." },
        "activity": { "score": 4.2, "comment": "..." }
    },
    "strengths": ["강점1", "강점2", "강점3"],
    "weaknesses": ["약점1", "약점2", "약점3"],
    "year_over_year": {
        "positive_changes": ["긍정적 변화1", "긍정적 변화2"],
        "negative_changes": ["부정적 변화1", "부정적 변화2"],
        "analysis": "전년 대비 변화 종합 분석"
    },
    "investment_perspective": {
        "attractiveness": "MEDIUM",
        "risk_factors": ["리스크1", "리스크2"],
        "considerations": ["고려사항1", "고려사항2"]
    },
    "outlook_and_recommendations": {
        "short_term_outlook": "단기 전망",
        "medium_term_outlook": "중기 전망",
        "recommendations": ["권고사항1", "권고사항2", "권고사항3"]
    },
    "summary": "3-4줄 요약"
}
```

분석은 객관적이고 균형잡힌 관점에서 작성해주세요.
"#;

const COMPARISON_REQUEST: &str = r#"
## 비교 분석 요청사항
1. **규모별 비교**: 매출액, 자산 규모 기준 순위
2. **수익성 비교**: 영업이익률, 순이익률 비교
3. **성장성 비교**: 전년 대비 성장률 비교
4. **각 기업의 특징**: 업종별 특성과 경쟁력
5. **투자 관점**: 각 기업의 투자 매력도 순위

간결하고 명확하게 비교 분석해주세요.
"#;

const COMPARISON_METRICS: [MetricName; 4] = [
    MetricName::Revenue,
    MetricName::OperatingProfit,
    MetricName::NetIncome,
    MetricName::TotalAssets,
];

/// Everything the analysis prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisPromptInput<'a> {
    pub company: &'a CompanyInfo,
    pub year: i32,
    pub balance_sheet: &'a NormalizedStatement,
    pub income_statement: &'a NormalizedStatement,
    pub key_metrics: &'a KeyMetrics,
}

pub fn build_analysis_prompt(input: &AnalysisPromptInput<'_>) -> String {
    let company = input.company;
    let mut prompt = format!(
        "다음은 {}의 {}년 재무제표 데이터입니다. 전문적인 재무분석가 관점에서 상세하게 분석해주세요.\n\n",
        company.corp_name, input.year
    );

    prompt.push_str("## 회사 정보\n");
    prompt.push_str(&format!("- 회사명: {}\n", company.corp_name));
    prompt.push_str(&format!("- 고유번호: {}\n", company.corp_code));
    prompt.push_str(&format!(
        "- 종목코드: {}\n",
        company.listed_stock_code().unwrap_or("비상장")
    ));
    prompt.push_str(&format!("- 분석연도: {}년\n\n", input.year));

    prompt.push_str(&render_key_metrics(input.key_metrics));
    prompt.push_str(&render_statement(input.balance_sheet));
    prompt.push_str(&render_statement(input.income_statement));

    prompt.push_str(ANALYSIS_REQUEST);
    prompt
}

/// One company's figures inside a comparison request.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonEntry<'a> {
    pub company: &'a CompanyInfo,
    pub key_metrics: &'a KeyMetrics,
}

pub fn build_comparison_prompt(entries: &[ComparisonEntry<'_>], year: i32) -> String {
    let mut prompt = format!(
        "다음은 {}년 주요 기업들의 재무제표 데이터입니다. 이들 기업을 비교 분석해주세요.\n\n",
        year
    );

    for (i, entry) in entries.iter().enumerate() {
        prompt.push_str(&format!("## {}. {}\n", i + 1, entry.company.corp_name));
        prompt.push_str(&format!(
            "- 종목코드: {}\n",
            entry.company.listed_stock_code().unwrap_or("비상장")
        ));

        for name in COMPARISON_METRICS {
            if let Some(metric) = entry.key_metrics.get(name) {
                prompt.push_str(&format!(
                    "- {}: {} (전년대비 {:+.1}%)\n",
                    name.label(),
                    format_amount(metric.current),
                    metric.change_rate
                ));
            }
        }

        let ratios = &entry.key_metrics.ratios;
        prompt.push_str(&format!("- 영업이익률: {:.1}%\n", ratios.operating_margin));
        prompt.push_str(&format!("- 순이익률: {:.1}%\n\n", ratios.net_margin));
    }

    prompt.push_str(COMPARISON_REQUEST);
    prompt
}

fn render_key_metrics(key_metrics: &KeyMetrics) -> String {
    let mut section = String::from("## 주요 재무지표\n");

    if key_metrics.metrics.is_empty() {
        section.push_str("- (연결 기준 주요 지표 없음)\n");
    }

    for name in MetricName::ALL {
        if let Some(metric) = key_metrics.get(name) {
            section.push_str(&format!(
                "- {}: {} (전년대비 {:+.1}%, 전년: {})\n",
                name.label(),
                format_amount(metric.current),
                metric.change_rate,
                format_amount(metric.previous)
            ));
        }
    }

    let ratios = &key_metrics.ratios;
    section.push_str("\n## 주요 재무비율\n");
    section.push_str(&format!("- 부채비율: {:.1}%\n", ratios.debt_ratio));
    section.push_str(&format!("- 영업이익률: {:.1}%\n", ratios.operating_margin));
    section.push_str(&format!("- 순이익률: {:.1}%\n\n", ratios.net_margin));
    section
}

// Consolidated rows when present, otherwise the separate basis.
fn render_statement(statement: &NormalizedStatement) -> String {
    let fs_div = if statement.rows_for(FsDiv::Consolidated).next().is_some() {
        FsDiv::Consolidated
    } else {
        FsDiv::Separate
    };

    let mut section = format!(
        "## {} ({})\n",
        statement.statement_type.label(),
        fs_div.label()
    );
    for row in statement.rows_for(fs_div) {
        section.push_str(&format!(
            "- {}: {} (전년: {})\n",
            row.account_name,
            format_amount(row.current.amount),
            format_amount(row.previous.amount)
        ));
    }
    section.push('\n');
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute_key_metrics;
    use crate::normalizer::normalize;
    use crate::schema::{LineItem, StatementType};

    fn company(stock_code: &str) -> CompanyInfo {
        CompanyInfo {
            corp_code: "00126380".to_string(),
            corp_name: "삼성전자".to_string(),
            corp_eng_name: String::new(),
            stock_code: stock_code.to_string(),
            modify_date: String::new(),
        }
    }

    fn statements() -> (NormalizedStatement, NormalizedStatement) {
        let bs = StatementType::BalanceSheet;
        let is = StatementType::IncomeStatement;
        let item = |name: &str, fs_div, statement_type, current, previous, ordinal| {
            LineItem::new(name, fs_div, statement_type, Some(current), Some(previous), ordinal)
        };
        let items = vec![
            item("자산총계", FsDiv::Consolidated, bs, 455_905_980_000_000, 448_424_507_000_000, 1),
            item("자산총계", FsDiv::Separate, bs, 1, 1, 1),
            item("매출액", FsDiv::Consolidated, is, 258_935_494_000_000, 302_231_360_000_000, 1),
            item("법인세차감전 순이익", FsDiv::Separate, is, 5, 4, 2),
        ];
        (
            normalize(&items, StatementType::BalanceSheet).unwrap(),
            normalize(&items, StatementType::IncomeStatement).unwrap(),
        )
    }

    #[test]
    fn test_analysis_prompt_contents() {
        let (bs, is) = statements();
        let metrics = compute_key_metrics(&bs, &is);
        let company = company("005930");
        let input = AnalysisPromptInput {
            company: &company,
            year: 2023,
            balance_sheet: &bs,
            income_statement: &is,
            key_metrics: &metrics,
        };

        let prompt = build_analysis_prompt(&input);
        assert!(prompt.contains("삼성전자의 2023년 재무제표"));
        assert!(prompt.contains("- 종목코드: 005930"));
        assert!(prompt.contains("- 총자산: 455.9조원 (전년대비 +1.7%, 전년: 448.4조원)"));
        assert!(prompt.contains("- 매출액: 258.9조원 (전년대비 -14.3%"));
        assert!(prompt.contains("## 재무상태표 (연결재무제표)"));
        assert!(prompt.contains("\"overall_score\""));
        // separate rows only appear when no consolidated rows exist
        assert!(!prompt.contains("법인세차감전 순이익"));
    }

    #[test]
    fn test_analysis_prompt_is_deterministic() {
        let (bs, is) = statements();
        let metrics = compute_key_metrics(&bs, &is);
        let company = company("");
        let input = AnalysisPromptInput {
            company: &company,
            year: 2023,
            balance_sheet: &bs,
            income_statement: &is,
            key_metrics: &metrics,
        };

        let first = build_analysis_prompt(&input);
        assert_eq!(first, build_analysis_prompt(&input));
        assert!(first.contains("- 종목코드: 비상장"));
    }

    #[test]
    fn test_separate_only_statement_rendered() {
        let items = vec![LineItem::new(
            "매출액",
            FsDiv::Separate,
            StatementType::IncomeStatement,
            Some(1_000_000_000),
            Some(500_000_000),
            1,
        )];
        let is = normalize(&items, StatementType::IncomeStatement).unwrap();
        let prompt = render_statement(&is);
        assert!(prompt.contains("## 손익계산서 (재무제표)"));
        assert!(prompt.contains("- 매출액: 10.0억원 (전년: 5.0억원)"));
    }

    #[test]
    fn test_comparison_prompt() {
        let (bs, is) = statements();
        let metrics = compute_key_metrics(&bs, &is);
        let a = company("005930");
        let mut b = company("");
        b.corp_name = "테스트".to_string();

        let entries = [
            ComparisonEntry { company: &a, key_metrics: &metrics },
            ComparisonEntry { company: &b, key_metrics: &KeyMetrics::default() },
        ];
        let prompt = build_comparison_prompt(&entries, 2023);
        assert!(prompt.starts_with("다음은 2023년 주요 기업들의"));
        assert!(prompt.contains("## 1. 삼성전자"));
        assert!(prompt.contains("## 2. 테스트"));
        assert!(prompt.contains("- 매출액: 258.9조원 (전년대비 -14.3%)"));
        assert!(prompt.contains("비교 분석 요청사항"));
    }
}
