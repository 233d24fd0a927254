use crate::utils::{extract_fenced_json, truncate_chars};
use log::warn;
use schemars::schema::RootSchema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const RAW_SUMMARY_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct HealthScore {
    #[schemars(description = "Score from 0.0 to 5.0")]
    pub score: f64,

    #[schemars(description = "Reasoning behind the score")]
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FinancialHealth {
    #[schemars(description = "Profitability (수익성)")]
    pub profitability: HealthScore,

    #[schemars(description = "Stability (안정성)")]
    pub stability: HealthScore,

    #[schemars(description = "Growth (성장성)")]
    pub growth: HealthScore,

    #[schemars(description = "Activity / efficiency (활동성)")]
    pub activity: HealthScore,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Attractiveness {
    #[serde(alias = "High", alias = "high", alias = "높음")]
    High,

    #[serde(alias = "Medium", alias = "medium", alias = "보통")]
    Medium,

    #[serde(alias = "Low", alias = "low", alias = "낮음")]
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct InvestmentPerspective {
    #[schemars(description = "Overall investment attractiveness")]
    pub attractiveness: Attractiveness,

    pub risk_factors: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Points an investor should weigh before investing")]
    pub considerations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct YearOverYear {
    #[serde(default)]
    pub positive_changes: Vec<String>,

    #[serde(default)]
    pub negative_changes: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Overall explanation of the changes against the previous year")]
    pub analysis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct OutlookAndRecommendations {
    #[serde(default)]
    pub short_term_outlook: String,

    #[serde(default)]
    pub medium_term_outlook: String,

    #[serde(default)]
    #[schemars(description = "Recommendations addressed to management")]
    pub recommendations: Vec<String>,
}

/// The structured assessment the model is asked to return.
///
/// Values are taken verbatim: scores outside 0..=5 are not clamped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct StructuredReport {
    #[schemars(description = "Overall financial health score from 0.0 to 5.0")]
    pub overall_score: f64,

    pub financial_health: FinancialHealth,

    #[schemars(description = "Three key financial strengths")]
    pub strengths: Vec<String>,

    #[schemars(description = "Three weaknesses needing improvement")]
    pub weaknesses: Vec<String>,

    pub investment_perspective: InvestmentPerspective,

    #[schemars(description = "Three to four line summary")]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_over_year: Option<YearOverYear>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlook_and_recommendations: Option<OutlookAndRecommendations>,

    /// The model's verbatim answer, attached after parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub raw_response: Option<String>,
}

impl StructuredReport {
    pub fn generate_json_schema() -> RootSchema {
        schemars::schema_for!(StructuredReport)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }

    /// Schema in the subset accepted by Gemini's `response_schema`.
    pub fn gemini_response_schema() -> serde_json::Result<Value> {
        clean_schema(Self::generate_json_schema())
    }
}

fn default_parsing_error() -> bool {
    true
}

/// Fallback carrying the model's verbatim text when it could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawReport {
    #[serde(default = "default_parsing_error")]
    pub parsing_error: bool,

    pub raw_response: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub reason: String,
}

impl RawReport {
    pub fn new(raw_response: impl Into<String>, reason: impl Into<String>) -> Self {
        let raw_response = raw_response.into();
        Self {
            parsing_error: true,
            summary: truncate_chars(&raw_response, RAW_SUMMARY_CHARS),
            raw_response,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AnalysisReport {
    Structured(StructuredReport),
    Raw(RawReport),
}

impl AnalysisReport {
    /// Parses a model response, degrading to [`RawReport`] instead of failing.
    ///
    /// The whole text is tried first, then the first ```` ```json ```` fenced block.
    pub fn parse(raw: &str) -> Self {
        let whole_err = match serde_json::from_str::<StructuredReport>(raw.trim()) {
            Ok(report) => return Self::structured(report, raw),
            Err(e) => e,
        };

        let reason = match extract_fenced_json(raw) {
            Some(block) => match serde_json::from_str::<StructuredReport>(block) {
                Ok(report) => return Self::structured(report, raw),
                Err(e) => format!("JSON parse error: {}", e),
            },
            None => format!("No JSON document found: {}", whole_err),
        };

        warn!("Falling back to raw analysis report: {}", reason);
        Self::Raw(RawReport::new(raw, reason))
    }

    fn structured(mut report: StructuredReport, raw: &str) -> Self {
        report.raw_response = Some(raw.to_string());
        Self::Structured(report)
    }

    /// The model's verbatim answer, whichever way it parsed.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Structured(report) => report.raw_response.as_deref(),
            Self::Raw(report) => Some(&report.raw_response),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn as_structured(&self) -> Option<&StructuredReport> {
        match self {
            Self::Structured(report) => Some(report),
            Self::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&RawReport> {
        match self {
            Self::Raw(report) => Some(report),
            Self::Structured(_) => None,
        }
    }
}

/// Inlines `$ref`s and strips keywords Gemini rejects (`$schema`, `definitions`, `title`,
/// `format`, `additionalProperties`, `default`). Nullable unions collapse to `nullable: true`.
pub fn clean_schema(root: RootSchema) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(root)?;
    let definitions = value
        .as_object_mut()
        .and_then(|obj| obj.remove("definitions"))
        .unwrap_or(Value::Null);
    Ok(clean_node(value, &definitions))
}

fn clean_node(value: Value, definitions: &Value) -> Value {
    match value {
        Value::Object(map) => clean_object(map, definitions),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| clean_node(item, definitions))
                .collect(),
        ),
        other => other,
    }
}

fn clean_object(mut map: Map<String, Value>, definitions: &Value) -> Value {
    if let Some(Value::String(reference)) = map.get("$ref") {
        let name = reference.trim_start_matches("#/definitions/");
        let mut resolved = definitions
            .get(name)
            .cloned()
            .map(|def| clean_node(def, definitions))
            .unwrap_or_else(|| Value::Object(Map::new()));
        if let (Some(description), Value::Object(obj)) = (map.get("description"), &mut resolved) {
            obj.insert("description".to_string(), description.clone());
        }
        return resolved;
    }

    // Single-member allOf wraps a described $ref.
    if let Some(Value::Array(mut members)) = map.remove("allOf") {
        if members.len() == 1 {
            let inner = clean_node(members.remove(0), definitions);
            return merge_description(inner, map.remove("description"));
        }
        map.insert("allOf".to_string(), Value::Array(members));
    }

    if let Some(Value::Array(members)) = map.remove("anyOf") {
        let has_null = members.iter().any(is_null_schema);
        let mut concrete: Vec<Value> = members.into_iter().filter(|m| !is_null_schema(m)).collect();
        if has_null && concrete.len() == 1 {
            let mut inner = clean_node(concrete.remove(0), definitions);
            if let Value::Object(obj) = &mut inner {
                obj.insert("nullable".to_string(), Value::Bool(true));
            }
            return merge_description(inner, map.remove("description"));
        }
        map.insert(
            "anyOf".to_string(),
            clean_node(Value::Array(concrete), definitions),
        );
    }

    let mut out = Map::new();
    for (key, val) in map {
        match key.as_str() {
            "$schema" | "definitions" | "title" | "format" | "additionalProperties"
            | "default" => {}
            "properties" => {
                let props = match val {
                    Value::Object(props) => props
                        .into_iter()
                        .map(|(name, schema)| (name, clean_node(schema, definitions)))
                        .collect(),
                    _ => Map::new(),
                };
                out.insert(key, Value::Object(props));
            }
            "type" => match val {
                Value::Array(types) => {
                    let nullable = types.iter().any(|t| t == "null");
                    if let Some(first) = types.into_iter().find(|t| t != "null") {
                        out.insert(key, first);
                    }
                    if nullable {
                        out.insert("nullable".to_string(), Value::Bool(true));
                    }
                }
                other => {
                    out.insert(key, other);
                }
            },
            _ => {
                out.insert(key, clean_node(val, definitions));
            }
        }
    }
    Value::Object(out)
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

fn merge_description(mut schema: Value, description: Option<Value>) -> Value {
    if let (Some(description), Value::Object(obj)) = (description, &mut schema) {
        obj.insert("description".to_string(), description);
    }
    schema
}
