use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_REPORT_CODE: &str = "11011";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the external services. Absent API keys disable the matching capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub gemini_api_key: Option<String>,

    pub gemini_model: String,

    /// Upper bound for one generative call; expected latency is 10-30 seconds.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    pub opendart_api_key: Option<String>,

    /// OpenDART report code: 11011 annual, 11012 half-year, 11013 Q1, 11014 Q3.
    pub opendart_report_code: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            opendart_api_key: None,
            opendart_report_code: DEFAULT_REPORT_CODE.to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Reads `GEMINI_API_KEY`, `GEMINI_MODEL`, `AI_TIMEOUT_SECS`, `OPENDART_API_KEY` and
    /// `OPENDART_REPORT_CODE`, keeping defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            gemini_api_key: non_blank("GEMINI_API_KEY"),
            gemini_model: non_blank("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            request_timeout: non_blank("AI_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            opendart_api_key: non_blank("OPENDART_API_KEY"),
            opendart_report_code: non_blank("OPENDART_REPORT_CODE")
                .unwrap_or(defaults.opendart_report_code),
        }
    }

    pub fn ai_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
