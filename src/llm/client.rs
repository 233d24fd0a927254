use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, Result, ServiceFailure};
use crate::llm::generator::TextGenerator;
use crate::llm::prompts::SYSTEM_PROMPT_ANALYST;
use crate::llm::types::*;
use crate::report::StructuredReport;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` client usable as the analysis [`TextGenerator`].
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: Option<String>,
    response_schema: Option<serde_json::Value>,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.into(),
            system_prompt: Some(SYSTEM_PROMPT_ANALYST.to_string()),
            response_schema: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| AnalyzerError::Config("GEMINI_API_KEY is not set".to_string()))?;

        Ok(Self::new(api_key, config.gemini_model.clone()).with_timeout(config.request_timeout))
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Constrains every answer to the [`StructuredReport`] schema.
    ///
    /// Only suitable for a client dedicated to `analyze`; comparison answers are free text.
    pub fn with_structured_output(mut self) -> Result<Self> {
        self.response_schema = Some(StructuredReport::gemini_response_schema()?);
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let payload = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: self.system_prompt.as_ref().map(Content::user),
            generation_config: GenerationConfig {
                response_mime_type: self
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: self.response_schema.clone(),
            },
        };

        debug!("POST {} ({} prompt chars)", url, prompt.chars().count());

        let request = async {
            let res = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&payload)
                .send()
                .await
                .map_err(ServiceFailure::from)?;

            let status = res.status();
            if !status.is_success() {
                let body = res.text().await.map_err(ServiceFailure::from)?;
                return Err(ServiceFailure::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let body: GenerateContentResponse = res.json().await.map_err(ServiceFailure::from)?;
            body.first_text().ok_or(ServiceFailure::EmptyResponse)
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(failure)) => {
                warn!("Gemini request failed: {}", failure);
                Err(AnalyzerError::AiService(failure))
            }
            Err(_elapsed) => {
                warn!("Gemini request timed out after {:?}", self.timeout);
                Err(AnalyzerError::AiService(ServiceFailure::Timeout(self.timeout)))
            }
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_content(prompt).await
    }
}
