use async_trait::async_trait;
use cryptopulse_models::{AnalystConfig, MarketData};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::UpstreamError;
use crate::http::{ApiClient, ClientOptions};
use crate::prompts::{analysis_prompt, ANALYST_SYSTEM_PROMPT};
use crate::source::Analyst;

const SERVICE: &str = "language model API";

/// Chat-completion analyst. Single attempt per call.
pub struct OpenAiAnalyst {
    api: ApiClient,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiAnalyst {
    pub fn new(
        config: &AnalystConfig,
        api_key: Option<String>,
        options: ClientOptions,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            api: ApiClient::new(SERVICE, &config.base_url, HeaderMap::new(), options)?,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Analyst for OpenAiAnalyst {
    #[instrument(name = "AnalystCompletion", skip_all, fields(model = %self.model))]
    async fn analyze(&self, data: &MarketData) -> Result<String, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingCredential("OPENAI_API_KEY"))?;

        let prompt = analysis_prompt(data)
            .map_err(|e| UpstreamError::malformed(SERVICE, format!("prompt encoding: {e}")))?;
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: ANALYST_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
        };

        let body = self
            .api
            .post_json("/chat/completions", &request, Some(api_key))
            .await?;
        let response: ChatResponse = serde_json::from_value(body)
            .map_err(|e| UpstreamError::malformed(SERVICE, format!("completion: {e}")))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .ok_or(UpstreamError::EmptyCompletion { service: SERVICE })?
            .message
            .content
            .unwrap_or_default();
        debug!(chars = text.len(), "Analysis generated");
        Ok(text)
    }

    async fn close(&self) {
        debug!(service = self.api.service(), "Closing session");
    }
}
