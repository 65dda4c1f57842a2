use crate::config::AiConfig;
use crate::error::IngestError;
use crate::providers::prompt::RECIPE_SCHEMA_NAME;
use crate::providers::{
    build_extraction_prompt, recipe_schema, ExtractedRecipe, RecipeAi, EXTRACTION_SYSTEM_PROMPT,
};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    image_model: String,
    max_tokens: u32,
    timeout: Duration,
    image_timeout: Duration,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &AiConfig) -> Result<Self, IngestError> {
        // Try config first, then fall back to environment variables
        let api_key = config.resolve_api_key().ok_or_else(|| {
            IngestError::Config(config::ConfigError::NotFound(
                "ai.api_key (or OPENAI_API_KEY / OPENAI_KEY)".to_string(),
            ))
        })?;

        Ok(OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            image_model: config.image_model.clone(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout),
            image_timeout: Duration::from_secs(config.image_timeout),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        let defaults = AiConfig::default();
        OpenAIProvider {
            client: Client::new(),
            api_key,
            base_url,
            model,
            image_model: defaults.image_model,
            max_tokens: defaults.max_tokens,
            timeout: Duration::from_secs(defaults.timeout),
            image_timeout: Duration::from_secs(defaults.image_timeout),
        }
    }

    async fn post(&self, path: &str, body: Value, timeout: Duration) -> Result<Value, IngestError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json(response: Response) -> Result<Value, IngestError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IngestError::Extraction(format!(
            "AI service returned {}: {}",
            status, body
        )));
    }
    Ok(response.json().await?)
}

#[async_trait]
impl RecipeAi for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn extract_recipe(&self, page_text: &str) -> Result<ExtractedRecipe, IngestError> {
        let started = Instant::now();
        let response_body = self
            .post(
                "/v1/chat/completions",
                json!({
                    "model": self.model,
                    "messages": [
                        {"role": "system", "content": EXTRACTION_SYSTEM_PROMPT},
                        {"role": "user", "content": build_extraction_prompt(page_text)}
                    ],
                    "max_completion_tokens": self.max_tokens,
                    "response_format": {
                        "type": "json_schema",
                        "json_schema": {
                            "name": RECIPE_SCHEMA_NAME,
                            "schema": recipe_schema(),
                            "strict": true
                        }
                    }
                }),
                self.timeout,
            )
            .await?;
        debug!("{:?}", response_body);

        let content = response_body["choices"][0]["message"]["content"]
            .as_str()
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                IngestError::Extraction("empty AI chat completion response".to_string())
            })?;

        let recipe: ExtractedRecipe = serde_json::from_str(content)
            .map_err(|e| IngestError::Extraction(format!("malformed AI response: {}", e)))?;
        debug!(
            "AI extraction took {:?} for '{}'",
            started.elapsed(),
            recipe.title
        );
        Ok(recipe)
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, IngestError> {
        let response_body = self
            .post(
                "/v1/images/generations",
                json!({
                    "model": self.image_model,
                    "prompt": prompt,
                    "n": 1,
                    "size": "1024x1024",
                    "response_format": "url"
                }),
                self.image_timeout,
            )
            .await
            .map_err(|e| IngestError::Image(format!("failed to generate image: {}", e)))?;

        response_body["data"][0]["url"]
            .as_str()
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| IngestError::Image("no image URL returned".to_string()))
    }
}
