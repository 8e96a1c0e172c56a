use serde::{Deserialize, Serialize};
use reqwest::blocking::Client;
use tracing::{debug, info};
use crate::config::{Config, ModelBackend};
use crate::error::{Result, AppError};

/// Length bounds handed to the model for one chunk, in words/tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
}

impl GenerationParams {
    /// 60% of the chunk's words capped at 120, and 30% capped at 30.
    pub fn for_chunk(chunk: &str) -> Self {
        let words = chunk.split_whitespace().count();
        let max_length = (words * 6 / 10).min(120).max(1);
        let min_length = (words * 3 / 10).min(30).min(max_length);
        GenerationParams { max_length, min_length }
    }
}

/// A loaded pretrained summarization model.
///
/// Implementations are created once by [`load_model`] and only read afterwards.
pub trait SummaryModel {
    fn name(&self) -> &str;

    fn summarize(&self, text: &str, params: GenerationParams) -> Result<String>;
}

/// Loads the configured model. This can block for a while and is meant to be
/// called once, before the pipeline starts.
pub fn load_model(config: &Config) -> Result<Box<dyn SummaryModel>> {
    let client = Client::builder()
        .timeout(config.model_timeout)
        .build()
        .map_err(model_error)?;

    let model: Box<dyn SummaryModel> = match config.model_backend {
        ModelBackend::HuggingFace => Box::new(HuggingFaceModel::load(client, config)?),
        ModelBackend::OpenRouter => Box::new(OpenRouterModel::load(client, config)?),
    };
    info!(model = model.name(), "Summarization model ready");
    Ok(model)
}

fn model_error(err: reqwest::Error) -> AppError {
    AppError::ModelError(err.to_string())
}

#[derive(Deserialize)]
struct HubModelInfo {
    pipeline_tag: Option<String>,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_length: usize,
    min_length: usize,
    do_sample: bool,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Deserialize)]
struct InferenceOutput {
    summary_text: String,
}

/// Sequence-to-sequence summarizer served by the Hugging Face inference API.
pub struct HuggingFaceModel {
    client: Client,
    model_id: String,
    endpoint: String,
    token: Option<String>,
}

impl HuggingFaceModel {
    /// Confirms through the Hub that the model exists and is a summarization model.
    pub fn load(client: Client, config: &Config) -> Result<Self> {
        let hub_url = format!("{}/api/models/{}", config.hf_hub_url.trim_end_matches('/'), config.model_id);
        info!(model = %config.model_id, "Loading summarization model");

        let mut request = client.get(&hub_url);
        if let Some(token) = &config.hf_token {
            request = request.bearer_auth(token);
        }
        let info: HubModelInfo = request
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.json())
            .map_err(|e| AppError::ModelError(format!("Could not load model {}: {}", config.model_id, e)))?;

        match info.pipeline_tag.as_deref() {
            Some("summarization") => {}
            other => {
                return Err(AppError::ModelError(format!(
                    "Model {} is not a summarization model (pipeline: {})",
                    config.model_id,
                    other.unwrap_or("unknown")
                )));
            }
        }

        Ok(HuggingFaceModel {
            client,
            endpoint: format!("{}/{}", config.hf_inference_url.trim_end_matches('/'), config.model_id),
            model_id: config.model_id.clone(),
            token: config.hf_token.clone(),
        })
    }
}

impl SummaryModel for HuggingFaceModel {
    fn name(&self) -> &str {
        &self.model_id
    }

    fn summarize(&self, text: &str, params: GenerationParams) -> Result<String> {
        let body = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                max_length: params.max_length,
                min_length: params.min_length,
                do_sample: false,
            },
            options: InferenceOptions { wait_for_model: true },
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let res = request.send().map_err(model_error)?;
        let status = res.status();
        if !status.is_success() {
            let detail = res.text().unwrap_or_default();
            return Err(AppError::ModelError(format!("Inference failed ({}): {}", status, detail.trim())));
        }

        let outputs: Vec<InferenceOutput> = res.json().map_err(model_error)?;
        let summary = outputs
            .into_iter()
            .next()
            .map(|output| output.summary_text)
            .ok_or_else(|| AppError::ModelError("Empty response from summarization model".to_string()))?;

        debug!(chars = summary.len(), "Chunk summarized");
        Ok(summary)
    }
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

/// Chat model on OpenRouter, prompted to act as a summarizer.
pub struct OpenRouterModel {
    client: Client,
    model_id: String,
    endpoint: String,
    api_key: String,
}

impl OpenRouterModel {
    pub fn load(client: Client, config: &Config) -> Result<Self> {
        let api_key = config
            .openrouter_api_key
            .clone()
            .ok_or_else(|| AppError::ModelError("OPENROUTER_API_KEY is not set".to_string()))?;

        Ok(OpenRouterModel {
            client,
            model_id: config.model_id.clone(),
            endpoint: format!("{}/chat/completions", config.openrouter_url.trim_end_matches('/')),
            api_key,
        })
    }
}

pub fn build_prompt(content: &str, params: GenerationParams) -> String {
    let mut result = String::with_capacity(content.len() + 200);
    result.push_str(&format!(
        "Summarize the following text from a company website in plain prose, using between {} and {} words. Reply with the summary only, without headings or lists:\n\n",
        params.min_length, params.max_length
    ));
    result.push_str(content);
    result
}

impl SummaryModel for OpenRouterModel {
    fn name(&self) -> &str {
        &self.model_id
    }

    fn summarize(&self, text: &str, params: GenerationParams) -> Result<String> {
        let body = ChatRequest {
            model: self.model_id.clone(),
            messages: vec![
                Message {
                    role: "user".into(),
                    content: build_prompt(text, params),
                }
            ],
            temperature: 0.0,
        };

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .and_then(|res| res.error_for_status())
            .map_err(model_error)?;

        let json: serde_json::Value = res.json().map_err(model_error)?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AppError::ModelError("Invalid response format from LLM".to_string()))?
            .trim()
            .to_string();

        Ok(reply)
    }
}
