use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};

pub const DEFAULT_HF_MODEL: &str = "facebook/bart-large-cnn";
pub const DEFAULT_OPENROUTER_MODEL: &str = "deepseek/deepseek-chat-v3-0324";

/// Which service hosts the pretrained summarization model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelBackend {
    HuggingFace,
    OpenRouter,
}

impl FromStr for ModelBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(ModelBackend::HuggingFace),
            "openrouter" => Ok(ModelBackend::OpenRouter),
            other => Err(AppError::ConfigError(format!("Unknown model backend: {}", other))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub model_backend: ModelBackend,
    pub model_id: String,
    pub hf_token: Option<String>,
    pub hf_inference_url: String,
    pub hf_hub_url: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_url: String,
    pub fetch_timeout: Duration,
    pub model_timeout: Duration,
    pub chunk_chars: usize,
    pub max_summary_chars: usize,
    pub report_dir: PathBuf,
    pub report_file_name: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so tests do not
    /// have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let model_backend = match get("MODEL_BACKEND") {
            Some(value) => value.parse()?,
            None => ModelBackend::HuggingFace,
        };

        let model_id = get("SUMMARY_MODEL").unwrap_or_else(|| match model_backend {
            ModelBackend::HuggingFace => DEFAULT_HF_MODEL.to_string(),
            ModelBackend::OpenRouter => DEFAULT_OPENROUTER_MODEL.to_string(),
        });

        let fetch_secs = parse_positive(get("FETCH_TIMEOUT_SECS"), "FETCH_TIMEOUT_SECS", 10)?;
        let model_secs = parse_positive(get("MODEL_TIMEOUT_SECS"), "MODEL_TIMEOUT_SECS", 120)?;
        let chunk_chars = parse_positive(get("CHUNK_CHARS"), "CHUNK_CHARS", 500)?;
        let max_summary_chars = parse_positive(get("MAX_SUMMARY_CHARS"), "MAX_SUMMARY_CHARS", 2000)?;

        Ok(Config {
            model_backend,
            model_id,
            hf_token: get("HF_TOKEN"),
            hf_inference_url: get("HF_INFERENCE_URL")
                .unwrap_or_else(|| "https://router.huggingface.co/hf-inference/models".to_string()),
            hf_hub_url: get("HF_HUB_URL").unwrap_or_else(|| "https://huggingface.co".to_string()),
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_url: get("OPENROUTER_URL").unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
            fetch_timeout: Duration::from_secs(fetch_secs as u64),
            model_timeout: Duration::from_secs(model_secs as u64),
            chunk_chars,
            max_summary_chars,
            report_dir: get("REPORT_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
            report_file_name: get("REPORT_FILE_NAME"),
        })
    }
}

fn parse_positive(value: Option<String>, key: &str, default: usize) -> Result<usize> {
    let Some(value) = value else {
        return Ok(default);
    };
    let parsed = value
        .parse::<usize>()
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e)))?;
    if parsed == 0 {
        return Err(AppError::ConfigError(format!("{} must be greater than zero", key)));
    }
    Ok(parsed)
}
