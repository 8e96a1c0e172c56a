#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to fetch page: {0}")]
    NetworkError(String),

    #[error("Error parsing content: {0}")]
    ParseError(String),

    #[error("Summarization model error: {0}")]
    ModelError(String),

    #[error("Failed to write report: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Console error: {0}")]
    ConsoleError(String),
}

impl AppError {
    /// Human-readable name of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::NetworkError(_) => "fetch",
            AppError::ParseError(_) => "extraction",
            AppError::ModelError(_) => "summarization",
            AppError::IoError(_) => "report writing",
            AppError::ConfigError(_) => "configuration",
            AppError::InvalidInput(_) => "input validation",
            AppError::ConsoleError(_) => "console interaction",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NetworkError(_) => 2,
            AppError::ParseError(_) => 3,
            AppError::ModelError(_) => 4,
            AppError::IoError(_) => 5,
            AppError::ConfigError(_) | AppError::InvalidInput(_) | AppError::ConsoleError(_) => 1,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::NetworkError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<printpdf::Error> for AppError {
    fn from(err: printpdf::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
