pub mod config;
pub mod console;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod scraper;
pub mod summarizer;

pub use pipeline::Pipeline;
