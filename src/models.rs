use std::path::PathBuf;

/// Title, description and visible body text scraped from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    pub description: String,
    pub body_text: String,
}

impl PageContent {
    pub fn word_count(&self) -> usize {
        self.body_text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub summary_text: String,
    /// Number of chunks the body text was split into.
    pub chunk_count: usize,
}

/// How a run finished: either the summary went to the console or a report
/// was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Printed { summary: String },
    Report { path: PathBuf },
}
