use std::time::Instant;

use reqwest::blocking::Client;
use tracing::info;

use crate::config::Config;
use crate::console::Console;
use crate::error::Result;
use crate::llm::SummaryModel;
use crate::models::{PageContent, RunOutcome, SummaryResult};
use crate::report::write_report;
use crate::scraper::{build_client, extract_page, fetch_html, normalize_url};
use crate::summarizer::Summarizer;

pub const URL_PROMPT: &str = "Enter a website URL (e.g. https://viso.ai/)";
pub const REPORT_PROMPT: &str = "Create PDF report? (YES / Enter to skip)";

/// Fetch, extract, summarize and report for a single company website.
pub struct Pipeline {
    config: Config,
    client: Client,
    summarizer: Summarizer,
}

impl Pipeline {
    /// `model` must already be loaded; see [`crate::llm::load_model`].
    pub fn new(config: Config, model: Box<dyn SummaryModel>) -> Result<Self> {
        let client = build_client(&config)?;
        let summarizer = Summarizer::new(model, &config);
        Ok(Pipeline { config, client, summarizer })
    }

    pub fn run(&self, console: &mut dyn Console) -> Result<RunOutcome> {
        let url_input = console.ask_line(URL_PROMPT)?;
        let (page, summary) = self.research(&url_input, console)?;

        if console.ask_yes_no(REPORT_PROMPT)? {
            let path = write_report(&page, &summary, &self.config)?;
            console.say(&format!("Report saved to {}", path.display()));
            Ok(RunOutcome::Report { path })
        } else {
            console.say(&format!("Summarized content: {}", summary.summary_text));
            Ok(RunOutcome::Printed { summary: summary.summary_text })
        }
    }

    /// Runs the fetch, extract and summarize stages for one URL.
    pub fn research(&self, url_input: &str, console: &mut dyn Console) -> Result<(PageContent, SummaryResult)> {
        let url = normalize_url(url_input)?;
        let start_time = Instant::now();

        let html = fetch_html(&self.client, &url)?;
        info!(elapsed = ?start_time.elapsed(), bytes = html.len(), "HTML fetch successful");

        let page = extract_page(url.as_str(), &html)?;

        console.say("Summarizing content... Please wait.");
        let summarize_start = Instant::now();
        let summary = self
            .summarizer
            .summarize(&page.body_text, |completed, total| console.progress(completed, total))?;
        info!(
            elapsed = ?summarize_start.elapsed(),
            chunks = summary.chunk_count,
            chars = summary.summary_text.chars().count(),
            "Summarization finished"
        );

        Ok((page, summary))
    }
}
