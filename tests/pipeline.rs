use std::collections::VecDeque;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use prospect_researcher::{
    config::Config,
    console::Console,
    error::{AppError, Result},
    llm::{GenerationParams, SummaryModel},
    models::RunOutcome,
    pipeline::{REPORT_PROMPT, URL_PROMPT},
    Pipeline,
};

const ACME: &str = r#"<html><head><title>Acme Corp</title><meta name="description" content="We make widgets."></head><body><p>Acme Corp has been building widgets since 1990...</p></body></html>"#;

/// Answers prompts from a script and records everything shown to the user.
#[derive(Default)]
struct FakeConsole {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    progress: Vec<(usize, usize)>,
    messages: Vec<String>,
}

impl FakeConsole {
    fn answering(answers: &[&str]) -> Self {
        FakeConsole {
            answers: answers.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl Console for FakeConsole {
    fn ask_line(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| AppError::ConsoleError("no scripted answer left".to_string()))
    }

    fn progress(&mut self, completed: usize, total: usize) {
        self.progress.push((completed, total));
    }

    fn say(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// Returns a fixed sentence for every chunk.
struct CannedModel;

impl SummaryModel for CannedModel {
    fn name(&self) -> &str {
        "canned"
    }

    fn summarize(&self, _text: &str, _params: GenerationParams) -> Result<String> {
        Ok("Acme builds widgets.".to_string())
    }
}

fn config_in(dir: &Path) -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.report_dir = dir.to_path_buf();
    config
}

fn serve_acme(server: &mut mockito::Server) -> mockito::Mock {
    server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(ACME)
        .create()
}

fn pdf_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".pdf"))
        .collect()
}

#[test]
fn research_extracts_acme_page() {
    let mut server = mockito::Server::new();
    let _page = serve_acme(&mut server);
    let dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(config_in(dir.path()), Box::new(CannedModel)).unwrap();
    let mut console = FakeConsole::default();
    let (page, summary) = pipeline.research(&server.url(), &mut console).unwrap();

    assert_eq!(page.title, "Acme Corp");
    assert_eq!(page.description, "We make widgets.");
    assert_eq!(page.body_text, "Acme Corp has been building widgets since 1990...");
    assert_eq!(summary.summary_text, "Acme builds widgets.");
    assert_eq!(summary.chunk_count, 1);
    assert_eq!(console.progress, vec![(1, 1)]);
}

#[test]
fn fetch_timeout_aborts_without_report() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/", listener.local_addr().unwrap());
    let dir = tempfile::tempdir().unwrap();

    let mut config = config_in(dir.path());
    config.fetch_timeout = Duration::from_millis(300);
    let pipeline = Pipeline::new(config, Box::new(CannedModel)).unwrap();
    let mut console = FakeConsole::answering(&[url.as_str(), "YES"]);

    let err = pipeline.run(&mut console).unwrap_err();

    assert!(matches!(err, AppError::NetworkError(_)));
    assert_ne!(err.exit_code(), 0);
    assert_eq!(console.prompts, vec![URL_PROMPT.to_string()]);
    assert!(pdf_files(dir.path()).is_empty());
}

#[test]
fn skipping_report_prints_summary() {
    let mut server = mockito::Server::new();
    let _page = serve_acme(&mut server);
    let dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(config_in(dir.path()), Box::new(CannedModel)).unwrap();
    let mut console = FakeConsole::answering(&[server.url().as_str(), ""]);

    let outcome = pipeline.run(&mut console).unwrap();

    assert_eq!(outcome, RunOutcome::Printed { summary: "Acme builds widgets.".to_string() });
    assert_eq!(console.prompts, vec![URL_PROMPT.to_string(), REPORT_PROMPT.to_string()]);
    assert!(console.messages.iter().any(|m| m.contains("Acme builds widgets.")));
    assert!(pdf_files(dir.path()).is_empty());
}

#[test]
fn yes_writes_pdf_report() {
    let mut server = mockito::Server::new();
    let _page = serve_acme(&mut server);
    let dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(config_in(dir.path()), Box::new(CannedModel)).unwrap();
    let mut console = FakeConsole::answering(&[server.url().as_str(), "YES"]);

    let outcome = pipeline.run(&mut console).unwrap();

    let expected = dir.path().join("Acme_Corp_Prospect_Report.pdf");
    assert_eq!(outcome, RunOutcome::Report { path: expected.clone() });
    assert!(expected.exists());

    let text = lopdf::Document::load(&expected).unwrap().extract_text(&[1]).unwrap();
    assert!(text.contains("Acme Corp"));
    assert!(text.contains("We make widgets."));
    assert!(text.contains("Acme builds widgets."));
}

#[test]
fn invalid_url_fails_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(config_in(dir.path()), Box::new(CannedModel)).unwrap();
    let mut console = FakeConsole::answering(&["ftp://files.example.com"]);

    let err = pipeline.run(&mut console).unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[test]
fn model_failure_stops_the_run() {
    struct BrokenModel;

    impl SummaryModel for BrokenModel {
        fn name(&self) -> &str {
            "broken"
        }

        fn summarize(&self, _text: &str, _params: GenerationParams) -> Result<String> {
            Err(AppError::ModelError("out of memory".to_string()))
        }
    }

    let mut server = mockito::Server::new();
    let _page = serve_acme(&mut server);
    let dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(config_in(dir.path()), Box::new(BrokenModel)).unwrap();
    let mut console = FakeConsole::answering(&[server.url().as_str(), "YES"]);

    let err = pipeline.run(&mut console).unwrap_err();
    assert!(matches!(err, AppError::ModelError(_)));
    assert_eq!(err.exit_code(), 4);
    assert!(pdf_files(dir.path()).is_empty());
}

#[test]
fn long_pages_report_monotonic_progress() {
    let body = "<p>Acme ships widgets to every continent. </p>".repeat(60);
    let html = format!("<html><head><title>Acme</title></head><body>{}</body></html>", body);

    let mut server = mockito::Server::new();
    let _page = server.mock("GET", "/").with_body(html).create();
    let dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(config_in(dir.path()), Box::new(CannedModel)).unwrap();
    let mut console = FakeConsole::default();
    let (_, summary) = pipeline.research(&server.url(), &mut console).unwrap();

    let total = summary.chunk_count;
    assert!(total > 1);
    let expected: Vec<(usize, usize)> = (1..=total).map(|done| (done, total)).collect();
    assert_eq!(console.progress, expected);
}

#[test]
fn script_only_page_still_completes() {
    let html = r#"<html><head><title></title></head><body><div id="root"></div><script>render()</script></body></html>"#;

    let mut server = mockito::Server::new();
    let _page = server.mock("GET", "/").with_body(html).create();
    let dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(config_in(dir.path()), Box::new(CannedModel)).unwrap();
    let mut console = FakeConsole::answering(&[server.url().as_str(), ""]);

    let outcome = pipeline.run(&mut console).unwrap();

    assert_eq!(outcome, RunOutcome::Printed { summary: String::new() });
    assert!(console.progress.is_empty());
}
