use std::process::ExitCode;

use prospect_researcher::{
    config::Config,
    console::TerminalConsole,
    error::Result,
    llm::load_model,
    models::RunOutcome,
    Pipeline,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    // Logs go to stderr so they stay out of the way of prompts and the summary
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(outcome) => {
            tracing::info!(?outcome, "Run complete");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error during {}: {}", err.stage(), err);
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run() -> Result<RunOutcome> {
    let config = Config::load()?;

    println!("Loading summarization model {}...", config.model_id);
    let model = load_model(&config)?;

    let pipeline = Pipeline::new(config, model)?;
    let mut console = TerminalConsole::new();
    pipeline.run(&mut console)
}
