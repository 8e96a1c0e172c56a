use std::io::{self, BufRead, IsTerminal, Write};

use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{AppError, Result};

/// Everything the pipeline needs from the person at the keyboard.
pub trait Console {
    fn ask_line(&mut self, prompt: &str) -> Result<String>;

    fn ask_yes_no(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask_line(prompt)?;
        Ok(is_affirmative(&answer))
    }

    /// Called after each finished unit of work; `completed` never decreases.
    fn progress(&mut self, completed: usize, total: usize);

    fn say(&mut self, message: &str);
}

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("yes") || answer.eq_ignore_ascii_case("y")
}

/// Console backed by the real terminal: dialoguer prompts and an indicatif bar.
/// Falls back to plain line reads when stdin is not a terminal.
#[derive(Default)]
pub struct TerminalConsole {
    bar: Option<ProgressBar>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_bar(total: usize) -> ProgressBar {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("Progress [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} chunks ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar
    }
}

impl Console for TerminalConsole {
    fn ask_line(&mut self, prompt: &str) -> Result<String> {
        if io::stdin().is_terminal() {
            return Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
                .map_err(|e| AppError::ConsoleError(e.to_string()));
        }

        print!("{}: ", prompt);
        io::stdout().flush().map_err(|e| AppError::ConsoleError(e.to_string()))?;
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| AppError::ConsoleError(e.to_string()))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn progress(&mut self, completed: usize, total: usize) {
        let bar = self.bar.get_or_insert_with(|| Self::new_bar(total));
        bar.set_position(completed as u64);
        if completed >= total {
            bar.finish();
            self.bar = None;
        }
    }

    fn say(&mut self, message: &str) {
        println!("{}", message);
    }
}
