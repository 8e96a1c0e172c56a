//! Chunked summarization of page text.
//!
//! Body text is cut into chunks of at most `chunk_chars` characters. Sentences
//! (ending in `.`, `!` or `?` followed by whitespace) are packed greedily into
//! chunks; a sentence that alone exceeds the limit is split between words, and
//! a single oversized word is cut between characters. The boundaries depend
//! only on the text and the limit.

use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::Result;
use crate::llm::{GenerationParams, SummaryModel};
use crate::models::SummaryResult;

pub struct Summarizer {
    model: Box<dyn SummaryModel>,
    chunk_chars: usize,
    max_summary_chars: usize,
}

impl Summarizer {
    pub fn new(model: Box<dyn SummaryModel>, config: &Config) -> Self {
        Summarizer {
            model,
            chunk_chars: config.chunk_chars.max(1),
            max_summary_chars: config.max_summary_chars,
        }
    }

    /// Summarizes every chunk in order and calls `progress(completed, total)`
    /// after each one.
    #[instrument(skip_all, fields(model = self.model.name()))]
    pub fn summarize<F>(&self, body_text: &str, mut progress: F) -> Result<SummaryResult>
    where
        F: FnMut(usize, usize),
    {
        let chunks = split_into_chunks(body_text, self.chunk_chars);
        let total = chunks.len();
        info!(chunks = total, chars = body_text.chars().count(), "Summarizing content");

        let mut parts = Vec::with_capacity(total);
        for (index, chunk) in chunks.iter().enumerate() {
            let params = GenerationParams::for_chunk(chunk);
            debug!(chunk = index + 1, ?params, "Summarizing chunk");
            let summary = self.model.summarize(chunk, params)?;
            let summary = summary.trim();
            if !summary.is_empty() {
                parts.push(summary.to_string());
            }
            progress(index + 1, total);
        }

        Ok(SummaryResult {
            summary_text: truncate_chars(&parts.join(" "), self.max_summary_chars),
            chunk_count: total,
        })
    }
}

pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    for sentence in split_sentences(text) {
        if char_len(sentence) <= max_chars {
            pieces.push(sentence.to_string());
        } else {
            pieces.extend(wrap_words(sentence, max_chars));
        }
    }
    pack(pieces, max_chars)
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next_i, next)) = chars.peek() {
                if next.is_whitespace() {
                    sentences.push(&text[start..next_i]);
                    start = next_i;
                }
            }
        }
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Greedy word wrap into lines of at most `max_chars` characters.
fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut words = Vec::new();
    for word in text.split_whitespace() {
        if char_len(word) <= max_chars {
            words.push(word.to_string());
        } else {
            let chars: Vec<char> = word.chars().collect();
            words.extend(chars.chunks(max_chars).map(|piece| piece.iter().collect::<String>()));
        }
    }
    pack(words, max_chars)
}

/// Joins pieces with single spaces into runs no longer than `max_chars`.
fn pack(pieces: Vec<String>, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        let piece_len = char_len(&piece);
        if current_len > 0 && current_len + 1 + piece_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(&piece);
        current_len += piece_len;
    }
    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}

/// Cuts `text` to at most `max_chars` characters, at the last word boundary
/// when there is one.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];

    let next_is_space = text[cut..].starts_with(char::is_whitespace);
    if next_is_space {
        return head.trim_end().to_string();
    }
    match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => head[..space].trim_end().to_string(),
        _ => head.to_string(),
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
