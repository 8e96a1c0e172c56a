use reqwest::Url;
use reqwest::blocking::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Node, Selector};
use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::PageContent;

// Create static selectors to avoid recompiling them each time
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("Failed to parse title selector")
});

static META_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name][content]").expect("Failed to parse meta selector")
});

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to parse body selector")
});

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

const USER_AGENT: &str = concat!("prospect-researcher/", env!("CARGO_PKG_VERSION"));

pub fn build_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .timeout(config.fetch_timeout)
        .connect_timeout(config.fetch_timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Trims the input and prefixes `https://` when no scheme was typed.
pub fn normalize_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("No URL given".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| AppError::InvalidInput(format!("'{}' is not a valid URL: {}", trimmed, e)))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(AppError::InvalidInput(format!(
            "'{}' is not a web address (scheme '{}')",
            trimmed, scheme
        ))),
    }
}

pub fn fetch_html(client: &Client, url: &Url) -> Result<String> {
    info!(%url, "Fetching page");
    let response = client.get(url.clone()).send()?.error_for_status()?;
    let html = response.text()?;
    debug!(bytes = html.len(), "Fetched page body");
    Ok(html)
}

pub fn extract_page(url: &str, html: &str) -> Result<PageContent> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let description = document
        .select(&META_SELECTOR)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    let mut raw_text = String::new();
    for body in document.select(&BODY_SELECTOR) {
        collect_visible_text(body, &mut raw_text);
    }
    let body_text = collapse_whitespace(&raw_text);

    let page = PageContent {
        url: url.to_string(),
        title,
        description,
        body_text,
    };

    info!(
        title = %page.title,
        words = page.word_count(),
        "Extracted page content"
    );
    Ok(page)
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_visible_text(child_element, out);
                }
            }
            _ => {}
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
