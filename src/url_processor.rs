use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Node};
use tracing::info;
use url::Url;

use crate::error::{Error, Result};

/// Elements whose text is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

pub struct UrlProcessor {
    client: Client,
}

impl UrlProcessor {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetches `url` and returns the visible text of the page, one text
    /// node per line.
    pub fn scrape(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|source| Error::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        info!("Fetching documentation from {parsed}");
        let html = self.fetch_url(&parsed).map_err(|source| Error::Fetch {
            url: url.to_string(),
            source,
        })?;

        Ok(html_to_text(&html))
    }

    fn fetch_url(&self, url: &Url) -> reqwest::Result<String> {
        self.client
            .get(url.as_str())
            .send()?
            .error_for_status()?
            .text()
    }
}

impl Default for UrlProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Flattens an HTML document to its text nodes joined by newlines.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut pieces = Vec::new();
    collect_text(document.root_element(), &mut pieces);
    pieces.join("\n")
}

fn collect_text(element: ElementRef, output: &mut Vec<String>) {
    for node in element.children() {
        match node.value() {
            Node::Text(text) => output.push(String::from(&**text)),
            Node::Element(child) if HIDDEN_ELEMENTS.contains(&child.name()) => {}
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(node) {
                    collect_text(child_ref, output);
                }
            }
            _ => {}
        }
    }
}
