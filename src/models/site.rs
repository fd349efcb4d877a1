use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Declarative price-text normalization. The rule only strips characters;
/// it never interprets separators or currency symbols.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CleanupRule {
    /// Strip every non-digit character, concatenating the remaining digits.
    #[default]
    DigitsOnly,
    /// Drop a trailing decimal fraction of one or two digits first, so
    /// "1,299.90" reads as 1299 rather than 129990, then strip non-digits.
    IntegerPart,
}

fn decimal_tail() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.,]\d{1,2}\s*$").unwrap())
}

impl CleanupRule {
    /// Reduce raw display text to a digit string.
    pub fn apply(&self, text: &str) -> String {
        let text = text.trim();
        let stripped = match self {
            CleanupRule::DigitsOnly => text.to_string(),
            CleanupRule::IntegerPart => decimal_tail().replace(text, "").into_owned(),
        };
        stripped.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    /// Clean and parse. Returns `None` for text with no digits and for a
    /// parsed value of zero; a displayed price is positive or absent.
    pub fn parse_price(&self, text: &str) -> Option<u32> {
        let digits = self.apply(text);
        if digits.is_empty() {
            return None;
        }
        match digits.parse::<u32>() {
            Ok(0) => None,
            Ok(price) => Some(price),
            Err(_) => None, // overflow: not a believable retail price
        }
    }
}

/// Static per-competitor configuration. Data, not behavior: everything a
/// `SiteAdapter` needs to turn a product query into a price quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorSite {
    pub id: String,
    pub name: String,
    pub base_url: String,
    /// Full search URL with a `{query}` placeholder.
    pub search_url_template: String,
    /// Element that signals the results page has finished rendering.
    pub ready_selector: String,
    /// Tried in order; the first selector matching any node wins.
    pub price_selectors: Vec<String>,
    #[serde(default)]
    pub cleanup: CleanupRule,
    /// Substrings of the landed URL that identify a block/CAPTCHA redirect.
    #[serde(default)]
    pub block_url_markers: Vec<String>,
    /// Substrings of the page title that identify a block page.
    #[serde(default)]
    pub block_title_markers: Vec<String>,
}

impl CompetitorSite {
    /// Substitute the query into the search template. Internal spaces
    /// become `+`; no further encoding is applied.
    pub fn search_url(&self, query: &str) -> String {
        let encoded = query.trim().replace(' ', "+");
        self.search_url_template.replace("{query}", &encoded)
    }

    pub fn is_block_url(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.block_url_markers
            .iter()
            .any(|marker| url.contains(&marker.to_lowercase()))
    }

    pub fn is_block_title(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.block_title_markers
            .iter()
            .any(|marker| title.contains(&marker.to_lowercase()))
    }
}
