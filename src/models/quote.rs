use serde::{Deserialize, Serialize};

/// Outcome class of one (product, site) extraction attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Found,
    NotFound,
    Blocked,
    Timeout,
    Error,
}

impl QuoteStatus {
    /// Statuses worth another attempt. A block page or a clean selector
    /// miss will not change on retry; a timeout or transient error might.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuoteStatus::Timeout | QuoteStatus::Error)
    }
}

/// The outcome of attempting to read one competitor's price for one
/// product. Created once per attempt, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuoteResult {
    pub product_id: String,
    pub site_id: String,
    /// Whole currency units; present iff `status` is `Found`.
    pub price: Option<u32>,
    pub status: QuoteStatus,
    pub message: Option<String>,
}

impl PriceQuoteResult {
    pub fn found(product_id: &str, site_id: &str, price: u32) -> Self {
        Self {
            product_id: product_id.to_string(),
            site_id: site_id.to_string(),
            price: Some(price),
            status: QuoteStatus::Found,
            message: None,
        }
    }

    pub fn not_found(product_id: &str, site_id: &str) -> Self {
        Self::without_price(product_id, site_id, QuoteStatus::NotFound, None)
    }

    pub fn blocked(product_id: &str, site_id: &str, message: impl Into<String>) -> Self {
        Self::without_price(product_id, site_id, QuoteStatus::Blocked, Some(message.into()))
    }

    pub fn timeout(product_id: &str, site_id: &str, message: impl Into<String>) -> Self {
        Self::without_price(product_id, site_id, QuoteStatus::Timeout, Some(message.into()))
    }

    pub fn error(product_id: &str, site_id: &str, message: impl Into<String>) -> Self {
        Self::without_price(product_id, site_id, QuoteStatus::Error, Some(message.into()))
    }

    fn without_price(
        product_id: &str,
        site_id: &str,
        status: QuoteStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            product_id: product_id.to_string(),
            site_id: site_id.to_string(),
            price: None,
            status,
            message,
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == QuoteStatus::Found
    }

    /// Display label for the output table.
    pub fn price_label(&self) -> String {
        match self.price {
            Some(price) => price.to_string(),
            None => "not found".to_string(),
        }
    }
}
