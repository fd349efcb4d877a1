use std::time::Duration;

use scraper::{Html, Selector};
use tracing::debug;

use crate::browser::PageDriver;
use crate::models::{CompetitorSite, PriceQuoteResult, Product};
use crate::utils::error::AppError;

/// Extraction strategy for one competitor, parameterized entirely by the
/// site's configuration record. Every failure mode is converted into a
/// typed quote status; nothing escapes `extract`.
pub struct SiteAdapter<'a, D: PageDriver> {
    site: &'a CompetitorSite,
    driver: &'a D,
    page_timeout: Duration,
    wait_timeout: Duration,
}

impl<'a, D: PageDriver> SiteAdapter<'a, D> {
    pub fn new(
        site: &'a CompetitorSite,
        driver: &'a D,
        page_timeout: Duration,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            site,
            driver,
            page_timeout,
            wait_timeout,
        }
    }

    /// Attempt to read this competitor's displayed price for one product.
    pub async fn extract(&self, product: &Product) -> PriceQuoteResult {
        let product_id = product.id.as_str();
        let site_id = self.site.id.as_str();
        let url = self.site.search_url(&product.name);

        debug!(site = site_id, product = %product.name, %url, "extracting price");

        if let Err(e) = self.driver.navigate(&url, self.page_timeout).await {
            return match e {
                AppError::NavigationTimeout(_) => {
                    PriceQuoteResult::timeout(product_id, site_id, e.to_string())
                }
                other => PriceQuoteResult::error(product_id, site_id, other.to_string()),
            };
        }

        // A blocked page never satisfies the ready selector, so the block
        // check comes before any content wait.
        let landed_url = self.driver.current_url().await;
        if self.site.is_block_url(&landed_url) {
            return PriceQuoteResult::blocked(
                product_id,
                site_id,
                format!("redirected to block page: {landed_url}"),
            );
        }

        match self.driver.current_title().await {
            Ok(title) if self.site.is_block_title(&title) => {
                return PriceQuoteResult::blocked(
                    product_id,
                    site_id,
                    format!("block page title: {title}"),
                );
            }
            Ok(_) => {}
            Err(e) => return PriceQuoteResult::error(product_id, site_id, e.to_string()),
        }

        if let Err(e) = self
            .driver
            .wait_for(&self.site.ready_selector, self.wait_timeout)
            .await
        {
            return match e {
                AppError::WaitTimeout { .. } => {
                    PriceQuoteResult::timeout(product_id, site_id, e.to_string())
                }
                other => PriceQuoteResult::error(product_id, site_id, other.to_string()),
            };
        }

        let markup = match self.driver.current_markup().await {
            Ok(markup) => markup,
            Err(e) => return PriceQuoteResult::error(product_id, site_id, e.to_string()),
        };

        match self.find_price_text(&markup) {
            Some(text) => match self.site.cleanup.parse_price(&text) {
                Some(price) => PriceQuoteResult::found(product_id, site_id, price),
                None => PriceQuoteResult::not_found(product_id, site_id),
            },
            None => PriceQuoteResult::not_found(product_id, site_id),
        }
    }

    /// Walk the configured selector chain over the rendered markup and
    /// return the text of the first node any selector matches. Selector
    /// strings are external data: an unparseable one is skipped, and an
    /// exhausted chain means no price, never a crash.
    fn find_price_text(&self, markup: &str) -> Option<String> {
        let document = Html::parse_document(markup);

        for selector_str in &self.site.price_selectors {
            let selector = match Selector::parse(selector_str) {
                Ok(selector) => selector,
                Err(_) => {
                    debug!(
                        site = self.site.id.as_str(),
                        selector = selector_str.as_str(),
                        "skipping unparseable price selector"
                    );
                    continue;
                }
            };

            if let Some(element) = document.select(&selector).next() {
                let text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
                return Some(text);
            }
        }

        None
    }
}
