use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{info, warn};

use crate::adapter::SiteAdapter;
use crate::browser::PageDriver;
use crate::compare::ComparisonEngine;
use crate::config::AppConfig;
use crate::models::{Catalog, CompetitorSite, PriceQuoteResult, Product, QuoteStatus, ResultSet};

/// Human-readable run progress, for UI display. Not part of the
/// correctness contract.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    SiteChecked {
        product_name: String,
        site_name: String,
        status: QuoteStatus,
        price: Option<u32>,
    },
    ProductDone {
        index: usize,
        total: usize,
        product_name: String,
    },
    Cancelled {
        completed: usize,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::SiteChecked {
                product_name,
                site_name,
                status,
                price,
            } => match (status, price) {
                (QuoteStatus::Found, Some(price)) => {
                    write!(f, "{site_name}: {product_name} listed at {price}")
                }
                (QuoteStatus::NotFound, _) => write!(f, "{site_name}: {product_name} not found"),
                (QuoteStatus::Blocked, _) => write!(f, "{site_name}: request blocked"),
                (QuoteStatus::Timeout, _) => write!(f, "{site_name}: timed out"),
                _ => write!(f, "{site_name}: extraction failed"),
            },
            ProgressEvent::ProductDone {
                index,
                total,
                product_name,
            } => write!(f, "checked {index}/{total}: {product_name}"),
            ProgressEvent::Cancelled { completed } => {
                write!(f, "run cancelled after {completed} products")
            }
        }
    }
}

/// Cooperative cancellation. The orchestrator polls this before every
/// adapter call; a cancelled run returns the rows completed so far.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives the catalog × site matrix over one exclusively-owned browser.
/// Calls are strictly serialized: each navigation replaces the page state
/// the adapters read.
pub struct ExtractionOrchestrator<D: PageDriver> {
    driver: D,
    config: AppConfig,
    progress: Option<UnboundedSender<ProgressEvent>>,
    cancel: CancelFlag,
}

impl<D: PageDriver> ExtractionOrchestrator<D> {
    pub fn new(driver: D, config: AppConfig) -> Self {
        Self {
            driver,
            config,
            progress: None,
            cancel: CancelFlag::default(),
        }
    }

    pub fn with_progress(mut self, sender: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Handle for cancelling the run from another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run the full matrix. A failed site quote never aborts the rest of
    /// the matrix; every outcome is recorded and classified.
    pub async fn run(&self, catalog: &Catalog, threshold_percent: u8) -> ResultSet {
        let engine = ComparisonEngine::new(threshold_percent);
        let started_at = Utc::now();
        let total = catalog.len();
        let mut rows = Vec::with_capacity(total);
        let mut any_call_made = false;

        info!(
            products = total,
            sites = self.config.sites.len(),
            threshold_percent,
            "starting extraction run"
        );

        'products: for (index, product) in catalog.products().iter().enumerate() {
            let mut quotes = Vec::with_capacity(self.config.sites.len());

            for site in &self.config.sites {
                if self.cancel.is_cancelled() {
                    warn!(completed = rows.len(), "extraction run cancelled");
                    self.emit(ProgressEvent::Cancelled {
                        completed: rows.len(),
                    });
                    break 'products;
                }

                if any_call_made {
                    tokio::time::sleep(self.config.run.politeness_delay()).await;
                }
                any_call_made = true;

                let quote = self.extract_with_retry(site, product).await;
                self.emit(ProgressEvent::SiteChecked {
                    product_name: product.name.clone(),
                    site_name: site.name.clone(),
                    status: quote.status,
                    price: quote.price,
                });
                quotes.push(quote);
            }

            // Cancellation mid-product drops the incomplete quote set
            // rather than emitting a row with missing sites.
            if quotes.len() == self.config.sites.len() {
                rows.push(engine.classify(product, quotes));
                self.emit(ProgressEvent::ProductDone {
                    index: index + 1,
                    total,
                    product_name: product.name.clone(),
                });
            }
        }

        info!(rows = rows.len(), "extraction run finished");
        ResultSet::new(rows, started_at, Utc::now())
    }

    /// One site call, re-invoked with fixed backoff while the outcome is
    /// a timeout or transient error. Blocked and not-found are final.
    async fn extract_with_retry(
        &self,
        site: &CompetitorSite,
        product: &Product,
    ) -> PriceQuoteResult {
        let adapter = SiteAdapter::new(
            site,
            &self.driver,
            self.config.browser.page_load_timeout(),
            self.config.browser.wait_timeout(),
        );

        let attempts = self.config.run.retry_attempts as usize;
        if attempts == 0 {
            return adapter.extract(product).await;
        }

        let strategy = FixedInterval::new(self.config.run.retry_delay()).take(attempts);
        let outcome = Retry::spawn(strategy, || {
            let attempt = adapter.extract(product);
            async move {
                let quote = attempt.await;
                if quote.status.is_retryable() {
                    warn!(
                        site = quote.site_id.as_str(),
                        product = quote.product_id.as_str(),
                        status = ?quote.status,
                        "site call failed, may retry"
                    );
                    Err(quote)
                } else {
                    Ok(quote)
                }
            }
        })
        .await;

        match outcome {
            Ok(quote) => quote,
            Err(quote) => quote,
        }
    }

    fn emit(&self, event: ProgressEvent) {
        info!("{event}");
        if let Some(sender) = &self.progress {
            let _ = sender.send(event);
        }
    }
}
