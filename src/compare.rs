use rust_decimal::Decimal;

use crate::models::{Alert, ComparisonRow, PriceQuoteResult, Product, SiteQuote};

/// Pure classification of a completed quote set against the run threshold.
/// No hidden state: identical inputs always yield identical rows.
pub struct ComparisonEngine {
    threshold_percent: Decimal,
}

impl ComparisonEngine {
    pub fn new(threshold_percent: u8) -> Self {
        Self {
            threshold_percent: Decimal::from(threshold_percent),
        }
    }

    /// Build the comparison row for one product from its quotes, in the
    /// order the quotes were taken (configured site order).
    ///
    /// Gap per found quote: `(price - own_price) / own_price * 100`.
    /// Classification is inclusive on both boundaries; the first site to
    /// qualify decides the row alert. Sites without a price contribute no
    /// gap and never influence the alert.
    pub fn classify(&self, product: &Product, quotes: Vec<PriceQuoteResult>) -> ComparisonRow {
        let own_price = Decimal::from(product.own_price);
        let mut sites = Vec::with_capacity(quotes.len());
        let mut alert: Option<Alert> = None;
        let mut any_found = false;

        for quote in quotes {
            let gap = quote
                .price
                .map(|price| (Decimal::from(price) - own_price) * Decimal::ONE_HUNDRED / own_price);

            if let Some(gap) = gap {
                any_found = true;
                if alert.is_none() {
                    if gap >= self.threshold_percent {
                        alert = Some(Alert::Expensive {
                            site_id: quote.site_id.clone(),
                        });
                    } else if gap <= -self.threshold_percent {
                        alert = Some(Alert::Cheap {
                            site_id: quote.site_id.clone(),
                        });
                    }
                }
            }

            sites.push(SiteQuote {
                quote,
                gap_percent: gap.map(|g| g.round_dp(2)),
            });
        }

        let alert = alert.unwrap_or(if any_found {
            Alert::InRange
        } else {
            Alert::NoData
        });

        ComparisonRow {
            product: product.clone(),
            sites,
            alert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuoteStatus;
    use rstest::rstest;

    fn product(own_price: u32) -> Product {
        Product {
            id: "p1".to_string(),
            name: "Test Product".to_string(),
            own_price,
        }
    }

    #[test]
    fn test_competitor_above_threshold_is_expensive() {
        let engine = ComparisonEngine::new(20);
        let row = engine.classify(
            &product(1200),
            vec![PriceQuoteResult::found("p1", "ksp", 1500)],
        );

        assert_eq!(row.gap_percent("ksp"), Some(Decimal::new(2500, 2)));
        assert_eq!(
            row.alert,
            Alert::Expensive {
                site_id: "ksp".to_string()
            }
        );
    }

    #[test]
    fn test_small_gap_stays_in_range() {
        let engine = ComparisonEngine::new(20);
        let row = engine.classify(
            &product(1200),
            vec![PriceQuoteResult::found("p1", "ksp", 1100)],
        );

        // (1100 - 1200) / 1200 * 100 = -8.33…
        assert_eq!(row.gap_percent("ksp"), Some(Decimal::new(-833, 2)));
        assert_eq!(row.alert, Alert::InRange);
    }

    #[test]
    fn test_blocked_site_contributes_no_gap() {
        let engine = ComparisonEngine::new(20);
        let row = engine.classify(
            &product(1200),
            vec![PriceQuoteResult::blocked("p1", "ksp", "captcha redirect")],
        );

        assert_eq!(row.gap_percent("ksp"), None);
        assert_eq!(row.quote("ksp").unwrap().price_label(), "not found");
        assert_eq!(row.alert, Alert::NoData);
    }

    #[test]
    fn test_timeout_site_reported_alongside_found_site() {
        let engine = ComparisonEngine::new(20);
        let row = engine.classify(
            &product(1200),
            vec![
                PriceQuoteResult::found("p1", "ksp", 1500),
                PriceQuoteResult::timeout("p1", "ivory", "page load timed out"),
            ],
        );

        assert_eq!(
            row.alert,
            Alert::Expensive {
                site_id: "ksp".to_string()
            }
        );
        assert_eq!(row.gap_percent("ivory"), None);
        assert_eq!(row.quote("ivory").unwrap().status, QuoteStatus::Timeout);
    }

    #[rstest]
    // Boundary cases are inclusive on both sides.
    #[case(1000, 1200, 20, Alert::Expensive { site_id: "ksp".to_string() })]
    #[case(1000, 800, 20, Alert::Cheap { site_id: "ksp".to_string() })]
    #[case(1000, 1199, 20, Alert::InRange)]
    #[case(1000, 801, 20, Alert::InRange)]
    #[case(1000, 1000, 20, Alert::InRange)]
    #[case(1000, 1500, 50, Alert::Expensive { site_id: "ksp".to_string() })]
    #[case(1000, 1049, 5, Alert::InRange)]
    #[case(1000, 1050, 5, Alert::Expensive { site_id: "ksp".to_string() })]
    fn test_threshold_classification(
        #[case] own_price: u32,
        #[case] quoted: u32,
        #[case] threshold: u8,
        #[case] expected: Alert,
    ) {
        let engine = ComparisonEngine::new(threshold);
        let row = engine.classify(
            &product(own_price),
            vec![PriceQuoteResult::found("p1", "ksp", quoted)],
        );

        assert_eq!(row.alert, expected);
    }

    #[test]
    fn test_first_qualifying_site_wins() {
        let engine = ComparisonEngine::new(10);
        let row = engine.classify(
            &product(1000),
            vec![
                PriceQuoteResult::found("p1", "ksp", 1050),
                PriceQuoteResult::found("p1", "ivory", 800),
                PriceQuoteResult::found("p1", "bug", 1300),
            ],
        );

        // ksp is in range; ivory qualifies first in site order.
        assert_eq!(
            row.alert,
            Alert::Cheap {
                site_id: "ivory".to_string()
            }
        );
    }

    #[test]
    fn test_no_quotes_at_all_is_no_data() {
        let engine = ComparisonEngine::new(20);
        let row = engine.classify(&product(1000), vec![]);

        assert_eq!(row.alert, Alert::NoData);
        assert!(row.sites.is_empty());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let engine = ComparisonEngine::new(15);
        let quotes = vec![
            PriceQuoteResult::found("p1", "ksp", 1177),
            PriceQuoteResult::not_found("p1", "ivory"),
            PriceQuoteResult::found("p1", "bug", 913),
        ];

        let first = engine.classify(&product(1034), quotes.clone());
        let second = engine.classify(&product(1034), quotes);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_gap_rounding_for_display() {
        let engine = ComparisonEngine::new(20);
        // (1000 - 1200) / 1200 * 100 = -16.666… → -16.67 for display
        let row = engine.classify(
            &product(1200),
            vec![PriceQuoteResult::found("p1", "ksp", 1000)],
        );

        assert_eq!(row.gap_percent("ksp"), Some(Decimal::new(-1667, 2)));
    }
}
