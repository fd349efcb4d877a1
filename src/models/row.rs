use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{PriceQuoteResult, Product};

/// Per-product classification driving user-visible highlighting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Alert {
    /// A competitor undercuts us by at least the threshold.
    Expensive { site_id: String },
    /// A competitor charges at least the threshold more than we do.
    Cheap { site_id: String },
    InRange,
    NoData,
}

impl Alert {
    pub fn is_actionable(&self) -> bool {
        matches!(self, Alert::Expensive { .. } | Alert::Cheap { .. })
    }

    /// Display label for the output table.
    pub fn label(&self) -> String {
        match self {
            Alert::Expensive { site_id } => format!("expensive vs {site_id}"),
            Alert::Cheap { site_id } => format!("cheap vs {site_id}"),
            Alert::InRange => "in range".to_string(),
            Alert::NoData => "no data".to_string(),
        }
    }
}

/// One site's cell in a comparison row: the quote plus the signed gap
/// percentage, present iff the quote found a price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteQuote {
    pub quote: PriceQuoteResult,
    pub gap_percent: Option<Decimal>,
}

impl SiteQuote {
    pub fn gap_label(&self) -> String {
        match self.gap_percent {
            Some(gap) if gap.is_sign_negative() => format!("{gap:.2}%"),
            Some(gap) => format!("+{gap:.2}%"),
            None => "no data".to_string(),
        }
    }
}

/// A completed comparison for one product across all configured sites.
/// Immutable once built; site order matches the configured site order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparisonRow {
    pub product: Product,
    pub sites: Vec<SiteQuote>,
    pub alert: Alert,
}

impl ComparisonRow {
    pub fn quote(&self, site_id: &str) -> Option<&PriceQuoteResult> {
        self.sites
            .iter()
            .map(|cell| &cell.quote)
            .find(|quote| quote.site_id == site_id)
    }

    pub fn gap_percent(&self, site_id: &str) -> Option<Decimal> {
        self.sites
            .iter()
            .find(|cell| cell.quote.site_id == site_id)
            .and_then(|cell| cell.gap_percent)
    }
}

/// The ordered output of one run, one row per processed product.
/// Read-only after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    rows: Vec<ComparisonRow>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl ResultSet {
    pub fn new(
        rows: Vec<ComparisonRow>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            rows,
            started_at,
            finished_at,
        }
    }

    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    /// Rows whose alert calls for attention.
    pub fn alerts(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(|row| row.alert.is_actionable())
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, own_price: u32) -> Product {
        Product {
            id: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            own_price,
        }
    }

    fn row_with_alert(name: &str, alert: Alert) -> ComparisonRow {
        ComparisonRow {
            product: product(name, 1000),
            sites: vec![],
            alert,
        }
    }

    #[test]
    fn test_alert_labels() {
        assert_eq!(
            Alert::Expensive {
                site_id: "ksp".to_string()
            }
            .label(),
            "expensive vs ksp"
        );
        assert_eq!(Alert::InRange.label(), "in range");
        assert_eq!(Alert::NoData.label(), "no data");
    }

    #[test]
    fn test_gap_labels() {
        let quote = PriceQuoteResult::found("p", "ksp", 1500);
        let cell = SiteQuote {
            quote: quote.clone(),
            gap_percent: Some(Decimal::new(2500, 2)),
        };
        assert_eq!(cell.gap_label(), "+25.00%");

        let cell = SiteQuote {
            quote: quote.clone(),
            gap_percent: Some(Decimal::new(-833, 2)),
        };
        assert_eq!(cell.gap_label(), "-8.33%");

        let cell = SiteQuote {
            quote: PriceQuoteResult::not_found("p", "ksp"),
            gap_percent: None,
        };
        assert_eq!(cell.gap_label(), "no data");
    }

    #[test]
    fn test_alerts_view_filters_quiet_rows() {
        let started = Utc::now();
        let rows = vec![
            row_with_alert("A", Alert::InRange),
            row_with_alert(
                "B",
                Alert::Expensive {
                    site_id: "ksp".to_string(),
                },
            ),
            row_with_alert("C", Alert::NoData),
            row_with_alert(
                "D",
                Alert::Cheap {
                    site_id: "ivory".to_string(),
                },
            ),
        ];
        let set = ResultSet::new(rows, started, Utc::now());

        let alerted: Vec<&str> = set.alerts().map(|r| r.product.name.as_str()).collect();
        assert_eq!(alerted, vec!["B", "D"]);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_row_lookup_by_site() {
        let row = ComparisonRow {
            product: product("A", 1200),
            sites: vec![
                SiteQuote {
                    quote: PriceQuoteResult::found("a", "ksp", 1500),
                    gap_percent: Some(Decimal::new(2500, 2)),
                },
                SiteQuote {
                    quote: PriceQuoteResult::not_found("a", "ivory"),
                    gap_percent: None,
                },
            ],
            alert: Alert::InRange,
        };

        assert_eq!(row.quote("ksp").unwrap().price, Some(1500));
        assert_eq!(row.gap_percent("ksp"), Some(Decimal::new(2500, 2)));
        assert_eq!(row.gap_percent("ivory"), None);
        assert!(row.quote("bug").is_none());
    }
}
