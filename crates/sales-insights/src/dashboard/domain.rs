use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Service type label used as the upselling proxy.
pub const BUNDLED_SERVICE: &str = "bundled";

const SHIFT_ORDER: [&str; 4] = ["Morning", "Afternoon", "Evening", "Night"];

/// One validated spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub time_of_day: String,
    pub service_type: String,
    pub ad_channel: String,
    pub customer_type: String,
    pub ad_spend: f64,
    pub conversions: u64,
    pub daily_revenue: f64,
}

impl SalesRecord {
    /// Revenue per conversion for this row, zero when nothing converted.
    pub fn revenue_per_conversion(&self) -> f64 {
        if self.conversions > 0 {
            self.daily_revenue / self.conversions as f64
        } else {
            0.0
        }
    }

    pub fn is_bundled(&self) -> bool {
        self.service_type.trim().eq_ignore_ascii_case(BUNDLED_SERVICE)
    }
}

/// The records of one upload, in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesDataset {
    records: Vec<SalesRecord>,
}

impl SalesDataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest record dates.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|record| record.date).min()?;
        let last = self.records.iter().map(|record| record.date).max()?;
        Some((first, last))
    }

    pub fn filter_options(&self) -> FilterOptions {
        let mut time_of_day = BTreeSet::new();
        let mut service_type = BTreeSet::new();
        let mut customer_type = BTreeSet::new();
        let mut ad_channel = BTreeSet::new();

        for record in &self.records {
            time_of_day.insert(record.time_of_day.clone());
            service_type.insert(record.service_type.clone());
            customer_type.insert(record.customer_type.clone());
            ad_channel.insert(record.ad_channel.clone());
        }

        FilterOptions {
            date_span: self.date_span(),
            time_of_day: time_of_day.into_iter().collect(),
            service_type: service_type.into_iter().collect(),
            customer_type: customer_type.into_iter().collect(),
            ad_channel: ad_channel.into_iter().collect(),
        }
    }
}

impl FromIterator<SalesRecord> for SalesDataset {
    fn from_iter<I: IntoIterator<Item = SalesRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Distinct values available for narrowing a dataset, sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub date_span: Option<(NaiveDate, NaiveDate)>,
    pub time_of_day: Vec<String>,
    pub service_type: Vec<String>,
    pub customer_type: Vec<String>,
    pub ad_channel: Vec<String>,
}

/// Display order for shifts: the known day parts first, then anything else
/// alphabetically.
pub fn compare_shifts(left: &str, right: &str) -> Ordering {
    let rank = |label: &str| {
        SHIFT_ORDER
            .iter()
            .position(|known| known.eq_ignore_ascii_case(label.trim()))
            .unwrap_or(SHIFT_ORDER.len())
    };

    rank(left).cmp(&rank(right)).then_with(|| left.cmp(right))
}
