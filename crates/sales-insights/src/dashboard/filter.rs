use super::domain::{SalesDataset, SalesRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Narrows a dataset the way the dashboard sidebar does. Empty selections
/// mean "no restriction" for that column; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub time_of_day: Vec<String>,
    pub service_type: Vec<String>,
    pub customer_type: Vec<String>,
    pub ad_channel: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("date range start {from} is after end {to}")]
pub struct InvalidDateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DatasetFilter {
    pub fn is_unrestricted(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<(), InvalidDateRange> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(InvalidDateRange { from, to }),
            _ => Ok(()),
        }
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.from.map_or(true, |from| record.date >= from)
            && self.to.map_or(true, |to| record.date <= to)
            && selected(&self.time_of_day, &record.time_of_day)
            && selected(&self.service_type, &record.service_type)
            && selected(&self.customer_type, &record.customer_type)
            && selected(&self.ad_channel, &record.ad_channel)
    }

    pub fn apply(&self, dataset: &SalesDataset) -> SalesDataset {
        dataset
            .records()
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

fn selected(choices: &[String], value: &str) -> bool {
    choices.is_empty() || choices.iter().any(|choice| choice.trim() == value)
}
