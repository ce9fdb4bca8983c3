//! Upload validation, aggregation and upselling recommendations for the
//! sales performance dashboard.

pub mod aggregate;
pub mod domain;
pub mod filter;
pub mod report;
pub mod schema;

pub use domain::{FilterOptions, SalesDataset, SalesRecord};
pub use filter::{DatasetFilter, InvalidDateRange};
pub use report::views::{DashboardSummary, DateRange, SalesReportSummary, UpsellInsights};
pub use report::SalesReport;
pub use schema::{ParseError, ParseFailure, SchemaError, REQUIRED_COLUMNS};

use crate::config::InvalidBundledTarget;
use crate::ingest::{LoadError, RawTable, SpreadsheetLoader};
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Filter(#[from] InvalidDateRange),
    #[error(transparent)]
    Target(#[from] InvalidBundledTarget),
}

/// A validated upload, held for as long as the caller needs to answer
/// queries against it.
#[derive(Debug, Clone)]
pub struct SalesDashboard {
    dataset: SalesDataset,
    extra_columns: Vec<String>,
}

impl SalesDashboard {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DashboardError> {
        let table = SpreadsheetLoader::from_path(path)?;
        Self::from_table(&table)
    }

    pub fn from_workbook_bytes(bytes: Vec<u8>) -> Result<Self, DashboardError> {
        let table = SpreadsheetLoader::from_workbook_bytes(bytes)?;
        Self::from_table(&table)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, DashboardError> {
        let table = SpreadsheetLoader::from_csv_reader(reader)?;
        Self::from_table(&table)
    }

    pub fn from_table(table: &RawTable) -> Result<Self, DashboardError> {
        let validated = schema::validate(table)?;
        info!(
            rows = validated.dataset.len(),
            extra_columns = validated.extra_columns.len(),
            "sales dataset loaded"
        );

        Ok(Self {
            dataset: validated.dataset,
            extra_columns: validated.extra_columns,
        })
    }

    pub fn dataset(&self) -> &SalesDataset {
        &self.dataset
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Aggregates and recommendations for the records that pass `filter`.
    pub fn summarize(
        &self,
        filter: &DatasetFilter,
        bundled_target: f64,
    ) -> Result<DashboardSummary, DashboardError> {
        filter.validate()?;

        let filtered = if filter.is_unrestricted() {
            self.dataset.clone()
        } else {
            filter.apply(&self.dataset)
        };
        info!(
            loaded = self.dataset.len(),
            filtered = filtered.len(),
            "computing dashboard"
        );

        let report = SalesReport::compute(&filtered);
        let insights = report.insights(bundled_target);

        Ok(DashboardSummary {
            loaded_rows: self.dataset.len(),
            filtered_rows: filtered.len(),
            extra_columns: self.extra_columns.clone(),
            date_range: filtered
                .date_span()
                .map(|(start, end)| DateRange { start, end }),
            filter_options: self.dataset.filter_options(),
            report: report.summary(),
            insights,
        })
    }
}
