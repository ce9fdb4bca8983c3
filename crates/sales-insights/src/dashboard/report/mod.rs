mod insights;
mod summary;
pub mod views;

pub use summary::SalesReport;

pub(crate) use insights::generate_insights;
pub use insights::{percent, rank_shifts};
