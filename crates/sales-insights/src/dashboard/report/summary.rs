use super::super::aggregate::{
    self, DailyRevenue, DailyServiceRevenue, Kpis, ServiceRevenue, ShiftPerformance,
};
use super::super::domain::SalesDataset;
use super::views::{SalesReportSummary, UpsellInsights};

/// Aggregates for one (possibly filtered) dataset.
#[derive(Debug, Clone, Default)]
pub struct SalesReport {
    pub kpis: Kpis,
    pub daily_trend: Vec<DailyRevenue>,
    pub product_mix: Vec<ServiceRevenue>,
    pub daily_product_mix: Vec<DailyServiceRevenue>,
    pub shift_performance: Vec<ShiftPerformance>,
}

impl SalesReport {
    pub fn compute(dataset: &SalesDataset) -> Self {
        let records = dataset.records();
        Self {
            kpis: aggregate::kpis(records),
            daily_trend: aggregate::daily_trend(records),
            product_mix: aggregate::product_mix(records),
            daily_product_mix: aggregate::daily_product_mix(records),
            shift_performance: aggregate::shift_performance(records),
        }
    }

    pub fn insights(&self, bundled_target: f64) -> UpsellInsights {
        super::generate_insights(&self.shift_performance, bundled_target)
    }

    pub fn summary(&self) -> SalesReportSummary {
        SalesReportSummary {
            kpis: self.kpis,
            daily_trend: self.daily_trend.clone(),
            product_mix: self.product_mix.clone(),
            daily_product_mix: self.daily_product_mix.clone(),
            shift_performance: self.shift_performance.clone(),
        }
    }
}
