use super::super::aggregate::{
    DailyRevenue, DailyServiceRevenue, Kpis, ServiceRevenue, ShiftPerformance,
};
use super::super::domain::FilterOptions;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SalesReportSummary {
    pub kpis: Kpis,
    pub daily_trend: Vec<DailyRevenue>,
    pub product_mix: Vec<ServiceRevenue>,
    pub daily_product_mix: Vec<DailyServiceRevenue>,
    pub shift_performance: Vec<ShiftPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftHighlight {
    pub shift: String,
    pub bundled_share: f64,
    pub bundled_share_label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    HoldCourse,
    CoachWorstShift,
    ReplicateBestShift,
}

impl SuggestedAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::HoldCourse => "Hold course",
            Self::CoachWorstShift => "Coach underperforming shift",
            Self::ReplicateBestShift => "Replicate best shift",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpsellInsights {
    pub best_shift: Option<ShiftHighlight>,
    pub worst_shift: Option<ShiftHighlight>,
    /// Shifts from highest to lowest bundled share.
    pub ranking: Vec<ShiftHighlight>,
    pub bundled_target: f64,
    pub suggested_action: Option<SuggestedAction>,
    pub messages: Vec<String>,
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Everything a dashboard view needs for one upload and filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub loaded_rows: usize,
    pub filtered_rows: usize,
    pub extra_columns: Vec<String>,
    pub date_range: Option<DateRange>,
    pub filter_options: FilterOptions,
    #[serde(flatten)]
    pub report: SalesReportSummary,
    pub insights: UpsellInsights,
}
