//! Group-by aggregations over validated records. Every function is pure and
//! can be recomputed at will from the same slice.

use super::domain::{compare_shifts, SalesRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Kpis {
    pub record_count: usize,
    pub total_revenue: f64,
    pub total_conversions: u64,
    /// Total revenue over total conversions, zero when nothing converted.
    pub avg_revenue_per_conversion: f64,
    pub total_ad_spend: f64,
    /// Return on ad spend, zero when nothing was spent.
    pub roas: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRevenue {
    pub service_type: String,
    pub revenue: f64,
    /// Fraction of total revenue, zero when there is no revenue.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyServiceRevenue {
    pub date: NaiveDate,
    pub service_type: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftPerformance {
    pub shift: String,
    pub records: usize,
    pub revenue: f64,
    pub conversions: u64,
    pub avg_revenue: f64,
    pub avg_conversions: f64,
    pub avg_revenue_per_conversion: f64,
    /// Fraction of the shift's records sold as the bundled service.
    pub bundled_share: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub fn kpis(records: &[SalesRecord]) -> Kpis {
    let total_revenue: f64 = records.iter().map(|record| record.daily_revenue).sum();
    let total_conversions = records
        .iter()
        .fold(0u64, |total, record| total.saturating_add(record.conversions));
    let total_ad_spend: f64 = records.iter().map(|record| record.ad_spend).sum();

    Kpis {
        record_count: records.len(),
        total_revenue,
        total_conversions,
        avg_revenue_per_conversion: ratio(total_revenue, total_conversions as f64),
        total_ad_spend,
        roas: ratio(total_revenue, total_ad_spend),
    }
}

/// Revenue per calendar day, oldest first.
pub fn daily_trend(records: &[SalesRecord]) -> Vec<DailyRevenue> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in records {
        *by_day.entry(record.date).or_default() += record.daily_revenue;
    }

    by_day
        .into_iter()
        .map(|(date, revenue)| DailyRevenue { date, revenue })
        .collect()
}

/// Revenue per service type, sorted by service name.
pub fn product_mix(records: &[SalesRecord]) -> Vec<ServiceRevenue> {
    let mut by_service: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        *by_service.entry(record.service_type.as_str()).or_default() += record.daily_revenue;
    }

    let total: f64 = by_service.values().sum();
    by_service
        .into_iter()
        .map(|(service_type, revenue)| ServiceRevenue {
            service_type: service_type.to_string(),
            revenue,
            share: ratio(revenue, total),
        })
        .collect()
}

/// Revenue per day and service type, for stacked daily bars.
pub fn daily_product_mix(records: &[SalesRecord]) -> Vec<DailyServiceRevenue> {
    let mut by_day_service: BTreeMap<(NaiveDate, &str), f64> = BTreeMap::new();
    for record in records {
        *by_day_service
            .entry((record.date, record.service_type.as_str()))
            .or_default() += record.daily_revenue;
    }

    by_day_service
        .into_iter()
        .map(|((date, service_type), revenue)| DailyServiceRevenue {
            date,
            service_type: service_type.to_string(),
            revenue,
        })
        .collect()
}

#[derive(Default)]
struct ShiftAccumulator {
    records: usize,
    revenue: f64,
    conversions: u64,
    revenue_per_conversion: f64,
    bundled: usize,
}

/// Per time-of-day metrics in shift display order.
pub fn shift_performance(records: &[SalesRecord]) -> Vec<ShiftPerformance> {
    let mut by_shift: BTreeMap<&str, ShiftAccumulator> = BTreeMap::new();
    for record in records {
        let acc = by_shift.entry(record.time_of_day.as_str()).or_default();
        acc.records += 1;
        acc.revenue += record.daily_revenue;
        acc.conversions = acc.conversions.saturating_add(record.conversions);
        acc.revenue_per_conversion += record.revenue_per_conversion();
        if record.is_bundled() {
            acc.bundled += 1;
        }
    }

    let mut shifts: Vec<ShiftPerformance> = by_shift
        .into_iter()
        .map(|(shift, acc)| {
            let count = acc.records as f64;
            ShiftPerformance {
                shift: shift.to_string(),
                records: acc.records,
                revenue: acc.revenue,
                conversions: acc.conversions,
                avg_revenue: ratio(acc.revenue, count),
                avg_conversions: ratio(acc.conversions as f64, count),
                avg_revenue_per_conversion: ratio(acc.revenue_per_conversion, count),
                bundled_share: ratio(acc.bundled as f64, count),
            }
        })
        .collect();

    shifts.sort_by(|left, right| compare_shifts(&left.shift, &right.shift));
    shifts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        day: u32,
        shift: &str,
        service: &str,
        spend: f64,
        conversions: u64,
        revenue: f64,
    ) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date"),
            time_of_day: shift.to_string(),
            service_type: service.to_string(),
            ad_channel: "Google".to_string(),
            customer_type: "New".to_string(),
            ad_spend: spend,
            conversions,
            daily_revenue: revenue,
        }
    }

    fn sample() -> Vec<SalesRecord> {
        vec![
            record(2, "Evening", "Bundled", 20.0, 4, 400.0),
            record(1, "Morning", "Basic", 10.0, 2, 100.0),
            record(1, "Morning", "Bundled", 10.0, 0, 50.0),
            record(2, "Afternoon", "Premium", 0.0, 1, 150.0),
        ]
    }

    #[test]
    fn kpis_sum_and_divide() {
        let kpis = kpis(&sample());
        assert_eq!(kpis.record_count, 4);
        assert_eq!(kpis.total_revenue, 700.0);
        assert_eq!(kpis.total_conversions, 7);
        assert_eq!(kpis.avg_revenue_per_conversion, 100.0);
        assert_eq!(kpis.total_ad_spend, 40.0);
        assert_eq!(kpis.roas, 17.5);
    }

    #[test]
    fn zero_denominators_report_zero() {
        let rows = vec![record(1, "Morning", "Basic", 0.0, 0, 90.0)];
        let kpis = kpis(&rows);
        assert_eq!(kpis.roas, 0.0);
        assert_eq!(kpis.avg_revenue_per_conversion, 0.0);

        let empty = super::kpis(&[]);
        assert_eq!(empty, Kpis::default());
    }

    #[test]
    fn huge_conversion_counts_saturate_instead_of_overflowing() {
        let rows = vec![
            record(1, "Morning", "Bundled", 1.0, u64::MAX - 1, 100.0),
            record(1, "Morning", "Basic", 1.0, 10, 100.0),
        ];
        assert_eq!(kpis(&rows).total_conversions, u64::MAX);
        assert_eq!(shift_performance(&rows)[0].conversions, u64::MAX);
    }

    #[test]
    fn two_day_example_trend() {
        let rows = vec![
            record(1, "Morning", "Basic", 1.0, 1, 100.0),
            record(2, "Morning", "Basic", 1.0, 1, 200.0),
        ];
        let revenue: Vec<f64> = daily_trend(&rows).iter().map(|day| day.revenue).collect();
        assert_eq!(revenue, [100.0, 200.0]);
        assert_eq!(kpis(&rows).total_revenue, 300.0);
    }

    #[test]
    fn daily_trend_is_chronological_and_sums_to_total() {
        let trend = daily_trend(&sample());
        assert_eq!(
            trend,
            vec![
                DailyRevenue {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    revenue: 150.0,
                },
                DailyRevenue {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    revenue: 550.0,
                },
            ]
        );
        let trend_total: f64 = trend.iter().map(|day| day.revenue).sum();
        assert_eq!(trend_total, kpis(&sample()).total_revenue);
    }

    #[test]
    fn product_mix_groups_by_service() {
        let mix = product_mix(&sample());
        let services: Vec<&str> = mix.iter().map(|entry| entry.service_type.as_str()).collect();
        assert_eq!(services, ["Basic", "Bundled", "Premium"]);
        assert_eq!(mix[1].revenue, 450.0);
        let share_total: f64 = mix.iter().map(|entry| entry.share).sum();
        assert!((share_total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn daily_product_mix_splits_days_by_service() {
        let mix = daily_product_mix(&sample());
        assert_eq!(mix.len(), 4);
        assert_eq!(mix[0].service_type, "Basic");
        assert_eq!(mix[1].service_type, "Bundled");
        assert_eq!(mix[1].revenue, 50.0);
        assert_eq!(mix[2].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn shift_performance_orders_day_parts_and_computes_shares() {
        let shifts = shift_performance(&sample());
        let names: Vec<&str> = shifts.iter().map(|entry| entry.shift.as_str()).collect();
        assert_eq!(names, ["Morning", "Afternoon", "Evening"]);

        let morning = &shifts[0];
        assert_eq!(morning.records, 2);
        assert_eq!(morning.revenue, 150.0);
        assert_eq!(morning.conversions, 2);
        assert_eq!(morning.avg_revenue, 75.0);
        assert_eq!(morning.avg_conversions, 1.0);
        assert_eq!(morning.avg_revenue_per_conversion, 25.0);
        assert_eq!(morning.bundled_share, 0.5);

        assert_eq!(shifts[1].bundled_share, 0.0);
        assert_eq!(shifts[2].bundled_share, 1.0);
    }
}
