use crate::infra::{deserialize_optional_date, split_list, upload_format, AppState};
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use sales_insights::config::DashboardConfig;
use sales_insights::dashboard::{
    DashboardError, DashboardSummary, DatasetFilter, SalesDashboard, REQUIRED_COLUMNS,
};
use sales_insights::error::AppError;
use sales_insights::ingest::SpreadsheetFormat;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use tracing::info;

/// Filter selection for one dashboard request. List values are comma
/// separated, e.g. `time_of_day=Morning,Evening`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) to: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) time_of_day: Option<String>,
    #[serde(default)]
    pub(crate) service_type: Option<String>,
    #[serde(default)]
    pub(crate) customer_type: Option<String>,
    #[serde(default)]
    pub(crate) ad_channel: Option<String>,
    /// Overrides the configured bundled share target, in percent.
    #[serde(default)]
    pub(crate) bundled_target: Option<String>,
}

impl DashboardQuery {
    fn filter(&self) -> DatasetFilter {
        DatasetFilter {
            from: self.from,
            to: self.to,
            time_of_day: split_list(self.time_of_day.as_deref()),
            service_type: split_list(self.service_type.as_deref()),
            customer_type: split_list(self.customer_type.as_deref()),
            ad_channel: split_list(self.ad_channel.as_deref()),
        }
    }

    /// Requested target as a fraction, falling back to the configured one.
    fn bundled_target(&self, config: &DashboardConfig) -> Result<f64, DashboardError> {
        match self.bundled_target.as_deref() {
            Some(raw) => Ok(DashboardConfig::parse_target_pct(raw)? / 100.0),
            None => Ok(config.bundled_target()),
        }
    }
}

pub(crate) fn dashboard_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/dashboard", post(dashboard_endpoint))
        .route("/api/v1/dashboard/schema", get(schema_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn schema_endpoint() -> Json<serde_json::Value> {
    Json(json!({ "required_columns": REQUIRED_COLUMNS }))
}

pub(crate) async fn dashboard_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DashboardSummary>, AppError> {
    let format = upload_format(&headers);
    let bundled_target = query.bundled_target(&state.dashboard)?;
    info!(bytes = body.len(), ?format, "dashboard upload received");

    let dashboard = match format {
        SpreadsheetFormat::Csv => SalesDashboard::from_csv_reader(Cursor::new(body))?,
        SpreadsheetFormat::Workbook => SalesDashboard::from_workbook_bytes(body.to_vec())?,
    };

    let summary = dashboard.summarize(&query.filter(), bundled_target)?;

    Ok(Json(summary))
}
