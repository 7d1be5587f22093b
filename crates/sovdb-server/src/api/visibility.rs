//! Share-of-voice widgets: pie breakdown, daily trend, and the narrative
//! summary. Each handler runs one pipeline invocation; widgets fall back
//! to sample data silently.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sovdb_core::CompetitorRecord;
use sovdb_db::{BrandRow, DbError, ReportRow};
use sovdb_pipeline::{
    attach_colors, dedupe_by_key, normalize_percentages, run_widget, AggregatedSlice, OnError,
    WidgetData,
};

use crate::middleware::RequestId;

use super::{
    map_db_error, resolve_brand, resolve_range, samples, ApiError, ApiResponse, AppState,
    BrandRangeQuery, ResponseMeta,
};

pub(super) const BRAND_COLOR: &str = "#0f172a";
pub(super) const OTHER_COLOR: &str = "#94a3b8";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct TrendPoint {
    pub date: NaiveDate,
    pub score: Decimal,
}

#[derive(Debug, Serialize)]
pub(super) struct NarrativeData {
    pub summary: String,
    pub is_sample: bool,
}

pub(super) async fn share_of_voice(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BrandRangeQuery>,
) -> Result<Json<ApiResponse<WidgetData<AggregatedSlice>>>, ApiError> {
    let brand = resolve_brand(&state, &req_id.0, &query.brand).await?;
    let (from, to) = resolve_range(&query);

    let sample = samples::sample_share_of_voice();
    let data = run_widget(
        OnError::Fallback,
        &sample,
        fetch_share_of_voice(&state, &brand, from, to),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BrandRangeQuery>,
) -> Result<Json<ApiResponse<WidgetData<TrendPoint>>>, ApiError> {
    let brand = resolve_brand(&state, &req_id.0, &query.brand).await?;
    let (from, to) = resolve_range(&query);

    let sample = samples::sample_trend();
    let data = run_widget(
        OnError::Fallback,
        &sample,
        fetch_trend(&state, &brand, from, to),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn narrative(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BrandRangeQuery>,
) -> Result<Json<ApiResponse<NarrativeData>>, ApiError> {
    let Some(llm) = state.llm.clone() else {
        return Err(ApiError::new(
            req_id.0,
            "unavailable",
            "narrative summaries require the completion API to be configured",
        ));
    };

    let brand = resolve_brand(&state, &req_id.0, &query.brand).await?;
    let (from, to) = resolve_range(&query);

    let sample = samples::sample_share_of_voice();
    let widget = run_widget(
        OnError::Fallback,
        &sample,
        fetch_share_of_voice(&state, &brand, from, to),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let lines: Vec<String> = widget
        .items
        .iter()
        .map(|s| format!("{}: {}%", s.name, s.value))
        .collect();

    let summary = llm
        .summarize_visibility(&brand.name, &lines)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, brand = %brand.slug, "narrative generation failed");
            ApiError::new(
                req_id.0.clone(),
                "internal_error",
                "narrative generation failed",
            )
        })?;

    Ok(Json(ApiResponse {
        data: NarrativeData {
            summary,
            is_sample: widget.is_sample,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn fetch_share_of_voice(
    state: &AppState,
    brand: &BrandRow,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AggregatedSlice>, DbError> {
    let reports = sovdb_db::list_completed_reports(&state.pool, brand.id, from, to).await?;
    let daily: Vec<ReportRow> = dedupe_by_key(reports, |r| r.report_date, report_rank)
        .into_values()
        .collect();

    let counts = share_counts(&brand.name, &state.competitors, &daily);
    let slices = normalize_percentages(&counts);
    Ok(attach_colors(slices, |label| {
        slice_color(&brand.name, &state.competitors, label)
    }))
}

async fn fetch_trend(
    state: &AppState,
    brand: &BrandRow,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<TrendPoint>, DbError> {
    let reports = sovdb_db::list_completed_reports(&state.pool, brand.id, from, to).await?;
    let mut points: Vec<TrendPoint> = dedupe_by_key(reports, |r| r.report_date, report_rank)
        .into_values()
        .map(|r| TrendPoint {
            date: r.report_date,
            score: r.visibility_score.unwrap_or_default(),
        })
        .collect();
    points.sort_by_key(|p| p.date);
    Ok(points)
}

/// The dedupe rank: the charted visibility score. A missing score ranks
/// as zero so a scored duplicate always beats an unscored one.
fn report_rank(report: &ReportRow) -> Decimal {
    report.visibility_score.unwrap_or_default()
}

/// Sums per-entity mention counts across the deduped rows and orders them
/// tracked-brand-first, then roster competitors by descending share, then
/// an aggregated "Other" bucket for unrecognized entities.
///
/// The brand and every roster competitor are seeded even at zero mentions;
/// "Other" appears only when it is non-zero.
fn share_counts(
    brand_name: &str,
    competitors: &[CompetitorRecord],
    rows: &[ReportRow],
) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for row in rows {
        if let Some(map) = row.entity_breakdown.as_object() {
            for (entity, value) in map {
                *counts.entry(entity.clone()).or_insert(0) += value.as_u64().unwrap_or(0);
            }
        }
    }

    let mut ordered = vec![(
        brand_name.to_owned(),
        counts.remove(brand_name).unwrap_or(0),
    )];

    let mut roster: Vec<(String, u64)> = competitors
        .iter()
        .map(|c| (c.name.clone(), counts.remove(&c.name).unwrap_or(0)))
        .collect();
    // Stable sort: equal counts keep roster order.
    roster.sort_by(|a, b| b.1.cmp(&a.1));
    ordered.extend(roster);

    let other: u64 = counts.values().sum();
    if other > 0 {
        ordered.push(("Other".to_string(), other));
    }

    ordered
}

fn slice_color(brand_name: &str, competitors: &[CompetitorRecord], label: &str) -> String {
    if label == brand_name {
        return BRAND_COLOR.to_string();
    }
    competitors
        .iter()
        .find(|c| c.name == label)
        .map_or_else(|| OTHER_COLOR.to_string(), |c| c.color.clone())
}
