//! Citation analytics: content-category shares (client-side pipeline),
//! the pre-aggregated category summary, and the top-domains table.
//!
//! The two category widgets fall back to sample data; the top-domains
//! table surfaces errors so the page can render a retry control.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sovdb_db::{BrandRow, DbError, ReportRow};
use sovdb_pipeline::{
    attach_colors, dedupe_by_key, group_aggregate, normalize_percentages, run_widget,
    AggregatedSlice, MetricMode, OnError, WidgetData,
};

use crate::middleware::RequestId;

use super::{
    map_db_error, resolve_brand, resolve_range, samples, ApiError, ApiResponse, AppState,
    BrandRangeQuery, ResponseMeta,
};

/// One row of the top-domains table.
#[derive(Debug, Clone, Serialize)]
pub(super) struct DomainRow {
    pub domain: String,
    pub citation_count: i64,
    pub unique_urls: i64,
}

/// One pre-aggregated category row, as served to the widget.
#[derive(Debug, Clone, Serialize)]
pub(super) struct CategorySummaryItem {
    pub category: String,
    pub unique_urls: i64,
    pub citation_count: i64,
    pub percentage: Option<Decimal>,
    pub top_urls: Vec<String>,
}

/// A citation joined to its URL record; the unit the aggregators consume.
#[derive(Debug, Clone)]
struct CitedUrl {
    url: String,
    domain: String,
    category: String,
}

const TOP_DOMAINS_LIMIT: usize = 10;

pub(super) async fn categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BrandRangeQuery>,
) -> Result<Json<ApiResponse<WidgetData<AggregatedSlice>>>, ApiError> {
    let brand = resolve_brand(&state, &req_id.0, &query.brand).await?;
    let (from, to) = resolve_range(&query);

    let sample = samples::sample_category_shares();
    let data = run_widget(
        OnError::Fallback,
        &sample,
        fetch_category_shares(&state, &brand, from, to),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn category_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BrandRangeQuery>,
) -> Result<Json<ApiResponse<WidgetData<CategorySummaryItem>>>, ApiError> {
    let brand = resolve_brand(&state, &req_id.0, &query.brand).await?;
    let (from, to) = resolve_range(&query);

    let pool = state.pool.clone();
    let brand_id = brand.id;
    let sample = samples::sample_category_summary();
    let data = run_widget(OnError::Fallback, &sample, async move {
        let rows = sovdb_db::category_summary(&pool, brand_id, from, to).await?;
        Ok::<_, DbError>(
            rows.into_iter()
                .map(|row| CategorySummaryItem {
                    category: row.category,
                    unique_urls: row.unique_urls,
                    citation_count: row.citation_count,
                    percentage: row.percentage,
                    top_urls: row.top_urls,
                })
                .collect(),
        )
    })
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn top_domains(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BrandRangeQuery>,
) -> Result<Json<ApiResponse<WidgetData<DomainRow>>>, ApiError> {
    let brand = resolve_brand(&state, &req_id.0, &query.brand).await?;
    let (from, to) = resolve_range(&query);

    // Full-page table: backend errors surface as a retryable error body.
    let sample = samples::sample_top_domains();
    let data = run_widget(
        OnError::Surface,
        &sample,
        fetch_top_domains(&state, &brand, from, to),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Walks reports → results → citations → urls, batching the large ID
/// lists, and returns each citation joined with its URL record. All chunks
/// are collected before the per-day dedupe upstream of this join.
async fn fetch_cited_urls(
    state: &AppState,
    brand: &BrandRow,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<CitedUrl>, DbError> {
    let reports = sovdb_db::list_completed_reports(&state.pool, brand.id, from, to).await?;
    if reports.is_empty() {
        return Ok(Vec::new());
    }

    let report_ids: Vec<i64> =
        dedupe_by_key(reports, |r: &ReportRow| r.report_date, |r| {
            r.visibility_score.unwrap_or_default()
        })
        .into_values()
        .map(|r| r.id)
        .collect();

    let results = sovdb_db::list_results_by_report_ids(&state.pool, &report_ids).await?;
    let result_ids: Vec<i64> = results.iter().map(|r| r.id).collect();

    let citations = sovdb_db::list_citations_by_result_ids(&state.pool, &result_ids).await?;

    let mut url_ids: Vec<i64> = citations.iter().map(|c| c.url_id).collect();
    url_ids.sort_unstable();
    url_ids.dedup();

    let urls = sovdb_db::list_urls_by_ids(&state.pool, &url_ids).await?;
    let by_id: HashMap<i64, sovdb_db::UrlRow> = urls.into_iter().map(|u| (u.id, u)).collect();

    Ok(citations
        .iter()
        .filter_map(|c| {
            by_id.get(&c.url_id).map(|u| CitedUrl {
                url: u.url.clone(),
                domain: u.domain.clone(),
                category: u.category.clone(),
            })
        })
        .collect())
}

async fn fetch_category_shares(
    state: &AppState,
    brand: &BrandRow,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AggregatedSlice>, DbError> {
    let cited = fetch_cited_urls(state, brand, from, to).await?;

    let Some(groups) = group_aggregate(
        &cited,
        |c| c.category.clone(),
        |c| Some(c.url.clone()),
        |_| 1.0,
        MetricMode::Sum,
    ) else {
        return Ok(Vec::new());
    };

    let mut ordered: Vec<(String, u64)> = groups
        .into_iter()
        .map(|(category, agg)| (category, agg.row_count))
        .collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let slices = normalize_percentages(&ordered);
    Ok(attach_colors(slices, category_color))
}

async fn fetch_top_domains(
    state: &AppState,
    brand: &BrandRow,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DomainRow>, DbError> {
    let cited = fetch_cited_urls(state, brand, from, to).await?;

    let Some(groups) = group_aggregate(
        &cited,
        |c| c.domain.clone(),
        |c| Some(c.url.clone()),
        |_| 1.0,
        MetricMode::Sum,
    ) else {
        return Ok(Vec::new());
    };

    let mut rows: Vec<DomainRow> = groups
        .into_iter()
        .map(|(domain, agg)| DomainRow {
            domain,
            citation_count: i64::try_from(agg.row_count).unwrap_or(i64::MAX),
            unique_urls: i64::try_from(agg.distinct_count).unwrap_or(i64::MAX),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.citation_count
            .cmp(&a.citation_count)
            .then_with(|| a.domain.cmp(&b.domain))
    });
    rows.truncate(TOP_DOMAINS_LIMIT);

    Ok(rows)
}

fn category_color(label: &str) -> String {
    match label {
        "documentation" => "#2563eb",
        "comparison" => "#16a34a",
        "forum" => "#d97706",
        "blog" => "#0ea5e9",
        "news" => "#9333ea",
        _ => "#94a3b8",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_categories_have_distinct_colors() {
        let known = ["documentation", "comparison", "forum", "blog", "news"];
        let mut seen = std::collections::HashSet::new();
        for label in known {
            assert!(seen.insert(category_color(label)), "duplicate color for {label}");
        }
    }

    #[test]
    fn unknown_category_gets_the_neutral_color() {
        assert_eq!(category_color("podcast"), "#94a3b8");
    }
}
