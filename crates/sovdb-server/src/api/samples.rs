//! Fixed placeholder datasets shown when a widget has nothing live to
//! render. Every dataset here is deterministic; the presentation layer
//! pairs them with a SAMPLE badge driven by the `is_sample` flag.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sovdb_pipeline::AggregatedSlice;

use super::citations::{CategorySummaryItem, DomainRow};
use super::visibility::TrendPoint;

fn slice(name: &str, value: i64, color: &str) -> AggregatedSlice {
    AggregatedSlice {
        name: name.to_string(),
        value,
        color: color.to_string(),
    }
}

pub(super) fn sample_share_of_voice() -> Vec<AggregatedSlice> {
    vec![
        slice("Your brand", 38, "#0f172a"),
        slice("Competitor A", 27, "#2563eb"),
        slice("Competitor B", 19, "#16a34a"),
        slice("Other", 16, "#94a3b8"),
    ]
}

pub(super) fn sample_trend() -> Vec<TrendPoint> {
    let day = |d: u32| NaiveDate::from_ymd_opt(2025, 1, d).expect("valid sample date");
    let score = |s: i64| Decimal::new(s, 1);
    vec![
        TrendPoint { date: day(1), score: score(412) },
        TrendPoint { date: day(2), score: score(455) },
        TrendPoint { date: day(3), score: score(438) },
        TrendPoint { date: day(4), score: score(501) },
        TrendPoint { date: day(5), score: score(527) },
        TrendPoint { date: day(6), score: score(513) },
        TrendPoint { date: day(7), score: score(560) },
    ]
}

pub(super) fn sample_category_shares() -> Vec<AggregatedSlice> {
    vec![
        slice("documentation", 34, "#2563eb"),
        slice("comparison", 26, "#16a34a"),
        slice("forum", 22, "#d97706"),
        slice("blog", 11, "#0ea5e9"),
        slice("news", 7, "#9333ea"),
    ]
}

pub(super) fn sample_category_summary() -> Vec<CategorySummaryItem> {
    vec![
        CategorySummaryItem {
            category: "documentation".to_string(),
            unique_urls: 14,
            citation_count: 41,
            percentage: Some(Decimal::new(3410, 2)),
            top_urls: vec![
                "https://docs.example.com/getting-started".to_string(),
                "https://docs.example.com/integrations".to_string(),
            ],
        },
        CategorySummaryItem {
            category: "comparison".to_string(),
            unique_urls: 9,
            citation_count: 31,
            percentage: Some(Decimal::new(2580, 2)),
            top_urls: vec!["https://reviews.example.com/top-10-analytics".to_string()],
        },
        CategorySummaryItem {
            category: "forum".to_string(),
            unique_urls: 11,
            citation_count: 27,
            percentage: Some(Decimal::new(2240, 2)),
            top_urls: vec!["https://forum.example.com/t/which-tool".to_string()],
        },
    ]
}

pub(super) fn sample_top_domains() -> Vec<DomainRow> {
    vec![
        DomainRow {
            domain: "docs.example.com".to_string(),
            citation_count: 41,
            unique_urls: 14,
        },
        DomainRow {
            domain: "reviews.example.com".to_string(),
            citation_count: 31,
            unique_urls: 9,
        },
        DomainRow {
            domain: "forum.example.com".to_string(),
            citation_count: 27,
            unique_urls: 11,
        },
    ]
}
