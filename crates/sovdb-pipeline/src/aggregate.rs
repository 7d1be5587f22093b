//! Partition rows by category and compute per-category aggregates.

use std::collections::{BTreeMap, HashSet};

/// How the numeric field is folded per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricMode {
    Sum,
    Average,
}

/// Aggregates for one category label.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAggregate {
    pub row_count: u64,
    /// Distinct sub-keys (URLs, usually) observed in the category.
    pub distinct_count: u64,
    /// Sum or mean of the numeric field, per [`MetricMode`].
    pub metric: f64,
}

/// Groups `rows` by `category_fn` and aggregates each group.
///
/// Categories with zero matching rows are simply absent; callers that need
/// every known label seed the result themselves. Returns `None` when the
/// input is empty so "no data" stays distinguishable from "all categories
/// at zero" — the caller decides whether to fall back to sample data.
pub fn group_aggregate<R, CF, SF, MF>(
    rows: &[R],
    category_fn: CF,
    subkey_fn: SF,
    metric_fn: MF,
    mode: MetricMode,
) -> Option<BTreeMap<String, CategoryAggregate>>
where
    CF: Fn(&R) -> String,
    SF: Fn(&R) -> Option<String>,
    MF: Fn(&R) -> f64,
{
    if rows.is_empty() {
        return None;
    }

    let mut groups: BTreeMap<String, (u64, HashSet<String>, f64)> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry(category_fn(row))
            .or_insert_with(|| (0, HashSet::new(), 0.0));
        entry.0 += 1;
        if let Some(subkey) = subkey_fn(row) {
            entry.1.insert(subkey);
        }
        entry.2 += metric_fn(row);
    }

    let aggregated = groups
        .into_iter()
        .map(|(category, (row_count, subkeys, total))| {
            #[allow(clippy::cast_precision_loss)]
            let metric = match mode {
                MetricMode::Sum => total,
                MetricMode::Average => total / row_count as f64,
            };
            (
                category,
                CategoryAggregate {
                    row_count,
                    distinct_count: subkeys.len() as u64,
                    metric,
                },
            )
        })
        .collect();

    Some(aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Citation {
        category: &'static str,
        url: &'static str,
        score: f64,
    }

    fn citation(category: &'static str, url: &'static str, score: f64) -> Citation {
        Citation {
            category,
            url,
            score,
        }
    }

    fn aggregate(
        rows: &[Citation],
        mode: MetricMode,
    ) -> Option<BTreeMap<String, CategoryAggregate>> {
        group_aggregate(
            rows,
            |c| c.category.to_string(),
            |c| Some(c.url.to_string()),
            |c| c.score,
            mode,
        )
    }

    #[test]
    fn empty_input_signals_no_data() {
        assert!(aggregate(&[], MetricMode::Sum).is_none());
    }

    #[test]
    fn counts_rows_and_distinct_urls_per_category() {
        let rows = vec![
            citation("docs", "https://a.example.com", 1.0),
            citation("docs", "https://a.example.com", 1.0),
            citation("docs", "https://b.example.com", 1.0),
            citation("forum", "https://c.example.com", 1.0),
        ];
        let groups = aggregate(&rows, MetricMode::Sum).expect("non-empty");
        assert_eq!(groups["docs"].row_count, 3);
        assert_eq!(groups["docs"].distinct_count, 2);
        assert_eq!(groups["forum"].row_count, 1);
        assert_eq!(groups["forum"].distinct_count, 1);
    }

    #[test]
    fn sum_and_average_modes() {
        let rows = vec![
            citation("docs", "https://a.example.com", 10.0),
            citation("docs", "https://b.example.com", 20.0),
        ];
        let summed = aggregate(&rows, MetricMode::Sum).expect("non-empty");
        assert!((summed["docs"].metric - 30.0).abs() < f64::EPSILON);

        let averaged = aggregate(&rows, MetricMode::Average).expect("non-empty");
        assert!((averaged["docs"].metric - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unmatched_categories_are_absent() {
        let rows = vec![citation("docs", "https://a.example.com", 1.0)];
        let groups = aggregate(&rows, MetricMode::Sum).expect("non-empty");
        assert!(!groups.contains_key("forum"));
    }

    #[test]
    fn missing_subkeys_do_not_count_as_distinct() {
        struct Bare {
            category: &'static str,
        }
        let rows = vec![Bare { category: "docs" }, Bare { category: "docs" }];
        let groups = group_aggregate(
            &rows,
            |r| r.category.to_string(),
            |_| None,
            |_| 1.0,
            MetricMode::Sum,
        )
        .expect("non-empty");
        assert_eq!(groups["docs"].row_count, 2);
        assert_eq!(groups["docs"].distinct_count, 0);
    }
}
