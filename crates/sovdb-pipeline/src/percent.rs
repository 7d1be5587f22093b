//! Integer percentages that sum to exactly 100.

use serde::Serialize;

/// One normalized entry, in the caller-supplied order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PercentSlice {
    pub label: String,
    pub percent: i64,
}

/// One chart slice as the presentation layer consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedSlice {
    pub name: String,
    /// 0–100; slice values for one chart sum to exactly 100.
    pub value: i64,
    pub color: String,
}

/// Converts ordered `(label, raw_count)` pairs into integer percentages.
///
/// Each item gets `round(raw / total * 100)`; the rounding remainder
/// (`100 - sum`) is then added to the **first** item, so callers supply
/// primary-entity-first ordering (tracked brand, then competitors by
/// descending share, then the "other" bucket). A zero total returns an
/// empty list. Items whose share rounds to 0 but whose raw count is
/// positive are retained — hiding them is a presentation decision.
#[must_use]
pub fn normalize_percentages(items: &[(String, u64)]) -> Vec<PercentSlice> {
    let total: u64 = items.iter().map(|(_, count)| count).sum();
    if total == 0 {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let mut slices: Vec<PercentSlice> = items
        .iter()
        .map(|(label, count)| PercentSlice {
            label: label.clone(),
            percent: (*count as f64 * 100.0 / total as f64).round() as i64,
        })
        .collect();

    let sum: i64 = slices.iter().map(|s| s.percent).sum();
    slices[0].percent += 100 - sum;

    slices
}

/// Pairs normalized percentages with per-label colors.
#[must_use]
pub fn attach_colors<F>(slices: Vec<PercentSlice>, color_for: F) -> Vec<AggregatedSlice>
where
    F: Fn(&str) -> String,
{
    slices
        .into_iter()
        .map(|s| AggregatedSlice {
            color: color_for(&s.label),
            name: s.label,
            value: s.percent,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(raw: &[(&str, u64)]) -> Vec<(String, u64)> {
        raw.iter().map(|(l, c)| ((*l).to_string(), *c)).collect()
    }

    fn percents(slices: &[PercentSlice]) -> Vec<i64> {
        slices.iter().map(|s| s.percent).collect()
    }

    #[test]
    fn known_rounding_scenario_sums_to_exactly_100() {
        let input = counts(&[
            ("brand", 242),
            ("northwind", 202),
            ("acme", 189),
            ("beacon", 161),
            ("other", 149),
        ]);
        let slices = normalize_percentages(&input);
        assert_eq!(percents(&slices), vec![26, 21, 20, 17, 16]);
        assert_eq!(slices.iter().map(|s| s.percent).sum::<i64>(), 100);
    }

    #[test]
    fn remainder_lands_on_first_item() {
        // 1/3 each rounds to 33; the +1 remainder goes to the first slice.
        let slices = normalize_percentages(&counts(&[("a", 1), ("b", 1), ("c", 1)]));
        assert_eq!(percents(&slices), vec![34, 33, 33]);
    }

    #[test]
    fn single_item_is_always_100() {
        let slices = normalize_percentages(&counts(&[("only", 7)]));
        assert_eq!(percents(&slices), vec![100]);
    }

    #[test]
    fn zero_total_returns_empty() {
        assert!(normalize_percentages(&counts(&[("a", 0), ("b", 0)])).is_empty());
        assert!(normalize_percentages(&[]).is_empty());
    }

    #[test]
    fn tiny_nonzero_shares_are_retained_at_zero_percent() {
        let slices = normalize_percentages(&counts(&[("big", 1_000), ("tiny", 1)]));
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[1].percent, 0);
        assert_eq!(slices.iter().map(|s| s.percent).sum::<i64>(), 100);
    }

    #[test]
    fn sum_invariant_holds_across_sizes_and_shapes() {
        // Deterministic sweep over sizes 1..=20 with uneven counts.
        for size in 1..=20u64 {
            let input: Vec<(String, u64)> = (0..size)
                .map(|i| (format!("item-{i}"), (i * 37 + 11) % 97 + 1))
                .collect();
            let slices = normalize_percentages(&input);
            assert_eq!(slices.len(), input.len(), "size {size}");
            assert_eq!(
                slices.iter().map(|s| s.percent).sum::<i64>(),
                100,
                "size {size}"
            );
            assert!(
                slices.iter().all(|s| s.percent >= 0),
                "size {size}: negative percent"
            );
        }
    }

    #[test]
    fn attach_colors_preserves_order_and_values() {
        let slices = normalize_percentages(&counts(&[("brand", 3), ("acme", 1)]));
        let colored = attach_colors(slices, |label| {
            if label == "brand" {
                "#0f172a".to_string()
            } else {
                "#16a34a".to_string()
            }
        });
        assert_eq!(colored[0].name, "brand");
        assert_eq!(colored[0].color, "#0f172a");
        assert_eq!(colored[0].value + colored[1].value, 100);
    }
}
