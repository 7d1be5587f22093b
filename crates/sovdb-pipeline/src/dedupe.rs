//! Collapse rows sharing a logical key down to one winner per key.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Returns the single highest-ranked row per key.
///
/// `rank_fn` extracts the comparison value — the charted metric for
/// keep-highest, or an extraction timestamp for keep-most-recent. A row
/// replaces the current winner only when its rank is strictly greater, so
/// exact ties keep the first row in input-processing order. Deterministic
/// for identical input, and idempotent: running the result through again
/// collapses nothing further.
pub fn dedupe_by_key<R, K, V, KF, VF>(rows: Vec<R>, key_fn: KF, rank_fn: VF) -> HashMap<K, R>
where
    K: Eq + Hash,
    V: PartialOrd,
    KF: Fn(&R) -> K,
    VF: Fn(&R) -> V,
{
    let mut winners: HashMap<K, R> = HashMap::new();
    for row in rows {
        match winners.entry(key_fn(&row)) {
            Entry::Occupied(mut slot) => {
                if rank_fn(&row) > rank_fn(slot.get()) {
                    slot.insert(row);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
        }
    }
    winners
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        date: &'static str,
        score: f64,
        extracted_at: i64,
    }

    fn row(date: &'static str, score: f64, extracted_at: i64) -> Row {
        Row {
            date,
            score,
            extracted_at,
        }
    }

    #[test]
    fn keeps_highest_score_per_date() {
        let rows = vec![row("2025-01-05", 71.2, 1), row("2025-01-05", 68.9, 2)];
        let winners = dedupe_by_key(rows, |r| r.date, |r| r.score);
        assert_eq!(winners.len(), 1);
        assert!((winners[&"2025-01-05"].score - 71.2).abs() < f64::EPSILON);
    }

    #[test]
    fn keeps_most_recent_by_timestamp_rank() {
        let rows = vec![
            row("2025-01-06", 50.0, 10),
            row("2025-01-06", 40.0, 30),
            row("2025-01-06", 45.0, 20),
        ];
        let winners = dedupe_by_key(rows, |r| r.date, |r| r.extracted_at);
        assert_eq!(winners[&"2025-01-06"].extracted_at, 30);
    }

    #[test]
    fn exact_ties_keep_first_in_input_order() {
        let rows = vec![
            row("2025-01-07", 60.0, 1),
            row("2025-01-07", 60.0, 2),
            row("2025-01-07", 60.0, 3),
        ];
        let winners = dedupe_by_key(rows, |r| r.date, |r| r.score);
        assert_eq!(winners[&"2025-01-07"].extracted_at, 1);
    }

    #[test]
    fn distinct_keys_are_all_retained() {
        let rows = vec![
            row("2025-01-05", 71.2, 1),
            row("2025-01-06", 68.9, 2),
            row("2025-01-07", 70.0, 3),
        ];
        let winners = dedupe_by_key(rows, |r| r.date, |r| r.score);
        assert_eq!(winners.len(), 3);
    }

    #[test]
    fn idempotent_on_own_output() {
        let rows = vec![
            row("2025-01-05", 71.2, 1),
            row("2025-01-05", 68.9, 2),
            row("2025-01-06", 30.0, 3),
        ];
        let first: Vec<Row> = dedupe_by_key(rows, |r| r.date, |r| r.score)
            .into_values()
            .collect();
        let second = dedupe_by_key(first.clone(), |r| r.date, |r| r.score);
        assert_eq!(second.len(), first.len());
        for r in &first {
            assert_eq!(&second[&r.date], r);
        }
    }
}
