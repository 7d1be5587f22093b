//! The top-level wrapper every chart and table calls.

use std::fmt::Display;
use std::future::Future;

/// Per-call-site policy for backend errors.
///
/// Dashboard widgets fall back to sample data silently; full-page tables
/// surface the error so the client can render a retry control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    Fallback,
    Surface,
}

/// Widget payload plus the SAMPLE/LIVE indicator.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct WidgetData<T> {
    pub items: Vec<T>,
    pub is_sample: bool,
}

/// Runs a widget's fetch-and-aggregate future and decides the outcome.
///
/// A non-empty result is live data. An empty result substitutes the fixed
/// `sample` dataset with `is_sample = true`. An error is logged, then either
/// falls back to the sample ([`OnError::Fallback`]) or propagates
/// ([`OnError::Surface`]).
///
/// # Errors
///
/// Only under [`OnError::Surface`], and only when the future itself fails.
pub async fn run_widget<T, E, Fut>(
    policy: OnError,
    sample: &[T],
    fut: Fut,
) -> Result<WidgetData<T>, E>
where
    T: Clone,
    E: Display,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    match fut.await {
        Ok(items) if !items.is_empty() => Ok(WidgetData {
            items,
            is_sample: false,
        }),
        Ok(_) => Ok(WidgetData {
            items: sample.to_vec(),
            is_sample: true,
        }),
        Err(e) => match policy {
            OnError::Fallback => {
                tracing::warn!(error = %e, "widget fetch failed; serving sample data");
                Ok(WidgetData {
                    items: sample.to_vec(),
                    is_sample: true,
                })
            }
            OnError::Surface => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[i64] = &[40, 35, 25];

    #[tokio::test]
    async fn live_data_passes_through_unflagged() {
        let data = run_widget(OnError::Fallback, SAMPLE, async {
            Ok::<_, String>(vec![1, 2, 3])
        })
        .await
        .expect("live path");
        assert_eq!(data.items, vec![1, 2, 3]);
        assert!(!data.is_sample);
    }

    #[tokio::test]
    async fn empty_result_always_yields_the_same_sample() {
        for _ in 0..3 {
            let data = run_widget(OnError::Fallback, SAMPLE, async {
                Ok::<_, String>(Vec::new())
            })
            .await
            .expect("empty path");
            assert_eq!(data.items, SAMPLE);
            assert!(data.is_sample);
        }
    }

    #[tokio::test]
    async fn empty_result_is_sample_even_under_surface_policy() {
        // Surface applies to errors only; "no rows" is a valid empty result.
        let data = run_widget(OnError::Surface, SAMPLE, async {
            Ok::<_, String>(Vec::new())
        })
        .await
        .expect("empty is not an error");
        assert!(data.is_sample);
    }

    #[tokio::test]
    async fn fallback_policy_swallows_errors_into_sample() {
        let data = run_widget(OnError::Fallback, SAMPLE, async {
            Err::<Vec<i64>, _>("db unreachable".to_string())
        })
        .await
        .expect("error swallowed");
        assert_eq!(data.items, SAMPLE);
        assert!(data.is_sample);
    }

    #[tokio::test]
    async fn surface_policy_propagates_errors() {
        let result = run_widget(OnError::Surface, SAMPLE, async {
            Err::<Vec<i64>, _>("db unreachable".to_string())
        })
        .await;
        assert_eq!(result, Err("db unreachable".to_string()));
    }
}
