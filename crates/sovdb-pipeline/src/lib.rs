//! The aggregation pipeline behind every dashboard widget.
//!
//! Each chart or table runs the same five steps over backend rows:
//! batched fetch ([`batch`]), collapse duplicates per key ([`dedupe`]),
//! group and aggregate per category ([`aggregate`]), convert counts to
//! integer percentages summing to exactly 100 ([`percent`]), and substitute
//! a fixed sample dataset when there is nothing to show ([`fallback`]).
//! [`poll`] carries the one long-poll/timeout policy in the system.

pub mod aggregate;
pub mod batch;
pub mod dedupe;
pub mod fallback;
pub mod percent;
pub mod poll;

pub use aggregate::{group_aggregate, CategoryAggregate, MetricMode};
pub use batch::{fetch_chunked, fetch_chunked_concurrent, CHUNK_SIZE};
pub use dedupe::dedupe_by_key;
pub use fallback::{run_widget, OnError, WidgetData};
pub use percent::{attach_colors, normalize_percentages, AggregatedSlice, PercentSlice};
pub use poll::{poll_counter, PollConfig, PollOutcome};
