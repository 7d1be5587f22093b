//! Bounded counter polling for long-running report runs.
//!
//! The progress screen reads a run's completion counter every five seconds
//! until it reaches its target, giving up after a one-hour wall-clock
//! ceiling with a single transition to the timed-out state. This is the
//! only timeout policy in the system; long-running progress UIs reuse it.

use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub ceiling: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            ceiling: Duration::from_secs(3_600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The counter reached the target.
    Completed { value: i64 },
    /// The ceiling elapsed first; no further reads happen after this.
    TimedOut { last_value: i64 },
}

/// Polls `read` every `config.interval` until the counter reaches `target`
/// or `config.ceiling` elapses.
///
/// The first read happens immediately. After the ceiling the function
/// returns [`PollOutcome::TimedOut`] exactly once and stops polling.
///
/// # Errors
///
/// Propagates the first read error — progress screens surface it with a
/// manual retry control rather than silently sampling.
pub async fn poll_counter<E, F, Fut>(
    config: PollConfig,
    target: i64,
    mut read: F,
) -> Result<PollOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<i64, E>>,
{
    let deadline = tokio::time::Instant::now() + config.ceiling;
    loop {
        let value = read().await?;
        if value >= target {
            return Ok(PollOutcome::Completed { value });
        }
        if tokio::time::Instant::now() + config.interval > deadline {
            return Ok(PollOutcome::TimedOut { last_value: value });
        }
        tokio::time::sleep(config.interval).await;
    }
}
