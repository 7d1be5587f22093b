//! Background janitor jobs.
//!
//! Initialises a [`JobScheduler`] at server startup: expired admin
//! sessions are purged every ten minutes, and queue runs stuck in
//! `running` beyond the one-hour run ceiling are failed hourly.

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Seconds a run may sit in `running` before the janitor fails it.
/// Matches the progress screen's one-hour polling ceiling.
const RUN_CEILING_SECS: i64 = 3_600;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(pool: PgPool) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_session_purge_job(&scheduler, pool.clone()).await?;
    register_stalled_run_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Every ten minutes, delete admin sessions past their expiry.
async fn register_session_purge_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 */10 * * * *", move |_uuid, _lock| {
        let pool = pool.clone();
        Box::pin(async move {
            match sovdb_db::purge_expired_admin_sessions(&pool).await {
                Ok(n) if n > 0 => {
                    tracing::info!(purged = n, "janitor: expired admin sessions removed");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "janitor: admin session purge failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Hourly, fail queue runs that have been `running` past the ceiling.
async fn register_stalled_run_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async("0 5 * * * *", move |_uuid, _lock| {
        let pool = pool.clone();
        Box::pin(async move {
            match sovdb_db::fail_stalled_runs(&pool, RUN_CEILING_SECS).await {
                Ok(n) if n > 0 => {
                    tracing::warn!(failed = n, "janitor: stalled report runs marked failed");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "janitor: stalled-run sweep failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
