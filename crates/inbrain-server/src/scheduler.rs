//! Background job scheduler.
//!
//! Registers the recurring clustering job when both a cron schedule and a
//! clustering key are configured. Otherwise the scheduler runs empty.

use std::sync::Arc;

use inbrain_clusterer::{ClusterRequest, ClustererClient};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::generation::generate_for_user;
use crate::in_flight::InFlight;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    clusterer: Option<Arc<ClustererClient>>,
    in_flight: InFlight,
    schedule: Option<&str>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    match (schedule, clusterer) {
        (Some(cron), Some(client)) => {
            register_clustering_job(&scheduler, cron, pool, client, in_flight).await?;
        }
        (Some(_), None) => {
            tracing::warn!("scheduler: CLUSTER_SCHEDULE set without a clustering key; not registered");
        }
        (None, _) => {}
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_clustering_job(
    scheduler: &JobScheduler,
    cron: &str,
    pool: PgPool,
    client: Arc<ClustererClient>,
    in_flight: InFlight,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let client = Arc::clone(&client);
        let in_flight = in_flight.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting clustering run");
            run_clustering_job(&pool, &client, &in_flight).await;
            tracing::info!("scheduler: clustering run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered clustering job");
    Ok(())
}

/// Cluster every user with enough unprocessed comments, one at a time.
///
/// Users with a run already in flight are skipped. A failure for one user is
/// logged and does not stop the others.
async fn run_clustering_job(pool: &PgPool, client: &ClustererClient, in_flight: &InFlight) {
    let request = ClusterRequest::default();
    let users =
        match inbrain_db::list_users_with_unprocessed(pool, i64::from(request.min_cluster_size))
            .await
        {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = %e, "scheduler: failed to list users with unprocessed comments");
                return;
            }
        };

    if users.is_empty() {
        tracing::info!("scheduler: no users with enough unprocessed comments; skipping");
        return;
    }

    let mut succeeded = 0_usize;
    let mut failed = 0_usize;
    for user_id in users {
        let Some(_guard) = in_flight.try_acquire(user_id) else {
            tracing::info!(user_id = %user_id, "scheduler: generation already running; skipping user");
            continue;
        };
        match generate_for_user(pool, client, user_id, &request).await {
            Ok(_) => succeeded += 1,
            Err(e) => {
                failed += 1;
                tracing::error!(user_id = %user_id, error = %e, "scheduler: clustering failed");
            }
        }
    }

    tracing::info!(succeeded, failed, "scheduler: clustering pass finished");
}
