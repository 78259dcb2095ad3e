pub mod poller;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::bot::AppState;
use crate::broadcast::run_broadcast;

type Task = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Wrapper around tokio-cron-scheduler for the broadcast timer
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { inner })
    }

    /// Add a job that fires every `every`, first firing one interval from now
    pub async fn add_interval_job<F>(&self, every: Duration, name: &str, task: F) -> Result<()>
    where
        F: Fn() -> Task + Send + Sync + 'static,
    {
        let job_name = name.to_string();
        let job = Job::new_repeated_async(every, move |_uuid, _lock| {
            let name = job_name.clone();
            let fut = task();
            Box::pin(async move {
                info!("Running scheduled task: {}", name);
                fut.await;
            })
        })
        .with_context(|| format!("Failed to create interval job: {}", name))?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;

        info!("Scheduled task '{}' every {:?}", name, every);
        Ok(())
    }

    /// Add a job that fires once after `delay`
    pub async fn add_one_shot_job<F>(&self, delay: Duration, name: &str, task: F) -> Result<()>
    where
        F: Fn() -> Task + Send + Sync + 'static,
    {
        let job_name = name.to_string();
        let job = Job::new_one_shot_async(delay, move |_uuid, _lock| {
            let name = job_name.clone();
            let fut = task();
            Box::pin(async move {
                info!("Running one-shot task: {}", name);
                fut.await;
            })
        })
        .with_context(|| format!("Failed to create one-shot job: {}", name))?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;

        info!("Scheduled one-shot task '{}' in {:?}", name, delay);
        Ok(())
    }

    /// Register the recurring broadcast plus its startup kick
    pub async fn add_broadcast(&self, state: Arc<AppState>) -> Result<()> {
        let broadcast = &state.config.broadcast;
        let (interval, startup_delay) = (broadcast.interval(), broadcast.startup_delay());

        let recurring = state.clone();
        self.add_interval_job(interval, "broadcast", move || {
            let state = recurring.clone();
            Box::pin(async move {
                run_broadcast(&state).await;
            })
        })
        .await?;

        let kick = state.clone();
        self.add_one_shot_job(startup_delay, "startup broadcast", move || {
            let state = kick.clone();
            Box::pin(async move {
                run_broadcast(&state).await;
            })
        })
        .await
    }

    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // tokio-cron-scheduler hangs on `add` under the current-thread runtime.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_one_shot_job_runs_once() {
        let mut scheduler = Scheduler::new().await.unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        scheduler
            .add_one_shot_job(Duration::from_millis(50), "count", move || {
                let counter = counter.clone();
                Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .await
            .unwrap();
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        scheduler.shutdown().await.unwrap();
    }
}
