use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use tcgplayer::{Target, Updater};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

pub(crate) struct Scheduler {
    scheduler: JobScheduler,
    updater: Arc<Updater>,
    target: Arc<Target>,
    /// Held for the duration of a collection so runs never overlap.
    running: Arc<Mutex<()>>,
}

impl Scheduler {
    pub(crate) async fn new(updater: Updater, target: Target) -> Result<Self> {
        Ok(Self {
            scheduler: JobScheduler::new().await?,
            updater: Arc::new(updater),
            target: Arc::new(target),
            running: Arc::new(Mutex::new(())),
        })
    }

    pub(crate) async fn schedule_collection(&self, schedule: &str) -> Result<()> {
        let updater = self.updater.clone();
        let target = self.target.clone();
        let running = self.running.clone();

        self.scheduler
            .add(Job::new_async(schedule, move |_uuid, _l| {
                let updater = updater.clone();
                let target = target.clone();
                let running = running.clone();
                Box::pin(async move {
                    let Ok(_guard) = running.try_lock() else {
                        warn!("Previous collection is still running, skipping this one");
                        return;
                    };

                    info!("Starting scheduled collection for {target:?}");
                    match updater.sync(&target).await {
                        Ok(report) => report.log_summary(),
                        Err(e) => error!("Scheduled collection failed: {e}"),
                    }
                })
            })?)
            .await?;

        Ok(())
    }

    pub(crate) async fn start(&self) -> Result<()> {
        self.scheduler.start().await?;
        Ok(())
    }

    pub(crate) async fn shutdown(mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}
