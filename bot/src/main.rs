mod scheduler;

use anyhow::{bail, Result};
use scheduler::Scheduler;
use tcgplayer::{Config, Updater};
use tokio::signal;
use tokio_util::sync::CancellationToken;

const DEFAULT_SCHEDULE: &str = "every day";

#[tokio::main]
async fn main() -> Result<()> {
    common::setup_env();
    let config = Config::from_env()?;

    let Some(target) = config.target.clone() else {
        bail!("Nothing to collect: set TCGP_SET_ID or TCGP_PRODUCT_IDS");
    };
    let schedule = common::env_var("TCGP_SCHEDULE").unwrap_or_else(|| DEFAULT_SCHEDULE.into());

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(Updater::new(&config, cancel.clone())?, target).await?;
    scheduler.schedule_collection(&schedule).await?;
    scheduler.start().await?;
    log::info!("Collecting on schedule {schedule:?}");

    signal::ctrl_c().await?;
    log::info!("Shutting down");
    cancel.cancel();
    scheduler.shutdown().await?;

    Ok(())
}
