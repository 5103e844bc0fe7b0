use anyhow::{bail, Result};
use tcgplayer::{Config, Updater};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    common::setup_env();
    let config = Config::from_env()?;

    let Some(target) = config.target.clone() else {
        bail!("Nothing to collect: set TCGP_SET_ID or TCGP_PRODUCT_IDS");
    };

    let cancel = CancellationToken::new();
    let updater = Updater::new(&config, cancel.clone())?;

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received, stopping at the next page boundary");
            shutdown.cancel();
        }
    });

    let report = updater.sync(&target).await?;
    report.log_summary();

    Ok(())
}
