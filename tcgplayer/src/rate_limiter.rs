use crate::{Error, Result};
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Pause taken between two page requests for the same product.
///
/// The delay is drawn uniformly from `[min, max]`; a fixed delay is just
/// `min == max`. Zero is never allowed, back-to-back requests get the
/// client blocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayPolicy {
    min: Duration,
    max: Duration,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(1200),
            max: Duration::from_millis(2300),
        }
    }
}

impl DelayPolicy {
    pub fn fixed(delay: Duration) -> Result<Self> {
        Self::random(delay, delay)
    }

    pub fn random(min: Duration, max: Duration) -> Result<Self> {
        if min.is_zero() {
            return Err(Error::Config("page delay must be greater than zero".into()));
        }
        if max < min {
            return Err(Error::Config(format!(
                "page delay range is inverted: {min:?} > {max:?}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    /// Sleeps for the next delay unless `cancel` fires first.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        let delay = self.next_delay();
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = sleep(delay) => Ok(()),
        }
    }
}
