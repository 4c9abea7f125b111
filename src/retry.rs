use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio_retry::Retry;
use tracing::{debug, warn};

/// Exponential backoff around a single remote call: the n-th retry waits
/// `base_delay * 2^n`, and the last failure is returned once `max_retries`
/// retries are spent.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> + use<> {
        let base_delay = self.base_delay;
        (0..self.max_retries).map(move |attempt| base_delay.saturating_mul(1 << attempt.min(16)))
    }

    pub async fn run<T, A, F>(&self, label: &str, mut action: A) -> Result<T>
    where
        A: FnMut() -> F,
        F: Future<Output = Result<T>>,
    {
        let max_retries = self.max_retries;
        let mut attempt = 0u32;

        Retry::start(self.strategy(), || {
            attempt += 1;
            let current = attempt;
            let call = action();
            async move {
                match call.await {
                    Ok(value) => {
                        if current > 1 {
                            debug!("{} succeeded on attempt {}", label, current);
                        }
                        Ok(value)
                    }
                    Err(e) => {
                        warn!(
                            "{} failed (attempt {}/{}): {}",
                            label,
                            current,
                            max_retries + 1,
                            e
                        );
                        Err(e)
                    }
                }
            }
        })
        .await
    }
}
