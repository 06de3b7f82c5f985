//! Simulated network latency.

use std::time::Duration;

use async_trait::async_trait;
use suspense_core::ProducerError;

use crate::producer::{Constant, Producer};

/// Producer wrapper that sleeps before delegating.
#[derive(Debug, Clone)]
pub struct Delayed<P> {
    delay: Duration,
    inner: P,
}

impl<P> Delayed<P> {
    /// Wrap `inner` so every invocation waits `delay` first.
    pub fn new(delay: Duration, inner: P) -> Self {
        Self { delay, inner }
    }

    /// The configured latency.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl<T, P> Producer<T> for Delayed<P>
where
    T: Send + 'static,
    P: Producer<T>,
{
    async fn produce(&self) -> Result<T, ProducerError> {
        tokio::time::sleep(self.delay).await;
        self.inner.produce().await
    }
}

/// Delay an arbitrary producer.
pub fn delayed<P>(delay: Duration, inner: P) -> Delayed<P> {
    Delayed::new(delay, inner)
}

/// Resolve with a fixed mock record after `delay`.
pub fn ready_after<T>(delay: Duration, value: T) -> Delayed<Constant<T>>
where
    T: Clone + Send + Sync + 'static,
{
    Delayed::new(delay, Constant::new(value))
}
