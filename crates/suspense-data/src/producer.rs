//! The producer boundary.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use suspense_core::ProducerError;

/// An opaque async operation that yields a section's data.
///
/// Each call to [`produce`](Producer::produce) is one invocation and
/// settles at most once. The coordinator assumes nothing else about it.
#[async_trait]
pub trait Producer<T>: Send + Sync {
    /// Run the operation.
    async fn produce(&self) -> Result<T, ProducerError>;
}

#[async_trait]
impl<T, P> Producer<T> for Arc<P>
where
    T: Send + 'static,
    P: Producer<T> + ?Sized,
{
    async fn produce(&self) -> Result<T, ProducerError> {
        (**self).produce().await
    }
}

/// Producer backed by a closure returning a future.
///
/// Created with [`producer_fn`].
#[derive(Clone)]
pub struct FnProducer<F> {
    f: F,
}

/// Adapt an async closure into a [`Producer`].
///
/// ```ignore
/// let posts = producer_fn(move || {
///     let client = client.clone();
///     async move { client.get_json::<Vec<Post>>("/posts").await.map_err(Into::into) }
/// });
/// ```
pub fn producer_fn<F>(f: F) -> FnProducer<F> {
    FnProducer { f }
}

#[async_trait]
impl<T, F, Fut> Producer<T> for FnProducer<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ProducerError>> + Send,
{
    async fn produce(&self) -> Result<T, ProducerError> {
        (self.f)().await
    }
}

/// Producer that always resolves with a clone of a fixed record.
#[derive(Debug, Clone)]
pub struct Constant<T> {
    value: T,
}

impl<T> Constant<T> {
    /// Create a constant producer.
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

#[async_trait]
impl<T> Producer<T> for Constant<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn produce(&self) -> Result<T, ProducerError> {
        Ok(self.value.clone())
    }
}

/// Producer that plays back a fixed script of outcomes.
///
/// Invocation `n` yields step `n`; once the script is exhausted the last
/// step repeats. Used to model a producer that fails first and succeeds
/// on a manual retry.
#[derive(Debug)]
pub struct Scripted<T> {
    steps: Vec<Result<T, ProducerError>>,
    calls: AtomicUsize,
}

impl<T> Scripted<T> {
    /// Create a scripted producer.
    pub fn new(steps: Vec<Result<T, ProducerError>>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail once with `message`, then resolve with `value`.
    pub fn fail_then(message: impl Into<String>, value: T) -> Self {
        Self::new(vec![Err(ProducerError::new(message)), Ok(value)])
    }

    /// Number of times the producer has been invoked.
    pub fn invocations(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T> Producer<T> for Scripted<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn produce(&self) -> Result<T, ProducerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.steps.get(call).or_else(|| self.steps.last()) {
            Some(step) => step.clone(),
            None => Err(ProducerError::new("Scripted producer has no outcomes")),
        }
    }
}
