/*!
 * Mock provider implementations for testing.
 *
 * A `MockProvider` serves any capability and follows a scripted behavior:
 * - `MockProvider::working(name, value)` - always succeeds with `value`
 * - `MockProvider::failing(name, kind)` - always fails with `kind`
 * - `MockProvider::intermittent(name, value, n)` - fails every Nth call
 * - `MockProvider::slow(name, value, ms)` - sleeps before answering
 *
 * Clones share the call counter, so tests can keep a handle while the chain
 * owns the provider.
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::{ProviderError, ProviderErrorKind};
use crate::providers::{Capability, Provider};

/// Behavior mode for the mock provider
#[derive(Debug, Clone)]
pub enum MockBehavior<O> {
    /// Always succeeds with the value
    Working(O),
    /// Always fails with the given kind
    Failing(ProviderErrorKind),
    /// Fails on every Nth request, succeeds otherwise
    Intermittent { value: O, fail_every: usize },
    /// Sleeps before succeeding (for timeout testing)
    Slow { value: O, delay_ms: u64 },
}

/// Scripted provider for chain and pipeline tests
#[derive(Debug)]
pub struct MockProvider<I, O> {
    name: String,
    capability: Capability,
    behavior: MockBehavior<O>,
    request_count: Arc<AtomicUsize>,
    _input: PhantomData<fn(&I)>,
}

impl<I, O: Clone> MockProvider<I, O> {
    pub fn new(name: impl Into<String>, capability: Capability, behavior: MockBehavior<O>) -> Self {
        Self {
            name: name.into(),
            capability,
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            _input: PhantomData,
        }
    }

    pub fn working(name: impl Into<String>, capability: Capability, value: O) -> Self {
        Self::new(name, capability, MockBehavior::Working(value))
    }

    pub fn failing(name: impl Into<String>, capability: Capability, kind: ProviderErrorKind) -> Self {
        Self::new(name, capability, MockBehavior::Failing(kind))
    }

    pub fn intermittent(name: impl Into<String>, capability: Capability, value: O, fail_every: usize) -> Self {
        Self::new(name, capability, MockBehavior::Intermittent { value, fail_every })
    }

    pub fn slow(name: impl Into<String>, capability: Capability, value: O, delay_ms: u64) -> Self {
        Self::new(name, capability, MockBehavior::Slow { value, delay_ms })
    }

    /// Number of times `invoke` has been called (shared across clones)
    pub fn calls(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

impl<I, O: Clone> Clone for MockProvider<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            capability: self.capability,
            behavior: self.behavior.clone(),
            request_count: Arc::clone(&self.request_count),
            _input: PhantomData,
        }
    }
}

#[async_trait]
impl<I, O> Provider for MockProvider<I, O>
where
    I: Debug + Send + Sync + 'static,
    O: Clone + Debug + Send + Sync + 'static,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> &str {
        &self.name
    }

    fn capability(&self) -> Capability {
        self.capability
    }

    async fn invoke(&self, _input: &I) -> Result<O, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Working(value) => Ok(value.clone()),

            MockBehavior::Failing(kind) => Err(ProviderError::new(
                self.name.clone(),
                *kind,
                "Simulated provider failure",
            )),

            MockBehavior::Intermittent { value, fail_every } => {
                if *fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::unavailable(
                        self.name.clone(),
                        format!("Simulated intermittent failure (request #{})", count + 1),
                    ))
                } else {
                    Ok(value.clone())
                }
            }

            MockBehavior::Slow { value, delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(value.clone())
            }
        }
    }
}
