/*!
 * Fallback chain executor.
 *
 * A chain is an ordered list of providers for one capability plus an
 * optional offline generator. Providers are tried strictly in the order they
 * were added; the first success wins and no later provider is called. A
 * failing provider never gets a second attempt: the next provider in the
 * chain plays the role of the retry. When every provider has failed, the
 * offline generator (if any) produces the value; otherwise the chain fails
 * with `NoProviderAvailable`.
 */

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::errors::{ChainError, ProviderError, ProviderErrorKind};
use crate::providers::{Capability, Provider};

/// Local stand-in that produces a value without network access
///
/// Implementations must not fail; they are the chain's terminal step.
pub trait OfflineGenerator<I, O>: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn generate(&self, input: &I) -> O;
}

/// Label for a provider failure in logs
///
/// The chain moves on to the next provider whatever the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retrying the same provider would not help (bad key, unusable payload)
    NonRetryable,
    /// Transient condition (throttling, slowness, outage)
    Transient,
}

impl FailureClass {
    pub fn of(kind: ProviderErrorKind) -> Self {
        match kind {
            ProviderErrorKind::Unauthorized | ProviderErrorKind::MalformedResponse => Self::NonRetryable,
            ProviderErrorKind::RateLimited | ProviderErrorKind::Timeout | ProviderErrorKind::Unavailable => {
                Self::Transient
            }
        }
    }
}

/// Outcome of one provider attempt
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Succeeded,
    Failed(ProviderError),
}

/// Record of one provider attempt, kept for the duration of one execution
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub capability: Capability,
    pub provider_name: String,
    pub outcome: AttemptOutcome,
    pub latency: Duration,
}

impl AttemptResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Succeeded)
    }

    pub fn error(&self) -> Option<&ProviderError> {
        match &self.outcome {
            AttemptOutcome::Failed(error) => Some(error),
            AttemptOutcome::Succeeded => None,
        }
    }
}

/// Where the chain's value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    Provider(String),
    Offline(String),
}

impl ValueSource {
    pub fn name(&self) -> &str {
        match self {
            ValueSource::Provider(name) | ValueSource::Offline(name) => name,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, ValueSource::Offline(_))
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Provider(name) => write!(f, "{}", name),
            ValueSource::Offline(name) => write!(f, "{} (offline)", name),
        }
    }
}

/// Successful chain execution
#[derive(Debug, Clone)]
pub struct ChainOutput<O> {
    pub value: O,
    pub source: ValueSource,
    /// Provider attempts in the order they were made; the offline step is
    /// not an attempt
    pub attempts: Vec<AttemptResult>,
}

struct ChainEntry<I, O> {
    provider: Arc<dyn Provider<Input = I, Output = O>>,
    timeout: Duration,
}

/// Ordered provider list for one capability
pub struct FallbackChain<I, O> {
    capability: Capability,
    entries: Vec<ChainEntry<I, O>>,
    offline: Option<Arc<dyn OfflineGenerator<I, O>>>,
}

impl<I, O> Debug for FallbackChain<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("capability", &self.capability)
            .field("providers", &self.provider_names())
            .field("offline", &self.offline.as_ref().map(|g| g.name().to_string()))
            .finish()
    }
}

impl<I, O> FallbackChain<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    /// Create an empty chain for a capability
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            entries: Vec::new(),
            offline: None,
        }
    }

    /// Append a provider; it is tried after every provider added before it
    pub fn with_provider(mut self, provider: Arc<dyn Provider<Input = I, Output = O>>, timeout: Duration) -> Self {
        if provider.capability() != self.capability {
            warn!(
                "Provider {} serves {} but was added to the {} chain",
                provider.name(),
                provider.capability(),
                self.capability
            );
        }
        self.entries.push(ChainEntry { provider, timeout });
        self
    }

    /// Set the terminal offline generator
    pub fn with_offline(mut self, generator: Arc<dyn OfflineGenerator<I, O>>) -> Self {
        self.offline = Some(generator);
        self
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Provider names in priority order
    pub fn provider_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.provider.name().to_string()).collect()
    }

    pub fn has_offline(&self) -> bool {
        self.offline.is_some()
    }

    /// Upper bound on the time spent in providers by one execution
    pub fn worst_case_latency(&self) -> Duration {
        self.entries.iter().map(|e| e.timeout).sum()
    }

    /// Run the chain for one input
    pub async fn execute(&self, input: &I) -> Result<ChainOutput<O>, ChainError> {
        let mut attempts = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            let name = entry.provider.name().to_string();
            debug!("{}: trying provider {}", self.capability, name);

            let started = Instant::now();
            let result = match tokio::time::timeout(entry.timeout, entry.provider.invoke(input)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::timeout(name.clone(), entry.timeout)),
            };
            let latency = started.elapsed();

            match result {
                Ok(value) => {
                    info!("{}: provider {} succeeded in {}ms", self.capability, name, latency.as_millis());
                    attempts.push(AttemptResult {
                        capability: self.capability,
                        provider_name: name.clone(),
                        outcome: AttemptOutcome::Succeeded,
                        latency,
                    });
                    return Ok(ChainOutput {
                        value,
                        source: ValueSource::Provider(name),
                        attempts,
                    });
                }
                Err(error) => {
                    let class = FailureClass::of(error.kind);
                    warn!(
                        "{}: provider {} failed after {}ms ({:?}): {}",
                        self.capability,
                        name,
                        latency.as_millis(),
                        class,
                        error
                    );
                    attempts.push(AttemptResult {
                        capability: self.capability,
                        provider_name: name,
                        outcome: AttemptOutcome::Failed(error),
                        latency,
                    });
                }
            }
        }

        if let Some(generator) = &self.offline {
            info!(
                "{}: {} provider(s) exhausted, using offline generator {}",
                self.capability,
                attempts.len(),
                generator.name()
            );
            return Ok(ChainOutput {
                value: generator.generate(input),
                source: ValueSource::Offline(generator.name().to_string()),
                attempts,
            });
        }

        let failures = attempts
            .into_iter()
            .filter_map(|a| match a.outcome {
                AttemptOutcome::Failed(error) => Some(error),
                AttemptOutcome::Succeeded => None,
            })
            .collect();

        Err(ChainError::NoProviderAvailable {
            capability: self.capability,
            failures,
        })
    }
}
