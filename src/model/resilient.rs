//! Resilient model client: deadline race plus exponential backoff
//!
//! Every model call in the engine goes through `ResilientModelClient::call`.
//! - Each attempt races the remote call against `request_timeout`
//! - Rate-limit, quota and timeout failures are retried up to `max_retries`
//!   times, waiting `base_delay * 2^attempt` before the next attempt
//! - Anything else is returned immediately
//! - Cancellation aborts both the in-flight call and any backoff sleep
//!
//! Retry bookkeeping lives on the stack of each `call`, so one client can be
//! shared by any number of concurrent queries.

use crate::errors::{mentions_quota, mentions_rate_limit, ErrorKind, RagError, Result};
use crate::model::GenerativeModel;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{ModelRequest, ModelResponse};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (1 second)
const BASE_DELAY_MS: u64 = 1000;

/// Per-attempt deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backoff and deadline settings
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay_ms: u64,
    request_timeout: Duration,
    /// Adds up to +25% on top of the computed delay, never less
    enable_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// Create policy with default settings
    pub fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            enable_jitter: false,
        }
    }

    /// Create policy with custom retry count and base delay
    pub fn with_config(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            ..Self::new()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_jitter(mut self, enabled: bool) -> Self {
        self.enable_jitter = enabled;
        self
    }

    /// Unjittered `base * 2^attempt`, saturating at `u64::MAX` milliseconds
    fn exponential_delay_ms(&self, attempt: u32) -> u64 {
        2u64.checked_pow(attempt)
            .and_then(|factor| self.base_delay_ms.checked_mul(factor))
            .unwrap_or(u64::MAX)
    }

    /// Delay to wait after attempt `attempt` (0-based) failed
    ///
    /// Doubles on every attempt with no ceiling, so `delay(n) >= base * 2^n`
    /// holds for any retry count.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay_ms = self.exponential_delay_ms(attempt);

        let final_delay = if self.enable_jitter {
            let jitter = delay_ms / 4;
            delay_ms.saturating_add((rand::random::<f64>() * jitter as f64) as u64)
        } else {
            delay_ms
        };

        Duration::from_millis(final_delay)
    }

    /// Sum of all backoff delays when every retry is used (without jitter)
    pub fn max_total_wait_time(&self) -> Duration {
        let total_ms: u64 = (0..self.max_retries)
            .map(|attempt| self.exponential_delay_ms(attempt))
            .fold(0u64, |acc, ms| acc.saturating_add(ms));

        Duration::from_millis(total_ms)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Which transient condition an error represents, if any
pub fn classify_transient(error: &RagError) -> Option<ErrorKind> {
    match error {
        RagError::Timeout { .. } => Some(ErrorKind::Timeout),
        RagError::RateLimited(_) => Some(ErrorKind::RateLimited),
        RagError::QuotaExceeded(_) => Some(ErrorKind::QuotaExceeded),
        RagError::ApiStatus { status: 429, .. } => Some(error.kind()),
        RagError::Cancelled | RagError::EmptyDocumentPool | RagError::ConfigError(_) => None,
        other => {
            let message = other.to_string();
            if mentions_quota(&message) {
                Some(ErrorKind::QuotaExceeded)
            } else if mentions_rate_limit(&message) {
                Some(ErrorKind::RateLimited)
            } else {
                None
            }
        }
    }
}

/// Re-tag the last transient error with its terminal kind
fn into_terminal(kind: ErrorKind, error: RagError, timeout: Duration) -> RagError {
    if error.kind() == kind {
        return error;
    }
    match kind {
        ErrorKind::Timeout => RagError::Timeout {
            duration_ms: timeout.as_millis() as u64,
        },
        ErrorKind::RateLimited => RagError::RateLimited(error.to_string()),
        ErrorKind::QuotaExceeded => RagError::QuotaExceeded(error.to_string()),
        _ => error,
    }
}

/// The single seam through which all model calls pass
#[derive(Clone)]
pub struct ResilientModelClient {
    backend: Arc<dyn GenerativeModel>,
    policy: RetryPolicy,
    telemetry: Option<TelemetryCollector>,
}

impl ResilientModelClient {
    /// Wrap a backend with the default policy
    pub fn new(backend: Arc<dyn GenerativeModel>) -> Self {
        Self::with_policy(backend, RetryPolicy::default())
    }

    pub fn with_policy(backend: Arc<dyn GenerativeModel>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            telemetry: None,
        }
    }

    /// Record calls and retries into `collector`
    pub fn with_telemetry(mut self, collector: TelemetryCollector) -> Self {
        self.telemetry = Some(collector);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn record(&self, event: TelemetryEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }

    /// Call the model, retrying transient failures
    pub async fn call(
        &self,
        request: &ModelRequest,
        cancel: &CancellationToken,
    ) -> Result<ModelResponse> {
        let mut attempt: u32 = 0;

        loop {
            self.record(TelemetryEvent::ModelCall {
                attempt,
                timestamp: Instant::now(),
            });

            let error = match self.attempt(request, cancel).await {
                Ok(response) => {
                    debug!(attempt, chars = response.text.len(), "Model call succeeded");
                    return Ok(response);
                }
                Err(RagError::Cancelled) => return Err(RagError::Cancelled),
                Err(e) => e,
            };

            let Some(kind) = classify_transient(&error) else {
                warn!(attempt, error = %error, "Model call failed, not retrying");
                return Err(error);
            };

            if attempt >= self.policy.max_retries {
                warn!(attempt, kind = %kind, "Model call retries exhausted");
                return Err(into_terminal(kind, error, self.policy.request_timeout));
            }

            let delay = self.policy.calculate_delay(attempt);
            warn!(
                attempt,
                kind = %kind,
                delay_ms = delay.as_millis() as u64,
                "Transient model failure, backing off"
            );
            self.record(TelemetryEvent::RetryScheduled {
                attempt,
                delay_ms: delay.as_millis() as u64,
                kind,
                timestamp: Instant::now(),
            });

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RagError::Cancelled),
                _ = sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    /// One attempt raced against the deadline and the cancellation token
    async fn attempt(
        &self,
        request: &ModelRequest,
        cancel: &CancellationToken,
    ) -> Result<ModelResponse> {
        let timeout = self.policy.request_timeout;
        let deadline = tokio::time::timeout(timeout, self.backend.generate(request));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RagError::Cancelled),
            outcome = deadline => match outcome {
                Ok(result) => result,
                Err(_) => Err(RagError::Timeout {
                    duration_ms: timeout.as_millis() as u64,
                }),
            },
        }
    }
}
