//! Telemetry for query execution
//!
//! Collects model-call, retry and batch events so the CLI can print a
//! per-query summary and tests can observe what the engine did.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::errors::ErrorKind;

/// Events kept by default; older ones are dropped, stats keep counting
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// One attempt against the remote endpoint
    ModelCall {
        attempt: u32,
        timestamp: Instant,
    },
    /// A transient failure is about to be retried
    RetryScheduled {
        attempt: u32,
        delay_ms: u64,
        kind: ErrorKind,
        timestamp: Instant,
    },
    BatchFiltered {
        batch_index: usize,
        relevant: usize,
        timestamp: Instant,
    },
    BatchSkipped {
        batch_index: usize,
        kind: ErrorKind,
        timestamp: Instant,
    },
    /// Nothing survived filtering; the leading chunks were used instead
    FallbackUsed {
        chunks: usize,
        timestamp: Instant,
    },
    QueryFinished {
        duration_ms: u64,
        error: Option<ErrorKind>,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub model_calls: usize,
    pub retry_attempts: usize,
    pub batches_filtered: usize,
    pub batches_skipped: usize,
    pub relevant_chunks: usize,
    pub fallbacks: usize,
    pub queries_finished: usize,
    pub queries_failed: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<VecDeque<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    capacity: usize,
    start_time: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Keep at most `capacity` recent events (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            capacity,
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::ModelCall { .. } => {
                    stats.model_calls += 1;
                }
                TelemetryEvent::RetryScheduled { .. } => {
                    stats.retry_attempts += 1;
                }
                TelemetryEvent::BatchFiltered { relevant, .. } => {
                    stats.batches_filtered += 1;
                    stats.relevant_chunks += relevant;
                }
                TelemetryEvent::BatchSkipped { .. } => {
                    stats.batches_skipped += 1;
                }
                TelemetryEvent::FallbackUsed { .. } => {
                    stats.fallbacks += 1;
                }
                TelemetryEvent::QueryFinished { error, .. } => {
                    stats.queries_finished += 1;
                    if error.is_some() {
                        stats.queries_failed += 1;
                    }
                }
            }
        }

        let mut events = lock(&self.events);
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Number of events currently retained
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events.iter().skip(start).cloned().collect()
    }

    /// Fraction of relevance batches that produced a verdict
    pub fn batch_success_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.batches_filtered + stats.batches_skipped;
        if total == 0 {
            1.0
        } else {
            stats.batches_filtered as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Summary block, one stat per line
    pub fn summary(&self) -> String {
        let stats = self.collector.get_stats();
        let elapsed = self.collector.elapsed();

        let mut out = String::new();
        out.push_str("Query Summary\n");
        out.push_str("─────────────────────────────────────\n");
        out.push_str(&format!("Duration:          {:.2}s\n", elapsed.as_secs_f64()));
        out.push_str(&format!("Model calls:       {}\n", stats.model_calls));
        out.push_str(&format!("Retries:           {}\n", stats.retry_attempts));
        out.push_str(&format!(
            "Batches:           {} ok, {} skipped ({:.0}%)\n",
            stats.batches_filtered,
            stats.batches_skipped,
            self.collector.batch_success_rate() * 100.0
        ));
        out.push_str(&format!("Relevant chunks:   {}\n", stats.relevant_chunks));
        out.push_str(&format!("Fallback used:     {}\n", stats.fallbacks > 0));
        out
    }

    /// Print the summary to stderr when verbose
    pub fn display_summary(&self) {
        if self.should_show_details() {
            eprintln!("\n{}", self.summary());
        }
    }

    /// Check if should show detailed output
    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_creation() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.event_count(), 0);
        let stats = collector.get_stats();
        assert_eq!(stats.model_calls, 0);
    }

    #[test]
    fn test_record_model_calls_and_retries() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::ModelCall {
            attempt: 0,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::RetryScheduled {
            attempt: 0,
            delay_ms: 1000,
            kind: ErrorKind::RateLimited,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::ModelCall {
            attempt: 1,
            timestamp: Instant::now(),
        });

        let stats = collector.get_stats();
        assert_eq!(stats.model_calls, 2);
        assert_eq!(stats.retry_attempts, 1);
        assert_eq!(collector.event_count(), 3);
    }

    #[test]
    fn test_batch_success_rate() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.batch_success_rate(), 1.0);

        collector.record(TelemetryEvent::BatchFiltered {
            batch_index: 0,
            relevant: 2,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::BatchFiltered {
            batch_index: 1,
            relevant: 0,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::BatchSkipped {
            batch_index: 2,
            kind: ErrorKind::Timeout,
            timestamp: Instant::now(),
        });

        let rate = collector.batch_success_rate();
        assert!((rate - 0.666).abs() < 0.01);
        assert_eq!(collector.get_stats().relevant_chunks, 2);
    }

    #[test]
    fn test_recent_events() {
        let collector = TelemetryCollector::new();
        for i in 0..10 {
            collector.record(TelemetryEvent::ModelCall {
                attempt: i,
                timestamp: Instant::now(),
            });
        }

        let recent = collector.recent_events(3);
        assert_eq!(recent.len(), 3);
        assert!(matches!(recent[2], TelemetryEvent::ModelCall { attempt: 9, .. }));
    }

    #[test]
    fn test_event_log_is_bounded() {
        let collector = TelemetryCollector::with_capacity(4);
        let shared = collector.clone();
        for i in 0..10 {
            shared.record(TelemetryEvent::ModelCall {
                attempt: i,
                timestamp: Instant::now(),
            });
        }

        assert_eq!(collector.event_count(), 4);
        assert_eq!(collector.get_stats().model_calls, 10);

        let recent = collector.recent_events(10);
        assert_eq!(recent.len(), 4);
        assert!(matches!(recent[0], TelemetryEvent::ModelCall { attempt: 6, .. }));
        assert!(matches!(recent[3], TelemetryEvent::ModelCall { attempt: 9, .. }));
    }

    #[test]
    fn test_failed_queries_counted() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::QueryFinished {
            duration_ms: 10,
            error: None,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::QueryFinished {
            duration_ms: 10,
            error: Some(ErrorKind::Timeout),
            timestamp: Instant::now(),
        });

        let stats = collector.get_stats();
        assert_eq!(stats.queries_finished, 2);
        assert_eq!(stats.queries_failed, 1);
    }

    #[test]
    fn test_summary_lists_fallback() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::FallbackUsed {
            chunks: 3,
            timestamp: Instant::now(),
        });
        let display = TelemetryDisplay::new(collector, crate::cli::Verbosity::Verbose);
        assert!(display.should_show_details());
        assert!(display.summary().contains("Fallback used:     true"));
    }
}
