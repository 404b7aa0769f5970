//! Usage metrics decorator.
//!
//! Wraps any [`InvocationClient`] by composition, forwarding calls and
//! observing outcomes. Counters only advance on a successful full drain of a
//! stream; failures are tracked separately. Token counts are rough
//! whitespace-word estimates, not tokenizer counts.

use async_trait::async_trait;
use futures_util::{StreamExt as _, stream::try_unfold};
use maxline_types::{
    InvocationClient,
    traits::{Result, TextStream},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Rough token estimate: whitespace-delimited word count.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

#[derive(Debug, Default)]
struct Counters {
    request_count: AtomicU64,
    failed_requests: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Point-in-time view of accumulated metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub request_count: u64,
    pub failed_requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub avg_latency_ms: f64,
}

/// [`InvocationClient`] decorator accumulating request counts, token
/// estimates, and latency.
pub struct MetricsClient {
    inner: Arc<dyn InvocationClient>,
    counters: Arc<Counters>,
}

impl MetricsClient {
    /// Wraps `inner` with metrics accounting.
    #[must_use]
    pub fn new(inner: Arc<dyn InvocationClient>) -> Self {
        Self {
            inner,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Returns the current metrics, with derived totals and averages.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let request_count = self.counters.request_count.load(Ordering::Relaxed);
        let input_tokens = self.counters.input_tokens.load(Ordering::Relaxed);
        let output_tokens = self.counters.output_tokens.load(Ordering::Relaxed);
        let total_latency_ms = self.counters.total_latency_ms.load(Ordering::Relaxed);

        #[allow(clippy::cast_precision_loss)]
        let avg_latency_ms = if request_count == 0 {
            0.0
        } else {
            total_latency_ms as f64 / request_count as f64
        };

        MetricsSnapshot {
            request_count,
            failed_requests: self.counters.failed_requests.load(Ordering::Relaxed),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            avg_latency_ms,
        }
    }

    /// Zeroes all counters.
    pub fn reset(&self) {
        self.counters.request_count.store(0, Ordering::Relaxed);
        self.counters.failed_requests.store(0, Ordering::Relaxed);
        self.counters.input_tokens.store(0, Ordering::Relaxed);
        self.counters.output_tokens.store(0, Ordering::Relaxed);
        self.counters.total_latency_ms.store(0, Ordering::Relaxed);
    }
}

struct Observed {
    inner: TextStream,
    counters: Arc<Counters>,
    input_tokens: u64,
    output_tokens: u64,
    started: Instant,
}

/// Wrap a stream so a clean end commits the call's metrics and a failure
/// bumps only the failure counter.
fn observe(
    inner: TextStream,
    counters: Arc<Counters>,
    input_tokens: u64,
    started: Instant,
) -> TextStream {
    let state = Observed {
        inner,
        counters,
        input_tokens,
        output_tokens: 0,
        started,
    };

    Box::pin(try_unfold(state, |mut s| async move {
        match s.inner.next().await {
            Some(Ok(text)) => {
                s.output_tokens += estimate_tokens(&text);
                Ok(Some((text, s)))
            }
            Some(Err(e)) => {
                s.counters.failed_requests.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
            None => {
                let elapsed_ms = u64::try_from(s.started.elapsed().as_millis()).unwrap_or(u64::MAX);
                s.counters.request_count.fetch_add(1, Ordering::Relaxed);
                s.counters
                    .input_tokens
                    .fetch_add(s.input_tokens, Ordering::Relaxed);
                s.counters
                    .output_tokens
                    .fetch_add(s.output_tokens, Ordering::Relaxed);
                s.counters
                    .total_latency_ms
                    .fetch_add(elapsed_ms, Ordering::Relaxed);
                Ok(None)
            }
        }
    }))
}

#[async_trait]
impl InvocationClient for MetricsClient {
    async fn invoke_streaming(
        &self,
        prompt: &str,
        system_context: Option<&str>,
        max_retries: u32,
    ) -> Result<TextStream> {
        let started = Instant::now();
        let input_tokens =
            estimate_tokens(prompt) + system_context.map_or(0, estimate_tokens);

        match self
            .inner
            .invoke_streaming(prompt, system_context, max_retries)
            .await
        {
            Ok(stream) => Ok(observe(
                stream,
                Arc::clone(&self.counters),
                input_tokens,
                started,
            )),
            Err(e) => {
                self.counters.failed_requests.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    async fn validate_connection(&self) -> Result<bool> {
        self.inner.validate_connection().await
    }
}
