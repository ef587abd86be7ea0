//! Failure injection around any fetcher
//!
//! Used by the demo CLI to show retry behavior and by tests to script
//! outages, slow responses and malformed payloads.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::domain::ports::PageFetcher;
use crate::shared::types::{FetchError, PageEnvelope};

/// Error returned for injected failures
#[derive(Debug, Error)]
#[error("catalog service unavailable")]
pub struct ServiceUnavailable;

/// How a [`FlakyFetcher`] misbehaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailureMode {
    /// Pass every call through
    Never,
    /// Fail the first `n` calls, then recover
    FirstN(u32),
    /// Fail every call
    Always,
    /// Fail each call with the given probability (0.0–1.0)
    Rate(f64),
    /// Resolve without pagination metadata
    Malformed,
}

/// Shared record of the `(page, page_size)` of every call
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl CallLog {
    fn record(&self, page: u32, page_size: u32) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((page, page_size));
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<(u32, u32)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

/// Fetcher decorator that injects failures and latency
pub struct FlakyFetcher<P> {
    inner: P,
    mode: FailureMode,
    latency: Duration,
    failures: AtomicU32,
    log: CallLog,
}

impl<P> FlakyFetcher<P> {
    pub fn new(inner: P, mode: FailureMode) -> Self {
        Self {
            inner,
            mode,
            latency: Duration::ZERO,
            failures: AtomicU32::new(0),
            log: CallLog::default(),
        }
    }

    /// Delay every call by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Handle onto the call log that survives moving the fetcher.
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    fn should_fail(&self) -> bool {
        match self.mode {
            FailureMode::Never | FailureMode::Malformed => false,
            FailureMode::Always => true,
            FailureMode::FirstN(n) => self.failures.fetch_add(1, Ordering::SeqCst) < n,
            FailureMode::Rate(rate) => rand::thread_rng().gen_bool(rate.clamp(0.0, 1.0)),
        }
    }
}

#[async_trait]
impl<T, A, P> PageFetcher<T, A> for FlakyFetcher<P>
where
    P: PageFetcher<T, A>,
    T: Send + 'static,
    A: Send + 'static,
{
    async fn fetch(&self, page: u32, page_size: u32, args: A) -> Result<PageEnvelope<T>, FetchError> {
        self.log.record(page, page_size);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.should_fail() {
            debug!(page, page_size, "Injected fetch failure");
            return Err(Box::new(ServiceUnavailable));
        }

        let envelope = self.inner.fetch(page, page_size, args).await?;
        if self.mode == FailureMode::Malformed {
            return Ok(PageEnvelope {
                data: envelope.data,
                pagination: None,
            });
        }
        Ok(envelope)
    }
}
