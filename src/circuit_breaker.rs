//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for completion API
//! requests. After repeated upstream failures the free-text path fails fast
//! with an apology instead of waiting on a dead endpoint for every message.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::CompletionConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
    /// A half-open trial request is in flight
    trial_in_flight: bool,
}

/// Circuit breaker for completion requests
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold exceeded, requests fail fast
/// - **Half-Open**: Reset timeout elapsed, a single trial request is let
///   through. Its success closes the circuit; its failure reopens it for
///   another reset timeout.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    reset_after: Duration,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use umra_faq_bot::circuit_breaker::CircuitBreaker;
    /// use umra_faq_bot::config::CompletionConfig;
    ///
    /// let config = CompletionConfig::new("https://api.example.com/v1/chat/completions");
    /// let circuit_breaker = CircuitBreaker::new(&config);
    /// assert!(!circuit_breaker.is_open());
    /// ```
    pub fn new(config: &CompletionConfig) -> Self {
        Self::with_limits(
            config.circuit_breaker_threshold,
            Duration::from_secs(config.circuit_breaker_reset_secs),
        )
    }

    pub fn with_limits(threshold: u32, reset_after: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold: threshold.max(1),
            reset_after,
        }
    }

    fn state(&self) -> MutexGuard<'_, BreakerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Check if circuit breaker is open (blocking requests)
    ///
    /// Once the reset timeout has elapsed the first caller gets `false` and
    /// becomes the half-open trial; everyone else keeps getting `true` until
    /// that trial is recorded.
    pub fn is_open(&self) -> bool {
        let mut state = self.state();

        if state.failure_count < self.threshold {
            return false;
        }
        let cooling = state
            .last_failure_time
            .is_some_and(|last_time| last_time.elapsed() < self.reset_after);
        if cooling || state.trial_in_flight {
            return true;
        }
        state.trial_in_flight = true;
        false
    }

    /// Record a failed request
    ///
    /// A failed half-open trial reopens the circuit immediately.
    pub fn record_failure(&self) {
        let mut state = self.state();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure_time = Some(Instant::now());
        state.trial_in_flight = false;
    }

    /// Record a successful request, closing the circuit
    pub fn record_success(&self) {
        *self.state() = BreakerState::default();
    }
}
