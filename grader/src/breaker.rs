//! # Circuit Breaker Module
//!
//! Process-wide gate that fails fast once the inference service has produced enough
//! consecutive failures. The breaker is a passive half-open design: while open it
//! rejects calls outright, and once the reset timeout since the last failure has
//! elapsed the next `allow()` closes it and lets the call through; that call's own
//! outcome then decides the new state. Breaker state is in-memory only and resets
//! on process restart.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::GraderError;

/// Consecutive failures required before the breaker opens.
const FAILURE_THRESHOLD: u32 = 5;

#[derive(Debug)]
struct BreakerState {
    is_open: bool,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Injectable circuit breaker guarding calls to the inference service.
///
/// Constructed once per process and shared by reference; all state transitions go
/// through the internal mutex so the breaker is safe under a multi-threaded runtime.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    /// Create a breaker that stays open for `reset_timeout` after it trips.
    pub fn new(reset_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState {
                is_open: false,
                consecutive_failures: 0,
                last_failure: None,
            }),
            reset_timeout,
        }
    }

    /// Create a breaker using the configured reset timeout.
    pub fn from_config() -> Self {
        Self::new(Duration::from_secs(util::config::circuit_breaker_reset_secs()))
    }

    /// Decide whether a call may proceed.
    ///
    /// While open and within the cooldown this returns [`GraderError::CircuitOpen`]
    /// carrying the remaining seconds. Once the cooldown has elapsed the breaker
    /// closes and the call is allowed through.
    pub fn allow(&self) -> Result<(), GraderError> {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        if state.is_open {
            let elapsed = state
                .last_failure
                .map(|t| t.elapsed())
                .unwrap_or(self.reset_timeout);
            if elapsed < self.reset_timeout {
                let remaining = self.reset_timeout - elapsed;
                return Err(GraderError::CircuitOpen {
                    remaining_secs: remaining.as_secs_f64().round() as u64,
                });
            }
            tracing::info!("Circuit breaker reset - attempting to reconnect to inference service");
            state.is_open = false;
            state.consecutive_failures = 0;
        }
        Ok(())
    }

    /// Record one successful logical call. Clears the failure counter but never
    /// closes an open breaker; only the timeout path in [`Self::allow`] does that.
    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        if state.consecutive_failures > 0 {
            tracing::info!("Inference service connection restored");
            state.consecutive_failures = 0;
        }
    }

    /// Record one failed logical call (after its retries are exhausted, not per
    /// attempt). Opens the breaker at the failure threshold.
    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("breaker lock poisoned");
        state.consecutive_failures += 1;
        state.last_failure = Some(Instant::now());

        if state.consecutive_failures >= FAILURE_THRESHOLD {
            state.is_open = true;
            tracing::warn!(
                "Circuit breaker opened after {} failures. Service will be unavailable for {} seconds.",
                state.consecutive_failures,
                self.reset_timeout.as_secs()
            );
        }
    }

    /// Whether the breaker is currently open.
    pub fn is_open(&self) -> bool {
        self.state.lock().expect("breaker lock poisoned").is_open
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}
