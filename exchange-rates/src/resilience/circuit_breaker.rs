//! Per-dependency circuit breaker.
//!
//! The circuit has three states:
//!
//! - **Closed**: Normal operation, calls are allowed through.
//! - **Open**: The dependency is failing, calls fail fast without touching it.
//! - **HalfOpen**: The cooldown has elapsed and a single trial call is in flight.
//!
//! ```text
//! Closed   → Open:     consecutive failures reach the threshold
//! Open     → HalfOpen: cooldown elapsed, next caller becomes the trial
//! HalfOpen → Closed:   trial succeeds
//! HalfOpen → Open:     trial fails (cooldown restarts)
//! ```
//!
//! State is in-memory, process-wide and shared by every caller of the same
//! dependency name.

use std::fmt;
use std::time::Duration;

use dashmap::DashMap;
use fx_types::RateError;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed operations before the circuit opens.
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a trial call.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
        }
    }
}

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            trial_in_flight: false,
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.trial_in_flight = false;
    }
}

/// Point-in-time view of one circuit, for health reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CircuitStatus {
    pub dependency: String,
    pub state: CircuitState,
    pub failure_count: u32,
}

/// Thread-safe circuit breaker keyed by dependency name.
pub struct CircuitBreaker {
    circuits: DashMap<String, Circuit>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Admits a call to `dependency` or fails fast with [`RateError::CircuitOpen`].
    ///
    /// Once the cooldown has elapsed the first caller is admitted as the
    /// half-open trial; everyone else keeps failing fast until it settles.
    /// The returned permit must be settled with [`CallPermit::succeed`] or
    /// [`CallPermit::fail`]. Dropping it unsettled releases a trial slot
    /// without changing state.
    pub fn try_acquire(&self, dependency: &str) -> Result<CallPermit<'_>, RateError> {
        let now = Instant::now();
        let mut circuit = self
            .circuits
            .entry(dependency.to_string())
            .or_insert_with(Circuit::new);

        let trial = match circuit.state {
            CircuitState::Closed => false,
            CircuitState::Open => {
                let cooled_down = circuit
                    .opened_at
                    .is_none_or(|opened| now.duration_since(opened) >= self.config.cooldown);
                if !cooled_down {
                    debug!(dependency, "Circuit open, failing fast");
                    return Err(circuit_open(dependency));
                }
                info!(dependency, "Circuit breaker half-open, admitting trial call");
                circuit.state = CircuitState::HalfOpen;
                circuit.trial_in_flight = true;
                true
            }
            CircuitState::HalfOpen => {
                if circuit.trial_in_flight {
                    debug!(dependency, "Trial call in flight, failing fast");
                    return Err(circuit_open(dependency));
                }
                circuit.trial_in_flight = true;
                true
            }
        };

        Ok(CallPermit {
            breaker: self,
            dependency: dependency.to_string(),
            trial,
            settled: false,
        })
    }

    fn record_success(&self, dependency: &str, trial: bool) {
        let Some(mut circuit) = self.circuits.get_mut(dependency) else {
            return;
        };

        match circuit.state {
            CircuitState::Closed => circuit.consecutive_failures = 0,
            CircuitState::HalfOpen if trial => {
                info!(dependency, "Circuit breaker closed after successful trial");
                *circuit = Circuit::new();
            }
            _ => debug!(
                dependency,
                state = %circuit.state,
                "Ignoring success from a call admitted before the circuit opened"
            ),
        }
    }

    fn record_failure(&self, dependency: &str, trial: bool) {
        let Some(mut circuit) = self.circuits.get_mut(dependency) else {
            return;
        };
        let now = Instant::now();
        circuit.consecutive_failures = circuit.consecutive_failures.saturating_add(1);

        match circuit.state {
            CircuitState::Closed => {
                if circuit.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        dependency,
                        failures = circuit.consecutive_failures,
                        cooldown_secs = self.config.cooldown.as_secs(),
                        "Circuit breaker opened"
                    );
                    circuit.open(now);
                } else {
                    debug!(
                        dependency,
                        failures = circuit.consecutive_failures,
                        threshold = self.config.failure_threshold,
                        "Recorded failure"
                    );
                }
            }
            CircuitState::HalfOpen if trial => {
                warn!(dependency, "Trial call failed, circuit breaker reopened");
                circuit.open(now);
            }
            _ => debug!(dependency, state = %circuit.state, "Recorded failure"),
        }
    }

    fn release_trial(&self, dependency: &str) {
        if let Some(mut circuit) = self.circuits.get_mut(dependency) {
            if circuit.state == CircuitState::HalfOpen {
                debug!(dependency, "Trial call abandoned, releasing slot");
                circuit.trial_in_flight = false;
            }
        }
    }

    /// Current state for `dependency` (Closed if it was never called).
    pub fn state(&self, dependency: &str) -> CircuitState {
        self.circuits
            .get(dependency)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Consecutive failures recorded for `dependency`.
    pub fn failure_count(&self, dependency: &str) -> u32 {
        self.circuits
            .get(dependency)
            .map(|c| c.consecutive_failures)
            .unwrap_or(0)
    }

    /// Forces the circuit for `dependency` back to Closed.
    pub fn reset(&self, dependency: &str) {
        if let Some(mut circuit) = self.circuits.get_mut(dependency) {
            info!(dependency, "Circuit breaker manually reset");
            *circuit = Circuit::new();
        }
    }

    /// Status of every tracked dependency, sorted by name.
    pub fn snapshot(&self) -> Vec<CircuitStatus> {
        let mut statuses: Vec<_> = self
            .circuits
            .iter()
            .map(|entry| CircuitStatus {
                dependency: entry.key().clone(),
                state: entry.state,
                failure_count: entry.consecutive_failures,
            })
            .collect();
        statuses.sort_by(|a, b| a.dependency.cmp(&b.dependency));
        statuses
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

fn circuit_open(dependency: &str) -> RateError {
    RateError::CircuitOpen {
        dependency: dependency.to_string(),
    }
}

/// Admission ticket for one call through the breaker.
#[must_use = "a permit must be settled with succeed() or fail()"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    dependency: String,
    trial: bool,
    settled: bool,
}

impl CallPermit<'_> {
    /// Whether this call is the half-open trial.
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    pub fn succeed(mut self) {
        self.settled = true;
        self.breaker.record_success(&self.dependency, self.trial);
    }

    pub fn fail(mut self) {
        self.settled = true;
        self.breaker.record_failure(&self.dependency, self.trial);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.trial {
            self.breaker.release_trial(&self.dependency);
        }
    }
}
