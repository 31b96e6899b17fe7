//! Upstream proxy pool with empirical success-rate selection and
//! failure cooling.
//!
//! All operations go through a single mutex. A proxy that accumulates
//! `max_failures` failures enters a cooling state for `cooling_window`,
//! after which its failure counter resets and it becomes selectable
//! again.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use aisle_core::ProxyCredentials;

const DEFAULT_MAX_FAILURES: u32 = 5;
const DEFAULT_COOLING_WINDOW: Duration = Duration::from_secs(600);

#[derive(Debug)]
struct ProxyState {
    endpoint: ProxyCredentials,
    successes: u64,
    failures: u32,
    last_failure_at: Option<Instant>,
}

impl ProxyState {
    fn success_rate(&self) -> f64 {
        let total = self.successes + u64::from(self.failures);
        if total == 0 {
            // Untried proxies rank above everything that has failed.
            1.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.successes as f64 / total as f64
            }
        }
    }
}

/// Handle returned by [`ProxyPool::acquire`]; report the outcome back
/// with [`ProxyPool::report_success`] / [`ProxyPool::report_failure`].
#[derive(Debug, Clone)]
pub struct ProxyLease {
    index: usize,
    pub endpoint: ProxyCredentials,
}

/// Diagnostic snapshot of one proxy's counters.
#[derive(Debug, Clone)]
pub struct ProxyStats {
    pub server: String,
    pub successes: u64,
    pub failures: u32,
    pub cooling: bool,
}

#[derive(Debug)]
pub struct ProxyPool {
    inner: Mutex<Vec<ProxyState>>,
    max_failures: u32,
    cooling_window: Duration,
}

impl ProxyPool {
    #[must_use]
    pub fn new(endpoints: Vec<ProxyCredentials>) -> Self {
        Self::with_cooling(endpoints, DEFAULT_MAX_FAILURES, DEFAULT_COOLING_WINDOW)
    }

    #[must_use]
    pub fn with_cooling(
        endpoints: Vec<ProxyCredentials>,
        max_failures: u32,
        cooling_window: Duration,
    ) -> Self {
        let states = endpoints
            .into_iter()
            .map(|endpoint| ProxyState {
                endpoint,
                successes: 0,
                failures: 0,
                last_failure_at: None,
            })
            .collect();
        ProxyPool {
            inner: Mutex::new(states),
            max_failures,
            cooling_window,
        }
    }

    /// Pick the proxy with the highest empirical success rate that is not
    /// cooling; ties break on fewest failures. `None` when the pool is
    /// empty or everything is cooling — callers fall back to a direct
    /// connection.
    #[must_use]
    pub fn acquire(&self) -> Option<ProxyLease> {
        let mut states = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();

        // Expire cooling windows before selection.
        for state in states.iter_mut() {
            if state.failures >= self.max_failures {
                if let Some(at) = state.last_failure_at {
                    if now.duration_since(at) >= self.cooling_window {
                        state.failures = 0;
                        state.last_failure_at = None;
                    }
                }
            }
        }

        let best = states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.failures < self.max_failures)
            .max_by(|(_, a), (_, b)| {
                a.success_rate()
                    .partial_cmp(&b.success_rate())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.failures.cmp(&a.failures))
            })?;

        Some(ProxyLease {
            index: best.0,
            endpoint: best.1.endpoint.clone(),
        })
    }

    pub fn report_success(&self, lease: &ProxyLease) {
        let mut states = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(state) = states.get_mut(lease.index) {
            state.successes += 1;
        }
    }

    pub fn report_failure(&self, lease: &ProxyLease, reason: &str) {
        let mut states = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(state) = states.get_mut(lease.index) {
            state.failures += 1;
            state.last_failure_at = Some(Instant::now());
            if state.failures >= self.max_failures {
                tracing::warn!(
                    server = %state.endpoint.server_url(),
                    failures = state.failures,
                    reason,
                    "proxy entered cooling"
                );
            }
        }
    }

    /// Snapshot of all proxies for diagnostics.
    #[must_use]
    pub fn stats(&self) -> Vec<ProxyStats> {
        let states = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();
        states
            .iter()
            .map(|s| ProxyStats {
                server: s.endpoint.server_url(),
                successes: s.successes,
                failures: s.failures,
                cooling: s.failures >= self.max_failures
                    && s.last_failure_at
                        .is_some_and(|at| now.duration_since(at) < self.cooling_window),
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_empty()
    }
}
