//! Scoped adjustment of the host's execution-time ceiling.
//!
//! A long pass first asks for no ceiling at all, then for a bounded one, and
//! runs regardless of the answer. The previous ceiling is put back when the
//! guard goes away; a failed restore is logged and otherwise ignored.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionLimit {
    Unlimited,
    Bounded(Duration),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("execution limit is not changeable on this host")]
    NotChangeable,

    #[error("{0}")]
    Failed(String),
}

/// The execution environment the ceiling belongs to.
pub trait ExecutionHost: Send + Sync {
    fn execution_limit(&self) -> ExecutionLimit;

    /// `Ok(false)` means the host refused the value without raising.
    fn set_execution_limit(&self, limit: ExecutionLimit) -> Result<bool, HostError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Requesting,
    GrantedUnlimited,
    GrantedBounded,
    Denied,
    Released,
}

pub struct ExecutionGuard<'h, H: ExecutionHost + ?Sized> {
    host: &'h H,
    previous: ExecutionLimit,
    state: GuardState,
}

impl<'h, H: ExecutionHost + ?Sized> ExecutionGuard<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self {
            previous: host.execution_limit(),
            host,
            state: GuardState::Idle,
        }
    }

    /// Create a guard and immediately request the ceiling.
    pub fn acquire(host: &'h H, fallback: Duration) -> Self {
        let mut guard = Self::new(host);
        guard.request(fallback);
        guard
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Only valid from `Idle`; any later call is a no-op.
    pub fn request(&mut self, fallback: Duration) -> GuardState {
        if self.state != GuardState::Idle {
            return self.state;
        }
        self.state = GuardState::Requesting;

        if self.try_set(ExecutionLimit::Unlimited) {
            debug!("Execution time limit lifted");
            self.state = GuardState::GrantedUnlimited;
            return self.state;
        }

        if self.try_set(ExecutionLimit::Bounded(fallback)) {
            info!(
                "Unlimited execution time refused, running with a {}s ceiling",
                fallback.as_secs()
            );
            self.state = GuardState::GrantedBounded;
            return self.state;
        }

        warn!(
            previous = ?self.previous,
            "Could not extend the execution time limit, continuing without a guarantee"
        );
        self.state = GuardState::Denied;
        self.state
    }

    fn try_set(&self, limit: ExecutionLimit) -> bool {
        match self.host.set_execution_limit(limit) {
            Ok(applied) => applied,
            Err(err) => {
                debug!(?limit, error = %err, "Setting execution time limit failed");
                false
            }
        }
    }

    /// Restore the previous ceiling if this guard changed it.
    pub fn release(&mut self) {
        let changed = matches!(
            self.state,
            GuardState::GrantedUnlimited | GuardState::GrantedBounded
        );
        if self.state == GuardState::Released {
            return;
        }
        self.state = GuardState::Released;
        if !changed {
            return;
        }
        match self.host.set_execution_limit(self.previous) {
            Ok(true) => debug!(previous = ?self.previous, "Execution time limit restored"),
            Ok(false) => warn!(previous = ?self.previous, "Host refused to restore execution time limit"),
            Err(err) => warn!(previous = ?self.previous, error = %err, "Failed to restore execution time limit"),
        }
    }
}

impl<H: ExecutionHost + ?Sized> Drop for ExecutionGuard<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Run `f` under an execution guard. Release is attempted on every exit path,
/// unwinding included.
pub fn with_execution_guard<H, T, F>(host: &H, fallback: Duration, f: F) -> T
where
    H: ExecutionHost + ?Sized,
    F: FnOnce(GuardState) -> T,
{
    let guard = ExecutionGuard::acquire(host, fallback);
    f(guard.state())
}

/// Acceptance policy of the in-process host.
#[derive(Debug, Clone, Copy)]
pub struct HostPolicy {
    pub allow_unlimited: bool,
    pub max_limit: Option<Duration>,
}

/// In-process execution host: tracks the granted ceiling for this process
/// and how much of it is left.
pub struct ProcessHost {
    policy: HostPolicy,
    limit: Mutex<ExecutionLimit>,
    started: Instant,
}

impl ProcessHost {
    pub fn new(initial: ExecutionLimit, policy: HostPolicy) -> Self {
        Self {
            policy,
            limit: Mutex::new(initial),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `None` when no ceiling applies.
    pub fn remaining(&self) -> Option<Duration> {
        match self.execution_limit() {
            ExecutionLimit::Unlimited => None,
            ExecutionLimit::Bounded(limit) => Some(limit.saturating_sub(self.elapsed())),
        }
    }
}

impl ExecutionHost for ProcessHost {
    fn execution_limit(&self) -> ExecutionLimit {
        match self.limit.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_execution_limit(&self, limit: ExecutionLimit) -> Result<bool, HostError> {
        let allowed = match limit {
            ExecutionLimit::Unlimited => self.policy.allow_unlimited,
            ExecutionLimit::Bounded(value) => self.policy.max_limit.map_or(true, |max| value <= max),
        };
        if !allowed {
            return Ok(false);
        }
        let mut current = self
            .limit
            .lock()
            .map_err(|e| HostError::Failed(format!("execution limit lock poisoned: {}", e)))?;
        *current = limit;
        Ok(true)
    }
}
