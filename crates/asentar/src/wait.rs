//! Condition poller: wait for an asynchronous outcome with timeout and
//! polling semantics.
//!
//! Every poll tick settles the action scheduler first (via the caller's
//! settle hook) and only then evaluates the condition, so predicates always
//! observe fully settled state. The first evaluation happens immediately;
//! an already-true condition resolves without sleeping. Between ticks the
//! poller sleeps the configured interval; no busy-spinning.

use crate::result::{AsentarError, AsentarResult};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (1 second)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 1_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// CHECK
// =============================================================================

/// Outcome of one condition evaluation inside a wait loop.
///
/// `NotYet` carries the reason the condition is not satisfied; the last
/// reason observed ends up in the timeout error for diagnosability.
#[derive(Debug, Clone)]
pub enum Check {
    /// Condition is satisfied
    Ready,
    /// Condition is not satisfied yet, with the observed reason
    NotYet(String),
}

impl Check {
    /// Whether the check is satisfied
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// A not-yet check with a reason
    #[must_use]
    pub fn not_yet(reason: impl Into<String>) -> Self {
        Self::NotYet(reason.into())
    }

    /// Convert a fallible assertion into a check: `Ok` is ready, `Err`
    /// carries the failure message as the not-yet reason. This is how the
    /// assertion facade composes with the poller: the assertion closure
    /// re-resolves and re-asserts on every tick.
    #[must_use]
    pub fn from_result<T>(result: AsentarResult<T>) -> Self {
        match result {
            Ok(_) => Self::Ready,
            Err(err) => Self::NotYet(err.to_string()),
        }
    }
}

// =============================================================================
// WAIT RESULT / OUTCOME
// =============================================================================

/// Result of a satisfied wait
#[derive(Debug, Clone, Copy)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of condition evaluations performed
    pub ticks: usize,
}

/// Outcome of a cancellable wait
#[derive(Debug, Clone, Copy)]
pub enum WaitOutcome {
    /// The condition was satisfied
    Satisfied(WaitResult),
    /// The wait was cancelled through its token
    Cancelled {
        /// Time spent waiting before cancellation
        elapsed: Duration,
    },
}

impl WaitOutcome {
    /// Whether the wait was cancelled
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The wait result, if the condition was satisfied
    #[must_use]
    pub const fn result(self) -> Option<WaitResult> {
        match self {
            Self::Satisfied(result) => Some(result),
            Self::Cancelled { .. } => None,
        }
    }
}

// =============================================================================
// WAIT TOKEN
// =============================================================================

/// Cancellation token for a wait.
///
/// Single-threaded by design: the only code that can run while a wait is
/// pumping is the work drained by its own settle hook, so a transition
/// holding a clone of the token is exactly what cancels a wait. Cancelling
/// suppresses the wait's resolution or rejection; it does not unwind any
/// already-applied transitions.
#[derive(Debug, Clone, Default)]
pub struct WaitToken {
    cancelled: Rc<Cell<bool>>,
}

impl WaitToken {
    /// Create a fresh, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the wait holding this token
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Whether the token has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

// =============================================================================
// POLLING CORE
// =============================================================================

fn poll_core<S, C>(
    mut settle: S,
    mut condition: C,
    options: &WaitOptions,
    token: Option<&WaitToken>,
) -> AsentarResult<WaitOutcome>
where
    S: FnMut() -> AsentarResult<()>,
    C: FnMut() -> Check,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let interval = options.poll_interval();
    let mut ticks = 0usize;
    let mut last_failure = String::from("condition was never evaluated");

    loop {
        settle()?;
        if let Some(token) = token {
            if token.is_cancelled() {
                tracing::debug!(ticks, "wait cancelled");
                return Ok(WaitOutcome::Cancelled {
                    elapsed: start.elapsed(),
                });
            }
        }
        ticks += 1;
        match condition() {
            Check::Ready => {
                tracing::trace!(ticks, elapsed_ms = start.elapsed().as_millis() as u64, "wait satisfied");
                return Ok(WaitOutcome::Satisfied(WaitResult {
                    elapsed: start.elapsed(),
                    ticks,
                }));
            }
            Check::NotYet(reason) => {
                tracing::trace!(ticks, reason = %reason, "wait tick");
                last_failure = reason;
            }
        }
        if start.elapsed() >= timeout {
            return Err(AsentarError::Timeout {
                ms: options.timeout_ms,
                last_failure,
            });
        }
        std::thread::sleep(interval);
    }
}

/// Poll until a condition is ready or the timeout elapses.
///
/// `settle` runs at the start of every tick, including the first, so
/// pending transitions are applied before each evaluation. A settle error
/// aborts the wait with that error. The timeout error carries the last
/// `NotYet` reason.
pub fn poll_until<S, C>(settle: S, condition: C, options: &WaitOptions) -> AsentarResult<WaitResult>
where
    S: FnMut() -> AsentarResult<()>,
    C: FnMut() -> Check,
{
    match poll_core(settle, condition, options, None)? {
        WaitOutcome::Satisfied(result) => Ok(result),
        WaitOutcome::Cancelled { elapsed } => Err(AsentarError::invalid_state(format!(
            "wait cancelled after {elapsed:?} with no token attached"
        ))),
    }
}

/// Like [`poll_until`], but cancellable through a [`WaitToken`]. The token
/// is checked at the start of every tick, right after the settle, so a
/// transition drained by the settle can cancel the wait that is pumping it.
pub fn poll_until_cancellable<S, C>(
    settle: S,
    condition: C,
    options: &WaitOptions,
    token: &WaitToken,
) -> AsentarResult<WaitOutcome>
where
    S: FnMut() -> AsentarResult<()>,
    C: FnMut() -> Check,
{
    poll_core(settle, condition, options, Some(token))
}

/// Poll until a currently-present target goes away.
///
/// The presence predicate must return `true` on the first check, which
/// runs *before* any settle: a settle may be exactly what removes the
/// target, so it must be observed in its pre-settlement state. An
/// initially-absent target is a contract violation and fails immediately
/// with an invalid-state error. Every subsequent tick settles first, then
/// re-checks.
pub fn poll_until_removed<S, P>(
    mut settle: S,
    mut present: P,
    options: &WaitOptions,
) -> AsentarResult<WaitResult>
where
    S: FnMut() -> AsentarResult<()>,
    P: FnMut() -> bool,
{
    let start = Instant::now();
    if !present() {
        return Err(AsentarError::invalid_state(
            "wait for removal: target is already absent on the first check; nothing to wait for",
        ));
    }

    let mut ticks = 1usize;
    loop {
        settle()?;
        ticks += 1;
        if !present() {
            tracing::trace!(ticks, "target removed");
            return Ok(WaitResult {
                elapsed: start.elapsed(),
                ticks,
            });
        }
        if start.elapsed() >= options.timeout() {
            return Err(AsentarError::Timeout {
                ms: options.timeout_ms,
                last_failure: "target is still present".into(),
            });
        }
        std::thread::sleep(options.poll_interval());
    }
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Wait for a plain boolean predicate with no scheduler to settle.
pub fn wait_until<F>(mut predicate: F, timeout_ms: u64) -> AsentarResult<()>
where
    F: FnMut() -> bool,
{
    let options = WaitOptions::new().with_timeout(timeout_ms);
    poll_until(
        || Ok(()),
        || {
            if predicate() {
                Check::Ready
            } else {
                Check::not_yet("predicate returned false")
            }
        },
        &options,
    )?;
    Ok(())
}
