//! Periodic tick scheduling.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why a tick did no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The engine has been disposed
    Disposed,
    /// Learning is turned off
    LearningDisabled,
    /// A previous run of the same tick is still in flight
    AlreadyRunning,
    /// Not enough metric history has accumulated
    InsufficientHistory,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Disposed => write!(f, "disposed"),
            SkipReason::LearningDisabled => write!(f, "learning disabled"),
            SkipReason::AlreadyRunning => write!(f, "already running"),
            SkipReason::InsufficientHistory => write!(f, "insufficient history"),
        }
    }
}

/// Result of one scheduled tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The tick did its work
    Completed,
    /// The tick returned early
    Skipped(SkipReason),
    /// The tick failed; the error was logged and swallowed
    Failed(String),
}

impl TickOutcome {
    /// Whether the tick did its work.
    pub fn is_completed(&self) -> bool {
        matches!(self, TickOutcome::Completed)
    }
}

/// Non-blocking re-entrancy guard for a tick.
#[derive(Debug, Default)]
pub struct TickGuard {
    running: AtomicBool,
}

/// Releases the owning [`TickGuard`] on drop.
#[derive(Debug)]
pub struct TickToken<'a> {
    guard: &'a TickGuard,
}

impl TickGuard {
    /// Create an idle guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` when a run is already in flight.
    pub fn try_enter(&self) -> Option<TickToken<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickToken { guard: self })
    }

    /// Whether a run is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for TickToken<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

/// Spawn a loop calling `tick` every `period` until `cancel` fires.
///
/// The first tick fires after one full period. Ticks missed while a run was
/// slow are skipped rather than replayed.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if !tick().await {
                        break;
                    }
                }
            }
        }
        debug!("Periodic task {} stopped", name);
    })
}
