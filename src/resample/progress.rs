//! Progress accounting for a running resample.
//!
//! Workers bump a shared counter as rows and columns complete; a sampler
//! thread polls the counter and notifies registered listeners. Fractions are
//! monotone nondecreasing within one resample and never exceed 1.0.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tracing::warn;

/// How often the sampler thread re-reads the counter.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Observer of a running resample. Notified with a fraction in `[0, 1]`.
///
/// Listeners are called from the sampler thread and from the driver thread,
/// so they must be thread-safe. A panicking listener is logged and ignored;
/// it never fails the resample.
pub trait ProgressListener: Send + Sync {
    fn notify_progress(&self, fraction: f32);
}

impl<F> ProgressListener for F
where
    F: Fn(f32) + Send + Sync,
{
    fn notify_progress(&self, fraction: f32) {
        self(fraction);
    }
}

/// Shared work counter plus the monotone emission state.
pub(crate) struct ProgressTracker {
    counter: AtomicUsize,
    total: usize,
    emitted: Mutex<f32>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            counter: AtomicUsize::new(0),
            total,
            emitted: Mutex::new(-1.0),
        }
    }

    /// One row or column finished. Relaxed ordering suffices: only the
    /// monotone magnitude of the counter matters.
    #[inline]
    pub fn tick(&self) {
        self.counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fraction(&self) -> f32 {
        (self.counter.load(Ordering::Relaxed) as f32 / self.total as f32).min(1.0)
    }

    pub fn complete(&self) -> bool {
        self.counter.load(Ordering::Relaxed) >= self.total
    }

    /// Notify listeners of the current counter value.
    pub fn publish(&self, listeners: &[Arc<dyn ProgressListener>]) {
        self.publish_fraction(listeners, self.fraction());
    }

    /// Notify listeners, skipping anything that would repeat or regress an
    /// already-emitted fraction.
    pub fn publish_fraction(&self, listeners: &[Arc<dyn ProgressListener>], fraction: f32) {
        let mut emitted = self.emitted.lock().unwrap();
        if fraction <= *emitted {
            return;
        }
        *emitted = fraction;
        for listener in listeners {
            let notify = AssertUnwindSafe(|| listener.notify_progress(fraction));
            if catch_unwind(notify).is_err() {
                warn!("progress listener panicked, notification dropped");
            }
        }
    }
}

/// Stop signal for the sampler thread. `stop` wakes the sampler immediately
/// instead of letting it sleep out the poll interval.
pub(crate) struct SamplerGate {
    stopped: Mutex<bool>,
    signal: Condvar,
}

impl SamplerGate {
    pub fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    pub fn stop(&self) {
        *self.stopped.lock().unwrap() = true;
        self.signal.notify_all();
    }
}

/// Body of the sampler thread: poll the counter every [`POLL_INTERVAL`] and
/// notify on change, until the work is done or the gate closes.
pub(crate) fn sample_loop(
    tracker: &ProgressTracker,
    gate: &SamplerGate,
    listeners: &[Arc<dyn ProgressListener>],
) {
    let mut stopped = gate.stopped.lock().unwrap();
    while !*stopped {
        let (guard, _) = gate
            .signal
            .wait_timeout(stopped, POLL_INTERVAL)
            .unwrap();
        stopped = guard;
        tracker.publish(listeners);
        if tracker.complete() {
            break;
        }
    }
}
