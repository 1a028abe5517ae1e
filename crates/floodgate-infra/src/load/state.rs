//! Process-wide counters read by the load estimator.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use floodgate_shared::dto::MAX_SIMULATED_CONNECTIONS;

/// Shared, lock-free state: in-flight requests, the simulation offsets and
/// the smoothed load value. One instance per process, passed by handle.
pub struct SharedLoadState {
    in_flight: AtomicU64,
    simulated_connections: AtomicU64,
    simulated_load: AtomicU64,
    smoothed_load: AtomicU64,
}

impl SharedLoadState {
    pub fn new() -> Self {
        Self {
            in_flight: AtomicU64::new(0),
            simulated_connections: AtomicU64::new(0),
            simulated_load: AtomicU64::new(0f64.to_bits()),
            smoothed_load: AtomicU64::new(f64::NAN.to_bits()),
        }
    }

    /// Count one in-flight request until the returned guard drops.
    pub fn open_connection(self: &Arc<Self>) -> ConnectionGuard {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        ConnectionGuard {
            state: Arc::clone(self),
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }

    /// In-flight requests plus the simulated offset.
    pub fn active_connections(&self) -> u64 {
        self.in_flight()
            .saturating_add(self.simulated_connections.load(Ordering::Acquire))
    }

    pub fn simulated_connections(&self) -> u64 {
        self.simulated_connections.load(Ordering::Acquire)
    }

    pub fn simulated_load(&self) -> f64 {
        f64::from_bits(self.simulated_load.load(Ordering::Acquire))
    }

    /// Add to the simulation offsets, keeping both within their bounds.
    /// Returns the new `(connections, load)` offsets.
    pub fn simulate(&self, connections: u64, load: f64) -> (u64, f64) {
        let connections = update_u64(&self.simulated_connections, |current| {
            current
                .saturating_add(connections)
                .min(MAX_SIMULATED_CONNECTIONS)
        });
        let load = update_f64(&self.simulated_load, |current| {
            let next = current + load;
            if next.is_finite() { next.clamp(0.0, 1.0) } else { current }
        });
        (connections, load)
    }

    pub fn reset_simulation(&self) {
        self.simulated_connections.store(0, Ordering::Release);
        self.simulated_load.store(0f64.to_bits(), Ordering::Release);
    }

    /// Fold `raw` into the exponential moving average and return the result.
    /// The first reading seeds the average.
    pub fn smooth(&self, raw: f64, alpha: f64) -> f64 {
        update_f64(&self.smoothed_load, |previous| {
            if previous.is_nan() {
                raw
            } else {
                alpha * raw + (1.0 - alpha) * previous
            }
        })
    }

    fn release(&self) {
        // Saturating: a stray double release must not wrap the counter.
        let _ = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            });
    }
}

impl Default for SharedLoadState {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped in-flight slot. Dropping it, on any path, releases the slot once.
pub struct ConnectionGuard {
    state: Arc<SharedLoadState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.state.release();
    }
}

fn update_u64(cell: &AtomicU64, f: impl Fn(u64) -> u64) -> u64 {
    let mut current = cell.load(Ordering::Acquire);
    loop {
        let next = f(current);
        match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

fn update_f64(cell: &AtomicU64, f: impl Fn(f64) -> f64) -> f64 {
    let next = update_u64(cell, |bits| f(f64::from_bits(bits)).to_bits());
    f64::from_bits(next)
}
