//! Load-aware admission on top of the rate limiter's verdict.

use std::sync::Arc;

use crate::domain::{AdmissionDecision, DecisionReason, SystemLoadSnapshot};
use crate::ports::RandomSource;

/// Sheds a configurable share of traffic while the system is overloaded.
///
/// A request that passed the rate limiter during overload is admitted only
/// when its random draw exceeds `allowance_threshold`, so a threshold of 0.9
/// keeps roughly 10% of traffic flowing.
pub struct AdmissionController {
    allowance_threshold: f64,
    random: Arc<dyn RandomSource>,
}

impl AdmissionController {
    pub fn new(allowance_threshold: f64, random: Arc<dyn RandomSource>) -> Self {
        Self {
            allowance_threshold,
            random,
        }
    }

    pub fn allowance_threshold(&self) -> f64 {
        self.allowance_threshold
    }

    pub fn should_admit(
        &self,
        snapshot: &SystemLoadSnapshot,
        rate_limit_passed: bool,
        request_id: &str,
    ) -> AdmissionDecision {
        if !rate_limit_passed {
            return AdmissionDecision::reject(DecisionReason::RateLimited, request_id);
        }

        if snapshot.is_overloaded {
            let draw = self.random.next_unit();
            if draw <= self.allowance_threshold {
                return AdmissionDecision::reject(DecisionReason::SystemOverload, request_id);
            }
        }

        AdmissionDecision::admit(request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Linear congruential draws; good enough for a shedding-rate check.
    struct Lcg(Mutex<u64>);

    impl RandomSource for Lcg {
        fn next_unit(&self) -> f64 {
            let mut state = self.0.lock().unwrap();
            *state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (*state >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    struct Counting {
        value: f64,
        draws: AtomicUsize,
    }

    impl RandomSource for Counting {
        fn next_unit(&self) -> f64 {
            self.draws.fetch_add(1, Ordering::SeqCst);
            self.value
        }
    }

    fn snapshot(cpu_load: f64) -> SystemLoadSnapshot {
        SystemLoadSnapshot::new(cpu_load, 0, 0.8, Utc::now())
    }

    #[test]
    fn test_rate_limited_wins_without_drawing() {
        let random = Arc::new(Counting {
            value: 0.0,
            draws: AtomicUsize::new(0),
        });
        let controller = AdmissionController::new(0.9, random.clone());

        let decision = controller.should_admit(&snapshot(0.95), false, "r1");

        assert!(!decision.allowed());
        assert_eq!(decision.reason, DecisionReason::RateLimited);
        assert_eq!(random.draws.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_not_overloaded_always_admits() {
        let random = Arc::new(Counting {
            value: 0.99,
            draws: AtomicUsize::new(0),
        });
        let controller = AdmissionController::new(0.9, random.clone());

        let decision = controller.should_admit(&snapshot(0.3), true, "r1");

        assert!(decision.allowed());
        assert_eq!(decision.reason, DecisionReason::Ok);
        assert_eq!(random.draws.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_overload_draw_boundary() {
        let controller = |value: f64| {
            AdmissionController::new(
                0.9,
                Arc::new(Counting {
                    value,
                    draws: AtomicUsize::new(0),
                }),
            )
        };

        let low = controller(0.2).should_admit(&snapshot(0.95), true, "r");
        assert_eq!(low.reason, DecisionReason::SystemOverload);

        let at_threshold = controller(0.9).should_admit(&snapshot(0.95), true, "r");
        assert_eq!(at_threshold.reason, DecisionReason::SystemOverload);

        let above = controller(0.91).should_admit(&snapshot(0.95), true, "r");
        assert!(above.allowed());
        assert_eq!(above.reason, DecisionReason::Ok);
    }

    #[test]
    fn test_overload_shedding_rate_converges() {
        let controller = AdmissionController::new(0.9, Arc::new(Lcg(Mutex::new(42))));
        let overloaded = snapshot(0.95);

        let admitted = (0..10_000)
            .filter(|i| {
                controller
                    .should_admit(&overloaded, true, &format!("r{i}"))
                    .allowed()
            })
            .count();

        assert!(
            (850..=1150).contains(&admitted),
            "admitted {admitted} of 10000"
        );
    }
}
