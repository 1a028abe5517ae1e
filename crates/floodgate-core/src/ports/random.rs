/// Source of uniform draws in `[0, 1)`.
///
/// Injected so admission can be replayed deterministically in tests.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}
