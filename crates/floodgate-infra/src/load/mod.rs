//! Load estimation and the shared connection/load state it reads.

mod state;
mod synthetic;

pub use state::{ConnectionGuard, MAX_SIMULATED_CONNECTIONS, SharedLoadState};
pub use synthetic::SyntheticLoadEstimator;
