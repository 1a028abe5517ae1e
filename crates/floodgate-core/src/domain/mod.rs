//! Domain entities - the values that flow through one admission.

mod client;
mod decision;
mod load;
mod record;
mod session;

pub use client::{ClientId, MAX_CLIENT_ID_LEN, USER_AGENT_PREFIX_LEN};
pub use decision::{AdmissionDecision, DecisionReason};
pub use load::{MEMORY_LOAD_FACTOR, SystemLoadSnapshot};
pub use record::DecisionRecord;
pub use session::Session;
