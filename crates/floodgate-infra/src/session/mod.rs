//! Session stores - in-memory and a primary/secondary fallback chain.

mod fallback;
mod memory;

pub use fallback::FallbackSessionStore;
pub use memory::InMemorySessionStore;
