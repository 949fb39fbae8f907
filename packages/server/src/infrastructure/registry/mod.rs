//! Peer registry implementations.
//!
//! - `inmemory`: process-local `HashMap` guarded by a reader/writer lock

pub mod inmemory;

pub use inmemory::InMemoryPeerRegistry;
