//! Utilities shared between SignalHub packages.

pub mod logger;
pub mod time;
