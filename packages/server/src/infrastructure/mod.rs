//! Infrastructure layer: concrete implementations of the domain traits and wire DTOs.

pub mod dto;
pub mod rate_limiter;
pub mod registry;
