// Common constants and shared types used across the forwarder

pub mod constants;
pub mod error;
pub mod types;
