//! Ports - Traits the application layer is written against.

pub mod engine;
pub mod probe;
pub mod upload;
