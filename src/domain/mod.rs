//! Domain layer - Pure business logic.

pub mod errors;
pub mod media;
pub mod progress;
pub mod size;
pub mod transcode;
pub mod upload;
