//! Application layer - Generic services that use ports.

pub mod engine;
pub mod preprocessor;
pub mod video_upload;
