//! Adapters - Concrete implementations of ports.

pub mod ffmpeg;
pub mod http;
pub mod libav;

#[cfg(test)]
mod functional_tests;
