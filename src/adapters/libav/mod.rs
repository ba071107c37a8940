//! Metadata reads through the libav bindings.

pub mod probe;

pub use probe::LibavProbe;
