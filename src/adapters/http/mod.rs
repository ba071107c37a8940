//! Upload adapter for the admin backend's REST API.

pub mod uploader;

pub use uploader::HttpUploader;
