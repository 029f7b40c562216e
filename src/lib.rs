//! Upload Android and iOS builds to the pgyer beta distribution service.
//!
//! Options are resolved into a validated [`uploader::UploadRequest`] by
//! [`config::resolve_upload_request`], then sent with [`uploader::PgyerClient::upload`].

pub mod config;
pub mod errors;
pub mod security;
pub mod uploader;
