// Uploader module - sends one build artifact to pgyer and reports where to install it

pub mod models;
pub mod pgyer_client;

pub use models::{InstallType, UploadRequest, UploadResponse, UploadResult, UploadSuccess};
pub use pgyer_client::{HttpTimeouts, PgyerClient, UploadPayload};
