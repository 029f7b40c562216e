use crate::errors::{AppError, AppResult};
use crate::security::InputValidator;
use reqwest::{multipart, Body, Client};
use std::path::Path;
use tokio::time::Duration;
use tokio_util::io::ReaderStream;

use super::models::{UploadRequest, UploadResponse, UploadResult, UploadSuccess};

pub const PGYER_UPLOAD_URL: &str = "https://www.pgyer.com/apiv2/app/upload";
pub const PGYER_WEB_BASE: &str = "https://www.pgyer.com/";

/// Longest response excerpt quoted in protocol errors
const BODY_EXCERPT_LEN: usize = 300;

#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(300),
            request: Duration::from_secs(1000),
        }
    }
}

/// Client for the pgyer app upload API
pub struct PgyerClient {
    client: Client,
    upload_url: String,
    web_base: String,
}

impl PgyerClient {
    pub fn new() -> AppResult<Self> {
        Self::with_endpoints(PGYER_UPLOAD_URL, PGYER_WEB_BASE, HttpTimeouts::default())
    }

    /// Point the client somewhere other than pgyer.com, e.g. a local mock server.
    pub fn with_endpoints(
        upload_url: &str,
        web_base: &str,
        timeouts: HttpTimeouts,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()?;

        Ok(Self {
            client,
            upload_url: upload_url.to_string(),
            web_base: web_base.to_string(),
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    pub async fn upload(&self, request: &UploadRequest) -> UploadResult {
        // The file may have disappeared since the request was validated.
        let build_file = request.build_file().to_string_lossy().to_string();
        InputValidator::validate_build_file(&build_file)?;

        log::info!("build_file: {}", build_file);
        log::debug!(
            "api_key: {}, channel: {:?}, install_type: {}",
            InputValidator::mask_secret(request.api_key()),
            request.channel_shortcut(),
            request.install_type()
        );

        let payload = UploadPayload::from_request(request);
        let form = payload.build_form().await?;

        log::info!("Start upload {} to pgyer...", build_file);

        let response = self.client.post(&self.upload_url).multipart(form).send().await?;

        let status = response.status();
        let body = response.bytes().await?;

        log::debug!(
            "pgyer response {} (first {} bytes): {}",
            status,
            BODY_EXCERPT_LEN,
            excerpt(&body)
        );

        let info: UploadResponse = serde_json::from_slice(&body).map_err(|e| {
            AppError::protocol(
                status.as_u16(),
                format!("{} (body: {})", e, excerpt(&body)),
            )
        })?;

        self.interpret_response(status.as_u16(), info)
    }

    fn interpret_response(&self, status: u16, info: UploadResponse) -> UploadResult {
        if info.code != 0 {
            let message = info
                .message
                .unwrap_or_else(|| format!("upload rejected with code {}", info.code));
            log::error!("pgyer rejected upload: code {}, {}", info.code, message);
            return Err(AppError::service(info.code, &message));
        }

        let shortcut = info
            .build_shortcut_url()
            .ok_or_else(|| AppError::protocol(status, "response is missing data.buildShortcutUrl"))?;

        let success = UploadSuccess {
            url: format!("{}{}", self.web_base, shortcut),
            build_shortcut_url: shortcut.to_string(),
        };

        log::info!("Upload success. Visit this URL to see: {}", success.url);
        Ok(success)
    }
}

/// Form fields for a single upload, in the order they are sent
#[derive(Debug, Clone)]
pub struct UploadPayload<'a> {
    text_fields: Vec<(&'static str, String)>,
    file_path: &'a Path,
}

impl<'a> UploadPayload<'a> {
    pub fn from_request(request: &'a UploadRequest) -> Self {
        let mut text_fields = vec![("_api_key", request.api_key().to_string())];

        if let Some(shortcut) = request.channel_shortcut() {
            text_fields.push(("buildChannelShortcut", shortcut.to_string()));
        }

        text_fields.push(("buildPassword", request.password().to_string()));
        text_fields.push((
            "buildUpdateDescription",
            request.update_description().to_string(),
        ));
        text_fields.push(("buildInstallType", request.install_type().to_string()));

        Self {
            text_fields,
            file_path: request.build_file(),
        }
    }

    pub fn text_fields(&self) -> &[(&'static str, String)] {
        &self.text_fields
    }

    /// Builds the multipart form, streaming the build file rather than buffering it.
    pub async fn build_form(&self) -> AppResult<multipart::Form> {
        let mut form = multipart::Form::new();

        for (key, value) in &self.text_fields {
            form = form.text(*key, value.clone());
        }

        let file = tokio::fs::File::open(self.file_path).await?;
        let length = file.metadata().await?.len();
        let filename = self
            .file_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = multipart::Part::stream_with_length(body, length)
            .file_name(filename)
            .mime_str("application/octet-stream")?;

        Ok(form.part("file", part))
    }
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    text.chars().take(BODY_EXCERPT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::uploader::models::InstallType;
    use std::io::Write;

    fn artifact() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".ipa").tempfile().unwrap();
        file.write_all(b"fake ipa contents").unwrap();
        file
    }

    fn client() -> PgyerClient {
        PgyerClient::new().unwrap()
    }

    fn field_names(payload: &UploadPayload) -> Vec<&'static str> {
        payload.text_fields().iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_default_timeouts_keep_ratio() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect, Duration::from_secs(300));
        assert_eq!(timeouts.request, Duration::from_secs(1000));
    }

    #[test]
    fn test_default_endpoint() {
        assert_eq!(client().upload_url(), "https://www.pgyer.com/apiv2/app/upload");
    }

    #[test]
    fn test_payload_without_channel() {
        let file = artifact();
        let request =
            UploadRequest::new("key", &file.path().to_string_lossy(), "pass").unwrap();
        let payload = UploadPayload::from_request(&request);

        assert_eq!(
            field_names(&payload),
            vec![
                "_api_key",
                "buildPassword",
                "buildUpdateDescription",
                "buildInstallType"
            ]
        );
        assert_eq!(payload.text_fields()[3].1, "2");
        assert_eq!(payload.text_fields()[2].1, "");
    }

    #[test]
    fn test_payload_with_channel() {
        let file = artifact();
        let request = UploadRequest::new("key", &file.path().to_string_lossy(), "pass")
            .unwrap()
            .with_channel_shortcut(Some("abcd".to_string()))
            .with_install_type(InstallType::Invite)
            .with_update_description(Some("fixes".to_string()));
        let payload = UploadPayload::from_request(&request);

        assert_eq!(
            field_names(&payload),
            vec![
                "_api_key",
                "buildChannelShortcut",
                "buildPassword",
                "buildUpdateDescription",
                "buildInstallType"
            ]
        );
        assert_eq!(payload.text_fields()[1].1, "abcd");
        assert_eq!(payload.text_fields()[3].1, "fixes");
        assert_eq!(payload.text_fields()[4].1, "3");
    }

    #[tokio::test]
    async fn test_build_form_missing_file_is_io_error() {
        let file = artifact();
        let request =
            UploadRequest::new("key", &file.path().to_string_lossy(), "pass").unwrap();
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());

        let err = UploadPayload::from_request(&request)
            .build_form()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_interpret_success() {
        let info: UploadResponse =
            serde_json::from_str(r#"{"code":0,"data":{"buildShortcutUrl":"abcd"}}"#).unwrap();
        let success = client().interpret_response(200, info).unwrap();
        assert_eq!(success.url, "https://www.pgyer.com/abcd");
        assert_eq!(success.build_shortcut_url, "abcd");
    }

    #[test]
    fn test_interpret_service_error() {
        let info: UploadResponse =
            serde_json::from_str(r#"{"code":1,"message":"bad key"}"#).unwrap();
        let err = client().interpret_response(200, info).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.service_message(), Some("bad key"));
    }

    #[test]
    fn test_interpret_service_error_without_message() {
        let info: UploadResponse = serde_json::from_str(r#"{"code":1021}"#).unwrap();
        let err = client().interpret_response(200, info).unwrap_err();
        assert!(err.to_string().contains("1021"));
    }

    #[test]
    fn test_interpret_success_without_shortcut() {
        let info: UploadResponse = serde_json::from_str(r#"{"code":0,"data":{}}"#).unwrap();
        let err = client().interpret_response(200, info).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_excerpt_truncates() {
        let body = "x".repeat(1000);
        assert_eq!(excerpt(body.as_bytes()).len(), BODY_EXCERPT_LEN);
    }
}
