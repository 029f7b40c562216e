use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{AppError, AppResult};
use crate::security::InputValidator;

/// How testers are allowed to install the uploaded build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallType {
    /// Install after entering the build password
    #[default]
    Password,
    /// Install by invitation only
    Invite,
}

impl InstallType {
    pub fn code(self) -> u8 {
        match self {
            InstallType::Password => 2,
            InstallType::Invite => 3,
        }
    }

    pub fn from_code(code: i64) -> AppResult<Self> {
        match code {
            2 => Ok(InstallType::Password),
            3 => Ok(InstallType::Invite),
            other => Err(AppError::validation(
                "install_type",
                &format!("Must be 2 or 3, got {}", other),
            )),
        }
    }
}

impl FromStr for InstallType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().parse::<i64>().map_err(|_| {
            AppError::validation("install_type", &format!("Must be 2 or 3, got '{}'", s))
        })?;
        Self::from_code(code)
    }
}

impl fmt::Display for InstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validated upload. Only constructible through [`UploadRequest::new`],
/// which checks the build file and credentials.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    api_key: String,
    channel_shortcut: Option<String>,
    build_file: PathBuf,
    password: String,
    update_description: String,
    install_type: InstallType,
}

impl UploadRequest {
    pub fn new(api_key: &str, build_file: &str, password: &str) -> AppResult<Self> {
        let api_key = InputValidator::validate_api_key(Some(api_key))?;
        let build_file = InputValidator::validate_build_file(build_file)?;
        let password = InputValidator::validate_password(Some(password))?;

        Ok(Self {
            api_key,
            channel_shortcut: None,
            build_file,
            password,
            update_description: String::new(),
            install_type: InstallType::default(),
        })
    }

    /// Blank shortcuts are treated as absent
    pub fn with_channel_shortcut(mut self, shortcut: Option<String>) -> Self {
        self.channel_shortcut = shortcut.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_update_description(mut self, description: Option<String>) -> Self {
        self.update_description = description.unwrap_or_default();
        self
    }

    pub fn with_install_type(mut self, install_type: InstallType) -> Self {
        self.install_type = install_type;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn channel_shortcut(&self) -> Option<&str> {
        self.channel_shortcut.as_deref()
    }

    pub fn build_file(&self) -> &Path {
        &self.build_file
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn update_description(&self) -> &str {
        &self.update_description
    }

    pub fn install_type(&self) -> InstallType {
        self.install_type
    }
}

/// Body returned by the upload endpoint
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    // Error responses sometimes carry an empty array here.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl UploadResponse {
    pub fn build_shortcut_url(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("buildShortcutUrl"))
            .and_then(|url| url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// Where the uploaded build can be installed from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSuccess {
    pub url: String,
    pub build_shortcut_url: String,
}

pub type UploadResult = AppResult<UploadSuccess>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn artifact() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".apk").tempfile().unwrap();
        file.write_all(b"PK\x03\x04 fake apk").unwrap();
        file
    }

    #[test]
    fn test_install_type_parsing() {
        assert_eq!("2".parse::<InstallType>().unwrap(), InstallType::Password);
        assert_eq!(" 3 ".parse::<InstallType>().unwrap(), InstallType::Invite);
        assert!("1".parse::<InstallType>().is_err());
        assert!("invite".parse::<InstallType>().is_err());
        assert!(InstallType::from_code(4).is_err());
        assert_eq!(InstallType::Invite.to_string(), "3");
    }

    #[test]
    fn test_install_type_defaults_to_password() {
        assert_eq!(InstallType::default().to_string(), "2");
    }

    #[test]
    fn test_request_defaults() {
        let file = artifact();
        let request =
            UploadRequest::new("key", &file.path().to_string_lossy(), "pass").unwrap();

        assert_eq!(request.install_type(), InstallType::Password);
        assert_eq!(request.update_description(), "");
        assert_eq!(request.channel_shortcut(), None);
        assert_eq!(request.build_file(), file.path());
    }

    #[test]
    fn test_request_blank_channel_is_absent() {
        let file = artifact();
        let request = UploadRequest::new("key", &file.path().to_string_lossy(), "pass")
            .unwrap()
            .with_channel_shortcut(Some("  ".to_string()));
        assert_eq!(request.channel_shortcut(), None);
    }

    #[test]
    fn test_request_rejects_empty_password() {
        let file = artifact();
        let result = UploadRequest::new("key", &file.path().to_string_lossy(), "");
        assert!(matches!(result, Err(AppError::Validation { ref field, .. }) if field == "password"));
    }

    #[test]
    fn test_request_rejects_missing_file() {
        let result = UploadRequest::new("key", "/nonexistent/app.ipa", "pass");
        assert!(matches!(result, Err(AppError::FileNotFound { ref path }) if path == "/nonexistent/app.ipa"));
    }

    #[test]
    fn test_response_parsing() {
        let ok: UploadResponse =
            serde_json::from_str(r#"{"code":0,"data":{"buildShortcutUrl":"abcd","buildKey":"x"}}"#)
                .unwrap();
        assert_eq!(ok.code, 0);
        assert_eq!(ok.build_shortcut_url(), Some("abcd"));

        let failed: UploadResponse =
            serde_json::from_str(r#"{"code":1,"message":"bad key"}"#).unwrap();
        assert_eq!(failed.code, 1);
        assert_eq!(failed.message.as_deref(), Some("bad key"));
        assert_eq!(failed.build_shortcut_url(), None);

        let empty_data: UploadResponse =
            serde_json::from_str(r#"{"code":1216,"message":"expired","data":[]}"#).unwrap();
        assert_eq!(empty_data.build_shortcut_url(), None);
    }
}
