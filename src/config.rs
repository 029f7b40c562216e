use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::errors::{AppError, AppResult};
use crate::security::InputValidator;
use crate::uploader::{InstallType, UploadRequest};

/// Install type as written by the caller: a number or a numeric string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawInstallType {
    Code(i64),
    Text(String),
}

impl RawInstallType {
    pub fn resolve(&self) -> AppResult<InstallType> {
        match self {
            RawInstallType::Code(code) => InstallType::from_code(*code),
            RawInstallType::Text(text) => text.parse(),
        }
    }
}

/// Unvalidated upload options, gathered from flags, environment or an options file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub api_key: Option<String>,
    pub channel_shortcut: Option<String>,
    pub apk: Option<String>,
    pub ipa: Option<String>,
    pub password: Option<String>,
    pub update_description: Option<String>,
    pub install_type: Option<RawInstallType>,
}

/// Artifact paths left behind by earlier build steps, used when no apk/ipa is given
#[derive(Debug, Clone, Default)]
pub struct ContextDefaults {
    pub gradle_apk_output_path: Option<String>,
    pub ipa_output_path: Option<String>,
}

impl UploadConfig {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let display = path.display().to_string();

        let config_str = fs::read_to_string(path)
            .map_err(|e| AppError::invalid_config_file(&display, e))?;
        let config: UploadConfig = serde_json::from_str(&config_str)
            .map_err(|e| AppError::invalid_config_file(&display, e))?;

        log::debug!("Loaded upload options from {}", display);
        Ok(config)
    }

    /// Values set in `overrides` win field by field
    pub fn merge(self, overrides: UploadConfig) -> UploadConfig {
        UploadConfig {
            api_key: overrides.api_key.or(self.api_key),
            channel_shortcut: overrides.channel_shortcut.or(self.channel_shortcut),
            apk: overrides.apk.or(self.apk),
            ipa: overrides.ipa.or(self.ipa),
            password: overrides.password.or(self.password),
            update_description: overrides.update_description.or(self.update_description),
            install_type: overrides.install_type.or(self.install_type),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Picks the artifact to upload. Explicit paths win over context defaults,
/// and an ipa is preferred over an apk among the defaults.
pub fn select_build_file(config: &UploadConfig, defaults: &ContextDefaults) -> AppResult<String> {
    let apk = non_empty(&config.apk);
    let ipa = non_empty(&config.ipa);

    let build_file = match (apk, ipa) {
        (Some(_), Some(_)) => return Err(AppError::conflicting_options("apk", "ipa")),
        (Some(apk), None) => Some(apk),
        (None, Some(ipa)) => Some(ipa),
        (None, None) => non_empty(&defaults.ipa_output_path)
            .or_else(|| non_empty(&defaults.gradle_apk_output_path)),
    };

    build_file
        .map(str::to_string)
        .ok_or_else(|| AppError::validation("build_file", "You have to provide a build file"))
}

/// Runs every validation rule and produces a request ready to send.
/// Nothing here touches the network.
pub fn resolve_upload_request(
    config: &UploadConfig,
    defaults: &ContextDefaults,
) -> AppResult<UploadRequest> {
    let api_key = InputValidator::validate_api_key(config.api_key.as_deref())?;
    let build_file = select_build_file(config, defaults)?;
    let password = InputValidator::validate_password(config.password.as_deref())?;

    let install_type = match &config.install_type {
        Some(raw) => raw.resolve()?,
        None => InstallType::default(),
    };

    let request = UploadRequest::new(&api_key, &build_file, &password)?
        .with_channel_shortcut(config.channel_shortcut.clone())
        .with_update_description(config.update_description.clone())
        .with_install_type(install_type);

    Ok(request)
}
