use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};

pub struct InputValidator;

impl InputValidator {
    /// Returns the value if it is present and not blank
    pub fn validate_required(field: &str, value: Option<&str>, message: &str) -> AppResult<String> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
            _ => Err(AppError::validation(field, message)),
        }
    }

    pub fn validate_api_key(api_key: Option<&str>) -> AppResult<String> {
        Self::validate_required("api_key", api_key, "You have to provide an api_key")
    }

    pub fn validate_password(password: Option<&str>) -> AppResult<String> {
        Self::validate_required("password", password, "You have to provide a password")
    }

    pub fn validate_build_file(path: &str) -> AppResult<PathBuf> {
        if path.trim().is_empty() {
            return Err(AppError::validation(
                "build_file",
                "You have to provide a build file",
            ));
        }

        let path_obj = Path::new(path);

        if !path_obj.exists() {
            return Err(AppError::file_not_found(path));
        }

        if !path_obj.is_file() {
            return Err(AppError::validation(
                "build_file",
                &format!("'{}' is not a file", path),
            ));
        }

        Ok(path_obj.to_path_buf())
    }

    /// Hide all but the first few characters of a credential for logging
    pub fn mask_secret(secret: &str) -> String {
        const VISIBLE: usize = 4;

        let count = secret.chars().count();
        if count <= VISIBLE * 2 {
            return "*".repeat(count);
        }

        let prefix: String = secret.chars().take(VISIBLE).collect();
        format!("{}{}", prefix, "*".repeat(count - VISIBLE))
    }
}
