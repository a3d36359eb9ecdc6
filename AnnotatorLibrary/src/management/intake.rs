use uuid::Uuid;
use thiserror::Error;
use tokio::fs;
use std::path::{Path, PathBuf};
use sanitize_filename::sanitize;
use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use crate::utils::config::Config;
use crate::utils::logging::*;
use crate::web::utils::response::ErrorResponse;
use crate::management::utils::staged_image::StagedImage;

pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("File type is not allowed")]
    InvalidFileType,
    #[error("Payload exceeds the configured size limit")]
    PayloadTooLarge,
    #[error("Image cannot be decoded: {0}")]
    CorruptImage(String),
    #[error("Filesystem operation failed: {0}")]
    IoError(#[from] std::io::Error),
}

impl IntakeError {
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::InvalidFileType => "InvalidFileType",
            IntakeError::PayloadTooLarge => "PayloadTooLarge",
            IntakeError::CorruptImage(_) => "CorruptImage",
            IntakeError::IoError(_) => "IOError",
        }
    }
}

impl actix_web::ResponseError for IntakeError {
    fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::InvalidFileType => StatusCode::BAD_REQUEST,
            IntakeError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            IntakeError::CorruptImage(_) => StatusCode::BAD_REQUEST,
            IntakeError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.kind(), self.to_string()))
    }
}

/// Accepts raw upload bytes and places them in the staging folder under a
/// collision-resistant name.
pub struct ImageIntake {
    staging_folder: PathBuf,
    max_payload_size: u64,
}

impl ImageIntake {
    pub fn new(staging_folder: PathBuf, max_payload_size: u64) -> Self {
        Self {
            staging_folder,
            max_payload_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(PathBuf::from(&config.staging_folder), config.max_payload_size)
    }

    pub fn allowed_extension(filename: &str) -> bool {
        Path::new(filename).extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| ALLOWED_IMAGE_EXTENSIONS.contains(&extension.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Validation happens before anything touches the filesystem; the only
    /// write is the staged file itself, which is removed again when the
    /// image does not decode.
    pub async fn accept_upload(&self, data: &[u8], declared_filename: &str) -> Result<StagedImage, IntakeError> {
        if data.len() as u64 > self.max_payload_size {
            return Err(IntakeError::PayloadTooLarge);
        }
        if !Self::allowed_extension(declared_filename) {
            return Err(IntakeError::InvalidFileType);
        }
        let sanitized_filename = sanitize(declared_filename);
        if sanitized_filename.is_empty() {
            return Err(IntakeError::InvalidFileType);
        }
        let prefix = Uuid::new_v4().simple().to_string();
        let filename = format!("{}_{}", &prefix[..8], sanitized_filename);
        let path = self.staging_folder.join(&filename);
        fs::write(&path, data).await?;
        match image::image_dimensions(&path) {
            Ok((width, height)) => {
                logging_information!("Intake", format!("Staged {filename} ({width}x{height})"));
                Ok(StagedImage {
                    filename,
                    original_filename: declared_filename.to_string(),
                    path,
                    width,
                    height,
                })
            },
            Err(err) => {
                let _ = fs::remove_file(&path).await;
                Err(IntakeError::CorruptImage(err.to_string()))
            },
        }
    }

    /// Resolves a staged filename to its path, refusing anything that does
    /// not survive sanitization unchanged (path traversal guard).
    pub fn staged_path(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty() || sanitize(filename) != filename {
            return None;
        }
        Some(self.staging_folder.join(filename))
    }
}
