use std::io::{Error, ErrorKind};
use actix_multipart::Multipart;
use actix_web::http::header::ContentDisposition;
use futures::{StreamExt, TryStreamExt};
use crate::management::intake::IntakeError;

pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

pub fn get_field_name(content_disposition: &ContentDisposition) -> Option<String> {
    match content_disposition.get_name() {
        Some(field_name) => Some(field_name.to_string()),
        _ => None,
    }
}

pub fn get_file_name(content_disposition: &ContentDisposition) -> Option<String> {
    match content_disposition.get_filename() {
        Some(file_name) => Some(file_name.to_string()),
        _ => None,
    }
}

/// Buffers the first matching file field, refusing payloads past `limit`
/// before the oversized tail is ever read to the end.
pub async fn read_file_field(payload: &mut Multipart, field_name: &str, limit: u64) -> Result<Option<UploadedFile>, IntakeError> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_disposition = match field.content_disposition() {
            Some(content_disposition) => content_disposition.clone(),
            None => continue,
        };
        let name = match get_field_name(&content_disposition) {
            Some(name) => name,
            None => continue,
        };
        if name != field_name {
            continue;
        }
        let filename = match get_file_name(&content_disposition) {
            Some(filename) => filename,
            None => continue,
        };
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|err| IntakeError::IoError(Error::new(ErrorKind::Other, err.to_string())))?;
            if (data.len() + chunk.len()) as u64 > limit {
                return Err(IntakeError::PayloadTooLarge);
            }
            data.extend_from_slice(&chunk);
        }
        return Ok(Some(UploadedFile {
            filename,
            data,
        }));
    }
    Ok(None)
}
