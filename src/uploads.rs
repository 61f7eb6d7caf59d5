use std::path::PathBuf;

use axum::body::Bytes;
use strum::{Display, EnumIter, EnumString};
use tokio::fs;

use crate::{config::Config, errors::AppResult};

/// Extensions a credential (cookie export) file may carry
#[derive(EnumIter, Display, EnumString, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CredentialExtension {
    Txt,
    Json,
}

/// A file part received with a form submission
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// Reduce a client-supplied filename to a single safe path component.
pub fn secure_filename(name: &str) -> String {
    let cleaned = sanitize_filename::sanitize(name);
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    joined.trim_start_matches('.').to_string()
}

pub fn credential_extension(file_name: &str) -> Option<CredentialExtension> {
    let (_, ext) = file_name.rsplit_once('.')?;
    ext.parse().ok()
}

pub fn is_allowed(file_name: &str, config: &Config) -> bool {
    credential_extension(file_name).is_some_and(|ext| config.allowed_extensions.contains(&ext))
}

/// Persist an uploaded credential file into the uploads folder.
///
/// Returns `None` when the file is rejected; nothing is written in that case.
/// Files are keyed by sanitized name, so a later upload with the same name replaces the earlier one.
pub async fn save_credential_file(
    config: &Config,
    upload: &UploadedFile,
) -> AppResult<Option<PathBuf>> {
    let file_name = secure_filename(&upload.file_name);

    if file_name.is_empty() || !is_allowed(&file_name, config) {
        log::warn!(
            "Rejected credential file {:?} (allowed extensions: {:?})",
            upload.file_name,
            config.allowed_extensions
        );
        return Ok(None);
    }

    let path = config.upload_folder.join(&file_name);
    fs::create_dir_all(&config.upload_folder).await?;
    fs::write(&path, &upload.data).await?;
    log::info!("Saved credential file to {}", path.display());

    Ok(Some(path))
}
