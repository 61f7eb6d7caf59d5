use std::{
    env,
    net::SocketAddr,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use strum::IntoEnumIterator;

use crate::{
    errors::{AppError, AppResult},
    uploads::CredentialExtension,
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024; // 16MB
const DEFAULT_THUMBNAIL_BASE_URL: &str = "https://img.youtube.com/vi";
const DEFAULT_THUMBNAIL_TIMEOUT_SECS: u64 = 10;

/// Immutable application settings, built once at startup and shared by every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Credential files land here; thumbnails in its `thumbnails` subdirectory
    pub upload_folder: PathBuf,
    pub download_dir: PathBuf,
    pub max_content_length: usize,
    pub allowed_extensions: Vec<CredentialExtension>,
    /// Program used as the external media tool
    pub ytdlp_program: String,
    /// Arguments placed before every generated argument list
    pub ytdlp_args: Vec<String>,
    pub thumbnail_base_url: String,
    pub thumbnail_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            upload_folder: PathBuf::from("uploads"),
            download_dir: PathBuf::from("downloads"),
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            allowed_extensions: CredentialExtension::iter().collect(),
            ytdlp_program: "yt-dlp".to_string(),
            ytdlp_args: Vec::new(),
            thumbnail_base_url: DEFAULT_THUMBNAIL_BASE_URL.to_string(),
            thumbnail_timeout: Duration::from_secs(DEFAULT_THUMBNAIL_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Read settings from the environment (after `.env` has been loaded)
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        let bind_addr = parse_var("BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let max_content_length = parse_var("MAX_CONTENT_LENGTH", DEFAULT_MAX_CONTENT_LENGTH)?;
        let thumbnail_timeout =
            Duration::from_secs(parse_var("THUMBNAIL_TIMEOUT_SECS", DEFAULT_THUMBNAIL_TIMEOUT_SECS)?);

        let allowed_extensions = match env::var("ALLOWED_EXTENSIONS") {
            Ok(raw) => parse_extensions(&raw)?,
            Err(_) => defaults.allowed_extensions,
        };

        let ytdlp_args = env::var("YTDLP_ARGS")
            .map(|raw| raw.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();

        Ok(Self {
            bind_addr,
            upload_folder: env::var("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_folder),
            download_dir: env::var("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            max_content_length,
            allowed_extensions,
            ytdlp_program: env::var("YTDLP_PATH").unwrap_or(defaults.ytdlp_program),
            ytdlp_args,
            thumbnail_base_url: env::var("THUMBNAIL_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.thumbnail_base_url),
            thumbnail_timeout,
        })
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.upload_folder.join("thumbnails")
    }
}

fn parse_var<T>(key: &str, default: impl ToString) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| AppError::config(format!("{}={:?}: {}", key, raw, e)))
}

fn parse_extensions(raw: &str) -> AppResult<Vec<CredentialExtension>> {
    raw.split(',')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            ext.parse::<CredentialExtension>()
                .map_err(|_| AppError::config(format!("unsupported credential extension {:?}", ext)))
        })
        .collect()
}
