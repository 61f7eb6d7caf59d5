use std::path::PathBuf;

use reqwest::{Client, StatusCode};
use tokio::fs;

use crate::{config::Config, errors::AppResult};

const MAX_RESOLUTION: &str = "maxresdefault.jpg";
const MEDIUM_RESOLUTION: &str = "mqdefault.jpg";

/// Route prefix under which saved thumbnails are served
pub const THUMBNAIL_ROUTE: &str = "/uploads/thumbnails";

/// Downloads preview images straight from the image host, bypassing yt-dlp.
#[derive(Debug, Clone)]
pub struct ThumbnailFetcher {
    client: Client,
    base_url: String,
    dir: PathBuf,
}

impl ThumbnailFetcher {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = Client::builder().timeout(config.thumbnail_timeout).build()?;

        Ok(Self {
            client,
            base_url: config.thumbnail_base_url.clone(),
            dir: config.thumbnails_dir(),
        })
    }

    fn image_url(&self, video_id: &str, variant: &str) -> String {
        format!("{}/{}/{}", self.base_url, video_id, variant)
    }

    /// Save the best available thumbnail as `<video_id>.jpg` and return its served path.
    ///
    /// A 404 on the max-resolution image triggers one retry at medium resolution.
    /// Any other failure yields `None` and leaves nothing on disk.
    pub async fn fetch(&self, video_id: &str) -> Option<String> {
        match self.try_fetch(video_id).await {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Thumbnail download failed for {}: {}", video_id, e);
                None
            }
        }
    }

    async fn try_fetch(&self, video_id: &str) -> AppResult<Option<String>> {
        let mut response = self
            .client
            .get(self.image_url(video_id, MAX_RESOLUTION))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            log::info!("No max-resolution thumbnail for {}, trying {}", video_id, MEDIUM_RESOLUTION);
            response = self
                .client
                .get(self.image_url(video_id, MEDIUM_RESOLUTION))
                .send()
                .await?;
        }

        if !response.status().is_success() {
            log::warn!("Thumbnail host answered {} for {}", response.status(), video_id);
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        let file_name = format!("{}.jpg", video_id);
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&file_name), &bytes).await?;

        Ok(Some(format!("{}/{}", THUMBNAIL_ROUTE, file_name)))
    }
}
