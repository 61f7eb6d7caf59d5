use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Prefix yt-dlp uses for storyboard (preview strip) pseudo-formats
const STORYBOARD_PREFIX: &str = "sb";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatEntry {
    pub format_id: String,
    #[serde(rename = "ext")]
    pub extension: String,
    pub resolution: String,
    pub format_note: String,
    #[serde(rename = "vcodec")]
    pub video_codec: String,
    #[serde(rename = "acodec")]
    pub audio_codec: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub title: String,
    #[serde(rename = "thumbnail")]
    pub thumbnail_url: String,
    /// Kept as the tool printed it, so integral durations stay integers on the wire
    #[serde(rename = "duration")]
    pub duration_seconds: Number,
    pub formats: Vec<FormatEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_thumbnail: Option<String>,
}

/// Outcome of a metadata lookup: either the normalized info or the error text.
///
/// Serialized untagged, so clients see the info object or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VideoLookup {
    Found(VideoInfo),
    Failed { error: String },
}

impl VideoLookup {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: Option<String>,
    ext: Option<String>,
    resolution: Option<String>,
    format_note: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    thumbnail: Option<String>,
    duration: Option<Number>,
    formats: Option<Vec<YtDlpFormat>>,
}

impl VideoInfo {
    /// Normalize the document printed by `yt-dlp --dump-json`
    pub fn from_dump_json(json: &str) -> serde_json::Result<Self> {
        let info: YtDlpInfo = serde_json::from_str(json)?;
        Ok(info.into())
    }
}

impl From<YtDlpFormat> for FormatEntry {
    fn from(f: YtDlpFormat) -> Self {
        Self {
            format_id: f.format_id.unwrap_or_default(),
            extension: f.ext.unwrap_or_default(),
            resolution: f.resolution.unwrap_or_default(),
            format_note: f.format_note.unwrap_or_default(),
            video_codec: f.vcodec.unwrap_or_default(),
            audio_codec: f.acodec.unwrap_or_default(),
        }
    }
}

impl From<YtDlpInfo> for VideoInfo {
    fn from(info: YtDlpInfo) -> Self {
        let formats = info
            .formats
            .unwrap_or_default()
            .into_iter()
            .map(FormatEntry::from)
            .filter(|f| !f.format_id.starts_with(STORYBOARD_PREFIX))
            .collect();

        Self {
            title: info.title.unwrap_or_else(|| "Unknown".to_string()),
            thumbnail_url: info.thumbnail.unwrap_or_default(),
            duration_seconds: info.duration.unwrap_or_else(|| Number::from(0)),
            formats,
            local_thumbnail: None,
        }
    }
}
