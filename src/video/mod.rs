pub mod id;
pub mod info;
pub mod thumbnail;
pub mod ytdlp;

pub use id::extract_video_id;
pub use info::VideoLookup;
pub use thumbnail::{THUMBNAIL_ROUTE, ThumbnailFetcher};
pub use ytdlp::{DownloadRequest, ToolOutput, YtDlp};
