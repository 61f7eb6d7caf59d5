mod bulk_download;
mod download;
mod form;
mod index;
mod video_info;

pub use bulk_download::bulk_download;
pub use download::download;
pub use index::index;
pub use video_info::get_video_info;
