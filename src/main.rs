mod config;
mod errors;
mod handlers;
mod jobs;
mod server;
mod uploads;
mod video;

use crate::{config::Config, errors::AppResult};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();
    log::info!("Starting video download server...");

    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let config = Config::from_env()?;
    log::info!(
        "yt-dlp: {} {:?}, uploads: {}, downloads: {}",
        config.ytdlp_program,
        config.ytdlp_args,
        config.upload_folder.display(),
        config.download_dir.display()
    );

    server::start_server(config).await
}
