use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
};

use serde::Serialize;
use tokio::{
    fs,
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process,
};

use crate::{
    config::Config,
    video::info::{VideoInfo, VideoLookup},
};

/// One download request as submitted by a client
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: Option<String>,
    pub credential_file: Option<PathBuf>,
}

/// Exit status and merged stdout/stderr of one tool run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
}

impl ToolOutput {
    fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Handle on the external media tool.
///
/// Every argument is passed as its own argv element; nothing goes through a shell.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    base_args: Vec<String>,
}

impl YtDlp {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.ytdlp_program.clone(),
            base_args: config.ytdlp_args.clone(),
        }
    }

    fn command(&self) -> process::Command {
        let mut cmd = process::Command::new(&self.program);
        cmd.args(&self.base_args).stdin(Stdio::null());
        cmd
    }

    fn build_download_command(&self, request: &DownloadRequest, output_dir: Option<&Path>) -> process::Command {
        let mut cmd = self.command();

        if let Some(format_id) = request.format_id.as_deref().filter(|f| !f.is_empty()) {
            cmd.args(["-f", format_id]);
        }
        if let Some(cookies) = &request.credential_file {
            cmd.arg("--cookies").arg(cookies);
        }
        if let Some(dir) = output_dir {
            cmd.arg("-P").arg(dir);
        }

        cmd.arg(&request.url);
        cmd
    }

    /// Run a download and capture everything the tool prints.
    ///
    /// Never fails: spawn and I/O errors come back as an unsuccessful `ToolOutput`.
    pub async fn download(&self, request: &DownloadRequest, output_dir: Option<&Path>) -> ToolOutput {
        if request.url.trim().is_empty() {
            return ToolOutput::failed("No URL provided");
        }

        log::info!(
            "Starting download: {} (format: {:?}, cookies: {}, output: {:?})",
            request.url,
            request.format_id,
            request.credential_file.is_some(),
            output_dir
        );

        match self.run_download(request, output_dir).await {
            Ok(result) => {
                if result.success {
                    log::info!("Download finished: {}", request.url);
                } else {
                    log::warn!("yt-dlp failed for {}", request.url);
                }
                result
            }
            Err(e) => {
                log::error!("Failed to run {}: {}", self.program, e);
                ToolOutput::failed(e.to_string())
            }
        }
    }

    async fn run_download(&self, request: &DownloadRequest, output_dir: Option<&Path>) -> io::Result<ToolOutput> {
        if let Some(dir) = output_dir {
            fs::create_dir_all(dir).await?;
        }

        let mut child = self
            .build_download_command(request, output_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("child stderr was not captured"))?;

        let output = read_merged(stdout, stderr).await?;
        let status = child.wait().await?;
        log::info!("yt-dlp exit code: {:?}", status.code());

        Ok(ToolOutput {
            success: status.success(),
            output,
        })
    }

    /// Dump metadata for `url` without downloading anything.
    pub async fn video_info(&self, url: &str, credential_file: Option<&Path>) -> VideoLookup {
        let mut cmd = self.command();
        cmd.arg("--dump-json").arg(url);
        if let Some(cookies) = credential_file {
            cmd.arg("--cookies").arg(cookies);
        }

        log::info!("Fetching video info: {}", url);

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) => {
                log::error!("Failed to run {}: {}", self.program, e);
                return VideoLookup::failed(e.to_string());
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            log::warn!("yt-dlp --dump-json failed ({:?}): {}", output.status.code(), stderr.trim_end());
            return VideoLookup::failed(stderr);
        }

        match VideoInfo::from_dump_json(&String::from_utf8_lossy(&output.stdout)) {
            Ok(info) => VideoLookup::Found(info),
            Err(e) => {
                log::warn!("Failed to parse yt-dlp output: {}", e);
                VideoLookup::failed(e.to_string())
            }
        }
    }
}

/// Read two streams line by line until both close, interleaving lines in arrival order.
async fn read_merged<O, E>(stdout: O, stderr: E) -> io::Result<String>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout = BufReader::new(stdout);
    let mut stderr = BufReader::new(stderr);
    let (mut out_line, mut err_line) = (Vec::new(), Vec::new());
    let (mut out_done, mut err_done) = (false, false);
    let mut merged = Vec::new();

    while !(out_done && err_done) {
        // read_until keeps partial data in the buffer when the other branch wins
        tokio::select! {
            read = stdout.read_until(b'\n', &mut out_line), if !out_done => {
                if read? == 0 {
                    out_done = true;
                }
                merged.append(&mut out_line);
            }
            read = stderr.read_until(b'\n', &mut err_line), if !err_done => {
                if read? == 0 {
                    err_done = true;
                }
                merged.append(&mut err_line);
            }
        }
    }

    Ok(String::from_utf8_lossy(&merged).into_owned())
}
