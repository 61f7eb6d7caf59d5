use std::path::PathBuf;

use serde::Serialize;

use crate::video::ytdlp::{DownloadRequest, YtDlp};

/// Outcome of one URL inside a bulk request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub url: String,
    pub success: bool,
    pub output: String,
}

/// Settings shared by every URL of a bulk request
#[derive(Debug, Clone, Default)]
pub struct BulkJob {
    pub format_id: Option<String>,
    pub credential_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// Split newline-separated input into URLs, dropping blank lines.
pub fn split_urls(input: &str) -> impl Iterator<Item = &str> {
    input.lines().map(str::trim).filter(|line| !line.is_empty())
}

impl BulkJob {
    /// Download every URL one after another.
    ///
    /// Each run finishes, output included, before the next starts. Failures do
    /// not stop the batch; results come back in input order.
    pub async fn run(&self, ytdlp: &YtDlp, urls: &str) -> Vec<JobResult> {
        let mut results = Vec::new();

        for url in split_urls(urls) {
            let request = DownloadRequest {
                url: url.to_string(),
                format_id: self.format_id.clone(),
                credential_file: self.credential_file.clone(),
            };
            let result = ytdlp.download(&request, self.output_dir.as_deref()).await;

            results.push(JobResult {
                url: request.url,
                success: result.success,
                output: result.output,
            });
        }

        let failed = results.iter().filter(|r| !r.success).count();
        log::info!("Bulk download finished: {} urls, {} failed", results.len(), failed);

        results
    }
}
