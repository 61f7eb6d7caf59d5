use axum::{Json, extract::State};
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    handlers::form::SubmittedForm,
    jobs::{BulkJob, JobResult, split_urls},
    server::AppState,
};

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub results: Vec<JobResult>,
}

/// `POST /bulk_download`
///
/// Blocks until every URL has been processed.
pub async fn bulk_download(
    State(state): State<AppState>,
    form: SubmittedForm,
) -> AppResult<Json<BulkResponse>> {
    let urls = form
        .field("urls")
        .ok_or(AppError::MissingField("No URLs provided"))?;

    let job = BulkJob {
        format_id: form.non_empty("format_id").map(str::to_owned),
        credential_file: form.persist_cookies(&state).await?,
        output_dir: Some(state.config.download_dir.clone()),
    };

    log::info!("Bulk download requested for {} urls", split_urls(urls).count());
    let results = job.run(&state.ytdlp, urls).await;

    Ok(Json(BulkResponse { results }))
}
