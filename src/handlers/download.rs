use axum::{Json, extract::State};

use crate::{
    errors::{AppError, AppResult},
    handlers::form::SubmittedForm,
    server::AppState,
    video::{DownloadRequest, ToolOutput},
};

/// `POST /download`
pub async fn download(
    State(state): State<AppState>,
    form: SubmittedForm,
) -> AppResult<Json<ToolOutput>> {
    let url = form
        .non_empty("url")
        .ok_or(AppError::MissingField("No URL provided"))?;

    let request = DownloadRequest {
        url: url.to_owned(),
        format_id: form.non_empty("format_id").map(str::to_owned),
        credential_file: form.persist_cookies(&state).await?,
    };

    let result = state
        .ytdlp
        .download(&request, Some(&state.config.download_dir))
        .await;

    Ok(Json(result))
}
