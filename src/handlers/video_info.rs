use axum::{Json, extract::State};

use crate::{
    errors::{AppError, AppResult},
    handlers::form::SubmittedForm,
    server::AppState,
    video::{VideoLookup, extract_video_id},
};

/// `POST /get_video_info`
pub async fn get_video_info(
    State(state): State<AppState>,
    form: SubmittedForm,
) -> AppResult<Json<VideoLookup>> {
    let url = form
        .non_empty("url")
        .ok_or(AppError::MissingField("No URL provided"))?;

    let cookies = form.persist_cookies(&state).await?;
    let mut lookup = state.ytdlp.video_info(url, cookies.as_deref()).await;

    // The thumbnail is best effort; a failed fetch just leaves the field out
    if let VideoLookup::Found(info) = &mut lookup {
        if let Some(video_id) = extract_video_id(url) {
            info.local_thumbnail = state.thumbnails.fetch(video_id).await;
        }
    }

    Ok(Json(lookup))
}
