use std::{collections::HashMap, path::PathBuf};

use axum::{
    Form,
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header::CONTENT_TYPE},
};

use crate::{
    errors::{AppError, AppResult},
    server::AppState,
    uploads::{UploadedFile, save_credential_file},
};

/// Name of the optional credential file part
const COOKIES_FIELD: &str = "cookies";

/// Text fields and the optional credential file of a submitted form.
///
/// Accepts `multipart/form-data` and `application/x-www-form-urlencoded`;
/// any other body is treated as an empty form.
#[derive(Debug, Default)]
pub struct SubmittedForm {
    fields: HashMap<String, String>,
    cookies: Option<UploadedFile>,
}

impl SubmittedForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field value, treating an empty string as absent
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|value| !value.is_empty())
    }

    /// Store the uploaded credential file, if any, and return its path.
    pub async fn persist_cookies(&self, state: &AppState) -> AppResult<Option<PathBuf>> {
        match &self.cookies {
            Some(upload) => save_credential_file(&state.config, upload).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for SubmittedForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state).await?;
            read_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state).await?;
            Ok(Self {
                fields,
                cookies: None,
            })
        } else {
            Ok(Self::default())
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> AppResult<SubmittedForm> {
    let mut form = SubmittedForm::default();
    let mut first = true;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // A form with no parts is a bare closing boundary, which the parser
            // rejects. Read it as an empty form so the route reports its own missing field.
            Err(e) if first && e.status() == StatusCode::BAD_REQUEST => {
                log::debug!("Multipart body has no readable parts: {}", e);
                break;
            }
            Err(e) => return Err(e.into()),
        };
        first = false;

        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == COOKIES_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_owned();
            let data = field.bytes().await?;
            // An untouched file input still submits a part, with an empty filename
            if !file_name.is_empty() {
                form.cookies = Some(UploadedFile { file_name, data });
            }
            continue;
        }

        let value = field.text().await?;
        form.fields.entry(name).or_insert(value);
    }

    Ok(form)
}
