//! Request body extractor accepting JSON, urlencoded forms and multipart.

use crate::responses::AppError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use orgdesk_core::{OrgdeskError, Payload, UploadedFile};
use serde_json::Value;
use tracing::debug;

/// Returned for unparseable JSON bodies. Parser details are only logged.
const INVALID_JSON_MESSAGE: &str = "The request body must be valid JSON.";

/// The request body as a [`Payload`], whatever its encoding.
///
/// Multipart file parts become uploads; text parts named `roles[]` append to
/// the `roles` array. A missing body is an empty payload.
#[derive(Debug, Clone, Default)]
pub struct RequestPayload(pub Payload);

#[async_trait]
impl<S> FromRequest<S> for RequestPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| bad_request(e.body_text()))?;
            return read_multipart(multipart).await.map(Self);
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| bad_request(e.body_text()))?;
            let mut payload = Payload::new();
            for (name, value) in pairs {
                payload.insert_text(&name, value);
            }
            return Ok(Self(payload));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(Payload::new()));
        }
        let value: Value = serde_json::from_slice(&body).map_err(|e| {
            debug!("Rejected JSON body: {}", e);
            bad_request(INVALID_JSON_MESSAGE)
        })?;
        Ok(Self(Payload::from_json(value)))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<Payload, AppError> {
    let mut payload = Payload::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
            // browsers send an empty part for an untouched file input
            if file_name.is_empty() && data.is_empty() {
                continue;
            }
            payload.insert_file(name, UploadedFile::new(file_name, content_type, data.to_vec()));
        } else {
            let text = field.text().await.map_err(|e| bad_request(e.body_text()))?;
            payload.insert_text(&name, text);
        }
    }
    Ok(payload)
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError(OrgdeskError::bad_request(message))
}
