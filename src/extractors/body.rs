//! Request body as a field map, accepted as JSON, an urlencoded form or multipart form data.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;

#[derive(Debug, Default)]
pub struct FieldMap(pub HashMap<String, Value>);

/// The unread request body. Handlers that must authorize before looking at the payload take this
/// and call [`RawBody::fields`] once the caller is allowed to write.
pub struct RawBody(Request);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
    Multipart,
}

fn body_format(req: &Request) -> BodyFormat {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase())
        .unwrap_or_default();
    if content_type.starts_with("application/x-www-form-urlencoded") {
        BodyFormat::Form
    } else if content_type.starts_with("multipart/form-data") {
        BodyFormat::Multipart
    } else {
        BodyFormat::Json
    }
}

pub fn body_to_map(value: Value) -> Result<HashMap<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

impl RawBody {
    /// Parse the body into fields. Form and multipart values arrive as strings; multipart file
    /// parts are skipped. An empty body is an empty map.
    pub async fn fields(self) -> Result<HashMap<String, Value>, AppError> {
        let req = self.0;
        match body_format(&req) {
            BodyFormat::Form => {
                let Form(fields) = Form::<HashMap<String, String>>::from_request(req, &())
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                Ok(fields.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
            }
            BodyFormat::Multipart => {
                let mut multipart = Multipart::from_request(req, &())
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                let mut fields = HashMap::new();
                while let Some(field) = multipart
                    .next_field()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?
                {
                    if field.file_name().is_some() {
                        continue;
                    }
                    let Some(name) = field.name().map(str::to_string) else {
                        continue;
                    };
                    let text = field.text().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
                    fields.insert(name, Value::String(text));
                }
                Ok(fields)
            }
            BodyFormat::Json => {
                let bytes = Bytes::from_request(req, &())
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if bytes.iter().all(|b| b.is_ascii_whitespace()) {
                    return Ok(HashMap::new());
                }
                let value: Value = serde_json::from_slice(&bytes)
                    .map_err(|e| AppError::BadRequest(format!("JSON parse error - {}", e)))?;
                body_to_map(value)
            }
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for RawBody
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RawBody(req))
    }
}

#[async_trait]
impl<S> FromRequest<S> for FieldMap
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(FieldMap(RawBody(req).fields().await?))
    }
}
