//! Response envelope and extractors whose rejections use our error body.

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts},
  http::StatusCode,
};
use serde::Serialize;

use crate::error::ApiError;

/// `{"message": "success", "data": ...}`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub message: &'static str,
  pub data:    T,
}

pub fn success<T: Serialize>(data: T) -> Json<Envelope<T>> {
  Json(Envelope { message: "success", data })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
  (StatusCode::CREATED, success(data))
}

/// [`axum::Json`] that rejects with a JSON `{"error"}` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// [`axum::extract::Query`] that rejects with a JSON `{"error"}` body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Unwrap a required, non-blank text field.
pub fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
  value
    .filter(|v| !v.trim().is_empty())
    .ok_or_else(|| ApiError::missing(field))
}
