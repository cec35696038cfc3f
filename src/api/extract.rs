use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` extractor whose rejections render as [`AppError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
