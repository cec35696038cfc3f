//! HTTP request handlers

use crate::api::extract::ApiJson;
use crate::api::models::{
    CreateAccountRequest, CreateAccountResponse, ErrorResponse, HealthResponse, StatusNotificationRequest,
    StatusNotificationResponse,
};
use crate::error::AppError;
use crate::service::{self, NewAccount};
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::info;

/// Create a shipping-company account and email its credentials
#[utoipa::path(
    post,
    path = "/functions/v1/criar-embarcador",
    tag = "Embarcadores",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Account created", body = CreateAccountResponse),
        (status = 400, description = "Missing fields, invalid or duplicate data", body = ErrorResponse),
        (status = 500, description = "Database or auth failure", body = ErrorResponse),
    )
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<Json<CreateAccountResponse>, AppError> {
    let account = NewAccount::parse(
        request.nome.as_deref(),
        request.cnpj.as_deref(),
        request.email.as_deref(),
        request.telefone.as_deref(),
    )?;

    info!(cnpj = %account.cnpj, email = %account.email, "Received account creation request");

    let created = service::create_account(&state, account).await?;

    info!(
        embarcador_id = %created.embarcador_id,
        user_id = %created.user_id,
        email_sent = created.email_sent,
        "Account created"
    );

    Ok(Json(created.into()))
}

/// Email the embarcador about a carga status change
#[utoipa::path(
    post,
    path = "/functions/v1/notificar-status-carga",
    tag = "Notificações",
    request_body = StatusNotificationRequest,
    responses(
        (status = 200, description = "Notification processed", body = StatusNotificationResponse),
        (status = 400, description = "Missing carga_id or status", body = ErrorResponse),
        (status = 404, description = "Carga or embarcador not found", body = ErrorResponse),
        (status = 500, description = "Email delivery failure", body = ErrorResponse),
    )
)]
pub async fn notify_status(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<StatusNotificationRequest>,
) -> Result<Json<StatusNotificationResponse>, AppError> {
    let (Some(carga_id), Some(status)) = (request.carga_id(), request.status()) else {
        return Err(AppError::invalid("carga_id e status são obrigatórios"));
    };

    info!(carga_id = %carga_id, status = %status, "Received status notification request");

    let outcome = service::notify_status_change(&state, &carga_id, status).await?;

    Ok(Json(outcome.into()))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
