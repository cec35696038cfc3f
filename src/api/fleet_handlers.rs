//! Fleet Engine proxy handler

use crate::api::extract::ApiJson;
use crate::api::models::{ErrorResponse, FleetRequest, FleetResponse};
use crate::backend::{AssignTask, CreateTask, CreateVehicle, FleetApi, UpdateLocation};
use crate::error::{AppError, Result};
use crate::AppState;
use axum::{extract::State, Json};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// A validated proxy action
#[derive(Debug, Clone)]
pub enum FleetAction {
    CreateVehicle(CreateVehicle),
    UpdateLocation(UpdateLocation),
    CreateTask(CreateTask),
    AssignTask(AssignTask),
    GenerateToken,
}

impl FleetAction {
    /// Match `action` and decode its `data`
    pub fn parse(action: &str, data: Option<Value>) -> Result<Self> {
        let action = match action {
            "create_vehicle" => {
                let request: CreateVehicle = decode(action, data)?;
                request.validate()?;
                FleetAction::CreateVehicle(request)
            }
            "update_location" => {
                let request: UpdateLocation = decode(action, data)?;
                request.validate()?;
                FleetAction::UpdateLocation(request)
            }
            "create_task" => {
                let request: CreateTask = decode(action, data)?;
                request.validate()?;
                FleetAction::CreateTask(request)
            }
            "assign_task" => {
                let request: AssignTask = decode(action, data)?;
                request.validate()?;
                FleetAction::AssignTask(request)
            }
            "generate_token" => FleetAction::GenerateToken,
            other => return Err(AppError::invalid(format!("Ação desconhecida: {}", other))),
        };

        Ok(action)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FleetAction::CreateVehicle(_) => "create_vehicle",
            FleetAction::UpdateLocation(_) => "update_location",
            FleetAction::CreateTask(_) => "create_task",
            FleetAction::AssignTask(_) => "assign_task",
            FleetAction::GenerateToken => "generate_token",
        }
    }

    pub async fn execute(&self, fleet: &dyn FleetApi) -> Result<Value> {
        match self {
            FleetAction::CreateVehicle(request) => fleet.create_vehicle(request).await,
            FleetAction::UpdateLocation(request) => fleet.update_location(request).await,
            FleetAction::CreateTask(request) => fleet.create_task(request).await,
            FleetAction::AssignTask(request) => fleet.assign_task(request).await,
            FleetAction::GenerateToken => fleet.generate_token().await,
        }
    }
}

fn decode<T: DeserializeOwned>(action: &str, data: Option<Value>) -> Result<T> {
    let data = data.unwrap_or(Value::Object(Default::default()));

    serde_json::from_value(data)
        .map_err(|e| AppError::invalid(format!("Dados inválidos para {}: {}", action, e)))
}

/// Proxy a fleet-tracking action to Fleet Engine
#[utoipa::path(
    post,
    path = "/functions/v1/fleet-engine",
    tag = "Fleet Engine",
    request_body = FleetRequest,
    responses(
        (status = 200, description = "Upstream call succeeded", body = FleetResponse),
        (status = 400, description = "Missing or unknown action, invalid data", body = ErrorResponse),
        (status = 500, description = "Fleet Engine or credential failure", body = ErrorResponse),
    )
)]
pub async fn fleet_engine(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<FleetRequest>,
) -> std::result::Result<Json<FleetResponse>, AppError> {
    let action = request
        .action
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::invalid("Campo 'action' é obrigatório"))?;

    let action = FleetAction::parse(action, request.data)?;
    info!(action = action.name(), "Received fleet engine request");

    let data = action.execute(state.fleet.as_ref()).await?;

    Ok(Json(FleetResponse {
        success: true,
        data,
    }))
}
