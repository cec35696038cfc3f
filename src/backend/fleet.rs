//! Fleet Engine (Deliveries API) client
//!
//! Vehicles and tasks are registered under `providers/{provider_id}`; every
//! call carries a bearer token minted by [`TokenProvider`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::backend::database::upstream_error;
use crate::backend::token::TokenProvider;
use crate::config::FleetSettings;
use crate::error::{AppError, Result};

/// `create_vehicle` payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVehicle {
    #[serde(alias = "vehicleId")]
    pub vehicle_id: String,
    #[serde(default = "default_vehicle_type", alias = "vehicleType")]
    pub vehicle_type: String,
}

fn default_vehicle_type() -> String {
    "AUTO".to_string()
}

/// `update_location` payload
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLocation {
    #[serde(alias = "vehicleId")]
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub heading: Option<i32>,
    #[serde(default)]
    pub speed: Option<f64>,
}

/// `create_task` payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    #[serde(default, alias = "taskId")]
    pub task_id: Option<String>,
    #[serde(alias = "trackingId", alias = "carga_id", alias = "cargaId")]
    pub tracking_id: String,
    #[serde(default = "default_task_type", alias = "taskType")]
    pub task_type: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_task_duration", alias = "durationSeconds")]
    pub duration_seconds: u32,
}

fn default_task_type() -> String {
    "DELIVERY".to_string()
}

fn default_task_duration() -> u32 {
    600
}

/// `assign_task` payload
#[derive(Debug, Clone, Deserialize)]
pub struct AssignTask {
    #[serde(alias = "vehicleId")]
    pub vehicle_id: String,
    #[serde(alias = "taskId")]
    pub task_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CreateVehicle {
    pub fn validate(&self) -> Result<()> {
        validate_resource_id("vehicle_id", &self.vehicle_id)?;
        validate_enum("vehicle_type", &self.vehicle_type, &["AUTO", "TWO_WHEELER", "BICYCLE", "PEDESTRIAN"])
    }
}

impl UpdateLocation {
    pub fn validate(&self) -> Result<()> {
        validate_resource_id("vehicle_id", &self.vehicle_id)?;
        validate_coordinates(self.latitude, self.longitude)
    }
}

impl CreateTask {
    pub fn validate(&self) -> Result<()> {
        if let Some(task_id) = &self.task_id {
            validate_resource_id("task_id", task_id)?;
        }
        if self.tracking_id.trim().is_empty() {
            return Err(AppError::invalid("Campo 'tracking_id' é obrigatório"));
        }
        validate_enum(
            "task_type",
            &self.task_type,
            &["PICKUP", "DELIVERY", "SCHEDULED_STOP", "UNAVAILABLE"],
        )?;
        validate_coordinates(self.latitude, self.longitude)
    }
}

impl AssignTask {
    pub fn validate(&self) -> Result<()> {
        validate_resource_id("vehicle_id", &self.vehicle_id)?;
        validate_resource_id("task_id", &self.task_id)?;
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// Ids end up as URL path segments and query values
fn validate_resource_id(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::invalid(format!("Campo '{}' é obrigatório", field)));
    }
    if value.len() > 64 || value.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_')) {
        return Err(AppError::invalid(format!(
            "Campo '{}' deve conter apenas letras, números, '-' ou '_' (máx. 64)",
            field
        )));
    }
    Ok(())
}

fn validate_enum(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AppError::invalid(format!(
            "Valor inválido para '{}': {} (esperado: {})",
            field,
            value,
            allowed.join(", ")
        )))
    }
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::invalid("Coordenadas inválidas"));
    }
    Ok(())
}

fn lat_lng(latitude: f64, longitude: f64) -> Value {
    json!({ "latitude": latitude, "longitude": longitude })
}

/// Operations proxied to Fleet Engine
#[async_trait]
pub trait FleetApi: Send + Sync {
    async fn create_vehicle(&self, request: &CreateVehicle) -> Result<Value>;

    async fn update_location(&self, request: &UpdateLocation) -> Result<Value>;

    async fn create_task(&self, request: &CreateTask) -> Result<Value>;

    async fn assign_task(&self, request: &AssignTask) -> Result<Value>;

    /// An access token for client-side SDKs
    async fn generate_token(&self) -> Result<Value>;
}

pub struct FleetEngineClient {
    client: Client,
    settings: FleetSettings,
    tokens: TokenProvider,
}

impl FleetEngineClient {
    pub fn new(settings: FleetSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let tokens = TokenProvider::new(client.clone(), settings.clone());

        Ok(Self {
            client,
            settings,
            tokens,
        })
    }

    fn provider_url(&self) -> Result<String> {
        if self.settings.provider_id.is_empty() {
            return Err(AppError::MissingConfig("fleet.provider_id"));
        }

        Ok(format!(
            "{}/v1/providers/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.provider_id
        ))
    }

    /// Authorize and send, returning the upstream JSON body
    async fn execute(&self, request: RequestBuilder) -> Result<Value> {
        let token = self.tokens.access_token().await?;

        let response = request.bearer_auth(&token.access_token).send().await?;

        if !response.status().is_success() {
            return Err(upstream_error("fleet", response).await);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(json!({}));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl FleetApi for FleetEngineClient {
    async fn create_vehicle(&self, request: &CreateVehicle) -> Result<Value> {
        let url = format!("{}/deliveryVehicles", self.provider_url()?);
        debug!(vehicle_id = %request.vehicle_id, "Creating delivery vehicle");

        let body = json!({ "type": request.vehicle_type });

        self.execute(
            self.client
                .post(url)
                .query(&[("deliveryVehicleId", request.vehicle_id.as_str())])
                .json(&body),
        )
        .await
    }

    async fn update_location(&self, request: &UpdateLocation) -> Result<Value> {
        let url = format!("{}/deliveryVehicles/{}", self.provider_url()?, request.vehicle_id);
        debug!(vehicle_id = %request.vehicle_id, "Updating vehicle location");

        let mut last_location = json!({
            "location": lat_lng(request.latitude, request.longitude),
        });
        if let Some(heading) = request.heading {
            last_location["heading"] = json!(heading);
        }
        if let Some(speed) = request.speed {
            last_location["speed"] = json!(speed);
        }

        self.execute(
            self.client
                .patch(url)
                .query(&[("updateMask", "last_location")])
                .json(&json!({ "lastLocation": last_location })),
        )
        .await
    }

    async fn create_task(&self, request: &CreateTask) -> Result<Value> {
        let url = format!("{}/tasks", self.provider_url()?);
        let task_id = request
            .task_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        debug!(task_id = %task_id, tracking_id = %request.tracking_id, "Creating delivery task");

        let body = json!({
            "type": request.task_type,
            "state": "OPEN",
            "trackingId": request.tracking_id,
            "plannedLocation": { "point": lat_lng(request.latitude, request.longitude) },
            "taskDuration": format!("{}s", request.duration_seconds),
        });

        self.execute(
            self.client
                .post(url)
                .query(&[("taskId", task_id.as_str())])
                .json(&body),
        )
        .await
    }

    async fn assign_task(&self, request: &AssignTask) -> Result<Value> {
        let url = format!("{}/deliveryVehicles/{}", self.provider_url()?, request.vehicle_id);
        debug!(vehicle_id = %request.vehicle_id, task_id = %request.task_id, "Assigning task to vehicle");

        let body = json!({
            "remainingVehicleJourneySegments": [{
                "stop": {
                    "plannedLocation": { "point": lat_lng(request.latitude, request.longitude) },
                    "tasks": [{ "taskId": request.task_id }],
                    "state": "NEW",
                }
            }]
        });

        self.execute(
            self.client
                .patch(url)
                .query(&[("updateMask", "remaining_vehicle_journey_segments")])
                .json(&body),
        )
        .await
    }

    async fn generate_token(&self) -> Result<Value> {
        let token = self.tokens.access_token().await?;

        Ok(json!({
            "token": token.access_token,
            "expiresIn": token.expires_in,
            "tokenType": token.token_type.unwrap_or_else(|| "Bearer".to_string()),
        }))
    }
}
