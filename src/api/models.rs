//! API request and response models

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::backend::RowId;
use crate::service::{CreatedAccount, NotificationOutcome};

/// Shipping-company account creation request
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Company name
    #[serde(default, alias = "razao_social")]
    pub nome: Option<String>,

    /// Tax ID, formatted or digits only
    #[serde(default)]
    pub cnpj: Option<String>,

    /// Contact and login email
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub telefone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    pub success: bool,
    /// Id of the new `embarcadores` row
    #[schema(value_type = Object)]
    pub embarcador_id: RowId,
    pub user_id: String,
    pub email: String,
    /// Temporary password, also sent by email
    pub senha_temporaria: String,
    pub email_enviado: bool,
    pub message: String,
}

impl From<CreatedAccount> for CreateAccountResponse {
    fn from(account: CreatedAccount) -> Self {
        let message = if account.email_sent {
            "Embarcador criado com sucesso. Credenciais enviadas por email."
        } else {
            "Embarcador criado com sucesso, mas não foi possível enviar o email com as credenciais."
        };

        Self {
            success: true,
            embarcador_id: account.embarcador_id,
            user_id: account.user_id,
            email: account.email,
            senha_temporaria: account.password,
            email_enviado: account.email_sent,
            message: message.to_string(),
        }
    }
}

/// Fleet Engine proxy request
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct FleetRequest {
    /// One of `create_vehicle`, `update_location`, `create_task`,
    /// `assign_task`, `generate_token`
    #[serde(default)]
    pub action: Option<String>,

    /// Action-specific fields
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct FleetResponse {
    pub success: bool,
    /// Fleet Engine response body
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Status-change notification request
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct StatusNotificationRequest {
    /// Carga id, string or number
    #[serde(default)]
    #[schema(value_type = Object)]
    pub carga_id: Option<Value>,

    #[serde(default)]
    pub status: Option<String>,
}

impl StatusNotificationRequest {
    /// The carga id as used in row filters, if present
    pub fn carga_id(&self) -> Option<String> {
        match self.carga_id.as_ref()? {
            Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct StatusNotificationResponse {
    pub success: bool,
    #[serde(rename = "emailEnviado")]
    pub email_enviado: bool,
    /// Address notified, `null` when the embarcador has no email
    pub destinatario: Option<String>,
    pub status: String,
}

impl From<NotificationOutcome> for StatusNotificationResponse {
    fn from(outcome: NotificationOutcome) -> Self {
        Self {
            success: true,
            email_enviado: outcome.email_sent,
            destinatario: outcome.recipient,
            status: outcome.status,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body shared by every function
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
