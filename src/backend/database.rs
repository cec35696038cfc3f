//! Managed database / auth backend client
//!
//! Rows live in an externally owned PostgREST store; auth users are managed
//! through the auth admin API. Both are addressed with the service-role key.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Response,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::DatabaseSettings;
use crate::error::{AppError, Result};

/// Row identifier. Tables may key rows by integer or by UUID text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(id) => write!(f, "{}", id),
            RowId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// Shipping company row (`embarcadores`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embarcador {
    pub id: RowId,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewEmbarcador {
    pub nome: String,
    pub cnpj: String,
    pub email: String,
    pub telefone: Option<String>,
    pub ativo: bool,
}

/// Login user linked to a company (`usuarios`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id: RowId,
    #[serde(default)]
    pub embarcador_id: Option<RowId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUsuario {
    pub id: String,
    pub email: String,
    pub nome: String,
    pub embarcador_id: RowId,
    pub tipo: String,
}

/// Cargo row (`cargas`); columns not listed here are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carga {
    pub id: RowId,
    #[serde(default)]
    pub embarcador_id: Option<RowId>,
    #[serde(default)]
    pub codigo: Option<String>,
    #[serde(default)]
    pub origem: Option<String>,
    #[serde(default)]
    pub destino: Option<String>,
    #[serde(default)]
    pub descricao: Option<String>,
}

/// Auth user as returned by the admin API
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAuthUser {
    pub email: String,
    pub password: String,
    pub email_confirm: bool,
    pub user_metadata: serde_json::Value,
}

/// Data-access operations the edge functions need
#[async_trait]
pub trait Database: Send + Sync {
    async fn find_embarcador_by_cnpj(&self, cnpj: &str) -> Result<Option<Embarcador>>;

    async fn find_embarcador_by_email(&self, email: &str) -> Result<Option<Embarcador>>;

    async fn get_embarcador(&self, id: &RowId) -> Result<Option<Embarcador>>;

    async fn insert_embarcador(&self, embarcador: &NewEmbarcador) -> Result<Embarcador>;

    async fn delete_embarcador(&self, id: &RowId) -> Result<()>;

    async fn insert_usuario(&self, usuario: &NewUsuario) -> Result<Usuario>;

    async fn get_carga(&self, id: &str) -> Result<Option<Carga>>;

    async fn create_auth_user(&self, user: &NewAuthUser) -> Result<AuthUser>;

    async fn delete_auth_user(&self, id: &str) -> Result<()>;
}

/// PostgREST + auth admin client
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(settings: &DatabaseSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            service_role_key: settings.service_role_key.clone(),
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Ok(value) = HeaderValue::from_str(&self.service_role_key) {
            headers.insert(HeaderName::from_static("apikey"), value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.service_role_key)) {
            headers.insert(AUTHORIZATION, value);
        }

        headers
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn admin_users_url(&self) -> String {
        format!("{}/auth/v1/admin/users", self.base_url)
    }

    /// First row matching a PostgREST filter such as `eq.42`
    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        column: &str,
        filter: String,
    ) -> Result<Option<T>> {
        debug!(table = %table, column = %column, "Selecting row");

        let response = self
            .client
            .get(self.rest_url(table))
            .headers(self.headers())
            .query(&[
                (column, filter),
                ("select", "*".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("database", response).await);
        }

        let rows: Vec<T> = response.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> Result<T> {
        debug!(table = %table, "Inserting row");

        let response = self
            .client
            .post(self.rest_url(table))
            .headers(self.headers())
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("database", response).await);
        }

        let rows: Vec<T> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::upstream("database", format!("insert into {} returned no rows", table)))
    }

    async fn delete_by_id(&self, table: &str, id: &RowId) -> Result<()> {
        debug!(table = %table, id = %id, "Deleting row");

        let response = self
            .client
            .delete(self.rest_url(table))
            .headers(self.headers())
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("database", response).await);
        }

        Ok(())
    }
}

#[async_trait]
impl Database for SupabaseClient {
    async fn find_embarcador_by_cnpj(&self, cnpj: &str) -> Result<Option<Embarcador>> {
        self.select_one("embarcadores", "cnpj", format!("eq.{}", cnpj)).await
    }

    async fn find_embarcador_by_email(&self, email: &str) -> Result<Option<Embarcador>> {
        self.select_one("embarcadores", "email", email_filter(email)).await
    }

    async fn get_embarcador(&self, id: &RowId) -> Result<Option<Embarcador>> {
        self.select_one("embarcadores", "id", format!("eq.{}", id)).await
    }

    async fn insert_embarcador(&self, embarcador: &NewEmbarcador) -> Result<Embarcador> {
        self.insert("embarcadores", embarcador).await
    }

    async fn delete_embarcador(&self, id: &RowId) -> Result<()> {
        self.delete_by_id("embarcadores", id).await
    }

    async fn insert_usuario(&self, usuario: &NewUsuario) -> Result<Usuario> {
        self.insert("usuarios", usuario).await
    }

    async fn get_carga(&self, id: &str) -> Result<Option<Carga>> {
        self.select_one("cargas", "id", format!("eq.{}", id)).await
    }

    async fn create_auth_user(&self, user: &NewAuthUser) -> Result<AuthUser> {
        let response = self
            .client
            .post(self.admin_users_url())
            .headers(self.headers())
            .json(user)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("auth", response).await);
        }

        Ok(response.json().await?)
    }

    async fn delete_auth_user(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{}", self.admin_users_url(), id))
            .headers(self.headers())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(upstream_error("auth", response).await);
        }

        Ok(())
    }
}

/// Case-insensitive match on an email column.
///
/// `ilike` treats `%` and `_` as wildcards, so they are escaped. PostgREST also
/// reads `*` as `%` with no escape, so such addresses fall back to `eq`.
fn email_filter(email: &str) -> String {
    if email.contains('*') {
        return format!("eq.{}", email);
    }

    let mut pattern = String::with_capacity(email.len());
    for c in email.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }

    format!("ilike.{}", pattern)
}

/// Turn a non-2xx response into an [`AppError::Upstream`] carrying the provider's message
pub(crate) async fn upstream_error(service: &'static str, response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = extract_error_message(&body)
        .unwrap_or_else(|| format!("{} returned {}: {}", service, status, body.trim()));

    AppError::upstream(service, message)
}

/// Pull the human-readable message out of the error bodies the providers return
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    for key in ["msg", "message", "error_description"] {
        if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
            return Some(text.to_string());
        }
    }

    match value.get("error") {
        Some(serde_json::Value::String(text)) => Some(text.clone()),
        Some(serde_json::Value::Object(inner)) => inner
            .get("message")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}
