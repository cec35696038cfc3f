//! Company account creation
//!
//! Creates the auth user, the `embarcadores` row and the `usuarios` link,
//! then emails the temporary credentials. When a later step fails the rows
//! created by earlier steps are deleted on a best-effort basis; failures of
//! those deletes are only logged.

use serde_json::json;
use tracing::{info, warn};

use crate::backend::{Database, NewAuthUser, NewEmbarcador, NewUsuario, OutgoingEmail, RowId};
use crate::error::{AppError, Result};
use crate::service::password::generate_password;
use crate::templates::render_welcome_email;
use crate::AppState;

pub const DUPLICATE_CNPJ: &str = "Já existe um embarcador cadastrado com este CNPJ";
pub const DUPLICATE_EMAIL: &str = "Já existe um embarcador cadastrado com este email";

/// Validated and normalized account input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub nome: String,
    /// Digits only
    pub cnpj: String,
    /// Lowercase
    pub email: String,
    pub telefone: Option<String>,
}

impl NewAccount {
    pub fn parse(
        nome: Option<&str>,
        cnpj: Option<&str>,
        email: Option<&str>,
        telefone: Option<&str>,
    ) -> Result<Self> {
        let nome = non_blank(nome);
        let cnpj = non_blank(cnpj);
        let email = non_blank(email);

        let (nome, cnpj, email) = match (nome, cnpj, email) {
            (Some(nome), Some(cnpj), Some(email)) => (nome, cnpj, email),
            (nome, cnpj, email) => {
                let missing: Vec<&str> = [("nome", nome), ("cnpj", cnpj), ("email", email)]
                    .into_iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(field, _)| field)
                    .collect();

                return Err(AppError::invalid(format!(
                    "Campos obrigatórios ausentes: {}",
                    missing.join(", ")
                )));
            }
        };

        let cnpj = normalize_cnpj(cnpj);
        if cnpj.len() != 14 {
            return Err(AppError::invalid("CNPJ inválido"));
        }

        let email = email.to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::invalid("Email inválido"));
        }

        Ok(Self {
            nome: nome.to_string(),
            cnpj,
            email,
            telefone: non_blank(telefone).map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Strip punctuation from a formatted CNPJ (`12.345.678/0001-90`)
pub fn normalize_cnpj(cnpj: &str) -> String {
    cnpj.chars().filter(char::is_ascii_digit).collect()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// What the caller gets back
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    pub embarcador_id: RowId,
    pub user_id: String,
    pub email: String,
    pub password: String,
    pub email_sent: bool,
}

pub async fn create_account(state: &AppState, account: NewAccount) -> Result<CreatedAccount> {
    let db = state.database.as_ref();

    if db.find_embarcador_by_cnpj(&account.cnpj).await?.is_some() {
        return Err(AppError::invalid(DUPLICATE_CNPJ));
    }
    if db.find_embarcador_by_email(&account.email).await?.is_some() {
        return Err(AppError::invalid(DUPLICATE_EMAIL));
    }

    let password = generate_password();

    let auth_user = db
        .create_auth_user(&NewAuthUser {
            email: account.email.clone(),
            password: password.clone(),
            email_confirm: true,
            user_metadata: json!({ "nome": account.nome, "tipo": "embarcador" }),
        })
        .await
        .map_err(|e| match e {
            AppError::Upstream { message, .. } => {
                AppError::invalid(format!("Erro ao criar usuário: {}", message))
            }
            other => other,
        })?;

    info!(user_id = %auth_user.id, "Auth user created");

    let embarcador = match db
        .insert_embarcador(&NewEmbarcador {
            nome: account.nome.clone(),
            cnpj: account.cnpj.clone(),
            email: account.email.clone(),
            telefone: account.telefone.clone(),
            ativo: true,
        })
        .await
    {
        Ok(embarcador) => embarcador,
        Err(e) => {
            rollback_auth_user(db, &auth_user.id).await;
            return Err(AppError::Operation(format!("Erro ao criar embarcador: {}", e.detail())));
        }
    };

    info!(embarcador_id = %embarcador.id, "Embarcador created");

    let link = NewUsuario {
        id: auth_user.id.clone(),
        email: account.email.clone(),
        nome: account.nome.clone(),
        embarcador_id: embarcador.id.clone(),
        tipo: "embarcador".to_string(),
    };

    if let Err(e) = db.insert_usuario(&link).await {
        rollback_embarcador(db, &embarcador.id).await;
        rollback_auth_user(db, &auth_user.id).await;
        return Err(AppError::Operation(format!("Erro ao vincular usuário: {}", e.detail())));
    }

    let email_sent = send_credentials(state, &account, &password).await;

    Ok(CreatedAccount {
        embarcador_id: embarcador.id,
        user_id: auth_user.id,
        email: account.email,
        password,
        email_sent,
    })
}

async fn send_credentials(state: &AppState, account: &NewAccount, password: &str) -> bool {
    let rendered = render_welcome_email(&state.settings.app, &account.nome, &account.email, password);

    let email = OutgoingEmail {
        to: account.email.clone(),
        subject: rendered.subject,
        html: rendered.html,
    };

    match state.mailer.send(&email).await {
        Ok(receipt) => {
            info!(email_id = ?receipt.id, "Welcome email sent");
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to send welcome email");
            false
        }
    }
}

async fn rollback_auth_user(db: &dyn Database, user_id: &str) {
    match db.delete_auth_user(user_id).await {
        Ok(()) => info!(user_id = %user_id, "Rolled back auth user"),
        Err(e) => warn!(user_id = %user_id, error = %e, "Failed to roll back auth user"),
    }
}

async fn rollback_embarcador(db: &dyn Database, id: &RowId) {
    match db.delete_embarcador(id).await {
        Ok(()) => info!(embarcador_id = %id, "Rolled back embarcador"),
        Err(e) => warn!(embarcador_id = %id, error = %e, "Failed to roll back embarcador"),
    }
}
