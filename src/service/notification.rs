//! Status-change notifications for a carga's embarcador

use tracing::info;

use crate::backend::OutgoingEmail;
use crate::error::{AppError, Result};
use crate::templates::{render_status_email, CargoStatus};
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOutcome {
    pub email_sent: bool,
    /// `None` when the embarcador has no email on file
    pub recipient: Option<String>,
    pub status: String,
}

pub async fn notify_status_change(
    state: &AppState,
    carga_id: &str,
    status: &str,
) -> Result<NotificationOutcome> {
    let db = state.database.as_ref();

    let carga = db
        .get_carga(carga_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Carga não encontrada".to_string()))?;

    let embarcador = match &carga.embarcador_id {
        Some(id) => db.get_embarcador(id).await?,
        None => None,
    }
    .ok_or_else(|| AppError::NotFound("Embarcador não encontrado".to_string()))?;

    let recipient = match embarcador.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => {
            info!(carga_id = %carga_id, embarcador_id = %embarcador.id, "Embarcador has no email, skipping notification");
            return Ok(NotificationOutcome {
                email_sent: false,
                recipient: None,
                status: status.to_string(),
            });
        }
    };

    let parsed = CargoStatus::parse(status);
    let rendered = render_status_email(&state.settings.app, &carga, &embarcador, &parsed);

    let receipt = state
        .mailer
        .send(&OutgoingEmail {
            to: recipient.clone(),
            subject: rendered.subject,
            html: rendered.html,
        })
        .await?;

    info!(carga_id = %carga_id, status = %parsed.code(), email_id = ?receipt.id, "Status notification sent");

    Ok(NotificationOutcome {
        email_sent: true,
        recipient: Some(recipient),
        status: status.to_string(),
    })
}
