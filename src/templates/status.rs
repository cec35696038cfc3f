//! Cargo status codes and the notification email for each

use super::{escape_html, layout, RenderedEmail};
use crate::backend::{Carga, Embarcador};
use crate::config::AppSettings;

/// Status of a carga as stored by the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CargoStatus {
    Pendente,
    Aceita,
    EmColeta,
    EmTransito,
    Entregue,
    Cancelada,
    Other(String),
}

impl CargoStatus {
    pub fn parse(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "pendente" => CargoStatus::Pendente,
            "aceita" => CargoStatus::Aceita,
            "em_coleta" => CargoStatus::EmColeta,
            "em_transito" => CargoStatus::EmTransito,
            "entregue" => CargoStatus::Entregue,
            "cancelada" => CargoStatus::Cancelada,
            _ => CargoStatus::Other(code.trim().to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            CargoStatus::Pendente => "pendente",
            CargoStatus::Aceita => "aceita",
            CargoStatus::EmColeta => "em_coleta",
            CargoStatus::EmTransito => "em_transito",
            CargoStatus::Entregue => "entregue",
            CargoStatus::Cancelada => "cancelada",
            CargoStatus::Other(code) => code,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            CargoStatus::Pendente => "Carga cadastrada",
            CargoStatus::Aceita => "Carga aceita",
            CargoStatus::EmColeta => "Coleta em andamento",
            CargoStatus::EmTransito => "Carga em trânsito",
            CargoStatus::Entregue => "Carga entregue",
            CargoStatus::Cancelada => "Carga cancelada",
            CargoStatus::Other(_) => "Atualização da carga",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CargoStatus::Pendente => {
                "Sua carga foi cadastrada e está aguardando um transportador.".to_string()
            }
            CargoStatus::Aceita => "Um transportador aceitou sua carga.".to_string(),
            CargoStatus::EmColeta => {
                "O transportador está a caminho para coletar sua carga.".to_string()
            }
            CargoStatus::EmTransito => {
                "Sua carga foi coletada e está em trânsito para o destino.".to_string()
            }
            CargoStatus::Entregue => "Sua carga foi entregue com sucesso.".to_string(),
            CargoStatus::Cancelada => "Sua carga foi cancelada.".to_string(),
            CargoStatus::Other(code) => {
                format!("O status da sua carga foi atualizado para: {}.", code)
            }
        }
    }
}

pub fn render_status_email(
    app: &AppSettings,
    carga: &Carga,
    embarcador: &Embarcador,
    status: &CargoStatus,
) -> RenderedEmail {
    let reference = carga
        .codigo
        .clone()
        .unwrap_or_else(|| format!("#{}", carga.id));

    let mut details = String::new();
    if let Some(origem) = &carga.origem {
        details.push_str(&format!("<tr><td><strong>Origem:</strong></td><td>{}</td></tr>", escape_html(origem)));
    }
    if let Some(destino) = &carga.destino {
        details.push_str(&format!("<tr><td><strong>Destino:</strong></td><td>{}</td></tr>", escape_html(destino)));
    }
    if let Some(descricao) = &carga.descricao {
        details.push_str(&format!("<tr><td><strong>Descrição:</strong></td><td>{}</td></tr>", escape_html(descricao)));
    }

    let greeting = match &embarcador.nome {
        Some(nome) => format!("<p>Olá, <strong>{}</strong>!</p>", escape_html(nome)),
        None => "<p>Olá!</p>".to_string(),
    };

    let content = format!(
        r#"{greeting}
<p>{message}</p>
<table role="presentation" cellspacing="0" cellpadding="8" style="background:#f3f4f6;border-radius:6px;margin:16px 0;">
  <tr><td><strong>Carga:</strong></td><td>{reference}</td></tr>
  <tr><td><strong>Status:</strong></td><td>{subject}</td></tr>
  {details}
</table>
<p>Acompanhe sua carga em tempo real na plataforma.</p>"#,
        greeting = greeting,
        message = escape_html(&status.message()),
        reference = escape_html(&reference),
        subject = status.subject(),
        details = details,
    );

    RenderedEmail {
        subject: format!("[{}] {}", app.name, status.subject()),
        html: layout(&app.name, &content),
    }
}
