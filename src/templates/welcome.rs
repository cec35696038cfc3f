//! Credentials email sent after an account is created

use super::{escape_html, layout, RenderedEmail};
use crate::config::AppSettings;

pub fn render_welcome_email(app: &AppSettings, company: &str, email: &str, password: &str) -> RenderedEmail {
    let content = format!(
        r#"<p>Olá, <strong>{company}</strong>!</p>
<p>Sua conta de embarcador foi criada. Use os dados abaixo para acessar a plataforma:</p>
<table role="presentation" cellspacing="0" cellpadding="8" style="background:#f3f4f6;border-radius:6px;margin:16px 0;">
  <tr><td><strong>Email:</strong></td><td>{email}</td></tr>
  <tr><td><strong>Senha temporária:</strong></td><td style="font-family:monospace;font-size:16px;">{password}</td></tr>
</table>
<p><a href="{login_url}" style="display:inline-block;background:#1e3a8a;color:#ffffff;padding:10px 18px;border-radius:6px;text-decoration:none;">Acessar a plataforma</a></p>
<p>Por segurança, altere sua senha no primeiro acesso.</p>"#,
        company = escape_html(company),
        email = escape_html(email),
        password = escape_html(password),
        login_url = escape_html(&app.login_url),
    );

    RenderedEmail {
        subject: format!("Bem-vindo ao {} - Seus dados de acesso", app.name),
        html: layout(&app.name, &content),
    }
}
