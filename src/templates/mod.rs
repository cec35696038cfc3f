//! HTML email bodies

pub mod status;
pub mod welcome;

pub use status::{render_status_email, CargoStatus};
pub use welcome::render_welcome_email;

/// Subject and HTML body ready to hand to a mailer
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Escape text for interpolation into HTML
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Shared outer layout
fn layout(app_name: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head><meta charset="utf-8"><title>{app}</title></head>
<body style="margin:0;padding:0;background:#f4f6f8;font-family:Arial,Helvetica,sans-serif;color:#1f2937;">
  <table role="presentation" width="100%" cellspacing="0" cellpadding="0">
    <tr><td align="center" style="padding:24px;">
      <table role="presentation" width="600" cellspacing="0" cellpadding="0" style="background:#ffffff;border-radius:8px;">
        <tr><td style="background:#1e3a8a;color:#ffffff;padding:20px 24px;border-radius:8px 8px 0 0;font-size:20px;font-weight:bold;">{app}</td></tr>
        <tr><td style="padding:24px;font-size:15px;line-height:1.5;">{content}</td></tr>
        <tr><td style="padding:16px 24px;font-size:12px;color:#6b7280;">Este é um email automático, não responda.</td></tr>
      </table>
    </td></tr>
  </table>
</body>
</html>"#,
        app = escape_html(app_name),
        content = content,
    )
}
