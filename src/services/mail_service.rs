use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use tracing::info;

use crate::config::{MailConfig, SmtpConfig};

/// Sends transactional mail (password resets). Without SMTP settings the
/// message is logged instead, which is what local development relies on.
#[derive(Clone, Debug)]
pub struct Mailer {
    smtp: Option<SmtpConfig>,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            smtp: config.smtp.clone(),
        }
    }

    pub fn log_only() -> Self {
        Self { smtp: None }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let Some(smtp) = self.smtp.clone() else {
            info!(to = %to, subject = %subject, "SMTP not configured, mail body follows:\n{}", body);
            return Ok(());
        };

        let message = Message::builder()
            .from(smtp.from.parse::<Mailbox>().context("Invalid SMTP_FROM address")?)
            .to(to.parse::<Mailbox>().context("Invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("Failed to build email")?;

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut builder = SmtpTransport::starttls_relay(&smtp.host)
                .context("Failed to create SMTP transport")?
                .port(smtp.port);
            if let (Some(username), Some(password)) = (smtp.username, smtp.password) {
                builder = builder.credentials(Credentials::new(username, password));
            }
            builder.build().send(&message).context("Failed to send email")?;
            Ok(())
        })
        .await
        .context("Mail task panicked")??;

        info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

pub fn password_reset_body(name: &str, link: &str) -> String {
    format!(
        "Cześć {name},\n\n\
         otrzymaliśmy prośbę o zresetowanie hasła do Twojego Dziennika Treningowego.\n\
         Aby ustawić nowe hasło, otwórz link (ważny przez 1 godzinę):\n\n{link}\n\n\
         Jeśli to nie Ty, zignoruj tę wiadomość.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_only_mailer_succeeds() {
        let mailer = Mailer::log_only();
        let body = password_reset_body("Ania", "http://localhost:3000/reset-password?token=abc");

        assert!(body.contains("token=abc"));
        assert!(mailer.send("ania@example.com", "Reset hasła", &body).await.is_ok());
    }
}
