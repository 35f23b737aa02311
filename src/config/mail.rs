use super::{env_optional, env_or, env_string, ConfigError};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Outgoing mail settings. Without `SMTP_HOST` messages are written to the log.
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    pub smtp: Option<SmtpConfig>,
}

impl MailConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let Some(host) = env_optional("SMTP_HOST") else {
            return Ok(Self { smtp: None });
        };

        Ok(Self {
            smtp: Some(SmtpConfig {
                host,
                port: env_or("SMTP_PORT", 587)?,
                username: env_optional("SMTP_USERNAME"),
                password: env_optional("SMTP_PASSWORD"),
                from: env_string("SMTP_FROM", "Dziennik Treningowy <no-reply@localhost>"),
            }),
        })
    }
}
