use super::{env_or, env_string, ConfigError};

pub const DEFAULT_JWT_SECRET: &str = "dziennik-dev-secret-change-in-production";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub public_url: String,
    /// Read client addresses from `X-Forwarded-For` (set when running behind a reverse proxy).
    pub trust_proxy: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = AppConfig {
            host: env_string("HOST", "0.0.0.0"),
            port: env_or("PORT", 3000)?,
            environment: env_string("ENVIRONMENT", "development"),
            log_level: env_string("LOG_LEVEL", "info"),
            jwt_secret: env_string("JWT_SECRET", DEFAULT_JWT_SECRET),
            session_ttl_hours: env_or("SESSION_TTL_HOURS", 24 * 7)?,
            public_url: env_string("PUBLIC_URL", "http://localhost:3000"),
            trust_proxy: env_or("TRUST_PROXY", false)?,
        };

        if config.is_production() && config.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::MissingInProduction("JWT_SECRET"));
        }
        if config.session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_TTL_HOURS".to_string(),
                value: config.session_ttl_hours.to_string(),
            });
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Session cookies are only marked `Secure` when served over https.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_ttl_hours: 24 * 7,
            public_url: "http://localhost:3000".to_string(),
            trust_proxy: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_address() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:3000");
        assert!(!config.is_production());
        assert!(!config.secure_cookies());
        assert!(!config.trust_proxy);
    }
}

