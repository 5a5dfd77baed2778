use std::env;

/// Startup configuration for the service. Built once in `main` from the
/// environment and injected into [`crate::AppState`]; there is no ambient
/// config singleton.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the external hosted store (data + auth planes).
    pub store_url: String,
    /// Privileged service key presented on every store call.
    pub service_key: String,
    pub port: u16,
    /// Forwarded to the auth service on password-reset requests so the
    /// emailed link lands back on the frontend.
    pub password_reset_redirect: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_url = required("SUPABASE_URL")?;
        let service_key = required("SUPABASE_SERVICE_KEY")?;
        let port = parse_port(env::var("PORT").ok())?;
        let password_reset_redirect =
            env::var("PASSWORD_RESET_REDIRECT_URL").ok().filter(|v| !v.is_empty());

        Ok(Self { store_url, service_key, port, password_reset_redirect })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn parse_port(raw: Option<String>) -> Result<u16, ConfigError> {
    match raw {
        None => Ok(3000),
        Some(value) if value.is_empty() => Ok(3000),
        Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidPort(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_to_3000() {
        assert_eq!(parse_port(None).unwrap(), 3000);
        assert_eq!(parse_port(Some(String::new())).unwrap(), 3000);
    }

    #[test]
    fn port_parses_explicit_value() {
        assert_eq!(parse_port(Some("8080".to_string())).unwrap(), 8080);
    }

    #[test]
    fn port_rejects_garbage() {
        assert!(matches!(
            parse_port(Some("not-a-port".to_string())),
            Err(ConfigError::InvalidPort(_))
        ));
    }
}
