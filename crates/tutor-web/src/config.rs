//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Public base URL, used for payment callbacks.
    pub app_url: String,
    /// Name of the session cookie set by the identity provider.
    pub session_cookie: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: "sqlite:tutor.db?mode=rwc".to_string(),
            app_url: "http://localhost:3000".to_string(),
            session_cookie: "tutor.session_token".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TUTOR_ADDR` | Server bind address | `127.0.0.1:3000` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:tutor.db?mode=rwc` |
    /// | `APP_URL` | Public base URL | `http://localhost:3000` |
    /// | `SESSION_COOKIE` | Session cookie name | `tutor.session_token` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let addr = match env::var("TUTOR_ADDR") {
            Ok(addr) => addr.parse().map_err(|_| ConfigError::InvalidAddr)?,
            Err(_) => defaults.addr,
        };

        let database_url = env::var("SQLITE_PATH").unwrap_or(defaults.database_url);

        let app_url = env::var("APP_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.app_url);

        let session_cookie = env::var("SESSION_COOKIE")
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.session_cookie);

        Ok(Self {
            addr,
            database_url,
            app_url,
            session_cookie,
        })
    }

    /// Where the payment gateway sends the browser after checkout.
    pub fn payment_callback_url(&self) -> String {
        format!("{}/payment/verify", self.app_url)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TUTOR_ADDR format")]
    InvalidAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.session_cookie, "tutor.session_token");
        assert_eq!(
            config.payment_callback_url(),
            "http://localhost:3000/payment/verify"
        );
    }

    #[test]
    fn test_from_env() {
        env::set_var("TUTOR_ADDR", "0.0.0.0:8080");
        env::set_var("APP_URL", "https://tutor.example.com/");
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(
            config.payment_callback_url(),
            "https://tutor.example.com/payment/verify"
        );

        env::set_var("TUTOR_ADDR", "not an address");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidAddr)));

        env::remove_var("TUTOR_ADDR");
        env::remove_var("APP_URL");
    }
}
