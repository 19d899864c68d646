//! HTTP server configuration

use anyhow::Result;

/// Listener and CORS settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// The single browser origin allowed to call the API
    pub cors_origin: String,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `PORT`: listen port (default: 8080)
    /// - `CORS_ORIGIN`: allowed origin (default: "http://localhost:4200")
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid port number, got {}", port))?,
            Err(_) => 8080,
        };

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:4200".to_string());

        Ok(ServerConfig { port, cors_origin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        unsafe {
            std::env::remove_var("PORT");
            std::env::remove_var("CORS_ORIGIN");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origin, "http://localhost:4200");
    }

    #[test]
    #[serial]
    fn test_invalid_port() {
        unsafe {
            std::env::set_var("PORT", "eighty");
        }
        assert!(ServerConfig::from_env().is_err());

        unsafe {
            std::env::set_var("PORT", "9090");
        }
        assert_eq!(ServerConfig::from_env().unwrap().port, 9090);

        unsafe {
            std::env::remove_var("PORT");
        }
    }
}
