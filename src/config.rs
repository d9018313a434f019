//! Configuration for habitus
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// habitus - habit tracking API
#[derive(Parser, Debug, Clone)]
#[command(name = "habitus")]
#[command(about = "Ownership-scoped habit CRUD API over MongoDB")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "habitus")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (insecure JWT fallback, MongoDB optional)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> String {
        if self.dev_mode {
            self.jwt_secret
                .clone()
                .unwrap_or_else(|| "dev-only-insecure-secret".to_string())
        } else {
            self.jwt_secret
                .clone()
                .expect("JWT_SECRET is required in production mode")
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        if let Some(ref secret) = self.jwt_secret {
            if secret.len() < 16 {
                return Err("JWT_SECRET must be at least 16 characters".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            node_id: Uuid::new_v4(),
            listen: "127.0.0.1:8080".parse().unwrap(),
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_db: "habitus".to_string(),
            jwt_secret: None,
            jwt_expiry_seconds: 86400,
            dev_mode: false,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn production_requires_jwt_secret() {
        let args = base_args();
        assert!(args.validate().is_err());
    }

    #[test]
    fn dev_mode_allows_missing_secret() {
        let mut args = base_args();
        args.dev_mode = true;
        assert!(args.validate().is_ok());
        assert_eq!(args.jwt_secret(), "dev-only-insecure-secret");
    }

    #[test]
    fn short_secret_rejected() {
        let mut args = base_args();
        args.jwt_secret = Some("short".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn explicit_secret_accepted() {
        let mut args = base_args();
        args.jwt_secret = Some("a-long-enough-signing-secret".to_string());
        assert!(args.validate().is_ok());
        assert_eq!(args.jwt_secret(), "a-long-enough-signing-secret");
    }
}
