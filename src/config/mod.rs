use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_token_lifetime_mins: i64,
    pub refresh_token_lifetime_hours: i64,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_LIFETIME_MINS") {
            self.security.access_token_lifetime_mins =
                v.parse().unwrap_or(self.security.access_token_lifetime_mins);
        }
        if let Ok(v) = env::var("JWT_REFRESH_LIFETIME_HOURS") {
            self.security.refresh_token_lifetime_hours =
                v.parse().unwrap_or(self.security.refresh_token_lifetime_hours);
        }
        if let Ok(v) = env::var("AUTH_ACCESS_COOKIE") {
            self.security.access_cookie_name = v;
        }
        if let Ok(v) = env::var("AUTH_REFRESH_COOKIE") {
            self.security.refresh_cookie_name = v;
        }
        if let Ok(v) = env::var("COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: "sqlite://bookshelf.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            security: SecurityConfig {
                // Overridden via JWT_SECRET; never ship the default.
                jwt_secret: "dev-insecure-secret-change-me".to_string(),
                access_token_lifetime_mins: 15,
                refresh_token_lifetime_hours: 24,
                access_cookie_name: "access".to_string(),
                refresh_cookie_name: "refresh".to_string(),
                cookie_secure: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: "sqlite://bookshelf.db?mode=rwc".to_string(),
                max_connections: 20,
            },
            security: SecurityConfig {
                jwt_secret: "dev-insecure-secret-change-me".to_string(),
                access_token_lifetime_mins: 15,
                refresh_token_lifetime_hours: 24,
                access_cookie_name: "access".to_string(),
                refresh_cookie_name: "refresh".to_string(),
                cookie_secure: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig {
                url: "sqlite://bookshelf.db?mode=rwc".to_string(),
                max_connections: 50,
            },
            security: SecurityConfig {
                jwt_secret: "dev-insecure-secret-change-me".to_string(),
                access_token_lifetime_mins: 15,
                refresh_token_lifetime_hours: 24,
                access_cookie_name: "access".to_string(),
                refresh_cookie_name: "refresh".to_string(),
                cookie_secure: true,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
