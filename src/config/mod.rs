use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub listings: ListingConfig,
    pub rate_limits: RateLimitSettings,
    pub security: SecurityConfig,
    pub geocoding: GeocodingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_page_limit: i64,
    pub max_page_limit: i64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Properties verified within this many days count as "fresh"
    pub staleness_window_days: i64,
}

/// Named rate-limit budgets per caller class. Automation keys get a
/// stricter budget than authenticated agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub agent_max_requests: u32,
    pub agent_window_secs: u64,
    pub automation_max_requests: u32,
    pub automation_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// Shared secret for validating identity-provider session JWTs
    pub session_jwt_secret: String,
    /// Server-side secret compared against the X-N8N-API-Key header
    pub automation_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    pub mapbox_token: Option<String>,
    pub mapbox_endpoint: String,
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
        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_PAGE_LIMIT") {
            self.api.default_page_limit = v.parse().unwrap_or(self.api.default_page_limit);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_LIMIT") {
            self.api.max_page_limit = v.parse().unwrap_or(self.api.max_page_limit);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Listing overrides
        if let Ok(v) = env::var("LISTING_STALENESS_WINDOW_DAYS") {
            self.listings.staleness_window_days =
                v.parse().unwrap_or(self.listings.staleness_window_days);
        }

        // Rate limit overrides
        if let Ok(v) = env::var("RATE_LIMIT_AGENT_REQUESTS") {
            self.rate_limits.agent_max_requests =
                v.parse().unwrap_or(self.rate_limits.agent_max_requests);
        }
        if let Ok(v) = env::var("RATE_LIMIT_AGENT_WINDOW_SECS") {
            self.rate_limits.agent_window_secs =
                v.parse().unwrap_or(self.rate_limits.agent_window_secs);
        }
        if let Ok(v) = env::var("RATE_LIMIT_AUTOMATION_REQUESTS") {
            self.rate_limits.automation_max_requests =
                v.parse().unwrap_or(self.rate_limits.automation_max_requests);
        }
        if let Ok(v) = env::var("RATE_LIMIT_AUTOMATION_WINDOW_SECS") {
            self.rate_limits.automation_window_secs =
                v.parse().unwrap_or(self.rate_limits.automation_window_secs);
        }

        // Security overrides (secrets only ever come from env)
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SESSION_JWT_SECRET") {
            self.security.session_jwt_secret = v;
        }
        if let Ok(v) = env::var("N8N_API_KEY") {
            self.security.automation_api_key = v;
        }

        // Geocoding overrides
        if let Ok(v) = env::var("MAPBOX_TOKEN") {
            if !v.is_empty() {
                self.geocoding.mapbox_token = Some(v);
            }
        }
        if let Ok(v) = env::var("MAPBOX_ENDPOINT") {
            self.geocoding.mapbox_endpoint = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                default_page_limit: 20,
                max_page_limit: 100,
                enable_request_logging: true,
            },
            listings: ListingConfig {
                staleness_window_days: 14,
            },
            rate_limits: RateLimitSettings {
                agent_max_requests: 1000,
                agent_window_secs: 60,
                automation_max_requests: 120,
                automation_window_secs: 60,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                session_jwt_secret: String::new(),
                automation_api_key: String::new(),
            },
            geocoding: GeocodingConfig {
                mapbox_token: None,
                mapbox_endpoint: "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                default_page_limit: 20,
                max_page_limit: 100,
                enable_request_logging: true,
            },
            listings: ListingConfig {
                staleness_window_days: 14,
            },
            rate_limits: RateLimitSettings {
                agent_max_requests: 300,
                agent_window_secs: 60,
                automation_max_requests: 60,
                automation_window_secs: 60,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                session_jwt_secret: String::new(),
                automation_api_key: String::new(),
            },
            geocoding: GeocodingConfig {
                mapbox_token: None,
                mapbox_endpoint: "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                default_page_limit: 20,
                max_page_limit: 50,
                enable_request_logging: false,
            },
            listings: ListingConfig {
                staleness_window_days: 14,
            },
            rate_limits: RateLimitSettings {
                agent_max_requests: 120,
                agent_window_secs: 60,
                automation_max_requests: 30,
                automation_window_secs: 60,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                session_jwt_secret: String::new(),
                automation_api_key: String::new(),
            },
            geocoding: GeocodingConfig {
                mapbox_token: None,
                mapbox_endpoint: "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.listings.staleness_window_days, 14);
        assert_eq!(config.api.max_page_limit, 100);
        assert!(config.security.session_jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.api.max_page_limit, 50);
        assert!(config.rate_limits.automation_max_requests < config.rate_limits.agent_max_requests);
    }
}
