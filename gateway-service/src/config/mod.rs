use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub jwt: JwtConfig,
    pub policy: PolicyConfig,
    pub downstream: DownstreamConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

/// Signing material for the two token kinds.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: Secret<String>,
    pub refresh_secret: Secret<String>,
    pub access_token_expiry_hours: i64,
    pub refresh_token_expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Casbin-style CSV of `p, role, path, method` rules.
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownstreamConfig {
    pub user_service_url: String,
    pub product_service_url: String,
    pub company_service_url: String,
    pub debt_service_url: String,
    /// Ceiling for the per-request deadline.
    pub timeout_seconds: u64,
}

impl DownstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = GatewayConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("gateway-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            jwt: JwtConfig {
                access_secret: Secret::new(get_env(
                    "JWT_ACCESS_SECRET",
                    Some("dev-access-secret-change-me"),
                    is_prod,
                )?),
                refresh_secret: Secret::new(get_env(
                    "JWT_REFRESH_SECRET",
                    Some("dev-refresh-secret-change-me"),
                    is_prod,
                )?),
                access_token_expiry_hours: parse_env(
                    "JWT_ACCESS_TOKEN_EXPIRY_HOURS",
                    "24",
                    is_prod,
                )?,
                refresh_token_expiry_hours: parse_env(
                    "JWT_REFRESH_TOKEN_EXPIRY_HOURS",
                    "720",
                    is_prod,
                )?,
            },
            policy: PolicyConfig {
                file: get_env("POLICY_FILE", Some("config/policy.csv"), is_prod)?,
            },
            downstream: DownstreamConfig {
                user_service_url: get_env(
                    "USER_SERVICE_URL",
                    Some("http://localhost:50051"),
                    is_prod,
                )?,
                product_service_url: get_env(
                    "PRODUCT_SERVICE_URL",
                    Some("http://localhost:50052"),
                    is_prod,
                )?,
                company_service_url: get_env(
                    "COMPANY_SERVICE_URL",
                    Some("http://localhost:50053"),
                    is_prod,
                )?,
                debt_service_url: get_env(
                    "DEBT_SERVICE_URL",
                    Some("http://localhost:50054"),
                    is_prod,
                )?,
                timeout_seconds: parse_env("DOWNSTREAM_TIMEOUT_SECONDS", "30", false)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("*"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.jwt.access_token_expiry_hours <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_TOKEN_EXPIRY_HOURS must be positive"
            )));
        }

        if self.jwt.refresh_token_expiry_hours < self.jwt.access_token_expiry_hours {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_REFRESH_TOKEN_EXPIRY_HOURS must not be shorter than the access token expiry"
            )));
        }

        let access = self.jwt.access_secret.expose_secret();
        let refresh = self.jwt.refresh_secret.expose_secret();
        if access.is_empty() || refresh.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT secrets must not be empty"
            )));
        }
        if access == refresh {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ"
            )));
        }

        if self.downstream.timeout_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DOWNSTREAM_TIMEOUT_SECONDS must be positive"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            common: core_config::Config::default(),
            environment: Environment::Dev,
            service_name: "gateway-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            jwt: JwtConfig {
                access_secret: Secret::new("access".to_string()),
                refresh_secret: Secret::new("refresh".to_string()),
                access_token_expiry_hours: 24,
                refresh_token_expiry_hours: 720,
            },
            policy: PolicyConfig {
                file: "config/policy.csv".to_string(),
            },
            downstream: DownstreamConfig {
                user_service_url: "http://localhost:50051".to_string(),
                product_service_url: "http://localhost:50052".to_string(),
                company_service_url: "http://localhost:50053".to_string(),
                debt_service_url: "http://localhost:50054".to_string(),
                timeout_seconds: 30,
            },
            security: SecurityConfig {
                allowed_origins: vec!["*".to_string()],
            },
        }
    }

    #[test]
    fn dev_defaults_are_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn identical_secrets_are_rejected() {
        let mut config = config();
        config.jwt.refresh_secret = Secret::new("access".to_string());
        assert!(matches!(config.validate(), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn refresh_ttl_shorter_than_access_is_rejected() {
        let mut config = config();
        config.jwt.refresh_token_expiry_hours = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_access_ttl_is_rejected() {
        let mut config = config();
        config.jwt.access_token_expiry_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn wildcard_cors_is_rejected_in_prod() {
        let mut config = config();
        config.environment = Environment::Prod;
        assert!(config.validate().is_err());

        config.security.allowed_origins = vec!["https://crm.example.com".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn environment_parses_case_insensitively() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert!("staging".parse::<Environment>().is_err());
    }
}
