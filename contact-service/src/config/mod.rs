use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct ContactConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub cors: CorsConfig,
    /// When set, traces are exported over OTLP in addition to JSON logs.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
    pub collection: String,
    pub server_selection_timeout_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Empty disables the CORS layer entirely.
    pub allowed_origins: Vec<String>,
}

impl ContactConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Outside `ENVIRONMENT=prod` the
    /// documented defaults fill any gaps; in prod every key must be present.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let get = |key: &str, default: Option<&str>| get_var(&lookup, key, default, is_prod);

        let server_selection_timeout_ms = get("MONGODB_SERVER_SELECTION_TIMEOUT_MS", Some("5000"))?
            .parse()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "MONGODB_SERVER_SELECTION_TIMEOUT_MS must be a number of milliseconds: {}",
                    e
                ))
            })?;

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(ContactConfig {
            common,
            mongodb: MongoConfig {
                uri: Secret::new(get("MONGODB_URI", None)?),
                database: get("MONGODB_DATABASE", Some("contact_db"))?,
                collection: get("MONGODB_COLLECTION", Some("messages"))?,
                server_selection_timeout_ms,
            },
            cors: CorsConfig { allowed_origins },
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|e| !e.is_empty()),
        })
    }
}

fn get_var<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
