use std::env;
use std::path::PathBuf;
use std::str::FromStr;

// Top-level configuration container
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
}

// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
    pub cors_allow_origin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Uploaded files (movie posters)
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub root: PathBuf,
    pub url_prefix: String,
    pub max_upload_bytes: usize,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Invalid {
                name: "LOG_FORMAT",
                value: raw.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: var_or("HOST", "0.0.0.0"),
                port: parse_or("PORT", 8000)?,
                environment: var_or("ENVIRONMENT", "development"),
                rust_log: var_or("RUST_LOG", "cinema_booking=debug,tower_http=debug"),
                log_format: var_or("LOG_FORMAT", "pretty").parse()?,
                cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").ok().filter(|s| !s.is_empty()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
                pool_size: parse_or("DB_POOL_SIZE", 20)?,
            },
            media: MediaConfig {
                root: PathBuf::from(var_or("MEDIA_ROOT", "./media")),
                url_prefix: var_or("MEDIA_URL", "/media"),
                max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            },
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u32 = parse_or("CINEMA_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn log_format_is_case_insensitive() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!(matches!(
            "yaml".parse::<LogFormat>(),
            Err(ConfigError::Invalid { name: "LOG_FORMAT", .. })
        ));
    }

    #[test]
    fn parse_or_rejects_garbage() {
        env::set_var("CINEMA_TEST_BAD_NUMBER", "ten");
        let err = parse_or::<u16>("CINEMA_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CINEMA_TEST_BAD_NUMBER", .. }));
        env::remove_var("CINEMA_TEST_BAD_NUMBER");
    }
}
