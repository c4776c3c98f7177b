use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Hospital Management System";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DATABASE_FILE: &str = "hospital.db";

/// Sessions idle longer than this are discarded: 2 hours.
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 7200;

pub const ENV_DATA_DIR: &str = "HMS_DATA_DIR";
pub const ENV_DATABASE: &str = "HMS_DATABASE";
pub const ENV_BIND: &str = "HMS_BIND";
pub const ENV_SESSION_TIMEOUT: &str = "HMS_SESSION_TIMEOUT_SECS";

/// Tracing filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "hms_lib=info,hms=info,hms_db=info,tower_http=warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration, resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub session_idle_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let database_path = lookup(ENV_DATABASE)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DATABASE_FILE));

        let bind_raw = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: ENV_BIND,
            value: bind_raw.clone(),
        })?;

        let session_idle_timeout = match lookup(ENV_SESSION_TIMEOUT) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_SESSION_TIMEOUT,
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(SESSION_IDLE_TIMEOUT_SECS),
        };

        Ok(Self {
            database_path,
            bind_addr,
            session_idle_timeout,
        })
    }
}

/// Get the application data directory
/// ~/HospitalMS/ unless overridden; ./instance when no home is known.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("HospitalMS"))
        .unwrap_or_else(|| PathBuf::from("instance"))
}
