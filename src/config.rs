use std::{env, path::PathBuf};

pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub port: u16,
    /// `None` disables the capacity check.
    pub quota_bytes: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/state.json"),
            port: 8080,
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = env::var("APP_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }

        if let Some(port) = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
        {
            config.port = port;
        }

        if let Some(quota) = env::var("APP_STORAGE_QUOTA_BYTES")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
        {
            config.quota_bytes = (quota > 0).then_some(quota);
        }

        config
    }
}
