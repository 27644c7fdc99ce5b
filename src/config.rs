// Process configuration read from the environment
use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};

pub const MODEL_FILE: &str = "insurance_premium_model.json";
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const LOG_FILE: &str = "app.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub artifact_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Return raw error text in 500 bodies instead of a generic message.
    pub expose_error_details: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            artifact_dir: PathBuf::from("saved_models"),
            log_dir: PathBuf::from("logs"),
            expose_error_details: true,
        }
    }
}

impl Config {
    /// Reads `PORT`, `ARTIFACT_DIR`, `LOG_DIR` and `EXPOSE_ERROR_DETAILS`,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?;
        }
        if let Some(dir) = lookup("ARTIFACT_DIR") {
            config.artifact_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("EXPOSE_ERROR_DETAILS") {
            config.expose_error_details = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => bail!("EXPOSE_ERROR_DETAILS must be true or false, got {flag:?}"),
            };
        }
        Ok(config)
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifact_dir.join(MODEL_FILE)
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.artifact_dir.join(PREPROCESSOR_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE)
    }
}
