//! Configuration management for the risk scoring service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "CREDITPATH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub artifacts: ArtifactsConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming assessment requests
    pub request_subject: String,
    /// Subject for results of requests that carry no reply subject
    pub result_subject: String,
    /// Subject answering model info queries
    pub info_subject: String,
    /// Subject answering health checks
    #[serde(default = "default_health_subject")]
    pub health_subject: String,
}

fn default_health_subject() -> String {
    "creditpath.health".to_string()
}

/// Trained artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory containing all artifact files
    pub dir: String,
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Name reported in logs and model info
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,
    #[serde(default = "default_feature_columns_file")]
    pub feature_columns_file: String,
    #[serde(default = "default_thresholds_file")]
    pub thresholds_file: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_model_file() -> String {
    "model.onnx".to_string()
}

fn default_model_name() -> String {
    "lightgbm".to_string()
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

fn default_feature_columns_file() -> String {
    "feature_columns.json".to_string()
}

fn default_thresholds_file() -> String {
    "thresholds.json".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

/// Request handling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Maximum number of requests processed concurrently
    pub workers: usize,
    /// Interval between metrics summaries in seconds
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `CREDITPATH_CONFIG` or the default path,
    /// with `CREDITPATH__SECTION__KEY` environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("CREDITPATH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.workers == 0 {
            anyhow::bail!("service.workers must be at least 1");
        }
        if self.artifacts.onnx_threads == 0 {
            anyhow::bail!("artifacts.onnx_threads must be at least 1");
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            anyhow::bail!("logging.format must be 'json' or 'pretty'");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "creditpath.assess".to_string(),
                result_subject: "creditpath.assessments".to_string(),
                info_subject: "creditpath.model_info".to_string(),
                health_subject: default_health_subject(),
            },
            artifacts: ArtifactsConfig {
                dir: "artifacts".to_string(),
                model_file: default_model_file(),
                model_name: default_model_name(),
                scaler_file: default_scaler_file(),
                feature_columns_file: default_feature_columns_file(),
                thresholds_file: default_thresholds_file(),
                onnx_threads: default_onnx_threads(),
            },
            service: ServiceConfig {
                workers: 4,
                metrics_interval_secs: default_metrics_interval(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
