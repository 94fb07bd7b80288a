use std::{
    env,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use jsonschema::{JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resilience::AggregatorConfig;

pub const PORT_ENV_VAR: &str = "RESC_PORT";
const EMBEDDED_SCHEMA: &str = include_str!("../resc.schema.json");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub engine: AggregatorConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    5555
}

fn default_max_in_flight() -> usize {
    8
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_enabled_true() -> bool {
    true
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/resc")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen_host")]
    pub host: String,
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_listen_host(),
            port: default_listen_port(),
        }
    }
}

impl ListenConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_enabled_true")]
    pub file_enabled: bool,
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: true,
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config_value: Value = json5::from_str(&config_content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let schema = resolve_schema(config_base, &config_value)?;
        validate_against_schema(&config_value, &schema)?;

        let mut config: Config =
            serde_json::from_value(strip_schema_key(config_value)).context("failed to deserialize config")?;

        if !config.logging.dir.is_absolute() {
            config.logging.dir = config_base.join(&config.logging.dir);
        }

        Ok(config)
    }

    /// Loads `path` when given, else `./resc.jsonc` when present, else the
    /// built-in defaults. `RESC_PORT` is applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => {
                let default_path = PathBuf::from("./resc.jsonc");
                if default_path.exists() {
                    Self::load(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_port_override(env::var(PORT_ENV_VAR).ok().as_deref())?;
        Ok(config)
    }

    pub fn apply_port_override(&mut self, raw_port: Option<&str>) -> Result<()> {
        let Some(raw_port) = raw_port.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(());
        };

        self.listen.port = raw_port
            .parse()
            .with_context(|| format!("{PORT_ENV_VAR} must be a port number, got '{raw_port}'"))?;
        Ok(())
    }
}

fn strip_schema_key(mut config_value: Value) -> Value {
    if let Some(object) = config_value.as_object_mut() {
        object.remove("$schema");
    }
    config_value
}

fn resolve_schema(config_base: &Path, config_value: &Value) -> Result<Value> {
    let schema_path = if let Some(path_text) =
        config_value.get("$schema").and_then(|value| value.as_str())
    {
        let configured = PathBuf::from(path_text);
        Some(if configured.is_absolute() {
            configured
        } else {
            config_base.join(&configured)
        })
    } else {
        Some(config_base.join("resc.schema.json")).filter(|path| path.exists())
    };

    match schema_path {
        Some(schema_path) => {
            let schema_content = fs::read_to_string(&schema_path)
                .with_context(|| format!("failed to read schema {}", schema_path.display()))?;
            serde_json::from_str(&schema_content)
                .with_context(|| format!("failed to parse schema {}", schema_path.display()))
        }
        None => serde_json::from_str(EMBEDDED_SCHEMA).context("failed to parse embedded schema"),
    }
}

fn validate_against_schema(config_value: &Value, schema: &Value) -> Result<()> {
    let compiled =
        JSONSchema::compile(schema).map_err(|e| anyhow!("failed to compile schema: {e}"))?;

    match compiled.validate(config_value) {
        Ok(()) => Ok(()),
        Err(errors_iter) => {
            let validation_errors: Vec<ValidationError> = errors_iter.collect();
            let messages: Vec<String> = validation_errors
                .into_iter()
                .map(|error| error.to_string())
                .collect();
            Err(anyhow!("config validation failed: {}", messages.join("; ")))
        }
    }
}
