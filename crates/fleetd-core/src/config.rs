use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
/// Opcode enqueued when a regime slot fires.
pub const DEFAULT_TRIGGER_OPCODE: &str = "turn_on";

/// Top-level config (fleetd.toml + FLEETD_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl FleetConfig {
    /// Load config with priority: explicit path > `FLEETD_CONFIG` env >
    /// `./fleetd.toml`. Env vars (`FLEETD_GATEWAY__PORT`, …, double
    /// underscore as the section separator) override file values; a
    /// missing file just yields defaults.
    pub fn load(path: Option<&str>) -> Result<Self, figment::Error> {
        let file = path
            .map(str::to_string)
            .or_else(|| std::env::var("FLEETD_CONFIG").ok())
            .unwrap_or_else(|| "fleetd.toml".to_string());

        Figment::new()
            .merge(Toml::file(&file))
            .merge(Env::prefixed("FLEETD_").split("__"))
            .extract()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Opcode the regime scheduler enqueues when a minute slot matches.
    #[serde(default = "default_trigger_opcode")]
    pub trigger_opcode: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trigger_opcode: default_trigger_opcode(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_path() -> String {
    "fleetd.db".to_string()
}

fn default_trigger_opcode() -> String {
    DEFAULT_TRIGGER_OPCODE.to_string()
}
