use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};

/// Where to listen and where the startup artifacts live.
///
/// Resolution order: built-in defaults, then the optional JSON file named by
/// `CONFIG_PATH`, then individual environment variables.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub temp_model_path: PathBuf,
    pub temp_meta_path: PathBuf,
    pub population_path: PathBuf,
    pub death_rate_path: PathBuf,
    pub env_bundle_path: PathBuf,
    pub econ_bundle_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
            temp_model_path: "models/temperature_model.json".into(),
            temp_meta_path: "models/temperature_model_info.json".into(),
            population_path: "data/population.json".into(),
            death_rate_path: "data/death_rate_predictions.json".into(),
            env_bundle_path: "models/environmental_model.json".into(),
            econ_bundle_path: "models/economic_model.json".into(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = match var("CONFIG_PATH") {
            Some(p) => Self::load(Path::new(&p))?,
            None => Self::default(),
        };

        if let Some(v) = var("BIND_ADDR") {
            cfg.bind_addr = v.parse().with_context(|| format!("invalid BIND_ADDR '{}'", v))?;
        }
        if let Some(v) = var("PORT") {
            cfg.port = v.parse().with_context(|| format!("invalid PORT '{}'", v))?;
        }
        let paths: [(&str, &mut PathBuf); 6] = [
            ("TEMP_MODEL_PATH", &mut cfg.temp_model_path),
            ("TEMP_META_PATH", &mut cfg.temp_meta_path),
            ("POPULATION_PATH", &mut cfg.population_path),
            ("DEATH_RATE_PATH", &mut cfg.death_rate_path),
            ("ENV_BUNDLE_PATH", &mut cfg.env_bundle_path),
            ("ECON_BUNDLE_PATH", &mut cfg.econ_bundle_path),
        ];
        for (key, slot) in paths {
            if let Some(v) = var(key) {
                *slot = PathBuf::from(v);
            }
        }
        Ok(cfg)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
