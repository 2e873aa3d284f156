// Reading and writing alignment configuration files, and merging them with
// the options given on the command line.

use std::io::Write;

use crate::align::config::AlignConfig;
use crate::align::AlignError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unable to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unable to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Invalid(#[from] AlignError),
}

/// Options given explicitly on the command line. `None` keeps the base value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub steps: Option<usize>,
    pub learning_rate: Option<f64>,
    pub weight_decay: Option<f64>,
    pub epsilon: Option<f64>,
    /// Sharpness of the transport; epsilon = 1 / gamma
    pub gamma: Option<f64>,
    pub sinkhorn_iterations: Option<usize>,
    pub d0: Option<f64>,
    pub cutoff: Option<f64>,
    pub no_cutoff: bool,
    pub steepness: Option<f64>,
    pub seed: Option<u64>,
    pub init_noise: Option<f64>,
    pub patience: Option<usize>,
    pub tolerance: Option<f64>,
    pub max_residues: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(&self, base: AlignConfig) -> AlignConfig {
        let mut config = base;
        if let Some(v) = self.steps { config.steps = v; }
        if let Some(v) = self.learning_rate { config.learning_rate = v; }
        if let Some(v) = self.weight_decay { config.weight_decay = v; }
        if let Some(v) = self.gamma { config.epsilon = 1.0 / v; }
        // An explicit epsilon wins over gamma
        if let Some(v) = self.epsilon { config.epsilon = v; }
        if let Some(v) = self.sinkhorn_iterations { config.sinkhorn_iterations = v; }
        if self.d0.is_some() { config.d0 = self.d0; }
        if self.cutoff.is_some() { config.cutoff = self.cutoff; }
        if self.no_cutoff { config.cutoff = None; }
        if let Some(v) = self.steepness { config.steepness = v; }
        if let Some(v) = self.seed { config.seed = v; }
        if let Some(v) = self.init_noise { config.init_noise = v; }
        if self.patience.is_some() { config.patience = self.patience; }
        if let Some(v) = self.tolerance { config.tolerance = v; }
        if let Some(v) = self.max_residues { config.max_residues = v; }
        config
    }
}

pub fn write_config_to_file(path: &str, config: &AlignConfig) -> Result<(), ConfigError> {
    let text = toml::to_string(&config.to_toml())?;
    let mut file = std::fs::File::create(path).map_err(|source| ConfigError::Write {
        path: path.to_string(),
        source,
    })?;
    file.write_all(text.as_bytes()).map_err(|source| ConfigError::Write {
        path: path.to_string(),
        source,
    })
}

pub fn read_config_from_file(path: &str) -> Result<AlignConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    let toml: toml::Value = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    Ok(AlignConfig::from_toml(&toml)?)
}

/// Base configuration from `path` (defaults when None) with `overrides` applied on top.
pub fn load_config(path: Option<&str>, overrides: &ConfigOverrides) -> Result<AlignConfig, ConfigError> {
    let base = match path {
        Some(path) => read_config_from_file(path)?,
        None => AlignConfig::default(),
    };
    let config = overrides.apply(base);
    config.validate()?;
    Ok(config)
}
