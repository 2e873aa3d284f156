// File: config.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

use toml::map::Map;

use crate::align::AlignError;

pub const DEFAULT_STEPS: usize = 5000;
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;
pub const DEFAULT_WEIGHT_DECAY: f64 = 0.01;
/// 1 / gamma with the usual sharpness gamma = 20
pub const DEFAULT_EPSILON: f64 = 0.05;
pub const DEFAULT_SINKHORN_ITERATIONS: usize = 10;
pub const DEFAULT_CUTOFF: f64 = 7.0;
pub const DEFAULT_STEEPNESS: f64 = 2.0;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_RESIDUES: usize = 5000;

/// Parameters of one alignment run.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignConfig {
    pub steps: usize,
    pub learning_rate: f64,
    pub weight_decay: f64,
    /// Entropic regularization of the transport
    pub epsilon: f64,
    pub sinkhorn_iterations: usize,
    /// Kernel scale; derived from the reference length when None
    pub d0: Option<f64>,
    /// Smooth distance cutoff; no gate when None
    pub cutoff: Option<f64>,
    pub steepness: f64,
    pub seed: u64,
    /// Half-width of the uniform perturbation of the initial parameters. 0 starts at identity.
    pub init_noise: f64,
    /// Stop after this many steps without improvement above `tolerance`
    pub patience: Option<usize>,
    pub tolerance: f64,
    pub max_residues: usize,
}

impl Default for AlignConfig {
    fn default() -> Self {
        AlignConfig {
            steps: DEFAULT_STEPS,
            learning_rate: DEFAULT_LEARNING_RATE,
            weight_decay: DEFAULT_WEIGHT_DECAY,
            epsilon: DEFAULT_EPSILON,
            sinkhorn_iterations: DEFAULT_SINKHORN_ITERATIONS,
            d0: None,
            cutoff: Some(DEFAULT_CUTOFF),
            steepness: DEFAULT_STEEPNESS,
            seed: 0,
            init_noise: 0.0,
            patience: None,
            tolerance: DEFAULT_TOLERANCE,
            max_residues: DEFAULT_MAX_RESIDUES,
        }
    }
}

fn invalid(msg: String) -> AlignError {
    AlignError::InvalidConfig(msg)
}

fn get_float(toml: &toml::Value, key: &str) -> Result<Option<f64>, AlignError> {
    match toml.get(key) {
        None => Ok(None),
        Some(toml::Value::Float(v)) => Ok(Some(*v)),
        Some(toml::Value::Integer(v)) => Ok(Some(*v as f64)),
        Some(other) => Err(invalid(format!("{} must be a number, got {}", key, other))),
    }
}

fn get_usize(toml: &toml::Value, key: &str) -> Result<Option<usize>, AlignError> {
    match toml.get(key) {
        None => Ok(None),
        Some(toml::Value::Integer(v)) if *v >= 0 => Ok(Some(*v as usize)),
        Some(other) => Err(invalid(format!("{} must be a non-negative integer, got {}", key, other))),
    }
}

impl AlignConfig {
    pub fn validate(&self) -> Result<(), AlignError> {
        if self.steps == 0 {
            return Err(invalid("steps must be at least 1".to_string()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(invalid(format!("learning rate must be positive, got {}", self.learning_rate)));
        }
        if !(self.weight_decay >= 0.0 && self.weight_decay.is_finite()) {
            return Err(invalid(format!("weight decay must be non-negative, got {}", self.weight_decay)));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(invalid(format!("epsilon must be positive, got {}", self.epsilon)));
        }
        if self.sinkhorn_iterations == 0 {
            return Err(invalid("sinkhorn iterations must be at least 1".to_string()));
        }
        if let Some(d0) = self.d0 {
            if !(d0 > 0.0 && d0.is_finite()) {
                return Err(invalid(format!("d0 must be positive, got {}", d0)));
            }
        }
        if let Some(cutoff) = self.cutoff {
            if !(cutoff > 0.0 && cutoff.is_finite()) {
                return Err(invalid(format!("cutoff must be positive, got {}", cutoff)));
            }
        }
        if !(self.steepness > 0.0 && self.steepness.is_finite()) {
            return Err(invalid(format!("steepness must be positive, got {}", self.steepness)));
        }
        if !(self.init_noise >= 0.0 && self.init_noise.is_finite()) {
            return Err(invalid(format!("init noise must be non-negative, got {}", self.init_noise)));
        }
        if self.max_residues == 0 {
            return Err(invalid("max residues must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Keys missing from the table keep their default value.
    pub fn from_toml(toml: &toml::Value) -> Result<Self, AlignError> {
        let default = AlignConfig::default();
        let seed = match toml.get("seed") {
            None => default.seed,
            Some(toml::Value::Integer(v)) => *v as u64,
            Some(other) => return Err(invalid(format!("seed must be an integer, got {}", other))),
        };
        let config = AlignConfig {
            steps: get_usize(toml, "steps")?.unwrap_or(default.steps),
            learning_rate: get_float(toml, "learning_rate")?.unwrap_or(default.learning_rate),
            weight_decay: get_float(toml, "weight_decay")?.unwrap_or(default.weight_decay),
            epsilon: get_float(toml, "epsilon")?.unwrap_or(default.epsilon),
            sinkhorn_iterations: get_usize(toml, "sinkhorn_iterations")?
                .unwrap_or(default.sinkhorn_iterations),
            d0: get_float(toml, "d0")?.or(default.d0),
            // An explicit `cutoff = false` disables the gate
            cutoff: match toml.get("cutoff") {
                Some(toml::Value::Boolean(false)) => None,
                _ => get_float(toml, "cutoff")?.or(default.cutoff),
            },
            steepness: get_float(toml, "steepness")?.unwrap_or(default.steepness),
            seed,
            init_noise: get_float(toml, "init_noise")?.unwrap_or(default.init_noise),
            patience: get_usize(toml, "patience")?.or(default.patience),
            tolerance: get_float(toml, "tolerance")?.unwrap_or(default.tolerance),
            max_residues: get_usize(toml, "max_residues")?.unwrap_or(default.max_residues),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> toml::Value {
        let mut map = Map::new();
        map.insert("steps".to_string(), toml::Value::Integer(self.steps as i64));
        map.insert("learning_rate".to_string(), toml::Value::Float(self.learning_rate));
        map.insert("weight_decay".to_string(), toml::Value::Float(self.weight_decay));
        map.insert("epsilon".to_string(), toml::Value::Float(self.epsilon));
        map.insert("sinkhorn_iterations".to_string(), toml::Value::Integer(self.sinkhorn_iterations as i64));
        if let Some(d0) = self.d0 {
            map.insert("d0".to_string(), toml::Value::Float(d0));
        }
        match self.cutoff {
            Some(cutoff) => map.insert("cutoff".to_string(), toml::Value::Float(cutoff)),
            None => map.insert("cutoff".to_string(), toml::Value::Boolean(false)),
        };
        map.insert("steepness".to_string(), toml::Value::Float(self.steepness));
        map.insert("seed".to_string(), toml::Value::Integer(self.seed as i64));
        map.insert("init_noise".to_string(), toml::Value::Float(self.init_noise));
        if let Some(patience) = self.patience {
            map.insert("patience".to_string(), toml::Value::Integer(patience as i64));
        }
        map.insert("tolerance".to_string(), toml::Value::Float(self.tolerance));
        map.insert("max_residues".to_string(), toml::Value::Integer(self.max_residues as i64));
        toml::Value::Table(map)
    }
}
