// File: mod.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

//! # Alignment core
//! Differentiable alignment of two C-alpha point sets.
//!
//! One optimization step runs the chain
//! `se3` (parameters -> R, t) -> `cost` (pairwise similarity) -> `sinkhorn`
//! (soft coupling) -> `score` (scalar objective and its gradient) and hands the
//! gradient to `optimizer`. `driver` owns a whole run and `decode` turns the
//! final coupling into discrete residue pairs for reporting.

pub mod config;
pub mod cost;
pub mod decode;
pub mod driver;
pub mod matrix;
pub mod optimizer;
pub mod report;
pub mod score;
pub mod se3;
pub mod sinkhorn;

use std::fmt;

/// Which input of a run an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Mobile,
    Reference,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Mobile => write!(f, "mobile"),
            Side::Reference => write!(f, "reference"),
        }
    }
}

/// Errors that abort a single alignment run
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignError {
    #[error("The {side} structure has no C-alpha atoms")]
    EmptyInput { side: Side },

    #[error("The {side} structure has {len} residues (limit {limit})")]
    TooManyResidues { side: Side, len: usize, limit: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Optimization diverged at step {step} (score = {score})")]
    OptimizationDiverged { step: usize, score: f64 },

    #[error("Alignment cancelled at step {step}")]
    Cancelled { step: usize },
}

/// Recoverable numerical events. Collected per run, never fatal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericalWarning {
    /// The rotation angle was small enough to switch Rodrigues' formula to its series form.
    SmallAngle,
    /// `range(C) / epsilon` is beyond what a linear-domain Sinkhorn kernel could represent.
    StiffKernel { ratio: f64 },
}

impl NumericalWarning {
    pub fn same_kind(&self, other: &NumericalWarning) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for NumericalWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericalWarning::SmallAngle => {
                write!(f, "Rotation angle below threshold; used series expansion of the exponential map")
            }
            NumericalWarning::StiffKernel { ratio } => {
                write!(f, "Cost range is {:.1}x the regularization; transport computed in log-space", ratio)
            }
        }
    }
}

/// Append a warning unless one of the same kind was already recorded.
pub(crate) fn push_warning(warnings: &mut Vec<NumericalWarning>, warning: NumericalWarning) {
    if !warnings.iter().any(|w| w.same_kind(&warning)) {
        warnings.push(warning);
    }
}
