// File: driver.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

//! One complete alignment run.
//!
//! Both point sets are centered on their centroids and the optimizer works in that
//! frame. Every step evaluates the score at the current parameters, records it,
//! and then takes one AdamW step. The best parameters seen are kept; at the end the
//! coupling is recomputed at the best parameters, decoded into residue pairs and
//! scored with the hard TM-score.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::align::config::AlignConfig;
use crate::align::cost::CostModel;
use crate::align::decode::{decode_pairs, AlignedPair, HardScore};
use crate::align::optimizer::{AdamW, AdamWConfig, BestTracker};
use crate::align::score::SinkhornScorer;
use crate::align::se3::{RigidTransform, TransformParameters};
use crate::align::sinkhorn::SinkhornTransport;
use crate::align::{push_warning, AlignError, NumericalWarning, Side};
use crate::structure::coordinate::Point;
use crate::structure::metrics::d0_from_length;
use crate::structure::point_set::PointSet;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    /// Best parameters, in the centered frame
    pub params: TransformParameters,
    /// `R, t` acting on centered mobile coordinates
    pub transform: RigidTransform,
    /// `R, t` acting on the original mobile coordinates, landing in the reference frame
    pub global_transform: RigidTransform,
    /// Best Sinkhorn score
    pub soft_score: f64,
    pub best_step: usize,
    pub steps_run: usize,
    /// Kernel scale used by the cost model
    pub d0: f64,
    pub pairs: Vec<AlignedPair>,
    pub hard: HardScore,
    /// Mobile C-alpha coordinates under `global_transform`
    pub transformed_mobile: Vec<Point>,
    /// Score at every step, in order
    pub trajectory: Vec<f64>,
    pub warnings: Vec<NumericalWarning>,
}

impl AlignmentResult {
    /// The reported hard score: TM-score normalized by the reference length
    pub fn hard_score(&self) -> f64 {
        self.hard.tm_score_reference
    }
}

#[derive(Debug, Clone)]
pub struct Aligner {
    config: AlignConfig,
}

impl Aligner {
    pub fn new(config: AlignConfig) -> Result<Self, AlignError> {
        config.validate()?;
        Ok(Aligner { config })
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    fn check_input(&self, set: &PointSet, side: Side) -> Result<(), AlignError> {
        if set.is_empty() {
            return Err(AlignError::EmptyInput { side });
        }
        if set.len() > self.config.max_residues {
            return Err(AlignError::TooManyResidues {
                side,
                len: set.len(),
                limit: self.config.max_residues,
            });
        }
        Ok(())
    }

    fn initial_params(&self) -> TransformParameters {
        if self.config.init_noise <= 0.0 {
            return TransformParameters::zeros();
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let noise = self.config.init_noise;
        TransformParameters(std::array::from_fn(|_| rng.gen_range(-noise..noise)))
    }

    pub fn align(&self, mobile: &PointSet, reference: &PointSet) -> Result<AlignmentResult, AlignError> {
        self.run(mobile, reference, None, &mut |_, _| {})
    }

    pub fn align_with_cancel(
        &self, mobile: &PointSet, reference: &PointSet, cancel: &AtomicBool,
    ) -> Result<AlignmentResult, AlignError> {
        self.run(mobile, reference, Some(cancel), &mut |_, _| {})
    }

    /// Full run. `progress` receives `(step, score)` after every evaluation.
    pub fn run(
        &self,
        mobile: &PointSet,
        reference: &PointSet,
        cancel: Option<&AtomicBool>,
        progress: &mut dyn FnMut(usize, f64),
    ) -> Result<AlignmentResult, AlignError> {
        self.check_input(mobile, Side::Mobile)?;
        self.check_input(reference, Side::Reference)?;
        let config = &self.config;

        let mobile_center = mobile.centroid();
        let reference_center = reference.centroid();
        let centered_mobile = mobile.centered();
        let centered_reference = reference.centered();

        let d0 = config.d0.unwrap_or_else(|| d0_from_length(reference.len()));
        let scorer = SinkhornScorer::new(
            CostModel::new(d0, config.cutoff, config.steepness),
            SinkhornTransport::new(config.epsilon, config.sinkhorn_iterations),
        );
        let mut optimizer = AdamW::new(AdamWConfig {
            learning_rate: config.learning_rate,
            weight_decay: config.weight_decay,
            ..Default::default()
        });
        let mut tracker = BestTracker::new(config.patience, config.tolerance);
        let mut params = self.initial_params();
        let mut trajectory = Vec::with_capacity(config.steps);
        let mut warnings = Vec::new();

        for step in 0..config.steps {
            if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                return Err(AlignError::Cancelled { step });
            }
            let evaluation = scorer.evaluate(&params, &centered_mobile, &centered_reference)?;
            if !evaluation.is_finite() {
                return Err(AlignError::OptimizationDiverged { step, score: evaluation.score });
            }
            for warning in evaluation.warnings {
                push_warning(&mut warnings, warning);
            }
            trajectory.push(evaluation.score);
            progress(step, evaluation.score);
            tracker.observe(step, evaluation.score, &params);
            if tracker.should_stop() {
                break;
            }
            optimizer.ascend(&mut params, &evaluation.gradient);
        }

        let best = tracker.params;
        let (_, plan) = scorer.forward(&best, &centered_mobile, &centered_reference)?;
        let pairs = decode_pairs(&plan.coupling);
        let transform = best.to_transform();
        let global_transform = transform.uncentered(mobile_center, reference_center);
        let transformed_mobile = global_transform.apply_all(&mobile.coords);
        let hard = HardScore::compute(&pairs, &transformed_mobile, mobile, reference);

        Ok(AlignmentResult {
            params: best,
            transform,
            global_transform,
            soft_score: tracker.score,
            best_step: tracker.step,
            steps_run: trajectory.len(),
            d0,
            pairs,
            hard,
            transformed_mobile,
            trajectory,
            warnings,
        })
    }
}

/// Align `mobile` onto `reference` with `config`.
pub fn align(
    mobile: &PointSet, reference: &PointSet, config: &AlignConfig,
) -> Result<AlignmentResult, AlignError> {
    Aligner::new(config.clone())?.align(mobile, reference)
}

/// As `align`, returning `AlignError::Cancelled` once `cancel` is set.
pub fn align_with_cancel(
    mobile: &PointSet, reference: &PointSet, config: &AlignConfig, cancel: &AtomicBool,
) -> Result<AlignmentResult, AlignError> {
    Aligner::new(config.clone())?.align_with_cancel(mobile, reference, cancel)
}
