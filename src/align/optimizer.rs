// File: optimizer.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

// AdamW over the six transform parameters with decoupled weight decay,
// plus best-seen tracking and an optional plateau stop.

use crate::align::se3::TransformParameters;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamWConfig {
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
}

impl Default for AdamWConfig {
    fn default() -> Self {
        AdamWConfig {
            learning_rate: 1e-3,
            weight_decay: 0.01,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdamW {
    config: AdamWConfig,
    first_moment: [f64; 6],
    second_moment: [f64; 6],
    step: usize,
}

impl AdamW {
    pub fn new(config: AdamWConfig) -> Self {
        AdamW {
            config,
            first_moment: [0.0; 6],
            second_moment: [0.0; 6],
            step: 0,
        }
    }

    pub fn steps_taken(&self) -> usize {
        self.step
    }

    /// One minimization step given the gradient of the loss.
    pub fn step(&mut self, params: &mut TransformParameters, loss_gradient: &[f64; 6]) {
        let c = &self.config;
        self.step += 1;
        let bias1 = 1.0 - c.beta1.powi(self.step as i32);
        let bias2 = 1.0 - c.beta2.powi(self.step as i32);
        for k in 0..6 {
            let g = loss_gradient[k];
            // Decoupled decay acts on the parameter, not on the gradient
            params.0[k] -= c.learning_rate * c.weight_decay * params.0[k];
            self.first_moment[k] = c.beta1 * self.first_moment[k] + (1.0 - c.beta1) * g;
            self.second_moment[k] = c.beta2 * self.second_moment[k] + (1.0 - c.beta2) * g * g;
            let m_hat = self.first_moment[k] / bias1;
            let v_hat = self.second_moment[k] / bias2;
            params.0[k] -= c.learning_rate * m_hat / (v_hat.sqrt() + c.eps);
        }
    }

    /// Ascent on a score: the loss is the negated score.
    pub fn ascend(&mut self, params: &mut TransformParameters, score_gradient: &[f64; 6]) {
        let negated = score_gradient.map(|g| -g);
        self.step(params, &negated);
    }
}

/// Best score seen so far and the parameters that produced it.
#[derive(Debug, Clone)]
pub struct BestTracker {
    pub score: f64,
    pub params: TransformParameters,
    pub step: usize,
    patience: Option<usize>,
    tolerance: f64,
    stale: usize,
}

impl BestTracker {
    pub fn new(patience: Option<usize>, tolerance: f64) -> Self {
        BestTracker {
            score: f64::NEG_INFINITY,
            params: TransformParameters::zeros(),
            step: 0,
            patience,
            tolerance,
            stale: 0,
        }
    }

    /// Record the score of `params` at `step`. Returns true if it is a new best.
    pub fn observe(&mut self, step: usize, score: f64, params: &TransformParameters) -> bool {
        let improvement = score - self.score;
        let is_best = score > self.score;
        if is_best {
            self.score = score;
            self.params = *params;
            self.step = step;
        }
        if improvement > self.tolerance {
            self.stale = 0;
        } else {
            self.stale += 1;
        }
        is_best
    }

    /// True once `patience` consecutive steps improved by no more than `tolerance`.
    pub fn should_stop(&self) -> bool {
        match self.patience {
            Some(patience) => self.stale >= patience,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut optimizer = AdamW::new(AdamWConfig { weight_decay: 0.0, ..Default::default() });
        let mut params = TransformParameters::zeros();
        optimizer.ascend(&mut params, &[1.0, -2.0, 0.5, 0.0, 3.0, -0.1]);
        // Bias-corrected first step is lr * sign(g)
        let expected = [1e-3, -1e-3, 1e-3, 0.0, 1e-3, -1e-3];
        for k in 0..6 {
            assert!((params.0[k] - expected[k]).abs() < 1e-9, "k = {}: {}", k, params.0[k]);
        }
        assert_eq!(optimizer.steps_taken(), 1);
    }

    #[test]
    fn test_weight_decay_is_decoupled() {
        let config = AdamWConfig { learning_rate: 0.1, weight_decay: 0.5, ..Default::default() };
        let mut optimizer = AdamW::new(config);
        let mut params = TransformParameters([2.0; 6]);
        optimizer.step(&mut params, &[0.0; 6]);
        // Zero gradient: only the decay term acts
        for k in 0..6 {
            assert!((params.0[k] - 2.0 * (1.0 - 0.1 * 0.5)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_minimizes_quadratic() {
        let config = AdamWConfig { learning_rate: 0.05, weight_decay: 0.0, ..Default::default() };
        let mut optimizer = AdamW::new(config);
        let target = [1.0, -0.5, 0.25, 2.0, -1.0, 0.0];
        let mut params = TransformParameters::zeros();
        for _ in 0..2000 {
            let grad: [f64; 6] = std::array::from_fn(|k| 2.0 * (params.0[k] - target[k]));
            optimizer.step(&mut params, &grad);
        }
        for k in 0..6 {
            assert!((params.0[k] - target[k]).abs() < 1e-2);
        }
    }

    #[test]
    fn test_best_tracker_and_patience() {
        let mut tracker = BestTracker::new(Some(3), 1e-3);
        let p = |v: f64| TransformParameters([v; 6]);
        assert!(tracker.observe(0, 0.5, &p(0.0)));
        assert!(tracker.observe(1, 0.6, &p(1.0)));
        assert!(!tracker.observe(2, 0.4, &p(2.0)));
        assert!(tracker.observe(3, 0.6005, &p(3.0)));
        assert!(!tracker.should_stop());
        assert!(!tracker.observe(4, 0.2, &p(4.0)));
        assert!(tracker.should_stop());
        assert_eq!(tracker.step, 3);
        assert_eq!(tracker.params, p(3.0));

        let mut unlimited = BestTracker::new(None, 1e-3);
        for step in 0..100 {
            unlimited.observe(step, 0.1, &p(0.0));
        }
        assert!(!unlimited.should_stop());
    }
}
