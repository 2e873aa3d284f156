// File: score.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

//! Sinkhorn score and its gradient with respect to the six transform parameters.
//!
//! Forward: `x_i = R(w) p_i + t`, `S = kernel(|x_i - y_j|)`, `P = sinkhorn(-S)`,
//! `score = sum(P * S)`.
//! Backward (reverse-mode, by hand):
//! - `dscore/dS = P + (dscore/dP through sinkhorn, mapped from C to S)`
//! - `dscore/dd_ij = dscore/dS_ij * dS/dd`
//! - `dscore/dx_i = sum_j dscore/dd_ij * (x_i - y_j) / d_ij`
//! - `dscore/dt = sum_i dscore/dx_i`
//! - `dscore/dw = J_l(w)^T * sum_i (R p_i) x dscore/dx_i`

use crate::align::cost::{cost_matrix, CostModel};
use crate::align::matrix::DenseMatrix;
use crate::align::se3::{is_small_angle, left_jacobian, TransformParameters};
use crate::align::sinkhorn::{SinkhornTransport, TransportPlan};
use crate::align::{push_warning, AlignError, NumericalWarning};
use crate::structure::coordinate::{add, cross, mat_vec, scale, sub, transpose, Point};

/// Distances below this are treated as coincident points with zero gradient.
const COINCIDENT: f64 = 1e-12;

/// `sum_ij P[i,j] * S[i,j]`
pub fn sinkhorn_score(coupling: &DenseMatrix, similarity: &DenseMatrix) -> f64 {
    coupling.frobenius_dot(similarity)
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub score: f64,
    /// d score / d (w1, w2, w3, t1, t2, t3)
    pub gradient: [f64; 6],
    pub plan: TransportPlan,
    pub similarity: DenseMatrix,
    pub warnings: Vec<NumericalWarning>,
}

impl Evaluation {
    pub fn is_finite(&self) -> bool {
        self.score.is_finite() && self.gradient.iter().all(|g| g.is_finite())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SinkhornScorer {
    pub cost_model: CostModel,
    pub transport: SinkhornTransport,
}

impl SinkhornScorer {
    pub fn new(cost_model: CostModel, transport: SinkhornTransport) -> Self {
        SinkhornScorer { cost_model, transport }
    }

    /// Forward pass only: the score and the transport plan at `params`.
    pub fn forward(
        &self, params: &TransformParameters, mobile: &[Point], reference: &[Point],
    ) -> Result<(f64, TransportPlan), AlignError> {
        let transformed = params.to_transform().apply_all(mobile);
        let terms = self.cost_model.evaluate(&transformed, reference)?;
        let plan = self.transport.solve(&cost_matrix(&terms.similarity));
        Ok((sinkhorn_score(&plan.coupling, &terms.similarity), plan))
    }

    /// Score only, without the backward pass.
    pub fn score(
        &self, params: &TransformParameters, mobile: &[Point], reference: &[Point],
    ) -> Result<f64, AlignError> {
        self.forward(params, mobile, reference).map(|(score, _)| score)
    }

    /// Score and gradient at `params`. Coordinates are expected to be centered.
    pub fn evaluate(
        &self, params: &TransformParameters, mobile: &[Point], reference: &[Point],
    ) -> Result<Evaluation, AlignError> {
        let mut warnings = Vec::new();
        let w = params.rotation();
        if w != [0.0; 3] && is_small_angle(w) {
            push_warning(&mut warnings, NumericalWarning::SmallAngle);
        }

        let transform = params.to_transform();
        let transformed = transform.apply_all(mobile);
        let terms = self.cost_model.evaluate(&transformed, reference)?;
        let plan = self.transport.solve(&cost_matrix(&terms.similarity));
        if let Some(warning) = plan.warning {
            push_warning(&mut warnings, warning);
        }
        let score = sinkhorn_score(&plan.coupling, &terms.similarity);

        // dscore/dC through the unrolled iterations; C = -S
        let grad_cost = self.transport.backward(&plan, &terms.similarity);
        let (m, n) = plan.shape();
        let mut grad_points: Vec<Point> = vec![[0.0; 3]; m];
        for i in 0..m {
            let x = transformed[i];
            let mut acc = [0.0; 3];
            for j in 0..n {
                let d = terms.distance.get(i, j);
                if d <= COINCIDENT {
                    continue;
                }
                let grad_s = plan.coupling.get(i, j) - grad_cost.get(i, j);
                let grad_d = grad_s * terms.similarity_slope.get(i, j);
                acc = add(acc, scale(sub(x, reference[j]), grad_d / d));
            }
            grad_points[i] = acc;
        }

        let mut grad_t = [0.0; 3];
        let mut grad_phi = [0.0; 3];
        for (x, g) in transformed.iter().zip(grad_points.iter()) {
            grad_t = add(grad_t, *g);
            let rotated = sub(*x, transform.translation);
            grad_phi = add(grad_phi, cross(rotated, *g));
        }
        let grad_w = mat_vec(&transpose(&left_jacobian(w)), grad_phi);

        Ok(Evaluation {
            score,
            gradient: [grad_w[0], grad_w[1], grad_w[2], grad_t[0], grad_t[1], grad_t[2]],
            plan,
            similarity: terms.similarity,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::se3::exp_so3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_cloud(rng: &mut StdRng, len: usize, spread: f64) -> Vec<Point> {
        (0..len)
            .map(|_| {
                [
                    rng.gen_range(-spread..spread),
                    rng.gen_range(-spread..spread),
                    rng.gen_range(-spread..spread),
                ]
            })
            .collect()
    }

    #[test]
    fn test_score_joint_permutation_invariance() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = DenseMatrix::from_fn(4, 5, |_, _| rng.gen_range(0.0..1.0));
        let s = DenseMatrix::from_fn(4, 5, |_, _| rng.gen_range(0.0..1.0));
        let rows = [2, 0, 3, 1];
        let cols = [4, 1, 0, 3, 2];
        let base = sinkhorn_score(&p, &s);
        let joint = sinkhorn_score(&p.permuted(&rows, &cols), &s.permuted(&rows, &cols));
        assert!((base - joint).abs() < 1e-12);
    }

    #[test]
    fn test_score_not_invariant_to_one_sided_permutation() {
        let p = DenseMatrix::from_fn(3, 3, |i, j| if i == j { 1.0 / 3.0 } else { 0.0 });
        let s = DenseMatrix::from_fn(3, 3, |i, j| if i == j { 1.0 } else { 0.1 });
        let base = sinkhorn_score(&p, &s);
        let shifted = sinkhorn_score(&p, &s.permuted(&[1, 2, 0], &[0, 1, 2]));
        assert!((base - 1.0).abs() < 1e-12);
        assert!((shifted - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let mut rng = StdRng::seed_from_u64(5);
        let mobile = random_cloud(&mut rng, 7, 5.0);
        let rotation = exp_so3([0.3, -0.2, 0.4]);
        let reference: Vec<Point> = mobile
            .iter()
            .take(6)
            .map(|&p| add(mat_vec(&rotation, p), [rng.gen_range(-0.3..0.3), 0.1, -0.2]))
            .collect();
        let scorer = SinkhornScorer::new(
            CostModel::new(3.0, Some(7.0), 2.0),
            SinkhornTransport::new(0.1, 5),
        );
        let params = TransformParameters::new([0.1, 0.05, -0.2], [0.3, -0.1, 0.2]);
        let evaluation = scorer.evaluate(&params, &mobile, &reference).unwrap();
        assert!(evaluation.is_finite());

        let h = 1e-6;
        for k in 0..6 {
            let mut plus = params;
            plus.0[k] += h;
            let mut minus = params;
            minus.0[k] -= h;
            let numeric = (scorer.score(&plus, &mobile, &reference).unwrap()
                - scorer.score(&minus, &mobile, &reference).unwrap())
                / (2.0 * h);
            let analytic = evaluation.gradient[k];
            assert!(
                (numeric - analytic).abs() < 1e-6 * (1.0 + numeric.abs()),
                "param {}: numeric {} analytic {}", k, numeric, analytic
            );
        }
    }

    #[test]
    fn test_score_bounded_and_maximal_for_identical_sets() {
        let mut rng = StdRng::seed_from_u64(9);
        let cloud = random_cloud(&mut rng, 10, 8.0);
        let scorer = SinkhornScorer::new(
            CostModel::new(2.0, None, 2.0),
            SinkhornTransport::new(0.05, 50),
        );
        let aligned = scorer.score(&TransformParameters::zeros(), &cloud, &cloud).unwrap();
        let shifted = scorer
            .score(&TransformParameters::new([0.0; 3], [5.0, 0.0, 0.0]), &cloud, &cloud)
            .unwrap();
        assert!(aligned <= 1.0 + 1e-9);
        assert!(aligned > 0.9);
        assert!(shifted < aligned);
    }

    #[test]
    fn test_small_angle_warning() {
        let cloud = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let scorer = SinkhornScorer::new(
            CostModel::new(1.0, None, 2.0),
            SinkhornTransport::new(0.1, 3),
        );
        let tiny = TransformParameters::new([1e-7, 0.0, 0.0], [0.0; 3]);
        let evaluation = scorer.evaluate(&tiny, &cloud, &cloud).unwrap();
        assert_eq!(evaluation.warnings, vec![NumericalWarning::SmallAngle]);
        let zero = scorer.evaluate(&TransformParameters::zeros(), &cloud, &cloud).unwrap();
        assert!(zero.warnings.is_empty());
    }
}
