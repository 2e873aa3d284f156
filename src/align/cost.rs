// File: cost.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

//! Pairwise similarity and transport cost between transformed mobile and reference residues.
//!
//! `S[i,j] = 1 / (1 + (d_ij / d0)^2)`, the TM-score kernel, optionally damped by a
//! smooth distance cutoff `sigmoid(-(d_ij - cutoff) * steepness)` so that pairs far
//! beyond the cutoff stop contributing. The transport cost is `C = -S`.

use crate::align::matrix::DenseMatrix;
use crate::align::{AlignError, Side};
use crate::structure::coordinate::{dist, Point};
use crate::structure::metrics::d0_from_length;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub d0: f64,
    /// Optional smooth distance cutoff in Angstroms
    pub cutoff: Option<f64>,
    pub steepness: f64,
}

/// Matrices produced by one forward evaluation of the cost model.
#[derive(Debug, Clone)]
pub struct PairwiseTerms {
    pub distance: DenseMatrix,
    pub similarity: DenseMatrix,
    /// dS/dd for every pair, consumed by the backward pass
    pub similarity_slope: DenseMatrix,
}

impl CostModel {
    pub fn new(d0: f64, cutoff: Option<f64>, steepness: f64) -> Self {
        CostModel { d0, cutoff, steepness }
    }

    /// d0 derived from the reference length, as in the TM-score.
    pub fn for_reference_length(length: usize, cutoff: Option<f64>, steepness: f64) -> Self {
        CostModel::new(d0_from_length(length), cutoff, steepness)
    }

    /// Similarity and its derivative with respect to the distance.
    #[inline]
    pub fn kernel(&self, d: f64) -> (f64, f64) {
        let d0_sq = self.d0 * self.d0;
        let k = 1.0 / (1.0 + d * d / d0_sq);
        let dk = -2.0 * d / d0_sq * k * k;
        match self.cutoff {
            None => (k, dk),
            Some(cutoff) => {
                let gate = sigmoid(-(d - cutoff) * self.steepness);
                let dgate = -self.steepness * gate * (1.0 - gate);
                (k * gate, dk * gate + k * dgate)
            }
        }
    }

    pub fn evaluate(&self, transformed: &[Point], reference: &[Point]) -> Result<PairwiseTerms, AlignError> {
        if transformed.is_empty() {
            return Err(AlignError::EmptyInput { side: Side::Mobile });
        }
        if reference.is_empty() {
            return Err(AlignError::EmptyInput { side: Side::Reference });
        }
        let (m, n) = (transformed.len(), reference.len());
        let mut distance = DenseMatrix::zeros(m, n);
        let mut similarity = DenseMatrix::zeros(m, n);
        let mut similarity_slope = DenseMatrix::zeros(m, n);
        for (i, &x) in transformed.iter().enumerate() {
            for (j, &y) in reference.iter().enumerate() {
                let d = dist(x, y);
                let (s, ds) = self.kernel(d);
                distance.set(i, j, d);
                similarity.set(i, j, s);
                similarity_slope.set(i, j, ds);
            }
        }
        Ok(PairwiseTerms { distance, similarity, similarity_slope })
    }
}

/// Cost for transport: minimizing `C` maximizes `S`.
pub fn cost_matrix(similarity: &DenseMatrix) -> DenseMatrix {
    similarity.map(|s| -s)
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
