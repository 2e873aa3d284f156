// File: decode.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

//! Hard alignment from a soft coupling, and the metrics reported for it.
//!
//! Decoding rule: every mobile row proposes its argmax column, with the coupling
//! value as confidence. Rows are visited by decreasing confidence and a proposal is
//! accepted only if its column is still free, so the result is one-to-one.

use crate::align::matrix::DenseMatrix;
use crate::structure::coordinate::Point;
use crate::structure::metrics::{d0_from_length, tm_score, PairDistances};
use crate::structure::point_set::PointSet;
use crate::structure::qcp::superpose;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPair {
    pub mobile: usize,
    pub reference: usize,
    pub confidence: f64,
}

/// Pairs sorted by mobile index.
pub fn decode_pairs(coupling: &DenseMatrix) -> Vec<AlignedPair> {
    let (rows, cols) = coupling.shape();
    if cols == 0 {
        return Vec::new();
    }
    let mut proposals: Vec<AlignedPair> = (0..rows)
        .map(|i| {
            let row = coupling.row(i);
            // First maximum wins on ties
            let (j, &value) = row
                .iter()
                .enumerate()
                .fold((0, &row[0]), |best, (j, v)| if *v > *best.1 { (j, v) } else { best });
            AlignedPair { mobile: i, reference: j, confidence: value }
        })
        .collect();
    proposals.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.mobile.cmp(&b.mobile))
    });

    let mut used = vec![false; cols];
    let mut accepted: Vec<AlignedPair> = proposals
        .into_iter()
        .filter(|pair| {
            if used[pair.reference] {
                false
            } else {
                used[pair.reference] = true;
                true
            }
        })
        .collect();
    accepted.sort_by_key(|pair| pair.mobile);
    accepted
}

/// Interpretable scores of a decoded alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct HardScore {
    pub aligned_length: usize,
    /// TM-score normalized by the reference length; the primary reported score
    pub tm_score_reference: f64,
    pub tm_score_mobile: f64,
    pub d0_reference: f64,
    pub d0_mobile: f64,
    /// RMSD of the aligned pairs after their own optimal superposition
    pub rmsd: f64,
    /// Fraction of aligned pairs with identical residues, when both sequences are known
    pub sequence_identity: Option<f64>,
}

impl HardScore {
    /// # Arguments
    /// * `pairs` - Decoded alignment
    /// * `transformed_mobile` - Mobile coordinates under the optimized transform
    /// * `mobile` - Mobile input, for sequence and its own superposition
    /// * `reference` - Reference input
    pub fn compute(
        pairs: &[AlignedPair], transformed_mobile: &[Point], mobile: &PointSet, reference: &PointSet,
    ) -> Self {
        let index_pairs: Vec<(usize, usize)> =
            pairs.iter().map(|p| (p.mobile, p.reference)).collect();
        let distances = PairDistances::new(transformed_mobile, &reference.coords, &index_pairs);
        let d0_reference = d0_from_length(reference.len());
        let d0_mobile = d0_from_length(mobile.len());

        let paired_mobile: Vec<Point> = pairs.iter().map(|p| mobile.coords[p.mobile]).collect();
        let paired_reference: Vec<Point> =
            pairs.iter().map(|p| reference.coords[p.reference]).collect();
        let rmsd = superpose(&paired_mobile, &paired_reference).map_or(0.0, |fit| fit.rmsd);

        let sequence_identity = if pairs.is_empty() {
            None
        } else {
            let mut known = true;
            let mut identical = 0usize;
            for p in pairs {
                match (mobile.residue(p.mobile), reference.residue(p.reference)) {
                    (Some(a), Some(b)) => identical += (a == b) as usize,
                    _ => known = false,
                }
            }
            known.then(|| identical as f64 / pairs.len() as f64)
        };

        HardScore {
            aligned_length: pairs.len(),
            tm_score_reference: tm_score(&distances, reference.len(), Some(d0_reference)),
            tm_score_mobile: tm_score(&distances, mobile.len(), Some(d0_mobile)),
            d0_reference,
            d0_mobile,
            rmsd,
            sequence_identity,
        }
    }
}
