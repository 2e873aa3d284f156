// File: metrics.rs
// Created: 2025-10-29
// Description: Structure similarity metrics over aligned residue pairs
//   - TM-score: Template Modeling score, normalized by a chosen length
//   - RMSD: Root Mean Square Deviation. Outlier sensitive.
//
// Usage example:
// ```rust
// use crate::structure::metrics::*;
//
// let distances = PairDistances::new(&transformed_mobile, &reference, &pairs);
// let tm = tm_score(&distances, reference.len(), None);
// let rmsd = rmsd(&distances);
// ```

use crate::structure::coordinate::{dist, Point};

/// Distances between the two residues of every aligned pair.
/// Computed once and shared by all metrics.
pub struct PairDistances {
    pub distances: Vec<f64>,
}

impl PairDistances {
    /// # Arguments
    /// * `mobile` - Mobile coordinates, already superposed
    /// * `reference` - Reference coordinates
    /// * `pairs` - (mobile index, reference index) of every aligned pair
    pub fn new(mobile: &[Point], reference: &[Point], pairs: &[(usize, usize)]) -> Self {
        let distances = pairs
            .iter()
            .map(|&(i, j)| dist(mobile[i], reference[j]))
            .collect();
        Self { distances }
    }

    /// Position-wise pairs of two equal-length coordinate lists
    pub fn from_paired(mobile: &[Point], reference: &[Point]) -> Self {
        let distances = mobile
            .iter()
            .zip(reference.iter())
            .map(|(&a, &b)| dist(a, b))
            .collect();
        Self { distances }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}

/// TM-score normalization
/// d0(L) = 1.24 * (L - 15)^(1/3) - 1.8 for L > 15, never below 0.5
#[inline]
pub fn d0_from_length(length: usize) -> f64 {
    let d0 = if length > 15 {
        1.24 * ((length - 15) as f64).cbrt() - 1.8
    } else {
        0.5
    };
    d0.max(0.5)
}

/// TM-score over aligned pairs
///
/// # Arguments
/// * `distances` - Distances of the aligned pairs
/// * `norm_length` - Length to normalize by (reference or mobile length)
/// * `d0` - Optional normalization distance; derived from `norm_length` if None
///
/// # Returns
/// TM-score in range [0, 1]
pub fn tm_score(distances: &PairDistances, norm_length: usize, d0: Option<f64>) -> f64 {
    if distances.is_empty() || norm_length == 0 {
        return 0.0;
    }
    let d0 = d0.unwrap_or_else(|| d0_from_length(norm_length));
    let d0_sq = d0 * d0;
    let sum: f64 = distances
        .distances
        .iter()
        .map(|d| 1.0 / (1.0 + d * d / d0_sq))
        .sum();
    sum / norm_length as f64
}

/// RMSD of the aligned pairs as they are, without refitting
pub fn rmsd(distances: &PairDistances) -> f64 {
    if distances.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = distances.distances.iter().map(|d| d * d).sum();
    (sum_sq / distances.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d0_from_length() {
        assert_eq!(d0_from_length(0), 0.5);
        assert_eq!(d0_from_length(15), 0.5);
        // 1.24 * 2 - 1.8 = 0.68
        assert!((d0_from_length(23) - 0.68).abs() < 1e-12);
        // 1.24 * 5 - 1.8 = 4.4
        assert!((d0_from_length(140) - 4.4).abs() < 1e-12);
        // Clamped for short chains where the formula dips below 0.5
        assert_eq!(d0_from_length(17), 0.5);
    }

    #[test]
    fn test_metrics_with_identical() {
        let coords = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let distances = PairDistances::from_paired(&coords, &coords);
        assert!((tm_score(&distances, 4, None) - 1.0).abs() < 1e-12);
        assert!(rmsd(&distances).abs() < 1e-12);
        // Normalizing by a longer chain lowers the score
        assert!((tm_score(&distances, 8, None) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_with_pairs() {
        let mobile = vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        let reference = vec![[0.0, 0.0, 4.0], [3.0, 0.0, 0.0], [9.0, 9.0, 9.0]];
        let distances = PairDistances::new(&mobile, &reference, &[(0, 0), (1, 1)]);
        assert_eq!(distances.distances, vec![4.0, 0.0]);
        assert!((rmsd(&distances) - 8.0f64.sqrt()).abs() < 1e-12);
        // d0 = 2: (1/(1+4) + 1) / 3
        let tm = tm_score(&distances, 3, Some(2.0));
        assert!((tm - (0.2 + 1.0) / 3.0).abs() < 1e-12);
        assert_eq!(tm_score(&PairDistances { distances: vec![] }, 3, None), 0.0);
    }
}
