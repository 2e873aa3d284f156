// File: qcp.rs
// Created: 2024-05-09 17:50:26
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2024 Hyunbin Kim, All rights reserved

// Optimal superposition of paired coordinates by the quaternion characteristic
// polynomial (Theobald, 2005). The largest eigenvalue of Horn's 4x4 key matrix is
// found by Newton's method on its characteristic polynomial; the eigenvector is
// read off the adjugate of (N - lambda I).
// reference: https://theobald.brandeis.edu/qcp/

use crate::structure::coordinate::{centroid, mat_vec, sub, Matrix3, Point, IDENTITY};

const EIGENVALUE_PRECISION: f64 = 1e-11;
const MAX_NEWTON_ITERATIONS: usize = 50;
/// Below this squared norm the eigenvector is treated as undetermined
const EIGENVECTOR_PRECISION: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Superposition {
    /// `reference ≈ rotation * mobile + translation`
    pub rotation: Matrix3,
    pub translation: Point,
    pub rmsd: f64,
}

impl Superposition {
    pub fn apply(&self, point: Point) -> Point {
        let r = mat_vec(&self.rotation, point);
        [r[0] + self.translation[0], r[1] + self.translation[1], r[2] + self.translation[2]]
    }
}

/// Least-squares superposition of `mobile[i]` onto `reference[i]`.
/// Returns None for empty or unequal inputs.
pub fn superpose(mobile: &[Point], reference: &[Point]) -> Option<Superposition> {
    if mobile.is_empty() || mobile.len() != reference.len() {
        return None;
    }
    let mobile_center = centroid(mobile);
    let reference_center = centroid(reference);
    let centered_mobile: Vec<Point> = mobile.iter().map(|&p| sub(p, mobile_center)).collect();
    let centered_reference: Vec<Point> =
        reference.iter().map(|&p| sub(p, reference_center)).collect();

    let (rmsd, rotation) = qcp(&centered_mobile, &centered_reference);
    let rotated_center = mat_vec(&rotation, mobile_center);
    Some(Superposition {
        rotation,
        translation: sub(reference_center, rotated_center),
        rmsd,
    })
}

/// Inner product matrix `S[a][b] = sum_i mobile_i[a] * reference_i[b]`
fn inner_product(mobile: &[Point], reference: &[Point]) -> Matrix3 {
    let mut s = [[0.0; 3]; 3];
    for (x, y) in mobile.iter().zip(reference.iter()) {
        for a in 0..3 {
            for b in 0..3 {
                s[a][b] += x[a] * y[b];
            }
        }
    }
    s
}

fn key_matrix(s: &Matrix3) -> [[f64; 4]; 4] {
    let (sxx, sxy, sxz) = (s[0][0], s[0][1], s[0][2]);
    let (syx, syy, syz) = (s[1][0], s[1][1], s[1][2]);
    let (szx, szy, szz) = (s[2][0], s[2][1], s[2][2]);
    [
        [sxx + syy + szz, syz - szy, szx - sxz, sxy - syx],
        [syz - szy, sxx - syy - szz, sxy + syx, szx + sxz],
        [szx - sxz, sxy + syx, -sxx + syy - szz, syz + szy],
        [sxy - syx, szx + sxz, syz + szy, -sxx - syy + szz],
    ]
}

fn det3(m: [[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn minor(m: &[[f64; 4]; 4], row: usize, col: usize) -> f64 {
    let mut sub = [[0.0; 3]; 3];
    for (si, i) in (0..4).filter(|&i| i != row).enumerate() {
        for (sj, j) in (0..4).filter(|&j| j != col).enumerate() {
            sub[si][sj] = m[i][j];
        }
    }
    det3(sub)
}

fn cofactor(m: &[[f64; 4]; 4], row: usize, col: usize) -> f64 {
    let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
    sign * minor(m, row, col)
}

fn det4(m: &[[f64; 4]; 4]) -> f64 {
    (0..4).map(|j| m[0][j] * cofactor(m, 0, j)).sum()
}

fn quaternion_to_rotation(q: [f64; 4]) -> Matrix3 {
    let [w, x, y, z] = q;
    [
        [w * w + x * x - y * y - z * z, 2.0 * (x * y - w * z), 2.0 * (x * z + w * y)],
        [2.0 * (y * x + w * z), w * w - x * x + y * y - z * z, 2.0 * (y * z - w * x)],
        [2.0 * (z * x - w * y), 2.0 * (z * y + w * x), w * w - x * x - y * y + z * z],
    ]
}

/// Both inputs must be centered. Returns (rmsd, rotation of mobile onto reference).
fn qcp(mobile: &[Point], reference: &[Point]) -> (f64, Matrix3) {
    let n = mobile.len() as f64;
    let g_mobile: f64 = mobile.iter().map(|p| p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sum();
    let g_reference: f64 = reference.iter().map(|p| p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sum();
    let e0 = (g_mobile + g_reference) * 0.5;

    let s = inner_product(mobile, reference);
    let key = key_matrix(&s);

    // det(N - xI) = x^4 + c2 x^2 + c1 x + c0
    let c2 = -2.0 * s.iter().flatten().map(|v| v * v).sum::<f64>();
    let c1 = -8.0 * det3(s);
    let c0 = det4(&key);

    let mut lambda = e0;
    for _ in 0..MAX_NEWTON_ITERATIONS {
        let previous = lambda;
        let x2 = lambda * lambda;
        let b = (x2 + c2) * lambda;
        let a = b + c1;
        let f = a * lambda + c0;
        let f_prime = 2.0 * x2 * lambda + b + a;
        lambda = (lambda - f / (f_prime + EIGENVALUE_PRECISION)).abs();
        if (lambda - previous).abs() < EIGENVALUE_PRECISION * lambda {
            break;
        }
    }
    let rmsd = (2.0 * (e0 - lambda).max(0.0) / n).sqrt();

    let mut shifted = key;
    for (k, row) in shifted.iter_mut().enumerate() {
        row[k] -= lambda;
    }
    // adj(N - lambda I) is proportional to q q^T; take its strongest column
    let mut best = [0.0; 4];
    let mut best_norm = 0.0;
    for col in 0..4 {
        let column: [f64; 4] = std::array::from_fn(|row| cofactor(&shifted, col, row));
        let norm: f64 = column.iter().map(|v| v * v).sum();
        if norm > best_norm {
            best_norm = norm;
            best = column;
        }
    }
    if best_norm < EIGENVECTOR_PRECISION {
        return (rmsd, IDENTITY);
    }
    let scale = best_norm.sqrt();
    let q = best.map(|v| v / scale);
    (rmsd, quaternion_to_rotation(q))
}
