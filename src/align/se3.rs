// File: se3.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

//! Lie-algebra parameterization of rigid motions.
//!
//! A rigid transform is stored as six unconstrained numbers `(w, t)`.
//! `R = exp([w]x)` is evaluated with Rodrigues' formula, so every parameter
//! vector maps to a proper rotation and the optimizer never has to project
//! back onto SO(3).

use crate::structure::coordinate::{add, mat_vec, Matrix3, Point, IDENTITY};

/// Below this angle the trigonometric coefficients are replaced by their Taylor series.
pub const SMALL_ANGLE: f64 = 1.0e-4;

/// `(w1, w2, w3, t1, t2, t3)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformParameters(pub [f64; 6]);

impl TransformParameters {
    pub fn zeros() -> Self {
        TransformParameters([0.0; 6])
    }

    pub fn new(rotation: Point, translation: Point) -> Self {
        TransformParameters([
            rotation[0], rotation[1], rotation[2],
            translation[0], translation[1], translation[2],
        ])
    }

    pub fn rotation(&self) -> Point {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn translation(&self) -> Point {
        [self.0[3], self.0[4], self.0[5]]
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    pub fn to_transform(&self) -> RigidTransform {
        RigidTransform {
            rotation: exp_so3(self.rotation()),
            translation: self.translation(),
        }
    }
}

/// `x' = R x + t`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Matrix3,
    pub translation: Point,
}

impl RigidTransform {
    pub fn identity() -> Self {
        RigidTransform { rotation: IDENTITY, translation: [0.0; 3] }
    }

    #[inline(always)]
    pub fn apply(&self, point: Point) -> Point {
        add(mat_vec(&self.rotation, point), self.translation)
    }

    pub fn apply_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&p| self.apply(p)).collect()
    }

    /// Fold centering into the transform.
    /// The optimizer works on `mobile - c_mobile` against `reference - c_reference`;
    /// the returned transform maps raw mobile coordinates into the raw reference frame.
    pub fn uncentered(&self, mobile_center: Point, reference_center: Point) -> RigidTransform {
        let rotated_center = mat_vec(&self.rotation, mobile_center);
        RigidTransform {
            rotation: self.rotation,
            translation: [
                self.translation[0] + reference_center[0] - rotated_center[0],
                self.translation[1] + reference_center[1] - rotated_center[1],
                self.translation[2] + reference_center[2] - rotated_center[2],
            ],
        }
    }
}

pub fn skew(w: Point) -> Matrix3 {
    [
        [0.0, -w[2], w[1]],
        [w[2], 0.0, -w[0]],
        [-w[1], w[0], 0.0],
    ]
}

/// `I + a K + b K^2` with `K = [w]x`
fn so3_combination(w: Point, a: f64, b: f64) -> Matrix3 {
    let k = skew(w);
    // K^2 = w w^T - |w|^2 I
    let theta_sq = w[0] * w[0] + w[1] * w[1] + w[2] * w[2];
    let mut out = IDENTITY;
    for i in 0..3 {
        for j in 0..3 {
            let k2 = w[i] * w[j] - if i == j { theta_sq } else { 0.0 };
            out[i][j] += a * k[i][j] + b * k2;
        }
    }
    out
}

/// Coefficients `(sin θ / θ, (1 - cos θ) / θ², (θ - sin θ) / θ³)`
fn rodrigues_coefficients(theta_sq: f64) -> (f64, f64, f64) {
    let theta = theta_sq.sqrt();
    if theta < SMALL_ANGLE {
        let t4 = theta_sq * theta_sq;
        (
            1.0 - theta_sq / 6.0 + t4 / 120.0,
            0.5 - theta_sq / 24.0 + t4 / 720.0,
            1.0 / 6.0 - theta_sq / 120.0 + t4 / 5040.0,
        )
    } else {
        let (sin, cos) = theta.sin_cos();
        (sin / theta, (1.0 - cos) / theta_sq, (theta - sin) / (theta_sq * theta))
    }
}

pub fn is_small_angle(w: Point) -> bool {
    (w[0] * w[0] + w[1] * w[1] + w[2] * w[2]).sqrt() < SMALL_ANGLE
}

/// Exponential map so(3) -> SO(3).
pub fn exp_so3(w: Point) -> Matrix3 {
    let theta_sq = w[0] * w[0] + w[1] * w[1] + w[2] * w[2];
    let (a, b, _) = rodrigues_coefficients(theta_sq);
    so3_combination(w, a, b)
}

/// Left Jacobian of SO(3).
/// `exp([w + δ]x) ≈ exp([J_l(w) δ]x) exp([w]x)` to first order, which lets the
/// gradient with respect to a rotation perturbation be pulled back onto `w`.
pub fn left_jacobian(w: Point) -> Matrix3 {
    let theta_sq = w[0] * w[0] + w[1] * w[1] + w[2] * w[2];
    let (_, b, c) = rodrigues_coefficients(theta_sq);
    so3_combination(w, b, c)
}
