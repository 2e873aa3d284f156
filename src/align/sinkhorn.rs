// File: sinkhorn.rs
// Author: Hyunbin Kim (khb7840@gmail.com)
// Copyright © 2025 Hyunbin Kim, All rights reserved

//! Entropy-regularized optimal transport between mobile and reference residues.
//!
//! Log-domain Sinkhorn-Knopp with uniform marginals `mu = 1/m`, `nu = 1/n`:
//!
//! ```text
//! g0 = 0
//! f_k[i] = log mu - LSE_j(-C[i,j]/eps + g_{k-1}[j])
//! g_k[j] = log nu - LSE_i(-C[i,j]/eps + f_k[i])
//! P[i,j] = exp(-C[i,j]/eps + f_K[i] + g_K[j])
//! ```
//!
//! Every dual iterate is kept in the `TransportPlan` so that `backward` can
//! differentiate the unrolled iterations exactly. The iteration count is fixed;
//! column sums are exact after each iteration and row sums approach `mu`
//! geometrically.

use crate::align::matrix::DenseMatrix;
use crate::align::NumericalWarning;

/// Beyond this `range(C) / eps` a linear-domain kernel `exp(-C/eps)` would overflow f64.
const STIFF_KERNEL_RATIO: f64 = 700.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkhornTransport {
    pub epsilon: f64,
    pub iterations: usize,
}

/// Output of one forward pass
#[derive(Debug, Clone)]
pub struct TransportPlan {
    pub coupling: DenseMatrix,
    /// `-C / eps`
    log_kernel: DenseMatrix,
    /// f_1 .. f_K
    f_history: Vec<Vec<f64>>,
    /// g_0 .. g_K
    g_history: Vec<Vec<f64>>,
    log_mu: f64,
    log_nu: f64,
    pub warning: Option<NumericalWarning>,
}

impl TransportPlan {
    pub fn shape(&self) -> (usize, usize) {
        self.coupling.shape()
    }

    /// L1 deviation of the row and column sums from the uniform marginals.
    pub fn marginal_error(&self) -> f64 {
        let (m, n) = self.shape();
        let mu = 1.0 / m as f64;
        let nu = 1.0 / n as f64;
        let rows: f64 = self.coupling.row_sums().iter().map(|s| (s - mu).abs()).sum();
        let cols: f64 = self.coupling.col_sums().iter().map(|s| (s - nu).abs()).sum();
        rows + cols
    }
}

/// Numerically stable log(sum(exp(x)))
#[inline]
pub fn log_sum_exp<I: Iterator<Item = f64> + Clone>(values: I) -> f64 {
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.map(|v| (v - max).exp()).sum::<f64>().ln()
}

impl SinkhornTransport {
    pub fn new(epsilon: f64, iterations: usize) -> Self {
        SinkhornTransport { epsilon, iterations }
    }

    pub fn solve(&self, cost: &DenseMatrix) -> TransportPlan {
        let (m, n) = cost.shape();
        let log_kernel = cost.map(|c| -c / self.epsilon);
        let log_mu = -(m as f64).ln();
        let log_nu = -(n as f64).ln();

        let (lo, hi) = cost.min_max();
        let ratio = (hi - lo) / self.epsilon;
        let warning = if ratio > STIFF_KERNEL_RATIO {
            Some(NumericalWarning::StiffKernel { ratio })
        } else {
            None
        };

        let mut f_history: Vec<Vec<f64>> = Vec::with_capacity(self.iterations);
        let mut g_history: Vec<Vec<f64>> = Vec::with_capacity(self.iterations + 1);
        g_history.push(vec![0.0; n]);

        for _ in 0..self.iterations {
            let g = &g_history[g_history.len() - 1];
            let f: Vec<f64> = (0..m)
                .map(|i| {
                    let row = log_kernel.row(i);
                    log_mu - log_sum_exp(row.iter().zip(g.iter()).map(|(l, gj)| l + gj))
                })
                .collect();
            let g_next: Vec<f64> = (0..n)
                .map(|j| {
                    log_nu - log_sum_exp((0..m).map(|i| log_kernel.get(i, j) + f[i]))
                })
                .collect();
            f_history.push(f);
            g_history.push(g_next);
        }

        let coupling = match (f_history.last(), g_history.last()) {
            (Some(f), Some(g)) => {
                DenseMatrix::from_fn(m, n, |i, j| (log_kernel.get(i, j) + f[i] + g[j]).exp())
            }
            // Zero iterations: the plain Gibbs kernel normalized to unit mass
            _ => {
                let total = log_sum_exp(log_kernel.data.iter().copied());
                log_kernel.map(|l| (l - total).exp())
            }
        };

        TransportPlan {
            coupling,
            log_kernel,
            f_history,
            g_history,
            log_mu,
            log_nu,
            warning,
        }
    }

    /// Reverse-mode pass through the unrolled iterations.
    /// Given dL/dP returns dL/dC.
    pub fn backward(&self, plan: &TransportPlan, grad_coupling: &DenseMatrix) -> DenseMatrix {
        let (m, n) = plan.shape();
        assert_eq!(grad_coupling.shape(), (m, n), "Gradient shape differs from coupling");
        let log_kernel = &plan.log_kernel;

        // Gradient with respect to the log kernel, accumulated over all iterations
        let mut grad_log_kernel = DenseMatrix::from_fn(m, n, |i, j| {
            grad_coupling.get(i, j) * plan.coupling.get(i, j)
        });

        if plan.f_history.is_empty() {
            // P = softmax over all entries
            let total: f64 = grad_log_kernel.data.iter().sum();
            for (gl, p) in grad_log_kernel.data.iter_mut().zip(plan.coupling.data.iter()) {
                *gl -= p * total;
            }
            return grad_log_kernel.map(|v| -v / self.epsilon);
        }

        let mut grad_f = grad_log_kernel.row_sums();
        let mut grad_g = grad_log_kernel.col_sums();

        for k in (0..plan.f_history.len()).rev() {
            let f = &plan.f_history[k];
            let g = &plan.g_history[k + 1];
            let g_prev = &plan.g_history[k];

            // g_k[j] = log nu - LSE_i(L[i,j] + f_k[i])
            for i in 0..m {
                for j in 0..n {
                    let q = (log_kernel.get(i, j) + f[i] + g[j] - plan.log_nu).exp();
                    let w = grad_g[j] * q;
                    grad_log_kernel.data[i * n + j] -= w;
                    grad_f[i] -= w;
                }
            }

            // f_k[i] = log mu - LSE_j(L[i,j] + g_{k-1}[j])
            let mut grad_g_prev = vec![0.0; n];
            for i in 0..m {
                for j in 0..n {
                    let r = (log_kernel.get(i, j) + g_prev[j] + f[i] - plan.log_mu).exp();
                    let w = grad_f[i] * r;
                    grad_log_kernel.data[i * n + j] -= w;
                    grad_g_prev[j] -= w;
                }
            }
            grad_g = grad_g_prev;
            grad_f = vec![0.0; m];
        }

        grad_log_kernel.map(|v| -v / self.epsilon)
    }
}
