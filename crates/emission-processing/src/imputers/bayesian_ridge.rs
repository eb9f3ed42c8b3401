//! Bayesian ridge regression.
//!
//! A linear model with a zero-mean Gaussian prior over the coefficients
//! (precision `lambda`) and Gaussian noise (precision `alpha`). Both
//! precisions carry Gamma hyper-priors and are estimated by maximising the
//! marginal likelihood. The fitted posterior covariance gives each
//! prediction a standard deviation, used when the imputer samples from the
//! predictive distribution.

use crate::error::{EmissionsError, Result};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use tracing::trace;

/// Eigenvalues below this fraction of the largest one are treated as zero.
const RANK_CUTOFF: f64 = 1e-12;

/// Hyper-parameters of the Bayesian ridge fit.
#[derive(Debug, Clone)]
pub struct BayesianRidge {
    /// Maximum number of evidence-maximisation iterations.
    pub max_iter: usize,
    /// Stop once the L1 change of the coefficients drops below this.
    pub tol: f64,
    /// Gamma shape prior over `alpha`.
    pub alpha_1: f64,
    /// Gamma rate prior over `alpha`.
    pub alpha_2: f64,
    /// Gamma shape prior over `lambda`.
    pub lambda_1: f64,
    /// Gamma rate prior over `lambda`.
    pub lambda_2: f64,
}

impl Default for BayesianRidge {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tol: 1e-3,
            alpha_1: 1e-6,
            alpha_2: 1e-6,
            lambda_1: 1e-6,
            lambda_2: 1e-6,
        }
    }
}

/// A fitted Bayesian ridge model.
#[derive(Debug, Clone)]
pub struct FittedBayesianRidge {
    pub coef: DVector<f64>,
    pub intercept: f64,
    /// Estimated noise precision.
    pub alpha: f64,
    /// Estimated weight precision.
    pub lambda: f64,
    /// Posterior covariance of the coefficients.
    pub sigma: DMatrix<f64>,
    /// Iterations used by the evidence maximisation.
    pub n_iter: usize,
    x_offset: DVector<f64>,
}

impl BayesianRidge {
    /// Fit the model on `x` (one row per sample) and targets `y`.
    ///
    /// `target` only names the regressed field in error messages.
    pub fn fit(&self, x: &DMatrix<f64>, y: &DVector<f64>, target: &str) -> Result<FittedBayesianRidge> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples == 0 || y.len() != n_samples {
            return Err(EmissionsError::FitFailed {
                target: target.to_string(),
                reason: format!("{} samples for {} targets", n_samples, y.len()),
            });
        }

        // Center the data so the intercept drops out of the solve
        let x_offset = DVector::from_fn(n_features, |j, _| x.column(j).mean());
        let y_offset = y.mean();
        let mut xc = x.clone();
        for j in 0..n_features {
            xc.column_mut(j).add_scalar_mut(-x_offset[j]);
        }
        let yc = y.add_scalar(-y_offset);

        let xtx = xc.tr_mul(&xc);
        let xty = xc.tr_mul(&yc);

        let eigen = SymmetricEigen::new(xtx);
        let largest = eigen.eigenvalues.iter().copied().fold(0.0_f64, f64::max);
        let cutoff = largest.max(1.0) * RANK_CUTOFF;
        let eigenvalues: Vec<f64> = eigen
            .eigenvalues
            .iter()
            .map(|&e| if e > cutoff { e } else { 0.0 })
            .collect();
        let eigenvectors = eigen.eigenvectors;
        let projected = eigenvectors.tr_mul(&xty);

        let variance = yc.norm_squared() / n_samples as f64;
        let mut alpha = 1.0 / (variance + f64::EPSILON);
        let mut lambda = 1.0;

        let solve = |alpha: f64, lambda: f64| -> DVector<f64> {
            let ratio = lambda / alpha;
            let mut scaled = projected.clone();
            for (k, value) in scaled.iter_mut().enumerate() {
                *value = if eigenvalues[k] > 0.0 {
                    *value / (eigenvalues[k] + ratio)
                } else {
                    0.0
                };
            }
            &eigenvectors * scaled
        };

        let mut coef_old: Option<DVector<f64>> = None;
        let mut n_iter = 0;
        for iter in 0..self.max_iter {
            n_iter = iter + 1;
            let coef = solve(alpha, lambda);
            let residual = &yc - &xc * &coef;
            let sse = residual.norm_squared();

            let gamma: f64 = eigenvalues
                .iter()
                .map(|&e| alpha * e / (lambda + alpha * e))
                .sum();
            lambda = (gamma + 2.0 * self.lambda_1) / (coef.norm_squared() + 2.0 * self.lambda_2);
            alpha = (n_samples as f64 - gamma + 2.0 * self.alpha_1) / (sse + 2.0 * self.alpha_2);

            if let Some(old) = &coef_old
                && (old - &coef).abs().sum() < self.tol
            {
                trace!("Bayesian ridge for '{}' converged after {} iterations", target, n_iter);
                break;
            }
            coef_old = Some(coef);
        }

        let coef = solve(alpha, lambda);
        let mut inverse = DMatrix::zeros(n_features, n_features);
        for k in 0..n_features {
            inverse[(k, k)] = 1.0 / (alpha * eigenvalues[k] + lambda);
        }
        let sigma = &eigenvectors * inverse * eigenvectors.transpose();
        let intercept = y_offset - x_offset.dot(&coef);

        if !intercept.is_finite() || coef.iter().any(|c| !c.is_finite()) || !alpha.is_finite() {
            return Err(EmissionsError::FitFailed {
                target: target.to_string(),
                reason: "non-finite coefficients".to_string(),
            });
        }

        Ok(FittedBayesianRidge {
            coef,
            intercept,
            alpha,
            lambda,
            sigma,
            n_iter,
            x_offset,
        })
    }
}

impl FittedBayesianRidge {
    /// Predictive mean for one sample.
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + features
                .iter()
                .zip(self.coef.iter())
                .map(|(x, c)| x * c)
                .sum::<f64>()
    }

    /// Predictive mean and standard deviation for one sample.
    pub fn predict_with_std(&self, features: &[f64]) -> (f64, f64) {
        let centered = DVector::from_iterator(
            features.len(),
            features.iter().zip(self.x_offset.iter()).map(|(x, m)| x - m),
        );
        let spread = centered.dot(&(&self.sigma * &centered));
        let std = (spread + 1.0 / self.alpha).max(0.0).sqrt();
        (self.predict(features), std)
    }
}
