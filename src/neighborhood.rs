//! Neighborhood weighting functions over grid distances.
//!
//! During an update every neuron is pulled toward the input by a factor
//! proportional to a monotonically decreasing function of its grid distance
//! to the best-matching unit. Two functions are provided: a Gaussian bell
//! and the Mexican-hat wavelet.

use crate::config::NeighborhoodKind;
use crate::error::{NebulaError, Result};
use std::f32::consts::PI;

/// Gaussian neighborhood: `1/(sigma * sqrt(2*pi)) * exp(-x^2 / (2*sigma^2))`.
#[derive(Debug, Clone, Copy)]
pub struct Gaussian {
    sigma: f32,
    norm: f32,
}

impl Gaussian {
    /// Creates the functor; `sigma` must be positive.
    pub fn new(sigma: f32) -> Result<Self> {
        if !(sigma > 0.0) {
            return Err(NebulaError::InvalidParameter(format!(
                "gaussian sigma must be positive, got {sigma}"
            )));
        }
        Ok(Self {
            sigma,
            norm: 1.0 / (sigma * (2.0 * PI).sqrt()),
        })
    }

    /// Evaluates the functor at `x`.
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        self.norm * (-0.5 * (x / self.sigma).powi(2)).exp()
    }
}

/// Mexican-hat neighborhood:
/// `2/(sqrt(3*sigma) * pi^(1/4)) * (1 - x^2/sigma^2) * exp(-x^2 / (2*sigma^2))`.
///
/// The normalisation uses `sigma` (not `sigma^2`) under the root.
#[derive(Debug, Clone, Copy)]
pub struct MexicanHat {
    sigma: f32,
    norm: f32,
}

impl MexicanHat {
    /// Creates the functor; `sigma` must be positive.
    pub fn new(sigma: f32) -> Result<Self> {
        if !(sigma > 0.0) {
            return Err(NebulaError::InvalidParameter(format!(
                "mexican-hat sigma must be positive, got {sigma}"
            )));
        }
        Ok(Self {
            sigma,
            norm: 2.0 / ((3.0 * sigma).sqrt() * PI.powf(0.25)),
        })
    }

    /// Evaluates the functor at `x`.
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        let x2 = x * x;
        let sigma2 = self.sigma * self.sigma;
        self.norm * (1.0 - x2 / sigma2) * (-x2 / (2.0 * sigma2)).exp()
    }
}

/// Runtime-selected neighborhood function.
#[derive(Debug, Clone, Copy)]
pub enum Neighborhood {
    /// Gaussian bell curve.
    Gaussian(Gaussian),
    /// Mexican-hat wavelet.
    MexicanHat(MexicanHat),
}

impl Neighborhood {
    /// Builds the selected functor for the given width.
    pub fn new(kind: NeighborhoodKind, sigma: f32) -> Result<Self> {
        Ok(match kind {
            NeighborhoodKind::Gaussian => Neighborhood::Gaussian(Gaussian::new(sigma)?),
            NeighborhoodKind::MexicanHat => Neighborhood::MexicanHat(MexicanHat::new(sigma)?),
        })
    }

    /// Evaluates the functor at grid distance `x`.
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        match self {
            Neighborhood::Gaussian(g) => g.eval(x),
            Neighborhood::MexicanHat(m) => m.eval(x),
        }
    }
}
