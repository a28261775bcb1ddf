//! Configuration for the Nebula SOM engine.

use crate::error::{NebulaError, Result};
use serde::{Deserialize, Serialize};

/// Weight initialization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Initialization {
    /// All weights start at 0.
    Zero,
    /// Weights start uniform-random in [0, 1].
    Random,
}

/// Neighborhood function selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeighborhoodKind {
    /// Gaussian bell curve.
    Gaussian,
    /// Mexican-hat (Ricker) wavelet.
    MexicanHat,
}

/// Self-Organizing Map construction parameters.
///
/// The grid topology itself is passed to [`Som::new`](crate::Som::new) as a
/// layout value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SomConfig {
    /// Neuron image height in pixels.
    pub neuron_height: usize,

    /// Neuron image width in pixels.
    pub neuron_width: usize,

    /// Weight initialization mode.
    pub init: Initialization,

    /// Random seed for reproducibility.
    /// Default: None (random).
    pub seed: Option<u64>,
}

impl Default for SomConfig {
    fn default() -> Self {
        Self {
            neuron_height: 64,
            neuron_width: 64,
            init: Initialization::Zero,
            seed: None,
        }
    }
}

impl SomConfig {
    /// Checks the configuration, returning `InvalidParameter` on nonsense.
    pub fn validate(&self) -> Result<()> {
        if self.neuron_height == 0 || self.neuron_width == 0 {
            return Err(NebulaError::InvalidParameter(format!(
                "neuron dimensions must be positive, got {}x{}",
                self.neuron_height, self.neuron_width
            )));
        }
        Ok(())
    }
}

/// A nonincreasing exponential schedule over training progress.
///
/// `value_at(0.0)` is `start`, `value_at(1.0)` is `end`, with geometric
/// interpolation in between.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Schedule {
    /// Value at the beginning of training.
    pub start: f32,
    /// Value at the end of training.
    pub end: f32,
}

impl Schedule {
    /// Creates a constant schedule.
    pub fn constant(value: f32) -> Self {
        Self {
            start: value,
            end: value,
        }
    }

    /// Evaluates the schedule at progress `t` in [0, 1].
    #[inline]
    pub fn value_at(&self, t: f32) -> f32 {
        self.start * (self.end / self.start).powf(t)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.start > 0.0) || !(self.end > 0.0) {
            return Err(NebulaError::InvalidParameter(format!(
                "{name} schedule must be positive, got {} -> {}",
                self.start, self.end
            )));
        }
        if self.end > self.start {
            return Err(NebulaError::InvalidParameter(format!(
                "{name} schedule must be nonincreasing, got {} -> {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Training hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of discrete rotations per image (the bank holds `2 * rotations`
    /// variants). Default: 360.
    pub rotations: u32,

    /// Number of passes over the input stream.
    /// Default: 1.
    pub epochs: usize,

    /// Neighborhood width schedule.
    pub sigma: Schedule,

    /// Learning-rate damping schedule; values must stay in (0, 1].
    pub damping: Schedule,

    /// Neighborhood function applied to grid distances.
    pub neighborhood: NeighborhoodKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            rotations: 360,
            epochs: 1,
            sigma: Schedule::constant(1.1),
            damping: Schedule::constant(0.2),
            neighborhood: NeighborhoodKind::Gaussian,
        }
    }
}

impl TrainConfig {
    /// Checks the configuration, returning `InvalidParameter` on nonsense.
    pub fn validate(&self) -> Result<()> {
        if self.rotations < 1 {
            return Err(NebulaError::InvalidParameter(
                "rotations must be at least 1".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(NebulaError::InvalidParameter(
                "epochs must be at least 1".to_string(),
            ));
        }
        self.sigma.validate("sigma")?;
        self.damping.validate("damping")?;
        if self.damping.start > 1.0 {
            return Err(NebulaError::InvalidParameter(format!(
                "damping must be in (0, 1], got {}",
                self.damping.start
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_endpoints() {
        let s = Schedule {
            start: 4.0,
            end: 1.0,
        };
        assert!((s.value_at(0.0) - 4.0).abs() < 1e-6);
        assert!((s.value_at(1.0) - 1.0).abs() < 1e-6);
        assert!(s.value_at(0.5) < 4.0);
        assert!(s.value_at(0.5) > 1.0);
    }

    #[test]
    fn test_constant_schedule() {
        let s = Schedule::constant(0.5);
        assert_eq!(s.value_at(0.0), 0.5);
        assert_eq!(s.value_at(0.7), 0.5);
    }

    #[test]
    fn test_validation_rejects_bad_sigma() {
        let config = TrainConfig {
            sigma: Schedule::constant(-1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_increasing_schedule() {
        let config = TrainConfig {
            sigma: Schedule {
                start: 1.0,
                end: 2.0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_rotations() {
        let config = TrainConfig {
            rotations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_som_config_is_valid() {
        assert!(SomConfig::default().validate().is_ok());
        assert!(TrainConfig::default().validate().is_ok());
    }
}
