//! # Nebula: rotation- and flip-invariant self-organizing maps
//!
//! Nebula trains a fixed grid of prototype neurons on a stream of 2D
//! images, assigning each input to its best-matching neuron under the best
//! discrete rotation and flip. It is built for unsupervised clustering of
//! astronomical image corpora, where the orientation of an object carries
//! no meaning.
//!
//! ## Overview
//!
//! Each training step expands the current image into a bank of `2R`
//! oriented variants (`R` rotations, with and without a horizontal flip),
//! finds the best-matching unit over all variants, and pulls every neuron
//! toward its own best-aligned variant with a neighborhood-weighted factor.
//!
//! ## Key Features
//!
//! - **Cartesian and hexagonal** neuron grid topologies
//! - **Rotation/flip invariance** via a discretized augmentation bank
//! - **Gaussian and Mexican-hat** neighborhood functions
//! - **Streaming binary input** with lazy, seekable iteration
//! - **Deterministic training**: parallel regions reproduce the serial
//!   result, ties included
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nebula::{CancelToken, DataIterator, Som, SomConfig, SomTrainer, TrainConfig};
//! use nebula::grid::CartesianLayout;
//!
//! let file = std::fs::File::open("images.bin")?;
//! let mut data = DataIterator::open(std::io::BufReader::new(file))?;
//!
//! let layout = CartesianLayout::new([10, 10])?;
//! let mut som = Som::new(layout, &SomConfig::default())?;
//!
//! let trainer = SomTrainer::new(TrainConfig::default())?;
//! trainer.train(&mut som, &mut data, &CancelToken::new())?;
//! ```
//!
//! ## Architecture
//!
//! - [`grid`] - neuron grid topologies and their metrics
//! - [`tensor`] - dense buffers for weights and image banks
//! - [`image`] - rotation, crop, flip, and distance kernels
//! - [`neighborhood`] - neighborhood weighting functions
//! - [`som`] - the map, matching, and the training loop
//! - [`storage`] - binary container format, readers and writers

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod grid;
pub mod image;
pub mod neighborhood;
pub mod som;
pub mod storage;
pub mod tensor;

// Re-export commonly used types
pub use config::{Initialization, NeighborhoodKind, Schedule, SomConfig, TrainConfig};
pub use error::{NebulaError, Result};
pub use grid::{CartesianLayout, GridLayout, HexLayout};
pub use neighborhood::{Gaussian, MexicanHat, Neighborhood};
pub use som::{
    find_best_match, map_images, CancelToken, MatchResult, RotationBank, Som, SomTrainer,
    TrainingReport,
};
pub use storage::{DataIterator, FileHeader, MappingWriter};
pub use tensor::Tensor;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
