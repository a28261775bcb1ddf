//! The self-organizing map: a grid layout plus prototype weights.

use crate::config::{Initialization, SomConfig};
use crate::error::{NebulaError, Result};
use crate::grid::GridLayout;
use crate::neighborhood::Neighborhood;
use crate::som::{MatchResult, RotationBank};
use crate::tensor::Tensor;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A self-organizing map over grid layout `L`.
///
/// Each grid cell holds a prototype image of `neuron_height x neuron_width`
/// pixels. The weight tensor has shape `(cells, neuron_height, neuron_width)`
/// and is mutated only by the training update; its shape is fixed at
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Som<L> {
    layout: L,
    neuron_height: usize,
    neuron_width: usize,
    weights: Tensor<f32>,
}

impl<L: GridLayout> Som<L> {
    /// Creates a map over `layout` with weights initialized per the config.
    pub fn new(layout: L, config: &SomConfig) -> Result<Self> {
        config.validate()?;

        let cells = layout.size();
        let shape = [cells, config.neuron_height, config.neuron_width];
        let len: usize = shape.iter().product();
        let weights = match config.init {
            Initialization::Zero => Tensor::filled(&shape, 0.0),
            Initialization::Random => {
                let mut rng = match config.seed {
                    Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                    None => ChaCha8Rng::from_entropy(),
                };
                let data = (0..len).map(|_| rng.gen_range(0.0..=1.0)).collect();
                Tensor::from_vec(&shape, data)?
            }
        };

        Ok(Self {
            layout,
            neuron_height: config.neuron_height,
            neuron_width: config.neuron_width,
            weights,
        })
    }

    /// Returns the grid layout.
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Total number of grid cells.
    pub fn cells(&self) -> usize {
        self.layout.size()
    }

    /// Neuron image height in pixels.
    pub fn neuron_height(&self) -> usize {
        self.neuron_height
    }

    /// Neuron image width in pixels.
    pub fn neuron_width(&self) -> usize {
        self.neuron_width
    }

    /// Pixel count of one neuron.
    pub fn neuron_len(&self) -> usize {
        self.neuron_height * self.neuron_width
    }

    /// Returns the weight tensor of shape `(cells, neuron_h, neuron_w)`.
    pub fn weights(&self) -> &Tensor<f32> {
        &self.weights
    }

    /// Returns the weight tensor mutably.
    pub fn weights_mut(&mut self) -> &mut Tensor<f32> {
        &mut self.weights
    }

    /// Returns the prototype image of cell `k`.
    pub fn neuron(&self, k: usize) -> &[f32] {
        self.weights.entry(k)
    }
}

impl<L: GridLayout + Sync> Som<L> {
    /// Pulls every neuron toward its best-aligned input variant.
    ///
    /// For each cell `k` the update is
    /// `W[k] -= (W[k] - V[B[k]]) * damping * phi(d(bmu, k))`, a linear
    /// interpolation toward variant `B[k]`: a factor of 0 leaves the neuron
    /// untouched and a factor of 1 replaces it outright. Cells are updated
    /// in parallel over disjoint weight slices.
    ///
    /// `positions` must be the layout's enumeration, as produced by
    /// [`GridLayout::enumerate`].
    pub fn update(
        &mut self,
        positions: &[L::Position],
        bank: &RotationBank,
        matched: &MatchResult,
        neighborhood: &Neighborhood,
        damping: f32,
    ) -> Result<()> {
        let neuron_len = self.neuron_len();
        if bank.variants().entry_len() != neuron_len {
            return Err(NebulaError::DimensionMismatch {
                expected: neuron_len,
                actual: bank.variants().entry_len(),
            });
        }
        debug_assert_eq!(positions.len(), self.cells());
        debug_assert_eq!(matched.best_rotations.len(), self.cells());

        let bmu_pos = positions[matched.bmu];
        let layout = &self.layout;
        let variants = bank.variants();

        self.weights
            .as_mut_slice()
            .par_chunks_mut(neuron_len)
            .enumerate()
            .for_each(|(k, weights)| {
                let grid_dist = layout.distance(&bmu_pos, &positions[k]);
                let factor = damping * neighborhood.eval(grid_dist);
                blend_toward(weights, variants.entry(matched.best_rotations[k]), factor);
            });

        Ok(())
    }
}

/// The per-neuron update primitive: linear interpolation of `neuron` toward
/// `variant` by `factor`.
///
/// A factor of 0 leaves `neuron` bit-identical; a factor of 1 makes it
/// bit-identical to `variant`.
pub fn blend_toward(neuron: &mut [f32], variant: &[f32], factor: f32) {
    debug_assert_eq!(neuron.len(), variant.len());
    let keep = 1.0 - factor;
    for (w, &v) in neuron.iter_mut().zip(variant) {
        *w = *w * keep + v * factor;
    }
}

impl<L: GridLayout + Serialize> Som<L> {
    /// Saves a checkpoint of the map.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }
}

impl<L: GridLayout + DeserializeOwned> Som<L> {
    /// Loads a checkpoint written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let som = bincode::deserialize_from(BufReader::new(file))?;
        Ok(som)
    }
}
