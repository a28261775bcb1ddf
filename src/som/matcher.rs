//! Best-matching-unit search over the rotation bank.

use crate::error::{NebulaError, Result};
use crate::grid::GridLayout;
use crate::image::euclidean_distance;
use crate::som::{RotationBank, Som};
use rayon::prelude::*;

/// Result of matching one input image against the whole map.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Minimum distance per cell, over all bank variants.
    pub distances: Vec<f32>,
    /// Index of the best-aligned variant per cell.
    pub best_rotations: Vec<usize>,
    /// Linear index of the best-matching unit.
    pub bmu: usize,
}

/// Computes per-cell minimum distances and best variants, then the BMU.
///
/// The sweep over variants is serial per cell with a strict `<`, so the
/// lowest variant index wins ties; cells are processed in parallel. The BMU
/// scan runs in enumeration order with a strict `<`, so the first minimum
/// wins. The result is identical to a fully serial execution.
pub fn find_best_match<L: GridLayout + Sync>(
    som: &Som<L>,
    bank: &RotationBank,
) -> Result<MatchResult> {
    let neuron_len = som.neuron_len();
    if bank.variants().entry_len() != neuron_len {
        return Err(NebulaError::DimensionMismatch {
            expected: neuron_len,
            actual: bank.variants().entry_len(),
        });
    }

    let variants = bank.variants();
    let per_cell: Vec<(f32, usize)> = (0..som.cells())
        .into_par_iter()
        .map(|k| {
            let neuron = som.neuron(k);
            let mut best = f32::MAX;
            let mut best_j = 0;
            for j in 0..variants.entries() {
                let d = euclidean_distance(neuron, variants.entry(j));
                if d < best {
                    best = d;
                    best_j = j;
                }
            }
            (best, best_j)
        })
        .collect();

    let mut bmu = 0;
    let mut bmu_distance = f32::MAX;
    for (k, &(d, _)) in per_cell.iter().enumerate() {
        if d < bmu_distance {
            bmu_distance = d;
            bmu = k;
        }
    }

    let (distances, best_rotations) = per_cell.into_iter().unzip();
    Ok(MatchResult {
        distances,
        best_rotations,
        bmu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Initialization, SomConfig};
    use crate::grid::CartesianLayout;

    fn som_2x1(neuron: usize) -> Som<CartesianLayout<2>> {
        let config = SomConfig {
            neuron_height: neuron,
            neuron_width: neuron,
            init: Initialization::Zero,
            seed: None,
        };
        Som::new(CartesianLayout::new([1, 2]).unwrap(), &config).unwrap()
    }

    #[test]
    fn test_bmu_prefers_identical_neuron() {
        let image: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();

        let mut som = som_2x1(4);
        som.weights_mut().entry_mut(1).copy_from_slice(&image);

        let mut bank = RotationBank::new(4, 4, 4, 4, 1).unwrap();
        bank.fill(&image).unwrap();

        let result = find_best_match(&som, &bank).unwrap();
        assert_eq!(result.bmu, 1);
        assert_eq!(result.best_rotations[1], 0);
        assert_eq!(result.distances[1], 0.0);
        assert!(result.distances[0] > 0.0);
    }

    #[test]
    fn test_variant_tie_break_picks_lowest_index() {
        // A symmetric image flips onto itself, so variants 0 and 1 tie.
        let image = vec![0.5; 16];
        let som = som_2x1(4);

        let mut bank = RotationBank::new(4, 4, 4, 4, 1).unwrap();
        bank.fill(&image).unwrap();
        assert_eq!(bank.variant(0), bank.variant(1));

        let result = find_best_match(&som, &bank).unwrap();
        assert!(result.best_rotations.iter().all(|&j| j == 0));
    }

    #[test]
    fn test_bmu_tie_break_picks_first_cell() {
        // Both neurons are zero, so every cell ties; the first wins.
        let som = som_2x1(4);
        let mut bank = RotationBank::new(4, 4, 4, 4, 1).unwrap();
        bank.fill(&vec![1.0; 16]).unwrap();

        let result = find_best_match(&som, &bank).unwrap();
        assert_eq!(result.bmu, 0);
    }

    #[test]
    fn test_distances_are_nonnegative() {
        let som = som_2x1(4);
        let mut bank = RotationBank::new(6, 6, 4, 4, 2).unwrap();
        bank.fill(&(0..36).map(|i| i as f32).collect::<Vec<_>>()).unwrap();

        let result = find_best_match(&som, &bank).unwrap();
        assert!(result.distances.iter().all(|&d| d >= 0.0));
        assert!(result.best_rotations.iter().all(|&j| j < bank.len()));
    }
}
