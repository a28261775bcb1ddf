//! The sequential training loop and the mapping pass.
//!
//! Images are consumed one at a time; each per-image step runs its three
//! data-parallel regions (bank population, matching, update) to completion
//! before the next image is read, because updates do not commute.

use crate::config::TrainConfig;
use crate::error::{NebulaError, Result};
use crate::grid::GridLayout;
use crate::neighborhood::Neighborhood;
use crate::som::{find_best_match, MatchResult, RotationBank, Som};
use crate::storage::DataIterator;
use log::{debug, info};
use std::io::{Read, Seek};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation handle, checked at the top of every per-image
/// iteration. Cancelling never interrupts an in-flight update, so the map
/// stays consistent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Checks whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Summary of a completed training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingReport {
    /// Number of per-image steps applied.
    pub samples: usize,
    /// Number of full passes over the input.
    pub epochs: usize,
}

/// Drives SOM training over a data stream.
pub struct SomTrainer {
    config: TrainConfig,
}

impl SomTrainer {
    /// Creates a trainer, validating the configuration.
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Neighborhood width at training progress `t` in [0, 1].
    #[inline]
    pub fn sigma_at(&self, t: f32) -> f32 {
        self.config.sigma.value_at(t)
    }

    /// Damping at training progress `t` in [0, 1].
    #[inline]
    pub fn damping_at(&self, t: f32) -> f32 {
        self.config.damping.value_at(t)
    }

    /// Trains `som` over all epochs of the stream.
    pub fn train<L, R>(
        &self,
        som: &mut Som<L>,
        data: &mut DataIterator<R>,
        cancel: &CancelToken,
    ) -> Result<TrainingReport>
    where
        L: GridLayout + Sync,
        R: Read + Seek,
    {
        self.train_with_progress(som, data, cancel, |_, _| {})
    }

    /// Trains `som`, invoking `on_step(step, total_steps)` after every
    /// applied image.
    pub fn train_with_progress<L, R, F>(
        &self,
        som: &mut Som<L>,
        data: &mut DataIterator<R>,
        cancel: &CancelToken,
        mut on_step: F,
    ) -> Result<TrainingReport>
    where
        L: GridLayout + Sync,
        R: Read + Seek,
        F: FnMut(usize, usize),
    {
        let (image_h, image_w) = image_extents(som, data)?;
        let mut bank = RotationBank::new(
            image_h,
            image_w,
            som.neuron_height(),
            som.neuron_width(),
            self.config.rotations,
        )?;

        let positions: Vec<L::Position> = som.layout().enumerate().collect();
        let total_steps = data.total() * self.config.epochs;

        info!(
            "Training: {} cells, {} images, {} epochs, {} variants per image",
            som.cells(),
            data.total(),
            self.config.epochs,
            bank.len()
        );

        let mut step = 0usize;
        for epoch in 0..self.config.epochs {
            if epoch > 0 {
                data.rewind()?;
            }

            while let Some(image) = data.current() {
                if cancel.is_cancelled() {
                    info!("Cancelled after {step} steps; map left consistent");
                    return Err(NebulaError::Cancelled);
                }

                let t = step as f32 / total_steps as f32;
                let sigma = self.sigma_at(t);
                let damping = self.damping_at(t);
                let neighborhood = Neighborhood::new(self.config.neighborhood, sigma)?;

                bank.fill(image)?;
                let matched = find_best_match(som, &bank)?;
                som.update(&positions, &bank, &matched, &neighborhood, damping)?;

                step += 1;
                on_step(step, total_steps);
                if step % 1000 == 0 {
                    debug!("step {step}/{total_steps}: sigma={sigma:.4} damping={damping:.4}");
                }
                data.advance()?;
            }

            info!("Epoch {}/{} complete", epoch + 1, self.config.epochs);
        }

        Ok(TrainingReport {
            samples: step,
            epochs: self.config.epochs,
        })
    }
}

/// Streams images through a trained map, yielding the match result per
/// image in stream order.
pub fn map_images<L, R, F>(
    som: &Som<L>,
    data: &mut DataIterator<R>,
    rotations: u32,
    mut on_result: F,
) -> Result<usize>
where
    L: GridLayout + Sync,
    R: Read + Seek,
    F: FnMut(usize, &MatchResult) -> Result<()>,
{
    let (image_h, image_w) = image_extents(som, data)?;
    let mut bank = RotationBank::new(
        image_h,
        image_w,
        som.neuron_height(),
        som.neuron_width(),
        rotations,
    )?;

    let mut index = 0usize;
    while let Some(image) = data.current() {
        bank.fill(image)?;
        let matched = find_best_match(som, &bank)?;
        on_result(index, &matched)?;
        index += 1;
        data.advance()?;
    }

    Ok(index)
}

fn image_extents<L: GridLayout, R: Read + Seek>(
    som: &Som<L>,
    data: &DataIterator<R>,
) -> Result<(usize, usize)> {
    let extents = &data.header().extents;
    if extents.len() != 2 {
        return Err(NebulaError::InvalidParameter(format!(
            "input entries must be 2-D images, got {}-D",
            extents.len()
        )));
    }
    let (h, w) = (extents[0] as usize, extents[1] as usize);
    if h < som.neuron_height() || w < som.neuron_width() {
        return Err(NebulaError::InvalidParameter(format!(
            "input images {h}x{w} smaller than neurons {}x{}",
            som.neuron_height(),
            som.neuron_width()
        )));
    }
    Ok((h, w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Initialization, NeighborhoodKind, Schedule, SomConfig};
    use crate::grid::CartesianLayout;
    use crate::storage::{FileHeader, LAYOUT_CARTESIAN};
    use std::io::Cursor;

    fn make_stream(entries: &[Vec<f32>], h: u32, w: u32) -> DataIterator<Cursor<Vec<u8>>> {
        let header = FileHeader {
            entry_count: entries.len() as u32,
            layout: LAYOUT_CARTESIAN,
            extents: vec![h, w],
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        for entry in entries {
            for &v in entry {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        DataIterator::open(Cursor::new(bytes)).unwrap()
    }

    fn single_cell_som(neuron: usize) -> Som<CartesianLayout<2>> {
        let config = SomConfig {
            neuron_height: neuron,
            neuron_width: neuron,
            init: Initialization::Zero,
            seed: None,
        };
        Som::new(CartesianLayout::new([1, 1]).unwrap(), &config).unwrap()
    }

    #[test]
    fn test_identity_training_converges_to_input() {
        // One cell, image equal to neuron size, no rotation ambiguity:
        // repeated pulls with a constant factor converge to the input.
        let image: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();
        let mut data = make_stream(&[image.clone()], 4, 4);
        let mut som = single_cell_som(4);

        let config = TrainConfig {
            rotations: 1,
            epochs: 60,
            sigma: Schedule::constant(1.0),
            damping: Schedule::constant(1.0),
            neighborhood: NeighborhoodKind::Gaussian,
        };
        let trainer = SomTrainer::new(config).unwrap();
        let report = trainer
            .train(&mut som, &mut data, &CancelToken::new())
            .unwrap();

        assert_eq!(report.samples, 60);
        for (w, v) in som.neuron(0).iter().zip(image.iter()) {
            assert!((w - v).abs() < 1e-4, "{w} vs {v}");
        }
    }

    #[test]
    fn test_training_report_counts() {
        let entries: Vec<Vec<f32>> = (0..3).map(|i| vec![i as f32; 16]).collect();
        let mut data = make_stream(&entries, 4, 4);
        let mut som = single_cell_som(4);

        let config = TrainConfig {
            rotations: 2,
            epochs: 2,
            ..Default::default()
        };
        let trainer = SomTrainer::new(config).unwrap();
        let mut steps_seen = Vec::new();
        let report = trainer
            .train_with_progress(&mut som, &mut data, &CancelToken::new(), |step, total| {
                steps_seen.push((step, total));
            })
            .unwrap();

        assert_eq!(report.samples, 6);
        assert_eq!(report.epochs, 2);
        assert_eq!(steps_seen.last(), Some(&(6, 6)));
    }

    #[test]
    fn test_cancel_before_first_step() {
        let mut data = make_stream(&[vec![1.0; 16]], 4, 4);
        let mut som = single_cell_som(4);
        let before = som.weights().clone();

        let cancel = CancelToken::new();
        cancel.cancel();

        let trainer = SomTrainer::new(TrainConfig::default()).unwrap();
        let err = trainer.train(&mut som, &mut data, &cancel).unwrap_err();
        assert!(matches!(err, NebulaError::Cancelled));
        assert_eq!(som.weights(), &before);
    }

    #[test]
    fn test_rejects_undersized_images() {
        let mut data = make_stream(&[vec![1.0; 4]], 2, 2);
        let mut som = single_cell_som(4);

        let trainer = SomTrainer::new(TrainConfig::default()).unwrap();
        let err = trainer
            .train(&mut som, &mut data, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, NebulaError::InvalidParameter(_)));
    }

    #[test]
    fn test_training_is_deterministic() {
        let entries: Vec<Vec<f32>> = (0..4)
            .map(|i| (0..36).map(|p| ((i * 37 + p) % 11) as f32 / 11.0).collect())
            .collect();

        let run = || {
            let mut data = make_stream(&entries, 6, 6);
            let config = SomConfig {
                neuron_height: 4,
                neuron_width: 4,
                init: Initialization::Random,
                seed: Some(11),
            };
            let mut som = Som::new(CartesianLayout::new([3, 3]).unwrap(), &config).unwrap();
            let trainer = SomTrainer::new(TrainConfig {
                rotations: 4,
                epochs: 2,
                ..Default::default()
            })
            .unwrap();
            trainer
                .train(&mut som, &mut data, &CancelToken::new())
                .unwrap();
            som.weights().clone()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_map_images_finds_trained_prototype() {
        let image: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();
        let mut som = single_cell_som(4);
        som.weights_mut().entry_mut(0).copy_from_slice(&image);

        let mut data = make_stream(&[image], 4, 4);
        let mut bmus = Vec::new();
        let count = map_images(&som, &mut data, 1, |_, matched| {
            bmus.push(matched.bmu);
            Ok(())
        })
        .unwrap();

        assert_eq!(count, 1);
        assert_eq!(bmus, vec![0]);
    }
}
