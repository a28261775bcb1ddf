//! Rotation/flip bank generation.

use crate::error::{NebulaError, Result};
use crate::image::{crop, flip, rotate_and_crop};
use crate::tensor::Tensor;
use rayon::prelude::*;
use std::f32::consts::PI;

/// The bank of oriented variants of one input image.
///
/// For `R` rotations the bank holds `2R` slots of `neuron_h x neuron_w`
/// pixels: slot `i < R` is the input rotated by `i * 2*pi/R` and cropped,
/// slot `R + i` is the horizontally flipped input rotated by the same angle.
/// The bank and its scratch buffers are allocated once and refilled per
/// image.
pub struct RotationBank {
    rotations: u32,
    image_height: usize,
    image_width: usize,
    neuron_height: usize,
    neuron_width: usize,
    variants: Tensor<f32>,
    flipped: Vec<f32>,
}

impl RotationBank {
    /// Creates a bank for images of `image_h x image_w` cropped to neurons of
    /// `neuron_h x neuron_w`, with `rotations >= 1`.
    pub fn new(
        image_height: usize,
        image_width: usize,
        neuron_height: usize,
        neuron_width: usize,
        rotations: u32,
    ) -> Result<Self> {
        if rotations < 1 {
            return Err(NebulaError::InvalidParameter(
                "rotations must be at least 1".to_string(),
            ));
        }
        if image_height < neuron_height || image_width < neuron_width {
            return Err(NebulaError::InvalidParameter(format!(
                "image {image_height}x{image_width} smaller than neuron \
                 {neuron_height}x{neuron_width}"
            )));
        }

        Ok(Self {
            rotations,
            image_height,
            image_width,
            neuron_height,
            neuron_width,
            variants: Tensor::filled(&[2 * rotations as usize, neuron_height, neuron_width], 0.0),
            flipped: vec![0.0; image_height * image_width],
        })
    }

    /// Number of variants in the bank (`2 * rotations`).
    pub fn len(&self) -> usize {
        2 * self.rotations as usize
    }

    /// Checks whether the bank is empty (never true for a valid bank).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the variant tensor of shape `(2R, neuron_h, neuron_w)`.
    pub fn variants(&self) -> &Tensor<f32> {
        &self.variants
    }

    /// Returns the pixels of variant `j`.
    pub fn variant(&self, j: usize) -> &[f32] {
        self.variants.entry(j)
    }

    /// Populates all `2R` slots from `image`.
    ///
    /// Slots are written in parallel; each worker owns a distinct slot.
    pub fn fill(&mut self, image: &[f32]) -> Result<()> {
        if image.len() != self.image_height * self.image_width {
            return Err(NebulaError::DimensionMismatch {
                expected: self.image_height * self.image_width,
                actual: image.len(),
            });
        }

        let (h, w) = (self.image_height, self.image_width);
        let (nh, nw) = (self.neuron_height, self.neuron_width);
        let rotations = self.rotations as usize;
        let angle_step = 2.0 * PI / self.rotations as f32;

        flip(image, h, w, &mut self.flipped);
        let flipped = &self.flipped;

        self.variants
            .as_mut_slice()
            .par_chunks_mut(nh * nw)
            .enumerate()
            .for_each(|(slot, dst)| {
                let (src, step) = if slot < rotations {
                    (image, slot)
                } else {
                    (flipped.as_slice(), slot - rotations)
                };
                if step == 0 {
                    crop(src, h, w, dst, nh, nw);
                } else {
                    rotate_and_crop(src, h, w, dst, nh, nw, step as f32 * angle_step);
                }
            });

        Ok(())
    }
}
