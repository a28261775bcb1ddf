//! Binary writers for trained maps, rotation banks, and mapping results.

use crate::error::Result;
use crate::storage::header::{FileHeader, LAYOUT_CARTESIAN};
use crate::tensor::Tensor;
use std::io::Write;

/// Writes a trained cartesian SOM as one composite image.
///
/// The composite has shape `(som_h * neuron_h, som_w * neuron_w)`; block
/// `(i, j)` starts at pixel `(i * neuron_h, j * neuron_w)` and contains the
/// weights of cell `i * som_w + j`. The image is stored as a single-entry
/// container so it can be read back with a `DataIterator`.
pub fn write_som_grid<W: Write>(
    weights: &Tensor<f32>,
    som_h: usize,
    som_w: usize,
    neuron_h: usize,
    neuron_w: usize,
    writer: &mut W,
) -> Result<()> {
    debug_assert_eq!(weights.entries(), som_h * som_w);
    debug_assert_eq!(weights.entry_len(), neuron_h * neuron_w);

    let full_w = som_w * neuron_w;
    let mut composite = vec![0.0f32; som_h * neuron_h * full_w];

    for i in 0..som_h {
        for j in 0..som_w {
            let cell = weights.entry(i * som_w + j);
            for y in 0..neuron_h {
                let dst = (i * neuron_h + y) * full_w + j * neuron_w;
                composite[dst..dst + neuron_w]
                    .copy_from_slice(&cell[y * neuron_w..(y + 1) * neuron_w]);
            }
        }
    }

    write_single_image(&composite, som_h * neuron_h, full_w, writer)
}

/// Writes a non-rectangular SOM as a vertical stack of neuron images,
/// one block per cell in enumeration order.
pub fn write_som_stack<W: Write>(
    weights: &Tensor<f32>,
    neuron_h: usize,
    neuron_w: usize,
    writer: &mut W,
) -> Result<()> {
    debug_assert_eq!(weights.entry_len(), neuron_h * neuron_w);
    write_single_image(
        weights.as_slice(),
        weights.entries() * neuron_h,
        neuron_w,
        writer,
    )
}

/// Writes a rotation bank as a vertical stack of its `2R` variants.
pub fn write_rotation_bank<W: Write>(
    bank: &Tensor<f32>,
    neuron_h: usize,
    neuron_w: usize,
    writer: &mut W,
) -> Result<()> {
    debug_assert_eq!(bank.entry_len(), neuron_h * neuron_w);
    write_single_image(bank.as_slice(), bank.entries() * neuron_h, neuron_w, writer)
}

fn write_single_image<W: Write>(
    pixels: &[f32],
    height: usize,
    width: usize,
    writer: &mut W,
) -> Result<()> {
    debug_assert_eq!(pixels.len(), height * width);
    let header = FileHeader {
        entry_count: 1,
        layout: LAYOUT_CARTESIAN,
        extents: vec![height as u32, width as u32],
    };
    header.write(writer)?;
    write_f32_payload(pixels, writer)
}

/// Streaming writer for per-image mapping results.
///
/// The output is a container whose entries are distance vectors of length
/// `cells`, one per mapped input image.
pub struct MappingWriter<W> {
    writer: W,
    expected: u32,
    written: u32,
}

impl<W: Write> MappingWriter<W> {
    /// Writes the container header for `entry_count` images over a map of
    /// `cells` cells.
    pub fn new(mut writer: W, entry_count: usize, cells: usize) -> Result<Self> {
        let header = FileHeader {
            entry_count: entry_count as u32,
            layout: LAYOUT_CARTESIAN,
            extents: vec![cells as u32],
        };
        header.write(&mut writer)?;
        Ok(Self {
            writer,
            expected: entry_count as u32,
            written: 0,
        })
    }

    /// Appends one distance vector.
    pub fn write_distances(&mut self, distances: &[f32]) -> Result<()> {
        debug_assert!(self.written < self.expected);
        write_f32_payload(distances, &mut self.writer)?;
        self.written += 1;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn write_f32_payload<W: Write>(values: &[f32], writer: &mut W) -> Result<()> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for &value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    writer.write_all(&bytes)?;
    Ok(())
}
