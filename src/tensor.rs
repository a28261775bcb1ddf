//! Dense multi-dimensional buffers for neurons and image data.

use crate::error::{NebulaError, Result};
use serde::{Deserialize, Serialize};

/// A dense tensor: a flat contiguous buffer plus a shape.
///
/// The shape is fixed at construction. Entries along the first axis are the
/// unit of access for neurons and rotation-bank slots, so `entry(k)` returns
/// the contiguous sub-buffer of entry `k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Clone> Tensor<T> {
    /// Creates a tensor of the given shape filled with `value`.
    pub fn filled(shape: &[usize], value: T) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![value; len],
        }
    }
}

impl<T> Tensor<T> {
    /// Wraps an existing buffer, checking that its length matches the shape.
    pub fn from_vec(shape: &[usize], data: Vec<T>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(NebulaError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            data,
        })
    }

    /// Returns the tensor shape.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the total element count.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks whether the tensor has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of elements in one first-axis entry.
    #[inline]
    pub fn entry_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Number of first-axis entries.
    #[inline]
    pub fn entries(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Returns the contiguous buffer of entry `k`.
    #[inline]
    pub fn entry(&self, k: usize) -> &[T] {
        debug_assert!(k < self.entries(), "entry {} out of {}", k, self.entries());
        let n = self.entry_len();
        &self.data[k * n..(k + 1) * n]
    }

    /// Returns the mutable buffer of entry `k`.
    #[inline]
    pub fn entry_mut(&mut self, k: usize) -> &mut [T] {
        debug_assert!(k < self.entries(), "entry {} out of {}", k, self.entries());
        let n = self.entry_len();
        &mut self.data[k * n..(k + 1) * n]
    }

    /// Returns the whole flat buffer.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Returns the whole flat buffer mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the tensor, returning the flat buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}
