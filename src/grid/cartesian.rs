//! n-dimensional Cartesian grid layout.

use crate::error::{NebulaError, Result};
use crate::grid::GridLayout;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// A d-dimensional box of cells with Euclidean distance.
///
/// Positions are integer coordinates `[u32; D]`; enumeration and linear
/// indexing are row-major (the last axis varies fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartesianLayout<const D: usize> {
    extents: [u32; D],
}

impl<const D: usize> Serialize for CartesianLayout<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.extents.as_slice().serialize(serializer)
    }
}

impl<'de, const D: usize> Deserialize<'de> for CartesianLayout<D> {
    fn deserialize<De: Deserializer<'de>>(
        deserializer: De,
    ) -> std::result::Result<Self, De::Error> {
        let extents: Vec<u32> = Vec::deserialize(deserializer)?;
        let extents: [u32; D] = extents
            .try_into()
            .map_err(|v: Vec<u32>| de::Error::invalid_length(v.len(), &"one extent per axis"))?;
        CartesianLayout::new(extents).map_err(de::Error::custom)
    }
}

impl<const D: usize> CartesianLayout<D> {
    /// Creates a layout with the given extents. Every extent must be positive.
    pub fn new(extents: [u32; D]) -> Result<Self> {
        if D == 0 || extents.iter().any(|&e| e == 0) {
            return Err(NebulaError::InvalidParameter(format!(
                "cartesian extents must be positive, got {extents:?}"
            )));
        }
        Ok(Self { extents })
    }

    /// Returns the per-axis extents.
    pub fn extents(&self) -> &[u32; D] {
        &self.extents
    }
}

impl<const D: usize> GridLayout for CartesianLayout<D> {
    type Position = [u32; D];

    fn size(&self) -> usize {
        self.extents.iter().product::<u32>() as usize
    }

    fn distance(&self, a: &[u32; D], b: &[u32; D]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| {
                let d = x as f32 - y as f32;
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }

    fn enumerate(&self) -> Box<dyn Iterator<Item = [u32; D]> + '_> {
        let extents = self.extents;
        Box::new((0..self.size()).map(move |linear| {
            let mut pos = [0u32; D];
            let mut rest = linear;
            for axis in (0..D).rev() {
                let extent = extents[axis] as usize;
                pos[axis] = (rest % extent) as u32;
                rest /= extent;
            }
            pos
        }))
    }

    fn index_of(&self, position: &[u32; D]) -> usize {
        debug_assert!(
            position
                .iter()
                .zip(self.extents.iter())
                .all(|(&p, &e)| p < e),
            "position {position:?} outside extents {:?}",
            self.extents
        );
        position
            .iter()
            .zip(self.extents.iter())
            .fold(0usize, |acc, (&p, &e)| acc * e as usize + p as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cartesian_2d() {
        let c = CartesianLayout::new([10, 10]).unwrap();
        assert_eq!(c.size(), 100);

        assert_eq!(c.distance(&[0, 0], &[0, 0]), 0.0);
        assert_eq!(c.distance(&[0, 0], &[0, 1]), 1.0);
        assert_eq!(c.distance(&[0, 0], &[0, 2]), 2.0);
        assert!((c.distance(&[0, 0], &[1, 1]) - 2.0f32.sqrt()).abs() < 1e-7);
        assert!((c.distance(&[0, 0], &[2, 2]) - 8.0f32.sqrt()).abs() < 1e-7);
    }

    #[test]
    fn test_distance_symmetry() {
        let c = CartesianLayout::new([7, 5]).unwrap();
        for a in c.enumerate() {
            for b in c.enumerate() {
                let d = c.distance(&a, &b);
                assert!(d >= 0.0);
                assert_eq!(d, c.distance(&b, &a));
                assert_eq!(d == 0.0, a == b);
            }
        }
    }

    #[test]
    fn test_row_major_indexing() {
        let c = CartesianLayout::new([4, 5]).unwrap();
        assert_eq!(c.index_of(&[0, 0]), 0);
        assert_eq!(c.index_of(&[0, 4]), 4);
        assert_eq!(c.index_of(&[1, 0]), 5);
        assert_eq!(c.index_of(&[3, 4]), 19);
    }

    #[test]
    fn test_enumerate_matches_index_of() {
        let c = CartesianLayout::new([3, 4, 2]).unwrap();
        let positions: Vec<_> = c.enumerate().collect();
        assert_eq!(positions.len(), c.size());
        for (i, pos) in positions.iter().enumerate() {
            assert_eq!(c.index_of(pos), i);
        }
    }

    #[test]
    fn test_3d_size_and_distance() {
        let c = CartesianLayout::new([2, 3, 4]).unwrap();
        assert_eq!(c.size(), 24);
        assert!((c.distance(&[0, 0, 0], &[1, 1, 1]) - 3.0f32.sqrt()).abs() < 1e-7);
    }

    #[test]
    fn test_zero_extent_rejected() {
        assert!(CartesianLayout::new([10, 0]).is_err());
    }
}
