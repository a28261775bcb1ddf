//! Hexagonal grid layout with axial coordinates.

use crate::grid::GridLayout;
use serde::{Deserialize, Serialize};

/// An axial hex coordinate `(q, r)`; the implicit cube coordinate is
/// `s = -q - r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axial {
    /// Column coordinate.
    pub q: i32,
    /// Row coordinate.
    pub r: i32,
}

impl Axial {
    /// Creates an axial coordinate.
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }
}

/// A hex-shaped region of radius `radius` containing `1 + 3r(r+1)` cells.
///
/// Cells are enumerated column by column (`q` from `-radius` to `radius`),
/// each column top to bottom in `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexLayout {
    radius: u32,
}

impl HexLayout {
    /// Creates a hex layout of the given radius. Radius 0 is a single cell.
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }

    /// Returns the hex radius.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    fn r_min(&self, q: i32) -> i32 {
        let radius = self.radius as i32;
        (-radius).max(-q - radius)
    }

    fn r_max(&self, q: i32) -> i32 {
        let radius = self.radius as i32;
        radius.min(-q + radius)
    }
}

impl GridLayout for HexLayout {
    type Position = Axial;

    fn size(&self) -> usize {
        let r = self.radius as usize;
        1 + 3 * r * (r + 1)
    }

    fn distance(&self, a: &Axial, b: &Axial) -> f32 {
        let dq = (a.q - b.q).abs();
        let ds = (a.q + a.r - b.q - b.r).abs();
        let dr = (a.r - b.r).abs();
        ((dq + ds + dr) / 2) as f32
    }

    fn enumerate(&self) -> Box<dyn Iterator<Item = Axial> + '_> {
        let radius = self.radius as i32;
        Box::new((-radius..=radius).flat_map(move |q| {
            (self.r_min(q)..=self.r_max(q)).map(move |r| Axial::new(q, r))
        }))
    }

    fn index_of(&self, position: &Axial) -> usize {
        let radius = self.radius as i32;
        debug_assert!(
            position.q.abs() <= radius
                && position.r >= self.r_min(position.q)
                && position.r <= self.r_max(position.q),
            "position {position:?} outside hex of radius {radius}"
        );
        let mut offset = 0usize;
        for q in -radius..position.q {
            offset += (self.r_max(q) - self.r_min(q) + 1) as usize;
        }
        offset + (position.r - self.r_min(position.q)) as usize
    }
}
