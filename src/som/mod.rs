//! Self-organizing map core: the map, rotation banks, matching, training.
//!
//! Per training step:
//!
//! ```text
//! DataIterator -> image -> RotationBank -> Matcher -> (BMU, best variants)
//!                                                      -> Som::update
//! ```

mod map;
mod matcher;
mod rotation;
mod training;

pub use map::{blend_toward, Som};
pub use matcher::{find_best_match, MatchResult};
pub use rotation::RotationBank;
pub use training::{map_images, CancelToken, SomTrainer, TrainingReport};
