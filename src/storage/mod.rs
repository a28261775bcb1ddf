//! Binary container format, streaming reads, and result writers.

mod header;
mod iterator;
mod writer;

pub use header::{read_file_header, FileHeader, LAYOUT_CARTESIAN, LAYOUT_HEXAGONAL};
pub use iterator::DataIterator;
pub use writer::{write_rotation_bank, write_som_grid, write_som_stack, MappingWriter};
