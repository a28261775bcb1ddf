//! Lazy iterator over entries of a binary data file.

use crate::error::{NebulaError, Result};
use crate::storage::header::{read_file_header, FileHeader};
use std::io::{Read, Seek, SeekFrom};

/// Lazy forward iterator with seek-based random access over a binary image
/// file. One entry is held in memory at a time.
///
/// The iterator owns its stream; it is not thread-safe, and the owning scope
/// must serialize access.
#[derive(Debug)]
pub struct DataIterator<R> {
    reader: R,
    header: FileHeader,
    header_offset: u64,
    current: Vec<f32>,
    raw: Vec<u8>,
    count: u32,
    at_end: bool,
}

impl<R: Read + Seek> DataIterator<R> {
    /// Opens a data stream: parses the header, records the payload offset,
    /// and loads entry 0.
    pub fn open(mut reader: R) -> Result<Self> {
        read_file_header(&mut reader)?;
        let header = FileHeader::read(&mut reader)?;
        let header_offset = reader.stream_position()?;

        let entry_len = header.entry_len();
        let mut iter = Self {
            reader,
            header,
            header_offset,
            current: vec![0.0; entry_len],
            raw: vec![0u8; entry_len * std::mem::size_of::<f32>()],
            count: 0,
            at_end: false,
        };
        iter.load_next()?;
        Ok(iter)
    }

    /// Returns the parsed file header.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Total number of entries in the file.
    pub fn total(&self) -> usize {
        self.header.entry_count as usize
    }

    /// Number of entries not yet loaded (the current entry counts as loaded).
    pub fn remaining(&self) -> usize {
        (self.header.entry_count - self.count) as usize
    }

    /// Returns the currently loaded entry, or `None` in the end state.
    pub fn current(&self) -> Option<&[f32]> {
        if self.at_end {
            None
        } else {
            Some(&self.current)
        }
    }

    /// Loads the next entry; transitions to the end state after the last one.
    pub fn advance(&mut self) -> Result<()> {
        self.load_next()
    }

    /// Skips `k - 1` entries without reading their payload, then loads the
    /// next. `advance_by(1)` is equivalent to [`advance`](Self::advance).
    pub fn advance_by(&mut self, k: usize) -> Result<()> {
        if k == 0 {
            return Ok(());
        }
        let skip = (k - 1).min(self.remaining());
        if skip > 0 {
            self.reader
                .seek(SeekFrom::Current(skip as i64 * self.header.entry_bytes() as i64))?;
            self.count += skip as u32;
        }
        self.load_next()
    }

    /// Seeks back to the first entry and reloads it.
    pub fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(self.header_offset))?;
        self.count = 0;
        self.at_end = false;
        self.load_next()
    }

    fn load_next(&mut self) -> Result<()> {
        if self.count >= self.header.entry_count {
            self.at_end = true;
            return Ok(());
        }

        self.reader.read_exact(&mut self.raw).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                NebulaError::MalformedHeader(format!(
                    "file truncated inside entry {}",
                    self.count
                ))
            } else {
                NebulaError::Io(e)
            }
        })?;
        for (value, bytes) in self.current.iter_mut().zip(self.raw.chunks_exact(4)) {
            *value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        self.count += 1;
        Ok(())
    }
}
