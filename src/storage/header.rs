//! Binary container header parsing and writing.
//!
//! ## Format layout (little-endian)
//!
//! ```text
//! +---------------------------+
//! | version preamble (v2 only)|  '#'-prefixed text lines, terminated by
//! |                           |  "# END OF HEADER"
//! +---------------------------+
//! | reserved                  |  3 x i32
//! | entry count N             |  i32
//! | layout tag                |  i32 (0 = cartesian, 1 = hexagonal)
//! | dimensionality d          |  i32
//! | extents                   |  d x i32
//! +---------------------------+
//! | payload                   |  N x prod(extents) x f32
//! +---------------------------+
//! ```
//!
//! Legacy v1 files have no preamble and start directly at the reserved
//! words.

use crate::error::{NebulaError, Result};
use std::io::{Read, Seek, SeekFrom, Write};

/// Layout tag for cartesian data.
pub const LAYOUT_CARTESIAN: i32 = 0;

/// Layout tag for hexagonal data.
pub const LAYOUT_HEXAGONAL: i32 = 1;

/// Highest container version understood by this reader.
const MAX_VERSION: u32 = 2;

/// Upper bound on dimensionality, to reject garbage headers early.
const MAX_DIMENSIONALITY: i32 = 16;

/// Parsed container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Number of payload entries.
    pub entry_count: u32,
    /// Layout tag of the entries.
    pub layout: i32,
    /// Per-axis extents of one entry.
    pub extents: Vec<u32>,
}

impl FileHeader {
    /// Element count of a single entry.
    pub fn entry_len(&self) -> usize {
        self.extents.iter().product::<u32>() as usize
    }

    /// Byte size of a single entry payload.
    pub fn entry_bytes(&self) -> u64 {
        self.entry_len() as u64 * std::mem::size_of::<f32>() as u64
    }
}

/// Consumes the optional version preamble in front of the binary header.
///
/// A v2 file starts with '#'-prefixed text lines and is terminated by the
/// line `# END OF HEADER`; a `# version <n>` line, when present, must name a
/// version this reader understands. Legacy v1 files have no preamble and the
/// stream is left untouched.
pub fn read_file_header<R: Read + Seek>(reader: &mut R) -> Result<Option<String>> {
    let mut first = [0u8; 1];
    match reader.read_exact(&mut first) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(NebulaError::MalformedHeader("empty file".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    if first[0] != b'#' {
        reader.seek(SeekFrom::Current(-1))?;
        return Ok(None);
    }

    let mut preamble = String::from("#");
    loop {
        let mut byte = [0u8; 1];
        if let Err(e) = reader.read_exact(&mut byte) {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(NebulaError::MalformedHeader(
                    "preamble not terminated by '# END OF HEADER'".to_string(),
                ));
            }
            return Err(e.into());
        }
        preamble.push(byte[0] as char);

        if byte[0] == b'\n' {
            let done = preamble
                .lines()
                .last()
                .map(|l| l.trim() == "# END OF HEADER")
                .unwrap_or(false);
            if done {
                break;
            }
            // The next line must be a comment line as well.
            let mut next = [0u8; 1];
            if let Err(e) = reader.read_exact(&mut next) {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    return Err(NebulaError::MalformedHeader(
                        "preamble not terminated by '# END OF HEADER'".to_string(),
                    ));
                }
                return Err(e.into());
            }
            if next[0] != b'#' {
                return Err(NebulaError::MalformedHeader(
                    "non-comment line inside preamble".to_string(),
                ));
            }
            preamble.push('#');
        }
    }

    for line in preamble.lines() {
        let line = line.trim_start_matches('#').trim();
        if let Some(version) = line.strip_prefix("version ") {
            let version: u32 = version.trim().parse().map_err(|_| {
                NebulaError::MalformedHeader(format!("unparsable version line: {line}"))
            })?;
            if version == 0 || version > MAX_VERSION {
                return Err(NebulaError::MalformedHeader(format!(
                    "unsupported container version {version}"
                )));
            }
        }
    }

    Ok(Some(preamble))
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            NebulaError::MalformedHeader("file truncated inside header".to_string())
        } else {
            NebulaError::Io(e)
        }
    })?;
    Ok(i32::from_le_bytes(buf))
}

impl FileHeader {
    /// Reads the binary header fields following the version preamble.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        // Three reserved words.
        for _ in 0..3 {
            read_i32(reader)?;
        }

        let entry_count = read_i32(reader)?;
        if entry_count < 0 {
            return Err(NebulaError::MalformedHeader(format!(
                "negative entry count {entry_count}"
            )));
        }

        let layout = read_i32(reader)?;

        let dimensionality = read_i32(reader)?;
        if dimensionality <= 0 {
            return Err(NebulaError::MalformedHeader(format!(
                "non-positive dimensionality {dimensionality}"
            )));
        }
        if dimensionality > MAX_DIMENSIONALITY {
            return Err(NebulaError::MalformedHeader(format!(
                "implausible dimensionality {dimensionality}"
            )));
        }

        let mut extents = Vec::with_capacity(dimensionality as usize);
        for _ in 0..dimensionality {
            let extent = read_i32(reader)?;
            if extent <= 0 {
                return Err(NebulaError::MalformedHeader(format!(
                    "non-positive extent {extent}"
                )));
            }
            extents.push(extent as u32);
        }

        Ok(Self {
            entry_count: entry_count as u32,
            layout,
            extents,
        })
    }

    /// Writes the binary header fields (no preamble).
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        for _ in 0..3 {
            writer.write_all(&0i32.to_le_bytes())?;
        }
        writer.write_all(&(self.entry_count as i32).to_le_bytes())?;
        writer.write_all(&self.layout.to_le_bytes())?;
        writer.write_all(&(self.extents.len() as i32).to_le_bytes())?;
        for &extent in &self.extents {
            writer.write_all(&(extent as i32).to_le_bytes())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn v1_header_bytes(count: i32, extents: &[i32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for _ in 0..3 {
            bytes.extend_from_slice(&0i32.to_le_bytes());
        }
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.extend_from_slice(&LAYOUT_CARTESIAN.to_le_bytes());
        bytes.extend_from_slice(&(extents.len() as i32).to_le_bytes());
        for &e in extents {
            bytes.extend_from_slice(&e.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_v1_roundtrip() {
        let header = FileHeader {
            entry_count: 12,
            layout: LAYOUT_CARTESIAN,
            extents: vec![8, 8],
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();

        let recovered = FileHeader::read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(recovered, header);
        assert_eq!(recovered.entry_len(), 64);
        assert_eq!(recovered.entry_bytes(), 256);
    }

    #[test]
    fn test_no_preamble_leaves_stream_at_start() {
        let bytes = v1_header_bytes(1, &[4, 4]);
        let mut cursor = Cursor::new(bytes);
        assert_eq!(read_file_header(&mut cursor).unwrap(), None);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_v2_preamble() {
        let mut bytes = b"# nebula data file\n# version 2\n# END OF HEADER\n".to_vec();
        let body_start = bytes.len() as u64;
        bytes.extend(v1_header_bytes(3, &[2, 2]));

        let mut cursor = Cursor::new(bytes);
        let preamble = read_file_header(&mut cursor).unwrap().unwrap();
        assert!(preamble.contains("version 2"));
        assert_eq!(cursor.position(), body_start);

        let header = FileHeader::read(&mut cursor).unwrap();
        assert_eq!(header.entry_count, 3);
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let bytes = b"# version 9\n# END OF HEADER\n".to_vec();
        let err = read_file_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, NebulaError::MalformedHeader(_)));
    }

    #[test]
    fn test_unterminated_preamble_rejected() {
        let bytes = b"# just a comment\n".to_vec();
        let err = read_file_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, NebulaError::MalformedHeader(_)));
    }

    #[test]
    fn test_truncated_before_extents() {
        let mut bytes = v1_header_bytes(5, &[10, 10]);
        bytes.truncate(bytes.len() - 6);
        let err = FileHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, NebulaError::MalformedHeader(_)));
    }

    #[test]
    fn test_non_positive_dimensionality_rejected() {
        let mut bytes = Vec::new();
        for _ in 0..3 {
            bytes.extend_from_slice(&0i32.to_le_bytes());
        }
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&LAYOUT_CARTESIAN.to_le_bytes());
        bytes.extend_from_slice(&0i32.to_le_bytes());
        let err = FileHeader::read(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, NebulaError::MalformedHeader(_)));
    }
}
