use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

use crate::error::{AfsError, Result};

/// On-disk size of one index record: offset u32 + size u32.
pub const ENTRY_SIZE: u64 = 8;

/// One block descriptor. Bounds are not checked here; see [`crate::block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub offset: u32,
    pub size:   u32,
}

impl IndexEntry {
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.offset)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        Ok(Self {
            offset: reader.read_u32::<LittleEndian>()?,
            size:   reader.read_u32::<LittleEndian>()?,
        })
    }

    /// Exclusive end of the block, widened so it cannot wrap.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.size)
    }

    pub fn fits_within(&self, len: u64) -> bool {
        self.end() <= len
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockIndex {
    pub entries: Vec<IndexEntry>,
}

impl BlockIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of declared block sizes.
    pub fn payload_bytes(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.size)).sum()
    }
}

/// Read `entry_count` records from a stream positioned just past the header.
///
/// `capacity_hint` bounds the up-front allocation so a corrupt count cannot
/// request gigabytes before the first read fails.
pub fn read_index<R: Read>(mut reader: R, entry_count: u32, capacity_hint: usize) -> Result<BlockIndex> {
    let mut entries = Vec::with_capacity((entry_count as usize).min(capacity_hint));
    for i in 0..entry_count {
        match IndexEntry::read(&mut reader) {
            Ok(entry) => entries.push(entry),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(AfsError::TruncatedIndex { declared: entry_count, available: i });
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(BlockIndex { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_records_in_order() {
        let bytes = [16u8, 0, 0, 0, 4, 0, 0, 0, 20, 0, 0, 0, 8, 0, 0, 0];
        let idx = read_index(&bytes[..], 2, 2).unwrap();
        assert_eq!(idx.entries, vec![
            IndexEntry { offset: 16, size: 4 },
            IndexEntry { offset: 20, size: 8 },
        ]);
        assert_eq!(idx.payload_bytes(), 12);
    }

    #[test]
    fn zero_entries() {
        let idx = read_index(&b""[..], 0, 0).unwrap();
        assert!(idx.is_empty());
    }

    #[test]
    fn no_bounds_check_at_index_time() {
        let mut bytes = Vec::new();
        IndexEntry { offset: u32::MAX, size: u32::MAX }.write(&mut bytes).unwrap();
        let idx = read_index(&bytes[..], 1, 1).unwrap();
        assert_eq!(idx.entries[0].end(), 2 * u64::from(u32::MAX));
        assert!(!idx.entries[0].fits_within(1 << 20));
    }

    #[test]
    fn truncated_index_reports_readable_count() {
        // One full record plus half of a second.
        let bytes = [0u8; 12];
        let err = read_index(&bytes[..], 5, 5).unwrap_err();
        assert!(matches!(err, AfsError::TruncatedIndex { declared: 5, available: 1 }));
    }
}
