use std::io::{self, Read, Seek, SeekFrom};

use crate::error::{AfsError, Result};
use crate::index::IndexEntry;

/// Copy `size` bytes starting at absolute `offset`.
///
/// This is the one place block bounds are enforced: if `offset + size` lies
/// past the end of the stream, nothing is read and the error carries the
/// expected and available byte counts. A zero-sized block still needs its
/// offset inside the stream.
pub fn extract_block<R: Read + Seek>(reader: &mut R, offset: u32, size: u32) -> Result<Vec<u8>> {
    let len = reader.seek(SeekFrom::End(0))?;
    extract_block_within(reader, len, offset, size)
}

/// [`extract_block`] for callers that already know the stream length.
pub(crate) fn extract_block_within<R: Read + Seek>(
    reader: &mut R,
    len:    u64,
    offset: u32,
    size:   u32,
) -> Result<Vec<u8>> {
    let available = len.saturating_sub(u64::from(offset));
    let truncated = || AfsError::TruncatedBlock { index: None, offset, expected: size, available };
    if !(IndexEntry { offset, size }).fits_within(len) {
        return Err(truncated());
    }

    reader.seek(SeekFrom::Start(u64::from(offset)))?;
    let mut data = vec![0u8; size as usize];
    match reader.read_exact(&mut data) {
        Ok(()) => Ok(data),
        // The stream shrank between the length probe and the read.
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(truncated()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_exact_slice() {
        let mut c = Cursor::new(b"0123456789".to_vec());
        assert_eq!(extract_block(&mut c, 2, 3).unwrap(), b"234");
        assert_eq!(extract_block(&mut c, 0, 10).unwrap(), b"0123456789");
    }

    #[test]
    fn zero_sized_block_at_eof() {
        let mut c = Cursor::new(b"abc".to_vec());
        assert!(extract_block(&mut c, 3, 0).unwrap().is_empty());
    }

    #[test]
    fn size_past_end_is_read_error() {
        let mut c = Cursor::new(b"0123456789".to_vec());
        let err = extract_block(&mut c, 8, 4).unwrap_err();
        assert!(matches!(
            err,
            AfsError::TruncatedBlock { index: None, offset: 8, expected: 4, available: 2 }
        ));
    }

    #[test]
    fn offset_past_end_reports_zero_available() {
        let mut c = Cursor::new(vec![0u8; 4]);
        let err = extract_block(&mut c, 100, 1).unwrap_err();
        assert!(matches!(err, AfsError::TruncatedBlock { available: 0, .. }));
    }

    #[test]
    fn zero_sized_block_past_eof_is_read_error() {
        let mut c = Cursor::new(vec![0u8; 16]);
        let err = extract_block(&mut c, 17, 0).unwrap_err();
        assert!(matches!(
            err,
            AfsError::TruncatedBlock { index: None, offset: 17, expected: 0, available: 0 }
        ));
    }

    #[test]
    fn max_offset_and_size_do_not_overflow() {
        let mut c = Cursor::new(vec![0u8; 16]);
        let err = extract_block(&mut c, u32::MAX, u32::MAX).unwrap_err();
        assert!(err.is_read_error());
    }
}
