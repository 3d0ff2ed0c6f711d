//! Property-based tests for container reading
//!
//! Containers built from random payloads must give every payload back, and
//! random corruption must never panic the reader.

use afsx::{AfsError, AfsReader, AfsWriter};
use proptest::prelude::*;
use std::io::Cursor;

fn build(payloads: &[Vec<u8>]) -> Vec<u8> {
    let mut w = AfsWriter::new(Vec::new());
    for p in payloads {
        w.add_block(p).unwrap();
    }
    w.finish().unwrap()
}

proptest! {
    #[test]
    fn prop_written_payloads_read_back(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..24)
    ) {
        let mut reader = AfsReader::new(Cursor::new(build(&payloads))).unwrap();
        prop_assert_eq!(reader.len(), payloads.len());
        prop_assert_eq!(reader.read_all_blocks().unwrap(), payloads);
    }

    #[test]
    fn prop_blocks_equal_source_slices(
        tail in prop::collection::vec(any::<u8>(), 0..256),
        ranges in prop::collection::vec((0u32..300, 0u32..300), 0..8)
    ) {
        let mut bytes = b"AFS\0".to_vec();
        bytes.extend_from_slice(&(ranges.len() as u32).to_le_bytes());
        for (offset, size) in &ranges {
            bytes.extend_from_slice(&offset.to_le_bytes());
            bytes.extend_from_slice(&size.to_le_bytes());
        }
        bytes.extend_from_slice(&tail);
        let len = bytes.len() as u64;

        let mut reader = AfsReader::new(Cursor::new(bytes.clone())).unwrap();
        for (i, (offset, size)) in ranges.iter().enumerate() {
            let end = u64::from(*offset) + u64::from(*size);
            match reader.read_block(i) {
                Ok(data) => {
                    prop_assert!(end <= len);
                    prop_assert_eq!(&data[..], &bytes[*offset as usize..end as usize]);
                }
                Err(AfsError::TruncatedBlock { index, expected, available, .. }) => {
                    prop_assert!(end > len);
                    prop_assert_eq!(index, Some(i));
                    prop_assert_eq!(expected, *size);
                    prop_assert_eq!(available, len.saturating_sub(u64::from(*offset)));
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
        if let Ok(mut reader) = AfsReader::new(Cursor::new(bytes)) {
            let _ = reader.read_all_blocks();
        }
    }
}
