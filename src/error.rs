use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AfsError {
    #[error("Not an AFS file: bad magic {}", hex::encode(.found))]
    InvalidMagic { found: [u8; 4] },

    #[error("Not an AFS file: {len} bytes is shorter than the 8-byte header")]
    TooShort { len: u64 },

    #[error("Truncated index: header declares {declared} entries, only {available} readable")]
    TruncatedIndex { declared: u32, available: u32 },

    /// `index` is `None` when the read did not go through an index entry.
    #[error("{}: offset=0x{offset:08X} expected {expected} bytes, {available} available",
            block_label(.index))]
    TruncatedBlock {
        index:     Option<usize>,
        offset:    u32,
        expected:  u32,
        available: u64,
    },

    #[error("No block {index} in a {len}-entry index")]
    NoSuchBlock { index: usize, len: usize },

    #[error("{what} too large for a u32 field: {len}")]
    TooLarge { what: &'static str, len: u64 },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl AfsError {
    /// The file is not an AFS container at all.
    pub fn is_format_error(&self) -> bool {
        matches!(self, AfsError::InvalidMagic { .. } | AfsError::TooShort { .. })
    }

    /// The container is recognised but its data runs past the end of the file.
    pub fn is_read_error(&self) -> bool {
        matches!(self, AfsError::TruncatedIndex { .. } | AfsError::TruncatedBlock { .. })
    }
}

fn block_label(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!("Truncated block {i}"),
        None    => "Truncated block".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, AfsError>;
