//! Fixed 8-byte container header.
//!
//! ```text
//! 0  magic        [u8; 4]  "AFS\0"
//! 4  entry_count  u32 LE
//! ```
//!
//! The byte order is a format constant. A container with a big-endian count
//! would be a different format and is not detected here.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

use crate::error::{AfsError, Result};

pub const MAGIC: &[u8; 4] = b"AFS\0";
pub const HEADER_SIZE: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    #[serde(serialize_with = "serialize_magic")]
    pub magic:       [u8; 4],
    pub entry_count: u32,
}

impl Header {
    pub fn new(entry_count: u32) -> Self {
        Self { magic: *MAGIC, entry_count }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.entry_count)?;
        Ok(())
    }

    /// Decode and validate the header. A stream that ends inside the header
    /// cannot carry the tag, so it is reported as a format error too.
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE as usize];
        let mut filled = 0;
        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        if filled >= 4 && &buf[..4] != MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(&buf[..4]);
            return Err(AfsError::InvalidMagic { found });
        }
        if filled < buf.len() {
            return Err(AfsError::TooShort { len: filled as u64 });
        }

        let mut rest = &buf[4..];
        let entry_count = rest.read_u32::<LittleEndian>()?;
        Ok(Self { magic: *MAGIC, entry_count })
    }

    /// First byte past the index.
    pub fn index_end(&self) -> u64 {
        HEADER_SIZE + u64::from(self.entry_count) * crate::index::ENTRY_SIZE
    }
}

fn serialize_magic<S: serde::Serializer>(magic: &[u8; 4], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(magic).trim_end_matches('\0'))
}
