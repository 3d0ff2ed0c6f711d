//! Stream-level reader and writer.
//!
//! # Reader
//! [`AfsReader`] validates the header, then reads the whole index eagerly.
//! Blocks are fetched on demand with [`AfsReader::read_block`]; every fetch
//! seeks to the block's absolute offset, so blocks may be read in any order.
//!
//! # Writer
//! [`AfsWriter`] buffers payloads and lays the container out on `finish()`
//! as header, index, then payloads back to back in index order.

use std::io::{Read, Seek, SeekFrom, Write};

use serde::Serialize;
use tracing::debug;

use crate::block::extract_block_within;
use crate::error::{AfsError, Result};
use crate::header::{Header, HEADER_SIZE};
use crate::index::{read_index, BlockIndex, IndexEntry, ENTRY_SIZE};

// ── Reader ───────────────────────────────────────────────────────────────────

/// Shape of `afsx list --json`.
#[derive(Serialize)]
struct Listing<'a> {
    header:  &'a Header,
    entries: &'a [IndexEntry],
}

pub struct AfsReader<R: Read + Seek> {
    reader:     R,
    pub header: Header,
    pub index:  BlockIndex,
    stream_len: u64,
}

impl<R: Read + Seek> AfsReader<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let header = Header::read(&mut reader)?;
        let room = stream_len.saturating_sub(HEADER_SIZE) / ENTRY_SIZE;
        let index = read_index(&mut reader, header.entry_count, room as usize)?;
        debug!(entries = index.len(), stream_len, "read AFS index");

        Ok(Self { reader, header, index, stream_len })
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.index.entries
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn stream_len(&self) -> u64 {
        self.stream_len
    }

    /// Header and index as pretty-printed JSON.
    pub fn listing_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Listing { header: &self.header, entries: self.entries() })
    }

    /// Read block `i`. A truncated block error carries `i`.
    pub fn read_block(&mut self, i: usize) -> Result<Vec<u8>> {
        let entry = *self.index.entries.get(i)
            .ok_or(AfsError::NoSuchBlock { index: i, len: self.len() })?;
        debug!(index = i, offset = entry.offset, size = entry.size, "reading block");
        extract_block_within(&mut self.reader, self.stream_len, entry.offset, entry.size)
            .map_err(|e| match e {
                AfsError::TruncatedBlock { offset, expected, available, .. } => {
                    AfsError::TruncatedBlock { index: Some(i), offset, expected, available }
                }
                other => other,
            })
    }

    /// Read every block in index order, failing on the first bad one.
    pub fn read_all_blocks(&mut self) -> Result<Vec<Vec<u8>>> {
        (0..self.len()).map(|i| self.read_block(i)).collect()
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

pub struct AfsWriter<W: Write> {
    writer: W,
    blocks: Vec<Vec<u8>>,
}

impl<W: Write> AfsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, blocks: Vec::new() }
    }

    pub fn add_block(&mut self, data: &[u8]) -> Result<()> {
        if u32::try_from(data.len()).is_err() {
            return Err(AfsError::TooLarge { what: "block", len: data.len() as u64 });
        }
        self.blocks.push(data.to_vec());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Write header, index and payloads; returns the inner writer.
    pub fn finish(mut self) -> Result<W> {
        let count = u32::try_from(self.blocks.len())
            .map_err(|_| AfsError::TooLarge { what: "entry count", len: self.blocks.len() as u64 })?;
        let header = Header::new(count);

        let mut entries = Vec::with_capacity(self.blocks.len());
        let mut cursor = header.index_end();
        for block in &self.blocks {
            let offset = u32::try_from(cursor)
                .map_err(|_| AfsError::TooLarge { what: "block offset", len: cursor })?;
            entries.push(IndexEntry { offset, size: block.len() as u32 });
            cursor += block.len() as u64;
        }

        header.write(&mut self.writer)?;
        for entry in &entries {
            entry.write(&mut self.writer)?;
        }
        for block in &self.blocks {
            self.writer.write_all(block)?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}
