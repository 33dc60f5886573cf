//! Section-oriented snapshot encoding. A snapshot is a fixed sequence of
//! sections, one per table; each section is a row-count prefix followed by
//! the rows packed in primary-key order. Writing and reading must visit the
//! sections in the same order for the bytes to line up.

use gst_serialization::{Read, Write};

use crate::chain::{error::ChainError, utils::gst_assert};

pub struct SnapshotWriter {
    bytes: Vec<u8>,
}

impl SnapshotWriter {
    pub fn new() -> Self {
        SnapshotWriter { bytes: Vec::new() }
    }

    pub fn write_section<F>(&mut self, f: F) -> Result<(), ChainError>
    where
        F: FnOnce(&mut SnapshotSectionWriter) -> Result<(), ChainError>,
    {
        let mut section = SnapshotSectionWriter {
            row_count: 0,
            bytes: Vec::new(),
        };
        f(&mut section)?;
        self.bytes.extend_from_slice(&section.row_count.pack()?);
        self.bytes.extend_from_slice(&section.bytes);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SnapshotSectionWriter {
    row_count: u32,
    bytes: Vec<u8>,
}

impl SnapshotSectionWriter {
    pub fn add_row<T: Write>(&mut self, row: &T) -> Result<(), ChainError> {
        self.bytes.extend_from_slice(&row.pack()?);
        self.row_count += 1;
        Ok(())
    }
}

pub struct SnapshotReader {
    bytes: Vec<u8>,
    pos: usize,
}

impl SnapshotReader {
    pub fn new(bytes: Vec<u8>) -> Self {
        SnapshotReader { bytes, pos: 0 }
    }

    pub fn read_section<F>(&mut self, f: F) -> Result<(), ChainError>
    where
        F: FnOnce(&mut SnapshotSectionReader) -> Result<(), ChainError>,
    {
        let row_count = u32::read(&self.bytes, &mut self.pos)?;
        let mut section = SnapshotSectionReader {
            bytes: &self.bytes,
            pos: &mut self.pos,
            remaining: row_count,
        };
        f(&mut section)?;
        let remaining = section.remaining;
        gst_assert(
            remaining == 0,
            ChainError::SerializationError(format!(
                "snapshot section left {} rows unread",
                remaining
            )),
        )?;
        Ok(())
    }

    /// True once every section has been consumed.
    pub fn finished(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

pub struct SnapshotSectionReader<'a> {
    bytes: &'a [u8],
    pos: &'a mut usize,
    remaining: u32,
}

impl SnapshotSectionReader<'_> {
    pub fn empty(&self) -> bool {
        self.remaining == 0
    }

    pub fn more(&self) -> bool {
        self.remaining > 0
    }

    pub fn read_row<T: Read>(&mut self) -> Result<T, ChainError> {
        gst_assert(
            self.remaining > 0,
            ChainError::SerializationError("no more rows in snapshot section".to_string()),
        )?;
        let row = T::read(self.bytes, self.pos)?;
        self.remaining -= 1;
        Ok(row)
    }
}
