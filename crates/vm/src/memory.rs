//! Flat byte-addressable memory.
//!
//! Words are stored little-endian. Every access is bounds-checked with
//! overflow-safe arithmetic; no offset ever wraps around.

use std::ops::Range;

use threadvm_common::Word;

/// A memory access that would leave the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds {
    pub offset: u32,
    pub len: u32,
}

/// Zero-initialised byte buffer of fixed size.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Allocate `size` zeroed bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Capacity in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// The whole buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte range `[offset, offset + len)` if it lies inside memory.
    pub fn range(&self, offset: u32, len: u32) -> Result<Range<usize>, OutOfBounds> {
        let start = offset as usize;
        start
            .checked_add(len as usize)
            .filter(|&end| end <= self.bytes.len())
            .map(|end| start..end)
            .ok_or(OutOfBounds { offset, len })
    }

    /// Read the little-endian word at `offset`.
    pub fn read_word(&self, offset: u32) -> Result<Word, OutOfBounds> {
        let range = self.range(offset, 4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.bytes[range]);
        Ok(Word::from_le_bytes(buf))
    }

    /// Write `value` little-endian at `offset`.
    pub fn write_word(&mut self, offset: u32, value: Word) -> Result<(), OutOfBounds> {
        let range = self.range(offset, 4)?;
        self.bytes[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Copy `len` bytes from `src` to `dest`. Overlapping ranges behave
    /// like `memmove`.
    pub fn copy(&mut self, dest: u32, src: u32, len: u32) -> Result<(), OutOfBounds> {
        let from = self.range(src, len)?;
        let to = self.range(dest, len)?;
        self.bytes.copy_within(from, to.start);
        Ok(())
    }

    /// Set `len` bytes starting at `dest` to `byte`.
    pub fn fill(&mut self, dest: u32, byte: u8, len: u32) -> Result<(), OutOfBounds> {
        let range = self.range(dest, len)?;
        self.bytes[range].fill(byte);
        Ok(())
    }

    /// Zero every byte.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}
