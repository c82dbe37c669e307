// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Padded read cursor over parcel data.
//!
//! Every item occupies a multiple of 4 bytes. The position lives in a `Cell`
//! owned by the parcel so reads go through `&self`.

use super::status::{Status, StatusResult};
use std::cell::Cell;

/// Items are padded to this many bytes.
pub const PAD_ALIGN: usize = 4;

/// Round `len` up to the pad alignment, `None` on overflow.
pub fn pad_size(len: usize) -> Option<usize> {
    let mask = PAD_ALIGN - 1;
    len.checked_add(mask).map(|v| v & !mask)
}

/// Generate aligned little-endian read methods for primitive types
///
/// Each generated method:
/// 1. Checks `position + size <= data size` (`NOT_ENOUGH_DATA` otherwise)
/// 2. Decodes via `from_le_bytes()`
/// 3. Advances the position by the padded size
macro_rules! impl_read_aligned {
    ($name:ident, $type:ty) => {
        pub fn $name(&self) -> StatusResult<$type> {
            const SIZE: usize = std::mem::size_of::<$type>();
            let span = self.read_bytes(SIZE)?;
            let mut bytes = [0u8; SIZE];
            bytes.copy_from_slice(span);
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Generate aligned little-endian write methods for primitive types
///
/// Appends `to_le_bytes()` followed by zero padding.
macro_rules! impl_write_aligned {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) -> StatusResult<()> {
            self.write_padded(&value.to_le_bytes())
        }
    };
}

pub(crate) use impl_write_aligned;

/// Immutable view of parcel data plus the shared read position.
pub struct Cursor<'a> {
    buffer: &'a [u8],
    position: &'a Cell<usize>,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8], position: &'a Cell<usize>) -> Self {
        Self { buffer, position }
    }

    pub fn position(&self) -> usize {
        self.position.get()
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position.get())
    }

    /// Return `len` bytes and advance past them and their padding.
    pub fn read_bytes(&self, len: usize) -> StatusResult<&'a [u8]> {
        let padded = pad_size(len).ok_or(Status::BAD_VALUE)?;
        let start = self.position.get();
        let end = start.checked_add(padded).ok_or(Status::NOT_ENOUGH_DATA)?;
        if end > self.buffer.len() {
            return Err(Status::NOT_ENOUGH_DATA);
        }
        self.position.set(end);
        Ok(&self.buffer[start..start + len])
    }

    /// Bytes from the position up to (excluding) the next NUL.
    pub fn peek_until_nul(&self) -> Option<&'a [u8]> {
        let start = self.position.get();
        let tail = self.buffer.get(start..)?;
        let nul = tail.iter().position(|&b| b == 0)?;
        Some(&tail[..nul])
    }

    impl_read_aligned!(read_i32, i32);
    impl_read_aligned!(read_u32, u32);
    impl_read_aligned!(read_i64, i64);
    impl_read_aligned!(read_u64, u64);
    impl_read_aligned!(read_f32, f32);
    impl_read_aligned!(read_f64, f64);
    impl_read_aligned!(read_isize, isize);

    pub fn is_eof(&self) -> bool {
        self.position.get() >= self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_I32: i32 = -0x1234_5678;
    const TEST_U64: u64 = 0x1122_3344_5566_7788;

    #[test]
    fn test_pad_size_rounds_up() {
        assert_eq!(pad_size(0), Some(0));
        assert_eq!(pad_size(1), Some(4));
        assert_eq!(pad_size(4), Some(4));
        assert_eq!(pad_size(5), Some(8));
        assert_eq!(pad_size(usize::MAX), None);
    }

    #[test]
    fn test_cursor_read_overflow_keeps_position() {
        let buffer = [0u8; 6];
        let pos = Cell::new(0);
        let cursor = Cursor::new(&buffer, &pos);
        assert_eq!(cursor.read_i32().expect("Read i32 should succeed"), 0);
        assert_eq!(cursor.position(), 4);

        let err = cursor.read_i32().unwrap_err();
        assert_eq!(err, Status::NOT_ENOUGH_DATA);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_cursor_reads_little_endian_values() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&TEST_I32.to_le_bytes());
        buffer.extend_from_slice(&TEST_U64.to_le_bytes());
        buffer.extend_from_slice(&1.5f32.to_le_bytes());
        let pos = Cell::new(0);
        let cursor = Cursor::new(&buffer, &pos);

        assert_eq!(cursor.read_i32().expect("Read i32 should succeed"), TEST_I32);
        assert_eq!(cursor.read_u64().expect("Read u64 should succeed"), TEST_U64);
        assert_eq!(cursor.read_f32().expect("Read f32 should succeed"), 1.5);
        assert!(cursor.is_eof());
    }

    #[test]
    fn test_cursor_read_bytes_skips_padding() {
        let buffer = [1u8, 2, 3, 0, 9, 9, 9, 9];
        let pos = Cell::new(0);
        let cursor = Cursor::new(&buffer, &pos);
        assert_eq!(cursor.read_bytes(3).expect("Read bytes should succeed"), &[1, 2, 3]);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.read_bytes(4).expect("Read bytes should succeed"), &[9, 9, 9, 9]);
    }

    #[test]
    fn test_cursor_position_past_end() {
        let buffer = [0u8; 4];
        let pos = Cell::new(250);
        let cursor = Cursor::new(&buffer, &pos);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.is_eof());
        assert_eq!(cursor.read_bytes(0).unwrap_err(), Status::NOT_ENOUGH_DATA);
        assert_eq!(cursor.peek_until_nul(), None);
    }
}
