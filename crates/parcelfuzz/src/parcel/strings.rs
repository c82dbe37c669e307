// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte and UTF-16 string types carried inside parcels.
//!
//! Neither type validates its contents: a `String8` is raw bytes and a
//! `String16` may hold unpaired surrogates, exactly as received off the wire.

use std::fmt;

/// 8-bit string, not required to be UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct String8(Vec<u8>);

impl String8 {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for String8 {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl fmt::Display for String8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// UTF-16 string, stored as code units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct String16(Vec<u16>);

impl String16 {
    pub fn from_units(units: &[u16]) -> Self {
        Self(units.to_vec())
    }

    /// `len` repetitions of one ASCII character.
    pub fn repeat(ch: u8, len: usize) -> Self {
        Self(vec![u16::from(ch); len])
    }

    pub fn units(&self) -> &[u16] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Strict conversion; `None` on unpaired surrogates.
    pub fn to_utf8(&self) -> Option<String> {
        String::from_utf16(&self.0).ok()
    }
}

impl From<&str> for String16 {
    fn from(value: &str) -> Self {
        Self(value.encode_utf16().collect())
    }
}

impl fmt::Display for String16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf16_lossy(&self.0))
    }
}
