// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blob views returned by `Parcel::read_blob`.

use memmap2::Mmap;

/// Blob stored inline in the parcel data.
pub const BLOB_INPLACE: i32 = 0;
/// Blob stored in a shared-memory region, mapped read-only.
pub const BLOB_ASHMEM_IMMUTABLE: i32 = 1;
/// Blob stored in a shared-memory region the sender may keep writing.
pub const BLOB_ASHMEM_MUTABLE: i32 = 2;

/// Readable view of a blob. Mappings are released on drop.
#[derive(Debug)]
pub enum ReadableBlob<'a> {
    InPlace(&'a [u8]),
    Mapped { map: Mmap, mutable: bool },
}

impl ReadableBlob<'_> {
    pub fn data(&self) -> &[u8] {
        match self {
            ReadableBlob::InPlace(bytes) => bytes,
            ReadableBlob::Mapped { map, .. } => &map[..],
        }
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, ReadableBlob::Mapped { .. })
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self, ReadableBlob::Mapped { mutable: true, .. })
    }
}
