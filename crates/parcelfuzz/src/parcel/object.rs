// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Flattened objects (binders, handles, file descriptors) embedded in a parcel.
//!
//! Layout, 24 bytes little-endian:
//!
//! | offset | field |
//! |---|---|
//! | 0 | `u32` type |
//! | 4 | `u32` flags |
//! | 8 | `u64` binder / handle / fd |
//! | 16 | `u64` cookie |

use super::strings::String16;

const fn pack_chars(c1: u8, c2: u8, c3: u8, c4: u8) -> u32 {
    ((c1 as u32) << 24) | ((c2 as u32) << 16) | ((c3 as u32) << 8) | (c4 as u32)
}

const TYPE_LARGE: u8 = 0x85;

pub const BINDER_TYPE_BINDER: u32 = pack_chars(b's', b'b', b'*', TYPE_LARGE);
pub const BINDER_TYPE_HANDLE: u32 = pack_chars(b's', b'h', b'*', TYPE_LARGE);
pub const BINDER_TYPE_FD: u32 = pack_chars(b'f', b'd', b'*', TYPE_LARGE);

pub const FLAT_BINDER_FLAG_ACCEPTS_FDS: u32 = 0x100;
/// Default scheduling priority mask written with every object.
pub const FLAT_BINDER_FLAG_PRIORITY_MASK: u32 = 0x7f;

/// A flattened object as it sits in the data buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatObject {
    pub kind: u32,
    pub flags: u32,
    pub handle: u64,
    pub cookie: u64,
}

impl FlatObject {
    pub const SIZE: usize = 24;

    pub fn null_binder() -> Self {
        Self {
            kind: BINDER_TYPE_BINDER,
            flags: FLAT_BINDER_FLAG_PRIORITY_MASK | FLAT_BINDER_FLAG_ACCEPTS_FDS,
            handle: 0,
            cookie: 0,
        }
    }

    /// Null objects are written without an object-table entry.
    pub fn is_null(&self) -> bool {
        self.handle == 0 && self.cookie == 0
    }

    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.kind.to_le_bytes());
        out[4..8].copy_from_slice(&self.flags.to_le_bytes());
        out[8..16].copy_from_slice(&self.handle.to_le_bytes());
        out[16..24].copy_from_slice(&self.cookie.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::SIZE]) -> Self {
        let mut u32_buf = [0u8; 4];
        let mut u64_buf = [0u8; 8];

        u32_buf.copy_from_slice(&bytes[0..4]);
        let kind = u32::from_le_bytes(u32_buf);
        u32_buf.copy_from_slice(&bytes[4..8]);
        let flags = u32::from_le_bytes(u32_buf);
        u64_buf.copy_from_slice(&bytes[8..16]);
        let handle = u64::from_le_bytes(u64_buf);
        u64_buf.copy_from_slice(&bytes[16..24]);
        let cookie = u64::from_le_bytes(u64_buf);

        Self {
            kind,
            flags,
            handle,
            cookie,
        }
    }
}

/// Where a strong binder reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderTarget {
    /// Object living in this process, identified by its cookie.
    Local { cookie: u64 },
    /// Proxy to a remote object, identified by its driver handle.
    Remote { handle: u32 },
}

/// Strong reference to a binder object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrongBinder {
    target: BinderTarget,
    descriptor: String16,
}

impl StrongBinder {
    pub fn local(cookie: u64, descriptor: String16) -> Self {
        Self {
            target: BinderTarget::Local { cookie },
            descriptor,
        }
    }

    pub fn remote(handle: u32) -> Self {
        Self {
            target: BinderTarget::Remote { handle },
            descriptor: String16::default(),
        }
    }

    pub fn target(&self) -> BinderTarget {
        self.target
    }

    /// Interface descriptor; empty for proxies and anonymous local objects.
    pub fn interface_descriptor(&self) -> &String16 {
        &self.descriptor
    }

    pub(crate) fn flatten(&self) -> FlatObject {
        let flags = FLAT_BINDER_FLAG_PRIORITY_MASK | FLAT_BINDER_FLAG_ACCEPTS_FDS;
        match self.target {
            BinderTarget::Local { cookie } => FlatObject {
                kind: BINDER_TYPE_BINDER,
                flags,
                handle: cookie,
                cookie,
            },
            BinderTarget::Remote { handle } => FlatObject {
                kind: BINDER_TYPE_HANDLE,
                flags,
                handle: u64::from(handle),
                cookie: 0,
            },
        }
    }

    /// `Ok(None)` for a null binder, `Err(())` for a non-binder object.
    pub(crate) fn unflatten(flat: &FlatObject) -> Result<Option<Self>, ()> {
        match flat.kind {
            BINDER_TYPE_BINDER if flat.handle == 0 => Ok(None),
            BINDER_TYPE_BINDER => Ok(Some(Self::local(flat.cookie, String16::default()))),
            BINDER_TYPE_HANDLE => match u32::try_from(flat.handle) {
                Ok(handle) => Ok(Some(Self::remote(handle))),
                Err(_) => Err(()),
            },
            _ => Err(()),
        }
    }
}
