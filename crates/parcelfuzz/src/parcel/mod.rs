// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Parcel contract and the in-memory reference implementation.
//!
//! The fuzz probes only ever see the [`Parcel`] trait. [`MemParcel`] (read
//! side) and [`ParcelBuilder`] (write side) implement it over an owned byte
//! buffer so the harness can run without a binder driver.
//!
//! Status-returning accessors return `StatusResult<T>`. Their `_or_default`
//! companions swallow the status and return `T::default()`, which is how a
//! parcel signals failure to callers that do not check.

pub mod blob;
pub mod builder;
pub mod cursor;
pub mod mem;
pub mod object;
pub mod status;
pub mod strings;

pub use blob::{ReadableBlob, BLOB_ASHMEM_IMMUTABLE, BLOB_ASHMEM_MUTABLE, BLOB_INPLACE};
pub use builder::ParcelBuilder;
pub use mem::MemParcel;
pub use object::{BinderTarget, FlatObject, StrongBinder};
pub use status::{Status, StatusResult};
pub use strings::{String16, String8};

use std::ffi::CStr;
use std::os::fd::{OwnedFd, RawFd};

/// Exception code announcing a reply header before the real payload.
pub const EX_HAS_REPLY_HEADER: i32 = -128;

/// Header word following the work source in an interface token ('SYST').
pub const INTERFACE_HEADER: u32 = u32::from_be_bytes(*b"SYST");

/// Work source uid reported when no interface token was enforced.
pub const UNSET_WORK_SOURCE: u32 = u32::MAX;

/// Raw fd returned by the unchecked fd accessors on failure.
pub const INVALID_FD: RawFd = -1;

/// Accessor surface a probe may call on a buffer under test.
///
/// All methods take `&self`: the read position is interior state.
pub trait Parcel {
    // ------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------

    fn data_size(&self) -> usize;
    fn data_avail(&self) -> usize;
    fn data_position(&self) -> usize;
    fn data_capacity(&self) -> usize;

    /// Move the read position. Out-of-range positions are accepted; later
    /// reads fail their bounds checks.
    fn set_data_position(&self, pos: usize);

    fn allow_fds(&self) -> bool;
    fn has_file_descriptors(&self) -> bool;
    fn objects_count(&self) -> usize;

    /// Sticky error from construction.
    fn error_check(&self) -> Status;

    // ------------------------------------------------------------------
    // Interface tokens
    // ------------------------------------------------------------------

    /// Consume an interface token and compare its descriptor.
    fn enforce_interface(&self, descriptor: &String16) -> bool;

    fn check_interface(&self, binder: &StrongBinder) -> bool {
        self.enforce_interface(binder.interface_descriptor())
    }

    // ------------------------------------------------------------------
    // Raw spans
    // ------------------------------------------------------------------

    fn read(&self, out: &mut [u8]) -> StatusResult<()>;
    fn read_inplace(&self, len: usize) -> Option<&[u8]>;

    // ------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------

    fn read_i32(&self) -> StatusResult<i32>;
    fn read_u32(&self) -> StatusResult<u32>;
    fn read_i64(&self) -> StatusResult<i64>;
    fn read_u64(&self) -> StatusResult<u64>;
    fn read_f32(&self) -> StatusResult<f32>;
    fn read_f64(&self) -> StatusResult<f64>;
    fn read_isize(&self) -> StatusResult<isize>;
    fn read_bool(&self) -> StatusResult<bool>;
    /// One UTF-16 code unit.
    fn read_char(&self) -> StatusResult<u16>;
    fn read_byte(&self) -> StatusResult<i8>;

    fn read_i32_or_default(&self) -> i32 {
        self.read_i32().unwrap_or_default()
    }
    fn read_u32_or_default(&self) -> u32 {
        self.read_u32().unwrap_or_default()
    }
    fn read_i64_or_default(&self) -> i64 {
        self.read_i64().unwrap_or_default()
    }
    fn read_u64_or_default(&self) -> u64 {
        self.read_u64().unwrap_or_default()
    }
    fn read_f32_or_default(&self) -> f32 {
        self.read_f32().unwrap_or_default()
    }
    fn read_f64_or_default(&self) -> f64 {
        self.read_f64().unwrap_or_default()
    }
    fn read_isize_or_default(&self) -> isize {
        self.read_isize().unwrap_or_default()
    }
    fn read_bool_or_default(&self) -> bool {
        self.read_bool().unwrap_or_default()
    }
    fn read_char_or_default(&self) -> u16 {
        self.read_char().unwrap_or_default()
    }
    fn read_byte_or_default(&self) -> i8 {
        self.read_byte().unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------

    fn read_string8(&self) -> StatusResult<String8>;
    fn read_string16(&self) -> StatusResult<String16>;
    fn read_nullable_string16(&self) -> StatusResult<Option<String16>>;
    fn read_cstring(&self) -> Option<&CStr>;

    fn read_string8_or_default(&self) -> String8 {
        self.read_string8().unwrap_or_default()
    }
    fn read_string16_or_default(&self) -> String16 {
        self.read_string16().unwrap_or_default()
    }

    /// UTF-16 on the wire, converted to UTF-8.
    fn read_utf8_from_utf16(&self) -> StatusResult<String> {
        self.read_string16()?.to_utf8().ok_or(Status::BAD_VALUE)
    }

    fn read_nullable_utf8_from_utf16(&self) -> StatusResult<Option<String>> {
        match self.read_nullable_string16()? {
            Some(s) => s.to_utf8().map(Some).ok_or(Status::BAD_VALUE),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    fn read_strong_binder(&self) -> StatusResult<StrongBinder> {
        self.read_nullable_strong_binder()?
            .ok_or(Status::UNEXPECTED_NULL)
    }
    fn read_nullable_strong_binder(&self) -> StatusResult<Option<StrongBinder>>;

    /// Raw fd number still owned by the parcel, [`INVALID_FD`] on failure.
    fn read_file_descriptor(&self) -> RawFd;

    /// `i32` comm-channel flag followed by an fd object.
    fn read_parcel_file_descriptor(&self) -> RawFd {
        match self.read_i32() {
            Ok(_has_comm) => self.read_file_descriptor(),
            Err(_) => INVALID_FD,
        }
    }

    /// Duplicated fd owned by the caller.
    fn read_unique_file_descriptor(&self) -> StatusResult<OwnedFd>;

    // ------------------------------------------------------------------
    // Miscellaneous
    // ------------------------------------------------------------------

    fn read_exception_code(&self) -> i32;
    fn read_blob(&self, len: usize) -> StatusResult<ReadableBlob<'_>>;
    fn read_calling_work_source_uid(&self) -> u32;
    fn blob_ashmem_size(&self) -> usize;
    fn open_ashmem_size(&self) -> usize;
}
