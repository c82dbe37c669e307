// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write side of the reference parcel.
//!
//! Produces [`MemParcel`]s with populated object tables, owned file
//! descriptors and shared-memory blobs. Used to build seed corpora and by
//! tests that need objects the raw-bytes constructor cannot forge.

use super::blob::{BLOB_ASHMEM_IMMUTABLE, BLOB_ASHMEM_MUTABLE, BLOB_INPLACE};
use super::cursor::{impl_write_aligned, pad_size};
use super::mem::{FdEntry, MemParcel, MAX_PARCEL_LEN};
use super::object::{
    FlatObject, StrongBinder, BINDER_TYPE_FD, FLAT_BINDER_FLAG_ACCEPTS_FDS,
    FLAT_BINDER_FLAG_PRIORITY_MASK,
};
use super::status::{Status, StatusResult};
use super::strings::{String16, String8};
use super::{EX_HAS_REPLY_HEADER, INTERFACE_HEADER};
use std::ffi::CStr;
use std::fs::File;
use std::os::fd::{AsFd, AsRawFd};

/// Strict-mode policy written into interface tokens.
const STRICT_MODE_POLICY: i32 = 0;

/// Errno reported when an fd error carries no OS code.
const EBADF: i32 = 9;

fn dup_status(err: &std::io::Error) -> Status {
    Status::from_code(-err.raw_os_error().unwrap_or(EBADF))
}

/// Append-only parcel writer.
#[derive(Debug)]
pub struct ParcelBuilder {
    data: Vec<u8>,
    objects: Vec<usize>,
    fds: Vec<FdEntry>,
    allow_fds: bool,
    blob_ashmem_size: usize,
}

impl Default for ParcelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParcelBuilder {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            objects: Vec::new(),
            fds: Vec::new(),
            allow_fds: true,
            blob_ashmem_size: 0,
        }
    }

    /// Refuse file descriptors from now on.
    pub fn disallow_fds(mut self) -> Self {
        self.allow_fds = false;
        self
    }

    pub fn position(&self) -> usize {
        self.data.len()
    }

    fn write_padded(&mut self, bytes: &[u8]) -> StatusResult<()> {
        let padded = pad_size(bytes.len()).ok_or(Status::BAD_VALUE)?;
        let end = self.data.len().checked_add(padded).ok_or(Status::NO_MEMORY)?;
        if end > MAX_PARCEL_LEN {
            return Err(Status::NO_MEMORY);
        }
        self.data.extend_from_slice(bytes);
        self.data.resize(end, 0);
        Ok(())
    }

    // Generate write methods via macro
    impl_write_aligned!(write_i32, i32);
    impl_write_aligned!(write_u32, u32);
    impl_write_aligned!(write_i64, i64);
    impl_write_aligned!(write_u64, u64);
    impl_write_aligned!(write_f32, f32);
    impl_write_aligned!(write_f64, f64);
    impl_write_aligned!(write_isize, isize);

    pub fn write_bool(&mut self, value: bool) -> StatusResult<()> {
        self.write_i32(i32::from(value))
    }

    pub fn write_char(&mut self, value: u16) -> StatusResult<()> {
        self.write_i32(i32::from(value))
    }

    pub fn write_byte(&mut self, value: i8) -> StatusResult<()> {
        self.write_i32(i32::from(value))
    }

    /// Raw bytes, padded; the counterpart of `read` / `read_inplace`.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> StatusResult<()> {
        self.write_padded(bytes)
    }

    pub fn write_cstring(&mut self, value: &CStr) -> StatusResult<()> {
        self.write_padded(value.to_bytes_with_nul())
    }

    fn write_len(&mut self, len: usize) -> StatusResult<()> {
        let len = i32::try_from(len).map_err(|_| Status::BAD_VALUE)?;
        self.write_i32(len)
    }

    pub fn write_string8(&mut self, value: &String8) -> StatusResult<()> {
        self.write_len(value.len())?;
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        self.write_padded(&bytes)
    }

    pub fn write_string16(&mut self, value: &String16) -> StatusResult<()> {
        self.write_len(value.len())?;
        let mut bytes = Vec::with_capacity((value.len() + 1) * 2);
        for unit in value.units() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes.extend_from_slice(&[0, 0]);
        self.write_padded(&bytes)
    }

    /// `None` is written as length `-1`.
    pub fn write_nullable_string16(&mut self, value: Option<&String16>) -> StatusResult<()> {
        match value {
            Some(s) => self.write_string16(s),
            None => self.write_i32(-1),
        }
    }

    /// Strict-mode policy, work source uid, 'SYST' header, descriptor.
    pub fn write_interface_token(
        &mut self,
        descriptor: &String16,
        work_source_uid: u32,
    ) -> StatusResult<()> {
        self.write_i32(STRICT_MODE_POLICY)?;
        self.write_u32(work_source_uid)?;
        self.write_u32(INTERFACE_HEADER)?;
        self.write_string16(descriptor)
    }

    fn write_object(&mut self, flat: FlatObject, record: bool) -> StatusResult<()> {
        let offset = self.data.len();
        self.write_padded(&flat.to_bytes())?;
        if record {
            self.objects.push(offset);
        }
        Ok(())
    }

    /// `None` writes a null object, which takes no object-table slot.
    pub fn write_strong_binder(&mut self, binder: Option<&StrongBinder>) -> StatusResult<()> {
        match binder {
            Some(binder) => self.write_object(binder.flatten(), true),
            None => self.write_object(FlatObject::null_binder(), false),
        }
    }

    fn push_fd(&mut self, fd: impl AsFd, ashmem_len: Option<usize>) -> StatusResult<()> {
        if !self.allow_fds {
            return Err(Status::FDS_NOT_ALLOWED);
        }
        let owned = fd.as_fd().try_clone_to_owned().map_err(|e| dup_status(&e))?;
        let raw = owned.as_raw_fd();
        let flat = FlatObject {
            kind: BINDER_TYPE_FD,
            flags: FLAT_BINDER_FLAG_PRIORITY_MASK | FLAT_BINDER_FLAG_ACCEPTS_FDS,
            handle: u64::try_from(raw).map_err(|_| Status::BAD_VALUE)?,
            cookie: 1,
        };
        self.write_object(flat, true)?;
        self.fds.push(FdEntry {
            fd: owned,
            ashmem_len,
        });
        Ok(())
    }

    /// Run `write`, dropping everything it appended if it fails.
    fn write_or_rewind(
        &mut self,
        write: impl FnOnce(&mut Self) -> StatusResult<()>,
    ) -> StatusResult<()> {
        let data_len = self.data.len();
        let objects_len = self.objects.len();
        let result = write(self);
        if result.is_err() {
            self.data.truncate(data_len);
            self.objects.truncate(objects_len);
        }
        result
    }

    /// Write a duplicate of `fd`; the parcel owns the duplicate.
    pub fn write_dup_file_descriptor(&mut self, fd: impl AsFd) -> StatusResult<()> {
        self.push_fd(fd, None)
    }

    pub fn write_parcel_file_descriptor(
        &mut self,
        fd: impl AsFd,
        has_comm_channel: bool,
    ) -> StatusResult<()> {
        if !self.allow_fds {
            return Err(Status::FDS_NOT_ALLOWED);
        }
        self.write_or_rewind(|b| {
            b.write_i32(i32::from(has_comm_channel))?;
            b.push_fd(fd, None)
        })
    }

    pub fn write_exception_code(&mut self, code: i32) -> StatusResult<()> {
        self.write_i32(code)
    }

    /// Successful reply preceded by a header that readers skip.
    pub fn write_reply_header(&mut self, header: &[u8]) -> StatusResult<()> {
        let body = pad_size(header.len()).ok_or(Status::BAD_VALUE)?;
        self.write_i32(EX_HAS_REPLY_HEADER)?;
        self.write_len(body + 4)?;
        self.write_padded(header)
    }

    pub fn write_blob_inplace(&mut self, bytes: &[u8]) -> StatusResult<()> {
        self.write_i32(BLOB_INPLACE)?;
        self.write_padded(bytes)
    }

    /// Blob backed by `region`; the whole file is the shared region.
    pub fn write_ashmem_blob(&mut self, region: &File, mutable: bool) -> StatusResult<()> {
        let len = region.metadata().map_err(|e| dup_status(&e))?.len();
        let len = usize::try_from(len).map_err(|_| Status::BAD_VALUE)?;
        if !self.allow_fds {
            return Err(Status::FDS_NOT_ALLOWED);
        }
        let blob_type = if mutable {
            BLOB_ASHMEM_MUTABLE
        } else {
            BLOB_ASHMEM_IMMUTABLE
        };
        self.write_or_rewind(|b| {
            b.write_i32(blob_type)?;
            b.push_fd(region, Some(len))
        })?;
        self.blob_ashmem_size += len;
        Ok(())
    }

    pub fn build(self) -> MemParcel {
        MemParcel::from_parts(
            self.data,
            self.objects,
            self.fds,
            self.allow_fds,
            self.blob_ashmem_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parcel::Parcel;

    #[test]
    fn test_builder_pads_every_item() {
        let mut builder = ParcelBuilder::new();
        builder.write_byte(-2).expect("write byte");
        builder.write_bytes(&[1, 2, 3]).expect("write bytes");
        builder.write_i64(-5).expect("write i64");
        assert_eq!(builder.position(), 16);

        let parcel = builder.build();
        assert_eq!(parcel.read_byte(), Ok(-2));
        assert_eq!(parcel.read_inplace(3), Some(&[1u8, 2, 3][..]));
        assert_eq!(parcel.read_i64(), Ok(-5));
        assert_eq!(parcel.data_avail(), 0);
    }

    #[test]
    fn test_builder_fds_disallowed() {
        let file = tempfile::tempfile().expect("tempfile");
        let mut builder = ParcelBuilder::new().disallow_fds();
        assert_eq!(
            builder.write_dup_file_descriptor(&file),
            Err(Status::FDS_NOT_ALLOWED)
        );
        assert_eq!(builder.write_ashmem_blob(&file, false), Err(Status::FDS_NOT_ALLOWED));
        let parcel = builder.build();
        assert!(!parcel.allow_fds());
        assert_eq!(parcel.objects_count(), 0);
    }

    #[test]
    fn test_failed_write_leaves_no_partial_bytes() {
        let mut builder = ParcelBuilder::new();
        builder.write_i32(1).expect("write i32");
        let result = builder.write_or_rewind(|b| {
            b.write_i32(BLOB_ASHMEM_MUTABLE)?;
            b.write_strong_binder(Some(&StrongBinder::remote(4)))?;
            Err(Status::BAD_VALUE)
        });
        assert_eq!(result, Err(Status::BAD_VALUE));
        assert_eq!(builder.position(), 4);
        builder.write_i32(42).expect("write i32");

        let parcel = builder.build();
        assert_eq!(parcel.objects_count(), 0);
        assert_eq!(parcel.read_i32(), Ok(1));
        assert_eq!(parcel.read_i32(), Ok(42));
        assert_eq!(parcel.data_avail(), 0);
    }

    #[test]
    fn test_fd_errors_map_to_negative_errno() {
        let os = std::io::Error::from_raw_os_error(24);
        assert_eq!(dup_status(&os).code(), -24);
        let synthetic = std::io::Error::new(std::io::ErrorKind::Other, "no errno");
        assert_eq!(dup_status(&synthetic).code(), -EBADF);
    }

    #[test]
    fn test_reply_header_size_covers_size_field() {
        let mut builder = ParcelBuilder::new();
        builder.write_reply_header(&[0xAA; 5]).expect("write header");
        builder.write_i32(77).expect("write i32");
        let parcel = builder.build();
        assert_eq!(parcel.read_exception_code(), 0);
        assert_eq!(parcel.read_i32(), Ok(77));
    }

    #[test]
    fn test_null_binder_has_no_table_entry() {
        let mut builder = ParcelBuilder::new();
        builder.write_strong_binder(None).expect("write null binder");
        builder
            .write_strong_binder(Some(&StrongBinder::remote(3)))
            .expect("write remote binder");
        let parcel = builder.build();
        assert_eq!(parcel.object_offsets(), &[FlatObject::SIZE]);
    }
}
