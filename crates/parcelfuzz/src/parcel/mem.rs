// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory parcel: read side of the reference implementation.
//!
//! A `MemParcel` built from raw bytes has an empty object table, so binder
//! and fd reads can only succeed on the null-object path. Parcels produced by
//! [`ParcelBuilder`](super::ParcelBuilder) carry real objects and own the
//! file descriptors they reference.

use super::blob::{ReadableBlob, BLOB_ASHMEM_MUTABLE, BLOB_INPLACE};
use super::cursor::Cursor;
use super::object::{FlatObject, StrongBinder, BINDER_TYPE_FD};
use super::status::{Status, StatusResult};
use super::strings::{String16, String8};
use super::{Parcel, EX_HAS_REPLY_HEADER, INTERFACE_HEADER, INVALID_FD, UNSET_WORK_SOURCE};
use memmap2::MmapOptions;
use std::cell::Cell;
use std::ffi::CStr;
use std::fs::File;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

/// Largest length or position a parcel accepts.
pub const MAX_PARCEL_LEN: usize = i32::MAX as usize;

/// File descriptor owned by a parcel.
#[derive(Debug)]
pub(crate) struct FdEntry {
    pub(crate) fd: OwnedFd,
    /// Region size when the fd backs a shared-memory blob.
    pub(crate) ashmem_len: Option<usize>,
}

/// Owned parcel data with an interior read position.
#[derive(Debug)]
pub struct MemParcel {
    data: Vec<u8>,
    capacity: usize,
    position: Cell<usize>,
    objects: Vec<usize>,
    fds: Vec<FdEntry>,
    allow_fds: bool,
    error: Status,
    work_source_pos: Cell<Option<usize>>,
    blob_ashmem_size: usize,
}

impl Default for MemParcel {
    fn default() -> Self {
        Self::new()
    }
}

impl MemParcel {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
            position: Cell::new(0),
            objects: Vec::new(),
            fds: Vec::new(),
            allow_fds: true,
            error: Status::OK,
            work_source_pos: Cell::new(None),
            blob_ashmem_size: 0,
        }
    }

    /// Parcel over a copy of `data`, with no objects.
    ///
    /// Inputs longer than [`MAX_PARCEL_LEN`] leave the parcel empty with a
    /// sticky `BAD_VALUE` error.
    pub fn from_bytes(data: &[u8]) -> Self {
        if data.len() > MAX_PARCEL_LEN {
            log::debug!("[parcel] refusing {} byte payload", data.len());
            return Self {
                error: Status::BAD_VALUE,
                ..Self::new()
            };
        }
        Self {
            data: data.to_vec(),
            capacity: data.len(),
            ..Self::new()
        }
    }

    pub(crate) fn from_parts(
        data: Vec<u8>,
        objects: Vec<usize>,
        fds: Vec<FdEntry>,
        allow_fds: bool,
        blob_ashmem_size: usize,
    ) -> Self {
        Self {
            capacity: data.capacity(),
            data,
            objects,
            fds,
            allow_fds,
            blob_ashmem_size,
            ..Self::new()
        }
    }

    /// Raw data, independent of the read position.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Offsets of the objects in the object table.
    pub fn object_offsets(&self) -> &[usize] {
        &self.objects
    }

    fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.data, &self.position)
    }

    fn object_at(&self, offset: usize) -> Option<FlatObject> {
        let end = offset.checked_add(FlatObject::SIZE)?;
        let bytes: &[u8; FlatObject::SIZE] = self.data.get(offset..end)?.try_into().ok()?;
        Some(FlatObject::from_bytes(bytes))
    }

    /// Read the flattened object at the position.
    ///
    /// The position advances whenever a full object fits, even if the
    /// offset is not in the object table. Null objects are accepted without a
    /// table entry unless `null_meta_data` is set.
    fn read_object(&self, null_meta_data: bool) -> Option<FlatObject> {
        let pos = self.position.get();
        let flat = self.object_at(pos)?;
        self.position.set(pos + FlatObject::SIZE);

        if !null_meta_data && flat.is_null() {
            return Some(flat);
        }
        if self.objects.binary_search(&pos).is_ok() {
            return Some(flat);
        }
        log::debug!(
            "[parcel] no object at offset {} ({} objects in table)",
            pos,
            self.objects.len()
        );
        None
    }

    fn fd_entry(&self, raw: RawFd) -> Option<&FdEntry> {
        self.fds.iter().find(|entry| entry.fd.as_raw_fd() == raw)
    }

    /// Length-prefixed UTF-16 string with a trailing NUL unit.
    fn read_string16_inplace(&self) -> Option<String16> {
        let len = usize::try_from(self.cursor().read_i32().ok()?).ok()?;
        if len >= MAX_PARCEL_LEN {
            return None;
        }
        let byte_len = len.checked_add(1)?.checked_mul(2)?;
        let bytes = self.read_inplace(byte_len)?;
        let (body, nul) = bytes.split_at(len * 2);
        if nul != [0, 0] {
            log::debug!("[parcel] String16 of {} units is not NUL terminated", len);
            return None;
        }
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Some(String16::from_units(&units))
    }

    /// Length-prefixed byte string with a trailing NUL.
    fn read_string8_inplace(&self) -> Option<&[u8]> {
        let len = usize::try_from(self.cursor().read_i32().ok()?).ok()?;
        if len >= MAX_PARCEL_LEN {
            return None;
        }
        let bytes = self.read_inplace(len + 1)?;
        let (body, nul) = bytes.split_at(len);
        if nul != [0] {
            log::debug!("[parcel] String8 of {} bytes is not NUL terminated", len);
            return None;
        }
        Some(body)
    }
}

impl Parcel for MemParcel {
    fn data_size(&self) -> usize {
        self.data.len().max(self.position.get())
    }

    fn data_avail(&self) -> usize {
        self.data_size() - self.position.get()
    }

    fn data_position(&self) -> usize {
        self.position.get()
    }

    fn data_capacity(&self) -> usize {
        self.capacity
    }

    fn set_data_position(&self, pos: usize) {
        if pos > MAX_PARCEL_LEN {
            return;
        }
        self.position.set(pos);
    }

    fn allow_fds(&self) -> bool {
        self.allow_fds
    }

    fn has_file_descriptors(&self) -> bool {
        self.objects
            .iter()
            .filter_map(|&offset| self.object_at(offset))
            .any(|flat| flat.kind == BINDER_TYPE_FD)
    }

    fn objects_count(&self) -> usize {
        self.objects.len()
    }

    fn error_check(&self) -> Status {
        self.error
    }

    fn enforce_interface(&self, descriptor: &String16) -> bool {
        let cursor = self.cursor();
        if cursor.read_i32().is_err() {
            return false;
        }

        // The work source uid is only located once per parcel.
        if self.work_source_pos.get().is_none() {
            self.work_source_pos.set(Some(self.position.get()));
        }
        if cursor.read_i32().is_err() {
            return false;
        }

        match cursor.read_u32() {
            Ok(INTERFACE_HEADER) => {}
            Ok(header) => {
                log::debug!("[parcel] bad interface header {:#010x}", header);
                return false;
            }
            Err(_) => return false,
        }

        match self.read_string16_inplace() {
            Some(found) => {
                if found == *descriptor {
                    true
                } else {
                    log::debug!(
                        "[parcel] interface mismatch: expected {} units, read {}",
                        descriptor.len(),
                        found.len()
                    );
                    false
                }
            }
            None => false,
        }
    }

    fn read(&self, out: &mut [u8]) -> StatusResult<()> {
        if out.len() > MAX_PARCEL_LEN {
            return Err(Status::BAD_VALUE);
        }
        let span = self.cursor().read_bytes(out.len())?;
        out.copy_from_slice(span);
        Ok(())
    }

    fn read_inplace(&self, len: usize) -> Option<&[u8]> {
        if len > MAX_PARCEL_LEN {
            return None;
        }
        self.cursor().read_bytes(len).ok()
    }

    fn read_i32(&self) -> StatusResult<i32> {
        self.cursor().read_i32()
    }

    fn read_u32(&self) -> StatusResult<u32> {
        self.cursor().read_u32()
    }

    fn read_i64(&self) -> StatusResult<i64> {
        self.cursor().read_i64()
    }

    fn read_u64(&self) -> StatusResult<u64> {
        self.cursor().read_u64()
    }

    fn read_f32(&self) -> StatusResult<f32> {
        self.cursor().read_f32()
    }

    fn read_f64(&self) -> StatusResult<f64> {
        self.cursor().read_f64()
    }

    fn read_isize(&self) -> StatusResult<isize> {
        self.cursor().read_isize()
    }

    fn read_bool(&self) -> StatusResult<bool> {
        Ok(self.cursor().read_i32()? != 0)
    }

    fn read_char(&self) -> StatusResult<u16> {
        // Stored widened to 32 bits; the high half is dropped.
        Ok(self.cursor().read_i32()? as u16)
    }

    fn read_byte(&self) -> StatusResult<i8> {
        Ok(self.cursor().read_i32()? as i8)
    }

    fn read_string8(&self) -> StatusResult<String8> {
        self.read_string8_inplace()
            .map(String8::from_bytes)
            .ok_or(Status::UNEXPECTED_NULL)
    }

    fn read_string16(&self) -> StatusResult<String16> {
        self.read_string16_inplace().ok_or(Status::UNEXPECTED_NULL)
    }

    fn read_nullable_string16(&self) -> StatusResult<Option<String16>> {
        let start = self.position.get();
        match self.cursor().read_i32() {
            Ok(-1) => Ok(None),
            _ => {
                self.position.set(start);
                self.read_string16().map(Some)
            }
        }
    }

    fn read_cstring(&self) -> Option<&CStr> {
        let cursor = self.cursor();
        let start = cursor.position();
        let len = cursor.peek_until_nul()?.len();
        let with_nul = &self.data[start..start + len + 1];
        let padded = super::cursor::pad_size(len + 1)?;
        self.position.set(start + padded);
        CStr::from_bytes_with_nul(with_nul).ok()
    }

    fn read_nullable_strong_binder(&self) -> StatusResult<Option<StrongBinder>> {
        let flat = self.read_object(false).ok_or(Status::BAD_TYPE)?;
        StrongBinder::unflatten(&flat).map_err(|()| Status::BAD_TYPE)
    }

    fn read_file_descriptor(&self) -> RawFd {
        match self.read_object(true) {
            Some(flat) if flat.kind == BINDER_TYPE_FD => {
                RawFd::try_from(flat.handle).unwrap_or(INVALID_FD)
            }
            _ => INVALID_FD,
        }
    }

    fn read_unique_file_descriptor(&self) -> StatusResult<OwnedFd> {
        let raw = self.read_file_descriptor();
        if raw == INVALID_FD {
            return Err(Status::BAD_TYPE);
        }
        let entry = self.fd_entry(raw).ok_or(Status::BAD_TYPE)?;
        entry.fd.try_clone().map_err(|e| {
            log::debug!("[parcel] dup of fd {} failed: {}", raw, e);
            Status::BAD_VALUE
        })
    }

    fn read_exception_code(&self) -> i32 {
        let cursor = self.cursor();
        let code = cursor.read_i32().unwrap_or(0);
        if code != EX_HAS_REPLY_HEADER {
            return code;
        }

        // Reply headers are skipped; they only precede successful replies.
        let header_start = cursor.position();
        let header_size = cursor.read_i32().unwrap_or(0);
        let header_end = header_start as i64 + i64::from(header_size);
        if (0..=MAX_PARCEL_LEN as i64).contains(&header_end) {
            self.set_data_position(header_end as usize);
        }
        0
    }

    fn read_blob(&self, len: usize) -> StatusResult<ReadableBlob<'_>> {
        let blob_type = self.read_i32()?;
        if blob_type == BLOB_INPLACE {
            return self
                .read_inplace(len)
                .map(ReadableBlob::InPlace)
                .ok_or(Status::BAD_VALUE);
        }

        let raw = self.read_file_descriptor();
        if raw == INVALID_FD {
            return Err(Status::BAD_VALUE);
        }
        let entry = self.fd_entry(raw).ok_or(Status::BAD_VALUE)?;
        let region = entry.ashmem_len.ok_or(Status::BAD_VALUE)?;
        if region < len {
            return Err(Status::BAD_VALUE);
        }

        let file = File::from(entry.fd.try_clone().map_err(|_| Status::BAD_VALUE)?);
        // SAFETY: the mapping is read-only and the region was sized above;
        // concurrent writers can only change bytes, not invalidate the map.
        let map = unsafe { MmapOptions::new().len(len).map(&file) }.map_err(|e| {
            log::debug!("[parcel] mapping {} byte blob failed: {}", len, e);
            Status::NO_MEMORY
        })?;
        Ok(ReadableBlob::Mapped {
            map,
            mutable: blob_type == BLOB_ASHMEM_MUTABLE,
        })
    }

    fn read_calling_work_source_uid(&self) -> u32 {
        match self.work_source_pos.get() {
            Some(pos) => {
                let initial = self.position.get();
                self.position.set(pos);
                let uid = self.cursor().read_u32().unwrap_or(0);
                self.position.set(initial);
                uid
            }
            None => UNSET_WORK_SOURCE,
        }
    }

    fn blob_ashmem_size(&self) -> usize {
        self.blob_ashmem_size
    }

    fn open_ashmem_size(&self) -> usize {
        self.objects
            .iter()
            .filter_map(|&offset| self.object_at(offset))
            .filter(|flat| flat.kind == BINDER_TYPE_FD)
            .filter_map(|flat| RawFd::try_from(flat.handle).ok())
            .filter_map(|raw| self.fd_entry(raw).and_then(|entry| entry.ashmem_len))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_from_bytes_metadata() {
        let parcel = MemParcel::from_bytes(&[1, 2, 3, 4, 5]);
        assert_eq!(parcel.data_size(), 5);
        assert_eq!(parcel.data_avail(), 5);
        assert_eq!(parcel.data_position(), 0);
        assert_eq!(parcel.data_capacity(), 5);
        assert!(parcel.allow_fds());
        assert!(!parcel.has_file_descriptors());
        assert_eq!(parcel.objects_count(), 0);
        assert_eq!(parcel.error_check(), Status::OK);
    }

    #[test]
    fn test_position_past_end_extends_reported_size() {
        let parcel = MemParcel::new();
        parcel.set_data_position(250);
        assert_eq!(parcel.data_position(), 250);
        assert_eq!(parcel.data_size(), 250);
        assert_eq!(parcel.data_avail(), 0);
        assert_eq!(parcel.read_i32(), Err(Status::NOT_ENOUGH_DATA));
    }

    #[test]
    fn test_set_data_position_ignores_huge_values() {
        let parcel = MemParcel::from_bytes(&[0; 8]);
        parcel.set_data_position(4);
        parcel.set_data_position(MAX_PARCEL_LEN + 1);
        assert_eq!(parcel.data_position(), 4);
    }

    #[test]
    fn test_small_scalars_are_widened() {
        let parcel = MemParcel::from_bytes(&words(&[0x1_0041, -1, 0x180, 0]));
        assert_eq!(parcel.read_char(), Ok(0x41));
        assert_eq!(parcel.read_byte(), Ok(-1));
        assert_eq!(parcel.read_byte(), Ok(-128));
        assert_eq!(parcel.read_bool(), Ok(false));
        assert!(!parcel.read_bool_or_default());
    }

    #[test]
    fn test_read_copies_and_pads() {
        let parcel = MemParcel::from_bytes(&[1, 2, 3, 0xEE, 5, 6, 7, 8]);
        let mut out = [0u8; 3];
        parcel.read(&mut out).expect("Read should succeed");
        assert_eq!(out, [1, 2, 3]);
        assert_eq!(parcel.data_position(), 4);

        let mut big = [0u8; 255];
        assert_eq!(parcel.read(&mut big), Err(Status::NOT_ENOUGH_DATA));
        assert_eq!(parcel.data_position(), 4);
    }

    #[test]
    fn test_read_inplace_bounds() {
        let parcel = MemParcel::from_bytes(&[9; 8]);
        assert_eq!(parcel.read_inplace(255), None);
        assert_eq!(parcel.read_inplace(MAX_PARCEL_LEN + 1), None);
        assert_eq!(parcel.read_inplace(5), Some(&[9u8; 5][..]));
        assert_eq!(parcel.data_position(), 8);
    }

    #[test]
    fn test_string16_requires_terminator() {
        let mut data = words(&[2]);
        data.extend_from_slice(&[0x61, 0, 0x62, 0, 0x63, 0, 0, 0]);
        let parcel = MemParcel::from_bytes(&data);
        assert_eq!(parcel.read_string16(), Err(Status::UNEXPECTED_NULL));

        let mut data = words(&[2]);
        data.extend_from_slice(&[0x61, 0, 0x62, 0, 0, 0, 0, 0]);
        let parcel = MemParcel::from_bytes(&data);
        assert_eq!(parcel.read_string16(), Ok(String16::from("ab")));
    }

    #[test]
    fn test_nullable_string16_null_marker() {
        let parcel = MemParcel::from_bytes(&words(&[-1]));
        assert_eq!(parcel.read_nullable_string16(), Ok(None));
        assert_eq!(parcel.data_position(), 4);

        let parcel = MemParcel::from_bytes(&words(&[-1]));
        assert_eq!(parcel.read_string16(), Err(Status::UNEXPECTED_NULL));
        parcel.set_data_position(0);
        assert_eq!(parcel.read_nullable_utf8_from_utf16(), Ok(None));

        // Truncated length prefix is not a null marker.
        let parcel = MemParcel::from_bytes(&[0xFF, 0xFF]);
        assert_eq!(parcel.read_nullable_string16(), Err(Status::UNEXPECTED_NULL));
        assert_eq!(parcel.data_position(), 0);
    }

    #[test]
    fn test_cstring_without_nul_is_none() {
        let parcel = MemParcel::from_bytes(b"abc");
        assert!(parcel.read_cstring().is_none());
        assert_eq!(parcel.data_position(), 0);

        let parcel = MemParcel::from_bytes(b"hi\0\0xyz\0");
        let s = parcel.read_cstring().expect("terminated string");
        assert_eq!(s.to_bytes(), b"hi");
        assert_eq!(parcel.data_position(), 4);
    }

    #[test]
    fn test_forged_objects_are_rejected() {
        let forged = FlatObject {
            kind: BINDER_TYPE_FD,
            flags: 0,
            handle: 0,
            cookie: 1,
        };
        let parcel = MemParcel::from_bytes(&forged.to_bytes());
        assert_eq!(parcel.read_file_descriptor(), INVALID_FD);
        assert_eq!(parcel.data_position(), FlatObject::SIZE);

        parcel.set_data_position(0);
        assert_eq!(parcel.read_unique_file_descriptor().unwrap_err(), Status::BAD_TYPE);
    }

    #[test]
    fn test_null_binder_needs_no_table_entry() {
        let parcel = MemParcel::from_bytes(&FlatObject::null_binder().to_bytes());
        assert_eq!(parcel.read_nullable_strong_binder(), Ok(None));

        parcel.set_data_position(0);
        assert_eq!(parcel.read_strong_binder(), Err(Status::UNEXPECTED_NULL));
    }

    #[test]
    fn test_exception_code_reply_header() {
        let parcel = MemParcel::from_bytes(&words(&[EX_HAS_REPLY_HEADER, 12, 7, 7, 42]));
        assert_eq!(parcel.read_exception_code(), 0);
        assert_eq!(parcel.data_position(), 16);
        assert_eq!(parcel.read_i32(), Ok(42));

        let parcel = MemParcel::from_bytes(&words(&[EX_HAS_REPLY_HEADER, -100]));
        assert_eq!(parcel.read_exception_code(), 0);
        assert_eq!(parcel.data_position(), 8);

        let parcel = MemParcel::from_bytes(&words(&[-3]));
        assert_eq!(parcel.read_exception_code(), -3);
    }

    #[test]
    fn test_blob_inplace_short_payload() {
        let mut data = words(&[BLOB_INPLACE]);
        data.extend_from_slice(&[1, 2, 3, 4]);
        let parcel = MemParcel::from_bytes(&data);
        assert_eq!(parcel.read_blob(255).unwrap_err(), Status::BAD_VALUE);

        parcel.set_data_position(0);
        let blob = parcel.read_blob(4).expect("in-place blob");
        assert_eq!(blob.data(), &[1, 2, 3, 4]);
        assert!(!blob.is_mapped());
    }

    #[test]
    fn test_blob_ashmem_without_fd() {
        let parcel = MemParcel::from_bytes(&words(&[1, 0, 0, 0]));
        assert_eq!(parcel.read_blob(4).unwrap_err(), Status::BAD_VALUE);
    }

    #[test]
    fn test_work_source_unset_by_default() {
        let parcel = MemParcel::from_bytes(&[0; 16]);
        assert_eq!(parcel.read_calling_work_source_uid(), UNSET_WORK_SOURCE);
        assert_eq!(parcel.blob_ashmem_size(), 0);
        assert_eq!(parcel.open_ashmem_size(), 0);
    }

    #[test]
    fn test_enforce_interface_rejects_bad_header() {
        let parcel = MemParcel::from_bytes(&words(&[0, 1000, 0x1234, 0]));
        assert!(!parcel.enforce_interface(&String16::default()));
        assert_eq!(parcel.read_calling_work_source_uid(), 1000);
    }
}
