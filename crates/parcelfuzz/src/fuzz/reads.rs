// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The parcel probe table.
//!
//! Order is part of the corpus format: a selector byte maps to the same probe
//! on every platform and every run. Append new probes at the end.

use super::{ParcelRead, StatusMode};
use crate::fuzz_log;
use crate::parcel::{Parcel, Status, StatusResult, StrongBinder, String16, String8};
use std::ffi::CStr;
use std::os::fd::{OwnedFd, RawFd};

const FUZZ_LOG_TAG: &str = "parcel";

/// Interface tokens only exist on binder platforms; elsewhere the two
/// interface probes log a skip line and return.
pub const INTERFACE_TOKEN_SUPPORTED: bool =
    cfg!(any(target_os = "android", feature = "interface-token"));

/// Cookie of the throwaway local binder handed to `check_interface`.
const PROBE_BINDER_COOKIE: u64 = 1;

/// Probe for a `StatusResult` accessor; logs the status, never the value.
macro_rules! parcel_read_with_status {
    ($ty:ty, $fun:ident) => {
        ParcelRead::new(
            stringify!($fun),
            stringify!($ty),
            StatusMode::WithStatus,
            |p: &P, _data: u8| {
                fuzz_log!(
                    "about to read {} using {} with status",
                    stringify!($ty),
                    stringify!($fun)
                );
                let result: StatusResult<$ty> = p.$fun();
                let status = Status::of(&result);
                fuzz_log!("{} status: {}", stringify!($ty), status);
            },
        )
    };
}

/// Probe for an accessor without a status; the result is dropped after the
/// completion line.
macro_rules! parcel_read_no_status {
    ($ty:ty, $fun:ident) => {
        ParcelRead::new(
            stringify!($fun),
            stringify!($ty),
            StatusMode::NoStatus,
            |p: &P, _data: u8| {
                fuzz_log!(
                    "about to read {} using {} with no status",
                    stringify!($ty),
                    stringify!($fun)
                );
                let _value: $ty = p.$fun();
                fuzz_log!("{} done", stringify!($ty));
            },
        )
    };
}

/// Both variants of a scalar accessor, status first.
macro_rules! parcel_read_opt_status {
    ($ty:ty, $with:ident, $without:ident) => {
        [
            parcel_read_with_status!($ty, $with),
            parcel_read_no_status!($ty, $without),
        ]
    };
}

/// Build the probe table for parcel type `P`.
///
/// Cheap, but callers running many inputs should build it once.
pub fn parcel_read_functions<P: Parcel>() -> Vec<ParcelRead<P>> {
    let mut reads: Vec<ParcelRead<P>> = vec![
        parcel_read_no_status!(usize, data_size),
        parcel_read_no_status!(usize, data_avail),
        parcel_read_no_status!(usize, data_position),
        parcel_read_no_status!(usize, data_capacity),
        ParcelRead::new(
            "set_data_position",
            "()",
            StatusMode::Custom,
            |p: &P, pos: u8| {
                fuzz_log!("about to setDataPosition: {}", pos);
                p.set_data_position(usize::from(pos));
                fuzz_log!("setDataPosition done");
            },
        ),
        parcel_read_no_status!(bool, allow_fds),
        parcel_read_no_status!(bool, has_file_descriptors),
        ParcelRead::new(
            "enforce_interface",
            "bool",
            StatusMode::Custom,
            |p: &P, len: u8| {
                if INTERFACE_TOKEN_SUPPORTED {
                    let interface = String16::repeat(b'a', usize::from(len));
                    fuzz_log!("about to enforceInterface: {} units", interface.len());
                    let enforced = p.enforce_interface(&interface);
                    fuzz_log!("enforced interface: {}", enforced);
                } else {
                    fuzz_log!("skipping enforceInterface");
                }
            },
        ),
        ParcelRead::new(
            "check_interface",
            "bool",
            StatusMode::Custom,
            |p: &P, _len: u8| {
                if INTERFACE_TOKEN_SUPPORTED {
                    fuzz_log!("about to checkInterface");
                    let binder = StrongBinder::local(PROBE_BINDER_COOKIE, String16::default());
                    let checked = p.check_interface(&binder);
                    fuzz_log!("checked interface: {}", checked);
                } else {
                    fuzz_log!("skipping checkInterface");
                }
            },
        ),
        parcel_read_no_status!(usize, objects_count),
        parcel_read_no_status!(Status, error_check),
        ParcelRead::new("read", "[u8]", StatusMode::Custom, |p: &P, len: u8| {
            fuzz_log!("about to read void*");
            let mut data = vec![0u8; usize::from(len)];
            let status = Status::of(&p.read(&mut data));
            fuzz_log!("read status: {}", status);
        }),
        ParcelRead::new(
            "read_inplace",
            "&[u8]",
            StatusMode::Custom,
            |p: &P, len: u8| {
                fuzz_log!("about to readInplace");
                let span = p.read_inplace(usize::from(len));
                fuzz_log!("readInplace done. span present: {}", span.is_some());
            },
        ),
    ];

    reads.extend(parcel_read_opt_status!(i32, read_i32, read_i32_or_default));
    reads.extend(parcel_read_opt_status!(u32, read_u32, read_u32_or_default));
    reads.extend(parcel_read_opt_status!(i64, read_i64, read_i64_or_default));
    reads.extend(parcel_read_opt_status!(u64, read_u64, read_u64_or_default));
    reads.extend(parcel_read_opt_status!(f32, read_f32, read_f32_or_default));
    reads.extend(parcel_read_opt_status!(f64, read_f64, read_f64_or_default));
    reads.extend(parcel_read_opt_status!(isize, read_isize, read_isize_or_default));
    reads.extend(parcel_read_opt_status!(bool, read_bool, read_bool_or_default));
    reads.extend(parcel_read_opt_status!(u16, read_char, read_char_or_default));
    reads.extend(parcel_read_opt_status!(i8, read_byte, read_byte_or_default));

    reads.extend([
        parcel_read_with_status!(String, read_utf8_from_utf16),
        parcel_read_with_status!(Option<String>, read_nullable_utf8_from_utf16),
        ParcelRead::new(
            "read_cstring",
            "&CStr",
            StatusMode::Custom,
            |p: &P, _data: u8| {
                fuzz_log!("about to read c-str");
                let s: Option<&CStr> = p.read_cstring();
                fuzz_log!("read c-str done. present: {}", s.is_some());
            },
        ),
    ]);
    reads.extend(parcel_read_opt_status!(String8, read_string8, read_string8_or_default));
    reads.extend(parcel_read_opt_status!(String16, read_string16, read_string16_or_default));

    // TODO: add read_string16_inplace once Parcel can lend &[u16] spans.
    reads.extend([
        parcel_read_with_status!(Option<String16>, read_nullable_string16),
        parcel_read_with_status!(StrongBinder, read_strong_binder),
        parcel_read_with_status!(Option<StrongBinder>, read_nullable_strong_binder),
        parcel_read_no_status!(i32, read_exception_code),
        parcel_read_no_status!(RawFd, read_file_descriptor),
        parcel_read_no_status!(RawFd, read_parcel_file_descriptor),
        parcel_read_with_status!(OwnedFd, read_unique_file_descriptor),
        ParcelRead::new(
            "read_blob",
            "ReadableBlob",
            StatusMode::Custom,
            |p: &P, len: u8| {
                fuzz_log!("about to readBlob");
                let status = Status::of(&p.read_blob(usize::from(len)));
                fuzz_log!("readBlob status: {}", status);
            },
        ),
        parcel_read_no_status!(u32, read_calling_work_source_uid),
        parcel_read_no_status!(usize, blob_ashmem_size),
        parcel_read_no_status!(usize, open_ashmem_size),
    ]);

    reads
}
