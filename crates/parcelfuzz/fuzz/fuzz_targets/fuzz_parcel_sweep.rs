// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz target running every probe against the whole input
//!
//! The first byte is the scalar argument, the rest the parcel payload. Each
//! probe gets a fresh parcel so early probes cannot hide later decode paths.
//! None of these operations should panic on any input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parcelfuzz::parcel::cursor::Cursor;
use parcelfuzz::{parcel_read_functions, MemParcel, ParcelRead};
use std::cell::Cell;
use std::sync::OnceLock;

static READS: OnceLock<Vec<ParcelRead<MemParcel>>> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let Some((&scalar, payload)) = data.split_first() else {
        return;
    };

    // ----------------------------------------------------------------
    // 1. Every probe once, fresh parcel each time
    // ----------------------------------------------------------------
    let reads = READS.get_or_init(parcel_read_functions);
    for read in reads {
        let parcel = MemParcel::from_bytes(payload);
        read.run(&parcel, scalar);
    }

    // ----------------------------------------------------------------
    // 2. Raw cursor walk to the end of the payload
    // ----------------------------------------------------------------
    let position = Cell::new(usize::from(scalar));
    let cursor = Cursor::new(payload, &position);
    let _ = cursor.peek_until_nul();
    while !cursor.is_eof() {
        if cursor.read_i32().is_err() {
            break;
        }
    }
});
