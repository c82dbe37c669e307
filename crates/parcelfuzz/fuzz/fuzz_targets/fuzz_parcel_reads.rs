// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz target for the parcel probe table
//!
//! First half of the input is the parcel payload, second half a stream of
//! (selector, scalar) pairs. Set PARCELFUZZ_LOG=stderr to watch the probes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parcelfuzz::{Harness, HarnessConfig};
use std::sync::OnceLock;

static HARNESS: OnceLock<Harness> = OnceLock::new();

fn harness() -> &'static Harness {
    HARNESS.get_or_init(|| {
        let config = HarnessConfig::from_env().unwrap_or_else(|e| {
            eprintln!("parcelfuzz: ignoring bad environment config: {}", e);
            HarnessConfig::default()
        });
        if let Err(e) = config.install_logging() {
            eprintln!("parcelfuzz: fuzz log disabled: {}", e);
        }
        Harness::from_config(&config)
    })
}

fuzz_target!(|data: &[u8]| {
    let _ = harness().run(data);
});
