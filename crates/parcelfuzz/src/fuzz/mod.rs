// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Operation table and dispatch driver.
//!
//! A fuzz input is split into parcel payload and `(selector, scalar)`
//! instruction pairs. Each selector picks a probe from the table, modulo its
//! length; the probe calls one parcel accessor and logs the outcome.

pub mod driver;
pub mod reads;

pub use driver::{select, FuzzInput, Harness, RunSummary, MAX_INPUT_LEN};
pub use reads::{parcel_read_functions, INTERFACE_TOKEN_SUPPORTED};

use std::fmt;

/// How a probe reports the accessor outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMode {
    /// Calls a `StatusResult` accessor and logs the status.
    WithStatus,
    /// Calls an accessor that signals failure through its return value.
    NoStatus,
    /// Hand-written probe taking the scalar byte as an argument.
    Custom,
}

impl StatusMode {
    /// Short name shown in table listings.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusMode::WithStatus => "with-status",
            StatusMode::NoStatus => "no-status",
            StatusMode::Custom => "custom",
        }
    }
}

impl fmt::Display for StatusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered probe.
pub struct ParcelRead<P: ?Sized> {
    /// Accessor (or special operation) the probe exercises.
    pub name: &'static str,
    /// Rust type the accessor yields.
    pub result_type: &'static str,
    /// How the accessor's outcome is reported in the log.
    pub mode: StatusMode,
    probe: fn(&P, u8),
}

impl<P: ?Sized> ParcelRead<P> {
    pub fn new(
        name: &'static str,
        result_type: &'static str,
        mode: StatusMode,
        probe: fn(&P, u8),
    ) -> Self {
        Self {
            name,
            result_type,
            mode,
            probe,
        }
    }

    /// Invoke the probe once.
    pub fn run(&self, parcel: &P, data: u8) {
        (self.probe)(parcel, data);
    }
}

impl<P: ?Sized> Clone for ParcelRead<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: ?Sized> Copy for ParcelRead<P> {}

impl<P: ?Sized> fmt::Debug for ParcelRead<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParcelRead")
            .field("name", &self.name)
            .field("result_type", &self.result_type)
            .field("mode", &self.mode)
            .finish()
    }
}
