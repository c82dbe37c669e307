// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # parcelfuzz - Parcel deserialization fuzz harness
//!
//! Feeds attacker-controlled bytes to a binder-style Parcel and calls its read
//! accessors in a fuzzer-chosen order, logging what each call did. Crashes,
//! hangs and sanitizer reports are the findings; decoded values are never
//! asserted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parcelfuzz::{Harness, HarnessConfig};
//!
//! fn main() -> Result<(), parcelfuzz::ConfigError> {
//!     let config = HarnessConfig::from_env()?;
//!     config.install_logging()?;
//!
//!     let harness = Harness::from_config(&config);
//!     // payload [5], one instruction: selector 0 (data_size), scalar 0
//!     harness.run(&[5, 0]);
//!     Ok(())
//! }
//! ```
//!
//! ## Input layout
//!
//! ```text
//! +---------------------------+----------------------------------------+
//! | payload (first half)      | instructions (second half)             |
//! | -> parcel contents        | sel arg | sel arg | ... | sel [arg=0]  |
//! +---------------------------+----------------------------------------+
//! ```
//!
//! `sel % table.len()` picks the probe; `arg` is its scalar argument (a
//! length, a position, or ignored).
//!
//! ## Modules Overview
//!
//! - [`parcel`] - the `Parcel` accessor contract plus an in-memory reference
//!   implementation and writer
//! - [`fuzz`] - probe table and dispatch driver
//! - [`logging`] - tagged fuzz log (`fuzz_log!`) and its outputs
//! - [`config`] - TOML / environment configuration

pub mod config;
pub mod fuzz;
pub mod logging;
pub mod parcel;

pub use config::{ConfigError, HarnessConfig, LogTarget};
pub use fuzz::{
    parcel_read_functions, select, FuzzInput, Harness, ParcelRead, RunSummary, StatusMode,
    MAX_INPUT_LEN,
};
pub use parcel::{MemParcel, Parcel, ParcelBuilder, Status, StatusResult};
