// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tagged diagnostic stream for fuzz probes.
//!
//! Every probe emits one line before and one line after it calls into the
//! buffer under test. Lines only ever carry metadata (operation name, status,
//! completion marker), never decoded values.
//!
//! ## Example
//!
//! ```ignore
//! use parcelfuzz::fuzz_log;
//! use parcelfuzz::logging::{init_logger, ConsoleOutput};
//! use std::sync::Arc;
//!
//! const FUZZ_LOG_TAG: &str = "parcel";
//!
//! init_logger(Arc::new(ConsoleOutput::new()));
//! fuzz_log!("about to setDataPosition: {}", pos);
//! ```
//!
//! Until an output is installed the stream is silent and costs one branch per
//! line. Library-internal diagnostics use the `log` facade instead.

pub mod logger;
mod output;

pub use logger::{capture, clear_logger, flush_logger, init_logger, log_line};
pub use output::{ConsoleOutput, FacadeOutput, FileOutput, MemoryOutput, Output};

/// Emit one fuzz log line.
///
/// Formatted like `format!()`. The tag is the `FUZZ_LOG_TAG` constant in scope
/// at the call site.
///
/// # Example
/// ```ignore
/// const FUZZ_LOG_TAG: &str = "parcel";
/// fuzz_log!("readBlob status: {}", status);
/// ```
#[macro_export]
macro_rules! fuzz_log {
    ($($arg:tt)*) => {
        $crate::logging::log_line(FUZZ_LOG_TAG, format_args!($($arg)*))
    };
}
