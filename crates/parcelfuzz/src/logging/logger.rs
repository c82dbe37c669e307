// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global fuzz log sink and per-thread capture.
//!
//! Lines go to a thread-local capture buffer when one is active, otherwise to
//! the process-wide output, otherwise nowhere. Nothing is formatted when no
//! sink is listening.

use super::output::Output;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::fmt;
use std::io;
use std::sync::Arc;

static OUTPUT: RwLock<Option<Arc<dyn Output>>> = parking_lot::const_rwlock(None);

thread_local! {
    static CAPTURE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Install (or replace) the process-wide output.
///
/// # Example
/// ```ignore
/// use parcelfuzz::logging::{init_logger, ConsoleOutput};
/// init_logger(Arc::new(ConsoleOutput::new()));
/// ```
pub fn init_logger(output: Arc<dyn Output>) {
    *OUTPUT.write() = Some(output);
}

/// Remove the process-wide output; later lines are dropped.
pub fn clear_logger() {
    *OUTPUT.write() = None;
}

/// Internal: emit one line. Called by `fuzz_log!`.
#[doc(hidden)]
pub fn log_line(tag: &str, args: fmt::Arguments<'_>) {
    let captured = CAPTURE.with(|capture| match capture.borrow_mut().as_mut() {
        Some(lines) => {
            lines.push(format!("[{}] {}", tag, args));
            true
        }
        None => false,
    });
    if captured {
        return;
    }

    let output = OUTPUT.read().clone();
    if let Some(output) = output {
        if let Err(e) = output.write(tag, &fmt::format(args)) {
            log::debug!("[logging] fuzz log write failed: {}", e);
        }
    }
}

/// Flush the process-wide output. Safe to call if none is installed.
pub fn flush_logger() -> io::Result<()> {
    let output = OUTPUT.read().clone();
    match output {
        Some(output) => output.flush(),
        None => Ok(()),
    }
}

/// Restores the previous capture buffer, also on unwind.
struct CaptureGuard {
    previous: Option<Vec<String>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CAPTURE.with(|capture| *capture.borrow_mut() = previous);
    }
}

/// Run `f`, collecting every line this thread emits meanwhile.
///
/// Captured lines bypass the process-wide output.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let previous = CAPTURE.with(|capture| capture.borrow_mut().replace(Vec::new()));
    let guard = CaptureGuard { previous };
    let result = f();
    let lines = CAPTURE.with(|capture| capture.borrow_mut().take().unwrap_or_default());
    drop(guard);
    (result, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_line_without_sink_is_noop() {
        log_line("test", format_args!("dropped {}", 1));
        assert!(flush_logger().is_ok());
    }

    #[test]
    fn test_capture_collects_tagged_lines() {
        let (value, lines) = capture(|| {
            log_line("parcel", format_args!("about to read {}", "i32"));
            log_line("driver", format_args!("done"));
            7
        });
        assert_eq!(value, 7);
        assert_eq!(lines, vec!["[parcel] about to read i32", "[driver] done"]);
    }

    #[test]
    fn test_nested_capture_restores_outer_buffer() {
        let ((), outer) = capture(|| {
            log_line("outer", format_args!("before"));
            let ((), inner) = capture(|| log_line("inner", format_args!("nested")));
            assert_eq!(inner, vec!["[inner] nested"]);
            log_line("outer", format_args!("after"));
        });
        assert_eq!(outer, vec!["[outer] before", "[outer] after"]);
    }
}
