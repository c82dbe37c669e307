// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fuzz log output backends (console, file, memory, `log` facade).
//!
//! Implementations are thread-safe. Each receives one diagnostic line at a
//! time, already formatted, plus the tag of the module that emitted it.

use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Output destination trait for fuzz log lines.
pub trait Output: Send + Sync {
    /// Write one line.
    ///
    /// # Parameters
    /// - `tag`: emitting module's tag (e.g. `parcel`)
    /// - `message`: the formatted line, without trailing newline
    fn write(&self, tag: &str, message: &str) -> io::Result<()>;

    /// Flush any buffered output.
    fn flush(&self) -> io::Result<()>;
}

/// Console output implementation.
///
/// Writes `[tag] message` to stderr.
#[derive(Debug, Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Output for ConsoleOutput {
    fn write(&self, tag: &str, message: &str) -> io::Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "[{}] {}", tag, message)
    }

    fn flush(&self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// File output implementation.
///
/// Appends `[tag] message` lines to a file created (or truncated) on open.
#[derive(Debug)]
pub struct FileOutput {
    file: Mutex<std::fs::File>,
}

impl FileOutput {
    /// Create a new file output at `path`.
    ///
    /// # Returns
    /// - `Ok(FileOutput)` on success
    /// - `Err(io::Error)` if the file cannot be created
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl Output for FileOutput {
    fn write(&self, tag: &str, message: &str) -> io::Result<()> {
        let mut file = self.file.lock();
        writeln!(file, "[{}] {}", tag, message)
    }

    fn flush(&self) -> io::Result<()> {
        self.file.lock().flush()
    }
}

/// In-memory output, keeps every line for later inspection.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    lines: Mutex<Vec<String>>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Drain the lines written so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl Output for MemoryOutput {
    fn write(&self, tag: &str, message: &str) -> io::Result<()> {
        self.lines.lock().push(format!("[{}] {}", tag, message));
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Forwards lines to the `log` facade at info level.
///
/// Lets binaries route the fuzz log through their `tracing` subscriber.
#[derive(Debug, Default)]
pub struct FacadeOutput;

impl FacadeOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Output for FacadeOutput {
    fn write(&self, tag: &str, message: &str) -> io::Result<()> {
        log::info!(target: "parcelfuzz::fuzz", "[{}] {}", tag, message);
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        log::logger().flush();
        Ok(())
    }
}
