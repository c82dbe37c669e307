// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Input framing and dispatch.

use super::{parcel_read_functions, ParcelRead};
use crate::config::HarnessConfig;
use crate::fuzz_log;
use crate::parcel::{MemParcel, Parcel};

const FUZZ_LOG_TAG: &str = "driver";

/// Inputs longer than this are ignored.
pub const MAX_INPUT_LEN: usize = 50_000;

/// Map a selector byte onto a table of `table_len` probes.
///
/// Returns `None` only for an empty table.
pub fn select(table_len: usize, selector: u8) -> Option<usize> {
    usize::from(selector).checked_rem(table_len)
}

/// A fuzz input split into parcel payload and instruction bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzInput<'a> {
    /// First half of the input; becomes the parcel contents.
    pub payload: &'a [u8],
    /// Second half; consumed as `(selector, scalar)` pairs.
    pub instructions: &'a [u8],
}

impl<'a> FuzzInput<'a> {
    /// Split `data`, or `None` when it is too short (one byte or less) or
    /// longer than `max_len`.
    pub fn split(data: &'a [u8], max_len: usize) -> Option<Self> {
        if data.len() <= 1 || data.len() > max_len {
            return None;
        }
        let (payload, instructions) = data.split_at(data.len() / 2);
        Some(Self {
            payload,
            instructions,
        })
    }

    /// Number of instructions, counting a trailing lone selector.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len().div_ceil(2)
    }

    /// `(selector, scalar)` pairs. A trailing selector gets scalar `0`.
    pub fn instructions(&self) -> impl Iterator<Item = (u8, u8)> + 'a {
        self.instructions
            .chunks(2)
            .map(|pair| (pair[0], pair.get(1).copied().unwrap_or(0)))
    }
}

/// What one input did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Probes dispatched.
    pub operations: usize,
    /// Bytes handed to the parcel.
    pub payload_len: usize,
}

/// Dispatch a single instruction. Returns `false` if the table is empty.
pub fn run_one<P: Parcel>(reads: &[ParcelRead<P>], parcel: &P, selector: u8, scalar: u8) -> bool {
    match select(reads.len(), selector) {
        Some(idx) => {
            reads[idx].run(parcel, scalar);
            true
        }
        None => false,
    }
}

/// Run every instruction of `input` against `parcel`, in order.
pub fn run_instructions<P: Parcel>(
    reads: &[ParcelRead<P>],
    parcel: &P,
    input: &FuzzInput<'_>,
) -> RunSummary {
    let total = input.instruction_count();
    let mut summary = RunSummary {
        operations: 0,
        payload_len: input.payload.len(),
    };

    for (i, (selector, scalar)) in input.instructions().enumerate() {
        let Some(idx) = select(reads.len(), selector) else {
            log::debug!("[driver] empty probe table, nothing to run");
            break;
        };
        fuzz_log!(
            "Instruction: {}/{} cmd: {} ({}) arg: {} size: {} avail: {} pos: {} cap: {}",
            i + 1,
            total,
            selector,
            idx,
            scalar,
            parcel.data_size(),
            parcel.data_avail(),
            parcel.data_position(),
            parcel.data_capacity()
        );
        reads[idx].run(parcel, scalar);
        summary.operations += 1;
    }

    summary
}

/// Probe table plus input limits, built once and reused for every input.
#[derive(Debug, Clone)]
pub struct Harness {
    reads: Vec<ParcelRead<MemParcel>>,
    max_input_len: usize,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            reads: parcel_read_functions(),
            max_input_len: MAX_INPUT_LEN,
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            max_input_len: config.max_input_len,
            ..Self::new()
        }
    }

    pub fn reads(&self) -> &[ParcelRead<MemParcel>] {
        &self.reads
    }

    pub fn max_input_len(&self) -> usize {
        self.max_input_len
    }

    /// Run one fuzz input. Returns `None` when the input is ignored.
    ///
    /// A fresh parcel is built from the payload and shared by every
    /// instruction of the input.
    pub fn run(&self, data: &[u8]) -> Option<RunSummary> {
        let Some(input) = FuzzInput::split(data, self.max_input_len) else {
            log::trace!("[driver] ignoring {} byte input", data.len());
            return None;
        };
        let parcel = MemParcel::from_bytes(input.payload);
        Some(run_instructions(&self.reads, &parcel, &input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture;

    #[test]
    fn test_select_is_modulo_table_len() {
        assert_eq!(select(51, 0), Some(0));
        assert_eq!(select(51, 50), Some(50));
        assert_eq!(select(51, 51), Some(0));
        assert_eq!(select(51, 255), Some(255 % 51));
        assert_eq!(select(1, 200), Some(0));
        assert_eq!(select(0, 7), None);
    }

    #[test]
    fn test_split_rejects_tiny_and_oversized_inputs() {
        assert!(FuzzInput::split(&[], MAX_INPUT_LEN).is_none());
        assert!(FuzzInput::split(&[1], MAX_INPUT_LEN).is_none());
        assert!(FuzzInput::split(&[0u8; 11], 10).is_none());
        assert!(FuzzInput::split(&[0u8; 10], 10).is_some());
    }

    #[test]
    fn test_split_halves_input() {
        let data = [1u8, 2, 3, 4, 5];
        let input = FuzzInput::split(&data, MAX_INPUT_LEN).expect("split should succeed");
        assert_eq!(input.payload, &[1, 2]);
        assert_eq!(input.instructions, &[3, 4, 5]);
        assert_eq!(input.instruction_count(), 2);
        let pairs: Vec<(u8, u8)> = input.instructions().collect();
        assert_eq!(pairs, vec![(3, 4), (5, 0)]);
    }

    #[test]
    fn test_run_one_on_empty_table() {
        let reads: Vec<ParcelRead<MemParcel>> = Vec::new();
        assert!(!run_one(&reads, &MemParcel::new(), 3, 0));
    }

    #[test]
    fn test_run_one_dispatches_by_selector() {
        let reads = parcel_read_functions::<MemParcel>();
        let parcel = MemParcel::from_bytes(&[0u8; 8]);
        // 55 % 51 == 4: set_data_position
        let (ran, lines) = capture(|| run_one(&reads, &parcel, 55, 6));
        assert!(ran);
        assert_eq!(parcel.data_position(), 6);
        assert_eq!(lines[0], "[parcel] about to setDataPosition: 6");
    }

    #[test]
    fn test_run_logs_instruction_header() {
        let harness = Harness::new();
        let (summary, lines) = capture(|| harness.run(&[5, 0, 0, 0, 0, 9]));
        let summary = summary.expect("input should run");
        assert_eq!(summary.operations, 2);
        assert_eq!(summary.payload_len, 3);
        assert_eq!(
            lines[0],
            "[driver] Instruction: 1/2 cmd: 0 (0) arg: 0 size: 3 avail: 3 pos: 0 cap: 3"
        );
        assert_eq!(lines[1], "[parcel] about to read usize using data_size with no status");
        assert_eq!(lines[2], "[parcel] usize done");
        assert!(lines[3].starts_with("[driver] Instruction: 2/2 cmd: 9 (9) arg: 0"));
    }

    #[test]
    fn test_harness_respects_configured_limit() {
        let config = HarnessConfig {
            max_input_len: 4,
            ..HarnessConfig::default()
        };
        let harness = Harness::from_config(&config);
        assert_eq!(harness.max_input_len(), 4);
        assert!(harness.run(&[0u8; 4]).is_some());
        assert!(harness.run(&[0u8; 5]).is_none());
    }
}
