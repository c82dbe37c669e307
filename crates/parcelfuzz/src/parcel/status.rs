// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Status codes reported by status-returning parcel accessors.
//!
//! Values follow the Android `status_t` numbering so logs line up with
//! traces captured from real binder processes.

use std::fmt;

/// Outcome code of a parcel accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(i32);

impl Status {
    pub const OK: Status = Status(0);
    pub const UNKNOWN_ERROR: Status = Status(i32::MIN);
    pub const NO_MEMORY: Status = Status(-12);
    pub const INVALID_OPERATION: Status = Status(-38);
    pub const BAD_VALUE: Status = Status(-22);
    pub const BAD_TYPE: Status = Status(i32::MIN + 1);
    pub const NAME_NOT_FOUND: Status = Status(-2);
    pub const PERMISSION_DENIED: Status = Status(-1);
    pub const NO_INIT: Status = Status(-19);
    pub const ALREADY_EXISTS: Status = Status(-17);
    pub const DEAD_OBJECT: Status = Status(-32);
    pub const FAILED_TRANSACTION: Status = Status(i32::MIN + 2);
    pub const BAD_INDEX: Status = Status(-75);
    pub const NOT_ENOUGH_DATA: Status = Status(-61);
    pub const WOULD_BLOCK: Status = Status(-11);
    pub const TIMED_OUT: Status = Status(-110);
    pub const UNKNOWN_TRANSACTION: Status = Status(-74);
    pub const FDS_NOT_ALLOWED: Status = Status(i32::MIN + 7);
    pub const UNEXPECTED_NULL: Status = Status(i32::MIN + 8);

    pub const fn from_code(code: i32) -> Self {
        Status(code)
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// Collapse an accessor result into its status, dropping the value.
    pub fn of<T>(result: &Result<T, Status>) -> Status {
        match result {
            Ok(_) => Status::OK,
            Err(status) => *status,
        }
    }

    /// Symbolic name, `None` for codes outside the known set.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Status::OK => "OK",
            Status::UNKNOWN_ERROR => "UNKNOWN_ERROR",
            Status::NO_MEMORY => "NO_MEMORY",
            Status::INVALID_OPERATION => "INVALID_OPERATION",
            Status::BAD_VALUE => "BAD_VALUE",
            Status::BAD_TYPE => "BAD_TYPE",
            Status::NAME_NOT_FOUND => "NAME_NOT_FOUND",
            Status::PERMISSION_DENIED => "PERMISSION_DENIED",
            Status::NO_INIT => "NO_INIT",
            Status::ALREADY_EXISTS => "ALREADY_EXISTS",
            Status::DEAD_OBJECT => "DEAD_OBJECT",
            Status::FAILED_TRANSACTION => "FAILED_TRANSACTION",
            Status::BAD_INDEX => "BAD_INDEX",
            Status::NOT_ENOUGH_DATA => "NOT_ENOUGH_DATA",
            Status::WOULD_BLOCK => "WOULD_BLOCK",
            Status::TIMED_OUT => "TIMED_OUT",
            Status::UNKNOWN_TRANSACTION => "UNKNOWN_TRANSACTION",
            Status::FDS_NOT_ALLOWED => "FDS_NOT_ALLOWED",
            Status::UNEXPECTED_NULL => "UNEXPECTED_NULL",
            _ => return None,
        };
        Some(name)
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "status {}", self.0),
        }
    }
}

impl std::error::Error for Status {}

pub type StatusResult<T> = core::result::Result<T, Status>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_known_and_unknown() {
        assert_eq!(Status::OK.to_string(), "OK (0)");
        assert_eq!(Status::NOT_ENOUGH_DATA.to_string(), "NOT_ENOUGH_DATA (-61)");
        assert_eq!(
            Status::BAD_TYPE.to_string(),
            format!("BAD_TYPE ({})", i32::MIN + 1)
        );
        assert_eq!(Status::from_code(1234).to_string(), "status 1234");
    }

    #[test]
    fn test_status_of_result() {
        let ok: StatusResult<u32> = Ok(7);
        let err: StatusResult<u32> = Err(Status::BAD_VALUE);
        assert_eq!(Status::of(&ok), Status::OK);
        assert_eq!(Status::of(&err), Status::BAD_VALUE);
        assert!(Status::default().is_ok());
        assert!(!Status::UNEXPECTED_NULL.is_ok());
    }
}
