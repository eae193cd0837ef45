// SPDX-License-Identifier: AGPL-3.0-or-later
// SochDB - LLM-Optimized Embedded Database
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! I/O mode telemetry
//!
//! Records which transfer shape actually reached the driver for raw-data
//! operations, and why the richer shapes were not used. Flags are OR-ed
//! into a per-thread accumulator, the same way an API context collects
//! them across one logical operation: callers `reset()` before the
//! operation and `take()` or `snapshot()` afterwards.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vfdio_core::telemetry::{self, IoModes};
//!
//! telemetry::reset();
//! file.write_vector(&types, &mut addrs, &sizes, &bufs)?;
//! assert!(telemetry::snapshot().modes.contains(IoModes::VECTOR));
//! ```

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Transfer shapes used by an operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IoModes(u32);

impl IoModes {
    pub const NONE: IoModes = IoModes(0);
    pub const SCALAR: IoModes = IoModes(0x0001);
    pub const VECTOR: IoModes = IoModes(0x0002);
    pub const SELECTION: IoModes = IoModes(0x0004);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: IoModes) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for IoModes {
    type Output = IoModes;

    fn bitor(self, rhs: IoModes) -> IoModes {
        IoModes(self.0 | rhs.0)
    }
}

impl BitOrAssign for IoModes {
    fn bitor_assign(&mut self, rhs: IoModes) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for IoModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(IoModes::SCALAR) {
            names.push("scalar");
        }
        if self.contains(IoModes::VECTOR) {
            names.push("vector");
        }
        if self.contains(IoModes::SELECTION) {
            names.push("selection");
        }
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// Reasons a richer transfer shape was not used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoSelectionCause(u32);

impl NoSelectionCause {
    pub const NONE: NoSelectionCause = NoSelectionCause(0);
    /// The driver offers neither vector nor selection primitives
    pub const NO_VECTOR_OR_SELECTION_CB: NoSelectionCause = NoSelectionCause(0x0040);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: NoSelectionCause) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for NoSelectionCause {
    type Output = NoSelectionCause;

    fn bitor(self, rhs: NoSelectionCause) -> NoSelectionCause {
        NoSelectionCause(self.0 | rhs.0)
    }
}

/// Accumulated telemetry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoTelemetry {
    /// Transfer shapes that reached the driver for raw data
    pub modes: IoModes,
    /// Fallback causes
    pub no_selection_cause: NoSelectionCause,
}

impl IoTelemetry {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

thread_local! {
    static TELEMETRY: Cell<IoTelemetry> = const {
        Cell::new(IoTelemetry {
            modes: IoModes::NONE,
            no_selection_cause: NoSelectionCause::NONE,
        })
    };
}

/// OR a transfer shape into the accumulator
pub fn record_mode(mode: IoModes) {
    TELEMETRY.with(|t| {
        let mut current = t.get();
        current.modes |= mode;
        t.set(current);
    });
}

/// OR a fallback cause into the accumulator
pub fn record_no_selection_cause(cause: NoSelectionCause) {
    TELEMETRY.with(|t| {
        let mut current = t.get();
        current.no_selection_cause = current.no_selection_cause | cause;
        t.set(current);
    });
}

pub fn snapshot() -> IoTelemetry {
    TELEMETRY.with(|t| t.get())
}

pub fn reset() {
    TELEMETRY.with(|t| t.set(IoTelemetry::default()));
}

/// Return the accumulated telemetry and clear it
pub fn take() -> IoTelemetry {
    TELEMETRY.with(|t| t.replace(IoTelemetry::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_accumulate() {
        reset();
        record_mode(IoModes::SCALAR);
        record_mode(IoModes::VECTOR);
        record_no_selection_cause(NoSelectionCause::NO_VECTOR_OR_SELECTION_CB);

        let t = take();
        assert!(t.modes.contains(IoModes::SCALAR | IoModes::VECTOR));
        assert!(!t.modes.contains(IoModes::SELECTION));
        assert!(t
            .no_selection_cause
            .contains(NoSelectionCause::NO_VECTOR_OR_SELECTION_CB));
        assert_eq!(t.modes.to_string(), "scalar|vector");

        assert_eq!(snapshot(), IoTelemetry::default());
    }

    #[test]
    fn test_json_shape() {
        let t = IoTelemetry {
            modes: IoModes::SELECTION,
            no_selection_cause: NoSelectionCause::NONE,
        };
        assert_eq!(t.to_json(), r#"{"modes":4,"no_selection_cause":0}"#);
    }
}
