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

//! VFD I/O Dispatch
//!
//! Routes file I/O requests from the format layer onto a pluggable
//! [`FileDriver`](vfdio_core::FileDriver), using the richest primitive the
//! driver declares and decomposing the rest:
//!
//! | Request   | Native driver primitive | Fallback                          |
//! |-----------|-------------------------|-----------------------------------|
//! | scalar    | `read` / `write`        | none                              |
//! | vector    | `read_vector`           | one scalar call per entry         |
//! | selection | `read_selection`        | one batched vector call, else one scalar call per segment |
//!
//! Every entry point applies the file's base address, bounds-checks
//! against the EOA, and records which transfer shape reached the driver
//! in the per-thread [`telemetry`](vfdio_core::telemetry).
//!
//! ## Components
//!
//! - **File handle** (`file`): `IoFile`, relative EOA/EOF and the signature
//!   locator
//! - **Scalar** (`scalar`), **Vector** (`vector`) and **Selection**
//!   (`selection`) entry points
//! - **Translator** (`translate`): selection to sequence-list merge
//! - **Sort** (`sort`): address-ordered request helpers for drivers
//! - **Reference drivers**: `MemoryDriver`, `LocalFileDriver`

mod file;
mod scalar;
mod selection;
mod translate;
mod vector;

pub mod file_driver;
pub mod memory_driver;
pub mod sort;

pub use file::{IoFile, FORMAT_SIGNATURE};
pub use file_driver::LocalFileDriver;
pub use memory_driver::{DriverCall, DriverOp, MemoryDriver};
pub use selection::SkipCallbacks;
pub use sort::{
    apply_order, sort_order, sort_selection_io_req, sort_vector_io_req, SortedSelectionRequest,
    SortedVectorRequest,
};

pub use vfdio_core::{
    telemetry, Addr, DriverCapabilities, ErrorKind, FileDriver, IoConfig, MemType, Result,
    RunSelection, Selection, SpaceId, SpaceRef, SpaceRegistry, StridedSelection, VfdError,
};
