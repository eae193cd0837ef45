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

//! VFD I/O Core
//!
//! Fundamental types shared by the I/O dispatch layer and the file drivers
//! plugged underneath it.
//!
//! # Core Components
//!
//! - **Errors**: `VfdError` taxonomy and `Result` alias
//! - **Memory types**: `MemType` tags partitioning the address space
//! - **Inherit-previous codec**: `RunList` decoding of compressed request arrays
//! - **Scratch arrays**: inline-first doubling buffers (`ScratchVec`)
//! - **Selections**: `Selection` / `SelectionIter` collaborator traits,
//!   reference shapes and the `SpaceRegistry` of capability tokens
//! - **Driver trait**: `FileDriver` with optional vector/selection primitives
//! - **Telemetry**: per-thread I/O mode accumulator
//! - **Configuration**: `IoConfig`

pub mod config;
pub mod driver;
pub mod error;
pub mod inherit;
pub mod scratch;
pub mod selection;
pub mod telemetry;
pub mod types;

pub use config::IoConfig;
pub use driver::{DriverCapabilities, FileDriver, SelectionArgs};
pub use error::{ErrorKind, Result, VfdError};
pub use inherit::{Inherit, Run, RunList};
pub use scratch::{ScratchVec, LOCAL_SEL_ARR_LEN, LOCAL_VECTOR_LEN, SEQ_LIST_LEN};
pub use selection::{
    RunSelection, SeqList, SeqRun, Selection, SelectionIter, SharedRegistry, SpaceId, SpaceRef,
    SpaceRegistry, StridedSelection,
};
pub use telemetry::{IoModes, IoTelemetry, NoSelectionCause};
pub use types::{Addr, MemType, ADDR_UNDEF, NUM_MEM_TYPES};
