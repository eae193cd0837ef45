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

//! Selections over an address space
//!
//! A selection describes a structured set of elements within a linear
//! address space, either in the file or in a memory buffer. The dispatch
//! layer never looks inside a selection: it only asks for its element
//! count and walks it through a [`SelectionIter`], which hands out the
//! selection as bounded batches of contiguous byte runs (a *sequence
//! list*).
//!
//! Selections are referenced either directly or through a capability token
//! registered in a [`SpaceRegistry`]; [`SpaceRef`] carries both forms and is
//! resolved once at the dispatch boundary.

mod registry;
mod runs;
mod strided;

pub use registry::{SharedRegistry, SpaceId, SpaceRef, SpaceRegistry};
pub use runs::RunSelection;
pub use strided::StridedSelection;

use smallvec::SmallVec;
use std::fmt;

use crate::error::Result;
use crate::scratch::SEQ_LIST_LEN;

/// One contiguous run of a selection, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeqRun {
    pub offset: u64,
    pub len: usize,
}

impl SeqRun {
    #[inline]
    pub fn new(offset: u64, len: usize) -> Self {
        Self { offset, len }
    }
}

/// Sequence list refilled in bounded chunks
pub type SeqList = SmallVec<[SeqRun; SEQ_LIST_LEN]>;

/// A structured set of elements in a linear address space
pub trait Selection: Send + Sync + fmt::Debug {
    /// Number of selected elements
    fn element_count(&self) -> u64;

    /// Start iterating the selection as byte runs of `element_size`-byte
    /// elements
    fn iter(&self, element_size: usize) -> Result<Box<dyn SelectionIter + '_>>;
}

/// Cursor handing out a selection's contiguous runs
///
/// Dropping the iterator releases it.
pub trait SelectionIter {
    /// Append up to `max_runs` runs to `out` and return the number of
    /// elements they cover. Returns 0 (and appends nothing) once exhausted.
    fn next_runs(&mut self, max_runs: usize, out: &mut SeqList) -> Result<u64>;
}

/// Multiply an element quantity into bytes
pub(crate) fn elements_to_bytes(elements: u64, element_size: usize) -> Result<u64> {
    elements.checked_mul(element_size as u64).ok_or_else(|| {
        crate::error::VfdError::invalid(format!(
            "selection extent overflows: {} elements of {} bytes",
            elements, element_size
        ))
    })
}

/// Drain an iterator completely into a flat run list
pub fn collect_runs(space: &dyn Selection, element_size: usize) -> Result<Vec<SeqRun>> {
    let mut iter = space.iter(element_size)?;
    let mut runs = Vec::new();
    let mut batch = SeqList::new();
    loop {
        batch.clear();
        if iter.next_runs(SEQ_LIST_LEN, &mut batch)? == 0 && batch.is_empty() {
            break;
        }
        runs.extend_from_slice(&batch);
    }
    Ok(runs)
}
