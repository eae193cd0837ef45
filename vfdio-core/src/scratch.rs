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

//! Scratch arrays with inline storage and heap promotion
//!
//! Small batches live entirely in fixed-capacity inline storage. When a
//! push would exceed capacity the array is promoted to the heap and its
//! capacity doubles on every further overflow. Ownership is scope-bound,
//! so heap storage is released on every exit path, success or error.

use smallvec::{Array, SmallVec};
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::{Result, VfdError};

/// Inline slots for vector requests built while translating selections
pub const LOCAL_VECTOR_LEN: usize = 8;

/// Runs requested from a selection iterator per refill
pub const SEQ_LIST_LEN: usize = 128;

/// Inline slots for per-selection arrays (space handles and the like)
pub const LOCAL_SEL_ARR_LEN: usize = 8;

/// Doubling scratch array
pub struct ScratchVec<A: Array> {
    inner: SmallVec<A>,
}

impl<A: Array> fmt::Debug for ScratchVec<A>
where
    A::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchVec")
            .field("items", &self.inner.as_slice())
            .field("promoted", &self.inner.spilled())
            .finish()
    }
}

impl<A: Array> Default for ScratchVec<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Array> ScratchVec<A> {
    pub fn new() -> Self {
        Self {
            inner: SmallVec::new(),
        }
    }

    /// Append an item, doubling capacity when full
    pub fn push(&mut self, item: A::Item) -> Result<()> {
        if self.inner.len() == self.inner.capacity() {
            self.grow()?;
        }
        self.inner.push(item);
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        let current = self.inner.capacity().max(1);
        let new_cap = current.checked_mul(2).ok_or_else(|| {
            VfdError::alloc(format!("scratch capacity overflow at {}", current))
        })?;
        let was_inline = !self.inner.spilled();
        self.inner.try_grow(new_cap).map_err(|e| {
            VfdError::alloc(format!(
                "growing scratch array to {} slots: {:?}",
                new_cap, e
            ))
        })?;
        if was_inline {
            tracing::trace!(capacity = new_cap, "scratch array promoted to heap");
        }
        Ok(())
    }

    /// Whether storage has been promoted to the heap
    #[inline]
    pub fn is_promoted(&self) -> bool {
        self.inner.spilled()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<A: Array> Deref for ScratchVec<A> {
    type Target = [A::Item];

    fn deref(&self) -> &[A::Item] {
        &self.inner
    }
}

impl<A: Array> DerefMut for ScratchVec<A> {
    fn deref_mut(&mut self) -> &mut [A::Item] {
        &mut self.inner
    }
}
