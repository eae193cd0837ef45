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

//! "Inherit the previous value" array compression
//!
//! Long homogeneous I/O batches omit repeated fields: an entry holding the
//! inherit sentinel (`MemType::NoList` for tags, `0` for sizes, `None` for
//! buffers) takes the value of the nearest earlier explicit entry. Index 0
//! must always be explicit.
//!
//! Instead of special-casing the sentinel at every use site, a compressed
//! array is decoded once into a [`RunList`] of `{value, repeat}` runs. The
//! run list iterates as the fully resolved flat sequence and can be encoded
//! back into the compressed call shape.
//!
//! ```text
//! sizes   = [100, 0, 50, 0, 0]
//! runs    = [(100 x2), (50 x3)]
//! decoded = [100, 100, 50, 50, 50]
//! ```

use smallvec::SmallVec;

use crate::error::{Result, VfdError};
use crate::types::MemType;

/// A field type with a reserved "inherit previous" sentinel
pub trait Inherit: Copy + PartialEq {
    const INHERIT: Self;

    #[inline]
    fn is_inherit(&self) -> bool {
        *self == Self::INHERIT
    }
}

impl Inherit for MemType {
    const INHERIT: Self = MemType::NoList;
}

impl Inherit for usize {
    const INHERIT: Self = 0;
}

/// One run of identical resolved values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<T> {
    pub value: T,
    /// Position of the first element of the run
    pub start: usize,
    pub repeat: usize,
}

impl<T> Run<T> {
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.repeat
    }
}

/// Run-length representation of a resolved field array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunList<T> {
    runs: SmallVec<[Run<T>; 4]>,
    len: usize,
}

impl<T: Copy + PartialEq> Default for RunList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + PartialEq> RunList<T> {
    pub fn new() -> Self {
        Self {
            runs: SmallVec::new(),
            len: 0,
        }
    }

    /// Append one resolved value, extending the last run when equal
    pub fn push(&mut self, value: T) {
        self.push_repeat(value, 1);
    }

    pub fn push_repeat(&mut self, value: T, repeat: usize) {
        if repeat == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.value == value => last.repeat += repeat,
            _ => self.runs.push(Run {
                value,
                start: self.len,
                repeat,
            }),
        }
        self.len += repeat;
    }

    /// Number of resolved elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn runs(&self) -> &[Run<T>] {
        &self.runs
    }

    /// Resolved value at `index`
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let pos = self.runs.partition_point(|run| run.end() <= index);
        self.runs.get(pos).map(|run| run.value)
    }

    pub fn iter(&self) -> RunIter<'_, T> {
        RunIter {
            runs: &self.runs,
            run: 0,
            taken: 0,
            remaining: self.len,
        }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<T: Inherit> RunList<T> {
    /// Decode a compressed array; the first entry must be explicit
    pub fn decode(compressed: &[T]) -> Result<Self> {
        let mut list = Self::new();
        let mut current = match compressed.first() {
            None => return Ok(list),
            Some(first) if first.is_inherit() => {
                return Err(VfdError::invalid(
                    "first entry of a compressed array must be explicit",
                ));
            }
            Some(first) => *first,
        };
        for value in compressed {
            if !value.is_inherit() {
                current = *value;
            }
            list.push(current);
        }
        Ok(list)
    }

    /// Encode back into the compressed call shape: the first element of
    /// each run is explicit, the rest carry the sentinel
    pub fn encode(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for run in &self.runs {
            out.push(run.value);
            out.extend(std::iter::repeat(T::INHERIT).take(run.repeat - 1));
        }
        out
    }
}

impl RunList<usize> {
    /// Map every position to the nearest explicit position at or before it
    ///
    /// Used for fields whose sentinel is not a value of the field itself,
    /// such as optional buffer references.
    pub fn sources(len: usize, mut is_explicit: impl FnMut(usize) -> bool) -> Result<Self> {
        let mut list = Self::new();
        if len == 0 {
            return Ok(list);
        }
        if !is_explicit(0) {
            return Err(VfdError::invalid(
                "first entry of a compressed array must be explicit",
            ));
        }
        let mut source = 0;
        for i in 0..len {
            if is_explicit(i) {
                source = i;
            }
            list.push(source);
        }
        Ok(list)
    }
}

/// Flattening iterator over a [`RunList`]
pub struct RunIter<'a, T> {
    runs: &'a [Run<T>],
    run: usize,
    taken: usize,
    remaining: usize,
}

impl<T: Copy> Iterator for RunIter<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let run = self.runs.get(self.run)?;
        let value = run.value;
        self.taken += 1;
        self.remaining -= 1;
        if self.taken == run.repeat {
            self.run += 1;
            self.taken = 0;
        }
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Copy> ExactSizeIterator for RunIter<'_, T> {}

/// Decode a compressed array straight into a flat vector
pub fn resolve<T: Inherit>(compressed: &[T]) -> Result<Vec<T>> {
    Ok(RunList::decode(compressed)?.to_vec())
}
