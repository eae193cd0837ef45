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

//! One-dimensional regular hyperslab

use super::{elements_to_bytes, SeqList, SeqRun, Selection, SelectionIter};
use crate::error::{Result, VfdError};

/// `count` blocks of `block` elements, `stride` elements apart, from `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedSelection {
    start: u64,
    stride: u64,
    count: u64,
    block: u64,
}

impl StridedSelection {
    pub fn new(start: u64, stride: u64, count: u64, block: u64) -> Result<Self> {
        if count > 1 && stride < block {
            return Err(VfdError::invalid(format!(
                "hyperslab blocks overlap: stride {} < block {}",
                stride, block
            )));
        }
        count
            .checked_mul(block)
            .and_then(|n| n.checked_add(start))
            .ok_or_else(|| VfdError::invalid("hyperslab extent overflows"))?;
        Ok(Self {
            start,
            stride,
            count,
            block,
        })
    }

    /// Blocks touch each other, so the whole hyperslab is one run
    #[inline]
    fn is_contiguous(&self) -> bool {
        self.count <= 1 || self.stride == self.block
    }
}

impl Selection for StridedSelection {
    fn element_count(&self) -> u64 {
        self.count * self.block
    }

    fn iter(&self, element_size: usize) -> Result<Box<dyn SelectionIter + '_>> {
        if element_size == 0 {
            return Err(VfdError::invalid("selection element size must be non-zero"));
        }
        let (blocks, block_len, stride) = if self.is_contiguous() {
            (u64::from(self.element_count() > 0), self.element_count(), 0)
        } else {
            (self.count, self.block, self.stride)
        };
        Ok(Box::new(StridedIter {
            start: self.start,
            stride,
            block: block_len,
            remaining: if block_len == 0 { 0 } else { blocks },
            next: 0,
            element_size,
        }))
    }
}

struct StridedIter {
    start: u64,
    stride: u64,
    block: u64,
    remaining: u64,
    next: u64,
    element_size: usize,
}

impl SelectionIter for StridedIter {
    fn next_runs(&mut self, max_runs: usize, out: &mut SeqList) -> Result<u64> {
        let len = elements_to_bytes(self.block, self.element_size)?;
        let len = usize::try_from(len)
            .map_err(|_| VfdError::invalid(format!("run of {} bytes too long", len)))?;
        let mut elements = 0;
        let mut emitted = 0;
        while self.remaining > 0 && emitted < max_runs {
            let first = self
                .next
                .checked_mul(self.stride)
                .and_then(|o| o.checked_add(self.start))
                .ok_or_else(|| VfdError::invalid("hyperslab block offset overflows"))?;
            out.push(SeqRun::new(elements_to_bytes(first, self.element_size)?, len));
            elements += self.block;
            emitted += 1;
            self.next += 1;
            self.remaining -= 1;
        }
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::collect_runs;

    #[test]
    fn test_strided_runs() {
        let sel = StridedSelection::new(2, 5, 3, 2).unwrap();
        assert_eq!(sel.element_count(), 6);
        let runs = collect_runs(&sel, 4).unwrap();
        assert_eq!(
            runs,
            vec![SeqRun::new(8, 8), SeqRun::new(28, 8), SeqRun::new(48, 8)]
        );
    }

    #[test]
    fn test_contiguous_blocks_coalesce() {
        let sel = StridedSelection::new(1, 3, 4, 3).unwrap();
        let runs = collect_runs(&sel, 2).unwrap();
        assert_eq!(runs, vec![SeqRun::new(2, 24)]);
    }

    #[test]
    fn test_overlapping_blocks_rejected() {
        assert!(StridedSelection::new(0, 2, 3, 4).is_err());
        assert!(StridedSelection::new(0, 0, 1, 4).is_ok());
    }

    #[test]
    fn test_empty_hyperslab() {
        let sel = StridedSelection::new(0, 4, 0, 2).unwrap();
        assert_eq!(sel.element_count(), 0);
        assert!(collect_runs(&sel, 4).unwrap().is_empty());
    }
}
