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

//! Explicit run-list selection

use super::{elements_to_bytes, SeqList, SeqRun, Selection, SelectionIter};
use crate::error::{Result, VfdError};

/// Ordered list of `(start_element, element_count)` runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSelection {
    runs: Vec<(u64, u64)>,
    elements: u64,
}

impl RunSelection {
    /// Build from element runs; zero-length runs are dropped
    pub fn new(runs: impl IntoIterator<Item = (u64, u64)>) -> Result<Self> {
        let runs: Vec<(u64, u64)> = runs.into_iter().filter(|(_, n)| *n > 0).collect();
        let mut elements = 0u64;
        for &(start, count) in &runs {
            elements = elements.checked_add(count).ok_or_else(|| {
                VfdError::invalid(format!(
                    "run selection element count overflows at run starting {}",
                    start
                ))
            })?;
        }
        Ok(Self { runs, elements })
    }

    /// Every element of a `len`-element extent
    pub fn all(len: u64) -> Self {
        let runs = if len > 0 { vec![(0, len)] } else { Vec::new() };
        Self {
            runs,
            elements: len,
        }
    }

    /// The empty selection
    pub fn none() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> &[(u64, u64)] {
        &self.runs
    }
}

impl Selection for RunSelection {
    fn element_count(&self) -> u64 {
        self.elements
    }

    fn iter(&self, element_size: usize) -> Result<Box<dyn SelectionIter + '_>> {
        if element_size == 0 {
            return Err(VfdError::invalid("selection element size must be non-zero"));
        }
        Ok(Box::new(RunIter {
            runs: &self.runs,
            next: 0,
            element_size,
        }))
    }
}

struct RunIter<'a> {
    runs: &'a [(u64, u64)],
    next: usize,
    element_size: usize,
}

impl SelectionIter for RunIter<'_> {
    fn next_runs(&mut self, max_runs: usize, out: &mut SeqList) -> Result<u64> {
        let mut elements = 0;
        for &(start, count) in self.runs[self.next..].iter().take(max_runs) {
            let offset = elements_to_bytes(start, self.element_size)?;
            let len = elements_to_bytes(count, self.element_size)?;
            let len = usize::try_from(len)
                .map_err(|_| VfdError::invalid(format!("run of {} bytes too long", len)))?;
            out.push(SeqRun::new(offset, len));
            elements += count;
            self.next += 1;
        }
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_iteration() {
        let sel = RunSelection::new([(0, 2), (5, 0), (10, 3), (20, 1)]).unwrap();
        assert_eq!(sel.element_count(), 6);
        assert_eq!(sel.runs().len(), 3);

        let mut iter = sel.iter(4).unwrap();
        let mut out = SeqList::new();
        assert_eq!(iter.next_runs(2, &mut out).unwrap(), 5);
        assert_eq!(&out[..], &[SeqRun::new(0, 8), SeqRun::new(40, 12)]);

        out.clear();
        assert_eq!(iter.next_runs(2, &mut out).unwrap(), 1);
        assert_eq!(&out[..], &[SeqRun::new(80, 4)]);

        out.clear();
        assert_eq!(iter.next_runs(2, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_element_count_overflow_rejected() {
        let err = RunSelection::new([(0, u64::MAX), (u64::MAX, 1)]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidRequest);
        assert_eq!(RunSelection::new([(0, u64::MAX)]).unwrap().element_count(), u64::MAX);
        assert_eq!(RunSelection::all(0), RunSelection::none());
    }

    #[test]
    fn test_zero_element_size_rejected() {
        assert!(RunSelection::all(4).iter(0).is_err());
    }
}
