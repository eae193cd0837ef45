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

//! Address-ordered I/O requests
//!
//! Drivers that coalesce or stream requests want them in increasing
//! address order. Sorting is a no-op for the common already-sorted case:
//! the caller's arrays are returned borrowed. Otherwise new arrays are
//! built in address order, with the inherit-previous compression resolved
//! so every entry is explicit.
//!
//! Two requests may never target the same address; that is reported as
//! [`VfdError::DuplicateAddress`] whether or not sorting was needed.

use std::borrow::Cow;

use vfdio_core::{Addr, MemType, Result, RunList, VfdError};

/// Permutation putting `addrs` in increasing order
///
/// `None` when `addrs` is already strictly increasing.
pub fn sort_order(addrs: &[Addr]) -> Result<Option<Vec<usize>>> {
    let mut sorted = true;
    for pair in addrs.windows(2) {
        if pair[0] == pair[1] {
            return Err(duplicate(pair[0]));
        }
        if pair[0] > pair[1] {
            sorted = false;
            break;
        }
    }
    if sorted {
        return Ok(None);
    }

    let mut keyed = try_vec(addrs.len())?;
    keyed.extend(addrs.iter().enumerate().map(|(i, &addr)| (addr, i)));
    keyed.sort_unstable();
    if let Some(pair) = keyed.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(duplicate(pair[0].0));
    }
    Ok(Some(keyed.into_iter().map(|(_, i)| i).collect()))
}

/// Permute owned `items` into the order given by a permutation
///
/// Takes the items by value so non-`Clone` values such as mutable read
/// buffers can be reordered.
pub fn apply_order<T>(items: Vec<T>, order: &[usize]) -> Result<Vec<T>> {
    if items.len() != order.len() {
        return Err(VfdError::invalid(format!(
            "permutation of {} entries applied to {} items",
            order.len(),
            items.len()
        )));
    }
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut out = try_vec(order.len())?;
    for &i in order {
        let item = slots
            .get_mut(i)
            .and_then(Option::take)
            .ok_or_else(|| VfdError::invalid(format!("permutation index {} invalid", i)))?;
        out.push(item);
    }
    Ok(out)
}

/// A vector request in increasing address order
#[derive(Debug, Clone)]
pub struct SortedVectorRequest<'a, B: Clone> {
    pub types: Cow<'a, [MemType]>,
    pub addrs: Cow<'a, [Addr]>,
    pub sizes: Cow<'a, [usize]>,
    pub bufs: Cow<'a, [B]>,
}

impl<B: Clone> SortedVectorRequest<'_, B> {
    /// The input was already sorted and is returned as is
    pub fn was_sorted(&self) -> bool {
        matches!(self.addrs, Cow::Borrowed(_))
    }
}

/// Sort a vector request by address
pub fn sort_vector_io_req<'a, B: Clone>(
    types: &'a [MemType],
    addrs: &'a [Addr],
    sizes: &'a [usize],
    bufs: &'a [B],
) -> Result<SortedVectorRequest<'a, B>> {
    if types.len() != addrs.len() || sizes.len() != addrs.len() || bufs.len() != addrs.len() {
        return Err(VfdError::invalid("vector arrays disagree in length"));
    }

    match sort_order(addrs)? {
        None => Ok(SortedVectorRequest {
            types: Cow::Borrowed(types),
            addrs: Cow::Borrowed(addrs),
            sizes: Cow::Borrowed(sizes),
            bufs: Cow::Borrowed(bufs),
        }),
        Some(order) => {
            let types = RunList::decode(types)?.to_vec();
            let sizes = RunList::decode(sizes)?.to_vec();
            tracing::trace!(count = addrs.len(), "vector request re-sorted");
            Ok(SortedVectorRequest {
                types: Cow::Owned(apply_order(types, &order)?),
                addrs: Cow::Owned(apply_order(addrs.to_vec(), &order)?),
                sizes: Cow::Owned(apply_order(sizes, &order)?),
                bufs: Cow::Owned(apply_order(bufs.to_vec(), &order)?),
            })
        }
    }
}

/// A selection request in increasing offset order
#[derive(Debug, Clone)]
pub struct SortedSelectionRequest<'a, S: Clone, B: Clone> {
    pub mem_spaces: Cow<'a, [S]>,
    pub file_spaces: Cow<'a, [S]>,
    pub offsets: Cow<'a, [Addr]>,
    pub element_sizes: Cow<'a, [usize]>,
    pub bufs: Cow<'a, [Option<B>]>,
}

impl<S: Clone, B: Clone> SortedSelectionRequest<'_, S, B> {
    pub fn was_sorted(&self) -> bool {
        matches!(self.offsets, Cow::Borrowed(_))
    }
}

/// Sort a selection request by file offset
///
/// When re-sorted, inherited buffers are resolved: every entry of the
/// output `bufs` is `Some`.
pub fn sort_selection_io_req<'a, S: Clone, B: Clone>(
    mem_spaces: &'a [S],
    file_spaces: &'a [S],
    offsets: &'a [Addr],
    element_sizes: &'a [usize],
    bufs: &'a [Option<B>],
) -> Result<SortedSelectionRequest<'a, S, B>> {
    let count = offsets.len();
    if mem_spaces.len() != count
        || file_spaces.len() != count
        || element_sizes.len() != count
        || bufs.len() != count
    {
        return Err(VfdError::invalid("selection arrays disagree in length"));
    }

    match sort_order(offsets)? {
        None => Ok(SortedSelectionRequest {
            mem_spaces: Cow::Borrowed(mem_spaces),
            file_spaces: Cow::Borrowed(file_spaces),
            offsets: Cow::Borrowed(offsets),
            element_sizes: Cow::Borrowed(element_sizes),
            bufs: Cow::Borrowed(bufs),
        }),
        Some(order) => {
            let sizes = RunList::decode(element_sizes)?.to_vec();
            let sources = RunList::sources(count, |i| bufs[i].is_some())?;
            let resolved: Vec<Option<B>> = sources.iter().map(|src| bufs[src].clone()).collect();
            Ok(SortedSelectionRequest {
                mem_spaces: Cow::Owned(apply_order(mem_spaces.to_vec(), &order)?),
                file_spaces: Cow::Owned(apply_order(file_spaces.to_vec(), &order)?),
                offsets: Cow::Owned(apply_order(offsets.to_vec(), &order)?),
                element_sizes: Cow::Owned(apply_order(sizes, &order)?),
                bufs: Cow::Owned(apply_order(resolved, &order)?),
            })
        }
    }
}

fn try_vec<T>(capacity: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(capacity)
        .map_err(|e| VfdError::alloc(format!("sort scratch of {}: {}", capacity, e)))?;
    Ok(v)
}

fn duplicate(addr: Addr) -> VfdError {
    tracing::debug!(addr, "duplicate address in I/O request");
    VfdError::DuplicateAddress { addr }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vfdio_core::ErrorKind;

    #[test]
    fn test_sorted_input_is_borrowed() {
        let types = [MemType::Draw, MemType::NoList];
        let addrs = [0, 10];
        let sizes = [4, 0];
        let bufs = ["a", "b"];
        let req = sort_vector_io_req(&types, &addrs, &sizes, &bufs).unwrap();
        assert!(req.was_sorted());
        assert!(std::ptr::eq(req.addrs.as_ref(), &addrs[..]));
        assert_eq!(req.sizes.as_ref(), &[4, 0]);
    }

    #[test]
    fn test_unsorted_input_is_resolved() {
        let types = [MemType::Ohdr, MemType::NoList, MemType::Draw];
        let addrs = [30, 10, 20];
        let sizes = [8, 0, 4];
        let bufs = ["x", "y", "z"];
        let req = sort_vector_io_req(&types, &addrs, &sizes, &bufs).unwrap();
        assert!(!req.was_sorted());
        assert_eq!(req.addrs.as_ref(), &[10, 20, 30]);
        assert_eq!(
            req.types.as_ref(),
            &[MemType::Ohdr, MemType::Draw, MemType::Ohdr]
        );
        assert_eq!(req.sizes.as_ref(), &[8, 4, 8]);
        assert_eq!(req.bufs.as_ref(), &["y", "z", "x"]);
    }

    #[test]
    fn test_duplicates_rejected() {
        let err = sort_order(&[0, 10, 10, 20]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateAddress);
        let err = sort_order(&[20, 10, 5, 10]).unwrap_err();
        assert!(matches!(err, VfdError::DuplicateAddress { addr: 10 }));
    }

    #[test]
    fn test_selection_sort_resolves_buffers() {
        let mem = ["m0", "m1", "m2"];
        let file = ["f0", "f1", "f2"];
        let offsets = [200, 100, 0];
        let sizes = [4, 0, 2];
        let bufs = [Some('a'), None, Some('c')];
        let req = sort_selection_io_req(&mem, &file, &offsets, &sizes, &bufs).unwrap();
        assert!(!req.was_sorted());
        assert_eq!(req.offsets.as_ref(), &[0, 100, 200]);
        assert_eq!(req.element_sizes.as_ref(), &[2, 4, 4]);
        assert_eq!(req.bufs.as_ref(), &[Some('c'), Some('a'), Some('a')]);
        assert_eq!(req.file_spaces.as_ref(), &["f2", "f1", "f0"]);
    }

    #[test]
    fn test_apply_order_moves_mutable_buffers() {
        let mut a = [0u8; 2];
        let mut b = [0u8; 2];
        let addrs = [64, 8];
        let order = sort_order(&addrs).unwrap().unwrap();
        let mut bufs = apply_order(vec![&mut a[..], &mut b[..]], &order).unwrap();
        bufs[0].fill(1);
        bufs[1].fill(2);
        drop(bufs);
        assert_eq!((a, b), ([2, 2], [1, 1]));

        assert!(apply_order(vec![1, 2], &[0, 0]).is_err());
        assert!(apply_order(vec![1, 2], &[0]).is_err());
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(sort_order(&[]).unwrap(), None);
        assert_eq!(sort_order(&[42]).unwrap(), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_sort_is_a_permutation(addrs in proptest::collection::hash_set(0u64..10_000, 0..64)) {
            let addrs: Vec<u64> = addrs.into_iter().collect();
            let ordered = match sort_order(&addrs).unwrap() {
                Some(order) => apply_order(addrs.clone(), &order).unwrap(),
                None => addrs.clone(),
            };
            prop_assert!(ordered.windows(2).all(|w| w[0] < w[1]));
            let mut expected = addrs.clone();
            expected.sort_unstable();
            prop_assert_eq!(ordered, expected);
        }
    }
}
