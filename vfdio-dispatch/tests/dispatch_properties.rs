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

//! Property tests for the dispatch paths
//!
//! Every request is run through drivers with different native primitives;
//! the decomposed paths must be indistinguishable from the native ones.

use proptest::prelude::*;
use vfdio_dispatch::{
    sort_order, sort_vector_io_req, DriverCall, ErrorKind, IoConfig, IoFile, MemType,
    MemoryDriver, RunSelection, SpaceRef, VfdError,
};

const EOA: u64 = 1 << 20;

fn open(driver: MemoryDriver) -> IoFile<MemoryDriver> {
    IoFile::new(driver.with_eoa(EOA), IoConfig::default())
}

/// A vector request over non-overlapping ranges, in compressed form
#[derive(Debug, Clone)]
struct VectorCase {
    types: Vec<MemType>,
    addrs: Vec<u64>,
    sizes: Vec<usize>,
    payloads: Vec<Vec<u8>>,
}

fn vector_case() -> impl Strategy<Value = VectorCase> {
    proptest::collection::vec(
        (
            0u64..64,
            1usize..48,
            proptest::sample::select(vec![MemType::Draw, MemType::Ohdr, MemType::BTree]),
            any::<bool>(),
            any::<u8>(),
        ),
        1..24,
    )
    .prop_map(|entries| {
        let mut case = VectorCase {
            types: Vec::new(),
            addrs: Vec::new(),
            sizes: Vec::new(),
            payloads: Vec::new(),
        };
        let mut next = 0u64;
        for (i, (gap, size, mem_type, compress, fill)) in entries.into_iter().enumerate() {
            let addr = next + gap;
            next = addr + size as u64;
            let prev_type = i.checked_sub(1).map(|p| case.types_resolved(p));
            let prev_size = i.checked_sub(1).map(|p| case.sizes_resolved(p));
            case.types.push(if compress && prev_type == Some(mem_type) {
                MemType::NoList
            } else {
                mem_type
            });
            case.sizes.push(if compress && prev_size == Some(size) { 0 } else { size });
            case.addrs.push(addr);
            case.payloads.push(vec![fill; size]);
        }
        case
    })
}

impl VectorCase {
    fn types_resolved(&self, i: usize) -> MemType {
        self.types[..=i]
            .iter()
            .rev()
            .copied()
            .find(|t| *t != MemType::NoList)
            .unwrap()
    }

    fn sizes_resolved(&self, i: usize) -> usize {
        self.sizes[..=i].iter().rev().copied().find(|s| *s != 0).unwrap()
    }

    fn bufs(&self) -> Vec<&[u8]> {
        self.payloads.iter().map(|p| p.as_slice()).collect()
    }
}

/// Cover `total` elements by cycling through `(gap, len)` run shapes
fn runs_covering(total: u64, pattern: &[(u64, u64)]) -> RunSelection {
    let mut runs = Vec::new();
    let mut pos = 0;
    let mut left = total;
    for &(gap, len) in pattern.iter().cycle() {
        if left == 0 {
            break;
        }
        let len = len.min(left);
        pos += gap;
        runs.push((pos, len));
        pos += len;
        left -= len;
    }
    RunSelection::new(runs).unwrap()
}

fn run_pattern() -> impl Strategy<Value = Vec<(u64, u64)>> {
    proptest::collection::vec((0u64..4, 1u64..6), 1..6)
}

fn extent(sel: &RunSelection) -> u64 {
    sel.runs().iter().map(|(start, len)| start + len).max().unwrap_or(0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Scalar fallback writes exactly what the native vector primitive reads back
    #[test]
    fn prop_vector_fallback_matches_native(case in vector_case()) {
        let mut fallback = open(MemoryDriver::scalar_only());
        let mut native = open(MemoryDriver::with_vector());
        let mut addrs = case.addrs.clone();

        fallback.write_vector(&case.types, &mut addrs, &case.sizes, &case.bufs()).unwrap();
        native.write_vector(&case.types, &mut addrs, &case.sizes, &case.bufs()).unwrap();
        prop_assert_eq!(fallback.driver().contents(), native.driver().contents());
        prop_assert_eq!(fallback.driver().calls().len(), case.addrs.len());

        let mut reader = open(MemoryDriver::with_vector());
        reader.driver_mut().load(0, fallback.driver().contents());
        let mut out: Vec<Vec<u8>> = case.payloads.iter().map(|p| vec![0u8; p.len()]).collect();
        let mut views: Vec<&mut [u8]> = out.iter_mut().map(|o| o.as_mut_slice()).collect();
        reader.read_vector(&case.types, &mut addrs, &case.sizes, &mut views).unwrap();
        prop_assert_eq!(&out, &case.payloads);
        prop_assert_eq!(addrs, case.addrs.clone());
    }

    /// Scalar and vector translation issue the same segments and store the
    /// same bytes as the native selection primitive
    #[test]
    fn prop_selection_translation_paths_agree(
        total in 0u64..40,
        element_size in 1usize..5,
        file_pattern in run_pattern(),
        mem_pattern in run_pattern(),
        offset in 0u64..256,
    ) {
        let file_sel = runs_covering(total, &file_pattern);
        let mem_sel = runs_covering(total, &mem_pattern);
        let buf_len = extent(&mem_sel) as usize * element_size;
        let data: Vec<u8> = (0..buf_len).map(|i| (i % 251) as u8 + 1).collect();
        let mem = [SpaceRef::direct(mem_sel)];
        let file = [SpaceRef::direct(file_sel)];

        let mut stores = Vec::new();
        let mut segment_sets = Vec::new();
        for driver in [MemoryDriver::scalar_only(), MemoryDriver::with_vector(), MemoryDriver::full()] {
            let mut f = open(driver);
            f.write_selection(
                MemType::Draw,
                &mem,
                &file,
                &mut [offset],
                &[element_size],
                &[Some(&data[..])],
            ).unwrap();

            let mut segments: Vec<(u64, usize)> = Vec::new();
            for call in f.driver().calls() {
                match call {
                    DriverCall::Write { addr, size, .. } => segments.push((*addr, *size)),
                    DriverCall::WriteVector { addrs, sizes, .. } => {
                        segments.extend(addrs.iter().copied().zip(sizes.iter().copied()));
                    }
                    _ => {}
                }
            }
            segments.sort_unstable();
            segment_sets.push(segments);
            stores.push(f.into_driver().contents().to_vec());
        }

        // scalar and vector translation produce identical segments
        prop_assert_eq!(&segment_sets[0], &segment_sets[1]);
        let covered: usize = segment_sets[0].iter().map(|(_, len)| len).sum();
        prop_assert_eq!(covered as u64, total * element_size as u64);
        for pair in segment_sets[0].windows(2) {
            prop_assert!(pair[0].0 + pair[0].1 as u64 <= pair[1].0);
        }

        prop_assert_eq!(&stores[0], &stores[1]);
        prop_assert_eq!(&stores[0], &stores[2]);
    }

    /// Reads through every path land the same bytes in the same buffer slots
    #[test]
    fn prop_selection_read_paths_agree(
        total in 1u64..40,
        element_size in 1usize..4,
        file_pattern in run_pattern(),
        mem_pattern in run_pattern(),
    ) {
        let file_sel = runs_covering(total, &file_pattern);
        let mem_sel = runs_covering(total, &mem_pattern);
        let buf_len = extent(&mem_sel) as usize * element_size;
        let stored: Vec<u8> = (0..512).map(|i| (i % 253) as u8).collect();
        let mem = [SpaceRef::direct(mem_sel)];
        let file = [SpaceRef::direct(file_sel)];

        let mut outputs = Vec::new();
        for driver in [
            MemoryDriver::scalar_only(),
            MemoryDriver::with_vector(),
            MemoryDriver::with_selection(),
        ] {
            let mut f = open(driver);
            f.driver_mut().load(0, &stored);
            let mut out = vec![0xeeu8; buf_len];
            f.read_selection(
                MemType::Draw,
                &mem,
                &file,
                &mut [32],
                &[element_size],
                &mut [Some(&mut out[..])],
            ).unwrap();
            outputs.push(out);
        }
        prop_assert_eq!(&outputs[0], &outputs[1]);
        prop_assert_eq!(&outputs[0], &outputs[2]);
    }

    /// Re-sorted requests keep every resolved field attached to its address
    #[test]
    fn prop_sorted_vector_keeps_fields(case in vector_case(), seed in any::<u64>()) {
        // scramble the request with a seeded rotation plus reversal
        let n = case.addrs.len();
        let rot = (seed as usize) % n;
        let mut idx: Vec<usize> = (0..n).collect();
        idx.rotate_left(rot);
        if seed & 1 == 1 {
            idx.reverse();
        }
        let types: Vec<MemType> = idx.iter().map(|&i| case.types_resolved(i)).collect();
        let addrs: Vec<u64> = idx.iter().map(|&i| case.addrs[i]).collect();
        let sizes: Vec<usize> = idx.iter().map(|&i| case.sizes_resolved(i)).collect();
        let bufs: Vec<usize> = idx.clone();

        let sorted = sort_vector_io_req(&types, &addrs, &sizes, &bufs).unwrap();
        prop_assert!(sorted.addrs.windows(2).all(|w| w[0] < w[1]));
        for k in 0..n {
            let original = sorted.bufs[k];
            prop_assert_eq!(sorted.addrs[k], case.addrs[original]);
            prop_assert_eq!(sorted.types[k], case.types_resolved(original));
            prop_assert_eq!(sorted.sizes[k], case.sizes_resolved(original));
        }
    }

    /// A repeated address is always caught, sorted or not
    #[test]
    fn prop_duplicate_detected_in_any_order(
        addrs in proptest::collection::hash_set(0u64..10_000, 1..32)
            .prop_map(|set| {
                let mut v: Vec<u64> = set.into_iter().collect();
                v.push(v[0]);
                v
            })
            .prop_shuffle()
    ) {
        let err = sort_order(&addrs).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::DuplicateAddress);

        let mut sorted = addrs.clone();
        sorted.sort_unstable();
        let err = sort_order(&sorted).unwrap_err();
        let is_duplicate = matches!(err, VfdError::DuplicateAddress { .. });
        prop_assert!(is_duplicate);
    }
}
