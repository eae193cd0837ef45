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

//! Addresses and memory-type tags
//!
//! Every logical address handed to the dispatch layer belongs to one of the
//! allocation pools enumerated by [`MemType`]. The EOA high-water mark is
//! tracked per tag by the driver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File address (relative to the file's base address unless noted otherwise)
pub type Addr = u64;

/// Undefined address
pub const ADDR_UNDEF: Addr = u64::MAX;

/// Number of real memory-type tags (excluding the inherit sentinel)
pub const NUM_MEM_TYPES: usize = 7;

/// Memory-type tag partitioning the address space into allocation pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemType {
    /// Sentinel: same tag as the previous array entry
    NoList,
    Default,
    Super,
    BTree,
    /// Raw user data
    Draw,
    GHeap,
    LHeap,
    Ohdr,
}

impl MemType {
    /// All real tags, in table order
    pub const ALL: [MemType; NUM_MEM_TYPES] = [
        MemType::Default,
        MemType::Super,
        MemType::BTree,
        MemType::Draw,
        MemType::GHeap,
        MemType::LHeap,
        MemType::Ohdr,
    ];

    /// Index into per-tag tables; `None` for the sentinel
    #[inline]
    pub fn index(self) -> Option<usize> {
        match self {
            MemType::NoList => None,
            MemType::Default => Some(0),
            MemType::Super => Some(1),
            MemType::BTree => Some(2),
            MemType::Draw => Some(3),
            MemType::GHeap => Some(4),
            MemType::LHeap => Some(5),
            MemType::Ohdr => Some(6),
        }
    }

    #[inline]
    pub fn is_raw(self) -> bool {
        self == MemType::Draw
    }

    #[inline]
    pub fn is_sentinel(self) -> bool {
        self == MemType::NoList
    }
}

impl fmt::Display for MemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemType::NoList => "nolist",
            MemType::Default => "default",
            MemType::Super => "super",
            MemType::BTree => "btree",
            MemType::Draw => "draw",
            MemType::GHeap => "gheap",
            MemType::LHeap => "lheap",
            MemType::Ohdr => "ohdr",
        };
        f.write_str(name)
    }
}
