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

//! Per-file dispatch configuration

use serde::{Deserialize, Serialize};

use crate::scratch::SEQ_LIST_LEN;

/// Configuration carried by an open file handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// File is open for single-writer/multiple-reader reading: reads may
    /// run past a possibly stale EOA, so EOA checks are relaxed
    pub swmr_read: bool,
    /// Transfers may be collective: zero-count and zero-size requests are
    /// still forwarded to the driver instead of short-circuiting
    pub collective: bool,
    /// Runs requested from a selection iterator per refill
    pub seq_list_len: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            swmr_read: false,
            collective: false,
            seq_list_len: SEQ_LIST_LEN,
        }
    }
}

impl IoConfig {
    /// SWMR reader configuration
    pub fn swmr_reader() -> Self {
        Self {
            swmr_read: true,
            ..Default::default()
        }
    }

    /// Configuration for drivers taking part in collective transfers
    pub fn collective() -> Self {
        Self {
            collective: true,
            ..Default::default()
        }
    }

    pub fn with_seq_list_len(mut self, seq_list_len: usize) -> Self {
        self.seq_list_len = seq_list_len.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(IoConfig::swmr_reader().swmr_read);
        assert!(!IoConfig::swmr_reader().collective);
        assert!(IoConfig::collective().collective);
        assert_eq!(IoConfig::default().seq_list_len, SEQ_LIST_LEN);
        assert_eq!(IoConfig::default().with_seq_list_len(0).seq_list_len, 1);
    }

    #[test]
    fn test_partial_deserialize() {
        let cfg: IoConfig = serde_json::from_str(r#"{"swmr_read":true}"#).unwrap();
        assert!(cfg.swmr_read);
        assert_eq!(cfg.seq_list_len, SEQ_LIST_LEN);
    }
}
