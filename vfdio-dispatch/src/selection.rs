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

//! Selection read/write dispatch
//!
//! A selection request carries `count` triples of memory selection, file
//! selection and file offset, plus per-request element sizes and buffers
//! (both using the inherit-previous compression). Selections arrive as
//! [`SpaceRef`]s, either the objects themselves or registry tokens.
//!
//! Dispatch order:
//! 1. native selection primitive, unless skipped
//! 2. translation into one batched vector call, unless skipped
//! 3. translation into scalar calls

use parking_lot::{RwLock, RwLockWriteGuard};
use smallvec::SmallVec;
use std::sync::Arc;

use vfdio_core::telemetry::{self, IoModes};
use vfdio_core::{
    Addr, FileDriver, MemType, Result, RunList, SelectionArgs, Selection, SpaceId, SpaceRef,
    SpaceRegistry, VfdError, LOCAL_SEL_ARR_LEN,
};

use crate::file::{BaseOffset, IoFile};
use crate::translate::{self, SelectionBatch};

/// Driver primitives a selection request must not use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCallbacks {
    pub selection: bool,
    pub vector: bool,
}

impl SkipCallbacks {
    pub const NONE: SkipCallbacks = SkipCallbacks {
        selection: false,
        vector: false,
    };

    /// Translate even when the driver has native selection I/O
    pub const SELECTION: SkipCallbacks = SkipCallbacks {
        selection: true,
        vector: false,
    };

    /// Decompose all the way down to scalar calls
    pub const SELECTION_AND_VECTOR: SkipCallbacks = SkipCallbacks {
        selection: true,
        vector: true,
    };
}

type ResolvedSpaces = SmallVec<[Arc<dyn Selection>; LOCAL_SEL_ARR_LEN]>;

impl<D: FileDriver> IoFile<D> {
    /// Read selections into `bufs`; a `None` buffer reuses the previous one
    pub fn read_selection(
        &mut self,
        mem_type: MemType,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
        offsets: &mut [Addr],
        element_sizes: &[usize],
        bufs: &mut [Option<&mut [u8]>],
    ) -> Result<()> {
        self.read_selection_with(
            SkipCallbacks::NONE,
            mem_type,
            mem_spaces,
            file_spaces,
            offsets,
            element_sizes,
            bufs,
        )
    }

    /// Read selections, translating to a vector request where possible
    pub fn read_vector_from_selection(
        &mut self,
        mem_type: MemType,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
        offsets: &mut [Addr],
        element_sizes: &[usize],
        bufs: &mut [Option<&mut [u8]>],
    ) -> Result<()> {
        self.read_selection_with(
            SkipCallbacks::SELECTION,
            mem_type,
            mem_spaces,
            file_spaces,
            offsets,
            element_sizes,
            bufs,
        )
    }

    /// Read selections through scalar driver calls only
    pub fn read_from_selection(
        &mut self,
        mem_type: MemType,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
        offsets: &mut [Addr],
        element_sizes: &[usize],
        bufs: &mut [Option<&mut [u8]>],
    ) -> Result<()> {
        self.read_selection_with(
            SkipCallbacks::SELECTION_AND_VECTOR,
            mem_type,
            mem_spaces,
            file_spaces,
            offsets,
            element_sizes,
            bufs,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn read_selection_with(
        &mut self,
        skip: SkipCallbacks,
        mem_type: MemType,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
        offsets: &mut [Addr],
        element_sizes: &[usize],
        bufs: &mut [Option<&mut [u8]>],
    ) -> Result<()> {
        let count = offsets.len();
        check_lengths(mem_spaces, file_spaces, count, element_sizes.len(), bufs.len())?;
        if count == 0 && !self.config.collective {
            return Ok(());
        }
        let sizes = RunList::decode(element_sizes)?;
        let sources = RunList::sources(count, |i| bufs[i].is_some())?;

        let base = self.base_addr;
        let offsets = BaseOffset::apply(offsets, base)?;
        if !self.config.swmr_read {
            self.check_offsets(mem_type, &offsets)?;
        }

        if self.driver.capabilities().selection_read && !skip.selection {
            let registry = self.registry_handle();
            let mut scope = TokenScope::new(&registry);
            let mem_ids = scope.tokens_for(mem_spaces)?;
            let file_ids = scope.tokens_for(file_spaces)?;
            let args = SelectionArgs {
                mem_type,
                mem_spaces: &mem_ids,
                file_spaces: &file_ids,
                offsets: &offsets,
                element_sizes,
            };
            self.driver
                .read_selection(scope.registry(), args, bufs)
                .map_err(|e| VfdError::driver("read_selection", e))?;
            if mem_type.is_raw() {
                telemetry::record_mode(IoModes::SELECTION);
            }
            return Ok(());
        }

        let (mem, file) = self.resolve_spaces(mem_spaces, file_spaces)?;
        let batch = SelectionBatch {
            mem_spaces: &mem,
            file_spaces: &file,
            offsets: &offsets,
            element_sizes: &sizes,
            buf_sources: &sources,
        };
        translate::read_translated(
            &mut self.driver,
            self.config.seq_list_len,
            mem_type,
            &batch,
            bufs,
            skip.vector,
        )
    }

    /// Write selections from `bufs`; a `None` buffer reuses the previous one
    pub fn write_selection(
        &mut self,
        mem_type: MemType,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
        offsets: &mut [Addr],
        element_sizes: &[usize],
        bufs: &[Option<&[u8]>],
    ) -> Result<()> {
        self.write_selection_with(
            SkipCallbacks::NONE,
            mem_type,
            mem_spaces,
            file_spaces,
            offsets,
            element_sizes,
            bufs,
        )
    }

    pub fn write_vector_from_selection(
        &mut self,
        mem_type: MemType,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
        offsets: &mut [Addr],
        element_sizes: &[usize],
        bufs: &[Option<&[u8]>],
    ) -> Result<()> {
        self.write_selection_with(
            SkipCallbacks::SELECTION,
            mem_type,
            mem_spaces,
            file_spaces,
            offsets,
            element_sizes,
            bufs,
        )
    }

    pub fn write_from_selection(
        &mut self,
        mem_type: MemType,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
        offsets: &mut [Addr],
        element_sizes: &[usize],
        bufs: &[Option<&[u8]>],
    ) -> Result<()> {
        self.write_selection_with(
            SkipCallbacks::SELECTION_AND_VECTOR,
            mem_type,
            mem_spaces,
            file_spaces,
            offsets,
            element_sizes,
            bufs,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_selection_with(
        &mut self,
        skip: SkipCallbacks,
        mem_type: MemType,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
        offsets: &mut [Addr],
        element_sizes: &[usize],
        bufs: &[Option<&[u8]>],
    ) -> Result<()> {
        let count = offsets.len();
        check_lengths(mem_spaces, file_spaces, count, element_sizes.len(), bufs.len())?;
        if count == 0 && !self.config.collective {
            return Ok(());
        }
        let sizes = RunList::decode(element_sizes)?;
        let sources = RunList::sources(count, |i| bufs[i].is_some())?;

        let base = self.base_addr;
        let offsets = BaseOffset::apply(offsets, base)?;
        self.check_offsets(mem_type, &offsets)?;

        if self.driver.capabilities().selection_write && !skip.selection {
            let registry = self.registry_handle();
            let mut scope = TokenScope::new(&registry);
            let mem_ids = scope.tokens_for(mem_spaces)?;
            let file_ids = scope.tokens_for(file_spaces)?;
            let args = SelectionArgs {
                mem_type,
                mem_spaces: &mem_ids,
                file_spaces: &file_ids,
                offsets: &offsets,
                element_sizes,
            };
            self.driver
                .write_selection(scope.registry(), args, bufs)
                .map_err(|e| VfdError::driver("write_selection", e))?;
            if mem_type.is_raw() {
                telemetry::record_mode(IoModes::SELECTION);
            }
            return Ok(());
        }

        let (mem, file) = self.resolve_spaces(mem_spaces, file_spaces)?;
        let batch = SelectionBatch {
            mem_spaces: &mem,
            file_spaces: &file,
            offsets: &offsets,
            element_sizes: &sizes,
            buf_sources: &sources,
        };
        translate::write_translated(
            &mut self.driver,
            self.config.seq_list_len,
            mem_type,
            &batch,
            bufs,
            skip.vector,
        )
    }

    /// Every selection offset must lie within the EOA
    fn check_offsets(&self, mem_type: MemType, offsets: &[Addr]) -> Result<()> {
        if offsets.is_empty() {
            return Ok(());
        }
        let eoa = self.absolute_eoa(mem_type)?;
        match offsets.iter().find(|&&offset| offset > eoa) {
            Some(&offset) => Err(VfdError::overflow(offset - self.base_addr, 0, eoa)),
            None => Ok(()),
        }
    }

    fn resolve_spaces(
        &self,
        mem_spaces: &[SpaceRef],
        file_spaces: &[SpaceRef],
    ) -> Result<(ResolvedSpaces, ResolvedSpaces)> {
        let registry = self.registry.read();
        let resolve = |spaces: &[SpaceRef]| -> Result<ResolvedSpaces> {
            spaces.iter().map(|s| s.resolve(&registry)).collect()
        };
        Ok((resolve(mem_spaces)?, resolve(file_spaces)?))
    }
}

fn check_lengths(
    mem_spaces: &[SpaceRef],
    file_spaces: &[SpaceRef],
    count: usize,
    element_sizes: usize,
    bufs: usize,
) -> Result<()> {
    if mem_spaces.len() != count
        || file_spaces.len() != count
        || element_sizes != count
        || bufs != count
    {
        return Err(VfdError::invalid(format!(
            "selection arrays disagree: {} memory spaces, {} file spaces, {} offsets, \
             {} element sizes, {} buffers",
            mem_spaces.len(),
            file_spaces.len(),
            count,
            element_sizes,
            bufs
        )));
    }
    Ok(())
}

/// Tokens handed to a native selection call
///
/// Directly given selections are registered for the duration of the call
/// and unregistered when the scope drops. The registry stays write-locked
/// meanwhile, so drivers must not lock it themselves.
struct TokenScope<'r> {
    registry: RwLockWriteGuard<'r, SpaceRegistry>,
    temporary: SmallVec<[SpaceId; LOCAL_SEL_ARR_LEN]>,
}

impl<'r> TokenScope<'r> {
    fn new(registry: &'r RwLock<SpaceRegistry>) -> Self {
        Self {
            registry: registry.write(),
            temporary: SmallVec::new(),
        }
    }

    fn tokens_for(
        &mut self,
        spaces: &[SpaceRef],
    ) -> Result<SmallVec<[SpaceId; LOCAL_SEL_ARR_LEN]>> {
        let mut ids = SmallVec::with_capacity(spaces.len());
        for space in spaces {
            let id = match space {
                SpaceRef::Token(id) => {
                    self.registry.resolve(*id)?;
                    *id
                }
                SpaceRef::Direct(selection) => {
                    let id = self.registry.register(Arc::clone(selection));
                    self.temporary.push(id);
                    id
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    fn registry(&self) -> &SpaceRegistry {
        &self.registry
    }
}

impl Drop for TokenScope<'_> {
    fn drop(&mut self) {
        for id in self.temporary.drain(..) {
            self.registry.remove(id);
        }
    }
}
