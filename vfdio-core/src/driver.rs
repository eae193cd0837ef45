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

//! Backend file driver abstraction
//!
//! A driver provides the mandatory scalar primitives (`read`, `write`,
//! EOA/EOF queries) and may declare native vector and selection
//! primitives through [`DriverCapabilities`]. The dispatch layer uses the
//! richest shape a driver declares and decomposes everything else.
//!
//! All addresses crossing this trait are absolute: the file's base address
//! has already been added.
//!
//! **Usage:**
//! ```ignore
//! let driver = MemoryDriver::scalar_only();
//! let mut file = IoFile::new(driver, IoConfig::default());
//! file.write(MemType::Draw, 0, &data)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, VfdError};
use crate::selection::{SpaceId, SpaceRegistry};
use crate::types::{Addr, MemType};

/// Optional primitives a driver implements natively
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DriverCapabilities {
    pub vector_read: bool,
    pub vector_write: bool,
    pub selection_read: bool,
    pub selection_write: bool,
}

impl DriverCapabilities {
    /// Only the mandatory scalar primitives
    pub const SCALAR_ONLY: DriverCapabilities = DriverCapabilities {
        vector_read: false,
        vector_write: false,
        selection_read: false,
        selection_write: false,
    };

    /// Scalar plus native vector I/O
    pub const VECTOR: DriverCapabilities = DriverCapabilities {
        vector_read: true,
        vector_write: true,
        selection_read: false,
        selection_write: false,
    };

    /// Every primitive
    pub const FULL: DriverCapabilities = DriverCapabilities {
        vector_read: true,
        vector_write: true,
        selection_read: true,
        selection_write: true,
    };
}

/// Arguments of a native selection call, shared by reads and writes
///
/// `element_sizes` keeps the caller's inherit-previous compression.
#[derive(Debug, Clone, Copy)]
pub struct SelectionArgs<'a> {
    pub mem_type: MemType,
    pub mem_spaces: &'a [SpaceId],
    pub file_spaces: &'a [SpaceId],
    pub offsets: &'a [Addr],
    pub element_sizes: &'a [usize],
}

impl SelectionArgs<'_> {
    #[inline]
    pub fn count(&self) -> usize {
        self.offsets.len()
    }
}

/// Backend file driver
pub trait FileDriver: Send {
    /// Driver name, for diagnostics
    fn name(&self) -> &str;

    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities::SCALAR_ONLY
    }

    /// Absolute end-of-allocation for a memory-type tag
    fn get_eoa(&self, mem_type: MemType) -> Result<Addr>;

    fn set_eoa(&mut self, mem_type: MemType, addr: Addr) -> Result<()>;

    /// Absolute physical end-of-file
    fn get_eof(&self, mem_type: MemType) -> Result<Addr>;

    /// Read `buf.len()` bytes at `addr`
    fn read(&mut self, mem_type: MemType, addr: Addr, buf: &mut [u8]) -> Result<()>;

    /// Write `buf` at `addr`
    fn write(&mut self, mem_type: MemType, addr: Addr, buf: &[u8]) -> Result<()>;

    /// Native vector read; `types` and `sizes` are inherit-compressed
    fn read_vector(
        &mut self,
        _types: &[MemType],
        _addrs: &[Addr],
        _sizes: &[usize],
        _bufs: &mut [&mut [u8]],
    ) -> Result<()> {
        Err(VfdError::unsupported("vector read"))
    }

    /// Native vector write; `types` and `sizes` are inherit-compressed
    fn write_vector(
        &mut self,
        _types: &[MemType],
        _addrs: &[Addr],
        _sizes: &[usize],
        _bufs: &[&[u8]],
    ) -> Result<()> {
        Err(VfdError::unsupported("vector write"))
    }

    /// Native selection read; `bufs` entries of `None` inherit the
    /// previous buffer
    fn read_selection(
        &mut self,
        _registry: &SpaceRegistry,
        _args: SelectionArgs<'_>,
        _bufs: &mut [Option<&mut [u8]>],
    ) -> Result<()> {
        Err(VfdError::unsupported("selection read"))
    }

    /// Native selection write; `bufs` entries of `None` inherit the
    /// previous buffer
    fn write_selection(
        &mut self,
        _registry: &SpaceRegistry,
        _args: SelectionArgs<'_>,
        _bufs: &[Option<&[u8]>],
    ) -> Result<()> {
        Err(VfdError::unsupported("selection write"))
    }
}

impl<D: FileDriver + ?Sized> FileDriver for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn capabilities(&self) -> DriverCapabilities {
        (**self).capabilities()
    }

    fn get_eoa(&self, mem_type: MemType) -> Result<Addr> {
        (**self).get_eoa(mem_type)
    }

    fn set_eoa(&mut self, mem_type: MemType, addr: Addr) -> Result<()> {
        (**self).set_eoa(mem_type, addr)
    }

    fn get_eof(&self, mem_type: MemType) -> Result<Addr> {
        (**self).get_eof(mem_type)
    }

    fn read(&mut self, mem_type: MemType, addr: Addr, buf: &mut [u8]) -> Result<()> {
        (**self).read(mem_type, addr, buf)
    }

    fn write(&mut self, mem_type: MemType, addr: Addr, buf: &[u8]) -> Result<()> {
        (**self).write(mem_type, addr, buf)
    }

    fn read_vector(
        &mut self,
        types: &[MemType],
        addrs: &[Addr],
        sizes: &[usize],
        bufs: &mut [&mut [u8]],
    ) -> Result<()> {
        (**self).read_vector(types, addrs, sizes, bufs)
    }

    fn write_vector(
        &mut self,
        types: &[MemType],
        addrs: &[Addr],
        sizes: &[usize],
        bufs: &[&[u8]],
    ) -> Result<()> {
        (**self).write_vector(types, addrs, sizes, bufs)
    }

    fn read_selection(
        &mut self,
        registry: &SpaceRegistry,
        args: SelectionArgs<'_>,
        bufs: &mut [Option<&mut [u8]>],
    ) -> Result<()> {
        (**self).read_selection(registry, args, bufs)
    }

    fn write_selection(
        &mut self,
        registry: &SpaceRegistry,
        args: SelectionArgs<'_>,
        bufs: &[Option<&[u8]>],
    ) -> Result<()> {
        (**self).write_selection(registry, args, bufs)
    }
}
