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

//! Scalar read/write dispatch

use vfdio_core::telemetry::{self, IoModes};
use vfdio_core::{Addr, FileDriver, MemType, Result, VfdError};

use crate::file::IoFile;

impl<D: FileDriver> IoFile<D> {
    /// Read `buf.len()` bytes at logical address `addr`
    ///
    /// Fails with `AddressOverflow` when the range ends past the tag's EOA,
    /// unless the file is opened as a SWMR reader.
    pub fn read(&mut self, mem_type: MemType, addr: Addr, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() && !self.config.collective {
            return Ok(());
        }
        let absolute = self.scalar_target(mem_type, addr, buf.len(), !self.config.swmr_read)?;

        self.driver
            .read(mem_type, absolute, buf)
            .map_err(|e| VfdError::driver("read", e))?;

        if mem_type.is_raw() {
            telemetry::record_mode(IoModes::SCALAR);
        }
        Ok(())
    }

    /// Write `buf` at logical address `addr`
    pub fn write(&mut self, mem_type: MemType, addr: Addr, buf: &[u8]) -> Result<()> {
        if buf.is_empty() && !self.config.collective {
            return Ok(());
        }
        let absolute = self.scalar_target(mem_type, addr, buf.len(), true)?;

        self.driver
            .write(mem_type, absolute, buf)
            .map_err(|e| VfdError::driver("write", e))?;

        if mem_type.is_raw() {
            telemetry::record_mode(IoModes::SCALAR);
        }
        Ok(())
    }

    /// Absolute address of a scalar request, bounds-checked against the EOA
    fn scalar_target(
        &self,
        mem_type: MemType,
        addr: Addr,
        size: usize,
        check_eoa: bool,
    ) -> Result<Addr> {
        if mem_type.is_sentinel() {
            return Err(VfdError::invalid("scalar request needs an explicit memory type"));
        }
        let eoa = self.absolute_eoa(mem_type)?;
        let absolute = addr
            .checked_add(self.base_addr)
            .ok_or_else(|| VfdError::overflow(addr, size as u64, eoa))?;
        if check_eoa {
            let end = absolute.checked_add(size as u64);
            if end.map_or(true, |end| end > eoa) {
                return Err(VfdError::overflow(addr, size as u64, eoa));
            }
        }
        Ok(absolute)
    }
}
