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

//! Open file handle
//!
//! An [`IoFile`] owns the backend driver together with the per-file state
//! the dispatch layer consults on every request: the constant base address
//! added to every logical address, the access configuration and the
//! registry of selection tokens shared with the driver.
//!
//! The scalar, vector and selection entry points are implemented on
//! `IoFile` in their own modules.

use std::ops::Deref;
use std::sync::Arc;

use vfdio_core::{
    Addr, DriverCapabilities, FileDriver, IoConfig, MemType, Result, SharedRegistry,
    SpaceRegistry, VfdError, ADDR_UNDEF,
};

/// Format signature probed by [`IoFile::locate_signature`]
pub const FORMAT_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1a, b'\n'];

/// Smallest power of two searched past address 0
const SIGNATURE_MIN_POW: u32 = 9;

/// File handle dispatching I/O onto a driver
pub struct IoFile<D: FileDriver> {
    pub(crate) driver: D,
    pub(crate) base_addr: Addr,
    pub(crate) config: IoConfig,
    pub(crate) registry: SharedRegistry,
}

impl<D: FileDriver> IoFile<D> {
    pub fn new(driver: D, config: IoConfig) -> Self {
        tracing::debug!(
            driver = driver.name(),
            capabilities = ?driver.capabilities(),
            "opening file handle"
        );
        Self {
            driver,
            base_addr: 0,
            config,
            registry: SpaceRegistry::shared(),
        }
    }

    /// Set the base address added to every logical address
    pub fn with_base_addr(mut self, base_addr: Addr) -> Self {
        self.base_addr = base_addr;
        self
    }

    /// Share an existing selection registry
    pub fn with_registry(mut self, registry: SharedRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[inline]
    pub fn base_addr(&self) -> Addr {
        self.base_addr
    }

    #[inline]
    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Capabilities the driver declares, without issuing I/O
    pub fn driver_query(&self) -> DriverCapabilities {
        self.driver.capabilities()
    }

    /// Absolute EOA straight from the driver
    pub(crate) fn absolute_eoa(&self, mem_type: MemType) -> Result<Addr> {
        let eoa = self
            .driver
            .get_eoa(mem_type)
            .map_err(|e| VfdError::driver("get_eoa", e))?;
        if eoa == ADDR_UNDEF {
            return Err(VfdError::driver(
                "get_eoa",
                VfdError::invalid(format!("undefined EOA for {}", mem_type)),
            ));
        }
        Ok(eoa)
    }

    /// EOA relative to the base address
    pub fn get_eoa(&self, mem_type: MemType) -> Result<Addr> {
        Ok(self.absolute_eoa(mem_type)?.saturating_sub(self.base_addr))
    }

    /// Set the EOA from an address relative to the base address
    pub fn set_eoa(&mut self, mem_type: MemType, addr: Addr) -> Result<()> {
        let absolute = addr
            .checked_add(self.base_addr)
            .ok_or_else(|| VfdError::overflow(addr, 0, ADDR_UNDEF))?;
        self.driver
            .set_eoa(mem_type, absolute)
            .map_err(|e| VfdError::driver("set_eoa", e))
    }

    /// EOF relative to the base address
    pub fn get_eof(&self, mem_type: MemType) -> Result<Addr> {
        let eof = self
            .driver
            .get_eof(mem_type)
            .map_err(|e| VfdError::driver("get_eof", e))?;
        Ok(eof.saturating_sub(self.base_addr))
    }

    /// Search for the format signature
    ///
    /// The signature may live at address 0 or at any power of two from 512
    /// up to the size of the file. Each probe raises the superblock EOA to
    /// cover the signature; when nothing is found the original EOA is put
    /// back.
    pub fn locate_signature(&mut self) -> Result<Option<Addr>> {
        let eof = self.get_eof(MemType::Super)?;
        let eoa = self.get_eoa(MemType::Super)?;
        let extent = eof.max(eoa);
        let maxpow = (u64::BITS - extent.leading_zeros()).max(SIGNATURE_MIN_POW);

        let mut probe = [0u8; FORMAT_SIGNATURE.len()];
        for n in 8..maxpow {
            let addr = if n == 8 { 0 } else { 1u64 << n };
            self.set_eoa(MemType::Super, addr + FORMAT_SIGNATURE.len() as u64)?;
            self.read(MemType::Super, addr, &mut probe)?;
            if probe == FORMAT_SIGNATURE {
                tracing::debug!(addr, "format signature found");
                return Ok(Some(addr));
            }
        }

        tracing::debug!(maxpow, "format signature not found");
        self.set_eoa(MemType::Super, eoa)?;
        Ok(None)
    }

    /// Registry handle that outlives borrows of `self`
    pub(crate) fn registry_handle(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }
}

/// Base-address offsetting applied to a caller's address array
///
/// Adds the base address on construction and subtracts it again when
/// dropped, so the caller's array is restored on every exit path.
pub(crate) struct BaseOffset<'a> {
    addrs: &'a mut [Addr],
    base: Addr,
}

impl<'a> BaseOffset<'a> {
    pub(crate) fn apply(addrs: &'a mut [Addr], base: Addr) -> Result<Self> {
        if base != 0 {
            for i in 0..addrs.len() {
                match addrs[i].checked_add(base) {
                    Some(absolute) => addrs[i] = absolute,
                    None => {
                        let addr = addrs[i];
                        for done in &mut addrs[..i] {
                            *done -= base;
                        }
                        return Err(VfdError::overflow(addr, 0, ADDR_UNDEF));
                    }
                }
            }
        }
        Ok(Self { addrs, base })
    }
}

impl Deref for BaseOffset<'_> {
    type Target = [Addr];

    fn deref(&self) -> &[Addr] {
        self.addrs
    }
}

impl Drop for BaseOffset<'_> {
    fn drop(&mut self) {
        if self.base != 0 {
            for addr in self.addrs.iter_mut() {
                *addr -= self.base;
            }
        }
    }
}
