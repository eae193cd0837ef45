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

//! Vector read/write dispatch
//!
//! A vector request is `count` independent `(type, addr, size, buf)`
//! transfers. `types` and `sizes` may use the inherit-previous compression;
//! they are decoded once into run lists and walked as resolved sequences.
//!
//! Drivers with a native vector primitive receive the request unchanged
//! (compressed arrays included, addresses made absolute). Everything else
//! is decomposed into scalar driver calls in request order.

use vfdio_core::telemetry::{self, IoModes, NoSelectionCause};
use vfdio_core::{Addr, FileDriver, MemType, Result, RunList, VfdError};

use crate::file::{BaseOffset, IoFile};

/// Resolved view of a vector request
struct VectorPlan {
    types: RunList<MemType>,
    sizes: RunList<usize>,
    is_raw: bool,
}

impl<D: FileDriver> IoFile<D> {
    /// Read `count` independent ranges
    ///
    /// `addrs` is offset by the base address for the duration of the call
    /// and restored before returning, on success and failure alike.
    pub fn read_vector(
        &mut self,
        types: &[MemType],
        addrs: &mut [Addr],
        sizes: &[usize],
        bufs: &mut [&mut [u8]],
    ) -> Result<()> {
        check_lengths(types.len(), addrs.len(), sizes.len(), bufs.len())?;
        if addrs.is_empty() && !self.config.collective {
            return Ok(());
        }

        let base = self.base_addr;
        let addrs = BaseOffset::apply(addrs, base)?;
        let plan = self.plan_vector(types, &addrs, sizes, !self.config.swmr_read)?;
        check_buffers(&plan.sizes, bufs.iter().map(|b| b.len()))?;

        if self.driver.capabilities().vector_read {
            self.driver
                .read_vector(types, &addrs, sizes, bufs)
                .map_err(|e| VfdError::driver("read_vector", e))?;
            if plan.is_raw {
                telemetry::record_mode(IoModes::VECTOR);
            }
        } else {
            let requests = plan.types.iter().zip(plan.sizes.iter()).zip(addrs.iter());
            for (((mem_type, size), &addr), buf) in requests.zip(bufs.iter_mut()) {
                self.driver
                    .read(mem_type, addr, &mut buf[..size])
                    .map_err(|e| VfdError::driver("read", e))?;
            }
            record_scalar_fallback(plan.is_raw);
        }
        Ok(())
    }

    /// Write `count` independent ranges
    pub fn write_vector(
        &mut self,
        types: &[MemType],
        addrs: &mut [Addr],
        sizes: &[usize],
        bufs: &[&[u8]],
    ) -> Result<()> {
        check_lengths(types.len(), addrs.len(), sizes.len(), bufs.len())?;
        if addrs.is_empty() && !self.config.collective {
            return Ok(());
        }

        let base = self.base_addr;
        let addrs = BaseOffset::apply(addrs, base)?;
        let plan = self.plan_vector(types, &addrs, sizes, true)?;
        check_buffers(&plan.sizes, bufs.iter().map(|b| b.len()))?;

        if self.driver.capabilities().vector_write {
            self.driver
                .write_vector(types, &addrs, sizes, bufs)
                .map_err(|e| VfdError::driver("write_vector", e))?;
            if plan.is_raw {
                telemetry::record_mode(IoModes::VECTOR);
            }
        } else {
            let requests = plan.types.iter().zip(plan.sizes.iter()).zip(addrs.iter());
            for (((mem_type, size), &addr), buf) in requests.zip(bufs.iter()) {
                self.driver
                    .write(mem_type, addr, &buf[..size])
                    .map_err(|e| VfdError::driver("write", e))?;
            }
            record_scalar_fallback(plan.is_raw);
        }
        Ok(())
    }

    /// Decode the compressed fields and bounds-check every request
    fn plan_vector(
        &self,
        types: &[MemType],
        addrs: &[Addr],
        sizes: &[usize],
        check_eoa: bool,
    ) -> Result<VectorPlan> {
        let types = RunList::decode(types)?;
        let sizes = RunList::decode(sizes)?;
        let mut is_raw = false;

        for run in types.runs() {
            is_raw |= run.value.is_raw();
            if !check_eoa {
                continue;
            }
            let eoa = self.absolute_eoa(run.value)?;
            for i in run.start..run.end() {
                let size = sizes.get(i).unwrap_or_default();
                let end = addrs[i].checked_add(size as u64);
                if end.map_or(true, |end| end > eoa) {
                    return Err(VfdError::overflow(
                        addrs[i] - self.base_addr,
                        size as u64,
                        eoa,
                    ));
                }
            }
        }

        Ok(VectorPlan {
            types,
            sizes,
            is_raw,
        })
    }
}

fn check_lengths(types: usize, addrs: usize, sizes: usize, bufs: usize) -> Result<()> {
    if types != addrs || sizes != addrs || bufs != addrs {
        return Err(VfdError::invalid(format!(
            "vector arrays disagree: {} types, {} addrs, {} sizes, {} bufs",
            types, addrs, sizes, bufs
        )));
    }
    Ok(())
}

fn check_buffers(sizes: &RunList<usize>, lens: impl Iterator<Item = usize>) -> Result<()> {
    for (i, (size, len)) in sizes.iter().zip(lens).enumerate() {
        if len < size {
            return Err(VfdError::invalid(format!(
                "buffer {} holds {} bytes, request needs {}",
                i, len, size
            )));
        }
    }
    Ok(())
}

pub(crate) fn record_scalar_fallback(is_raw: bool) {
    telemetry::record_no_selection_cause(NoSelectionCause::NO_VECTOR_OR_SELECTION_CB);
    if is_raw {
        telemetry::record_mode(IoModes::SCALAR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_driver::{DriverCall, DriverOp, MemoryDriver};
    use vfdio_core::{ErrorKind, IoConfig};

    #[test]
    fn test_fallback_resolves_inherited_fields() {
        telemetry::reset();
        let mut f = IoFile::new(MemoryDriver::scalar_only().with_eoa(1024), IoConfig::default());
        let a = [b'a'; 100];
        let b = [b'b'; 100];
        let c = [b'c'; 50];
        let mut addrs = [0, 100, 300];
        f.write_vector(
            &[MemType::Draw, MemType::NoList, MemType::NoList],
            &mut addrs,
            &[100, 0, 50],
            &[&a, &b, &c],
        )
        .unwrap();

        let expected = [(0, 100), (100, 100), (300, 50)].map(|(addr, size)| DriverCall::Write {
            mem_type: MemType::Draw,
            addr,
            size,
        });
        assert_eq!(f.driver().calls(), &expected);
        assert_eq!(addrs, [0, 100, 300]);

        let t = telemetry::take();
        assert_eq!(t.modes, IoModes::SCALAR);
        assert!(t
            .no_selection_cause
            .contains(NoSelectionCause::NO_VECTOR_OR_SELECTION_CB));
    }

    #[test]
    fn test_native_vector_gets_compressed_request() {
        telemetry::reset();
        let driver = MemoryDriver::with_vector().with_eoa(1024);
        let mut f = IoFile::new(driver, IoConfig::default()).with_base_addr(16);
        let mut addrs = [0, 64];
        f.write_vector(
            &[MemType::Draw, MemType::NoList],
            &mut addrs,
            &[8, 0],
            &[&[1u8; 8], &[2u8; 8]],
        )
        .unwrap();

        assert_eq!(
            f.driver().calls(),
            &[DriverCall::WriteVector {
                types: vec![MemType::Draw, MemType::NoList],
                addrs: vec![16, 80],
                sizes: vec![8, 0],
            }]
        );
        assert_eq!(addrs, [0, 64]);
        assert_eq!(telemetry::take().modes, IoModes::VECTOR);

        let mut first = [0u8; 8];
        let mut second = [0u8; 8];
        f.read_vector(
            &[MemType::Draw, MemType::NoList],
            &mut addrs,
            &[8, 0],
            &mut [&mut first, &mut second],
        )
        .unwrap();
        assert_eq!(first, [1u8; 8]);
        assert_eq!(second, [2u8; 8]);
    }

    #[test]
    fn test_empty_request_short_circuits() {
        let mut f = IoFile::new(MemoryDriver::with_vector(), IoConfig::default());
        f.read_vector(&[], &mut [], &[], &mut []).unwrap();
        assert!(f.driver().calls().is_empty());

        let mut f = IoFile::new(MemoryDriver::with_vector(), IoConfig::collective());
        f.read_vector(&[], &mut [], &[], &mut []).unwrap();
        assert_eq!(f.driver().calls().len(), 1);
    }

    #[test]
    fn test_overflow_names_offending_request() {
        let mut f = IoFile::new(MemoryDriver::scalar_only().with_eoa(128), IoConfig::default())
            .with_base_addr(8);
        // 8 + 104 + 16 == 128 ends exactly at the EOA; 8 + 110 + 16 does not
        let mut addrs = [0, 104];
        f.write_vector(
            &[MemType::Draw, MemType::NoList],
            &mut addrs,
            &[16, 0],
            &[&[0u8; 16], &[0u8; 16]],
        )
        .unwrap();
        assert_eq!(addrs, [0, 104]);
        f.driver_mut().clear_calls();

        let mut addrs = [0, 110];
        let err = f
            .write_vector(
                &[MemType::Draw, MemType::NoList],
                &mut addrs,
                &[16, 0],
                &[&[0u8; 16], &[0u8; 16]],
            )
            .unwrap_err();
        match err {
            VfdError::AddressOverflow { addr, size, eoa } => {
                assert_eq!((addr, size, eoa), (110, 16, 128));
            }
            other => panic!("unexpected error {other}"),
        }
        assert_eq!(addrs, [0, 110]);
        assert!(f.driver().calls().is_empty());
    }

    #[test]
    fn test_swmr_reader_skips_read_checks() {
        let mut f = IoFile::new(MemoryDriver::scalar_only().with_eoa(4), IoConfig::swmr_reader());
        let mut out = [0xffu8; 8];
        f.read_vector(&[MemType::Draw], &mut [0], &[8], &mut [&mut out])
            .unwrap();
        assert_eq!(out, [0u8; 8]);
    }

    #[test]
    fn test_leading_sentinel_rejected() {
        let mut f = IoFile::new(MemoryDriver::scalar_only().with_eoa(64), IoConfig::default());
        let err = f
            .write_vector(&[MemType::NoList], &mut [0], &[4], &[&[0u8; 4]])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = f
            .write_vector(&[MemType::Draw], &mut [0], &[0], &[&[0u8; 4]])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_short_buffer_and_length_mismatch() {
        let mut f = IoFile::new(MemoryDriver::scalar_only().with_eoa(64), IoConfig::default());
        let err = f
            .write_vector(&[MemType::Draw], &mut [0], &[8], &[&[0u8; 4]])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = f
            .write_vector(&[MemType::Draw], &mut [0, 8], &[8], &[&[0u8; 8]])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn test_fallback_stops_at_first_failure() {
        let driver = MemoryDriver::scalar_only()
            .with_eoa(64)
            .fail_on(DriverOp::Write, 1);
        let mut f = IoFile::new(driver, IoConfig::default()).with_base_addr(4);
        let mut addrs = [0, 8, 16];
        let err = f
            .write_vector(
                &[MemType::Ohdr, MemType::NoList, MemType::NoList],
                &mut addrs,
                &[4, 0, 0],
                &[&[1u8; 4], &[2u8; 4], &[3u8; 4]],
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverIo);
        assert_eq!(addrs, [0, 8, 16]);
        assert_eq!(f.driver().calls().len(), 1);
    }
}
