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

//! In-memory reference driver
//!
//! Backs the file with a growable byte vector. The set of native primitives
//! is chosen at construction, which makes it possible to run the same
//! request through every dispatch path and compare the results. Every
//! successful driver call is logged, and failures can be injected per
//! primitive.

use std::io;

use vfdio_core::selection::collect_runs;
use vfdio_core::{
    Addr, DriverCapabilities, FileDriver, MemType, Result, RunList, SelectionArgs, SeqRun,
    SpaceRegistry, VfdError, NUM_MEM_TYPES,
};

/// Largest address the memory store grows to
const MAX_STORE: u64 = 1 << 32;

/// A logged driver call; addresses are absolute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Read {
        mem_type: MemType,
        addr: Addr,
        size: usize,
    },
    Write {
        mem_type: MemType,
        addr: Addr,
        size: usize,
    },
    /// `types` and `sizes` exactly as received
    ReadVector {
        types: Vec<MemType>,
        addrs: Vec<Addr>,
        sizes: Vec<usize>,
    },
    WriteVector {
        types: Vec<MemType>,
        addrs: Vec<Addr>,
        sizes: Vec<usize>,
    },
    ReadSelection {
        count: usize,
    },
    WriteSelection {
        count: usize,
    },
}

/// Driver primitive, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverOp {
    Read,
    Write,
    ReadVector,
    WriteVector,
    ReadSelection,
    WriteSelection,
}

#[derive(Debug, Clone, Copy)]
struct FailPoint {
    op: DriverOp,
    /// Calls of `op` that still succeed
    remaining: usize,
}

/// Driver over a `Vec<u8>`
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    data: Vec<u8>,
    eoa: [Addr; NUM_MEM_TYPES],
    capabilities: DriverCapabilities,
    calls: Vec<DriverCall>,
    fail: Option<FailPoint>,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::with_capabilities(DriverCapabilities::SCALAR_ONLY)
    }
}

impl MemoryDriver {
    pub fn with_capabilities(capabilities: DriverCapabilities) -> Self {
        Self {
            data: Vec::new(),
            eoa: [0; NUM_MEM_TYPES],
            capabilities,
            calls: Vec::new(),
            fail: None,
        }
    }

    pub fn scalar_only() -> Self {
        Self::with_capabilities(DriverCapabilities::SCALAR_ONLY)
    }

    pub fn with_vector() -> Self {
        Self::with_capabilities(DriverCapabilities::VECTOR)
    }

    /// Native selection I/O without native vector I/O
    pub fn with_selection() -> Self {
        Self::with_capabilities(DriverCapabilities {
            selection_read: true,
            selection_write: true,
            ..DriverCapabilities::SCALAR_ONLY
        })
    }

    pub fn full() -> Self {
        Self::with_capabilities(DriverCapabilities::FULL)
    }

    /// Set the EOA of every memory type
    pub fn with_eoa(mut self, eoa: Addr) -> Self {
        self.eoa = [eoa; NUM_MEM_TYPES];
        self
    }

    /// Let `after` calls of `op` succeed, then fail every later one
    pub fn fail_on(mut self, op: DriverOp, after: usize) -> Self {
        self.fail = Some(FailPoint {
            op,
            remaining: after,
        });
        self
    }

    /// Place bytes in the store without logging a call
    pub fn load(&mut self, addr: Addr, bytes: &[u8]) {
        let start = addr as usize;
        let end = start + bytes.len();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(bytes);
    }

    /// Stored bytes, zero past EOF
    pub fn bytes(&self, addr: Addr, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        self.copy_out(addr, &mut out);
        out
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn eoa(&self, mem_type: MemType) -> Addr {
        mem_type.index().map_or(0, |i| self.eoa[i])
    }

    pub fn eof(&self) -> Addr {
        self.data.len() as Addr
    }

    fn check_fail(&mut self, op: DriverOp) -> Result<()> {
        match &mut self.fail {
            Some(point) if point.op == op => {
                if point.remaining == 0 {
                    return Err(VfdError::Io(io::Error::new(
                        io::ErrorKind::Other,
                        format!("injected {:?} failure", op),
                    )));
                }
                point.remaining -= 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn copy_out(&self, addr: Addr, buf: &mut [u8]) {
        let len = self.data.len() as u64;
        if addr >= len {
            buf.fill(0);
            return;
        }
        let start = addr as usize;
        let avail = (self.data.len() - start).min(buf.len());
        buf[..avail].copy_from_slice(&self.data[start..start + avail]);
        buf[avail..].fill(0);
    }

    fn copy_in(&mut self, addr: Addr, buf: &[u8]) -> Result<()> {
        let end = addr
            .checked_add(buf.len() as u64)
            .filter(|&end| end <= MAX_STORE)
            .ok_or_else(|| {
                VfdError::invalid(format!("write of {} bytes at {} beyond store", buf.len(), addr))
            })?;
        if (self.data.len() as u64) < end {
            self.data.resize(end as usize, 0);
        }
        self.data[addr as usize..end as usize].copy_from_slice(buf);
        Ok(())
    }

    /// Byte-run pairs `(file_addr, mem_offset, len)` of one selection request
    fn selection_pieces(
        registry: &SpaceRegistry,
        args: &SelectionArgs<'_>,
        i: usize,
        element_size: usize,
    ) -> Result<Vec<(Addr, usize, usize)>> {
        let file = registry.resolve(args.file_spaces[i])?;
        let mem = registry.resolve(args.mem_spaces[i])?;
        if file.element_count() != mem.element_count() {
            return Err(VfdError::mismatched("selection element counts differ"));
        }
        let file_runs = collect_runs(&*file, element_size)?;
        let mem_runs = collect_runs(&*mem, element_size)?;
        Ok(zip_runs(args.offsets[i], &file_runs, &mem_runs))
    }
}

fn zip_runs(offset: Addr, file_runs: &[SeqRun], mem_runs: &[SeqRun]) -> Vec<(Addr, usize, usize)> {
    let mut pieces = Vec::new();
    let mut mem = mem_runs.iter().copied().filter(|r| r.len > 0);
    let mut current = mem.next();
    for run in file_runs {
        let mut done = 0;
        while done < run.len {
            let Some(m) = current.as_mut() else {
                return pieces;
            };
            let len = (run.len - done).min(m.len);
            pieces.push((offset + run.offset + done as u64, m.offset as usize, len));
            done += len;
            m.offset += len as u64;
            m.len -= len;
            if m.len == 0 {
                current = mem.next();
            }
        }
    }
    pieces
}

impl FileDriver for MemoryDriver {
    fn name(&self) -> &str {
        "memory"
    }

    fn capabilities(&self) -> DriverCapabilities {
        self.capabilities
    }

    fn get_eoa(&self, mem_type: MemType) -> Result<Addr> {
        mem_type
            .index()
            .map(|i| self.eoa[i])
            .ok_or_else(|| VfdError::invalid("no EOA for the inherit sentinel"))
    }

    fn set_eoa(&mut self, mem_type: MemType, addr: Addr) -> Result<()> {
        let i = mem_type
            .index()
            .ok_or_else(|| VfdError::invalid("no EOA for the inherit sentinel"))?;
        self.eoa[i] = addr;
        Ok(())
    }

    fn get_eof(&self, _mem_type: MemType) -> Result<Addr> {
        Ok(self.eof())
    }

    fn read(&mut self, mem_type: MemType, addr: Addr, buf: &mut [u8]) -> Result<()> {
        self.check_fail(DriverOp::Read)?;
        self.copy_out(addr, buf);
        self.calls.push(DriverCall::Read {
            mem_type,
            addr,
            size: buf.len(),
        });
        Ok(())
    }

    fn write(&mut self, mem_type: MemType, addr: Addr, buf: &[u8]) -> Result<()> {
        self.check_fail(DriverOp::Write)?;
        self.copy_in(addr, buf)?;
        self.calls.push(DriverCall::Write {
            mem_type,
            addr,
            size: buf.len(),
        });
        Ok(())
    }

    fn read_vector(
        &mut self,
        types: &[MemType],
        addrs: &[Addr],
        sizes: &[usize],
        bufs: &mut [&mut [u8]],
    ) -> Result<()> {
        if !self.capabilities.vector_read {
            return Err(VfdError::unsupported("vector read"));
        }
        self.check_fail(DriverOp::ReadVector)?;
        let resolved = RunList::decode(sizes)?;
        RunList::decode(types)?;
        for ((&addr, size), buf) in addrs.iter().zip(resolved.iter()).zip(bufs.iter_mut()) {
            self.copy_out(addr, &mut buf[..size]);
        }
        self.calls.push(DriverCall::ReadVector {
            types: types.to_vec(),
            addrs: addrs.to_vec(),
            sizes: sizes.to_vec(),
        });
        Ok(())
    }

    fn write_vector(
        &mut self,
        types: &[MemType],
        addrs: &[Addr],
        sizes: &[usize],
        bufs: &[&[u8]],
    ) -> Result<()> {
        if !self.capabilities.vector_write {
            return Err(VfdError::unsupported("vector write"));
        }
        self.check_fail(DriverOp::WriteVector)?;
        let resolved = RunList::decode(sizes)?;
        RunList::decode(types)?;
        for ((&addr, size), buf) in addrs.iter().zip(resolved.iter()).zip(bufs.iter()) {
            self.copy_in(addr, &buf[..size])?;
        }
        self.calls.push(DriverCall::WriteVector {
            types: types.to_vec(),
            addrs: addrs.to_vec(),
            sizes: sizes.to_vec(),
        });
        Ok(())
    }

    fn read_selection(
        &mut self,
        registry: &SpaceRegistry,
        args: SelectionArgs<'_>,
        bufs: &mut [Option<&mut [u8]>],
    ) -> Result<()> {
        if !self.capabilities.selection_read {
            return Err(VfdError::unsupported("selection read"));
        }
        self.check_fail(DriverOp::ReadSelection)?;
        if bufs.len() != args.count() {
            return Err(VfdError::invalid("one buffer slot per selection required"));
        }
        let sizes = RunList::decode(args.element_sizes)?;
        let sources = RunList::sources(args.count(), |i| bufs[i].is_some())?;
        for (i, (element_size, src)) in sizes.iter().zip(sources.iter()).enumerate() {
            let pieces = Self::selection_pieces(registry, &args, i, element_size)?;
            let buf = bufs[src]
                .as_deref_mut()
                .ok_or_else(|| VfdError::invalid("missing selection buffer"))?;
            for (addr, mem_offset, len) in pieces {
                let dst = buf
                    .get_mut(mem_offset..mem_offset + len)
                    .ok_or_else(|| VfdError::invalid("memory selection exceeds buffer"))?;
                self.copy_out(addr, dst);
            }
        }
        self.calls.push(DriverCall::ReadSelection {
            count: args.count(),
        });
        Ok(())
    }

    fn write_selection(
        &mut self,
        registry: &SpaceRegistry,
        args: SelectionArgs<'_>,
        bufs: &[Option<&[u8]>],
    ) -> Result<()> {
        if !self.capabilities.selection_write {
            return Err(VfdError::unsupported("selection write"));
        }
        self.check_fail(DriverOp::WriteSelection)?;
        if bufs.len() != args.count() {
            return Err(VfdError::invalid("one buffer slot per selection required"));
        }
        let sizes = RunList::decode(args.element_sizes)?;
        let sources = RunList::sources(args.count(), |i| bufs[i].is_some())?;
        for (i, (element_size, src)) in sizes.iter().zip(sources.iter()).enumerate() {
            let pieces = Self::selection_pieces(registry, &args, i, element_size)?;
            let buf = bufs[src].ok_or_else(|| VfdError::invalid("missing selection buffer"))?;
            for (addr, mem_offset, len) in pieces {
                let bytes = buf
                    .get(mem_offset..mem_offset + len)
                    .ok_or_else(|| VfdError::invalid("memory selection exceeds buffer"))?;
                self.copy_in(addr, bytes)?;
            }
        }
        self.calls.push(DriverCall::WriteSelection {
            count: args.count(),
        });
        Ok(())
    }
}
