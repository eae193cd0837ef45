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

//! Local file driver
//!
//! Plain positioned I/O on an OS file. Only the scalar primitives are
//! native; vector and selection requests reach it decomposed by the
//! dispatch layer. All memory types share one EOA.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use vfdio_core::{Addr, FileDriver, MemType, Result, VfdError};

pub struct LocalFileDriver {
    path: PathBuf,
    file: File,
    eoa: Addr,
    eof: Addr,
}

impl LocalFileDriver {
    /// Create or truncate a file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        tracing::debug!(path = %path.display(), "created local file");
        Ok(Self {
            path,
            file,
            eoa: 0,
            eof: 0,
        })
    }

    /// Open an existing file read-write; the EOA starts at the EOF
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let eof = file.metadata()?.len();
        tracing::debug!(path = %path.display(), eof, "opened local file");
        Ok(Self {
            path,
            file,
            eoa: eof,
            eof,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush file contents to disk
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

impl FileDriver for LocalFileDriver {
    fn name(&self) -> &str {
        "local"
    }

    fn get_eoa(&self, _mem_type: MemType) -> Result<Addr> {
        Ok(self.eoa)
    }

    fn set_eoa(&mut self, _mem_type: MemType, addr: Addr) -> Result<()> {
        self.eoa = addr;
        Ok(())
    }

    fn get_eof(&self, _mem_type: MemType) -> Result<Addr> {
        Ok(self.eof)
    }

    fn read(&mut self, _mem_type: MemType, addr: Addr, buf: &mut [u8]) -> Result<()> {
        // Bytes past the physical end of file read as zeros
        let avail = self.eof.saturating_sub(addr).min(buf.len() as u64) as usize;
        let (present, missing) = buf.split_at_mut(avail);
        if !present.is_empty() {
            self.file.seek(SeekFrom::Start(addr))?;
            self.file.read_exact(present)?;
        }
        missing.fill(0);
        Ok(())
    }

    fn write(&mut self, _mem_type: MemType, addr: Addr, buf: &[u8]) -> Result<()> {
        let end = addr
            .checked_add(buf.len() as u64)
            .ok_or_else(|| VfdError::overflow(addr, buf.len() as u64, self.eoa))?;
        self.file.seek(SeekFrom::Start(addr))?;
        self.file.write_all(buf)?;
        self.eof = self.eof.max(end);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_reopen_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.h5");

        let mut driver = LocalFileDriver::create(&path).unwrap();
        driver.write(MemType::Draw, 4, b"abcd").unwrap();
        assert_eq!(driver.get_eof(MemType::Draw).unwrap(), 8);
        driver.sync().unwrap();
        drop(driver);

        let mut driver = LocalFileDriver::open(&path).unwrap();
        assert_eq!(driver.get_eoa(MemType::Super).unwrap(), 8);
        let mut buf = [0xffu8; 10];
        driver.read(MemType::Draw, 2, &mut buf).unwrap();
        assert_eq!(&buf, b"\0\0abcd\0\0\0\0");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = LocalFileDriver::open(dir.path().join("absent")).err().unwrap();
        assert_eq!(err.kind(), vfdio_core::ErrorKind::Io);
    }
}
