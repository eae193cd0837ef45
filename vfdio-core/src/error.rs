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

//! Error types for the VFD I/O dispatch layer

use std::fmt;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VfdError {
    #[error("addr overflow, addr = {addr}, size = {size}, eoa = {eoa}")]
    AddressOverflow { addr: u64, size: u64, eoa: u64 },

    #[error("Mismatched selection: {0}")]
    MismatchedSelection(String),

    #[error("Duplicate address {addr} in I/O request")]
    DuplicateAddress { addr: u64 },

    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    #[error("Driver {op} request failed: {source}")]
    DriverIo {
        op: &'static str,
        #[source]
        source: Box<VfdError>,
    },

    #[error("Handle error: {0}")]
    Handle(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Driver does not support {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Fieldless classification of [`VfdError`], handy for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AddressOverflow,
    MismatchedSelection,
    DuplicateAddress,
    AllocationFailure,
    DriverIo,
    Handle,
    InvalidRequest,
    Unsupported,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AddressOverflow => "address overflow",
            Self::MismatchedSelection => "mismatched selection",
            Self::DuplicateAddress => "duplicate address",
            Self::AllocationFailure => "allocation failure",
            Self::DriverIo => "driver I/O error",
            Self::Handle => "handle error",
            Self::InvalidRequest => "invalid request",
            Self::Unsupported => "unsupported",
            Self::Io => "I/O error",
        };
        f.write_str(name)
    }
}

impl VfdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AddressOverflow { .. } => ErrorKind::AddressOverflow,
            Self::MismatchedSelection(_) => ErrorKind::MismatchedSelection,
            Self::DuplicateAddress { .. } => ErrorKind::DuplicateAddress,
            Self::AllocationFailure(_) => ErrorKind::AllocationFailure,
            Self::DriverIo { .. } => ErrorKind::DriverIo,
            Self::Handle(_) => ErrorKind::Handle,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Wrap a failure returned by a backend primitive
    pub fn driver(op: &'static str, source: VfdError) -> Self {
        tracing::debug!(op, error = %source, "driver request failed");
        Self::DriverIo {
            op,
            source: Box::new(source),
        }
    }

    pub fn overflow(addr: u64, size: u64, eoa: u64) -> Self {
        tracing::debug!(addr, size, eoa, "addr overflow");
        Self::AddressOverflow { addr, size, eoa }
    }

    pub fn mismatched(details: impl Into<String>) -> Self {
        let details = details.into();
        tracing::debug!(%details, "mismatched selection");
        Self::MismatchedSelection(details)
    }

    pub fn invalid(details: impl Into<String>) -> Self {
        let details = details.into();
        tracing::debug!(%details, "invalid request");
        Self::InvalidRequest(details)
    }

    pub fn alloc(details: impl Into<String>) -> Self {
        let details = details.into();
        tracing::debug!(%details, "allocation failure");
        Self::AllocationFailure(details)
    }

    /// An optional driver primitive that is not implemented
    pub fn unsupported(primitive: &'static str) -> Self {
        tracing::debug!(primitive, "unsupported driver primitive");
        Self::Unsupported(primitive)
    }

    /// The innermost error, looking through driver wrapping
    pub fn root_cause(&self) -> &VfdError {
        match self {
            Self::DriverIo { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, VfdError>;

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_kind_and_root_cause() {
        let inner = VfdError::Io(io::Error::new(io::ErrorKind::Other, "disk gone"));
        let err = VfdError::driver("write", inner);
        assert_eq!(err.kind(), ErrorKind::DriverIo);
        assert_eq!(err.root_cause().kind(), ErrorKind::Io);
        assert!(err.to_string().contains("write"));
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_constructors_log_failures() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let kinds = tracing::subscriber::with_default(subscriber, || {
            [
                VfdError::invalid("bad count").kind(),
                VfdError::alloc("scratch of 64").kind(),
                VfdError::unsupported("vector read").kind(),
            ]
        });
        assert_eq!(
            kinds,
            [
                ErrorKind::InvalidRequest,
                ErrorKind::AllocationFailure,
                ErrorKind::Unsupported
            ]
        );

        let text = String::from_utf8(log.0.lock().clone()).unwrap();
        assert!(text.contains("invalid request"));
        assert!(text.contains("allocation failure"));
        assert!(text.contains("unsupported driver primitive"));
        assert!(text.contains("vector read"));
    }

    #[test]
    fn test_overflow_message() {
        let err = VfdError::overflow(90, 20, 100);
        assert_eq!(err.kind(), ErrorKind::AddressOverflow);
        assert_eq!(err.to_string(), "addr overflow, addr = 90, size = 20, eoa = 100");
    }
}
