// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::imp::BackendError;

/// Everything that can go wrong in an upload operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("No free caches (all {capacity} are in use)")]
    PoolExhausted { capacity: usize },
    #[error("Invalid cache index {0}")]
    InvalidIndex(i64),
    #[error("Cache {0} not allocated")]
    NotAllocated(usize),
    #[error("Cache {0} has no queued texture bytes")]
    NoPendingWrite(usize),
    #[error("No device context")]
    NoDeviceContext,
    #[error("Cache {0} is in an inconsistent state")]
    InternalInconsistency(usize),
    #[error("Queued buffer is {len} bytes but writing up to row {row_last} needs {needed}")]
    BufferTooShort {
        len: usize,
        row_last: usize,
        needed: usize,
    },
    #[error("Unsupported pixel format code {0}")]
    UnsupportedFormat(i32),
    #[error("Invalid texture size {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("Cache pool was shut down after an internal inconsistency")]
    PoolPoisoned,
    #[error("Panicked: {0}")]
    Panicked(String),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

impl Error {
    /**
    Whether this error points at a bug in the engine itself rather than at the caller or the
    environment.
    */
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::InternalInconsistency(_) | Error::Panicked(_))
    }

    /// Whether retrying the same call on a later frame may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::NoDeviceContext)
    }
}
