// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Source bytes queued on a cache, plus how far the write has got.

The bytes are either copied in ([PendingBytes::owned]) or borrowed from the caller
([PendingBytes::borrowed]).  Borrowing is what a host passing a pinned managed array wants:
nothing is copied, and in exchange the caller promises the memory stays valid and unchanged
until the write completes or the cache is given new bytes or released.
*/

use std::fmt::{Debug, Formatter};
use std::ptr::NonNull;

enum SourceBytes {
    Owned(Box<[u8]>),
    Borrowed { ptr: NonNull<u8>, len: usize },
}

pub struct PendingBytes {
    bytes: SourceBytes,
    rows_written: usize,
}

// The borrowed pointer is only read, and only on the thread driving the uploads; the caller's
// contract in `borrowed` covers the rest.
unsafe impl Send for PendingBytes {}

impl PendingBytes {
    pub fn owned(bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            bytes: SourceBytes::Owned(bytes.into()),
            rows_written: 0,
        }
    }

    /**
    Borrows `len` bytes at `ptr` without copying.

    A null `ptr` is treated as an empty buffer.

    # Safety

    Unless `ptr` is null, `ptr..ptr+len` must be valid for reads, and must stay valid and
    unmodified until the pending write has finished, or has been replaced by another
    queue, or its cache has been released.
    */
    pub unsafe fn borrowed(ptr: *const u8, len: usize) -> Self {
        let bytes = match NonNull::new(ptr.cast_mut()) {
            Some(ptr) => SourceBytes::Borrowed { ptr, len },
            None => SourceBytes::Borrowed {
                ptr: NonNull::dangling(),
                len: 0,
            },
        };
        Self {
            bytes,
            rows_written: 0,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.bytes {
            SourceBytes::Owned(bytes) => bytes,
            //safe per the contract on `borrowed`
            SourceBytes::Borrowed { ptr, len } => unsafe { std::slice::from_raw_parts(ptr.as_ptr(), *len) },
        }
    }

    pub fn len(&self) -> usize {
        match &self.bytes {
            SourceBytes::Owned(bytes) => bytes.len(),
            SourceBytes::Borrowed { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.bytes, SourceBytes::Borrowed { .. })
    }

    /// Rows of the image already written to the texture.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub(crate) fn advance_to(&mut self, rows_written: usize) {
        debug_assert!(rows_written >= self.rows_written, "cursor moved backwards");
        self.rows_written = rows_written;
    }
}

impl Debug for PendingBytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingBytes")
            .field("len", &self.len())
            .field("borrowed", &self.is_borrowed())
            .field("rows_written", &self.rows_written)
            .finish()
    }
}

impl From<Vec<u8>> for PendingBytes {
    fn from(bytes: Vec<u8>) -> Self {
        PendingBytes::owned(bytes)
    }
}
