//! Echo buffer store
//!
//! Fixed-capacity byte region plus the length of its valid prefix.

use crate::fs::vfs::inode::{FsError, FsResult};
use alloc::boxed::Box;
use alloc::vec::Vec;

pub struct EchoBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl EchoBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes
    pub fn try_new(capacity: usize) -> FsResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| FsError::OutOfMemory)?;
        data.resize(capacity, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
            len: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The valid prefix
    pub fn contents(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Replace the contents with `src`, clamped to capacity
    ///
    /// Bytes past the new length are zeroed. Returns the number of bytes
    /// stored.
    pub fn replace(&mut self, src: &[u8]) -> usize {
        let accepted = core::cmp::min(src.len(), self.capacity());
        self.data[..accepted].copy_from_slice(&src[..accepted]);
        self.data[accepted..].fill(0);
        self.len = accepted;
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buf = EchoBuffer::try_new(16).unwrap();
        assert_eq!(buf.capacity(), 16);
        assert!(buf.is_empty());
        assert_eq!(buf.contents(), b"");
    }

    #[test]
    fn test_replace_clamps() {
        let mut buf = EchoBuffer::try_new(4).unwrap();
        assert_eq!(buf.replace(b"abcdef"), 4);
        assert_eq!(buf.contents(), b"abcd");
    }

    #[test]
    fn test_shorter_write_zeroes_tail() {
        let mut buf = EchoBuffer::try_new(8).unwrap();
        buf.replace(b"longtext");
        buf.replace(b"ab");
        assert_eq!(buf.contents(), b"ab");
        assert!(buf.data[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_replace_clears() {
        let mut buf = EchoBuffer::try_new(8).unwrap();
        buf.replace(b"stale");
        assert_eq!(buf.replace(b""), 0);
        assert!(buf.is_empty());
        assert!(buf.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_huge_allocation_fails_cleanly() {
        assert!(matches!(
            EchoBuffer::try_new(usize::MAX),
            Err(FsError::OutOfMemory)
        ));
    }
}
