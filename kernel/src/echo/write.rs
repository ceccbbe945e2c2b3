//! Write path: copy a caller's message into the echo buffer

use super::EchoDevice;
use crate::fs::vfs::inode::{FsError, FsResult};
use crate::uaccess::UserSlice;
use alloc::vec::Vec;

impl EchoDevice {
    /// Replace the stored message with the caller's bytes
    ///
    /// At most `capacity` bytes are taken; the rest is dropped without an
    /// error. Returns the number of bytes accepted. On a copy fault the
    /// previous message is left untouched.
    pub fn write_from_user(&self, src: &UserSlice<'_>) -> FsResult<usize> {
        let accepted = core::cmp::min(src.len(), self.capacity());

        // Copy-in may fault; never under the buffer lock
        let mut staging = Vec::new();
        staging
            .try_reserve_exact(accepted)
            .map_err(|_| FsError::OutOfMemory)?;
        staging.resize(accepted, 0);

        if let Err(e) = src.copy_prefix(&mut staging) {
            crate::log_error!(
                "ECHO",
                "copy from user in write error: {} ({:?})",
                e,
                src
            );
            return Err(e.into());
        }

        let stored = self.store(&staging);
        if stored < src.len() {
            crate::log_debug!(
                "ECHO",
                "/proc/{}: truncated {} -> {} bytes",
                self.config().name,
                src.len(),
                stored
            );
        }
        Ok(stored)
    }
}
