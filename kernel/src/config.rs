//! Configuration constants for the echo proc driver

use crate::fs::vfs::inode::{FsError, FsResult};
use crate::fs::vfs::path::validate_filename;

/// Name of the pseudo-file under the proc root
pub const PROC_NAME: &str = "yeo14";

/// Capacity of the echo buffer in bytes
/// Writes longer than this are silently truncated
pub const ECHO_BUF_SIZE: usize = 512;

/// Initial size of a seq_file output buffer (one page)
pub const SEQ_BUF_INITIAL: usize = 4096;

/// Upper bound for seq_file buffer growth when a record overflows
pub const SEQ_BUF_MAX: usize = 1 << 20;

/// Largest echo buffer a reader can still get back in one record
/// (the seq buffer keeps one byte free past the trailing newline)
pub const MAX_ECHO_CAPACITY: usize = SEQ_BUF_MAX - 2;

/// Size of the in-memory kernel log ring (dmesg)
pub const LOG_BUFFER_SIZE: usize = 16384;

/// Longest single formatted log line; longer lines are cut
pub const LOG_LINE_MAX: usize = 512;

/// First address above the user half of the canonical address space
pub const USER_LIMIT: u64 = 0x0000_8000_0000_0000;

/// Runtime parameters of one echo driver instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoConfig {
    /// Entry name under the proc root
    pub name: &'static str,
    /// Buffer capacity in bytes
    pub capacity: usize,
}

impl EchoConfig {
    pub const fn new(name: &'static str, capacity: usize) -> Self {
        Self { name, capacity }
    }

    /// Reject names the proc layer could not register, empty buffers, and
    /// buffers whose line (contents plus newline) the seq layer cannot hold
    pub fn validate(&self) -> FsResult<()> {
        validate_filename(self.name)?;
        if self.capacity == 0 || self.capacity > MAX_ECHO_CAPACITY {
            return Err(FsError::InvalidArgument);
        }
        Ok(())
    }
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self::new(PROC_NAME, ECHO_BUF_SIZE)
    }
}
