//! Open Files
//!
//! An `OpenFile` is the handle returned by opening a registered entry. It
//! carries the open flags, the file position and the per-open private state
//! a driver installs in its `open` hook, and dispatches every call to the
//! entry's `FileOps`.

use super::inode::{FsError, FsResult};
use crate::uaccess::UserSlice;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

bitflags::bitflags! {
    /// Open flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const O_WRONLY = 0x0001;
        const O_RDWR = 0x0002;
        const O_CLOEXEC = 0x0080;
    }
}

impl OpenFlags {
    pub const O_RDONLY: Self = Self::empty();
    const O_ACCMODE: u32 = 0x3;

    pub fn is_readable(&self) -> bool {
        let mode = self.bits() & Self::O_ACCMODE;
        mode == 0 || mode == Self::O_RDWR.bits()
    }

    pub fn is_writable(&self) -> bool {
        let mode = self.bits() & Self::O_ACCMODE;
        mode == Self::O_WRONLY.bits() || mode == Self::O_RDWR.bits()
    }
}

/// lseek origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// SEEK_SET
    Set,
    /// SEEK_CUR
    Cur,
    /// SEEK_END
    End,
}

impl Whence {
    /// Decode a raw `SEEK_*` value
    pub fn from_raw(whence: i32) -> FsResult<Self> {
        match whence {
            0 => Ok(Whence::Set),
            1 => Ok(Whence::Cur),
            2 => Ok(Whence::End),
            _ => Err(FsError::InvalidArgument),
        }
    }
}

/// Behaviour behind a registered file name
///
/// Every hook has a default so a driver only provides what it supports.
pub trait FileOps: Send + Sync {
    /// Called once per open, before the handle is returned
    fn open(&self, _file: &mut OpenFile) -> FsResult<()> {
        Ok(())
    }

    /// Read into `dst`, advancing the file position
    fn read(&self, _file: &mut OpenFile, _dst: &mut [u8]) -> FsResult<usize> {
        Err(FsError::NotSupported)
    }

    /// Transfer from the caller's buffer into the file
    fn write(&self, _file: &mut OpenFile, _src: &UserSlice<'_>) -> FsResult<usize> {
        Err(FsError::NotSupported)
    }

    /// Reposition the file; returns the new position
    fn llseek(&self, _file: &mut OpenFile, _offset: i64, _whence: Whence) -> FsResult<u64> {
        Err(FsError::NotSupported)
    }

    /// Called once when the handle goes away
    fn release(&self, _file: &mut OpenFile) -> FsResult<()> {
        Ok(())
    }
}

/// Handle to an opened file
pub struct OpenFile {
    ops: Arc<dyn FileOps>,
    flags: OpenFlags,
    pos: u64,
    private_data: Option<Box<dyn Any + Send>>,
    released: bool,
}

impl core::fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OpenFile")
            .field("flags", &self.flags)
            .field("pos", &self.pos)
            .field("has_private", &self.private_data.is_some())
            .finish()
    }
}

impl OpenFile {
    /// Create a handle; the caller runs the `open` hook
    pub fn new(ops: Arc<dyn FileOps>, flags: OpenFlags) -> Self {
        Self {
            ops,
            flags,
            pos: 0,
            private_data: None,
            released: false,
        }
    }

    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// Current file position
    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn read(&mut self, dst: &mut [u8]) -> FsResult<usize> {
        if !self.flags.is_readable() {
            return Err(FsError::BadFileDescriptor);
        }
        let ops = Arc::clone(&self.ops);
        ops.read(self, dst)
    }

    pub fn write(&mut self, src: &UserSlice<'_>) -> FsResult<usize> {
        if !self.flags.is_writable() {
            return Err(FsError::BadFileDescriptor);
        }
        let ops = Arc::clone(&self.ops);
        ops.write(self, src)
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> FsResult<u64> {
        let ops = Arc::clone(&self.ops);
        ops.llseek(self, offset, whence)
    }

    /// Release the handle, reporting the driver's release result
    pub fn close(mut self) -> FsResult<()> {
        self.release()
    }

    fn release(&mut self) -> FsResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let ops = Arc::clone(&self.ops);
        ops.release(self)
    }

    /// Install per-open driver state, replacing any previous one
    pub fn set_private_data<T: Any + Send>(&mut self, data: T) {
        self.private_data = Some(Box::new(data));
    }

    /// Driver state together with the file position
    ///
    /// Returns None if no state is installed or it has another type.
    pub fn private_data_with_pos<T: Any>(&mut self) -> Option<(&mut T, &mut u64)> {
        let data = self.private_data.as_mut()?.downcast_mut::<T>()?;
        Some((data, &mut self.pos))
    }

    /// Remove and return the per-open state
    pub fn take_private_data(&mut self) -> Option<Box<dyn Any + Send>> {
        self.private_data.take()
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
