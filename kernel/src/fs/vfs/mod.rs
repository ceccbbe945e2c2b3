//! Virtual File System (VFS) Layer
//!
//! Handle, mode and error types shared by every file a driver exposes.

pub mod file;
pub mod inode;
pub mod path;

pub use file::{FileOps, OpenFile, OpenFlags, Whence};
pub use inode::{FileMode, FsError, FsResult};
