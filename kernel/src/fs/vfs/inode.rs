//! Inode Mode and Error Types
//!
//! File mode bits and the error type shared by the VFS, the proc layer and
//! drivers registered into it.

use crate::errno;
use core::fmt;

/// POSIX file mode bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct FileMode(pub u16);

impl FileMode {
    // File types
    pub const S_IFMT: u16 = 0o170000; // File type mask
    pub const S_IFREG: u16 = 0o100000; // Regular file
    pub const S_IFDIR: u16 = 0o040000; // Directory

    // Permissions
    pub const S_IRUSR: u16 = 0o0400; // User read
    pub const S_IRGRP: u16 = 0o0040; // Group read
    pub const S_IROTH: u16 = 0o0004; // Other read

    /// Read for user, group and other
    pub const S_IRUGO: u16 = Self::S_IRUSR | Self::S_IRGRP | Self::S_IROTH;

    /// Create a new FileMode
    pub const fn new(mode: u16) -> Self {
        Self(mode)
    }

    /// Get the file type
    pub const fn file_type(&self) -> u16 {
        self.0 & Self::S_IFMT
    }

    /// Get the permission bits
    pub const fn permissions(&self) -> u16 {
        self.0 & 0o7777
    }

    /// Check if this is a regular file
    pub const fn is_regular(&self) -> bool {
        self.file_type() == Self::S_IFREG
    }

    /// Check if this is a directory
    pub const fn is_directory(&self) -> bool {
        self.file_type() == Self::S_IFDIR
    }
}

/// Result type for filesystem operations
pub type FsResult<T> = Result<T, FsError>;

/// Filesystem error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// Invalid argument
    InvalidArgument,
    /// No such file or directory
    NotFound,
    /// File exists
    AlreadyExists,
    /// Operation not permitted on this handle
    BadFileDescriptor,
    /// Out of memory
    OutOfMemory,
    /// Bad address (invalid userspace pointer)
    BadAddress,
    /// Name too long
    NameTooLong,
    /// Operation not provided by this file
    NotSupported,
}

impl FsError {
    /// Negative errno handed back across the syscall boundary
    pub const fn to_errno(self) -> isize {
        match self {
            Self::InvalidArgument => errno::EINVAL,
            Self::NotFound => errno::ENOENT,
            Self::AlreadyExists => errno::EEXIST,
            Self::BadFileDescriptor => errno::EBADF,
            Self::OutOfMemory => errno::ENOMEM,
            Self::BadAddress => errno::EFAULT,
            Self::NameTooLong => errno::ENAMETOOLONG,
            Self::NotSupported => errno::ENOSYS,
        }
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "Invalid argument"),
            Self::NotFound => write!(f, "No such file or directory"),
            Self::AlreadyExists => write!(f, "File exists"),
            Self::BadFileDescriptor => write!(f, "Bad file descriptor"),
            Self::OutOfMemory => write!(f, "Out of memory"),
            Self::BadAddress => write!(f, "Bad address"),
            Self::NameTooLong => write!(f, "Name too long"),
            Self::NotSupported => write!(f, "Operation not supported"),
        }
    }
}
