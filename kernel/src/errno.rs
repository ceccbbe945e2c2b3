//! Linux errno values as returned to user space (negated)

pub const ENOENT: isize = -2; // No such file or directory
pub const EBADF: isize = -9; // Bad file descriptor
pub const ENOMEM: isize = -12; // Out of memory
pub const EFAULT: isize = -14; // Bad address
pub const EEXIST: isize = -17; // File exists
pub const EINVAL: isize = -22; // Invalid argument
pub const ENAMETOOLONG: isize = -36; // File name too long
pub const ENOSYS: isize = -38; // Function not implemented
