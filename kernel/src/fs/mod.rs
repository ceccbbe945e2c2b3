//! Filesystem Support
//!
//! The VFS handle types and the proc pseudo-filesystem drivers register into.

pub mod proc;
pub mod vfs;
