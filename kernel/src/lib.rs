//! MelloOS echo pseudo-file driver
//!
//! Exposes `/proc/yeo14`: a write stores up to 512 bytes of text in kernel
//! memory, a read returns that text as a single line.
//!
//! The crate is `no_std` + `alloc` so the same code links into the kernel
//! image; unit and integration tests run it on the host.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod log;

pub mod config;
pub mod echo;
pub mod errno;
pub mod fs;
pub mod uaccess;

pub use config::EchoConfig;
pub use echo::{EchoDevice, EchoModule, ModuleInfo};
pub use fs::proc::ProcRegistry;
pub use fs::vfs::inode::{FsError, FsResult};
