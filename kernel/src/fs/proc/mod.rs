//! /proc Virtual Filesystem
//!
//! Drivers publish pseudo-files here: a name under `/proc` bound to a set
//! of `FileOps`. Opening the name runs the driver's hooks; nothing is
//! stored on disk.

pub mod seq_file;

use crate::fs::vfs::file::{FileOps, OpenFile, OpenFlags};
use crate::fs::vfs::inode::{FileMode, FsError, FsResult};
use crate::fs::vfs::path::{split_path, validate_filename};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::RwLock;

/// Mount point of the proc root
pub const PROC_ROOT: &str = "/proc";

/// A registered pseudo-file
pub struct ProcEntry {
    name: String,
    mode: FileMode,
    ops: Arc<dyn FileOps>,
}

impl ProcEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }
}

impl core::fmt::Debug for ProcEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcEntry")
            .field("name", &self.name)
            .field("mode", &format_args!("{:o}", self.mode.0))
            .finish()
    }
}

/// Mode a new entry gets: regular file, world-readable when no
/// permission bits were asked for
fn entry_mode(mode: u16) -> FileMode {
    let mut mode = mode;
    if mode & FileMode::S_IFMT == 0 {
        mode |= FileMode::S_IFREG;
    }
    if mode & 0o7777 == 0 {
        mode |= FileMode::S_IRUGO;
    }
    FileMode::new(mode)
}

/// Entries directly under the proc root
pub struct ProcRegistry {
    entries: RwLock<Vec<Arc<ProcEntry>>>,
}

impl Default for ProcRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcRegistry {
    pub const fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Publish `name` with the given mode bits and operations
    pub fn proc_create(
        &self,
        name: &str,
        mode: u16,
        ops: Arc<dyn FileOps>,
    ) -> FsResult<Arc<ProcEntry>> {
        validate_filename(name)?;

        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.name == name) {
            crate::log_warn!("PROC", "/proc/{} already registered", name);
            return Err(FsError::AlreadyExists);
        }

        let entry = Arc::new(ProcEntry {
            name: String::from(name),
            mode: entry_mode(mode),
            ops,
        });
        entries.push(Arc::clone(&entry));
        crate::log_info!("PROC", "created /proc/{} mode {:o}", name, entry.mode.0);
        Ok(entry)
    }

    /// Withdraw `name`; handles already open keep working
    pub fn remove_proc_entry(&self, name: &str) -> FsResult<()> {
        let mut entries = self.entries.write();
        let index = entries
            .iter()
            .position(|e| e.name == name)
            .ok_or(FsError::NotFound)?;
        entries.remove(index);
        crate::log_info!("PROC", "removed /proc/{}", name);
        Ok(())
    }

    /// Look up an entry by name
    pub fn lookup(&self, name: &str) -> Option<Arc<ProcEntry>> {
        self.entries.read().iter().find(|e| e.name == name).cloned()
    }

    /// Names of all entries, in registration order
    pub fn list(&self) -> Vec<String> {
        self.entries.read().iter().map(|e| e.name.clone()).collect()
    }

    /// Open an entry by name and run its `open` hook
    pub fn open(&self, name: &str, flags: OpenFlags) -> FsResult<OpenFile> {
        let entry = self.lookup(name).ok_or(FsError::NotFound)?;
        let mut file = OpenFile::new(Arc::clone(&entry.ops), flags);
        entry.ops.open(&mut file)?;
        Ok(file)
    }

    /// Open by absolute path, e.g. `/proc/yeo14`
    pub fn open_path(&self, path: &str, flags: OpenFlags) -> FsResult<OpenFile> {
        let (parent, name) = split_path(path);
        if parent != PROC_ROOT {
            return Err(FsError::NotFound);
        }
        self.open(name, flags)
    }
}

static PROC_ROOT_REGISTRY: ProcRegistry = ProcRegistry::new();

/// The system-wide proc root
pub fn proc_root() -> &'static ProcRegistry {
    &PROC_ROOT_REGISTRY
}
