//! Echo Pseudo-File Driver
//!
//! `/proc/yeo14` keeps the last message written to it and hands it back to
//! readers as one line. Load order: the buffer is allocated before the name
//! is published, and the name is withdrawn before the buffer is freed.

pub mod buffer;
pub mod seq;
mod write;

use crate::config::EchoConfig;
use crate::fs::proc::seq_file::{seq_lseek, seq_open, seq_read, seq_release};
use crate::fs::proc::{proc_root, ProcEntry, ProcRegistry};
use crate::fs::vfs::file::{FileOps, OpenFile, Whence};
use crate::fs::vfs::inode::FsResult;
use crate::uaccess::UserSlice;
use alloc::sync::Arc;
use alloc::vec::Vec;
use buffer::EchoBuffer;
use seq::EchoSeq;
use spin::Mutex;

/// Module descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: &'static str,
    pub author: &'static str,
    pub license: &'static str,
}

pub const MODULE_INFO: ModuleInfo = ModuleInfo {
    name: "yeo14",
    author: "byyeo14",
    license: "GPL",
};

/// Driver state: the echo buffer behind one lock
pub struct EchoDevice {
    config: EchoConfig,
    buffer: Mutex<EchoBuffer>,
}

impl EchoDevice {
    /// Allocate the buffer; fails with `OutOfMemory` if it cannot be had
    pub fn new(config: EchoConfig) -> FsResult<Self> {
        config.validate()?;
        let buffer = EchoBuffer::try_new(config.capacity)?;
        Ok(Self {
            config,
            buffer: Mutex::new(buffer),
        })
    }

    pub fn config(&self) -> &EchoConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Length of the stored message
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Copy of the stored message
    pub fn contents(&self) -> Vec<u8> {
        self.with_contents(|text| text.to_vec())
    }

    /// Run `f` on the stored message while holding the buffer lock
    pub fn with_contents<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let buffer = self.buffer.lock();
        f(buffer.contents())
    }

    fn store(&self, bytes: &[u8]) -> usize {
        self.buffer.lock().replace(bytes)
    }
}

/// File operations published under the proc name
struct EchoFileOps {
    device: Arc<EchoDevice>,
}

impl FileOps for EchoFileOps {
    fn open(&self, file: &mut OpenFile) -> FsResult<()> {
        seq_open(file, EchoSeq::new(Arc::clone(&self.device)))
    }

    fn read(&self, file: &mut OpenFile, dst: &mut [u8]) -> FsResult<usize> {
        seq_read::<EchoSeq>(file, dst)
    }

    fn write(&self, _file: &mut OpenFile, src: &UserSlice<'_>) -> FsResult<usize> {
        self.device.write_from_user(src)
    }

    fn llseek(&self, file: &mut OpenFile, offset: i64, whence: Whence) -> FsResult<u64> {
        seq_lseek::<EchoSeq>(file, offset, whence)
    }

    fn release(&self, file: &mut OpenFile) -> FsResult<()> {
        seq_release::<EchoSeq>(file)
    }
}

/// A loaded instance of the driver
///
/// Dropping a loaded module unloads it.
pub struct EchoModule<'r> {
    registry: &'r ProcRegistry,
    device: Arc<EchoDevice>,
    entry: Arc<ProcEntry>,
    loaded: bool,
}

impl EchoModule<'static> {
    /// Load with the default name and capacity into the system proc root
    pub fn load() -> FsResult<Self> {
        Self::init(proc_root(), EchoConfig::default())
    }
}

impl<'r> EchoModule<'r> {
    /// Allocate the buffer, then publish the proc entry
    pub fn init(registry: &'r ProcRegistry, config: EchoConfig) -> FsResult<Self> {
        let device = match EchoDevice::new(config) {
            Ok(device) => Arc::new(device),
            Err(e) => {
                crate::log_error!("ECHO", "cannot allocate {} byte buffer: {}", config.capacity, e);
                return Err(e);
            }
        };

        let ops = Arc::new(EchoFileOps {
            device: Arc::clone(&device),
        });
        let entry = registry.proc_create(config.name, 0, ops)?;

        crate::log_info!(
            "ECHO",
            "{} loaded ({}, {}), /proc/{} holds {} bytes",
            MODULE_INFO.name,
            MODULE_INFO.author,
            MODULE_INFO.license,
            config.name,
            config.capacity
        );

        Ok(Self {
            registry,
            device,
            entry,
            loaded: true,
        })
    }

    pub fn info(&self) -> &'static ModuleInfo {
        &MODULE_INFO
    }

    pub fn device(&self) -> &Arc<EchoDevice> {
        &self.device
    }

    pub fn entry(&self) -> &Arc<ProcEntry> {
        &self.entry
    }

    /// Withdraw the proc entry, then release the buffer
    ///
    /// Files still open keep the buffer alive until they are closed.
    pub fn exit(mut self) -> FsResult<()> {
        self.unload()
    }

    fn unload(&mut self) -> FsResult<()> {
        if !self.loaded {
            return Ok(());
        }
        self.loaded = false;
        self.registry.remove_proc_entry(self.entry.name())?;
        crate::log_info!("ECHO", "{} unloaded", MODULE_INFO.name);
        Ok(())
    }
}

impl Drop for EchoModule<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.unload() {
            crate::log_warn!("ECHO", "unload of /proc/{} failed: {}", self.entry.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::vfs::file::OpenFlags;
    use crate::fs::vfs::inode::FsError;
    use crate::uaccess::{UserAddressSpace, UserPtr};

    fn write_str(registry: &ProcRegistry, name: &str, text: &[u8]) -> FsResult<usize> {
        let mut space = UserAddressSpace::new();
        let ptr = if text.is_empty() {
            UserPtr::new(0x1000)
        } else {
            space.map(0x1000, text).unwrap()
        };
        let mut file = registry.open(name, OpenFlags::O_WRONLY)?;
        file.write(&UserSlice::new(&space, ptr, text.len()))
    }

    fn read_once(file: &mut OpenFile) -> Vec<u8> {
        let mut buf = [0u8; 1024];
        let n = file.read(&mut buf).unwrap();
        buf[..n].to_vec()
    }

    #[test]
    fn test_module_info() {
        assert_eq!(MODULE_INFO.author, "byyeo14");
        assert_eq!(MODULE_INFO.license, "GPL");
    }

    #[test]
    fn test_round_trip() {
        let registry = ProcRegistry::new();
        let module = EchoModule::init(&registry, EchoConfig::default()).unwrap();

        assert_eq!(write_str(&registry, "yeo14", b"hello"), Ok(5));
        let mut file = registry.open("yeo14", OpenFlags::O_RDONLY).unwrap();
        assert_eq!(read_once(&mut file), b"hello\n");
        assert_eq!(read_once(&mut file), b"");

        drop(file);
        module.exit().unwrap();
    }

    #[test]
    fn test_entry_is_world_readable_file() {
        let registry = ProcRegistry::new();
        let module = EchoModule::init(&registry, EchoConfig::default()).unwrap();
        let mode = module.entry().mode();
        assert!(mode.is_regular());
        assert_eq!(mode.permissions(), 0o444);
    }

    #[test]
    fn test_exit_deregisters() {
        let registry = ProcRegistry::new();
        let module = EchoModule::init(&registry, EchoConfig::default()).unwrap();
        module.exit().unwrap();
        assert!(registry.lookup("yeo14").is_none());
        assert_eq!(
            registry.open("yeo14", OpenFlags::O_RDONLY).unwrap_err(),
            FsError::NotFound
        );
    }

    #[test]
    fn test_drop_deregisters() {
        let registry = ProcRegistry::new();
        {
            let _module = EchoModule::init(&registry, EchoConfig::default()).unwrap();
            assert!(registry.lookup("yeo14").is_some());
        }
        assert!(registry.lookup("yeo14").is_none());
    }

    #[test]
    fn test_second_instance_same_name_fails() {
        let registry = ProcRegistry::new();
        let _first = EchoModule::init(&registry, EchoConfig::default()).unwrap();
        assert_eq!(
            EchoModule::init(&registry, EchoConfig::default()).err(),
            Some(FsError::AlreadyExists)
        );
        // The failed load must not have withdrawn the first entry
        assert!(registry.lookup("yeo14").is_some());
    }

    #[test]
    fn test_bad_capacity_registers_nothing() {
        let registry = ProcRegistry::new();
        assert_eq!(
            EchoModule::init(&registry, EchoConfig::new("yeo14", 0)).err(),
            Some(FsError::InvalidArgument)
        );
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_open_file_outlives_unload() {
        let registry = ProcRegistry::new();
        let module = EchoModule::init(&registry, EchoConfig::default()).unwrap();
        write_str(&registry, "yeo14", b"still here").unwrap();

        let mut file = registry.open("yeo14", OpenFlags::O_RDONLY).unwrap();
        module.exit().unwrap();
        assert_eq!(read_once(&mut file), b"still here\n");
    }
}
