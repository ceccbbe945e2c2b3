//! End-to-end behaviour of /proc/yeo14
//!
//! Drives the driver the way user space does: open the proc entry, write a
//! message from a mapped user buffer, read it back through the seq layer.

use mellos_echo::config::{EchoConfig, ECHO_BUF_SIZE, MAX_ECHO_CAPACITY, PROC_NAME};
use mellos_echo::fs::proc::ProcRegistry;
use mellos_echo::fs::vfs::{FsError, OpenFile, OpenFlags, Whence};
use mellos_echo::uaccess::{UserAddressSpace, UserPtr, UserSlice};
use mellos_echo::EchoModule;

const USER_BASE: u64 = 0x40_0000;

fn write_bytes(registry: &ProcRegistry, data: &[u8]) -> Result<usize, FsError> {
    let mut space = UserAddressSpace::new();
    let ptr = if data.is_empty() {
        UserPtr::new(USER_BASE)
    } else {
        space.map(USER_BASE, data).unwrap()
    };
    let mut file = registry
        .open_path("/proc/yeo14", OpenFlags::O_WRONLY)
        .unwrap();
    file.write(&UserSlice::new(&space, ptr, data.len()))
}

fn read_call(file: &mut OpenFile, size: usize) -> Vec<u8> {
    let mut buf = vec![0u8; size];
    let n = file.read(&mut buf).unwrap();
    buf.truncate(n);
    buf
}

/// Read until end-of-data with `chunk`-sized calls
fn read_to_end(file: &mut OpenFile, chunk: usize) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let part = read_call(file, chunk);
        if part.is_empty() {
            return out;
        }
        out.extend_from_slice(&part);
    }
}

fn open_reader(registry: &ProcRegistry) -> OpenFile {
    registry
        .open_path("/proc/yeo14", OpenFlags::O_RDONLY)
        .unwrap()
}

fn loaded() -> (ProcRegistry, EchoConfig) {
    (ProcRegistry::new(), EchoConfig::default())
}

#[test]
fn test_write_then_read_round_trip() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();

    assert_eq!(write_bytes(&registry, b"hello"), Ok(5));
    let mut file = open_reader(&registry);
    assert_eq!(read_to_end(&mut file, 4096), b"hello\n");
}

#[test]
fn test_truncation_boundary() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();

    let data: Vec<u8> = (0..600u32).map(|i| b'a' + (i % 26) as u8).collect();
    assert_eq!(write_bytes(&registry, &data), Ok(ECHO_BUF_SIZE));

    let mut file = open_reader(&registry);
    let line = read_to_end(&mut file, 4096);
    assert_eq!(line.len(), ECHO_BUF_SIZE + 1);
    assert_eq!(&line[..ECHO_BUF_SIZE], &data[..ECHO_BUF_SIZE]);
    assert_eq!(line[ECHO_BUF_SIZE], b'\n');
}

#[test]
fn test_single_record_exhaustion() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();
    write_bytes(&registry, b"once").unwrap();

    let mut file = open_reader(&registry);
    assert_eq!(read_call(&mut file, 4096), b"once\n");
    for _ in 0..5 {
        assert!(read_call(&mut file, 4096).is_empty());
    }
}

#[test]
fn test_reopen_resets_sequence() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();
    write_bytes(&registry, b"again").unwrap();

    for _ in 0..3 {
        let mut file = open_reader(&registry);
        assert_eq!(read_call(&mut file, 4096), b"again\n");
        assert!(read_call(&mut file, 4096).is_empty());
        assert!(read_call(&mut file, 4096).is_empty());
        file.close().unwrap();
    }
}

#[test]
fn test_idempotent_overwrite() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();

    write_bytes(&registry, b"same").unwrap();
    let first = read_to_end(&mut open_reader(&registry), 4096);
    write_bytes(&registry, b"same").unwrap();
    let second = read_to_end(&mut open_reader(&registry), 4096);
    assert_eq!(first, second);
    assert_eq!(first, b"same\n");
}

#[test]
fn test_zero_length_write_clears_buffer() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();

    write_bytes(&registry, b"previous").unwrap();
    assert_eq!(write_bytes(&registry, b""), Ok(0));
    assert_eq!(read_to_end(&mut open_reader(&registry), 4096), b"\n");
}

#[test]
fn test_shorter_write_leaves_no_stale_tail() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();

    write_bytes(&registry, b"a much longer message").unwrap();
    write_bytes(&registry, b"short").unwrap();
    assert_eq!(read_to_end(&mut open_reader(&registry), 4096), b"short\n");
}

#[test]
fn test_copy_fault_returns_efault() {
    let (registry, config) = loaded();
    let module = EchoModule::init(&registry, config).unwrap();
    write_bytes(&registry, b"intact").unwrap();

    let space = UserAddressSpace::new();
    let mut file = registry.open(PROC_NAME, OpenFlags::O_WRONLY).unwrap();
    let err = file
        .write(&UserSlice::new(&space, UserPtr::new(USER_BASE), 6))
        .unwrap_err();
    assert_eq!(err, FsError::BadAddress);
    assert_eq!(err.to_errno(), -14);

    assert_eq!(module.device().contents(), b"intact");
    assert_eq!(read_to_end(&mut open_reader(&registry), 4096), b"intact\n");
}

#[test]
fn test_small_reads_return_one_line() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();
    write_bytes(&registry, b"chunked reader").unwrap();

    for chunk in [1, 3, 7, 15] {
        let mut file = open_reader(&registry);
        assert_eq!(read_to_end(&mut file, chunk), b"chunked reader\n");
        assert!(read_call(&mut file, chunk).is_empty());
    }
}

#[test]
fn test_snapshot_taken_at_first_step() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();
    write_bytes(&registry, b"before").unwrap();

    let mut file = open_reader(&registry);
    assert_eq!(read_call(&mut file, 2), b"be");
    write_bytes(&registry, b"after!").unwrap();
    assert_eq!(read_to_end(&mut file, 2), b"fore\n");
}

#[test]
fn test_rewind_allows_one_more_line() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();
    write_bytes(&registry, b"rewind").unwrap();

    let mut file = open_reader(&registry);
    assert_eq!(read_to_end(&mut file, 4096), b"rewind\n");
    assert_eq!(file.seek(0, Whence::Set), Ok(0));
    assert_eq!(file.pos(), 0);
    assert_eq!(read_to_end(&mut file, 4096), b"rewind\n");

    assert_eq!(file.seek(3, Whence::Set), Ok(3));
    assert_eq!(read_to_end(&mut file, 4096), b"ind\n");
    assert_eq!(file.seek(0, Whence::End), Err(FsError::InvalidArgument));
}

#[test]
fn test_access_mode_enforced() {
    let (registry, config) = loaded();
    let _module = EchoModule::init(&registry, config).unwrap();

    let mut reader = open_reader(&registry);
    let space = UserAddressSpace::new();
    assert_eq!(
        reader.write(&UserSlice::new(&space, UserPtr::new(USER_BASE), 0)),
        Err(FsError::BadFileDescriptor)
    );

    let mut writer = registry.open(PROC_NAME, OpenFlags::O_WRONLY).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(writer.read(&mut buf), Err(FsError::BadFileDescriptor));

    let mut both = registry.open(PROC_NAME, OpenFlags::O_RDWR).unwrap();
    let mut space = UserAddressSpace::new();
    let ptr = space.map(USER_BASE, b"rw").unwrap();
    assert_eq!(both.write(&UserSlice::new(&space, ptr, 2)), Ok(2));
    assert_eq!(read_to_end(&mut both, 16), b"rw\n");
}

#[test]
fn test_restart_starts_empty() {
    let (registry, config) = loaded();
    let module = EchoModule::init(&registry, config).unwrap();
    write_bytes(&registry, b"gone after unload").unwrap();
    module.exit().unwrap();
    assert!(registry.lookup(PROC_NAME).is_none());

    let _module = EchoModule::init(&registry, config).unwrap();
    assert_eq!(read_to_end(&mut open_reader(&registry), 4096), b"\n");
}

#[test]
fn test_instances_are_independent() {
    let registry = ProcRegistry::new();
    let _a = EchoModule::init(&registry, EchoConfig::new("echo_a", 8)).unwrap();
    let b = EchoModule::init(&registry, EchoConfig::new("echo_b", 8)).unwrap();

    let mut space = UserAddressSpace::new();
    let message = b"only in a, truncated";
    let ptr = space.map(USER_BASE, message).unwrap();
    let mut file = registry.open("echo_a", OpenFlags::O_WRONLY).unwrap();
    assert_eq!(
        file.write(&UserSlice::new(&space, ptr, message.len())),
        Ok(8)
    );

    assert!(b.device().is_empty());
    let mut reader = registry.open("echo_a", OpenFlags::O_RDONLY).unwrap();
    assert_eq!(read_to_end(&mut reader, 64), b"only in \n");
    assert_eq!(registry.list(), vec!["echo_a".to_string(), "echo_b".to_string()]);
}

#[test]
fn test_load_into_system_proc_root() {
    let module = EchoModule::load().unwrap();
    assert_eq!(module.entry().name(), "yeo14");
    assert!(mellos_echo::fs::proc::proc_root().lookup("yeo14").is_some());
    module.exit().unwrap();
    assert!(mellos_echo::fs::proc::proc_root().lookup("yeo14").is_none());
}

#[test]
fn test_largest_capacity_stays_readable() {
    let registry = ProcRegistry::new();
    let config = EchoConfig::new("big", MAX_ECHO_CAPACITY);
    let _module = EchoModule::init(&registry, config).unwrap();

    let data = vec![b'q'; MAX_ECHO_CAPACITY];
    let mut space = UserAddressSpace::new();
    let ptr = space.map(USER_BASE, &data).unwrap();
    let mut file = registry.open("big", OpenFlags::O_WRONLY).unwrap();
    assert_eq!(
        file.write(&UserSlice::new(&space, ptr, data.len())),
        Ok(MAX_ECHO_CAPACITY)
    );

    let mut reader = registry.open("big", OpenFlags::O_RDONLY).unwrap();
    let line = read_to_end(&mut reader, 64 * 1024);
    assert_eq!(line.len(), MAX_ECHO_CAPACITY + 1);
    assert_eq!(line.last(), Some(&b'\n'));

    assert_eq!(
        EchoModule::init(&registry, EchoConfig::new("bigger", MAX_ECHO_CAPACITY + 1)).err(),
        Some(FsError::InvalidArgument)
    );
    assert!(registry.lookup("bigger").is_none());
}
