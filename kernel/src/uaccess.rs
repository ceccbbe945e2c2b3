//! User Space Access
//!
//! Validated copy-in from a caller's address space. Every transfer checks
//! that the source range is canonical, lies below `USER_LIMIT` and is backed
//! by mapped memory before a single byte is read.

use crate::config::USER_LIMIT;
use crate::fs::vfs::inode::FsError;
use alloc::vec::Vec;
use core::fmt;
use x86_64::VirtAddr;

/// Errors raised while touching user memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAccessError {
    /// Pointer is null, non-canonical or outside user space
    InvalidPointer,
    /// Address range wraps around
    Overflow,
    /// Part of the range is not mapped
    PageNotPresent,
}

impl fmt::Display for UserAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPointer => write!(f, "invalid user pointer"),
            Self::Overflow => write!(f, "user range overflow"),
            Self::PageNotPresent => write!(f, "user page not present"),
        }
    }
}

impl From<UserAccessError> for FsError {
    fn from(_: UserAccessError) -> Self {
        FsError::BadAddress
    }
}

/// An address in a caller's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPtr(u64);

impl UserPtr {
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub const fn addr(&self) -> u64 {
        self.0
    }
}

/// Memory a copy-in can read from
///
/// Implementations report unmapped ranges instead of faulting.
pub trait UserMemory {
    /// Fill `dst` from `addr..addr + dst.len()`
    fn read_user(&self, addr: u64, dst: &mut [u8]) -> Result<(), UserAccessError>;
}

/// Check that `[ptr, ptr + len)` is a non-null, canonical user range
pub fn check_user_range(ptr: UserPtr, len: usize) -> Result<(), UserAccessError> {
    let start = ptr.addr();
    if start == 0 {
        return Err(UserAccessError::InvalidPointer);
    }
    let end = start
        .checked_add(len as u64)
        .ok_or(UserAccessError::Overflow)?;

    if VirtAddr::try_new(start).is_err() || start >= USER_LIMIT || end > USER_LIMIT {
        return Err(UserAccessError::InvalidPointer);
    }
    Ok(())
}

/// Copy data from user space to kernel space
///
/// # Arguments
/// * `mem` - Caller address space
/// * `dst` - Destination kernel buffer
/// * `src` - Source user pointer
/// * `len` - Number of bytes to copy
///
/// # Returns
/// Ok(()) on success, Err on invalid pointer or unmapped source
pub fn copy_from_user(
    mem: &dyn UserMemory,
    dst: &mut [u8],
    src: UserPtr,
    len: usize,
) -> Result<(), UserAccessError> {
    if len > dst.len() {
        return Err(UserAccessError::Overflow);
    }
    if len == 0 {
        return Ok(());
    }
    check_user_range(src, len)?;
    mem.read_user(src.addr(), &mut dst[..len])
}

/// A `(pointer, length)` pair handed in by a write call
#[derive(Clone, Copy)]
pub struct UserSlice<'a> {
    mem: &'a dyn UserMemory,
    ptr: UserPtr,
    len: usize,
}

impl<'a> UserSlice<'a> {
    pub fn new(mem: &'a dyn UserMemory, ptr: UserPtr, len: usize) -> Self {
        Self { mem, ptr, len }
    }

    /// Length the caller asked to transfer
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ptr(&self) -> UserPtr {
        self.ptr
    }

    /// Copy the first `dst.len()` bytes of the slice into `dst`
    pub fn copy_prefix(&self, dst: &mut [u8]) -> Result<(), UserAccessError> {
        if dst.len() > self.len {
            return Err(UserAccessError::Overflow);
        }
        let len = dst.len();
        copy_from_user(self.mem, dst, self.ptr, len)
    }
}

impl fmt::Debug for UserSlice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSlice")
            .field("ptr", &format_args!("{:#x}", self.ptr.addr()))
            .field("len", &self.len)
            .finish()
    }
}

/// One mapped region of a user address space
struct Region {
    base: u64,
    data: Vec<u8>,
}

impl Region {
    fn end(&self) -> u64 {
        self.base + self.data.len() as u64
    }

    fn contains(&self, addr: u64) -> bool {
        addr >= self.base && addr < self.end()
    }
}

/// A process address space made of byte regions
///
/// A read may cross from one region into the next; reads spanning an
/// unmapped gap fail with `PageNotPresent`, the way a copy-in would fault
/// on a missing page.
#[derive(Default)]
pub struct UserAddressSpace {
    regions: Vec<Region>,
}

impl UserAddressSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `data` at `base` and return a pointer to its first byte
    pub fn map(&mut self, base: u64, data: &[u8]) -> Result<UserPtr, UserAccessError> {
        let ptr = UserPtr::new(base);
        check_user_range(ptr, data.len())?;

        let end = base + data.len() as u64;
        if self
            .regions
            .iter()
            .any(|r| base < r.end() && r.base < end)
        {
            return Err(UserAccessError::InvalidPointer);
        }

        self.regions.push(Region {
            base,
            data: data.to_vec(),
        });
        Ok(ptr)
    }

    /// Drop the region starting at `base`
    pub fn unmap(&mut self, base: u64) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r.base != base);
        self.regions.len() != before
    }
}

impl UserMemory for UserAddressSpace {
    fn read_user(&self, addr: u64, dst: &mut [u8]) -> Result<(), UserAccessError> {
        let mut done = 0;
        while done < dst.len() {
            let cur = addr
                .checked_add(done as u64)
                .ok_or(UserAccessError::Overflow)?;
            let region = self
                .regions
                .iter()
                .find(|r| r.contains(cur))
                .ok_or(UserAccessError::PageNotPresent)?;
            let offset = (cur - region.base) as usize;
            let n = core::cmp::min(dst.len() - done, region.data.len() - offset);
            dst[done..done + n].copy_from_slice(&region.data[offset..offset + n]);
            done += n;
        }
        Ok(())
    }
}
