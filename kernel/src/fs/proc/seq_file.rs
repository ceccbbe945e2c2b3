//! Sequence Files
//!
//! Buffered, restartable reads over a record iterator. A driver describes
//! its records with `SeqOperations` (start / next / show / stop); the
//! helpers here turn any number of `read` and `lseek` calls into passes over
//! those records:
//!
//! - a record is rendered whole into a private buffer, then handed out in
//!   as many reads as the caller needs; a record is never rendered twice in
//!   one pass
//! - a record that does not fit doubles the buffer and is rendered again
//! - a read at position 0, or a seek, restarts the pass

use crate::config::{SEQ_BUF_INITIAL, SEQ_BUF_MAX};
use crate::fs::vfs::file::{OpenFile, Whence};
use crate::fs::vfs::inode::{FsError, FsResult};
use alloc::vec::Vec;
use core::fmt;

/// Record iterator driven by the seq read loop
///
/// `pos` is the record index of the pass. `start` is called with the index
/// of the first record still to emit and returns None when there is
/// nothing left; `next` must advance `pos` whatever it returns.
pub trait SeqOperations: Send + 'static {
    /// Per-pass iteration token
    type Cursor;

    fn start(&mut self, pos: &mut u64) -> Option<Self::Cursor>;

    fn next(&mut self, cursor: Self::Cursor, pos: &mut u64) -> Option<Self::Cursor>;

    /// Render one record into `out`
    fn show(&mut self, out: &mut SeqBuf, cursor: &Self::Cursor) -> FsResult<()>;

    fn stop(&mut self, cursor: Option<Self::Cursor>);
}

/// Output buffer a record is rendered into
///
/// Writes past the end mark the buffer overflowed instead of failing; the
/// read loop then retries the record with a larger buffer.
pub struct SeqBuf {
    data: Vec<u8>,
    count: usize,
}

impl SeqBuf {
    fn empty() -> Self {
        Self {
            data: Vec::new(),
            count: 0,
        }
    }

    fn alloc(size: usize) -> FsResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| FsError::OutOfMemory)?;
        data.resize(size, 0);
        Ok(Self { data, count: 0 })
    }

    /// Buffer size
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Bytes rendered so far
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn has_overflowed(&self) -> bool {
        self.count == self.size()
    }

    fn set_overflow(&mut self) {
        self.count = self.size();
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.count + bytes.len() < self.size() {
            self.data[self.count..self.count + bytes.len()].copy_from_slice(bytes);
            self.count += bytes.len();
        } else {
            self.set_overflow();
        }
    }

    pub fn putc(&mut self, byte: u8) {
        self.write_bytes(&[byte]);
    }

    pub fn printf(&mut self, args: fmt::Arguments<'_>) {
        use core::fmt::Write;
        let _ = self.write_fmt(args);
    }
}

impl fmt::Write for SeqBuf {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// Per-open state of a sequence file
pub struct SeqFile<S: SeqOperations> {
    ops: S,
    buf: SeqBuf,
    /// Start of unread data in `buf`
    from: usize,
    /// Record index of the pass
    index: u64,
    /// File position `buf` corresponds to
    read_pos: u64,
}

impl<S: SeqOperations> SeqFile<S> {
    pub fn new(ops: S) -> Self {
        Self {
            ops,
            buf: SeqBuf::empty(),
            from: 0,
            index: 0,
            read_pos: 0,
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.from = 0;
        self.buf.count = 0;
    }

    fn grow(&mut self) -> FsResult<()> {
        let size = if self.buf.size() == 0 {
            SEQ_BUF_INITIAL
        } else {
            self.buf.size() * 2
        };
        if size > SEQ_BUF_MAX {
            return Err(FsError::OutOfMemory);
        }
        self.buf = SeqBuf::alloc(size)?;
        Ok(())
    }

    /// Hand out pending bytes, return how many were copied
    fn drain(&mut self, dst: &mut [u8]) -> usize {
        let n = core::cmp::min(self.buf.count, dst.len());
        dst[..n].copy_from_slice(&self.buf.data[self.from..self.from + n]);
        self.buf.count -= n;
        self.from += n;
        n
    }

    /// Replay records from the start until `offset` bytes are consumed
    fn traverse(&mut self, offset: u64) -> FsResult<()> {
        self.reset();
        if offset == 0 {
            return Ok(());
        }
        if self.buf.size() == 0 {
            self.grow()?;
        }

        'retry: loop {
            self.reset();
            let mut pos = 0u64;
            let mut p = self.ops.start(&mut self.index);
            while let Some(cursor) = p {
                if let Err(e) = self.ops.show(&mut self.buf, &cursor) {
                    self.ops.stop(Some(cursor));
                    return Err(e);
                }
                if self.buf.has_overflowed() {
                    self.ops.stop(Some(cursor));
                    self.grow()?;
                    continue 'retry;
                }
                p = self.ops.next(cursor, &mut self.index);
                let count = self.buf.count as u64;
                if pos + count > offset {
                    self.from = (offset - pos) as usize;
                    self.buf.count -= self.from;
                    break;
                }
                pos += count;
                self.buf.count = 0;
                if pos == offset {
                    break;
                }
            }
            self.ops.stop(p);
            return Ok(());
        }
    }

    /// Read the sequence at `*ppos` into `dst`
    pub fn read(&mut self, dst: &mut [u8], ppos: &mut u64) -> FsResult<usize> {
        if dst.is_empty() {
            return Ok(0);
        }

        if *ppos == 0 {
            self.reset();
            self.read_pos = 0;
        }

        if *ppos != self.read_pos {
            if let Err(e) = self.traverse(*ppos) {
                self.reset();
                self.read_pos = 0;
                return Err(e);
            }
            self.read_pos = *ppos;
        }

        if self.buf.size() == 0 {
            self.grow()?;
        }

        let mut copied = 0;
        if self.buf.count > 0 {
            copied = self.drain(dst);
            if self.buf.count > 0 {
                return Ok(self.finish(copied, ppos));
            }
        }

        // Render the next non-empty record
        self.from = 0;
        let mut p = self.ops.start(&mut self.index);
        let mut cursor = loop {
            let Some(cursor) = p else {
                self.ops.stop(None);
                self.buf.count = 0;
                return Ok(self.finish(copied, ppos));
            };
            if let Err(e) = self.ops.show(&mut self.buf, &cursor) {
                self.ops.stop(Some(cursor));
                self.buf.count = 0;
                if copied > 0 {
                    return Ok(self.finish(copied, ppos));
                }
                return Err(e);
            }
            if self.buf.count == 0 {
                p = self.ops.next(cursor, &mut self.index);
                continue;
            }
            if !self.buf.has_overflowed() {
                break cursor;
            }
            self.ops.stop(Some(cursor));
            self.buf.count = 0;
            if let Err(e) = self.grow() {
                if copied > 0 {
                    return Ok(self.finish(copied, ppos));
                }
                return Err(e);
            }
            p = self.ops.start(&mut self.index);
        };

        // Fit more records while the caller has room, advancing once per
        // record shown
        let want = dst.len() - copied;
        let last = loop {
            let offs = self.buf.count;
            let before = self.index;
            let p = self.ops.next(cursor, &mut self.index);
            if self.index == before {
                crate::log_warn!("SEQ", "next() did not advance the position");
                self.index += 1;
            }
            let Some(next) = p else {
                break None;
            };
            if self.buf.count >= want {
                break Some(next);
            }
            let shown = self.ops.show(&mut self.buf, &next);
            if shown.is_err() || self.buf.has_overflowed() {
                self.buf.count = offs;
                break Some(next);
            }
            cursor = next;
        };
        self.ops.stop(last);

        let n = self.drain(&mut dst[copied..]);
        copied += n;
        Ok(self.finish(copied, ppos))
    }

    fn finish(&mut self, copied: usize, ppos: &mut u64) -> usize {
        *ppos += copied as u64;
        self.read_pos += copied as u64;
        copied
    }

    /// Reposition; returns the new file position
    pub fn lseek(&mut self, offset: i64, whence: Whence, ppos: &mut u64) -> FsResult<u64> {
        let target = match whence {
            Whence::Set => offset,
            Whence::Cur => (*ppos as i64)
                .checked_add(offset)
                .ok_or(FsError::InvalidArgument)?,
            Whence::End => return Err(FsError::InvalidArgument),
        };
        if target < 0 {
            return Err(FsError::InvalidArgument);
        }
        let target = target as u64;

        if target != self.read_pos {
            if let Err(e) = self.traverse(target) {
                self.reset();
                self.read_pos = 0;
                *ppos = 0;
                return Err(e);
            }
            self.read_pos = target;
        }
        *ppos = target;
        Ok(target)
    }
}

/// Attach a fresh sequence to an opened file
pub fn seq_open<S: SeqOperations>(file: &mut OpenFile, ops: S) -> FsResult<()> {
    file.set_private_data(SeqFile::new(ops));
    Ok(())
}

/// `read` for files opened with `seq_open`
pub fn seq_read<S: SeqOperations>(file: &mut OpenFile, dst: &mut [u8]) -> FsResult<usize> {
    let (seq, pos) = file
        .private_data_with_pos::<SeqFile<S>>()
        .ok_or(FsError::BadFileDescriptor)?;
    seq.read(dst, pos)
}

/// `llseek` for files opened with `seq_open`
pub fn seq_lseek<S: SeqOperations>(
    file: &mut OpenFile,
    offset: i64,
    whence: Whence,
) -> FsResult<u64> {
    let (seq, pos) = file
        .private_data_with_pos::<SeqFile<S>>()
        .ok_or(FsError::BadFileDescriptor)?;
    seq.lseek(offset, whence, pos)
}

/// `release` for files opened with `seq_open`
pub fn seq_release<S: SeqOperations>(file: &mut OpenFile) -> FsResult<()> {
    file.take_private_data();
    Ok(())
}
