//! Read side: the echo buffer as a one-record sequence
//!
//! Each pass emits the stored message followed by a newline, exactly once.
//! Once the record has been emitted the pass stays exhausted until the
//! file is reopened or rewound to position 0.

use super::EchoDevice;
use crate::fs::proc::seq_file::{SeqBuf, SeqOperations};
use crate::fs::vfs::inode::FsResult;
use alloc::sync::Arc;

/// Iteration token of one pass
#[derive(Debug)]
pub struct EchoCursor {
    step: u64,
}

impl EchoCursor {
    /// 0 on the first step of a pass
    pub fn step(&self) -> u64 {
        self.step
    }
}

/// Sequence operations bound to one open file
pub struct EchoSeq {
    device: Arc<EchoDevice>,
}

impl EchoSeq {
    pub fn new(device: Arc<EchoDevice>) -> Self {
        Self { device }
    }
}

impl SeqOperations for EchoSeq {
    type Cursor = EchoCursor;

    fn start(&mut self, pos: &mut u64) -> Option<EchoCursor> {
        if *pos == 0 {
            Some(EchoCursor { step: 0 })
        } else {
            // Record already emitted in this session; leave pos alone so
            // later reads keep seeing end-of-data
            None
        }
    }

    fn next(&mut self, mut cursor: EchoCursor, pos: &mut u64) -> Option<EchoCursor> {
        cursor.step += 1;
        *pos += 1;
        crate::log_trace!("ECHO", "pass done after {} step(s)", cursor.step);
        None
    }

    fn show(&mut self, out: &mut SeqBuf, _cursor: &EchoCursor) -> FsResult<()> {
        self.device.with_contents(|text| out.write_bytes(text));
        out.putc(b'\n');
        Ok(())
    }

    fn stop(&mut self, _cursor: Option<EchoCursor>) {}
}
