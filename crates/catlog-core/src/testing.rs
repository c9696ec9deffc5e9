//! Test support utilities.
//!
//! `SharedBuffer` is an in-memory primary stream whose contents stay
//! readable after it has been handed to a logger.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// A cloneable in-memory writer; every clone sees the same bytes.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Written lines, split on the CRLF terminator.
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .split_terminator("\r\n")
            .map(str::to_string)
            .collect()
    }

    /// Discard everything written so far.
    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
