use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};

use bytes::BufMut;
use tracing::debug;

use crate::storage::disk::manager::Manager;

pub type Lsn = u32;

pub const INVALID_LSN: Lsn = Lsn::MAX;

struct LogBuffer {
    buf: Vec<u8>,
    last_lsn: Option<Lsn>,
}

/// Buffers log records in memory and flushes them through the disk pager on
/// demand. The buffer pool calls `flush` before writing any dirty page, so
/// a record is always durable before the data it describes.
///
/// Record framing: `total_len: u32 | lsn: u32 | payload | crc32(lsn, payload)`,
/// all little-endian; `total_len` counts everything after itself.
pub struct LogManager {
    disk: Arc<Manager>,
    buffer: Mutex<LogBuffer>,
    next_lsn: AtomicU32,
    // INVALID_LSN until the first flush lands.
    persistent_lsn: AtomicU32,
}

impl LogManager {
    pub fn new(disk: Arc<Manager>) -> Self {
        Self {
            disk,
            buffer: Mutex::new(LogBuffer {
                buf: Vec::new(),
                last_lsn: None,
            }),
            next_lsn: AtomicU32::new(0),
            persistent_lsn: AtomicU32::new(INVALID_LSN),
        }
    }

    /// Frames `payload` as a record, appends it to the in-memory buffer and
    /// returns its sequence number. Nothing touches disk until `flush`.
    pub fn append_record(&self, payload: &[u8]) -> Lsn {
        let mut buffer = self.buffer.lock().unwrap();
        let lsn = self.next_lsn.fetch_add(1, Ordering::Relaxed);

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&lsn.to_le_bytes());
        hasher.update(payload);
        let checksum = hasher.finalize();

        let total_len = (4 + payload.len() + 4) as u32;
        buffer.buf.put_u32_le(total_len);
        buffer.buf.put_u32_le(lsn);
        buffer.buf.put_slice(payload);
        buffer.buf.put_u32_le(checksum);
        buffer.last_lsn = Some(lsn);

        lsn
    }

    /// Writes all buffered records to the log file and fsyncs (inside the
    /// pager) before returning. Serial with other flushes.
    pub fn flush(&self) {
        let mut buffer = self.buffer.lock().unwrap();
        if buffer.buf.is_empty() {
            return;
        }

        self.disk.write_log(&buffer.buf);
        if let Some(lsn) = buffer.last_lsn {
            self.persistent_lsn.store(lsn, Ordering::Release);
        }

        debug!(
            bytes = buffer.buf.len(),
            last_lsn = ?buffer.last_lsn,
            "log buffer flushed"
        );
        buffer.buf.clear();
    }

    pub fn next_lsn(&self) -> Lsn {
        self.next_lsn.load(Ordering::Relaxed)
    }

    /// Highest sequence number known durable, or `None` before any flush.
    pub fn persistent_lsn(&self) -> Option<Lsn> {
        match self.persistent_lsn.load(Ordering::Acquire) {
            INVALID_LSN => None,
            lsn => Some(lsn),
        }
    }
}
