use std::{path::Path, sync::Arc};

use crate::{
    buffer::buffer_pool_manager::BufferPoolManager,
    recovery::log_manager::LogManager,
    storage::disk::manager::{DiskResult, Manager},
};

/// Outer lifetime for the storage stack. Owns the pager, the log manager
/// and the buffer pool; the pool holds a reference to the log manager and
/// nothing points back. Pool size and file paths come from the caller —
/// this layer reads no configuration of its own.
pub struct StorageEngine {
    disk: Arc<Manager>,
    log_manager: Arc<LogManager>,
    bpm: Arc<BufferPoolManager>,
}

impl StorageEngine {
    pub fn open(db_path: impl AsRef<Path>, pool_size: usize) -> DiskResult<Self> {
        let disk = Arc::new(Manager::open(db_path)?);
        let log_manager = Arc::new(LogManager::new(Arc::clone(&disk)));
        let bpm = Arc::new(BufferPoolManager::new(
            pool_size,
            Arc::clone(&disk),
            Arc::clone(&log_manager),
        ));

        Ok(Self {
            disk,
            log_manager,
            bpm,
        })
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPoolManager> {
        &self.bpm
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.log_manager
    }

    pub fn disk_manager(&self) -> &Arc<Manager> {
        &self.disk
    }

    /// Pushes every dirty page (and the log records covering them) to disk,
    /// then flushes the files themselves.
    pub fn shut_down(&self) {
        self.bpm.flush_all_dirty_pages();
        self.disk.shut_down();
    }
}
