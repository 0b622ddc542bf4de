use std::{
    fs::{remove_file, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use thiserror::Error;
use tracing::debug;

use crate::storage::page::{
    page_constants::{PageId, PAGE_SIZE},
    PageData,
};

#[derive(Error, Debug)]
pub enum DiskError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("read of page {page_id} at offset {offset} is past end of file")]
    ReadPastEof { page_id: PageId, offset: u64 },
}

pub type DiskResult<T> = Result<T, DiskError>;

struct DataFile {
    file: File,
    // Byte length of the data file; grows when writes extend it.
    size: u64,
    next_page_id: PageId,
    num_writes: u64,
}

struct LogFile {
    file: File,
    path: PathBuf,
    num_flushes: u64,
}

/// Disk pager. Owns the data file (fixed-size pages) and the log file
/// (opaque appended records), each behind its own mutex.
///
/// Write-path failures are fatal: once a page or log write may have landed
/// partially there is no state this layer can recover to, so it panics
/// rather than hand corruption upward.
pub struct Manager {
    data: Mutex<DataFile>,
    log: Mutex<LogFile>,
}

impl Manager {
    /// Opens (creating if absent) the data file at `db_path` and its
    /// companion log file, named by swapping the extension for `.log`.
    pub fn open(db_path: impl AsRef<Path>) -> DiskResult<Self> {
        let db_path = db_path.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(db_path)?;
        let size = file.metadata()?.len();

        let n_pages = size / PAGE_SIZE as u64;
        let next_page_id = if n_pages > 0 { n_pages as PageId + 1 } else { 0 };

        let log_path = db_path.with_extension("log");
        let log_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&log_path)?;

        Ok(Self {
            data: Mutex::new(DataFile {
                file,
                size,
                next_page_id,
                num_writes: 0,
            }),
            log: Mutex::new(LogFile {
                file: log_file,
                path: log_path,
                num_flushes: 0,
            }),
        })
    }

    /// Reads page `page_id` into `buf`. An offset beyond the current file
    /// length is an error; a short read within the file means the page was
    /// never written, so the buffer becomes a zero page.
    pub fn read_page(&self, page_id: PageId, buf: &mut PageData) -> DiskResult<()> {
        let mut data = self.data.lock().unwrap();
        let offset = page_id as u64 * PAGE_SIZE as u64;

        if offset > data.size {
            return Err(DiskError::ReadPastEof { page_id, offset });
        }

        data.file.seek(SeekFrom::Start(offset))?;
        let bytes_read = data.file.read(buf)?;
        if bytes_read < PAGE_SIZE {
            buf.fill(0);
        }

        Ok(())
    }

    /// Writes `buf` as page `page_id` and fsyncs. I/O errors and short
    /// writes are fatal.
    pub fn write_page(&self, page_id: PageId, buf: &PageData) {
        let mut data = self.data.lock().unwrap();
        Self::write_page_locked(&mut data, page_id, buf);
    }

    fn write_page_locked(data: &mut DataFile, page_id: PageId, buf: &PageData) {
        let offset = page_id as u64 * PAGE_SIZE as u64;

        data.file
            .seek(SeekFrom::Start(offset))
            .unwrap_or_else(|e| panic!("seek to page {} failed: {}", page_id, e));

        let bytes_written = data
            .file
            .write(buf)
            .unwrap_or_else(|e| panic!("write of page {} failed: {}", page_id, e));
        if bytes_written != PAGE_SIZE {
            panic!(
                "short write of page {}: {} of {} bytes",
                page_id, bytes_written, PAGE_SIZE
            );
        }

        if offset >= data.size {
            data.size = offset + bytes_written as u64;
        }
        data.num_writes += 1;

        data.file
            .sync_data()
            .unwrap_or_else(|e| panic!("fsync of data file failed: {}", e));
    }

    /// Hands out the next page id and materializes a zero page at its
    /// offset, so later reads of the id never land past EOF.
    pub fn allocate_page(&self) -> PageId {
        let mut data = self.data.lock().unwrap();

        let page_id = data.next_page_id;
        let zeroes = [0u8; PAGE_SIZE];
        Self::write_page_locked(&mut data, page_id, &zeroes);
        data.next_page_id += 1;

        page_id
    }

    /// Reserved for a future free-map; page ids are not recycled in this
    /// revision.
    pub fn deallocate_page(&self, _page_id: PageId) {}

    /// Appends `log_data` to the log file and fsyncs before returning.
    /// Append failures are fatal.
    pub fn write_log(&self, log_data: &[u8]) {
        let mut log = self.log.lock().unwrap();

        log.file
            .seek(SeekFrom::End(0))
            .unwrap_or_else(|e| panic!("seek to log end failed: {}", e));
        log.file
            .write_all(log_data)
            .unwrap_or_else(|e| panic!("log append failed: {}", e));
        log.file
            .sync_data()
            .unwrap_or_else(|e| panic!("fsync of log file failed: {}", e));

        log.num_flushes += 1;
    }

    /// Sequential log read from `offset`. Returns `Ok(None)` once the
    /// offset reaches the end of the log, otherwise the byte count read
    /// into `buf`.
    pub fn read_log(&self, buf: &mut [u8], offset: u64) -> DiskResult<Option<usize>> {
        let mut log = self.log.lock().unwrap();

        let log_size = log.file.metadata()?.len();
        if offset >= log_size {
            return Ok(None);
        }

        log.file.seek(SeekFrom::Start(offset))?;
        let bytes_read = log.file.read(buf)?;
        Ok(Some(bytes_read))
    }

    /// Truncates the log to empty by deleting and recreating it. Callers
    /// use this once the log's effects are durably in the data file.
    pub fn gc_log(&self) -> DiskResult<()> {
        let mut log = self.log.lock().unwrap();

        remove_file(&log.path)?;
        log.file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&log.path)?;

        debug!(path = %log.path.display(), "log file truncated");
        Ok(())
    }

    /// Flushes both files. Handles close when the manager is dropped.
    pub fn shut_down(&self) {
        let data = self.data.lock().unwrap();
        data.file
            .sync_all()
            .unwrap_or_else(|e| panic!("fsync of data file failed: {}", e));
        drop(data);

        let log = self.log.lock().unwrap();
        log.file
            .sync_all()
            .unwrap_or_else(|e| panic!("fsync of log file failed: {}", e));

        debug!("disk manager shut down");
    }

    pub fn size(&self) -> u64 {
        self.data.lock().unwrap().size
    }

    pub fn num_writes(&self) -> u64 {
        self.data.lock().unwrap().num_writes
    }

    pub fn num_flushes(&self) -> u64 {
        self.log.lock().unwrap().num_flushes
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn page_write_read_round_trip() {
        let dir = tempdir().unwrap();
        let manager = Manager::open(dir.path().join("test.db")).unwrap();

        let page_id = manager.allocate_page();
        let data = [7u8; PAGE_SIZE];
        manager.write_page(page_id, &data);

        let mut buf = [0u8; PAGE_SIZE];
        manager.read_page(page_id, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn read_past_eof_is_an_error() {
        let dir = tempdir().unwrap();
        let manager = Manager::open(dir.path().join("test.db")).unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        let err = manager.read_page(40, &mut buf).unwrap_err();
        assert!(matches!(err, DiskError::ReadPastEof { page_id: 40, .. }));
    }

    #[test]
    fn allocated_page_reads_as_zeroes() {
        let dir = tempdir().unwrap();
        let manager = Manager::open(dir.path().join("test.db")).unwrap();

        let page_id = manager.allocate_page();
        let mut buf = [1u8; PAGE_SIZE];
        manager.read_page(page_id, &mut buf).unwrap();
        assert_eq!(buf, [0u8; PAGE_SIZE]);
    }

    #[test]
    fn allocation_is_monotonic_and_extends_the_file() {
        let dir = tempdir().unwrap();
        let manager = Manager::open(dir.path().join("test.db")).unwrap();

        assert_eq!(manager.allocate_page(), 0);
        assert_eq!(manager.allocate_page(), 1);
        assert_eq!(manager.allocate_page(), 2);
        assert_eq!(manager.size(), 3 * PAGE_SIZE as u64);
    }

    #[test]
    fn log_append_read_and_gc() {
        let dir = tempdir().unwrap();
        let manager = Manager::open(dir.path().join("test.db")).unwrap();

        manager.write_log(b"first record");
        manager.write_log(b"second");
        assert_eq!(manager.num_flushes(), 2);

        let mut buf = [0u8; 64];
        let n = manager.read_log(&mut buf, 0).unwrap().unwrap();
        assert_eq!(&buf[..n], b"first recordsecond");

        // Past-the-end read signals completion, not failure.
        assert!(manager.read_log(&mut buf, n as u64).unwrap().is_none());

        manager.gc_log().unwrap();
        assert!(manager.read_log(&mut buf, 0).unwrap().is_none());
    }
}
