use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use hashlink::LinkedHashMap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    recovery::log_manager::LogManager,
    storage::{
        disk::manager::{DiskError, Manager},
        page::{
            page_constants::{PageId, INVALID_PAGE_ID},
            zeroed_page, PageData,
        },
    },
    utils::replacer::{ClockReplacer, Replacer},
};

pub type FrameId = u32;

#[derive(Error, Debug)]
pub enum BufferError {
    #[error("all frames are pinned")]
    PoolExhausted,
    #[error("page {0} is not resident in the pool")]
    PageNotResident(PageId),
    #[error("page {0} is pinned")]
    PagePinned(PageId),
    #[error("page {0} has no outstanding pins")]
    PageNotPinned(PageId),
    #[error(transparent)]
    Disk(#[from] DiskError),
}

pub type BufferResult<T> = Result<T, BufferError>;

/// One slot of the buffer pool: a latched page buffer plus residency
/// metadata. The metadata atomics are mutated only while the pool mutex is
/// held; the latch guards the bytes alone and is independent of that mutex.
#[derive(Debug)]
pub struct FrameHeader {
    frame_id: FrameId,
    page_id: AtomicU32,
    pin_count: AtomicU32,
    is_dirty: AtomicBool,
    data: RwLock<Box<PageData>>,
}

impl FrameHeader {
    fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: AtomicU32::new(INVALID_PAGE_ID),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
            data: RwLock::new(zeroed_page()),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn page_id(&self) -> PageId {
        self.page_id.load(Ordering::Relaxed)
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Relaxed)
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Relaxed)
    }

    /// Read latch over the page bytes. Hold only while copying or
    /// inspecting bytes, never across calls back into the pool.
    pub fn data(&self) -> RwLockReadGuard<'_, Box<PageData>> {
        self.data.read().unwrap()
    }

    /// Write latch over the page bytes. Same discipline as `data`.
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Box<PageData>> {
        self.data.write().unwrap()
    }

    // Latch, copy out, release. Keeps disk I/O outside the latch.
    fn snapshot(&self) -> Box<PageData> {
        let guard = self.data.read().unwrap();
        let mut copy = zeroed_page();
        copy.copy_from_slice(&guard[..]);
        copy
    }

    fn reset(&self) {
        self.page_id.store(INVALID_PAGE_ID, Ordering::Relaxed);
        self.pin_count.store(0, Ordering::Relaxed);
        self.is_dirty.store(false, Ordering::Relaxed);
    }
}

struct PoolState {
    // page id -> frame id for resident pages only.
    page_table: LinkedHashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
}

/// Page-frame buffer pool. Translates page-id I/O into pinned in-memory
/// frames, evicting with the clock replacer and honoring write-ahead
/// logging: the log manager flushes before any dirty page write.
///
/// One coarse mutex guards the page table, the free list and every frame
/// metadata transition; disk I/O happens while it is held.
pub struct BufferPoolManager {
    frames: Vec<Arc<FrameHeader>>,
    state: Mutex<PoolState>,
    replacer: Box<dyn Replacer>,
    disk: Arc<Manager>,
    log_manager: Arc<LogManager>,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, disk: Arc<Manager>, log_manager: Arc<LogManager>) -> Self {
        Self::with_replacer(
            pool_size,
            disk,
            log_manager,
            Box::new(ClockReplacer::new(pool_size)),
        )
    }

    /// Builds the pool around a caller-chosen eviction policy.
    pub fn with_replacer(
        pool_size: usize,
        disk: Arc<Manager>,
        log_manager: Arc<LogManager>,
        replacer: Box<dyn Replacer>,
    ) -> Self {
        let frames = (0..pool_size)
            .map(|i| Arc::new(FrameHeader::new(i as FrameId)))
            .collect();
        let free_list = (0..pool_size as FrameId).collect();

        Self {
            frames,
            state: Mutex::new(PoolState {
                page_table: LinkedHashMap::new(),
                free_list,
            }),
            replacer,
            disk,
            log_manager,
        }
    }

    /// Returns the frame holding `page_id`, pinned. Loads it from disk into
    /// a victim frame on a miss; `PoolExhausted` when every frame is pinned.
    pub fn fetch_page(&self, page_id: PageId) -> BufferResult<Arc<FrameHeader>> {
        let mut state = self.state.lock().unwrap();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id as usize];
            frame.pin_count.fetch_add(1, Ordering::Relaxed);
            self.replacer.pin(frame_id);
            trace!(page_id, frame_id, "fetch hit");
            return Ok(Arc::clone(frame));
        }

        let (frame_id, from_free_list) = self
            .get_frame(&mut state)
            .ok_or(BufferError::PoolExhausted)?;
        let frame = &self.frames[frame_id as usize];

        if !from_free_list {
            self.evict_resident(&mut state, frame);
        }

        // Stage through a scratch buffer; the frame latch is never held
        // across the read.
        let mut scratch = zeroed_page();
        if let Err(e) = self.disk.read_page(page_id, &mut scratch) {
            frame.reset();
            state.free_list.push_front(frame_id);
            return Err(e.into());
        }

        frame.data_mut().copy_from_slice(&scratch[..]);
        self.install(&mut state, frame, page_id);
        debug!(page_id, frame_id, "fetch miss, page loaded");
        Ok(Arc::clone(frame))
    }

    /// Allocates a fresh page and returns its frame, pinned and zeroed.
    pub fn new_page(&self) -> BufferResult<Arc<FrameHeader>> {
        let mut state = self.state.lock().unwrap();

        let (frame_id, from_free_list) = self
            .get_frame(&mut state)
            .ok_or(BufferError::PoolExhausted)?;
        let frame = &self.frames[frame_id as usize];

        if !from_free_list {
            self.evict_resident(&mut state, frame);
        }

        let page_id = self.disk.allocate_page();
        frame.data_mut().fill(0);
        self.install(&mut state, frame, page_id);
        debug!(page_id, frame_id, "new page installed");
        Ok(Arc::clone(frame))
    }

    /// Releases one pin on `page_id`, folding `is_dirty` into the frame's
    /// dirty bit. The frame becomes eviction-eligible at zero pins.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> BufferResult<()> {
        let state = self.state.lock().unwrap();

        let &frame_id = state
            .page_table
            .get(&page_id)
            .ok_or(BufferError::PageNotResident(page_id))?;
        let frame = &self.frames[frame_id as usize];

        let pins = frame.pin_count.load(Ordering::Relaxed);
        if pins == 0 {
            debug_assert!(false, "unpin of page {} with zero pin count", page_id);
            return Err(BufferError::PageNotPinned(page_id));
        }
        frame.pin_count.store(pins - 1, Ordering::Relaxed);

        if pins == 1 {
            self.replacer.unpin(frame_id);
        }
        if is_dirty {
            frame.is_dirty.store(true, Ordering::Relaxed);
        }

        Ok(())
    }

    /// Writes the resident copy of `page_id` to disk and clears its dirty
    /// bit, flushing the log first when the page is dirty. Pin counts are
    /// untouched. Returns false when the page is not resident.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        let state = self.state.lock().unwrap();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let frame = &self.frames[frame_id as usize];

        if frame.is_dirty.load(Ordering::Relaxed) {
            self.log_manager.flush();
        }

        let snapshot = frame.snapshot();
        self.disk.write_page(page_id, &snapshot);
        frame.is_dirty.store(false, Ordering::Relaxed);
        trace!(page_id, frame_id, "page flushed");
        true
    }

    /// Flushes every resident page. The resident set is snapshotted under
    /// the pool mutex and flushed without holding it.
    pub fn flush_all_pages(&self) {
        let page_ids: Vec<PageId> = {
            let state = self.state.lock().unwrap();
            state.page_table.keys().copied().collect()
        };

        for page_id in page_ids {
            self.flush_page(page_id);
        }
    }

    /// Flushes only the pages that were dirty at snapshot time.
    pub fn flush_all_dirty_pages(&self) {
        let page_ids: Vec<PageId> = {
            let state = self.state.lock().unwrap();
            state
                .page_table
                .iter()
                .filter(|&(_, &frame_id)| self.frames[frame_id as usize].is_dirty())
                .map(|(&page_id, _)| page_id)
                .collect()
        };

        for page_id in page_ids {
            self.flush_page(page_id);
        }
    }

    /// Drops `page_id` from the pool and returns its frame to the free
    /// list. Succeeds trivially when the page is not resident; fails with
    /// `PagePinned` while anyone holds a pin.
    pub fn delete_page(&self, page_id: PageId) -> BufferResult<()> {
        let mut state = self.state.lock().unwrap();

        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(());
        };
        let frame = &self.frames[frame_id as usize];

        if frame.pin_count.load(Ordering::Relaxed) > 0 {
            return Err(BufferError::PagePinned(page_id));
        }

        self.disk.deallocate_page(page_id);
        state.page_table.remove(&page_id);
        // The frame may sit in the replacer's eligible set; drop it (and
        // any recorded reference) so it cannot be handed out twice and a
        // later occupant does not inherit the old page's second chance.
        self.replacer.remove(frame_id);
        frame.reset();
        state.free_list.push_back(frame_id);
        debug!(page_id, frame_id, "page deleted from pool");
        Ok(())
    }

    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    pub fn num_free_frames(&self) -> usize {
        self.state.lock().unwrap().free_list.len()
    }

    /// Resident page ids in directory order.
    pub fn resident_page_ids(&self) -> Vec<PageId> {
        let state = self.state.lock().unwrap();
        state.page_table.keys().copied().collect()
    }

    pub fn pin_count_of(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock().unwrap();
        state
            .page_table
            .get(&page_id)
            .map(|&frame_id| self.frames[frame_id as usize].pin_count())
    }

    // Free list first, clock victim second. `None` means pool exhaustion.
    fn get_frame(&self, state: &mut PoolState) -> Option<(FrameId, bool)> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Some((frame_id, true));
        }
        self.replacer.victim().map(|frame_id| (frame_id, false))
    }

    // Writes back the victim's current page if dirty (log first, per WAL)
    // and removes it from the directory. Caller holds the pool mutex and
    // guarantees the frame is unpinned.
    fn evict_resident(&self, state: &mut PoolState, frame: &Arc<FrameHeader>) {
        let old_page_id = frame.page_id.load(Ordering::Relaxed);
        if old_page_id == INVALID_PAGE_ID {
            return;
        }

        if frame.is_dirty.load(Ordering::Relaxed) {
            self.log_manager.flush();
            let snapshot = frame.snapshot();
            self.disk.write_page(old_page_id, &snapshot);
            frame.is_dirty.store(false, Ordering::Relaxed);
        }

        state.page_table.remove(&old_page_id);
        debug!(page_id = old_page_id, frame_id = frame.frame_id, "page evicted");
    }

    fn install(&self, state: &mut PoolState, frame: &Arc<FrameHeader>, page_id: PageId) {
        frame.page_id.store(page_id, Ordering::Relaxed);
        frame.pin_count.store(1, Ordering::Relaxed);
        frame.is_dirty.store(false, Ordering::Relaxed);
        state.page_table.insert(page_id, frame.frame_id);
    }
}
