use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Global allocator that tracks live and peak heap bytes for budget tests.
pub struct BudgetAlloc {
    current: AtomicUsize,
    peak: AtomicUsize,
    count: AtomicUsize,
}

impl BudgetAlloc {
    pub const fn new() -> Self {
        Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
        }
    }

    /// Restart peak tracking from the bytes that are live right now.
    pub fn reset_peak(&self) {
        let live = self.current.load(Ordering::SeqCst);
        self.peak.store(live, Ordering::SeqCst);
        self.count.store(0, Ordering::SeqCst);
    }

    pub fn live_bytes(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Peak bytes above `baseline` since the last reset.
    pub fn peak_above(&self, baseline: usize) -> usize {
        self.peak.load(Ordering::SeqCst).saturating_sub(baseline)
    }

    pub fn alloc_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    fn grow(&self, bytes: usize) {
        let now = self.current.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn shrink(&self, bytes: usize) {
        // Allocations made before a reset may be freed afterwards.
        let _ = self
            .current
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                Some(live.saturating_sub(bytes))
            });
    }
}

unsafe impl GlobalAlloc for BudgetAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                self.grow(new_size - layout.size());
            } else {
                self.shrink(layout.size() - new_size);
            }
        }
        new_ptr
    }
}
