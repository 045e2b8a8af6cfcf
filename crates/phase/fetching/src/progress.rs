use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Download accounting surfaced to the host as progress events.
///
/// Finished-byte accumulation is an approximation of user-visible progress,
/// not an invariant: counts are added once per completed transfer and never
/// reconciled against replies that died midway.
#[derive(Debug, Default)]
pub struct Progress {
    bytes_received: AtomicU64,
    bytes_total: AtomicU64,
    active: AtomicUsize,
}

impl Progress {
    pub fn begin(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    pub fn finish(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::SeqCst);
        self.bytes_total.fetch_add(bytes, Ordering::SeqCst);
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn abort(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn reset(&self) {
        self.bytes_received.store(0, Ordering::SeqCst);
        self.bytes_total.store(0, Ordering::SeqCst);
        self.active.store(0, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> (u64, u64, usize) {
        (
            self.bytes_received.load(Ordering::SeqCst),
            self.bytes_total.load(Ordering::SeqCst),
            self.active.load(Ordering::SeqCst),
        )
    }
}
