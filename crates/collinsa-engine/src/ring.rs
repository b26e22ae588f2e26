//! Fixed-capacity ring of closed ticks.
//!
//! [`TickRing`] stores `Arc<Tick>` slots with single-producer push and
//! multi-consumer read. The newest slot is the machine's *previous* tick;
//! the ring also remembers which tick the render consumer last took.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::tick::Tick;

/// A tagged slot: the `u64` is the monotonic write position when this
/// tick was stored, enabling consumers to detect overwrites.
type Slot = Option<(u64, Arc<Tick>)>;

/// A fixed-capacity ring buffer of `Arc<Tick>`.
///
/// Single-producer: only the simulation loop calls [`push`](Self::push).
/// Multi-consumer: any thread can call [`latest`](Self::latest),
/// [`deliver_latest`](Self::deliver_latest) or
/// [`get_by_pos`](Self::get_by_pos).
///
/// The write position is monotonically increasing (never wraps). Slot
/// index is `pos % capacity`. Each slot stores its position tag so that
/// a reader racing the producer can tell its target was overwritten.
pub struct TickRing {
    slots: Vec<Mutex<Slot>>,
    write_pos: AtomicU64,
    capacity: usize,
    last_delivered: Mutex<Option<Arc<Tick>>>,
}

// Compile-time assertion: TickRing must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<TickRing>();
};

// Slots hold plain data; a panic while holding the lock cannot leave a
// slot half-written, so poisoning is ignored.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TickRing {
    /// Create a new ring buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2`. [`WorldConfig::validate`](crate::WorldConfig::validate)
    /// rejects such configurations before a ring is built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "TickRing capacity must be >= 2, got {capacity}");
        let slots = (0..capacity).map(|_| Mutex::new(None)).collect();
        Self {
            slots,
            write_pos: AtomicU64::new(0),
            capacity,
            last_delivered: Mutex::new(None),
        }
    }

    /// Publish a closed tick. Single-producer only.
    ///
    /// Returns the tick evicted by this push, if any.
    pub fn push(&self, tick: Tick) -> Option<Arc<Tick>> {
        let pos = self.write_pos.load(Ordering::Relaxed);
        let slot_idx = (pos as usize) % self.capacity;

        let arc = Arc::new(tick);
        let evicted = {
            let mut slot = lock(&self.slots[slot_idx]);
            let prev = slot.take().map(|(_tag, arc)| arc);
            *slot = Some((pos, arc));
            prev
        };

        // Release-store ensures the tick is visible before consumers
        // observe the new write_pos.
        self.write_pos.store(pos + 1, Ordering::Release);

        evicted
    }

    /// The most recently published tick, without marking it delivered.
    pub fn latest(&self) -> Option<Arc<Tick>> {
        let pos = self.write_pos.load(Ordering::Acquire);
        if pos == 0 {
            return None;
        }
        self.get_by_pos(pos - 1)
    }

    /// The most recently published tick, marked delivered and remembered
    /// as the last delivery. A reference hand-off; the tick is not copied.
    pub fn deliver_latest(&self) -> Option<Arc<Tick>> {
        let tick = self.latest()?;
        tick.mark_delivered();
        *lock(&self.last_delivered) = Some(Arc::clone(&tick));
        Some(tick)
    }

    /// The tick handed out by the last [`deliver_latest`](Self::deliver_latest).
    pub fn last_delivered(&self) -> Option<Arc<Tick>> {
        lock(&self.last_delivered).clone()
    }

    /// Get a tick by its monotonic write position.
    ///
    /// Returns `None` if the position has been evicted or hasn't been
    /// written yet.
    pub fn get_by_pos(&self, pos: u64) -> Option<Arc<Tick>> {
        let current = self.write_pos.load(Ordering::Acquire);
        if pos >= current || current - pos > self.capacity as u64 {
            return None;
        }

        let slot_idx = (pos as usize) % self.capacity;
        let slot = lock(&self.slots[slot_idx]);
        match slot.as_ref() {
            Some((tag, arc)) if *tag == pos => Some(Arc::clone(arc)),
            // Overwritten between the bounds check and the lock.
            _ => None,
        }
    }

    /// Number of ticks currently stored (up to `capacity`).
    pub fn len(&self) -> usize {
        let pos = self.write_pos.load(Ordering::Acquire) as usize;
        pos.min(self.capacity)
    }

    /// Whether nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.write_pos.load(Ordering::Acquire) == 0
    }

    /// The ring buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The current monotonic write position (ticks published so far).
    pub fn write_pos(&self) -> u64 {
        self.write_pos.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for TickRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickRing")
            .field("capacity", &self.capacity)
            .field("write_pos", &self.write_pos())
            .finish()
    }
}
