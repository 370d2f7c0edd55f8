// Staged queue: a lock-free spill lane in front of a try-locked deque
use crossbeam::queue::SegQueue;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Unbounded FIFO with a non-blocking producer side.
///
/// Producers call [`StagedQueue::push`], which never waits: if the active
/// deque is momentarily locked by a consumer, the item lands on a lock-free
/// staging lane instead. The next push that does win the lock first moves
/// everything staged (oldest first) into the deque, so FIFO order holds
/// across both lanes.
///
/// Consumers take the active deque through [`StagedQueue::try_active`] and
/// work on it directly; the front element may be mutated in place, which is
/// what a partially transmitted payload needs.
pub struct StagedQueue<T> {
    staging: SegQueue<T>,
    active: Mutex<VecDeque<T>>,
}

impl<T> StagedQueue<T> {
    pub fn new() -> Self {
        StagedQueue {
            staging: SegQueue::new(),
            active: Mutex::new(VecDeque::new()),
        }
    }

    /// Accept an item without ever blocking. Returns true when the item went
    /// straight into the active deque, false when it was staged.
    pub fn push(&self, item: T) -> bool {
        match self.active.try_lock() {
            Ok(mut active) => {
                while let Some(staged) = self.staging.pop() {
                    active.push_back(staged);
                }
                active.push_back(item);
                true
            }
            Err(_) => {
                self.staging.push(item);
                false
            }
        }
    }

    /// Try to take the active deque. `None` means a producer or another
    /// consumer holds it right now; callers retry on their own cadence.
    /// Staged items are folded in first so the guard sees the full queue.
    pub fn try_active(&self) -> Option<MutexGuard<'_, VecDeque<T>>> {
        match self.active.try_lock() {
            Ok(mut active) => {
                while let Some(staged) = self.staging.pop() {
                    active.push_back(staged);
                }
                Some(active)
            }
            Err(_) => None,
        }
    }

    /// Best-effort depth across both lanes. Contention makes the active
    /// portion read as zero, so treat this as a hint.
    pub fn len_hint(&self) -> usize {
        let active = self.active.try_lock().map(|q| q.len()).unwrap_or(0);
        active + self.staging.len()
    }
}

impl<T> Default for StagedQueue<T> {
    fn default() -> Self {
        StagedQueue::new()
    }
}

/// Unbounded FIFO where every access is a try-lock: producers and consumers
/// both give up immediately under contention instead of waiting.
pub struct TryQueue<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> TryQueue<T> {
    pub fn new() -> Self {
        TryQueue {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Take the queue for a short critical section. `None` under contention.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, VecDeque<T>>> {
        self.inner.try_lock().ok()
    }

    /// Pop the front item; `None` when empty or when the lock is held.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.try_lock().ok()?.pop_front()
    }

    pub fn len_hint(&self) -> usize {
        self.inner.try_lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl<T> Default for TryQueue<T> {
    fn default() -> Self {
        TryQueue::new()
    }
}
