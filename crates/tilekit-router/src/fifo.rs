//! A mutex granting the lock in the order it was requested.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Ticket lock: `lock` draws a ticket and waits until it is served; each
/// unlock serves the next ticket. Waiters sleep on a condvar.
///
/// Not reentrant. Locking again from the thread holding the lock blocks
/// forever.
pub struct FifoMutex<T> {
    next_ticket: AtomicU64,
    now_serving: AtomicU64,
    gate: Mutex<()>,
    turn: Condvar,
    // Only the ticket holder locks this, so it is never contended.
    data: Mutex<T>,
}

pub struct FifoGuard<'a, T> {
    data: MutexGuard<'a, T>,
    owner: &'a FifoMutex<T>,
}

impl<T> FifoMutex<T> {
    pub fn new(value: T) -> Self {
        Self {
            next_ticket: AtomicU64::new(0),
            now_serving: AtomicU64::new(0),
            gate: Mutex::new(()),
            turn: Condvar::new(),
            data: Mutex::new(value),
        }
    }

    pub fn lock(&self) -> FifoGuard<'_, T> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::AcqRel);
        if self.now_serving.load(Ordering::Acquire) != ticket {
            let mut gate = self.gate.lock();
            while self.now_serving.load(Ordering::Acquire) != ticket {
                self.turn.wait(&mut gate);
            }
        }
        FifoGuard {
            data: self.data.lock(),
            owner: self,
        }
    }

    /// Take the lock only if nobody holds or waits for it.
    pub fn try_lock(&self) -> Option<FifoGuard<'_, T>> {
        let serving = self.now_serving.load(Ordering::Acquire);
        self.next_ticket
            .compare_exchange(serving, serving + 1, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(FifoGuard {
            data: self.data.lock(),
            owner: self,
        })
    }

    /// Tickets drawn but not yet released, the holder included.
    pub fn queued(&self) -> u64 {
        let next = self.next_ticket.load(Ordering::Acquire);
        next.saturating_sub(self.now_serving.load(Ordering::Acquire))
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: Default> Default for FifoMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for FifoMutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FifoMutex")
            .field("next_ticket", &self.next_ticket.load(Ordering::Relaxed))
            .field("now_serving", &self.now_serving.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<T> Deref for FifoGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for FifoGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> Drop for FifoGuard<'_, T> {
    fn drop(&mut self) {
        let owner = self.owner;
        owner.now_serving.fetch_add(1, Ordering::AcqRel);
        // Taking the gate orders this notify after any waiter's last check.
        drop(owner.gate.lock());
        owner.turn.notify_all();
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_lock_in_ticket_order() {
        let mutex = Arc::new(FifoMutex::new(Vec::new()));
        let held = mutex.lock();

        let mut workers = Vec::new();
        for i in 0..8usize {
            let m = mutex.clone();
            workers.push(thread::spawn(move || m.lock().push(i)));
            // Wait until this worker holds its ticket before starting the next.
            while mutex.queued() < i as u64 + 2 {
                thread::sleep(Duration::from_millis(1));
            }
        }
        drop(held);
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(*mutex.lock(), (0..8).collect::<Vec<_>>());
        assert_eq!(mutex.queued(), 0);
    }

    #[test]
    fn test_try_lock() {
        let mutex = FifoMutex::new(1u32);
        {
            let mut g = mutex.try_lock().unwrap();
            *g += 1;
            assert!(mutex.try_lock().is_none());
        }
        assert_eq!(*mutex.try_lock().unwrap(), 2);
        assert_eq!(mutex.into_inner(), 2);
    }
}
