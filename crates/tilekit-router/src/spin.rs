//! A one-value mailbox guarded by a test-and-set spinlock.
//!
//! Writers never wait on the router lock, so a worker can post an update while
//! a long `call` runs. Critical sections only move a value in or out.

use std::fmt;

use parking_lot::{Mutex, const_mutex};

pub struct SpinSlot<T> {
    value: Mutex<Option<T>>,
}

impl<T> SpinSlot<T> {
    pub const fn new() -> Self {
        Self {
            value: const_mutex(None),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Option<T>) -> R) -> R {
        loop {
            if let Some(mut slot) = self.value.try_lock() {
                return f(&mut *slot);
            }
            std::hint::spin_loop();
        }
    }

    /// Store `value`, returning the one it replaced.
    pub fn put(&self, value: T) -> Option<T> {
        self.with(|slot| slot.replace(value))
    }

    pub fn take(&self) -> Option<T> {
        self.with(Option::take)
    }

    pub fn is_occupied(&self) -> bool {
        self.with(|slot| slot.is_some())
    }
}

impl<T> Default for SpinSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SpinSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinSlot")
            .field("occupied", &self.is_occupied())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_put_replaces() {
        let slot = SpinSlot::new();
        assert_eq!(slot.put(1), None);
        assert_eq!(slot.put(2), Some(1));
        assert!(slot.is_occupied());
        assert_eq!(slot.take(), Some(2));
        assert_eq!(slot.take(), None);
        assert!(!slot.is_occupied());
    }

    #[test]
    fn test_shares_send_only_values() {
        fn shared<T: Send + Sync>(_: &T) {}

        let slot = Arc::new(SpinSlot::new());
        shared(&*slot);
        let writer = {
            let slot = slot.clone();
            thread::spawn(move || slot.put(Cell::new(7u8)))
        };
        assert_eq!(writer.join().unwrap(), None);
        assert_eq!(slot.take().map(Cell::into_inner), Some(7));
    }

    #[test]
    fn test_concurrent_puts_keep_one() {
        let slot = Arc::new(SpinSlot::new());
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let slot = slot.clone();
                thread::spawn(move || {
                    for i in 0..1000 {
                        slot.put(t * 1000 + i);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        let last = slot.take().unwrap();
        assert_eq!(last % 1000, 999);
        assert!(!slot.is_occupied());
    }
}
