//! Single-slot "latest value wins" mailbox between the detector thread and
//! the frame loop.
//!
//! Posting replaces whatever is waiting; taking never blocks.  Once closed,
//! posts are dropped and nothing more can be taken, so no result produced
//! after a stop is ever applied.

use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct Slot<T> {
    value:  Option<T>,
    closed: bool,
}

#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self { Mailbox { slot: Arc::clone(&self.slot) } }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self { Mailbox::new() }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Mailbox { slot: Arc::new(Mutex::new(Slot { value: None, closed: false })) }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // A poisoned slot only means a producer panicked mid-post; the
        // Option inside is still whole.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `value`, replacing any unread one.  Returns `false` (and drops
    /// `value`) if the mailbox is closed.
    pub fn post(&self, value: T) -> bool {
        let mut slot = self.lock();
        if slot.closed {
            return false;
        }
        slot.value = Some(value);
        true
    }

    /// Take the newest value, if any.
    pub fn take(&self) -> Option<T> {
        let mut slot = self.lock();
        if slot.closed {
            return None;
        }
        slot.value.take()
    }

    /// Refuse further posts and discard anything pending.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        slot.value = None;
    }

    /// Re-arm after [`close`](Self::close).
    pub fn reopen(&self) {
        let mut slot = self.lock();
        slot.closed = false;
        slot.value = None;
    }

    pub fn is_closed(&self) -> bool { self.lock().closed }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn newest_value_wins() {
        let mb = Mailbox::new();
        mb.post(1);
        mb.post(2);
        mb.post(3);
        assert_eq!(mb.take(), Some(3));
        assert_eq!(mb.take(), None);
    }

    #[test]
    fn closed_mailbox_drops_pending_and_new_posts() {
        let mb = Mailbox::new();
        mb.post("pending");
        mb.close();
        assert_eq!(mb.take(), None);
        assert!(!mb.post("late"));
        assert_eq!(mb.take(), None);
    }

    #[test]
    fn reopen_accepts_posts_again() {
        let mb = Mailbox::new();
        mb.close();
        mb.reopen();
        assert!(mb.post(7));
        assert_eq!(mb.take(), Some(7));
    }

    #[test]
    fn producer_thread_posts_are_visible() {
        let mb = Mailbox::new();
        let tx = mb.clone();
        thread::spawn(move || {
            for i in 0..100 { tx.post(i); }
        }).join().unwrap();
        assert_eq!(mb.take(), Some(99));
    }
}
