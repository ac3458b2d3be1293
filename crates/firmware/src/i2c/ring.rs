//! Const-generic, statically allocated ring of pending request ids.
//!
//! `RequestRing<N>` is the FIFO behind each I2C context. It never blocks:
//! [`push`](RequestRing::push) fails immediately when the ring is full and
//! hands the id back.
//!
//! # Constraints
//!
//! - `N` must be a power of two (checked at compile time), so index
//!   wrapping is a mask.
//! - This type is **not** interrupt-safe on its own. The engine only touches
//!   it inside a critical section.

use super::request::RequestId;

/// A fixed-capacity FIFO of [`RequestId`]s.
pub struct RequestRing<const N: usize> {
    buf: [Option<RequestId>; N],
    /// Index of the next slot to read from.
    start: usize,
    /// Index of the next slot to write to.
    end: usize,
    /// Number of ids currently held.
    count: usize,
}

impl<const N: usize> RequestRing<N> {
    #[allow(clippy::arithmetic_side_effects)] // Safety: a power of two is >= 1
    const MASK: usize = {
        assert!(N.is_power_of_two(), "RequestRing capacity must be a power of two");
        N - 1
    };

    /// Create a new, empty ring.
    pub const fn new() -> Self {
        let _ = Self::MASK;
        Self {
            buf: [None; N],
            start: 0,
            end: 0,
            count: 0,
        }
    }

    /// Append `id` at the tail.
    ///
    /// # Errors
    ///
    /// Returns `Err(id)` if the ring is full. The ring is left unchanged.
    #[allow(clippy::indexing_slicing)] // Safety: end is always masked to < N
    #[allow(clippy::arithmetic_side_effects)] // Safety: wrap via & MASK; count < N checked above
    pub fn push(&mut self, id: RequestId) -> Result<(), RequestId> {
        if self.count == N {
            return Err(id);
        }
        self.buf[self.end] = Some(id);
        self.end = (self.end + 1) & Self::MASK;
        self.count += 1;
        Ok(())
    }

    /// Remove and return the head, if any.
    #[allow(clippy::indexing_slicing)] // Safety: start is always masked to < N
    #[allow(clippy::arithmetic_side_effects)] // Safety: wrap via & MASK; count > 0 checked above
    pub fn pop(&mut self) -> Option<RequestId> {
        if self.count == 0 {
            return None;
        }
        let id = self.buf[self.start].take();
        self.start = (self.start + 1) & Self::MASK;
        self.count -= 1;
        id
    }

    /// Head of the ring without removing it.
    pub fn peek(&self) -> Option<RequestId> {
        if self.count == 0 {
            return None;
        }
        self.buf.get(self.start).copied().flatten()
    }

    /// `true` if `id` is waiting in the ring.
    pub fn contains(&self, id: RequestId) -> bool {
        self.iter().any(|queued| queued == id)
    }

    /// Queued ids, head first.
    #[allow(clippy::arithmetic_side_effects)] // Safety: wrap via & MASK
    pub fn iter(&self) -> impl Iterator<Item = RequestId> + '_ {
        (0..self.count).filter_map(move |offset| {
            self.buf
                .get((self.start + offset) & Self::MASK)
                .copied()
                .flatten()
        })
    }

    /// Drop every queued id.
    pub fn clear(&mut self) {
        self.buf = [None; N];
        self.start = 0;
        self.end = 0;
        self.count = 0;
    }

    /// Number of queued ids.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Maximum number of ids the ring can hold.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` when the ring is completely full.
    pub fn is_full(&self) -> bool {
        self.count == N
    }
}

impl<const N: usize> Default for RequestRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> RequestId {
        RequestId::from_index(n)
    }

    #[test]
    fn new_ring_is_empty() {
        let ring = RequestRing::<4>::new();
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 4);
        assert_eq!(ring.peek(), None);
    }

    #[test]
    fn fifo_order() {
        let mut ring = RequestRing::<4>::new();
        for n in 0..3 {
            ring.push(id(n)).unwrap();
        }
        assert_eq!(ring.pop(), Some(id(0)));
        assert_eq!(ring.pop(), Some(id(1)));
        assert_eq!(ring.pop(), Some(id(2)));
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn full_ring_rejects_and_is_unchanged() {
        let mut ring = RequestRing::<2>::new();
        ring.push(id(0)).unwrap();
        ring.push(id(1)).unwrap();
        assert!(ring.is_full());
        assert_eq!(ring.push(id(2)), Err(id(2)));
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![id(0), id(1)]);
    }

    #[test]
    fn wraps_around() {
        let mut ring = RequestRing::<2>::new();
        for n in 0..10 {
            ring.push(id(n)).unwrap();
            assert_eq!(ring.peek(), Some(id(n)));
            assert_eq!(ring.pop(), Some(id(n)));
        }
        assert!(ring.is_empty());
    }

    #[test]
    fn contains_and_clear() {
        let mut ring = RequestRing::<4>::new();
        ring.push(id(7)).unwrap();
        assert!(ring.contains(id(7)));
        assert!(!ring.contains(id(8)));
        ring.clear();
        assert!(ring.is_empty());
        assert!(!ring.contains(id(7)));
    }
}
