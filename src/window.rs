// Gesture Features - Streaming IMU feature extraction
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Fixed-capacity sliding window of scalar samples.

use std::cell::RefCell;

/// Circular buffer holding the most recent `capacity` samples of one channel.
///
/// Storage is allocated once, together with a same-sized scratch buffer
/// used for ordered reductions. Once full, every push overwrites the oldest
/// value in place; [`RingWindow::reset`] forgets the contents without
/// releasing the allocation.
#[derive(Debug, Clone)]
pub struct RingWindow {
    /// Backing storage, always `capacity` long.
    values: Vec<f64>,
    /// Slot the next push writes to.
    cursor: usize,
    /// Number of valid samples (saturates at capacity).
    len: usize,
    /// Sort buffer for [`RingWindow::with_sorted`].
    scratch: RefCell<Vec<f64>>,
}

impl RingWindow {
    /// Create an empty window. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: vec![0.0; capacity],
            cursor: 0,
            len: 0,
            scratch: RefCell::new(Vec::with_capacity(capacity)),
        }
    }

    /// Record a sample, evicting the oldest one when full.
    pub fn push(&mut self, value: f64) {
        self.values[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.values.len();
        if self.len < self.values.len() {
            self.len += 1;
        }
    }

    /// Current logical contents and fill count.
    ///
    /// The slice is in storage order, not insertion order; statistics over
    /// it do not care.
    pub fn snapshot(&self) -> (&[f64], usize) {
        if self.len < self.values.len() {
            (&self.values[..self.len], self.len)
        } else {
            (&self.values[..], self.len)
        }
    }

    /// Call `f` with the contents sorted ascending by [`f64::total_cmp`].
    ///
    /// The sorted slice depends only on the multiset of stored values, never
    /// on insertion order or wraparound position.
    pub fn with_sorted<R>(&self, f: impl FnOnce(&[f64]) -> R) -> R {
        let (values, _) = self.snapshot();
        let mut scratch = self.scratch.borrow_mut();
        scratch.clear();
        scratch.extend_from_slice(values);
        scratch.sort_unstable_by(f64::total_cmp);
        f(&scratch)
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let cap = self.values.len();
        let start = (self.cursor + cap - self.len) % cap;
        (0..self.len).map(move |i| self.values[(start + i) % cap])
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        let cap = self.values.len();
        Some(self.values[(self.cursor + cap - 1) % cap])
    }

    /// Forget all samples; capacity is kept.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_new() {
        let window = RingWindow::new(4);
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 4);
        assert_eq!(window.snapshot().1, 0);
        assert!(window.latest().is_none());
    }

    #[test]
    fn test_window_push_partial() {
        let mut window = RingWindow::new(4);
        window.push(1.0);
        window.push(2.0);

        let (values, n) = window.snapshot();
        assert_eq!(n, 2);
        assert_eq!(values, &[1.0, 2.0]);
        assert_eq!(window.latest(), Some(2.0));
    }

    #[test]
    fn test_window_fifo_overwrite() {
        let mut window = RingWindow::new(3);
        for i in 0..5 {
            window.push(i as f64);
        }

        assert!(window.is_full());
        assert_eq!(window.len(), 3);
        let ordered: Vec<f64> = window.iter().collect();
        assert_eq!(ordered, vec![2.0, 3.0, 4.0]);
        assert_eq!(window.latest(), Some(4.0));
    }

    #[test]
    fn test_window_len_saturates() {
        let mut window = RingWindow::new(2);
        for i in 0..10 {
            window.push(i as f64);
            assert_eq!(window.len(), (i + 1).min(2));
        }
    }

    #[test]
    fn test_window_reset_keeps_capacity() {
        let mut window = RingWindow::new(3);
        window.push(1.0);
        window.push(2.0);
        window.reset();

        assert!(window.is_empty());
        assert_eq!(window.capacity(), 3);
        window.push(9.0);
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![9.0]);
    }

    #[test]
    fn test_window_zero_capacity_bumped() {
        let mut window = RingWindow::new(0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.latest(), Some(2.0));
    }

    #[test]
    fn test_window_sorted_ignores_wraparound() {
        let mut wrapped = RingWindow::new(3);
        for v in [5.0, 0.3, 0.1, 0.2] {
            wrapped.push(v);
        }
        let mut straight = RingWindow::new(3);
        for v in [0.2, 0.1, 0.3] {
            straight.push(v);
        }

        let a = wrapped.with_sorted(|v| v.to_vec());
        let b = straight.with_sorted(|v| v.to_vec());
        assert_eq!(a, vec![0.1, 0.2, 0.3]);
        assert_eq!(a, b);
        // Storage itself is untouched.
        assert_eq!(wrapped.iter().collect::<Vec<_>>(), vec![0.3, 0.1, 0.2]);
    }
}
