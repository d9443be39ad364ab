//! Fixed-capacity ring buffer for per-partition history, generalized from
//! the WAL telemetry ring buffer pattern.

use parking_lot::Mutex;

struct RingInner<T> {
    buf: Vec<T>,
    capacity: usize,
    write_pos: usize,
    count: usize,
}

/// Stores the last `capacity` items pushed, overwriting the oldest once
/// full.
pub struct RingBuffer<T> {
    inner: Mutex<RingInner<T>>,
}

impl<T: Clone> RingBuffer<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RingInner {
                buf: Vec::with_capacity(capacity),
                capacity: capacity.max(1),
                write_pos: 0,
                count: 0,
            }),
        }
    }

    pub fn push(&self, item: T) {
        let mut inner = self.inner.lock();
        let pos = inner.write_pos;
        if inner.buf.len() < inner.capacity {
            inner.buf.push(item);
        } else {
            inner.buf[pos] = item;
        }
        inner.write_pos = (pos + 1) % inner.capacity;
        inner.count += 1;
    }

    /// Snapshot of stored items in chronological order. Does not remove
    /// anything, despite the name inherited from the pattern this
    /// generalizes.
    #[must_use]
    pub fn history(&self) -> Vec<T> {
        let inner = self.inner.lock();
        let n = inner.count.min(inner.capacity);
        let mut result = Vec::with_capacity(n);
        if n == 0 {
            return result;
        }
        let start = if inner.count >= inner.capacity {
            inner.write_pos
        } else {
            0
        };
        for i in 0..n {
            let idx = (start + i) % inner.capacity;
            result.push(inner.buf[idx].clone());
        }
        result
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock();
        inner.count.min(inner.capacity)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_capacity_keeping_most_recent() {
        let ring = RingBuffer::new(3);
        for i in 0..5 {
            ring.push(i);
        }
        assert_eq!(ring.history(), vec![2, 3, 4]);
    }

    #[test]
    fn below_capacity_preserves_insertion_order() {
        let ring = RingBuffer::new(5);
        ring.push("a");
        ring.push("b");
        assert_eq!(ring.history(), vec!["a", "b"]);
    }
}
