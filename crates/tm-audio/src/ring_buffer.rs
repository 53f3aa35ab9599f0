//! Fixed-capacity circular buffer
//!
//! Writes never evict unread data: a write larger than the free space is
//! truncated and the accepted count is returned. Reads consume the oldest
//! elements first. `peek_at` inspects without consuming, counting back from
//! the most recently written element.

/// Circular buffer holding at most `N` elements of `T`
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    buffer: [T; N],
    len: usize,
    write_index: usize,
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    /// Create an empty buffer
    pub fn new() -> Self {
        assert!(N > 0, "ring buffer capacity must be non-zero");
        Self {
            buffer: [T::default(); N],
            len: 0,
            write_index: 0,
        }
    }

    /// Maximum number of elements
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of unread elements
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Free slots left for writing
    #[inline]
    pub fn free(&self) -> usize {
        N - self.len
    }

    /// Drop every unread element
    pub fn clear(&mut self) {
        self.len = 0;
        self.write_index = 0;
    }

    #[inline]
    fn read_index(&self) -> usize {
        (self.write_index + N - self.len) % N
    }

    /// Write as many elements of `data` as fit. Returns the accepted count.
    pub fn write(&mut self, data: &[T]) -> usize {
        let count = data.len().min(self.free());
        let contiguous = count.min(N - self.write_index);

        self.buffer[self.write_index..self.write_index + contiguous]
            .copy_from_slice(&data[..contiguous]);
        let wrapped = count - contiguous;
        self.buffer[..wrapped].copy_from_slice(&data[contiguous..count]);

        self.write_index = (self.write_index + count) % N;
        self.len += count;
        count
    }

    /// Write a single element. Returns false (and drops `value`) when full.
    pub fn write_one(&mut self, value: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.buffer[self.write_index] = value;
        self.write_index = (self.write_index + 1) % N;
        self.len += 1;
        true
    }

    /// Read up to `out.len()` of the oldest elements. Returns the count read.
    pub fn read(&mut self, out: &mut [T]) -> usize {
        let count = out.len().min(self.len);
        let start = self.read_index();
        let contiguous = count.min(N - start);

        out[..contiguous].copy_from_slice(&self.buffer[start..start + contiguous]);
        out[contiguous..count].copy_from_slice(&self.buffer[..count - contiguous]);

        self.len -= count;
        count
    }

    /// Consume up to `max` of the oldest elements without copying.
    ///
    /// The returned slice stops at the wrap point, so it may be shorter than
    /// both `max` and `len()`; call again to get the remainder.
    pub fn read_slice(&mut self, max: usize) -> &[T] {
        let start = self.read_index();
        let count = max.min(self.len).min(N - start);
        self.len -= count;
        &self.buffer[start..start + count]
    }

    /// Consume the oldest element
    pub fn read_one(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let value = self.buffer[self.read_index()];
        self.len -= 1;
        Some(value)
    }

    /// Look at an unread element without consuming it. Index 0 is the most
    /// recently written element, 1 the one before it, and so on.
    pub fn peek_at(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        Some(&self.buffer[(self.write_index + N - 1 - index) % N])
    }

    /// Iterate unread elements from newest to oldest
    pub fn iter_newest(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |index| self.peek_at(index))
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_preserves_order() {
        let mut ring = RingBuffer::<i32, 8>::new();
        assert_eq!(ring.write(&[1, 2, 3, 4, 5]), 5);

        let mut out = [0; 5];
        assert_eq!(ring.read(&mut out), 5);
        assert_eq!(out, [1, 2, 3, 4, 5]);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_overflowing_write_is_truncated() {
        let mut ring = RingBuffer::<i32, 4>::new();
        assert_eq!(ring.write(&[1, 2, 3]), 3);
        assert_eq!(ring.write(&[4, 5, 6]), 1);
        assert!(ring.is_full());
        assert!(!ring.write_one(7));

        // Existing unread data survives.
        let mut out = [0; 4];
        assert_eq!(ring.read(&mut out), 4);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn test_wraparound_write_and_read() {
        let mut ring = RingBuffer::<i32, 5>::new();
        ring.write(&[1, 2, 3, 4]);
        let mut out = [0; 3];
        ring.read(&mut out);
        assert_eq!(out, [1, 2, 3]);

        // Write index is at 4, so this spans the end of the storage.
        assert_eq!(ring.write(&[5, 6, 7, 8]), 4);
        let mut out = [0; 8];
        assert_eq!(ring.read(&mut out), 5);
        assert_eq!(&out[..5], &[4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_read_clamped_to_available() {
        let mut ring = RingBuffer::<u8, 4>::new();
        ring.write(&[9, 8]);
        let mut out = [0u8; 4];
        assert_eq!(ring.read(&mut out), 2);
        assert_eq!(ring.read(&mut out), 0);
        assert_eq!(ring.read_one(), None);
    }

    #[test]
    fn test_read_slice_stops_at_wrap() {
        let mut ring = RingBuffer::<i32, 4>::new();
        ring.write(&[1, 2, 3]);
        assert_eq!(ring.read_one(), Some(1));
        assert_eq!(ring.read_one(), Some(2));
        ring.write(&[4, 5, 6]);

        assert_eq!(ring.read_slice(10), &[3, 4]);
        assert_eq!(ring.read_slice(10), &[5, 6]);
        assert!(ring.is_empty());
        assert!(ring.read_slice(10).is_empty());
    }

    #[test]
    fn test_peek_at_counts_back_from_newest() {
        let mut ring = RingBuffer::<i32, 3>::new();
        assert_eq!(ring.peek_at(0), None);

        ring.write_one(10);
        assert_eq!(ring.peek_at(0), Some(&10));

        ring.write(&[20, 30]);
        assert_eq!(ring.peek_at(0), Some(&30));
        assert_eq!(ring.peek_at(2), Some(&10));
        assert_eq!(ring.peek_at(3), None);

        ring.read_one();
        ring.write_one(40);
        assert_eq!(ring.peek_at(0), Some(&40));
        assert_eq!(ring.iter_newest().copied().collect::<Vec<_>>(), vec![40, 30, 20]);
    }
}
