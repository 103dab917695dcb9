//! Bounded FIFO of fixed-point samples between the audio callback and the
//! modem engine.

/// Ring-backed sample queue.  Capacity is fixed at construction; `push` on a
/// full queue drops the sample and reports it, so the caller can apply its
/// backpressure policy without the queue ever reallocating.
pub struct SampleQueue {
    buf: Box<[i16]>,
    head: usize,
    len: usize,
}

impl SampleQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Append at the tail.  Returns false when the sample was dropped
    /// because the queue is full.
    pub fn push(&mut self, sample: i16) -> bool {
        if self.len == self.buf.len() {
            return false;
        }
        let tail = (self.head + self.len) % self.buf.len();
        self.buf[tail] = sample;
        self.len += 1;
        true
    }

    /// Remove from the head.
    pub fn pop(&mut self) -> Option<i16> {
        if self.len == 0 {
            return None;
        }
        let sample = self.buf[self.head];
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
        Some(sample)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}
