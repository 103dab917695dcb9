//! Per-sample FIR convolution over a circular history buffer.

use num_traits::Float;

use super::coefficients::FirCoefficients;

/// A FIR filter instance: one shared tap set plus a per-instance ring of the
/// last `len` input samples.
///
/// `filter` walks the history oldest-first against the taps in order, so the
/// measured impulse response is the tap sequence reversed.  Every catalogue
/// design is symmetric, which makes that identical to direct-form FIR
/// convolution of the taps with the input.
pub struct FirFilter<T> {
    coefficients: FirCoefficients<T>,
    history: Box<[T]>,
    pos: usize,
}

impl<T: Float> FirFilter<T> {
    pub fn new(coefficients: FirCoefficients<T>) -> Self {
        let len = coefficients.len();
        Self {
            coefficients,
            history: vec![T::zero(); len].into_boxed_slice(),
            pos: 0,
        }
    }

    /// Push one sample through the filter.  O(len), allocation-free, never
    /// fails.
    pub fn filter(&mut self, sample: T) -> T {
        let len = self.history.len();
        self.history[self.pos] = sample;

        // Start one slot past the sample just written: the oldest entry.
        let mut h = self.pos + 1;
        if h == len {
            h = 0;
        }

        let mut acc = T::zero();
        for &tap in self.coefficients.taps().iter() {
            acc = acc + self.history[h] * tap;
            h += 1;
            if h == len {
                h = 0;
            }
        }

        self.pos += 1;
        if self.pos == len {
            self.pos = 0;
        }
        acc
    }

    /// Zero the history without touching the taps.
    pub fn reset(&mut self) {
        self.history.fill(T::zero());
        self.pos = 0;
    }

    /// The filter length (tap count).
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn coefficients(&self) -> &FirCoefficients<T> {
        &self.coefficients
    }
}
