//! Windowed-sinc FIR coefficient synthesis.
//!
//! Coefficients are always generated in double precision and narrowed to the
//! filter's working precision at the end, so the window/ideal-response
//! products do not accumulate rounding error in a narrower type.

use num_traits::Float;
use std::f64::consts::PI;
use std::sync::Arc;

use super::window::Window;
use crate::error::{BridgeError, Result};

/// FIR filter response kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
    HighPass,
    BandPass,
    BandStop,
}

#[derive(Debug, Clone, Copy)]
enum Cutoff {
    /// Normalized angular cutoff for low-pass/high-pass.
    Single(f64),
    /// Normalized angular cutoffs (lower, upper) for band-pass/band-stop.
    Band(f64, f64),
}

/// Immutable description of a filter to be designed.
///
/// Construction validates the kind/cutoff arity; an even tap count is bumped
/// to the next odd value so the filter has a center tap.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    kind: FilterKind,
    taps: usize,
    cutoff: Cutoff,
    window: Window,
}

impl FilterSpec {
    /// Describe a low-pass or high-pass filter with a single cutoff.
    pub fn single(
        kind: FilterKind,
        taps: usize,
        cutoff_hz: f64,
        sample_rate: f64,
        window: Window,
    ) -> Result<Self> {
        match kind {
            FilterKind::LowPass | FilterKind::HighPass => {}
            FilterKind::BandPass | FilterKind::BandStop => {
                return Err(BridgeError::FilterDesign(
                    "band-pass and band-stop filters require two cutoffs".into(),
                ));
            }
        }
        Ok(Self {
            kind,
            taps: force_odd(taps),
            cutoff: Cutoff::Single(2.0 * PI * cutoff_hz / sample_rate),
            window,
        })
    }

    /// Describe a band-pass or band-stop filter with lower and upper cutoffs.
    pub fn banded(
        kind: FilterKind,
        taps: usize,
        low_hz: f64,
        high_hz: f64,
        sample_rate: f64,
        window: Window,
    ) -> Result<Self> {
        match kind {
            FilterKind::BandPass | FilterKind::BandStop => {}
            FilterKind::LowPass | FilterKind::HighPass => {
                return Err(BridgeError::FilterDesign(
                    "low-pass and high-pass filters take a single cutoff".into(),
                ));
            }
        }
        Ok(Self {
            kind,
            taps: force_odd(taps),
            cutoff: Cutoff::Band(
                2.0 * PI * low_hz / sample_rate,
                2.0 * PI * high_hz / sample_rate,
            ),
            window,
        })
    }

    /// The tap count the filter will actually be built with (always odd).
    pub fn taps(&self) -> usize {
        self.taps
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }
}

fn force_odd(taps: usize) -> usize {
    if taps.is_multiple_of(2) { taps + 1 } else { taps }
}

/// Ideal (unwindowed) impulse response at sample `n`, with the `n == 0` term
/// taken as the removable-singularity limit instead of sin(x)/x.
fn ideal_response(kind: FilterKind, cutoff: Cutoff, n: i32) -> f64 {
    let nf = n as f64;
    match (kind, cutoff) {
        (FilterKind::LowPass, Cutoff::Single(w)) => {
            if n == 0 {
                w / PI
            } else {
                (w * nf).sin() / (PI * nf)
            }
        }
        (FilterKind::HighPass, Cutoff::Single(w)) => {
            if n == 0 {
                1.0 - (w / PI)
            } else {
                -(w * nf).sin() / (PI * nf)
            }
        }
        (FilterKind::BandPass, Cutoff::Band(w1, w2)) => {
            if n == 0 {
                (w2 - w1) / PI
            } else {
                ((w2 * nf).sin() - (w1 * nf).sin()) / (PI * nf)
            }
        }
        (FilterKind::BandStop, Cutoff::Band(w1, w2)) => {
            if n == 0 {
                1.0 - ((w2 - w1) / PI)
            } else {
                ((w1 * nf).sin() - (w2 * nf).sin()) / (PI * nf)
            }
        }
        // FilterSpec constructors make kind/cutoff arity mismatches
        // unrepresentable.
        _ => unreachable!("kind/cutoff arity enforced at FilterSpec construction"),
    }
}

/// A designed, unity-gain-normalized tap set, shared by the filter that owns
/// it.  `overall_gain` is the sum of absolute tap values before
/// normalization; every stored tap has already been scaled by
/// `gain_correction = 1 / overall_gain`.
#[derive(Debug, Clone)]
pub struct FirCoefficients<T> {
    taps: Arc<[T]>,
    overall_gain: T,
    gain_correction: T,
}

impl<T: Float> FirCoefficients<T> {
    /// Generate coefficients for `spec`.
    pub fn design(spec: &FilterSpec) -> Self {
        let len = spec.taps;
        let limit = (len / 2) as i32;

        let mut taps: Vec<f64> = Vec::with_capacity(len);
        for n in -limit..=limit {
            let wn = spec.window.evaluate(n, len);
            let hn = ideal_response(spec.kind, spec.cutoff, n);
            taps.push(wn * hn);
        }

        // Sum the absolute values smallest-first so the gain figure is not
        // at the mercy of summation order.
        let mut magnitudes: Vec<f64> = taps.iter().map(|c| c.abs()).collect();
        magnitudes.sort_by(f64::total_cmp);
        let overall_gain: f64 = magnitudes.iter().sum();

        let gain_correction = if overall_gain != 0.0 {
            1.0 / overall_gain
        } else {
            1.0
        };
        for tap in &mut taps {
            *tap *= gain_correction;
        }

        Self {
            taps: taps.iter().map(|&c| narrow(c)).collect(),
            overall_gain: narrow(overall_gain),
            gain_correction: narrow(gain_correction),
        }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// The normalized taps.
    pub fn taps(&self) -> &Arc<[T]> {
        &self.taps
    }

    /// Sum of absolute tap values before normalization.
    pub fn overall_gain(&self) -> T {
        self.overall_gain
    }

    /// The factor the taps were scaled by to reach unity passband gain.
    pub fn gain_correction(&self) -> T {
        self.gain_correction
    }
}

/// Narrow a double-precision value to the working precision.  Infallible for
/// any `Float` target.
fn narrow<T: Float>(value: f64) -> T {
    T::from(value).unwrap_or_else(T::zero)
}
