//! Window function catalogue for FIR coefficient design.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Window functions available to the coefficient generator.
///
/// All windows are evaluated for an odd-length window centered at zero, with
/// the sample index `n` ranging over `[-len/2, +len/2]`.  Adding a window is
/// a matter of adding a variant and a match arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum Window {
    Rectangle,
    Hamming,
    Hann,
    Blackman,
    Nuttall,
    BlackmanNuttall,
    BlackmanHarris,
    FlatTop,
}

impl Window {
    /// Evaluate the window at sample `n` for a window of `len` samples.
    pub fn evaluate(self, n: i32, len: usize) -> f64 {
        // All catalogue entries are cosine sums over the same base argument.
        let x = 2.0 * PI * (n + (len as i32 / 2)) as f64 / (len - 1) as f64;
        match self {
            Window::Rectangle => 1.0,
            Window::Hamming => 0.54 - 0.46 * x.cos(),
            Window::Hann => 0.50 * (1.0 - x.cos()),
            Window::Blackman => {
                (7938.0 / 18608.0) - (9240.0 / 18608.0) * x.cos()
                    + (1430.0 / 18608.0) * (2.0 * x).cos()
            }
            Window::Nuttall => {
                0.355768 - 0.487396 * x.cos() + 0.144232 * (2.0 * x).cos()
                    - 0.012604 * (3.0 * x).cos()
            }
            Window::BlackmanNuttall => {
                0.3635819 - 0.4891775 * x.cos() + 0.1365995 * (2.0 * x).cos()
                    - 0.0106511 * (3.0 * x).cos()
            }
            Window::BlackmanHarris => {
                0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                    - 0.01168 * (3.0 * x).cos()
            }
            Window::FlatTop => {
                1.0 - 1.93 * x.cos() + 1.29 * (2.0 * x).cos() - 0.388 * (3.0 * x).cos()
                    + 0.028 * (4.0 * x).cos()
            }
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Window::Rectangle => "rectangle",
            Window::Hamming => "hamming",
            Window::Hann => "hann",
            Window::Blackman => "blackman",
            Window::Nuttall => "nuttall",
            Window::BlackmanNuttall => "blackman-nuttall",
            Window::BlackmanHarris => "blackman-harris",
            Window::FlatTop => "flat-top",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ALL: [Window; 8] = [
        Window::Rectangle,
        Window::Hamming,
        Window::Hann,
        Window::Blackman,
        Window::Nuttall,
        Window::BlackmanNuttall,
        Window::BlackmanHarris,
        Window::FlatTop,
    ];

    #[test]
    fn test_windows_symmetric() {
        for window in ALL {
            for n in 1..=7 {
                assert_relative_eq!(
                    window.evaluate(n, 15),
                    window.evaluate(-n, 15),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_windows_peak_at_center() {
        for window in ALL {
            let center = window.evaluate(0, 15);
            for n in 1..=7 {
                assert!(
                    window.evaluate(n, 15) <= center + 1e-12,
                    "{} exceeds center value at n={}",
                    window,
                    n
                );
            }
        }
    }

    #[test]
    fn test_hamming_values() {
        // Center of the Hamming window is 0.54 + 0.46 = 1.0, edges are 0.08.
        assert_relative_eq!(Window::Hamming.evaluate(0, 15), 1.0, epsilon = 1e-12);
        assert_relative_eq!(Window::Hamming.evaluate(-7, 15), 0.08, epsilon = 1e-12);
        assert_relative_eq!(Window::Hamming.evaluate(7, 15), 0.08, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_top_center() {
        // 1 + 1.93 + 1.29 + 0.388 + 0.028 with alternating cosine signs at
        // the window center.
        assert_relative_eq!(Window::FlatTop.evaluate(0, 15), 4.636, epsilon = 1e-9);
    }

    #[test]
    fn test_rectangle_is_flat() {
        for n in -7..=7 {
            assert_eq!(Window::Rectangle.evaluate(n, 15), 1.0);
        }
    }
}
