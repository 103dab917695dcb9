pub mod coefficients;
pub mod fir;
pub mod window;

pub use coefficients::{FilterKind, FilterSpec, FirCoefficients};
pub use fir::FirFilter;
pub use window::Window;
