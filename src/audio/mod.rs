pub mod session;

pub use session::{DuplexSession, list_devices};
