pub mod window;

pub use window::{ShowWindow, AFTER_MIDNIGHT_MAX_HOUR};
