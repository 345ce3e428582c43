pub mod encoder;

pub use encoder::{encode_command, OFF_COMMAND};
