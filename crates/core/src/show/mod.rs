pub mod show;
pub mod show_loader;

pub use show::{Animation, Channel, ChannelType, FieldValue, Show, ShowError, TimeOfDay};
pub use show_loader::ShowLoader;
