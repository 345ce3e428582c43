pub mod schedule;

pub use schedule::{build_show, BuiltShow, ChannelSchedule, ScheduleEntry};
