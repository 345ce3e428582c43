pub use clock::{Clock, SystemClock};
pub use command::{encode_command, OFF_COMMAND};
pub use config::{ConfigError, ConfigManager, ConfigSchema, Settings};
pub use schedule::{build_show, BuiltShow, ChannelSchedule, ScheduleEntry};
pub use sequencer::{
    tick, OffGuard, Sequencer, SequencerConfig, SequencerState, Tick, TickKind,
};
pub use show::{Animation, Channel, ChannelType, FieldValue, Show, ShowError, ShowLoader, TimeOfDay};
// Command sink exports
pub use sink::mqtt_sink::MqttConfig;
pub use sink::{CommandSink, LogSink, MqttSink, SinkError};
pub use window::{ShowWindow, AFTER_MIDNIGHT_MAX_HOUR};

mod clock;
mod command;
mod config;
mod schedule;
mod sequencer;
mod show;
mod sink;
mod window;
