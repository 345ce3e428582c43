pub mod log_sink;
pub mod mqtt_sink;
pub mod traits;

// Re-export for convenience
pub use log_sink::LogSink;
pub use mqtt_sink::MqttSink;
pub use traits::{CommandSink, SinkError};
