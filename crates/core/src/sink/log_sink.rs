use super::traits::{CommandSink, SinkError};

/// Dry-run sink: commands are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl CommandSink for LogSink {
    fn send(&mut self, destination: &str, payload: &str) -> Result<(), SinkError> {
        log::debug!("[dry-run] {} <- {}", destination, payload);
        Ok(())
    }
}
