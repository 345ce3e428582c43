use thiserror::Error;

/// Errors a sink may report for a single dispatch. The sequencer logs them
/// and moves on.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Publish to '{destination}' failed: {reason}")]
    PublishFailed { destination: String, reason: String },
}

/// Receives encoded commands for fixture destinations.
pub trait CommandSink {
    fn send(&mut self, destination: &str, payload: &str) -> Result<(), SinkError>;
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn send(&mut self, destination: &str, payload: &str) -> Result<(), SinkError> {
        (**self).send(destination, payload)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn send(&mut self, destination: &str, payload: &str) -> Result<(), SinkError> {
        (**self).send(destination, payload)
    }
}
