use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or preparing a show. All of them are reported
/// before the sequencer starts.
#[derive(Debug, Error)]
pub enum ShowError {
    #[error("No show file at {0}")]
    NotFound(PathBuf),

    #[error("Failed to read show file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Show file is not a valid PiLit file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Show file is missing {0}")]
    MissingField(&'static str),

    #[error("Show has no channels")]
    NoChannels,

    #[error("Channel '{0}' has no animations")]
    EmptyChannel(String),

    #[error("Invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Animation {index} on channel '{channel}' has an invalid duration")]
    InvalidDuration { channel: String, index: usize },
}

/// A wall-clock time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ShowError> {
        if hour > 23 || minute > 59 {
            return Err(ShowError::InvalidTime(format!("{}:{}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }
}

impl FromStr for TimeOfDay {
    type Err = ShowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ShowError::InvalidTime(s.to_string());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Kind of fixture behind a channel. Decides how animations are encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelType {
    PixelFixture,
    OnOffFixture,
    MultiRelayFixture,
    Unknown(String),
}

impl From<String> for ChannelType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "PixelNode" | "PixelTree" | "PixelFixture" => ChannelType::PixelFixture,
            "OnOffNode" | "OnOffFixture" => ChannelType::OnOffFixture,
            "MultiRelayNode" | "MultiRelayFixture" => ChannelType::MultiRelayFixture,
            _ => ChannelType::Unknown(name),
        }
    }
}

impl From<ChannelType> for String {
    fn from(channel_type: ChannelType) -> Self {
        match channel_type {
            ChannelType::PixelFixture => "PixelNode".to_string(),
            ChannelType::OnOffFixture => "OnOffNode".to_string(),
            ChannelType::MultiRelayFixture => "MultiRelayNode".to_string(),
            ChannelType::Unknown(name) => name,
        }
    }
}

/// A loosely typed animation field. Show editors write numbers and strings
/// interchangeably, so both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Wire text for this value, or `None` when it counts as unset.
    pub fn as_wire(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) if s.is_empty() => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Bool(b) => Some(wire_bool(*b).to_string()),
        }
    }

    /// Falsy values: false, zero and the empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Bool(b) => *b,
            FieldValue::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
            FieldValue::Text(s) => !s.is_empty(),
        }
    }

    pub fn as_seconds(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => n.as_i64(),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Bool(_) => None,
        }
    }
}

pub(crate) fn wire_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    #[serde(default)]
    pub animation: Option<FieldValue>,
    #[serde(default)]
    pub color: Option<FieldValue>,
    #[serde(default)]
    pub loop_delay: Option<FieldValue>,
    #[serde(default)]
    pub hold_time: Option<FieldValue>,
    #[serde(default)]
    pub repeatable: Option<FieldValue>,
    #[serde(default)]
    pub duration: Option<FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(rename = "mqttName")]
    pub destination: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    #[serde(default)]
    pub animations: Vec<Animation>,
}

impl Channel {
    /// Name used in log lines.
    pub fn display_name(&self) -> &str {
        self.channel_name.as_deref().unwrap_or(&self.destination)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    #[serde(default)]
    pub show_name: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub stop_time: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Show {
    /// Checks the fields the player relies on and returns the parsed
    /// start/stop times.
    pub fn validate(&self) -> Result<(TimeOfDay, TimeOfDay), ShowError> {
        if self.show_name.trim().is_empty() {
            return Err(ShowError::MissingField("showName"));
        }
        if self.start_time.trim().is_empty() {
            return Err(ShowError::MissingField("startTime"));
        }
        if self.stop_time.trim().is_empty() {
            return Err(ShowError::MissingField("stopTime"));
        }
        if self.channels.is_empty() {
            return Err(ShowError::NoChannels);
        }
        Ok((self.start_time.parse()?, self.stop_time.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!("17:30".parse::<TimeOfDay>().unwrap(), TimeOfDay::new(17, 30).unwrap());
        assert_eq!("0:05".parse::<TimeOfDay>().unwrap(), TimeOfDay::new(0, 5).unwrap());
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_channel_type_aliases() {
        assert_eq!(ChannelType::from("PixelTree".to_string()), ChannelType::PixelFixture);
        assert_eq!(ChannelType::from("OnOffNode".to_string()), ChannelType::OnOffFixture);
        assert_eq!(
            ChannelType::from("MultiRelayFixture".to_string()),
            ChannelType::MultiRelayFixture
        );
        assert_eq!(
            ChannelType::from("MegaTree".to_string()),
            ChannelType::Unknown("MegaTree".to_string())
        );
    }

    #[test]
    fn test_deserialize_show() {
        let json = r#"{
            "showName": "Yard",
            "startTime": "18:00",
            "stopTime": "00:30",
            "channels": [{
                "channelName": "Arches",
                "mqttName": "arches",
                "type": "PixelNode",
                "animations": [
                    {"animation": "chase", "color": "red", "loopDelay": "", "duration": 5},
                    {"animation": "off", "duration": "10"}
                ]
            }]
        }"#;
        let show: Show = serde_json::from_str(json).unwrap();
        let (start, stop) = show.validate().unwrap();
        assert_eq!(start, TimeOfDay::new(18, 0).unwrap());
        assert_eq!(stop, TimeOfDay::new(0, 30).unwrap());

        let channel = &show.channels[0];
        assert_eq!(channel.destination, "arches");
        assert_eq!(channel.channel_type, ChannelType::PixelFixture);
        assert_eq!(channel.animations[0].loop_delay, Some(FieldValue::Text(String::new())));
        assert_eq!(channel.animations[1].duration.as_ref().and_then(FieldValue::as_seconds), Some(10));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut show = Show {
            show_name: "Yard".to_string(),
            start_time: "18:00".to_string(),
            stop_time: "22:00".to_string(),
            channels: vec![],
        };
        assert!(matches!(show.validate(), Err(ShowError::NoChannels)));

        show.stop_time.clear();
        assert!(matches!(show.validate(), Err(ShowError::MissingField("stopTime"))));
    }

    #[test]
    fn test_field_value_wire_text() {
        assert_eq!(FieldValue::Text(String::new()).as_wire(), None);
        assert_eq!(FieldValue::Text("red".into()).as_wire(), Some("red".to_string()));
        assert_eq!(FieldValue::Number(25.into()).as_wire(), Some("25".to_string()));
        assert_eq!(FieldValue::Bool(false).as_wire(), Some("False".to_string()));
        assert!(!FieldValue::Bool(false).is_truthy());
        assert!(FieldValue::Text("yes".into()).is_truthy());
    }
}
