use std::time::Duration;

use crate::command::encode_command;
use crate::show::{Channel, FieldValue, Show, ShowError, TimeOfDay};

/// One precomputed command of a channel's sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub destination: String,
    pub command: String,
    /// Running sum of durations up to and including this entry.
    pub offset_secs: u64,
}

impl ScheduleEntry {
    pub fn offset(&self) -> Duration {
        Duration::from_secs(self.offset_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSchedule {
    pub name: String,
    pub destination: String,
    pub entries: Vec<ScheduleEntry>,
}

impl ChannelSchedule {
    /// Time after which this channel's sequence wraps.
    pub fn cycle_length(&self) -> Duration {
        self.entries
            .last()
            .map(ScheduleEntry::offset)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltShow {
    pub name: String,
    pub start_time: TimeOfDay,
    pub stop_time: TimeOfDay,
    pub channels: Vec<ChannelSchedule>,
}

impl BuiltShow {
    /// Cycle length of the channel with the longest cycle.
    pub fn longest_cycle(&self) -> Duration {
        self.channels
            .iter()
            .map(ChannelSchedule::cycle_length)
            .max()
            .unwrap_or_default()
    }
}

fn build_channel(channel: &Channel) -> Result<ChannelSchedule, ShowError> {
    if channel.animations.is_empty() {
        return Err(ShowError::EmptyChannel(channel.display_name().to_string()));
    }

    let mut sum_of_durations = 0u64;
    let mut entries = Vec::with_capacity(channel.animations.len());
    for (index, animation) in channel.animations.iter().enumerate() {
        sum_of_durations = animation
            .duration
            .as_ref()
            .and_then(FieldValue::as_seconds)
            .filter(|secs| *secs > 0)
            .and_then(|secs| sum_of_durations.checked_add(secs as u64))
            .ok_or_else(|| ShowError::InvalidDuration {
                channel: channel.display_name().to_string(),
                index,
            })?;
        entries.push(ScheduleEntry {
            destination: channel.destination.clone(),
            command: encode_command(&channel.channel_type, animation),
            offset_secs: sum_of_durations,
        });
    }

    Ok(ChannelSchedule {
        name: channel.display_name().to_string(),
        destination: channel.destination.clone(),
        entries,
    })
}

/// Precompute every channel's command sequence and cumulative offsets.
pub fn build_show(show: &Show) -> Result<BuiltShow, ShowError> {
    let (start_time, stop_time) = show.validate()?;
    let channels = show
        .channels
        .iter()
        .map(build_channel)
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "Built show '{}': {} channels, longest cycle {}s",
        show.show_name,
        channels.len(),
        channels
            .iter()
            .map(|c| c.cycle_length().as_secs())
            .max()
            .unwrap_or_default()
    );

    Ok(BuiltShow {
        name: show.show_name.clone(),
        start_time,
        stop_time,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::show::{Animation, ChannelType};

    fn animation(name: &str, duration: i64) -> Animation {
        Animation {
            animation: Some(FieldValue::Text(name.to_string())),
            duration: Some(FieldValue::Number(duration.into())),
            ..Animation::default()
        }
    }

    fn show(channels: Vec<Channel>) -> Show {
        Show {
            show_name: "Test".to_string(),
            start_time: "18:00".to_string(),
            stop_time: "23:00".to_string(),
            channels,
        }
    }

    fn channel(destination: &str, animations: Vec<Animation>) -> Channel {
        Channel {
            channel_name: None,
            destination: destination.to_string(),
            channel_type: ChannelType::OnOffFixture,
            animations,
        }
    }

    #[test]
    fn test_cumulative_offsets() {
        let built = build_show(&show(vec![
            channel("a", vec![animation("on", 5), animation("off", 3), animation("toggle", 7)]),
            channel("b", vec![animation("on", 10)]),
        ]))
        .unwrap();

        let a = &built.channels[0];
        let offsets: Vec<u64> = a.entries.iter().map(|e| e.offset_secs).collect();
        assert_eq!(offsets, vec![5, 8, 15]);
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(a.cycle_length(), Duration::from_secs(15));
        assert_eq!(a.entries[1].command, "off");
        assert!(a.entries.iter().all(|e| e.destination == "a"));

        assert_eq!(built.channels[1].cycle_length(), Duration::from_secs(10));
        assert_eq!(built.longest_cycle(), Duration::from_secs(15));
        assert_eq!(built.start_time, TimeOfDay::new(18, 0).unwrap());
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let result = build_show(&show(vec![channel("a", vec![animation("on", 0)])]));
        assert!(matches!(
            result,
            Err(ShowError::InvalidDuration { index: 0, .. })
        ));

        let missing = Animation::default();
        let result = build_show(&show(vec![channel("a", vec![animation("on", 1), missing])]));
        assert!(matches!(
            result,
            Err(ShowError::InvalidDuration { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_overflowing_durations() {
        let result = build_show(&show(vec![channel(
            "a",
            vec![animation("on", i64::MAX), animation("off", i64::MAX), animation("on", i64::MAX)],
        )]));
        assert!(matches!(
            result,
            Err(ShowError::InvalidDuration { index: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_empty_channels() {
        assert!(matches!(build_show(&show(vec![])), Err(ShowError::NoChannels)));
        assert!(matches!(
            build_show(&show(vec![channel("a", vec![])])),
            Err(ShowError::EmptyChannel(_))
        ));
    }
}
