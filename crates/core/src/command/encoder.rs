//! Wire encoding of animation commands.
//!
//! Fixtures subscribe to their own topic and parse a colon separated payload
//! whose shape depends on the fixture type:
//!
//! - pixel fixtures: `color:animation:loopDelay:holdTime:repeatable`
//! - on/off fixtures: `animation`
//! - multi-relay fixtures: `animation:loopDelay`
//!
//! Missing or empty fields fall back to defaults and unknown fixture types get
//! `off`, so a partially filled show never stops playback.

use crate::show::show::wire_bool;
use crate::show::{Animation, ChannelType, FieldValue};

pub const OFF_COMMAND: &str = "off";

const DEFAULT_COLOR: &str = "black";
const DEFAULT_ANIMATION: &str = OFF_COMMAND;
const DEFAULT_LOOP_DELAY: &str = "10";
const DEFAULT_HOLD_TIME: &str = "50";
const DEFAULT_REPEATABLE: bool = true;

fn field_or(field: &Option<FieldValue>, default: &str) -> String {
    field
        .as_ref()
        .and_then(FieldValue::as_wire)
        .unwrap_or_else(|| default.to_string())
}

pub fn encode_command(channel_type: &ChannelType, animation: &Animation) -> String {
    match channel_type {
        ChannelType::PixelFixture => {
            let color = field_or(&animation.color, DEFAULT_COLOR);
            let anim = field_or(&animation.animation, DEFAULT_ANIMATION);
            let loop_delay = field_or(&animation.loop_delay, DEFAULT_LOOP_DELAY);
            let hold_time = field_or(&animation.hold_time, DEFAULT_HOLD_TIME);
            // Any falsy value selects the default.
            let repeatable = match &animation.repeatable {
                Some(value) if value.is_truthy() => {
                    value.as_wire().unwrap_or_else(|| wire_bool(true).to_string())
                }
                _ => wire_bool(DEFAULT_REPEATABLE).to_string(),
            };
            format!("{color}:{anim}:{loop_delay}:{hold_time}:{repeatable}")
        }
        ChannelType::OnOffFixture => field_or(&animation.animation, DEFAULT_ANIMATION),
        ChannelType::MultiRelayFixture => {
            let anim = field_or(&animation.animation, DEFAULT_ANIMATION);
            let loop_delay = field_or(&animation.loop_delay, DEFAULT_LOOP_DELAY);
            format!("{anim}:{loop_delay}")
        }
        ChannelType::Unknown(_) => OFF_COMMAND.to_string(),
    }
}
