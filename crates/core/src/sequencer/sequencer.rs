//! Polling loop that plays a built show.
//!
//! Every channel keeps its own cursor into its schedule, while a single
//! elapsed counter is shared by all of them. An entry is dispatched once the
//! counter reaches its cumulative offset, and the counter restarts after the
//! longest cycle in the show. A channel whose cycle is shorter than the
//! longest one wraps while the counter is still past all of its offsets, so
//! until the counter restarts it fires one entry on every tick, strobing
//! through its sequence. After the restart it falls out of phase with its own
//! cycle.

use std::time::Duration;

use chrono::NaiveDateTime;

use super::off_guard::OffGuard;
use crate::clock::Clock;
use crate::command::OFF_COMMAND;
use crate::config::Settings;
use crate::schedule::{BuiltShow, ScheduleEntry};
use crate::sink::CommandSink;
use crate::window::ShowWindow;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerConfig {
    pub poll_interval: Duration,
    pub idle_interval: Duration,
    pub max_off_attempts: u32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for SequencerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            idle_interval: settings.idle_interval(),
            max_off_attempts: settings.max_off_attempts,
        }
    }
}

/// Mutable playback state, owned by the sequencer loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerState {
    pub cursors: Vec<usize>,
    pub elapsed: Duration,
    pub show_started: bool,
    pub off_guard: OffGuard,
}

impl SequencerState {
    pub fn new(channel_count: usize, max_off_attempts: u32) -> Self {
        Self {
            cursors: vec![0; channel_count],
            elapsed: Duration::ZERO,
            show_started: false,
            off_guard: OffGuard::new(max_off_attempts),
        }
    }

    /// Rewind every channel to the beginning of its sequence.
    pub fn rewind(&mut self) {
        self.cursors.iter_mut().for_each(|cursor| *cursor = 0);
        self.elapsed = Duration::ZERO;
        self.show_started = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// First tick of an active period.
    ShowStart,
    Active,
    Inactive,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub kind: TickKind,
    /// Commands handed to the sink, failed ones included.
    pub dispatched: usize,
    /// How long to wait before the next tick.
    pub sleep: Duration,
}

fn dispatch<S: CommandSink + ?Sized>(sink: &mut S, destination: &str, payload: &str, offset_secs: u64) {
    log::info!("{} ({} secs) --> {}", destination, offset_secs, payload);
    if let Err(e) = sink.send(destination, payload) {
        log::warn!("Failed to send '{}' to {}: {}", payload, destination, e);
    }
}

fn dispatch_entry<S: CommandSink + ?Sized>(sink: &mut S, entry: &ScheduleEntry) {
    dispatch(sink, &entry.destination, &entry.command, entry.offset_secs);
}

fn advance(cursor: &mut usize, len: usize) {
    *cursor += 1;
    if *cursor >= len {
        *cursor = 0;
    }
}

/// Advance `state` by one tick at instant `now`.
pub fn tick<S: CommandSink + ?Sized>(
    show: &BuiltShow,
    config: &SequencerConfig,
    state: &mut SequencerState,
    now: NaiveDateTime,
    sink: &mut S,
) -> Tick {
    let window = ShowWindow::for_today(show.start_time, show.stop_time, now);
    if !window.contains(now) {
        return idle_tick(show, config, state, sink);
    }

    state.off_guard.reset();
    state.elapsed += config.poll_interval;

    if !state.show_started {
        state.show_started = true;
        log::info!("***** Starting Show '{}' ({}) *****", show.name, window);

        for (channel, cursor) in show.channels.iter().zip(state.cursors.iter_mut()) {
            dispatch_entry(sink, &channel.entries[*cursor]);
            advance(cursor, channel.entries.len());
        }
        return Tick {
            kind: TickKind::ShowStart,
            dispatched: show.channels.len(),
            sleep: Duration::ZERO,
        };
    }

    let mut dispatched = 0;
    for (channel, cursor) in show.channels.iter().zip(state.cursors.iter_mut()) {
        let entry = &channel.entries[*cursor];
        if entry.offset() <= state.elapsed {
            dispatch_entry(sink, entry);
            advance(cursor, channel.entries.len());
            dispatched += 1;
        }
    }

    if state.elapsed >= show.longest_cycle() {
        state.elapsed = Duration::ZERO;
    }

    Tick {
        kind: TickKind::Active,
        dispatched,
        sleep: config.poll_interval,
    }
}

fn idle_tick<S: CommandSink + ?Sized>(
    show: &BuiltShow,
    config: &SequencerConfig,
    state: &mut SequencerState,
    sink: &mut S,
) -> Tick {
    if state.show_started {
        log::info!("Show '{}' window closed", show.name);
    }
    state.rewind();

    let mut dispatched = 0;
    if state.off_guard.try_acquire() {
        log::info!(
            "Turning all channels off (attempt {})",
            state.off_guard.attempts()
        );
        for channel in &show.channels {
            dispatch(sink, &channel.destination, OFF_COMMAND, 0);
            dispatched += 1;
        }
        if state.off_guard.exhausted() {
            log::debug!("Off commands done, idling every {:?}", config.idle_interval);
        }
    }

    Tick {
        kind: TickKind::Inactive,
        dispatched,
        sleep: config.idle_interval,
    }
}

/// Owns a built show and its playback state for the lifetime of a run.
pub struct Sequencer {
    show: BuiltShow,
    config: SequencerConfig,
    state: SequencerState,
}

impl Sequencer {
    pub fn new(show: BuiltShow, config: SequencerConfig) -> Self {
        let state = SequencerState::new(show.channels.len(), config.max_off_attempts);
        Self {
            show,
            config,
            state,
        }
    }

    pub fn show(&self) -> &BuiltShow {
        &self.show
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn tick<S: CommandSink + ?Sized>(&mut self, now: NaiveDateTime, sink: &mut S) -> Tick {
        tick(&self.show, &self.config, &mut self.state, now, sink)
    }

    /// Send `off` to every channel once. Returns the number of commands sent.
    pub fn all_off<S: CommandSink + ?Sized>(&self, sink: &mut S) -> usize {
        for channel in &self.show.channels {
            dispatch(sink, &channel.destination, OFF_COMMAND, 0);
        }
        self.show.channels.len()
    }

    /// Play the show until the process is stopped.
    pub async fn run<C: Clock, S: CommandSink + ?Sized>(&mut self, clock: &C, sink: &mut S) {
        log::info!(
            "Running show '{}' daily from {} to {}",
            self.show.name,
            self.show.start_time,
            self.show.stop_time
        );
        loop {
            let tick = self.tick(clock.now(), sink);
            if !tick.sleep.is_zero() {
                tokio::time::sleep(tick.sleep).await;
            }
        }
    }
}
