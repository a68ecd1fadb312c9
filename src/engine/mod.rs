//! The playback state machine shared by the block-scheduling engine
//! (§4.6.1-4.6.3) and the time-signal engine (§4.6.4). Both engines tick
//! through the same `PlayCurrent`/`PlayPrevious`/`PlayNext`/`PlayDefault`/
//! `Crossfade`/`FadeOut` states; only their Monitor states differ, and those
//! live in `block_engine.rs`/`time_signal_engine.rs`.

pub mod block_engine;
pub mod time_signal_engine;

use crate::log::{self, LogMessage};
use crate::playlist::{self, Playlist};
use crate::player::{MediaState, PlayerBackend, Unit};

/// One state of the shared automaton (§3 "Engine state").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Null,
    MonitorScheduleHard,
    MonitorScheduleSoft,
    MonitorTimeSignal,
    PlayDefault,
    PlayPrevious,
    PlayNext,
    PlayCurrent,
    Crossfade,
    FadeOut,
}

/// Shared fields of both engines (§3 "Engine state"). `pending_playlist` is
/// only ever set by the soft-schedule monitor; the hard-schedule and
/// time-signal monitors leave it permanently `false`.
pub struct Engine {
    pub state: EngineState,
    pub elapsed_ms: u32,
    pub deadline_ms: u32,
    pub playlist: Playlist,
    pub cursor: Option<usize>,
    pub pending_playlist: bool,
}

impl Engine {
    pub fn new(initial_monitor: EngineState) -> Self {
        Engine {
            state: initial_monitor,
            elapsed_ms: 0,
            deadline_ms: 0,
            playlist: Playlist::new(),
            cursor: None,
            pending_playlist: false,
        }
    }

    fn goto(&mut self, state: EngineState, deadline_ms: u32) {
        self.state = state;
        self.elapsed_ms = 0;
        self.deadline_ms = deadline_ms;
    }

    /// Replaces the playlist with a fresh expansion of `block_name`, moving
    /// the cursor to the head. Logs the matching message kind.
    pub fn load_block(&mut self, block_name: &str, catalog: &crate::block::Catalog, log_file: Option<&camino::Utf8Path>, make_message: impl FnOnce(String) -> LogMessage) {
        self.playlist.clear();
        playlist::expand(&mut self.playlist, block_name, catalog, 0);
        self.cursor = if self.playlist.is_empty() { None } else { Some(0) };
        if let Some(path) = log_file
            && let Err(err) = log::write(path, &make_message(block_name.to_string()))
        {
            tracing::error!(?err, "could not write to log file");
        }
    }

    /// §4.6.1 `PlayCurrent`.
    pub fn play_current(&mut self, backend: &mut dyn PlayerBackend, fade_out_time_ms: u32, log_file: Option<&camino::Utf8Path>) {
        let Some(cursor) = self.cursor else {
            self.goto(EngineState::Null, 0);
            return;
        };
        backend.swap_current_unit();
        let unit = backend.get_current_unit();
        backend.set_volume(unit, 0.0);
        let uri = self.playlist[cursor].clone();
        backend.set_uri(unit, &uri);
        backend.set_state_playing(unit);
        if let Some(path) = log_file
            && let Err(err) = log::write(path, &LogMessage::Uri(uri))
        {
            tracing::error!(?err, "could not write to log file");
        }
        self.goto(EngineState::Crossfade, fade_out_time_ms);
    }

    /// §4.6.1 `PlayPrevious`/`PlayNext`, parameterized by direction and the
    /// default-block fallback behavior shared with `PlayDefault`.
    fn play_step(
        &mut self,
        step: i64,
        default_on: bool,
        default_block_name: Option<&str>,
        catalog: &crate::block::Catalog,
        log_file: Option<&camino::Utf8Path>,
        fade_out_time_ms: u32,
    ) {
        let Some(cursor) = self.cursor else {
            self.goto(EngineState::Null, 0);
            return;
        };
        let new_cursor = cursor as i64 + step;
        if new_cursor < 0 || new_cursor as usize >= self.playlist.len() {
            self.playlist.clear();
            self.cursor = None;
            if default_on && let Some(name) = default_block_name {
                self.load_block(name, catalog, log_file, LogMessage::DefaultBlock);
                self.state = EngineState::PlayCurrent;
            } else {
                self.goto(EngineState::FadeOut, fade_out_time_ms);
            }
        } else {
            self.cursor = Some(new_cursor as usize);
            self.state = EngineState::PlayCurrent;
        }
    }

    pub fn play_previous(
        &mut self,
        default_on: bool,
        default_block_name: Option<&str>,
        catalog: &crate::block::Catalog,
        log_file: Option<&camino::Utf8Path>,
        fade_out_time_ms: u32,
    ) {
        self.play_step(-1, default_on, default_block_name, catalog, log_file, fade_out_time_ms);
    }

    pub fn play_next(
        &mut self,
        default_on: bool,
        default_block_name: Option<&str>,
        catalog: &crate::block::Catalog,
        log_file: Option<&camino::Utf8Path>,
        fade_out_time_ms: u32,
    ) {
        self.play_step(1, default_on, default_block_name, catalog, log_file, fade_out_time_ms);
    }

    /// §4.6.1 `PlayDefault`.
    pub fn play_default(
        &mut self,
        default_on: bool,
        default_block_name: Option<&str>,
        catalog: &crate::block::Catalog,
        log_file: Option<&camino::Utf8Path>,
        fade_out_time_ms: u32,
    ) {
        self.playlist.clear();
        self.cursor = None;
        if default_on && let Some(name) = default_block_name {
            self.load_block(name, catalog, log_file, LogMessage::DefaultBlock);
            self.state = EngineState::PlayCurrent;
        } else {
            self.goto(EngineState::FadeOut, fade_out_time_ms);
        }
    }

    /// §4.6.1 `Crossfade`. Ramps the current deck up and the other deck down.
    pub fn crossfade_tick(&mut self, backend: &mut dyn PlayerBackend, period_ms: u32, target_volume: f32, slope: f32) {
        let current = backend.get_current_unit();
        let other = current.other();
        backend.set_volume_increment(current, slope, target_volume);
        backend.set_volume_increment(other, slope, 0.0);

        self.elapsed_ms += period_ms;
        if self.elapsed_ms >= self.deadline_ms {
            backend.set_volume(current, target_volume);
            backend.set_volume(other, 0.0);
            backend.set_state_ready(other);
            self.goto(EngineState::Null, 0);
        }
    }

    /// §4.6.1 `FadeOut`. Ramps both decks toward silence.
    pub fn fade_out_tick(&mut self, backend: &mut dyn PlayerBackend, period_ms: u32, slope: f32) {
        backend.set_volume_increment(Unit::A, slope, 0.0);
        backend.set_volume_increment(Unit::B, slope, 0.0);

        self.elapsed_ms += period_ms;
        if self.elapsed_ms >= self.deadline_ms {
            backend.set_volume(Unit::A, 0.0);
            backend.set_volume(Unit::B, 0.0);
            backend.set_state_ready(Unit::A);
            backend.set_state_ready(Unit::B);
            self.goto(EngineState::Null, 0);
        }
    }

    /// §4.6.5: honored only from the two Monitor states.
    pub fn request_skip(&mut self, target: EngineState, fade_out_time_ms: u32, is_monitor_state: bool) {
        if is_monitor_state {
            self.goto(target, fade_out_time_ms);
        }
    }

    /// Shared deck-state inspection (§4.6.2 step 7 / §4.6.4 step 4).
    /// Returns the state to transition to, if any action is warranted.
    pub fn inspect_current_deck(
        &self,
        backend: &mut dyn PlayerBackend,
        fade_out_time_ms: u32,
        pending_playlist: Option<bool>,
    ) -> Option<EngineState> {
        let unit = backend.get_current_unit();
        match backend.get_state(unit) {
            MediaState::Error => {
                backend.set_state_ready(unit);
                Some(self.resolve_next_or_current(pending_playlist))
            }
            MediaState::Stopped => Some(self.resolve_next_or_current(pending_playlist)),
            MediaState::Playing => {
                let duration = backend.get_duration_ms(unit);
                let position = backend.get_position_ms(unit);
                if duration > 0 && duration.saturating_sub(position) <= fade_out_time_ms {
                    Some(self.resolve_next_or_current(pending_playlist))
                } else {
                    None
                }
            }
            MediaState::Buffering | MediaState::Other => None,
        }
    }

    /// Soft monitor: if `pending_playlist` is set, clear it and cut to
    /// `PlayCurrent`; otherwise keep riding the old playlist via `PlayNext`.
    /// Hard/time-signal monitors pass `None` and always get `PlayNext`.
    fn resolve_next_or_current(&self, pending_playlist: Option<bool>) -> EngineState {
        match pending_playlist {
            Some(true) => EngineState::PlayCurrent,
            _ => EngineState::PlayNext,
        }
    }
}
