//! Two-deck player abstraction (§4.5, §6.5). A player owns two independently
//! addressable decks and a "current unit" selector; the engine never talks
//! to an audio backend directly.

pub mod null;
pub mod rodio_backend;

use color_eyre::Result;

use crate::config::PlayerRouting;

/// One of the two decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    A,
    B,
}

impl Unit {
    pub fn other(self) -> Unit {
        match self {
            Unit::A => Unit::B,
            Unit::B => Unit::A,
        }
    }
}

/// Per-deck backend-reported playback state (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Error,
    Buffering,
    Stopped,
    Playing,
    Other,
}

/// The contract a playback backend must satisfy (§6.5). Implemented by
/// [`null::NullBackend`] for tests and [`rodio_backend::RodioBackend`] for
/// real audio output.
pub trait PlayerBackend {
    fn init_block_player(&mut self, routing: &PlayerRouting) -> Result<()>;
    fn init_time_signal_player(&mut self, routing: &PlayerRouting) -> Result<()>;

    fn set_volume(&mut self, unit: Unit, v: f32);
    /// `v += slope*(limit - v)`, clamped to `[0,1]`.
    fn set_volume_increment(&mut self, unit: Unit, slope: f32, limit: f32) {
        let v = self.get_volume(unit);
        self.set_volume(unit, (v + slope * (limit - v)).clamp(0.0, 1.0));
    }
    fn get_volume(&self, unit: Unit) -> f32;

    fn set_uri(&mut self, unit: Unit, uri: &str);

    fn set_state_null(&mut self, unit: Unit);
    fn set_state_ready(&mut self, unit: Unit);
    fn set_state_paused(&mut self, unit: Unit);
    /// Starts playback from the previously-set URI if the deck was idle.
    fn set_state_playing(&mut self, unit: Unit);

    fn set_current_unit(&mut self, unit: Unit);
    fn swap_current_unit(&mut self) {
        let other = self.get_current_unit().other();
        self.set_current_unit(other);
    }
    fn get_current_unit(&self) -> Unit;

    fn get_state(&self, unit: Unit) -> MediaState;
    /// `0..=100`.
    fn get_buffer_percent(&self, unit: Unit) -> u32;
    /// `0` means unknown/streaming.
    fn get_duration_ms(&self, unit: Unit) -> u32;
    fn get_position_ms(&self, unit: Unit) -> u32;
}
