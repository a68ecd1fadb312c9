//! In-memory two-deck simulator used by engine tests (§5.1 of SPEC_FULL.md).
//! No audio device is touched; deck fields are plain struct members.

use color_eyre::Result;

use crate::config::PlayerRouting;
use crate::player::{MediaState, PlayerBackend, Unit};

#[derive(Debug, Clone, Copy)]
struct Deck {
    volume: f32,
    uri: Option<String>,
    state: MediaState,
    buffer_percent: u32,
    duration_ms: u32,
    position_ms: u32,
}

impl Default for Deck {
    fn default() -> Self {
        Deck {
            volume: 0.0,
            uri: None,
            state: MediaState::Stopped,
            buffer_percent: 0,
            duration_ms: 0,
            position_ms: 0,
        }
    }
}

/// Test double for [`PlayerBackend`]. Tests can poke `duration_ms`,
/// `position_ms`, and `state` directly via the setters below to simulate
/// backend-reported playback progress and media errors.
#[derive(Debug, Clone, Default)]
pub struct NullBackend {
    a: Deck,
    b: Deck,
    current: Option<Unit>,
}

impl NullBackend {
    fn deck(&self, unit: Unit) -> &Deck {
        match unit {
            Unit::A => &self.a,
            Unit::B => &self.b,
        }
    }

    fn deck_mut(&mut self, unit: Unit) -> &mut Deck {
        match unit {
            Unit::A => &mut self.a,
            Unit::B => &mut self.b,
        }
    }

    /// Test hook: force a deck's reported duration/position, simulating
    /// backend playback progress without a real clock.
    pub fn set_progress(&mut self, unit: Unit, position_ms: u32, duration_ms: u32) {
        let deck = self.deck_mut(unit);
        deck.position_ms = position_ms;
        deck.duration_ms = duration_ms;
    }

    /// Test hook: force a deck's reported media state.
    pub fn set_media_state(&mut self, unit: Unit, state: MediaState) {
        self.deck_mut(unit).state = state;
    }

    pub fn uri(&self, unit: Unit) -> Option<&str> {
        self.deck(unit).uri.as_deref()
    }
}

impl PlayerBackend for NullBackend {
    fn init_block_player(&mut self, _routing: &PlayerRouting) -> Result<()> {
        Ok(())
    }

    fn init_time_signal_player(&mut self, _routing: &PlayerRouting) -> Result<()> {
        Ok(())
    }

    fn set_volume(&mut self, unit: Unit, v: f32) {
        self.deck_mut(unit).volume = v.clamp(0.0, 1.0);
    }

    fn get_volume(&self, unit: Unit) -> f32 {
        self.deck(unit).volume
    }

    fn set_uri(&mut self, unit: Unit, uri: &str) {
        self.deck_mut(unit).uri = Some(uri.to_string());
    }

    fn set_state_null(&mut self, unit: Unit) {
        self.deck_mut(unit).state = MediaState::Other;
    }

    fn set_state_ready(&mut self, unit: Unit) {
        self.deck_mut(unit).state = MediaState::Stopped;
    }

    fn set_state_paused(&mut self, unit: Unit) {
        self.deck_mut(unit).state = MediaState::Other;
    }

    fn set_state_playing(&mut self, unit: Unit) {
        let deck = self.deck_mut(unit);
        deck.state = MediaState::Playing;
        deck.position_ms = 0;
    }

    fn set_current_unit(&mut self, unit: Unit) {
        self.current = Some(unit);
    }

    fn get_current_unit(&self) -> Unit {
        self.current.unwrap_or(Unit::A)
    }

    fn get_state(&self, unit: Unit) -> MediaState {
        self.deck(unit).state
    }

    fn get_buffer_percent(&self, unit: Unit) -> u32 {
        self.deck(unit).buffer_percent
    }

    fn get_duration_ms(&self, unit: Unit) -> u32 {
        self.deck(unit).duration_ms
    }

    fn get_position_ms(&self, unit: Unit) -> u32 {
        self.deck(unit).position_ms
    }
}
