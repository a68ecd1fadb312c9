//! Real audio backend built on `rodio`. Grounded on the teacher's original
//! single-deck sketch: one `OutputStream` per deck, a stoppable/periodic
//! source so volume and stop requests cross from the engine thread without
//! blocking it.

use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use color_eyre::Result;
use color_eyre::eyre::Context;
use rodio::{Decoder, OutputStream, Source};

use crate::config::PlayerRouting;
use crate::player::{MediaState, PlayerBackend, Unit};

struct DeckHandle {
    stream: Option<OutputStream>,
    volume: Arc<Mutex<f32>>,
    stop: Arc<AtomicBool>,
    error: Arc<AtomicBool>,
    duration_ms: Arc<AtomicU32>,
    started_at: Option<Instant>,
    uri: Option<String>,
    state: MediaState,
}

impl Default for DeckHandle {
    fn default() -> Self {
        DeckHandle {
            stream: None,
            volume: Arc::new(Mutex::new(0.0)),
            stop: Arc::new(AtomicBool::new(false)),
            error: Arc::new(AtomicBool::new(false)),
            duration_ms: Arc::new(AtomicU32::new(0)),
            started_at: None,
            uri: None,
            state: MediaState::Stopped,
        }
    }
}

/// Two independently driven playback pipelines, one per [`Unit`].
#[derive(Default)]
pub struct RodioBackend {
    a: DeckHandle,
    b: DeckHandle,
    current: Option<Unit>,
}

impl RodioBackend {
    fn deck(&self, unit: Unit) -> &DeckHandle {
        match unit {
            Unit::A => &self.a,
            Unit::B => &self.b,
        }
    }

    fn deck_mut(&mut self, unit: Unit) -> &mut DeckHandle {
        match unit {
            Unit::A => &mut self.a,
            Unit::B => &mut self.b,
        }
    }

    fn play_uri(&mut self, unit: Unit) -> Result<()> {
        let Some(uri) = self.deck(unit).uri.clone() else {
            return Ok(());
        };
        let path = uri_to_path(&uri);
        let file = BufReader::new(
            File::open(&path).wrap_err_with(|| format!("Could not open media file: {path}"))?,
        );
        let decoder = Decoder::try_from(file).wrap_err_with(|| format!("Could not decode: {path}"))?;
        let duration_ms = decoder
            .total_duration()
            .map(|d| d.as_millis() as u32)
            .unwrap_or(0);

        let stream = rodio::speakers::SpeakersBuilder::new()
            .default_device()
            .wrap_err("No default audio output device")?
            .default_config()
            .wrap_err("Could not determine default output config")?
            .open_stream()
            .wrap_err("Could not open audio output")?;

        let deck = self.deck_mut(unit);
        deck.stop.store(false, Ordering::Relaxed);
        deck.error.store(false, Ordering::Relaxed);
        deck.duration_ms.store(duration_ms, Ordering::Relaxed);

        let stop = deck.stop.clone();
        let volume = deck.volume.clone();
        let source = decoder
            .amplify(1.0)
            .periodic_access(Duration::from_millis(50), move |source| {
                source.set_factor(*volume.lock().unwrap());
            })
            .stoppable()
            .periodic_access(Duration::from_millis(50), move |source| {
                if stop.load(Ordering::Relaxed) {
                    source.stop();
                }
            });

        stream.mixer().add(source);
        deck.stream = Some(stream);
        deck.started_at = Some(Instant::now());
        deck.state = MediaState::Playing;
        Ok(())
    }
}

fn uri_to_path(uri: &str) -> String {
    url::Url::parse(uri)
        .ok()
        .and_then(|u| u.to_file_path().ok())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| uri.to_string())
}

impl PlayerBackend for RodioBackend {
    fn init_block_player(&mut self, routing: &PlayerRouting) -> Result<()> {
        self.set_volume(Unit::A, routing.volume);
        self.set_volume(Unit::B, routing.volume);
        Ok(())
    }

    fn init_time_signal_player(&mut self, routing: &PlayerRouting) -> Result<()> {
        self.set_volume(Unit::A, routing.volume);
        self.set_volume(Unit::B, routing.volume);
        Ok(())
    }

    fn set_volume(&mut self, unit: Unit, v: f32) {
        *self.deck(unit).volume.lock().unwrap() = v.clamp(0.0, 1.0);
    }

    fn get_volume(&self, unit: Unit) -> f32 {
        *self.deck(unit).volume.lock().unwrap()
    }

    fn set_uri(&mut self, unit: Unit, uri: &str) {
        self.deck_mut(unit).uri = Some(uri.to_string());
    }

    fn set_state_null(&mut self, unit: Unit) {
        self.deck_mut(unit).stop.store(true, Ordering::Relaxed);
        self.deck_mut(unit).state = MediaState::Other;
    }

    fn set_state_ready(&mut self, unit: Unit) {
        self.deck_mut(unit).stop.store(true, Ordering::Relaxed);
        self.deck_mut(unit).state = MediaState::Stopped;
    }

    fn set_state_paused(&mut self, unit: Unit) {
        self.deck_mut(unit).state = MediaState::Other;
    }

    fn set_state_playing(&mut self, unit: Unit) {
        if let Err(err) = self.play_uri(unit) {
            tracing::error!(?err, "could not start playback");
            self.deck_mut(unit).error.store(true, Ordering::Relaxed);
            self.deck_mut(unit).state = MediaState::Error;
        }
    }

    fn set_current_unit(&mut self, unit: Unit) {
        self.current = Some(unit);
    }

    fn get_current_unit(&self) -> Unit {
        self.current.unwrap_or(Unit::A)
    }

    fn get_state(&self, unit: Unit) -> MediaState {
        if self.deck(unit).error.load(Ordering::Relaxed) {
            return MediaState::Error;
        }
        self.deck(unit).state
    }

    fn get_buffer_percent(&self, _unit: Unit) -> u32 {
        100
    }

    fn get_duration_ms(&self, unit: Unit) -> u32 {
        self.deck(unit).duration_ms.load(Ordering::Relaxed)
    }

    fn get_position_ms(&self, unit: Unit) -> u32 {
        let deck = self.deck(unit);
        match deck.started_at {
            Some(t) if deck.state == MediaState::Playing => t.elapsed().as_millis() as u32,
            _ => 0,
        }
    }
}
