//! Time-signal automaton (§4.6.4). Always runs with the default block
//! disabled and only ever transitions to `PlayNext`, never `PlayPrevious`.

use crate::block::Catalog;
use crate::config::{Configuration, TimeSignalMode};
use crate::engine::{Engine, EngineState};
use crate::log::LogMessage;
use crate::player::PlayerBackend;
use crate::time::{self, cyclic_diff, reached};

pub struct TimeSignalEngine {
    pub engine: Engine,
}

impl TimeSignalEngine {
    pub fn new() -> Self {
        TimeSignalEngine {
            engine: Engine::new(EngineState::MonitorTimeSignal),
        }
    }

    /// The smallest multiple of `period` strictly greater than `now`, cyclic
    /// mod one week (§4.6.4 step 1).
    fn next_target(now: u32, period: u32) -> u32 {
        let next_multiple = (now / period + 1) * period;
        next_multiple % time::WEEK
    }

    pub fn tick(
        &mut self,
        backend: &mut dyn PlayerBackend,
        config: &Configuration,
        catalog: &Catalog,
        now_week_ms: u32,
    ) {
        let log_file = config.log_file.as_deref();

        match self.engine.state {
            EngineState::Null => self.engine.state = EngineState::MonitorTimeSignal,
            EngineState::MonitorTimeSignal => self.monitor(backend, config, catalog, now_week_ms),
            EngineState::PlayCurrent => {
                self.engine.play_current(backend, config.fade_out_time_ms, log_file);
            }
            EngineState::PlayNext => {
                // Default block is always off for this engine (§4.6.4).
                self.engine
                    .play_next(false, None, catalog, log_file, config.fade_out_time_ms);
            }
            EngineState::Crossfade => {
                self.engine.crossfade_tick(
                    backend,
                    config.engine_period_ms,
                    config.time_signal_player.volume,
                    config.fade_out_slope,
                );
            }
            EngineState::FadeOut => {
                self.engine
                    .fade_out_tick(backend, config.engine_period_ms, config.fade_out_slope);
            }
            other => unreachable!("time signal engine never enters {other:?}"),
        }
    }

    fn monitor(&mut self, backend: &mut dyn PlayerBackend, config: &Configuration, catalog: &Catalog, now: u32) {
        let log_file = config.log_file.as_deref();

        let period = match config.time_signal_mode {
            TimeSignalMode::Off => return,
            TimeSignalMode::Hour => time::HOUR,
            TimeSignalMode::Half => time::HOUR / 2,
        };
        let target = Self::next_target(now, period);
        let advance = config.time_signal_advance_ms % time::WEEK;
        let trigger_at = time::cyclic_add(target, time::WEEK - advance);

        if reached(now, trigger_at, config.engine_period_ms) {
            let Some(name) = config.time_signal_block.as_deref() else {
                return;
            };
            self.engine
                .load_block(name, catalog, log_file, LogMessage::TimeSignalBlock);
            self.engine.state = EngineState::PlayCurrent;
            return;
        }

        if self.engine.cursor.is_none() {
            return;
        }

        if let Some(target) = self.engine.inspect_current_deck(backend, config.fade_out_time_ms, None) {
            self.engine.state = target;
        }
    }
}

impl Default for TimeSignalEngine {
    fn default() -> Self {
        Self::new()
    }
}
