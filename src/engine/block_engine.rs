//! Hard/soft schedule-cut automaton (§4.6.1-4.6.3).

use camino::Utf8Path;

use crate::block::Catalog;
use crate::config::{Configuration, DefaultBlockMode, ScheduleMode};
use crate::engine::{Engine, EngineState};
use crate::log::LogMessage;
use crate::player::PlayerBackend;
use crate::schedule::Schedule;
use crate::time::{self, cyclic_diff, reached};

pub struct BlockEngine {
    pub engine: Engine,
}

impl BlockEngine {
    pub fn new(schedule_mode: ScheduleMode) -> Self {
        let initial = match schedule_mode {
            ScheduleMode::Hard => EngineState::MonitorScheduleHard,
            ScheduleMode::Soft => EngineState::MonitorScheduleSoft,
        };
        BlockEngine {
            engine: Engine::new(initial),
        }
    }

    fn is_monitor_state(&self) -> bool {
        matches!(
            self.engine.state,
            EngineState::MonitorScheduleHard | EngineState::MonitorScheduleSoft
        )
    }

    /// One tick of the whole automaton (§4.6.1). `now_week_ms` is sampled by
    /// the caller so that tests can drive the engine with fixed values.
    pub fn tick(
        &mut self,
        backend: &mut dyn PlayerBackend,
        config: &Configuration,
        schedule: &Schedule,
        catalog: &Catalog,
        now_week_ms: u32,
    ) {
        let log_file = config.log_file.as_deref();
        let default_on = config.default_block_mode == DefaultBlockMode::On;
        let default_block = config.default_block.as_deref();

        match self.engine.state {
            EngineState::Null => {
                self.engine.state = match config.schedule_mode {
                    ScheduleMode::Hard => EngineState::MonitorScheduleHard,
                    ScheduleMode::Soft => EngineState::MonitorScheduleSoft,
                };
            }
            EngineState::MonitorScheduleHard => {
                self.monitor(backend, config, schedule, catalog, now_week_ms, false);
            }
            EngineState::MonitorScheduleSoft => {
                self.monitor(backend, config, schedule, catalog, now_week_ms, true);
            }
            EngineState::PlayCurrent => {
                self.engine
                    .play_current(backend, config.fade_out_time_ms, log_file);
            }
            EngineState::PlayPrevious => {
                self.engine
                    .play_previous(default_on, default_block, catalog, log_file, config.fade_out_time_ms);
            }
            EngineState::PlayNext => {
                self.engine
                    .play_next(default_on, default_block, catalog, log_file, config.fade_out_time_ms);
            }
            EngineState::PlayDefault => {
                self.engine
                    .play_default(default_on, default_block, catalog, log_file, config.fade_out_time_ms);
            }
            EngineState::Crossfade => {
                self.engine.crossfade_tick(
                    backend,
                    config.engine_period_ms,
                    config.block_player.volume,
                    config.fade_out_slope,
                );
            }
            EngineState::FadeOut => {
                self.engine
                    .fade_out_tick(backend, config.engine_period_ms, config.fade_out_slope);
            }
            EngineState::MonitorTimeSignal => unreachable!("block engine never enters the time-signal monitor"),
        }
    }

    /// §4.6.2 (Hard) and §4.6.3 (Soft, `soft=true`).
    fn monitor(
        &mut self,
        backend: &mut dyn PlayerBackend,
        config: &Configuration,
        schedule: &Schedule,
        catalog: &Catalog,
        now: u32,
        soft: bool,
    ) {
        let log_file = config.log_file.as_deref();
        let default_on = config.default_block_mode == DefaultBlockMode::On;
        let default_block = config.default_block.as_deref();

        // 1. Empty playlist with default-on.
        if self.engine.playlist.is_empty() && default_on {
            if let Some(name) = default_block {
                self.engine.load_block(name, catalog, log_file, LogMessage::DefaultBlock);
                if soft {
                    self.engine.pending_playlist = true;
                } else {
                    self.engine.state = EngineState::PlayCurrent;
                }
            }
            return;
        }

        let Some(next_entry) = schedule.next_entry(now) else {
            return;
        };
        let Some(current_entry) = schedule.current_entry(now) else {
            return;
        };

        // 4. Protect an imminent schedule boundary from being perturbed.
        if cyclic_diff(next_entry.time, now) < config.fade_out_time_ms + 6 * config.engine_period_ms {
            return;
        }

        // 5. Schedule boundary fell inside this tick.
        if reached(now, current_entry.time, config.engine_period_ms) {
            let block_name = current_entry.block.clone();
            self.engine.load_block(&block_name, catalog, log_file, LogMessage::RegularBlock);
            if soft {
                self.engine.pending_playlist = true;
            } else {
                self.engine.state = EngineState::PlayCurrent;
            }
            return;
        }

        let Some(_cursor) = self.engine.cursor else {
            return;
        };

        let pending = if soft { Some(self.engine.pending_playlist) } else { None };
        if let Some(target) = self
            .engine
            .inspect_current_deck(backend, config.fade_out_time_ms, pending)
        {
            if soft && target == EngineState::PlayCurrent {
                self.engine.pending_playlist = false;
            }
            self.engine.state = target;
        }
    }

    /// §4.6.5: external skip command.
    pub fn request_skip(&mut self, target: EngineState, fade_out_time_ms: u32) {
        self.engine
            .request_skip(target, fade_out_time_ms, self.is_monitor_state());
    }
}
