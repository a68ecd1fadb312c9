//! The single cooperative loop (§5): configuration reload, block-engine
//! tick, time-signal-engine tick, in that fixed order, every engine period.

use camino::Utf8PathBuf;
use color_eyre::Result;
use color_eyre::eyre::Context;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::block::Catalog;
use crate::config::Configuration;
use crate::engine::block_engine::BlockEngine;
use crate::engine::time_signal_engine::TimeSignalEngine;
use crate::player::PlayerBackend;
use crate::schedule::Schedule;

/// Owns configuration, schedule, catalog, and both engines. Not `Clone` or
/// `Send` — it runs entirely on the single cooperative task that owns it.
pub struct Driver {
    config_path: Utf8PathBuf,
    config: Configuration,
    schedule: Schedule,
    catalog: Catalog,
    block_engine: BlockEngine,
    time_signal_engine: TimeSignalEngine,
    block_player: Box<dyn PlayerBackend>,
    time_signal_player: Box<dyn PlayerBackend>,
}

impl Driver {
    /// Loads the configuration, schedule, and block catalog named in it, and
    /// initializes both players. Returns an error if any of the three
    /// top-level files fail to load (§7 kind 1).
    pub fn load(
        config_path: Utf8PathBuf,
        mut block_player: Box<dyn PlayerBackend>,
        mut time_signal_player: Box<dyn PlayerBackend>,
    ) -> Result<Self> {
        let config = Configuration::load(&config_path)?;

        let schedule = match &config.schedule_file {
            Some(path) => Schedule::load(path)?,
            None => Schedule::default(),
        };
        let catalog = match &config.block_file {
            Some(path) => Catalog::load(path)?,
            None => Catalog::default(),
        };

        block_player
            .init_block_player(&config.block_player)
            .wrap_err("Could not initialize block player")?;
        time_signal_player
            .init_time_signal_player(&config.time_signal_player)
            .wrap_err("Could not initialize time signal player")?;

        Ok(Driver {
            config_path,
            block_engine: BlockEngine::new(config.schedule_mode),
            time_signal_engine: TimeSignalEngine::new(),
            config,
            schedule,
            catalog,
            block_player,
            time_signal_player,
        })
    }

    fn reload(&mut self) {
        match Configuration::load(&self.config_path) {
            Ok(config) => self.config = config,
            Err(err) => {
                tracing::error!(?err, "could not reload configuration, keeping previous values");
                return;
            }
        }
        if let Some(path) = &self.config.schedule_file {
            match Schedule::load(path) {
                Ok(schedule) => self.schedule = schedule,
                Err(err) => tracing::error!(?err, "could not reload schedule, keeping previous values"),
            }
        }
        if let Some(path) = &self.config.block_file {
            match Catalog::load(path) {
                Ok(catalog) => self.catalog = catalog,
                Err(err) => tracing::error!(?err, "could not reload block catalog, keeping previous values"),
            }
        }
    }

    /// Runs forever, driving the reload tick and both engine ticks at their
    /// configured cadences. Never returns under normal operation.
    pub async fn run(&mut self) -> Result<()> {
        let mut reload_tick = time::interval(Duration::from_millis(self.config.configuration_period_ms as u64));
        reload_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut engine_tick = time::interval(Duration::from_millis(self.config.engine_period_ms as u64));
        engine_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = reload_tick.tick() => {
                    self.reload();
                }
                _ = engine_tick.tick() => {
                    let now = crate::time::now_week_ms();
                    self.block_engine.tick(
                        self.block_player.as_mut(),
                        &self.config,
                        &self.schedule,
                        &self.catalog,
                        now,
                    );
                    self.time_signal_engine.tick(
                        self.time_signal_player.as_mut(),
                        &self.config,
                        &self.catalog,
                        now,
                    );
                }
            }
        }
    }
}
