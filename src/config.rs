//! Directive-per-line configuration file (§6.1). Unknown directives are
//! ignored; recognized ones overwrite the corresponding field, falling back
//! to spec-defined defaults when absent.

use std::fs;

use camino::Utf8PathBuf;
use color_eyre::Result;
use color_eyre::eyre::Context;
use strum::EnumString;

use crate::parse::next_configuration_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ScheduleMode {
    Hard,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DefaultBlockMode {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum TimeSignalMode {
    Off,
    Half,
    Hour,
}

/// The audio/video output backend naming from §6.1's `BlockPlayer*`/
/// `TimeSignalPlayer*` directive row; both lists (audio: `pulseaudio`,
/// `alsa`, `jack`, `oss`, `oss4`, `openal`; video: `v4l2`, `x`, `xv`, `fb`,
/// `gl`) share one enum here since a routing only ever names one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum OutputBackend {
    Auto,
    PulseAudio,
    Alsa,
    Jack,
    Oss,
    Oss4,
    OpenAl,
    V4l2,
    X,
    Xv,
    Fb,
    Gl,
    File,
}

/// Player backend routing, shared by `BlockPlayer*`/`TimeSignalPlayer*`
/// directives. Fields not mentioned in a configuration file keep their
/// defaults. `output` and `resolution` are retained for configuration-table
/// completeness; this crate's playback backends are audio-only, so they have
/// no effect on `RodioBackend`/`NullBackend` beyond being parsed and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRouting {
    pub name: Option<String>,
    pub output: Option<OutputBackend>,
    pub device: Option<String>,
    pub display: Option<String>,
    pub volume: f32,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
    pub resolution: Option<(u32, u32)>,
}

impl Default for PlayerRouting {
    fn default() -> Self {
        PlayerRouting {
            name: None,
            output: None,
            device: None,
            display: None,
            volume: 1.0,
            sample_rate: None,
            channels: None,
            resolution: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub configuration_period_ms: u32,
    pub schedule_file: Option<Utf8PathBuf>,
    pub block_file: Option<Utf8PathBuf>,
    pub log_file: Option<Utf8PathBuf>,
    pub engine_period_ms: u32,
    pub schedule_mode: ScheduleMode,
    pub default_block_mode: DefaultBlockMode,
    pub default_block: Option<String>,
    pub fade_out_time_ms: u32,
    pub fade_out_slope: f32,
    pub time_signal_mode: TimeSignalMode,
    pub time_signal_advance_ms: u32,
    pub time_signal_block: Option<String>,
    pub block_player: PlayerRouting,
    pub time_signal_player: PlayerRouting,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            configuration_period_ms: 10_000,
            schedule_file: None,
            block_file: None,
            log_file: None,
            engine_period_ms: 100,
            schedule_mode: ScheduleMode::Hard,
            default_block_mode: DefaultBlockMode::Off,
            default_block: None,
            fade_out_time_ms: 0,
            fade_out_slope: 1.0,
            time_signal_mode: TimeSignalMode::Off,
            time_signal_advance_ms: 0,
            time_signal_block: None,
            block_player: PlayerRouting::default(),
            time_signal_player: PlayerRouting::default(),
        }
    }
}

impl Configuration {
    pub fn load(path: &Utf8PathBuf) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("Could not read configuration file: {path}"))?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut config = Configuration::default();
        for (lineno, line) in text.lines().enumerate() {
            let Some((directive, rest)) = next_configuration_token(line) else {
                continue;
            };
            let Some((argument, _)) = next_configuration_token(rest) else {
                tracing::warn!(line = lineno + 1, %directive, "directive without argument, dropping line");
                continue;
            };
            config.apply(directive, argument, lineno + 1);
        }
        config
    }

    fn apply(&mut self, directive: &str, argument: &str, lineno: usize) {
        match directive.to_ascii_lowercase().as_str() {
            "configurationperiod" => self.configuration_period_ms = parse_ms(argument, lineno),
            "schedulefile" => self.schedule_file = Some(Utf8PathBuf::from(argument)),
            "blockfile" => self.block_file = Some(Utf8PathBuf::from(argument)),
            "logfile" => self.log_file = Some(Utf8PathBuf::from(argument)),
            "engineperiod" => self.engine_period_ms = parse_ms(argument, lineno),
            "schedulemode" => {
                if let Ok(mode) = argument.parse() {
                    self.schedule_mode = mode;
                } else {
                    tracing::warn!(line = lineno, %argument, "unknown schedule mode, keeping previous value");
                }
            }
            "defaultblockmode" => {
                if let Ok(mode) = argument.parse() {
                    self.default_block_mode = mode;
                } else {
                    tracing::warn!(line = lineno, %argument, "unknown default block mode, keeping previous value");
                }
            }
            "defaultblock" => self.default_block = Some(argument.to_string()),
            "fadeouttime" => self.fade_out_time_ms = parse_ms(argument, lineno),
            "fadeoutslope" => self.fade_out_slope = parse_unit_float(argument, lineno),
            "timesignalmode" => {
                if let Ok(mode) = argument.parse() {
                    self.time_signal_mode = mode;
                } else {
                    tracing::warn!(line = lineno, %argument, "unknown time signal mode, keeping previous value");
                }
            }
            "timesignaladvance" => self.time_signal_advance_ms = parse_ms(argument, lineno),
            "timesignalblock" => self.time_signal_block = Some(argument.to_string()),
            "blockplayername" => self.block_player.name = Some(argument.to_string()),
            "blockplayeroutput" => {
                if let Ok(output) = argument.parse() {
                    self.block_player.output = Some(output);
                } else {
                    tracing::warn!(line = lineno, %argument, "unknown output backend, keeping previous value");
                }
            }
            "blockplayerdevice" => self.block_player.device = Some(argument.to_string()),
            "blockplayerdisplay" => self.block_player.display = Some(argument.to_string()),
            "blockplayervolume" => self.block_player.volume = parse_unit_float(argument, lineno),
            "blockplayersamplerate" => self.block_player.sample_rate = argument.parse().ok(),
            "blockplayerchannels" => self.block_player.channels = argument.parse().ok(),
            "blockplayerresolution" => {
                if let Some(resolution) = parse_resolution(argument, lineno) {
                    self.block_player.resolution = Some(resolution);
                }
            }
            "timesignalplayername" => self.time_signal_player.name = Some(argument.to_string()),
            "timesignalplayeroutput" => {
                if let Ok(output) = argument.parse() {
                    self.time_signal_player.output = Some(output);
                } else {
                    tracing::warn!(line = lineno, %argument, "unknown output backend, keeping previous value");
                }
            }
            "timesignalplayerdevice" => self.time_signal_player.device = Some(argument.to_string()),
            "timesignalplayerdisplay" => self.time_signal_player.display = Some(argument.to_string()),
            "timesignalplayervolume" => {
                self.time_signal_player.volume = parse_unit_float(argument, lineno)
            }
            "timesignalplayersamplerate" => self.time_signal_player.sample_rate = argument.parse().ok(),
            "timesignalplayerchannels" => self.time_signal_player.channels = argument.parse().ok(),
            "timesignalplayerresolution" => {
                if let Some(resolution) = parse_resolution(argument, lineno) {
                    self.time_signal_player.resolution = Some(resolution);
                }
            }
            // Recorder routing and GUIPeriod are out of core scope (§1); tokenized and dropped.
            "recorder" | "recordername" | "recorderdevice" | "recorderfile" | "guiperiod" => {}
            other => tracing::debug!(line = lineno, directive = other, "unknown directive, ignoring"),
        }
    }
}

fn parse_ms(argument: &str, lineno: usize) -> u32 {
    match argument.parse::<i64>() {
        Ok(v) => v.unsigned_abs() as u32,
        Err(_) => {
            tracing::warn!(line = lineno, %argument, "expected a millisecond count, keeping previous value");
            0
        }
    }
}

/// Parses the `WxH` resolution form (e.g. `1920x1080`).
fn parse_resolution(argument: &str, lineno: usize) -> Option<(u32, u32)> {
    let (w, h) = argument.split_once(['x', 'X'])?;
    match (w.parse(), h.parse()) {
        (Ok(w), Ok(h)) => Some((w, h)),
        _ => {
            tracing::warn!(line = lineno, %argument, "expected a WxH resolution, keeping previous value");
            None
        }
    }
}

fn parse_unit_float(argument: &str, lineno: usize) -> f32 {
    match argument.parse::<f32>() {
        Ok(v) => v.clamp(0.0, 1.0),
        Err(_) => {
            tracing::warn!(line = lineno, %argument, "expected a float in [0,1], keeping previous value");
            0.0
        }
    }
}
