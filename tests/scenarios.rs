//! Integration scenarios from the numbered list of testable properties:
//! hard/soft schedule cuts, interleave ordering and recursion cap, the
//! cyclic week-boundary wraparound, and an independent time-signal preempt.

use drivetime::block::Catalog;
use drivetime::config::{Configuration, ScheduleMode, TimeSignalMode};
use drivetime::engine::EngineState;
use drivetime::engine::block_engine::BlockEngine;
use drivetime::engine::time_signal_engine::TimeSignalEngine;
use drivetime::player::null::NullBackend;
use drivetime::player::{MediaState, PlayerBackend, Unit};
use drivetime::schedule::Schedule;
use drivetime::time;

fn touch(dir: &std::path::Path, name: &str) -> String {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"x").unwrap();
    path.to_string_lossy().into_owned()
}

fn scratch_dir(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("drivetime-scenario-{label}-{}", std::process::id()))
}

/// Scenario 1: hard cut at the Monday 09:00:00 boundary, followed by 20
/// crossfade ticks at slope 0.1.
#[test]
fn hard_cut_at_boundary_then_crossfade_converges() {
    let dir = scratch_dir("1");
    let news_path = touch(&dir, "n.ogg");
    let music_path = touch(&dir, "m.ogg");
    let catalog = Catalog::parse(&format!("news file {news_path}\nmusic file {music_path}\n"));
    let schedule = Schedule::parse("Monday 08:00:00 news\nMonday 09:00:00 music\n");

    let config = Configuration {
        engine_period_ms: 100,
        fade_out_time_ms: 2_000,
        fade_out_slope: 0.1,
        block_player: drivetime::config::PlayerRouting {
            volume: 1.0,
            ..Default::default()
        },
        ..Configuration::default()
    };

    let mut engine = BlockEngine::new(ScheduleMode::Hard);
    let mut backend = NullBackend::default();

    let monday_0859_59_950 = time::DAY + 8 * time::HOUR + 59 * time::MINUTE + 59 * time::SECOND + 950;
    engine
        .engine
        .load_block("news", &catalog, None, drivetime::log::LogMessage::RegularBlock);
    backend.set_current_unit(Unit::A);
    backend.set_uri(Unit::A, &format!("file://{news_path}"));
    backend.set_media_state(Unit::A, MediaState::Playing);
    engine.tick(&mut backend, &config, &schedule, &catalog, monday_0859_59_950);
    assert_eq!(engine.engine.state, EngineState::MonitorScheduleHard);

    // The boundary itself (diff 0) is suppressed by the "protect upcoming
    // transition" clause, matching the original's behavior for a coincident
    // next/current entry; tick shortly after 09:00:00.
    let monday_0900_00_050 = time::DAY + 9 * time::HOUR + 50;
    // One tick to have the monitor select PlayCurrent, one more to run it.
    engine.tick(&mut backend, &config, &schedule, &catalog, monday_0900_00_050);
    assert_eq!(engine.engine.state, EngineState::PlayCurrent);
    engine.tick(&mut backend, &config, &schedule, &catalog, monday_0900_00_050);
    assert_eq!(engine.engine.state, EngineState::Crossfade);
    assert_eq!(backend.get_current_unit(), Unit::B);
    assert_eq!(backend.uri(Unit::B), Some(format!("file://{music_path}").as_str()));

    for _ in 0..20 {
        engine.tick(&mut backend, &config, &schedule, &catalog, monday_0900_00_050);
    }

    assert!(backend.get_volume(Unit::B) >= 0.87);
    assert!(backend.get_volume(Unit::A) <= 0.13);

    std::fs::remove_dir_all(&dir).ok();
}

/// Scenario 2: soft cut defers until the deck inspection clause fires.
#[test]
fn soft_cut_defers_until_near_end_of_currently_playing_item() {
    let dir = scratch_dir("2");
    let news_path = touch(&dir, "n.ogg");
    let music_path = touch(&dir, "m.ogg");
    let catalog = Catalog::parse(&format!("news file {news_path}\nmusic file {music_path}\n"));
    let schedule = Schedule::parse("Monday 08:00:00 news\nMonday 09:00:00 music\n");

    let config = Configuration {
        engine_period_ms: 100,
        fade_out_time_ms: 2_000,
        schedule_mode: ScheduleMode::Soft,
        ..Configuration::default()
    };

    let mut engine = BlockEngine::new(ScheduleMode::Soft);
    let mut backend = NullBackend::default();
    engine
        .engine
        .load_block("news", &catalog, None, drivetime::log::LogMessage::RegularBlock);
    backend.set_current_unit(Unit::A);
    backend.set_media_state(Unit::A, MediaState::Playing);
    backend.set_progress(Unit::A, 9_000, 10_000);

    let just_after_boundary = time::DAY + 9 * time::HOUR + 50;
    engine.tick(&mut backend, &config, &schedule, &catalog, just_after_boundary);
    assert!(engine.engine.pending_playlist);
    assert_eq!(engine.engine.state, EngineState::MonitorScheduleSoft);

    // duration - position = 1000 <= fade_out_time(2000): the inspection clause fires.
    engine.tick(&mut backend, &config, &schedule, &catalog, just_after_boundary + 500);
    assert_eq!(engine.engine.state, EngineState::PlayCurrent);
    assert!(!engine.engine.pending_playlist);

    // Running PlayCurrent confirms the cut lands on "music", not a replay of "news".
    engine.tick(&mut backend, &config, &schedule, &catalog, just_after_boundary + 500);
    assert_eq!(engine.engine.state, EngineState::Crossfade);
    assert_eq!(backend.uri(Unit::B), Some(format!("file://{music_path}").as_str()));

    std::fs::remove_dir_all(&dir).ok();
}

/// Scenario 3: interleave ordering `s1, s2, s3, j, s4, s5, j`.
#[test]
fn interleave_ordering_matches_the_documented_scenario() {
    let dir = scratch_dir("3");
    std::fs::create_dir_all(&dir).unwrap();
    let m3u_path = dir.join("tracks.m3u");
    let mut file = std::fs::File::create(&m3u_path).unwrap();
    use std::io::Write;
    for name in ["s1", "s2", "s3", "s4", "s5"] {
        writeln!(file, "{name}.mp3").unwrap();
        touch(&dir, &format!("{name}.mp3"));
    }
    let jingle_path = touch(&dir, "j.mp3");

    let catalog = Catalog::parse(&format!(
        "jingles file {jingle_path}\nsongs playlist {m3u}\nsongs_block interleave (songs jingles 3 1)\n",
        m3u = m3u_path.display(),
    ));

    let mut acc = drivetime::playlist::Playlist::new();
    drivetime::playlist::expand(&mut acc, "songs_block", &catalog, 0);

    let names: Vec<_> = acc
        .iter()
        .map(|uri| uri.rsplit('/').next().unwrap().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["s1.mp3", "s2.mp3", "s3.mp3", "j.mp3", "s4.mp3", "s5.mp3", "j.mp3"]
    );

    std::fs::remove_dir_all(&dir).ok();
}

/// Scenario 4: self-referential interleave terminates at the recursion cap.
#[test]
fn recursion_cap_terminates_self_referential_interleave() {
    let catalog = Catalog::parse("a interleave (a a 1 1)\n");
    let mut acc = drivetime::playlist::Playlist::new();
    drivetime::playlist::expand(&mut acc, "a", &catalog, 0);
    assert!(acc.is_empty());
}

/// Scenario 5: `next_entry` wraps across the week boundary.
#[test]
fn next_entry_wraps_across_the_week_boundary() {
    let schedule = Schedule::parse("Sunday 00:00:00 daily\n");
    let saturday_2359_59 = 6 * time::DAY + 23 * time::HOUR + 59 * time::MINUTE + 59 * time::SECOND;
    let next = schedule.next_entry(saturday_2359_59).unwrap();
    assert_eq!(next.time, 0);
    assert_eq!(time::cyclic_diff(next.time, saturday_2359_59), 1_000);
}

/// Scenario 6: the time-signal engine preempts on its own player,
/// independent of the block engine's schedule.
#[test]
fn time_signal_preempts_on_its_own_player() {
    let dir = scratch_dir("6");
    let ts_path = touch(&dir, "ts.mp3");
    let catalog = Catalog::parse(&format!("ts file {ts_path}\n"));

    let config = Configuration {
        engine_period_ms: 100,
        fade_out_time_ms: 2_000,
        fade_out_slope: 1.0,
        time_signal_mode: TimeSignalMode::Hour,
        time_signal_advance_ms: 4_000,
        time_signal_block: Some("ts".to_string()),
        ..Configuration::default()
    };

    let mut ts_engine = TimeSignalEngine::new();
    let mut ts_backend = NullBackend::default();

    // Next hour boundary is 09:00:00; trigger_at = 08:59:56.000.
    let hour_boundary = 9 * time::HOUR;
    let trigger_at = hour_boundary - 4_000;
    ts_engine.tick(&mut ts_backend, &config, &catalog, trigger_at);
    assert_eq!(ts_engine.engine.state, EngineState::PlayCurrent);

    ts_engine.tick(&mut ts_backend, &config, &catalog, trigger_at);
    assert_eq!(ts_engine.engine.state, EngineState::Crossfade);

    for i in 1..=20u32 {
        ts_engine.tick(&mut ts_backend, &config, &catalog, trigger_at + i * 100);
    }
    assert_eq!(ts_engine.engine.state, EngineState::Null);

    // The block engine's own schedule and player are untouched.
    let schedule = Schedule::default();
    let mut block_engine = BlockEngine::new(ScheduleMode::Hard);
    let mut block_backend = NullBackend::default();
    block_engine.tick(&mut block_backend, &config, &schedule, &catalog, hour_boundary);
    assert!(block_backend.uri(Unit::A).is_none());
    assert!(block_backend.uri(Unit::B).is_none());

    std::fs::remove_dir_all(&dir).ok();
}
