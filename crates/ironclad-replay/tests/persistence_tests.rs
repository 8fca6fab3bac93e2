//! Integration tests for recording, persisting and reloading match logs.
//!
//! These tests drive the recorder the way a live match does (entries arriving
//! mostly in tick order, with the occasional late child entry), write the
//! finished log to disk, load it back, and walk it with a player.

use std::path::PathBuf;

use ironclad_replay::prelude::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A per-test file path under the system temp directory.
fn temp_log_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("ironclad-replay-tests-{}", std::process::id()))
        .join(format!("{name}.iclog"))
}

fn recorded_match() -> MatchLog {
    let mut recorder = ReplayRecorder::new();
    recorder
        .append(0, false, r#"{"kind":"Spawn","receiver":"Red;Hero;1;0"}"#.into(), None)
        .unwrap();
    recorder
        .append(
            3,
            true,
            r#"{"kind":"Fire","rounds":2}"#.into(),
            Some("Red;Hero;1;0".into()),
        )
        .unwrap();
    recorder
        .append(4, false, r#"{"kind":"Revive","receiver":"Red;Hero;1;0"}"#.into(), None)
        .unwrap();
    // delivered late: issued on tick 2, accepted after tick 4 was recorded
    recorder
        .append(
            2,
            true,
            r#"{"kind":"ArmorLight","lit":true}"#.into(),
            Some("Blue;Sentry;7;0".into()),
        )
        .unwrap();
    recorder.finish("arena-3", "Red Comets", "Blue Rooks")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn write_then_load_restores_match_log() {
    let log = recorded_match();
    let path = temp_log_path("write_then_load");

    let written = persist::write(&path, &log).expect("write should succeed");
    assert!(written > 0);
    assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, written);

    let loaded = persist::load(&path).expect("load should succeed");
    assert_eq!(loaded, log);

    std::fs::remove_file(&path).ok();
}

#[test]
fn loaded_log_replays_in_dispatch_order() {
    let path = temp_log_path("dispatch_order");
    persist::write(&path, &recorded_match()).unwrap();

    let loaded = persist::load(&path).unwrap();
    let mut player = ReplayPlayer::new(loaded.entries);
    player.validate().expect("recorded log must be structurally valid");

    let mut per_tick: Vec<(u64, Vec<i32>)> = Vec::new();
    for tick in 0..6u64 {
        let mut due = Vec::new();
        while let Some(entry) = player.next_due(tick) {
            due.push(entry.tick);
            player.advance();
        }
        per_tick.push((tick, due));
    }

    assert_eq!(
        per_tick,
        vec![
            (0, vec![0]),
            (1, vec![]),
            (2, vec![]),
            (3, vec![3]),
            // the late entry follows the one recorded before it
            (4, vec![4, 2]),
            (5, vec![]),
        ]
    );
    assert!(player.is_finished());

    std::fs::remove_file(&path).ok();
}

#[test]
fn write_replaces_existing_file() {
    let path = temp_log_path("replaces_existing");
    persist::write(&path, &recorded_match()).unwrap();

    let smaller = MatchLog {
        map: "arena-1".to_owned(),
        ..MatchLog::default()
    };
    persist::write(&path, &smaller).unwrap();
    assert_eq!(persist::load(&path).unwrap(), smaller);

    std::fs::remove_file(&path).ok();
}

#[test]
fn corrupt_file_is_rejected() {
    let path = temp_log_path("corrupt_file");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"\x10\x00\x00\x00garbage").unwrap();

    assert!(persist::load(&path).is_err());

    std::fs::remove_file(&path).ok();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Whatever order ticks arrive in, the recorded log keeps arrival order
    /// and stays playable.
    #[test]
    fn recorder_keeps_dispatch_order(ticks in prop::collection::vec(0..40u64, 0..60)) {
        let mut recorder = ReplayRecorder::new();
        for (i, tick) in ticks.iter().enumerate() {
            recorder.append(*tick, false, format!("{i}"), None).unwrap();
        }

        let entries = recorder.entries();
        prop_assert_eq!(entries.len(), ticks.len());
        prop_assert!(ReplayPlayer::new(entries.to_vec()).validate().is_ok());

        for (i, entry) in entries.iter().enumerate() {
            prop_assert_eq!(entry.action.parse::<usize>().unwrap(), i);
            prop_assert_eq!(entry.tick as u64, ticks[i]);
        }
        let drops = ticks.windows(2).filter(|pair| pair[1] < pair[0]).count();
        prop_assert_eq!(recorder.late_entries(), drops);

        // a cursor driven past the last tick re-issues everything in order
        let mut player = ReplayPlayer::new(entries.to_vec());
        let mut replayed = 0;
        while player.next_due(40).is_some() {
            player.advance();
            replayed += 1;
        }
        prop_assert_eq!(replayed, ticks.len());
    }
}
