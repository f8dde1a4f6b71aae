use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tilegrid_harness::{
    HarnessError, Replayer, Step, layout_checksum, parse_scenario, replay_file, replay_str,
};
use tilegrid_layout::{GridConfig, Size};

const EXPECTED_CHECKSUM_EMPTY: u64 = 0xa8c7f832281a39c5;
const EXPECTED_CHECKSUM_LOADED_DASHBOARD: u64 = 0x0eb52e9147016627;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// ── Fixtures ────────────────────────────────────────────────────────────

#[test]
fn every_fixture_replays() {
    for name in [
        "push_and_float.jsonl",
        "swap_drag.jsonl",
        "drag_push.jsonl",
        "resize.jsonl",
        "load_checksum.jsonl",
        "floating_toggle.jsonl",
    ] {
        if let Err(err) = replay_file(fixture(name)) {
            panic!("{name}: {err}");
        }
    }
}

#[test]
fn loaded_dashboard_checksum_is_stable() {
    let summary = replay_file(fixture("load_checksum.jsonl")).expect("replay");
    assert_eq!(summary.checksum, EXPECTED_CHECKSUM_LOADED_DASHBOARD);
    assert_eq!(summary.items, 3);
    assert_eq!(summary.height, 2);
    assert_eq!(summary.steps, 4);
}

#[test]
fn empty_layout_checksum_is_stable() {
    assert_eq!(layout_checksum(&[]), EXPECTED_CHECKSUM_EMPTY);
    assert_eq!(Replayer::default().checksum(), EXPECTED_CHECKSUM_EMPTY);
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        replay_file(fixture("does_not_exist.jsonl")),
        Err(HarnessError::Io(_))
    ));
}

// ── Failures ────────────────────────────────────────────────────────────

#[test]
fn wrong_checksum_names_the_line() {
    let src = r#"{"op":"add","name":"a"}
{"op":"expect","checksum":"0000000000000000"}"#;
    let err = replay_str(src).unwrap_err();
    assert_eq!(err.line(), Some(2));
    assert!(err.to_string().contains("checksum mismatch"), "{err}");
}

#[test]
fn grid_errors_surface_with_line() {
    let src = r#"{"op":"config","options":{"columns":2,"max_rows":1}}
{"op":"add","name":"a","size_x":2,"size_y":1}
{"op":"add","name":"b","size_x":1,"size_y":1}"#;
    let err = replay_str(src).unwrap_err();
    assert!(matches!(err, HarnessError::Grid { line: 3, .. }), "{err}");
}

#[test]
fn removed_names_are_forgotten() {
    let src = r#"{"op":"add","name":"a"}
{"op":"remove","name":"a"}
{"op":"place","name":"a","row":0,"col":0}"#;
    assert!(matches!(
        replay_str(src),
        Err(HarnessError::UnknownName { line: 3, .. })
    ));
}

#[test]
fn gestures_are_refused_in_mobile_mode() {
    let src = r#"{"op":"config","options":{"width":320}}
{"op":"loaded"}
{"op":"add","name":"a","size_x":1,"size_y":1}
{"op":"drag","name":"a","path":[[3,3]]}
{"op":"expect","positions":{"a":[0,0]}}"#;
    replay_str(src).expect("drag ignored on mobile");
}

// ── Determinism ─────────────────────────────────────────────────────────

fn step_strategy() -> impl Strategy<Value = (u8, usize, usize, usize, usize)> {
    (0u8..4, 0usize..6, 0usize..12, 1usize..=3, 1usize..=3)
}

fn render(ops: &[(u8, usize, usize, usize, usize)]) -> String {
    let mut lines = vec![r#"{"op":"loaded"}"#.to_string()];
    let mut names = 0usize;
    for &(kind, pick, row, sx, sy) in ops {
        let target = if names == 0 { None } else { Some(pick % names) };
        let line = match (kind, target) {
            (1, Some(i)) => format!(r#"{{"op":"place","name":"t{i}","row":{row},"col":{}}}"#, pick % 6),
            (2, Some(i)) => format!(r#"{{"op":"drag","name":"t{i}","path":[[{row},{}]]}}"#, (pick + 1) % 6),
            (3, Some(i)) => format!(r#"{{"op":"resize","name":"t{i}","size_x":{sx},"size_y":{sy}}}"#),
            _ => {
                names += 1;
                format!(r#"{{"op":"add","name":"t{}","size_x":{sx},"size_y":{sy}}}"#, names - 1)
            }
        };
        lines.push(line);
    }
    lines.join("\n")
}

proptest! {
    #[test]
    fn random_scenarios_replay_deterministically(ops in proptest::collection::vec(step_strategy(), 1..16)) {
        let src = render(&ops);
        let first = replay_str(&src);
        let second = replay_str(&src);
        prop_assert!(first.is_ok(), "{:?}\n{}", first, src);
        prop_assert_eq!(first.ok(), second.ok());
    }
}

#[test]
fn auto_size_survives_in_summaries() {
    let steps = parse_scenario(r#"{"op":"add","name":"a","size_y":"auto"}"#).expect("parse");
    let mut r = Replayer::new(GridConfig::default());
    r.apply(steps[0].0, &steps[0].1).expect("apply");
    let summaries = r.grid().summaries();
    assert_eq!(summaries[0].size_y, Size::Auto);
    assert!(matches!(steps[0].1, Step::Add { .. }));
}
