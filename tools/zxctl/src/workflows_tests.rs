use std::{fs, path::PathBuf};

use anyhow::Result;
use zx_gesture::{GestureConfig, GestureEvent, MotionGesture, PipelineMode, ScrollDirection};

use crate::workflows::{
    default_capture_path, event_line, parse_expected_labels, replay_events, run_replay,
    ReplayOptions,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

#[test]
fn replay_of_motion_capture_decodes_all_gestures() -> Result<()> {
    let events = replay_events(
        &fixture("motion_capture.bin"),
        PipelineMode::Motion,
        GestureConfig::default(),
    )?;
    assert_eq!(
        events,
        vec![
            GestureEvent::Motion(MotionGesture::RightSwipe),
            GestureEvent::Motion(MotionGesture::BumpLeft),
            GestureEvent::Motion(MotionGesture::LeftSwipe),
            GestureEvent::Motion(MotionGesture::BumpRight),
        ]
    );
    Ok(())
}

#[test]
fn replay_with_matching_expectations_succeeds() -> Result<()> {
    run_replay(ReplayOptions {
        config: GestureConfig::default(),
        dump_path: fixture("codes_capture.bin"),
        mode: PipelineMode::CodesWithParams,
        expect_path: Some(fixture("codes_capture.expect")),
    })
}

#[test]
fn replay_with_wrong_expectations_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let expect = dir.path().join("wrong.expect");
    fs::write(&expect, "# first frame\nright_swipe\nbump_left\n")?;

    let err = run_replay(ReplayOptions {
        config: GestureConfig::default(),
        dump_path: fixture("motion_capture.bin"),
        mode: PipelineMode::Motion,
        expect_path: Some(expect),
    })
    .expect_err("shorter expectation must fail");
    assert!(err.to_string().contains("event sequence mismatch"));
    Ok(())
}

#[test]
fn expected_labels_skip_comments_and_reject_unknown_kinds() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let good = dir.path().join("good.expect");
    fs::write(&good, "# header\n\nScroll_Up\ngesture_code\n")?;
    assert_eq!(parse_expected_labels(&good)?, vec!["scroll_up", "gesture_code"]);

    let bad = dir.path().join("bad.expect");
    fs::write(&bad, "scroll_up\nwave\n")?;
    let err = parse_expected_labels(&bad).expect_err("unknown kind must fail");
    assert!(err
        .to_string()
        .contains(":2 invalid expected event kind: wave"));
    Ok(())
}

#[test]
fn event_lines_carry_label_and_numeric_value() {
    assert_eq!(
        event_line(&GestureEvent::Scroll(ScrollDirection::Left)),
        "event,scroll_left,3"
    );
    assert_eq!(event_line(&GestureEvent::Code(17)), "event,gesture_code,17");
}

#[test]
fn default_capture_path_is_timestamped_under_logs() {
    let path = default_capture_path();
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(path.starts_with("logs"));
    assert!(name.starts_with("zx_capture_"));
    assert!(name.ends_with(".bin"));
}
