use std::time::Duration;

use super::*;

fn sample_state() -> CaptchaState {
    let grid_bounds = Bounds {
        x: 100.0,
        y: 200.0,
        width: 300.0,
        height: 300.0,
    };
    CaptchaState {
        captcha_type: Some("recaptcha_v2_image".to_string()),
        bounds: Some(grid_bounds),
        grid_bounds: Some(grid_bounds),
        rows: 3,
        cols: 3,
        grid_map: build_grid_map(grid_bounds, 3, 3),
        clip: None,
        scroll: Some(ScrollPosition { x: 0.0, y: 120.0 }),
    }
}

#[test]
fn test_grid_map_centers_and_numbering() {
    let bounds = Bounds {
        x: 100.0,
        y: 200.0,
        width: 300.0,
        height: 300.0,
    };
    let map = build_grid_map(bounds, 3, 3);
    assert_eq!(map.len(), 9);

    // Block 1 is top-left, centers at cell midpoints.
    let first = &map[&1];
    assert_eq!(first.x, 150);
    assert_eq!(first.y, 250);
    // Block 9 is bottom-right.
    let last = &map[&9];
    assert_eq!(last.x, 350);
    assert_eq!(last.y, 450);
    // Row-major: block 4 starts the second row.
    let fourth = &map[&4];
    assert_eq!(fourth.x, 150);
    assert_eq!(fourth.y, 350);
    assert_eq!(fourth.bounds.width, 100.0);
}

#[test]
fn test_grid_map_degenerate_dimensions() {
    let bounds = Bounds {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };
    assert!(build_grid_map(bounds, 0, 3).is_empty());
    assert!(build_grid_map(bounds, 3, 0).is_empty());
}

#[test]
fn test_workbench_ttl() {
    let mut bench = CaptchaWorkbench::new(sample_state());
    assert!(bench.get(DEFAULT_TTL_MS).is_some());

    bench.backdate(Duration::from_millis(DEFAULT_TTL_MS + 1000));
    assert!(bench.get(DEFAULT_TTL_MS).is_none());
    // A longer budget still sees it.
    assert!(bench.get(DEFAULT_TTL_MS * 10).is_some());
}

#[test]
fn test_scroll_invalidation() {
    let bench = CaptchaWorkbench::new(sample_state());
    // Within tolerance.
    assert!(!bench.invalidated_by_scroll(0.0, 120.0));
    assert!(!bench.invalidated_by_scroll(4.0, 124.0));
    // Past tolerance.
    assert!(bench.invalidated_by_scroll(0.0, 300.0));
    assert!(bench.invalidated_by_scroll(50.0, 120.0));
}

#[test]
fn test_scroll_invalidation_without_recorded_position() {
    let mut state = sample_state();
    state.scroll = None;
    let bench = CaptchaWorkbench::new(state);
    assert!(!bench.invalidated_by_scroll(0.0, 0.0));
    assert!(bench.invalidated_by_scroll(0.0, 1.0));
}

#[test]
fn test_state_serialization_shape() {
    let value = serde_json::to_value(sample_state()).unwrap();
    assert_eq!(value["type"], "recaptcha_v2_image");
    assert_eq!(value["rows"], 3);
    assert_eq!(value["gridBounds"]["x"], 100.0);
    assert_eq!(value["gridMap"]["1"]["x"], 150);
    assert_eq!(value["scroll"]["y"], 120.0);
}
