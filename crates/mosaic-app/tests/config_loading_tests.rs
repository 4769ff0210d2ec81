//! Integration tests for JSON config loading.

use std::path::Path;

use mosaic_app::load_config;

#[test]
fn partial_config_file_keeps_defaults_for_missing_fields() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/partial-config.json");
    let config = load_config(Some(Path::new(path))).expect("fixture config should load");

    assert_eq!(config.grid_cols, 2);
    assert_eq!(config.grid_rows, 2);
    assert_eq!(config.canvas_width, 4);
    assert_eq!(config.canvas_height, 4);
    assert_eq!(config.overlay_opacity, 0.6, "unnamed field keeps default");
}

#[test]
fn missing_config_file_is_an_error() {
    let path = Path::new("/nonexistent/mosaic-config.json");
    assert!(load_config(Some(path)).is_err());
}
