use glitchcore::color::Rgba;
use glitchcore::config::{GlitchConfig, Span};

#[test]
fn default_config_survives_a_json_round_trip() {
    let cfg = GlitchConfig::default();
    let json = cfg.to_json_string().expect("serialize");
    let back = GlitchConfig::from_json_str(&json).expect("deserialize");

    assert_eq!(back.box_count, cfg.box_count);
    assert_eq!(back.log_blocks_range, cfg.log_blocks_range);
    assert_eq!(back.box_float_range, cfg.box_float_range);
    assert_eq!(back.color_warning, cfg.color_warning);
    assert_eq!(back.style_weights, cfg.style_weights);
    assert_eq!(back.box_type_weights, cfg.box_type_weights);
    assert_eq!(back.error_weights, cfg.error_weights);
    assert_eq!(back.bios_title_formats, cfg.bios_title_formats);
}

#[test]
fn inverted_ranges_round_trip_without_normalization() {
    let mut cfg = GlitchConfig::default();
    cfg.box_count = Span(30, 18);
    cfg.warp_shift_range = Span(20, 5);

    let json = cfg.to_json_string().expect("serialize");
    let back = GlitchConfig::from_json_str(&json).expect("deserialize");
    assert_eq!(back.box_count, Span(30, 18));
    assert_eq!(back.warp_shift_range, Span(20, 5));
}

#[test]
fn documents_with_missing_fields_use_documented_defaults() {
    let cfg = GlitchConfig::from_json_str(
        r##"{
            "box_count": [5, 9],
            "color_warning": "#00FF00",
            "enable_depth_of_field": false
        }"##,
    )
    .expect("partial document should parse");

    assert_eq!(cfg.box_count, Span(5, 9));
    assert_eq!(cfg.color_warning, Rgba::new(0, 255, 0, 255));
    assert!(!cfg.enable_depth_of_field);
    // Everything else keeps its default.
    assert_eq!(cfg.log_blocks_range, Span(4, 28));
    assert_eq!(cfg.mesh_complexity, 220);
    assert!((cfg.scanline_darkness - 0.88).abs() < 1e-6);
}

#[test]
fn color_fields_serialize_as_integer_sequences() {
    let cfg = GlitchConfig::default();
    let value: serde_json::Value =
        serde_json::from_str(&cfg.to_json_string().expect("serialize")).expect("json");
    let warning = value.get("color_warning").expect("field present");
    assert_eq!(warning.as_array().map(|a| a.len()), Some(4));
}
