use glitchcore::batch::run_batch;
use glitchcore::canvas::Canvas;
use glitchcore::color::Rgba;
use glitchcore::config::{GlitchConfig, Span};

/// A light configuration so batch items render quickly.
fn quick_config() -> GlitchConfig {
    let mut cfg = GlitchConfig::default();
    cfg.box_count = Span(2, 3);
    cfg.log_blocks_range = Span(1, 2);
    cfg.fatal_error_count = Span(1, 1);
    cfg.enable_depth_of_field = false;
    cfg
}

#[test]
fn batch_with_one_corrupt_input_reports_partial_success() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");

    for name in ["a.png", "c.png"] {
        Canvas::solid(320, 240, Rgba::new(60, 30, 90, 255))
            .expect("fixture")
            .save(&input.path().join(name))
            .expect("fixture should write");
    }
    std::fs::write(input.path().join("b.png"), b"garbage bytes").expect("corrupt fixture");

    let summary = run_batch(
        input.path(),
        output.path(),
        None,
        &quick_config(),
        "11,22,33",
    );

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.outputs.len(), 2);
    for path in &summary.outputs {
        assert!(path.is_file(), "output '{}' should exist", path.display());
    }

    let text = summary.text();
    assert!(text.contains("2/3"), "summary should report 2 of 3: {text}");
    assert!(
        summary.lines.iter().any(|line| line.contains("failed")),
        "the corrupt item must be reported"
    );
}

#[test]
fn seeded_batch_items_are_named_after_their_seeds() {
    let input = tempfile::tempdir().expect("input dir");
    let output = tempfile::tempdir().expect("output dir");

    Canvas::solid(320, 240, Rgba::new(10, 10, 10, 255))
        .expect("fixture")
        .save(&input.path().join("photo.png"))
        .expect("fixture should write");

    let summary = run_batch(input.path(), output.path(), None, &quick_config(), "77");
    assert_eq!(summary.succeeded, 1);
    assert!(summary.outputs[0]
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name == "glitch_77_photo.png")
        .unwrap_or(false));
}
