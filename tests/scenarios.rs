use glitchcore::canvas::Canvas;
use glitchcore::color::Rgba;
use glitchcore::config::{GlitchConfig, Span};
use glitchcore::renderer::RenderSession;

/// A configuration engineered to draw nothing: zero boxes, zero text,
/// every optional effect off.
fn empty_pipeline_config() -> GlitchConfig {
    let mut cfg = GlitchConfig::default();
    cfg.box_count = Span(0, 0);
    cfg.log_blocks_range = Span(0, 0);
    cfg.fatal_error_count = Span(0, 0);
    cfg.node_text_chance = 0.0;
    cfg.title_erosion_rate = 0.0;
    cfg.enable_depth_of_field = false;
    cfg
}

#[test]
fn solid_blue_default_run_reports_stats_in_range() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source_path = dir.path().join("blue.png");
    Canvas::solid(1200, 800, Rgba::new(20, 40, 180, 255))
        .expect("fixture")
        .save(&source_path)
        .expect("fixture should write");

    let output = dir.path().join("out.png");
    let stats = glitchcore::render(&source_path, None, &GlitchConfig::default(), 42, &output)
        .expect("render should succeed");

    assert!(output.is_file(), "output file must exist");
    assert!(
        (18..=30).contains(&stats.boxes_drawn),
        "boxes_drawn {} outside default range",
        stats.boxes_drawn
    );
    assert!(
        (4..=28).contains(&stats.text_blocks),
        "text_blocks {} outside default range",
        stats.text_blocks
    );
    assert!(stats.processing_time_seconds >= 0.0);
}

#[test]
fn mid_gray_empty_pipeline_does_not_hit_the_near_white_fallback() {
    let source = Canvas::solid(640, 480, Rgba::new(128, 128, 128, 255)).expect("fixture");
    let mut session = RenderSession::from_canvas(source, None, empty_pipeline_config(), 1);
    session.run_to_canvas().expect("pipeline should complete");

    assert!(
        !session.stats.degenerate_fallback,
        "mid-gray output must stay under the near-white threshold"
    );
    assert!(session.canvas.mean_brightness() <= 250.0);
}

#[test]
fn near_white_output_falls_back_to_the_original_canvas() {
    let mut cfg = empty_pipeline_config();
    // With nothing drawn and scanlines disabled the canvas stays white
    // apart from the title block strokes; 240 keeps the check decisive.
    cfg.scanline_darkness = 1.0;
    cfg.near_white_threshold = 240.0;

    let source = Canvas::solid(640, 480, Rgba::new(255, 255, 255, 255)).expect("fixture");
    let original = source.data().to_vec();
    let mut session = RenderSession::from_canvas(source, None, cfg, 1);
    session.run_to_canvas().expect("pipeline should complete");

    assert!(
        session.stats.degenerate_fallback,
        "an all-white composite must trigger the fallback"
    );
    assert_eq!(
        session.canvas.data(),
        &original[..],
        "the fallback must restore the original canvas verbatim"
    );
}

#[test]
fn undecodable_source_is_fatal_at_construction() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bogus = dir.path().join("not-an-image.png");
    std::fs::write(&bogus, b"definitely not a png").expect("write fixture");

    let result = RenderSession::new(&bogus, None, GlitchConfig::default(), 1);
    assert!(result.is_err(), "corrupt sources must fail session creation");
}
