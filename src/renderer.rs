//! Render orchestration.
//!
//! A [`RenderSession`] owns everything one render needs: the decoded
//! source, the working canvas, the seeded generator pair, the font cache,
//! the message corpus, and the statistics record. `run` sequences the
//! pipeline stages in fixed order and finishes with the near-white sanity
//! check before writing the output file.

use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::boxes::{self, PlacedBox};
use crate::canvas::Canvas;
use crate::color::{Rgba, BLACK};
use crate::config::GlitchConfig;
use crate::effects;
use crate::font::{FontCache, SizedFont};
use crate::messages::{BuiltinCorpus, ErrorCorpus};
use crate::rng::RenderRng;
use crate::subject::detect_subject;
use crate::text;
use crate::wireframe::draw_sparse_wireframe;

/// Width against which all absolute pixel constants are normalized.
const REFERENCE_WIDTH: f32 = 1200.0;

/// Messages used when the extended corpus is switched off.
pub const SIMPLE_ERRORS: &[&str] = &[
    "KERNEL_PANIC",
    "SYSTEM_HALT",
    "MEMORY_CORRUPTION",
    "HASH_MISMATCH",
    "KEY_EXPIRED",
    "ACCESS_DENIED",
    "DISK_ERR",
    "CPU_FAULT",
    "NETWORK_TIMEOUT",
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderStats {
    pub boxes_drawn: u32,
    pub warp_boxes: u32,
    pub box_connections: u32,
    pub text_blocks: u32,
    /// True when the near-white sanity check replaced the pipeline output
    /// with the original canvas.
    pub degenerate_fallback: bool,
    pub processing_time_seconds: f64,
}

pub struct RenderSession {
    pub cfg: GlitchConfig,
    pub scale: f32,
    pub rng: RenderRng,
    pub canvas: Canvas,
    pub stats: RenderStats,
    /// Box rectangles recorded by the compositor for reuse.
    pub boxes_info: Vec<PlacedBox>,
    origin: Canvas,
    fonts: FontCache,
    corpus: Box<dyn ErrorCorpus>,
}

impl RenderSession {
    /// Decode the source and build session state. An undecodable source is
    /// fatal: no session, no partial output.
    pub fn new(
        image_path: &Path,
        font_path: Option<&Path>,
        cfg: GlitchConfig,
        seed: u64,
    ) -> Result<Self> {
        let origin = Canvas::load(image_path)
            .with_context(|| format!("cannot read image '{}'", image_path.display()))?;
        Ok(Self::from_canvas(origin, font_path, cfg, seed))
    }

    /// Build a session over an already-decoded canvas (tests, embedding).
    pub fn from_canvas(
        origin: Canvas,
        font_path: Option<&Path>,
        cfg: GlitchConfig,
        seed: u64,
    ) -> Self {
        let scale = origin.width() as f32 / REFERENCE_WIDTH;
        let canvas = origin.clone();
        Self {
            cfg,
            scale,
            rng: RenderRng::seeded(seed),
            canvas,
            stats: RenderStats::default(),
            boxes_info: Vec::new(),
            origin,
            fonts: FontCache::new(font_path),
            corpus: Box::new(BuiltinCorpus),
        }
    }

    /// Swap in a different message corpus (the provider seam).
    pub fn with_corpus(mut self, corpus: Box<dyn ErrorCorpus>) -> Self {
        self.corpus = corpus;
        self
    }

    pub fn width(&self) -> u32 {
        self.origin.width()
    }

    pub fn height(&self) -> u32 {
        self.origin.height()
    }

    pub fn font(&mut self, size_pt: f32) -> Rc<SizedFont> {
        self.fonts.sized(size_pt, self.scale)
    }

    /// Stroked text: four 1-px cardinal passes in opaque black, then the
    /// fill pass. Error-flagged draws always fill in the configured
    /// error-text color, whatever color the caller asked for.
    pub fn draw_text_stroked(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        size_pt: f32,
        fill: Rgba,
        is_error: bool,
    ) {
        let font = self.font(size_pt);
        for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            font.draw(&mut self.canvas, x + dx, y + dy, text, BLACK);
        }
        let fill = if is_error { self.cfg.color_error_text } else { fill };
        font.draw(&mut self.canvas, x, y, text, fill);
    }

    /// A category-weighted random message from the corpus, or a pick from
    /// the simple list when extended errors are off.
    pub fn random_error_message(&mut self) -> String {
        if self.cfg.use_extended_errors {
            let category = self
                .rng
                .general
                .weighted_choice(&self.cfg.error_weights)
                .unwrap_or("fatal")
                .to_string();
            self.corpus.random_message(&mut self.rng.general, &category)
        } else {
            self.rng.general.choose(SIMPLE_ERRORS).to_string()
        }
    }

    pub fn random_short_code(&mut self) -> String {
        self.corpus.random_short_code(&mut self.rng.general)
    }

    pub fn format_with_hex(&mut self, message: &str) -> String {
        self.corpus.format_with_hex(&mut self.rng.general, message)
    }

    pub fn format_with_code(&mut self, message: &str, code: &str) -> String {
        self.corpus.format_with_code(message, code)
    }

    /// Run the full pipeline, leaving the result in `self.canvas`.
    pub fn run_to_canvas(&mut self) -> Result<()> {
        let start = Instant::now();
        let original = self.canvas.clone();

        let subject = detect_subject(&self.origin);
        let points = match &subject {
            Some(subject) => {
                draw_sparse_wireframe(
                    &mut self.canvas,
                    &self.origin,
                    subject,
                    &self.cfg,
                    &mut self.rng.general,
                    self.scale,
                )
            }
            None => {
                debug!("no subject, wireframe skipped");
                Vec::new()
            }
        };
        debug!(points = points.len(), "wireframe stage done");

        text::draw_chaotic_text(self, &points);
        boxes::draw_boxes(self);

        if self.cfg.enable_depth_of_field {
            effects::apply_depth_of_field(&mut self.canvas, &self.cfg);
        }
        effects::apply_crt(&mut self.canvas, &self.cfg, &mut self.rng.array, self.scale);

        let brightness = self.canvas.mean_brightness();
        if brightness > self.cfg.near_white_threshold {
            debug!(brightness, "near-white output detected, keeping the original canvas");
            self.canvas = original;
            self.stats.degenerate_fallback = true;
        }

        self.stats.processing_time_seconds = start.elapsed().as_secs_f64();
        Ok(())
    }

    /// Run the pipeline and write the composite to `save_path`.
    pub fn run(&mut self, save_path: &Path) -> Result<()> {
        self.run_to_canvas()?;
        self.canvas.save(save_path)?;
        debug!(path = %save_path.display(), "render written");
        Ok(())
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }
}

/// One-shot entry point: render `image_path` with `seed` and write the
/// result to `output_path`, returning the session statistics.
pub fn render(
    image_path: &Path,
    font_path: Option<&Path>,
    cfg: &GlitchConfig,
    seed: u64,
    output_path: &Path,
) -> Result<RenderStats> {
    let mut session = RenderSession::new(image_path, font_path, cfg.clone(), seed)?;
    session.run(output_path)?;
    Ok(session.stats.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_flag_overrides_the_fill_color() {
        let canvas = Canvas::solid(200, 60, Rgba::new(0, 0, 0, 255)).expect("canvas");
        let mut cfg = GlitchConfig::default();
        cfg.color_error_text = Rgba::new(255, 0, 0, 255);
        let mut session = RenderSession::from_canvas(canvas, None, cfg, 1);

        session.draw_text_stroked(10, 10, "FAULT", 18.0, Rgba::new(0, 255, 0, 255), true);
        let data = session.canvas.data();
        let mut saw_red = false;
        let mut saw_green = false;
        for pixel in data.chunks_exact(4) {
            if pixel[0] > 200 && pixel[1] < 50 {
                saw_red = true;
            }
            if pixel[1] > 200 && pixel[0] < 50 {
                saw_green = true;
            }
        }
        assert!(saw_red, "error draw should use the error color");
        assert!(!saw_green, "requested fill must be ignored for error draws");
    }

    #[test]
    fn simple_error_list_is_used_when_extended_is_off() {
        let canvas = Canvas::solid(64, 64, Rgba::new(0, 0, 0, 255)).expect("canvas");
        let mut cfg = GlitchConfig::default();
        cfg.use_extended_errors = false;
        let mut session = RenderSession::from_canvas(canvas, None, cfg, 3);
        for _ in 0..16 {
            let message = session.random_error_message();
            assert!(SIMPLE_ERRORS.contains(&message.as_str()));
        }
    }

    #[test]
    fn scale_is_width_normalized() {
        let canvas = Canvas::solid(600, 400, Rgba::new(0, 0, 0, 255)).expect("canvas");
        let session = RenderSession::from_canvas(canvas, None, GlitchConfig::default(), 1);
        assert!((session.scale - 0.5).abs() < 1e-6);
    }
}
