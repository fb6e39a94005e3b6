//! Render configuration: an immutable-per-run snapshot of every tunable.
//!
//! The struct is fixed and statically typed; documents missing a field
//! deserialize to that field's documented default instead of failing.
//! `(min, max)` pairs serialize as 2-element sequences and round-trip
//! exactly, including pathological `min > max` pairs — inverted pairs are
//! only normalized when a value is drawn from them, never in storage.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// A `(min, max)` parameter pair. Stored verbatim; see
/// [`crate::rng::Stream::span_u32`] for sampling semantics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span<T>(pub T, pub T);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlitchConfig {
    // Colors.
    #[serde(default = "defaults::color_warning")]
    pub color_warning: Rgba,
    #[serde(default = "defaults::color_error_text")]
    pub color_error_text: Rgba,
    #[serde(default = "defaults::white")]
    pub color_normal_text: Rgba,
    #[serde(default = "defaults::white")]
    pub color_border: Rgba,
    #[serde(default = "defaults::white")]
    pub color_float: Rgba,
    #[serde(default = "defaults::mesh_color")]
    pub mesh_color: Rgba,
    #[serde(default = "defaults::box_line_color")]
    pub box_line_color: Rgba,

    // Mesh and nerve lines.
    #[serde(default = "defaults::mesh_complexity")]
    pub mesh_complexity: u32,
    #[serde(default = "defaults::line_connect_chance")]
    pub line_connect_chance: f32,
    #[serde(default = "defaults::nerve_mutation_chance")]
    pub nerve_mutation_chance: f32,

    // Scattered text.
    #[serde(default = "defaults::log_blocks_range")]
    pub log_blocks_range: Span<u32>,
    #[serde(default = "defaults::log_lines_per_block")]
    pub log_lines_per_block: Span<u32>,
    #[serde(default = "defaults::node_text_chance")]
    pub node_text_chance: f32,

    // Erosion and fatal captions.
    #[serde(default = "defaults::title_erosion_rate")]
    pub title_erosion_rate: f32,
    #[serde(default = "defaults::fatal_error_count")]
    pub fatal_error_count: Span<u32>,
    #[serde(default = "defaults::hud_line_chance")]
    pub hud_line_chance: f32,

    // CRT post-processing.
    #[serde(default = "defaults::rgb_shift_max")]
    pub rgb_shift_max: f32,
    #[serde(default = "defaults::scanline_darkness")]
    pub scanline_darkness: f32,

    // Text layout collapse styles.
    #[serde(default = "defaults::style_weights")]
    pub style_weights: BTreeMap<String, u32>,
    #[serde(default = "defaults::torn_trigger_chance")]
    pub torn_trigger_chance: f32,
    #[serde(default = "defaults::torn_offset_x")]
    pub torn_offset_x: Span<i32>,
    #[serde(default = "defaults::torn_offset_y")]
    pub torn_offset_y: Span<i32>,
    #[serde(default = "defaults::staircase_step")]
    pub staircase_step: Span<i32>,

    // Boxes.
    #[serde(default = "defaults::box_count")]
    pub box_count: Span<u32>,
    #[serde(default = "defaults::box_size_range")]
    pub box_size_range: Span<u32>,
    #[serde(default = "defaults::one")]
    pub box_border_thickness: u32,
    #[serde(default = "defaults::box_line_connect_chance")]
    pub box_line_connect_chance: f32,
    #[serde(default = "defaults::box_line_max_distance")]
    pub box_line_max_distance: f32,
    #[serde(default = "defaults::one")]
    pub box_line_thickness: u32,
    #[serde(default = "defaults::box_line_jitter_chance")]
    pub box_line_jitter_chance: f32,
    #[serde(default = "defaults::box_line_jitter_amount")]
    pub box_line_jitter_amount: i32,
    #[serde(default = "defaults::yes")]
    pub box_float_display: bool,
    #[serde(default = "defaults::box_float_range")]
    pub box_float_range: Span<f32>,
    #[serde(default = "defaults::box_float_precision")]
    pub box_float_precision: u32,
    #[serde(default = "defaults::box_type_weights")]
    pub box_type_weights: BTreeMap<String, u32>,
    #[serde(default = "defaults::bios_title_bar_height")]
    pub bios_title_bar_height: u32,
    #[serde(default = "defaults::bios_title_formats")]
    pub bios_title_formats: Vec<String>,

    // Space-warp boxes.
    #[serde(default = "defaults::warp_intensity")]
    pub warp_intensity: f32,
    #[serde(default = "defaults::warp_segments")]
    pub warp_segments: u32,
    #[serde(default = "defaults::warp_glitch_chance")]
    pub warp_glitch_chance: f32,
    #[serde(default = "defaults::warp_shift_range")]
    pub warp_shift_range: Span<i32>,
    #[serde(default = "defaults::yes")]
    pub warp_color_shift: bool,
    #[serde(default = "defaults::yes")]
    pub warp_scanline_jitter: bool,

    // Error corpus.
    #[serde(default = "defaults::yes")]
    pub use_extended_errors: bool,
    #[serde(default = "defaults::error_weights")]
    pub error_weights: BTreeMap<String, u32>,

    // Depth of field.
    #[serde(default = "defaults::yes")]
    pub enable_depth_of_field: bool,
    #[serde(default = "defaults::depth_focus_center")]
    pub depth_focus_center: (f32, f32),
    #[serde(default = "defaults::depth_focus_radius")]
    pub depth_focus_radius: f32,
    #[serde(default = "defaults::depth_blur_amount")]
    pub depth_blur_amount: f32,
    #[serde(default = "defaults::depth_darken_amount")]
    pub depth_darken_amount: f32,
    #[serde(default = "defaults::depth_fade_start")]
    pub depth_fade_start: f32,

    // Degenerate-output fallback.
    #[serde(default = "defaults::near_white_threshold")]
    pub near_white_threshold: f32,
}

mod defaults {
    use std::collections::BTreeMap;

    use crate::color::Rgba;
    use crate::config::Span;

    fn map(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
        entries
            .iter()
            .map(|(key, weight)| (key.to_string(), *weight))
            .collect()
    }

    pub fn white() -> Rgba {
        Rgba::new(255, 255, 255, 255)
    }

    pub fn color_warning() -> Rgba {
        Rgba::new(255, 50, 50, 255)
    }

    pub fn color_error_text() -> Rgba {
        Rgba::new(255, 50, 50, 255)
    }

    pub fn mesh_color() -> Rgba {
        Rgba::new(255, 255, 255, 200)
    }

    pub fn box_line_color() -> Rgba {
        Rgba::new(255, 255, 255, 180)
    }

    pub fn one() -> u32 {
        1
    }

    pub fn yes() -> bool {
        true
    }

    pub fn mesh_complexity() -> u32 {
        220
    }

    pub fn line_connect_chance() -> f32 {
        0.18
    }

    pub fn nerve_mutation_chance() -> f32 {
        0.25
    }

    pub fn log_blocks_range() -> Span<u32> {
        Span(4, 28)
    }

    pub fn log_lines_per_block() -> Span<u32> {
        Span(2, 3)
    }

    pub fn node_text_chance() -> f32 {
        0.35
    }

    pub fn title_erosion_rate() -> f32 {
        0.33
    }

    pub fn fatal_error_count() -> Span<u32> {
        Span(4, 6)
    }

    pub fn hud_line_chance() -> f32 {
        0.6
    }

    pub fn rgb_shift_max() -> f32 {
        3.0
    }

    pub fn scanline_darkness() -> f32 {
        0.88
    }

    pub fn style_weights() -> BTreeMap<String, u32> {
        map(&[("staircase", 4), ("torn", 5), ("jitter", 2), ("normal", 1)])
    }

    pub fn torn_trigger_chance() -> f32 {
        0.6
    }

    pub fn torn_offset_x() -> Span<i32> {
        Span(60, 150)
    }

    pub fn torn_offset_y() -> Span<i32> {
        Span(-10, 20)
    }

    pub fn staircase_step() -> Span<i32> {
        Span(10, 30)
    }

    pub fn box_count() -> Span<u32> {
        Span(18, 30)
    }

    pub fn box_size_range() -> Span<u32> {
        Span(40, 150)
    }

    pub fn box_line_connect_chance() -> f32 {
        1.0
    }

    pub fn box_line_max_distance() -> f32 {
        300.0
    }

    pub fn box_line_jitter_chance() -> f32 {
        0.3
    }

    pub fn box_line_jitter_amount() -> i32 {
        15
    }

    pub fn box_float_range() -> Span<f32> {
        Span(-999.999, 999.999)
    }

    pub fn box_float_precision() -> u32 {
        3
    }

    pub fn box_type_weights() -> BTreeMap<String, u32> {
        map(&[("plain", 3), ("invert", 2), ("bios", 4), ("space_warp", 3)])
    }

    pub fn bios_title_bar_height() -> u32 {
        16
    }

    pub fn bios_title_formats() -> Vec<String> {
        [
            "[BIOS]", "[SETUP]", "[POST]", "[CMOS]", "[ROM]", "[ERR]", "[WARN]", "[INFO]",
            "[FATAL]", "[PANIC]",
        ]
        .iter()
        .map(|format| format.to_string())
        .collect()
    }

    pub fn warp_intensity() -> f32 {
        0.7
    }

    pub fn warp_segments() -> u32 {
        10
    }

    pub fn warp_glitch_chance() -> f32 {
        0.8
    }

    pub fn warp_shift_range() -> Span<i32> {
        Span(5, 20)
    }

    pub fn error_weights() -> BTreeMap<String, u32> {
        map(&[
            ("fatal", 1),
            ("hash", 1),
            ("key", 1),
            ("auth", 1),
            ("network", 1),
            ("hardware", 1),
            ("filesystem", 1),
            ("database", 1),
            ("security", 1),
            ("crypto", 1),
            ("runtime", 1),
            ("driver", 1),
            ("monitoring", 1),
            ("ml", 2),
            ("stack", 2),
        ])
    }

    pub fn depth_focus_center() -> (f32, f32) {
        (0.5, 0.5)
    }

    pub fn depth_focus_radius() -> f32 {
        0.3
    }

    pub fn depth_blur_amount() -> f32 {
        1.5
    }

    pub fn depth_darken_amount() -> f32 {
        0.7
    }

    pub fn depth_fade_start() -> f32 {
        0.2
    }

    pub fn near_white_threshold() -> f32 {
        250.0
    }
}

impl Default for GlitchConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty document must yield the default config")
    }
}

impl GlitchConfig {
    pub fn from_json_str(document: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(document).context("failed to parse configuration document")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let document = fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_json_str(&document)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }

    /// Reject values that would poison sampling. Range pairs are *not*
    /// checked for min <= max: inverted pairs are legal in storage and
    /// normalized at draw time.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("line_connect_chance", self.line_connect_chance),
            ("nerve_mutation_chance", self.nerve_mutation_chance),
            ("node_text_chance", self.node_text_chance),
            ("title_erosion_rate", self.title_erosion_rate),
            ("hud_line_chance", self.hud_line_chance),
            ("torn_trigger_chance", self.torn_trigger_chance),
            ("box_line_connect_chance", self.box_line_connect_chance),
            ("box_line_jitter_chance", self.box_line_jitter_chance),
            ("warp_glitch_chance", self.warp_glitch_chance),
            ("rgb_shift_max", self.rgb_shift_max),
            ("scanline_darkness", self.scanline_darkness),
            ("warp_intensity", self.warp_intensity),
            ("near_white_threshold", self.near_white_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be finite and non-negative, got {value}");
            }
        }
        Ok(())
    }
}
