//! Raster post-processing: space-warp, depth of field, CRT.
//!
//! All randomness here comes from the session's array stream; draw order
//! inside each effect is fixed. Effects operate on straight RGBA bytes of
//! an opaque canvas.

use image::imageops::{self, FilterType};
use tracing::debug;

use crate::canvas::Canvas;
use crate::config::GlitchConfig;
use crate::rng::Stream;

const WARP_BAND_CHANCE: f32 = 0.7;
const WARP_COLOR_CHANCE: f32 = 0.5;
const WARP_SCANLINE_CHANCE: f32 = 0.4;
const WARP_SCANLINE_LINE_CHANCE: f32 = 0.3;
const WARP_PIXELATE_CHANCE: f32 = 0.2;
const CRT_SCANLINE_BASE_SPACING: f32 = 3.0;

/// Cyclically shift one pixel row of an RGBA buffer by `shift` pixels
/// (positive = right) with wraparound.
fn roll_row(data: &mut [u8], width: usize, row: usize, shift: i32) {
    if width == 0 {
        return;
    }
    let shift = shift.rem_euclid(width as i32) as usize;
    if shift == 0 {
        return;
    }
    let start = row * width * 4;
    let row_bytes = &mut data[start..start + width * 4];
    row_bytes.rotate_right(shift * 4);
}

/// Cyclically shift a single color channel of one row.
fn roll_row_channel(data: &mut [u8], width: usize, row: usize, channel: usize, shift: i32) {
    if width == 0 {
        return;
    }
    let shift = shift.rem_euclid(width as i32) as usize;
    if shift == 0 {
        return;
    }
    let start = row * width * 4;
    let mut values: Vec<u8> = (0..width).map(|x| data[start + x * 4 + channel]).collect();
    values.rotate_right(shift);
    for (x, value) in values.into_iter().enumerate() {
        data[start + x * 4 + channel] = value;
    }
}

/// Space-warp a sub-rectangle of the canvas: band-wise shifts, channel
/// rolls, scanline jitter, pixelation — in that fixed order, each stage
/// independently triggered.
pub fn apply_space_warp(
    canvas: &mut Canvas,
    cfg: &GlitchConfig,
    rng: &mut Stream,
    scale: f32,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
) {
    let mut region = match canvas.crop(x, y, w, h) {
        Ok(region) => region,
        Err(_) => return,
    };
    let region_w = region.width() as usize;
    let region_h = region.height() as usize;
    if region_w == 0 || region_h == 0 {
        return;
    }

    let intensity = cfg.warp_intensity * rng.uniform(0.8, 1.2);
    let segments = ((cfg.warp_segments as f32 * intensity) as usize).max(2);

    // (a) band-wise horizontal displacement
    if rng.chance(WARP_BAND_CHANCE) {
        let band_height = (region_h / segments).max(1);
        for band in 0..segments {
            let y_start = band * band_height;
            if y_start >= region_h {
                break;
            }
            let y_end = if band == segments - 1 {
                region_h
            } else {
                ((band + 1) * band_height).min(region_h)
            };
            if rng.chance(cfg.warp_glitch_chance) {
                let magnitude =
                    (rng.span_i32(cfg.warp_shift_range) as f32 * intensity * scale) as i32;
                let shift = if rng.chance(0.5) { magnitude } else { -magnitude };
                for row in y_start..y_end {
                    roll_row(region.data_mut(), region_w, row, shift);
                }
            }
        }
    }

    // (b) independent channel rolls
    if cfg.warp_color_shift && rng.chance(WARP_COLOR_CHANCE) {
        for channel in 0..3 {
            let shift = (rng.int_in(-5, 5) as f32 * intensity) as i32;
            if shift != 0 {
                for row in 0..region_h {
                    roll_row_channel(region.data_mut(), region_w, row, channel, shift);
                }
            }
        }
    }

    // (c) per-scanline jitter on every other line
    if cfg.warp_scanline_jitter && rng.chance(WARP_SCANLINE_CHANCE) {
        for row in (0..region_h).step_by(2) {
            if rng.chance(WARP_SCANLINE_LINE_CHANCE) {
                let shift = (rng.int_in(-3, 3) as f32 * intensity) as i32;
                if shift != 0 {
                    roll_row(region.data_mut(), region_w, row, shift);
                }
            }
        }
    }

    // (d) pixelation: smooth downsample, nearest-neighbor upsample
    if rng.chance(WARP_PIXELATE_CHANCE) {
        let block = ((4.0 * intensity) as u32).max(2);
        let small_w = (region_w as u32 / block).max(1);
        let small_h = (region_h as u32 / block).max(1);
        let image = region.to_rgba_image();
        let small = imageops::resize(&image, small_w, small_h, FilterType::Triangle);
        let restored =
            imageops::resize(&small, region_w as u32, region_h as u32, FilterType::Nearest);
        region.replace_pixels(&restored);
    }

    canvas.paste(&region, x, y);
}

/// Radial depth of field: blend toward a blurred + darkened copy outside
/// the focus disk. No-op when disabled in config.
pub fn apply_depth_of_field(canvas: &mut Canvas, cfg: &GlitchConfig) {
    if !cfg.enable_depth_of_field {
        return;
    }

    let width = canvas.width();
    let height = canvas.height();
    let focus_x = width as f32 * cfg.depth_focus_center.0;
    let focus_y = height as f32 * cfg.depth_focus_center.1;
    let min_dim = width.min(height) as f32;
    let focus_radius = min_dim * cfg.depth_focus_radius;
    let fade_span = (min_dim * cfg.depth_fade_start).max(1.0);

    let blurred = imageops::blur(&canvas.to_rgba_image(), cfg.depth_blur_amount);
    let darken = (1.0 - cfg.depth_darken_amount * 0.3).clamp(0.0, 1.0);

    let blurred_data = blurred.as_raw();
    let data = canvas.data_mut();
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - focus_x;
            let dy = y as f32 - focus_y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= focus_radius {
                continue;
            }
            let fade = ((dist - focus_radius) / fade_span).min(1.0);
            let offset = ((y * width + x) * 4) as usize;
            for channel in 0..3 {
                let original = f32::from(data[offset + channel]);
                let distant = f32::from(blurred_data[offset + channel]) * darken;
                data[offset + channel] =
                    (original * (1.0 - fade) + distant * fade).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    debug!("depth of field applied");
}

fn reflect(index: i32, length: i32) -> usize {
    let mut index = index;
    loop {
        if index < 0 {
            index = -index - 1;
        } else if index >= length {
            index = 2 * length - 1 - index;
        } else {
            return index as usize;
        }
    }
}

/// CRT pass: chromatic aberration (red and blue shifted in mirrored
/// directions with edge reflection) followed by scanline darkening.
/// Always runs; the final stage before the output sanity check.
pub fn apply_crt(canvas: &mut Canvas, cfg: &GlitchConfig, rng: &mut Stream, scale: f32) {
    let width = canvas.width() as i32;
    let height = canvas.height() as i32;
    if width == 0 || height == 0 {
        return;
    }

    let shift_x = (rng.uniform(1.0, cfg.rgb_shift_max) * scale) as i32;
    let shift_y = (rng.uniform(0.0, 1.0) * scale) as i32;

    let source = canvas.data().to_vec();
    let data = canvas.data_mut();
    for y in 0..height {
        for x in 0..width {
            let offset = ((y * width + x) * 4) as usize;
            let red_src = (reflect(y - shift_y, height) * width as usize
                + reflect(x - shift_x, width))
                * 4;
            let blue_src = (reflect(y + shift_y, height) * width as usize
                + reflect(x + shift_x, width))
                * 4;
            data[offset] = source[red_src];
            data[offset + 2] = source[blue_src + 2];
        }
    }

    let spacing = ((CRT_SCANLINE_BASE_SPACING * scale) as usize).max(2);
    for y in (0..height as usize).step_by(spacing) {
        let start = y * width as usize * 4;
        for pixel in data[start..start + width as usize * 4].chunks_exact_mut(4) {
            for channel in 0..3 {
                pixel[channel] =
                    (f32::from(pixel[channel]) * cfg.scanline_darkness).round() as u8;
            }
        }
    }
    debug!(shift_x, shift_y, spacing, "crt pass applied");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::rng::RenderRng;

    fn gradient_canvas(width: u32, height: u32) -> Canvas {
        let mut canvas = Canvas::solid(width, height, Rgba::new(0, 0, 0, 255)).expect("canvas");
        let data = canvas.data_mut();
        for y in 0..height as usize {
            for x in 0..width as usize {
                let offset = (y * width as usize + x) * 4;
                data[offset] = (x * 7 % 256) as u8;
                data[offset + 1] = (y * 11 % 256) as u8;
                data[offset + 2] = ((x + y) * 5 % 256) as u8;
            }
        }
        canvas
    }

    #[test]
    fn space_warp_is_deterministic_per_seed() {
        let cfg = GlitchConfig::default();
        let mut first = gradient_canvas(64, 48);
        let mut second = gradient_canvas(64, 48);
        let mut rng_a = RenderRng::seeded(99);
        let mut rng_b = RenderRng::seeded(99);
        apply_space_warp(&mut first, &cfg, &mut rng_a.array, 1.0, 8, 8, 40, 30);
        apply_space_warp(&mut second, &cfg, &mut rng_b.array, 1.0, 8, 8, 40, 30);
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn space_warp_touches_only_the_region() {
        let cfg = GlitchConfig::default();
        let baseline = gradient_canvas(64, 48);
        let mut warped = gradient_canvas(64, 48);
        let mut rng = RenderRng::seeded(4);
        apply_space_warp(&mut warped, &cfg, &mut rng.array, 1.0, 16, 16, 24, 20);
        for y in 0..48usize {
            for x in 0..64usize {
                let inside = (16..40).contains(&x) && (16..36).contains(&y);
                if !inside {
                    let offset = (y * 64 + x) * 4;
                    assert_eq!(
                        warped.data()[offset..offset + 4],
                        baseline.data()[offset..offset + 4],
                        "pixel ({x},{y}) outside the box must be untouched"
                    );
                }
            }
        }
    }

    #[test]
    fn depth_of_field_keeps_the_focus_center_unmodified() {
        let mut cfg = GlitchConfig::default();
        cfg.enable_depth_of_field = true;
        let baseline = gradient_canvas(80, 80);
        let mut processed = gradient_canvas(80, 80);
        apply_depth_of_field(&mut processed, &cfg);
        let center = ((40 * 80 + 40) * 4) as usize;
        assert_eq!(
            processed.data()[center..center + 4],
            baseline.data()[center..center + 4]
        );
    }

    #[test]
    fn depth_of_field_disabled_is_a_passthrough() {
        let mut cfg = GlitchConfig::default();
        cfg.enable_depth_of_field = false;
        let baseline = gradient_canvas(40, 40);
        let mut processed = gradient_canvas(40, 40);
        apply_depth_of_field(&mut processed, &cfg);
        assert_eq!(processed.data(), baseline.data());
    }

    #[test]
    fn crt_darkens_scanlines_and_is_deterministic() {
        let cfg = GlitchConfig::default();
        let mut first = gradient_canvas(32, 32);
        let mut second = gradient_canvas(32, 32);
        let mut rng_a = RenderRng::seeded(7);
        let mut rng_b = RenderRng::seeded(7);
        apply_crt(&mut first, &cfg, &mut rng_a.array, 1.0);
        apply_crt(&mut second, &cfg, &mut rng_b.array, 1.0);
        assert_eq!(first.data(), second.data());
    }

    #[test]
    fn reflect_mirrors_at_both_edges() {
        assert_eq!(reflect(-1, 10), 0);
        assert_eq!(reflect(-3, 10), 2);
        assert_eq!(reflect(10, 10), 9);
        assert_eq!(reflect(12, 10), 7);
        assert_eq!(reflect(5, 10), 5);
    }
}
