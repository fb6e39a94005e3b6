//! Session font handling.
//!
//! One cache per render session, keyed by scaled pixel size. The outline
//! font is loaded once; if the file is missing or unreadable the embedded
//! 5x7 bitmap font takes over — a bad font path is never fatal.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use fontdue::{Font, FontSettings};
use tracing::debug;

use crate::canvas::Canvas;
use crate::color::Rgba;
use crate::pixelfont;

/// A font fixed at one pixel size, ready to measure and draw.
pub enum SizedFont {
    Outline { font: Rc<Font>, px: f32 },
    Builtin { unit: u32 },
}

impl SizedFont {
    /// Advance-summed width of `text` in pixels.
    pub fn measure(&self, text: &str) -> f32 {
        match self {
            Self::Outline { font, px } => text
                .chars()
                .map(|character| font.metrics(character, *px).advance_width)
                .sum(),
            Self::Builtin { unit } => {
                (text.chars().count() as u32 * (pixelfont::GLYPH_WIDTH + 1) * unit) as f32
            }
        }
    }

    /// Draw `text` with `(x, y)` as the top-left corner of the line.
    pub fn draw(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str, color: Rgba) {
        match self {
            Self::Outline { font, px } => {
                let ascent = font
                    .horizontal_line_metrics(*px)
                    .map(|metrics| metrics.ascent)
                    .unwrap_or(*px * 0.8);
                let baseline = y + ascent.round() as i32;
                let mut pen = x as f32;
                for character in text.chars() {
                    let (metrics, coverage) = font.rasterize(character, *px);
                    let origin_x = pen.round() as i32 + metrics.xmin;
                    let origin_y = baseline - (metrics.height as i32 + metrics.ymin);
                    canvas.blend_coverage(
                        origin_x,
                        origin_y,
                        metrics.width as u32,
                        &coverage,
                        color,
                    );
                    pen += metrics.advance_width;
                }
            }
            Self::Builtin { unit } => {
                let unit = *unit;
                let glyph_w = pixelfont::GLYPH_WIDTH * unit;
                let glyph_h = pixelfont::GLYPH_HEIGHT * unit;
                let mut pen = x;
                for character in text.chars() {
                    let mut coverage = vec![0u8; (glyph_w * glyph_h) as usize];
                    for row in 0..pixelfont::GLYPH_HEIGHT {
                        for column in 0..pixelfont::GLYPH_WIDTH {
                            if !pixelfont::sample(character, column, row) {
                                continue;
                            }
                            for dy in 0..unit {
                                let offset = ((row * unit + dy) * glyph_w + column * unit) as usize;
                                coverage[offset..offset + unit as usize].fill(255);
                            }
                        }
                    }
                    canvas.blend_coverage(pen, y, glyph_w, &coverage, color);
                    pen += ((pixelfont::GLYPH_WIDTH + 1) * unit) as i32;
                }
            }
        }
    }
}

/// Lazily populated, idempotent per-size font cache.
pub struct FontCache {
    path: Option<PathBuf>,
    outline: Option<Rc<Font>>,
    load_attempted: bool,
    sized: HashMap<u32, Rc<SizedFont>>,
}

impl FontCache {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            outline: None,
            load_attempted: false,
            sized: HashMap::new(),
        }
    }

    /// Fetch (or build) the font for `size_pt` scaled by the session scale
    /// factor. Re-deriving an entry is always safe.
    pub fn sized(&mut self, size_pt: f32, scale: f32) -> Rc<SizedFont> {
        let px = (size_pt * scale).round().max(1.0) as u32;
        if let Some(font) = self.sized.get(&px) {
            return Rc::clone(font);
        }

        let font = Rc::new(match self.outline(px) {
            Some(outline) => SizedFont::Outline {
                font: outline,
                px: px as f32,
            },
            None => SizedFont::Builtin {
                unit: (px / 8).max(1),
            },
        });
        self.sized.insert(px, Rc::clone(&font));
        font
    }

    fn outline(&mut self, px: u32) -> Option<Rc<Font>> {
        if !self.load_attempted {
            self.load_attempted = true;
            self.outline = self.try_load(px);
        }
        self.outline.clone()
    }

    fn try_load(&self, px: u32) -> Option<Rc<Font>> {
        let path = self.path.as_ref()?;
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(path = %path.display(), %error, "font unreadable, using builtin glyphs");
                return None;
            }
        };
        let settings = FontSettings {
            scale: px as f32,
            ..FontSettings::default()
        };
        match Font::from_bytes(bytes, settings) {
            Ok(font) => Some(Rc::new(font)),
            Err(error) => {
                debug!(path = %path.display(), error, "font failed to parse, using builtin glyphs");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;

    #[test]
    fn missing_font_falls_back_to_builtin() {
        let mut cache = FontCache::new(Some(Path::new("/definitely/not/here.ttf")));
        let font = cache.sized(10.0, 1.0);
        assert!(matches!(*font, SizedFont::Builtin { .. }));
    }

    #[test]
    fn cache_reuses_entries_per_pixel_size() {
        let mut cache = FontCache::new(None);
        let first = cache.sized(10.0, 1.0);
        let second = cache.sized(10.0, 1.0);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn builtin_draw_marks_pixels() {
        let mut cache = FontCache::new(None);
        let font = cache.sized(8.0, 1.0);
        let mut canvas = Canvas::solid(64, 16, color::BLACK).expect("canvas");
        font.draw(&mut canvas, 2, 2, "ERR", color::WHITE);
        assert!(
            canvas.data().chunks_exact(4).any(|pixel| pixel[0] > 0),
            "drawing text should touch the canvas"
        );
    }

    #[test]
    fn builtin_measure_scales_with_text_length() {
        let font = SizedFont::Builtin { unit: 2 };
        assert_eq!(font.measure("AB"), 24.0);
    }
}
