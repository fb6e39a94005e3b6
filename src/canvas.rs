//! CPU canvas: a tiny-skia pixmap with the drawing operations the pipeline
//! needs, plus image-crate decode/encode at the edges.
//!
//! The working canvas is always opaque (alpha 255), so its bytes can be
//! treated as straight RGBA by the raster effects. Transparent overlay
//! layers (connectors, borders) are premultiplied and composited through
//! tiny-skia.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, RgbaImage};
use tiny_skia::{
    FillRule, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::color::Rgba;
use crate::geometry::Point;

#[derive(Clone)]
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// Decode a source image into an opaque canvas. Fails when the file is
    /// missing or not a decodable raster.
    pub fn load(path: &Path) -> Result<Self> {
        let decoded = image::open(path)
            .with_context(|| format!("failed to decode image '{}'", path.display()))?;
        Ok(Self::from_rgb_pixels(decoded.to_rgb8().as_raw(), decoded.width(), decoded.height())?)
    }

    fn from_rgb_pixels(rgb: &[u8], width: u32, height: u32) -> Result<Self> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for pixel in rgb.chunks_exact(3) {
            data.extend_from_slice(&[pixel[0], pixel[1], pixel[2], 255]);
        }
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| anyhow!("image dimensions {width}x{height} are invalid"))?;
        let pixmap = Pixmap::from_vec(data, size)
            .ok_or_else(|| anyhow!("failed to build canvas from {width}x{height} pixels"))?;
        Ok(Self { pixmap })
    }

    /// An opaque canvas filled with one color (fixtures and tests).
    pub fn solid(width: u32, height: u32, color: Rgba) -> Result<Self> {
        let rgb: Vec<u8> = [color.r(), color.g(), color.b()]
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self::from_rgb_pixels(&rgb, width, height)
    }

    /// A fully transparent layer for deferred compositing.
    pub fn layer(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("failed to allocate {width}x{height} layer"))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_mut()
    }

    /// Write the canvas to `path`; PNG or JPEG is chosen by extension
    /// (JPEG output drops the constant alpha).
    pub fn save(&self, path: &Path) -> Result<()> {
        let rgba = self.to_rgba_image();
        let is_jpeg = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| {
                let lower = extension.to_ascii_lowercase();
                lower == "jpg" || lower == "jpeg"
            })
            .unwrap_or(false);

        if is_jpeg {
            DynamicImage::ImageRgba8(rgba)
                .to_rgb8()
                .save(path)
                .with_context(|| format!("failed to write '{}'", path.display()))
        } else {
            rgba.save(path)
                .with_context(|| format!("failed to write '{}'", path.display()))
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_raw(self.width(), self.height(), self.pixmap.data().to_vec())
            .expect("pixmap dimensions always match its buffer")
    }

    pub fn replace_pixels(&mut self, image: &RgbaImage) {
        debug_assert_eq!(image.width(), self.width());
        debug_assert_eq!(image.height(), self.height());
        self.pixmap.data_mut().copy_from_slice(image.as_raw());
    }

    fn stroke_paint(color: Rgba) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(color.skia());
        paint.anti_alias = true;
        paint
    }

    pub fn line(&mut self, from: Point, to: Point, color: Rgba, width: f32) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.x, from.y);
        builder.line_to(to.x, to.y);
        self.stroke(builder, color, width);
    }

    pub fn polyline(&mut self, points: &[Point], color: Rgba, width: f32) {
        if points.len() < 2 {
            return;
        }
        let mut builder = PathBuilder::new();
        builder.move_to(points[0].x, points[0].y);
        for point in &points[1..] {
            builder.line_to(point.x, point.y);
        }
        self.stroke(builder, color, width);
    }

    pub fn quad_bezier(&mut self, from: Point, control: Point, to: Point, color: Rgba, width: f32) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.x, from.y);
        builder.quad_to(control.x, control.y, to.x, to.y);
        self.stroke(builder, color, width);
    }

    pub fn fill_circle(&mut self, center: Point, radius: f32, color: Rgba) {
        let mut builder = PathBuilder::new();
        builder.push_circle(center.x, center.y, radius.max(0.5));
        if let Some(path) = builder.finish() {
            self.pixmap.fill_path(
                &path,
                &Self::stroke_paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba, width: f32) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let path = PathBuilder::from_rect(rect);
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            self.pixmap.stroke_path(
                &path,
                &Self::stroke_paint(color),
                &stroke,
                Transform::identity(),
                None,
            );
        }
    }

    fn stroke(&mut self, builder: PathBuilder, color: Rgba, width: f32) {
        if let Some(path) = builder.finish() {
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            self.pixmap.stroke_path(
                &path,
                &Self::stroke_paint(color),
                &stroke,
                Transform::identity(),
                None,
            );
        }
    }

    /// Source-over composite a (possibly transparent) layer onto this
    /// canvas.
    pub fn composite(&mut self, layer: &Canvas) {
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// `self = top * top_weight + self * base_weight` per channel; the
    /// translucent "ghost mesh" blend. Both canvases must be opaque.
    pub fn blend_weighted(&mut self, top: &Canvas, top_weight: f32, base_weight: f32) {
        debug_assert_eq!(top.width(), self.width());
        debug_assert_eq!(top.height(), self.height());
        let top_data = top.pixmap.data();
        for (dst, src) in self.pixmap.data_mut().chunks_exact_mut(4).zip(top_data.chunks_exact(4)) {
            for channel in 0..3 {
                let mixed =
                    f32::from(src[channel]) * top_weight + f32::from(dst[channel]) * base_weight;
                dst[channel] = mixed.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = 255;
        }
    }

    /// Copy out a sub-rectangle (clamped to bounds) as an opaque canvas.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Result<Canvas> {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let w = w.min(self.width() - x);
        let h = h.min(self.height() - y);
        let mut region = Canvas::layer(w.max(1), h.max(1))?;
        let src = self.pixmap.data();
        let dst = region.pixmap.data_mut();
        for row in 0..h {
            let src_offset = (((y + row) * self.width() + x) * 4) as usize;
            let dst_offset = (row * w * 4) as usize;
            dst[dst_offset..dst_offset + (w * 4) as usize]
                .copy_from_slice(&src[src_offset..src_offset + (w * 4) as usize]);
        }
        Ok(region)
    }

    /// Overwrite a region with `region`'s pixels (no blending).
    pub fn paste(&mut self, region: &Canvas, x: u32, y: u32) {
        let w = region.width().min(self.width().saturating_sub(x));
        let h = region.height().min(self.height().saturating_sub(y));
        let self_width = self.width();
        let src = region.pixmap.data();
        let dst = self.pixmap.data_mut();
        for row in 0..h {
            let dst_offset = (((y + row) * self_width + x) * 4) as usize;
            let src_offset = (row * region.width() * 4) as usize;
            dst[dst_offset..dst_offset + (w * 4) as usize]
                .copy_from_slice(&src[src_offset..src_offset + (w * 4) as usize]);
        }
    }

    /// Mean of the RGB channels across the whole canvas, 0-255.
    pub fn mean_brightness(&self) -> f32 {
        let data = self.pixmap.data();
        if data.is_empty() {
            return 0.0;
        }
        let mut sum: u64 = 0;
        for pixel in data.chunks_exact(4) {
            sum += u64::from(pixel[0]) + u64::from(pixel[1]) + u64::from(pixel[2]);
        }
        sum as f32 / (self.width() as f32 * self.height() as f32 * 3.0)
    }

    /// Blend one glyph coverage bitmap at integer coordinates, straight
    /// source-over with the color's alpha scaled by coverage.
    pub fn blend_coverage(
        &mut self,
        origin_x: i32,
        origin_y: i32,
        glyph_width: u32,
        coverage: &[u8],
        color: Rgba,
    ) {
        if glyph_width == 0 {
            return;
        }
        let canvas_width = self.width() as i32;
        let canvas_height = self.height() as i32;
        let rows = coverage.len() as u32 / glyph_width;
        let data = self.pixmap.data_mut();

        for row in 0..rows as i32 {
            let y = origin_y + row;
            if y < 0 || y >= canvas_height {
                continue;
            }
            for column in 0..glyph_width as i32 {
                let x = origin_x + column;
                if x < 0 || x >= canvas_width {
                    continue;
                }
                let mask = coverage[(row * glyph_width as i32 + column) as usize];
                if mask == 0 {
                    continue;
                }
                let alpha = u32::from(mask) * u32::from(color.a()) / 255;
                if alpha == 0 {
                    continue;
                }
                let offset = ((y * canvas_width + x) * 4) as usize;
                for (channel, value) in [color.r(), color.g(), color.b()].into_iter().enumerate() {
                    let src = u32::from(value) * alpha;
                    let dst = u32::from(data[offset + channel]) * (255 - alpha);
                    data[offset + channel] = ((src + dst) / 255) as u8;
                }
                data[offset + 3] = 255;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;

    #[test]
    fn solid_canvas_reports_its_fill_brightness() {
        let canvas = Canvas::solid(32, 16, Rgba::new(120, 120, 120, 255)).expect("solid canvas");
        assert!((canvas.mean_brightness() - 120.0).abs() < 0.5);
    }

    #[test]
    fn weighted_blend_mixes_toward_the_overlay() {
        let mut base = Canvas::solid(8, 8, color::BLACK).expect("base");
        let top = Canvas::solid(8, 8, color::WHITE).expect("top");
        base.blend_weighted(&top, 0.65, 0.35);
        let value = base.data()[0];
        assert!((value as i32 - 166).abs() <= 1, "expected ~0.65*255, got {value}");
    }

    #[test]
    fn crop_and_paste_round_trip_pixels() {
        let mut canvas = Canvas::solid(32, 32, Rgba::new(10, 20, 30, 255)).expect("canvas");
        let mut region = canvas.crop(4, 4, 8, 8).expect("crop");
        for pixel in region.data_mut().chunks_exact_mut(4) {
            pixel[0] = 200;
        }
        canvas.paste(&region, 4, 4);
        let offset = ((5 * 32 + 5) * 4) as usize;
        assert_eq!(canvas.data()[offset], 200);
        let outside = ((20 * 32 + 20) * 4) as usize;
        assert_eq!(canvas.data()[outside], 10);
    }

    #[test]
    fn coverage_blend_is_clipped_at_the_edges() {
        let mut canvas = Canvas::solid(8, 8, color::BLACK).expect("canvas");
        let coverage = vec![255u8; 16];
        canvas.blend_coverage(-2, -2, 4, &coverage, color::WHITE);
        assert_eq!(canvas.data()[0], 255, "in-bounds corner should be painted");
    }
}
