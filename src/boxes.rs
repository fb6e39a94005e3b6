//! Decorative boxes: placement, per-type treatment, labels, proximity
//! connectors, borders.
//!
//! Treatments run over all boxes before any label or border is drawn, so
//! overlapping treatments compose under later strokes; connectors and
//! borders each go on their own transparent layer and are composited once,
//! which keeps connectors from occluding fills and puts borders on top of
//! everything.

use tracing::debug;

use crate::canvas::Canvas;
use crate::color::Rgba;
use crate::effects::apply_space_warp;
use crate::geometry::Point;
use crate::messages::SHORT_ERROR_CODES;
use crate::renderer::RenderSession;

const PLACEMENT_MARGIN: i32 = 10;
const HEIGHT_RATIO_LO: f32 = 0.6;
const HEIGHT_RATIO_HI: f32 = 0.9;
const WARP_MARK: &str = "~WARP~";
const WARP_MARK_COLOR: Rgba = Rgba([150, 150, 150, 200]);

const SIMPLE_BOX_CODES: &[&str] = &["ERR", "FAIL", "BAD", "HALT", "STOP", "ABORT", "PANIC"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    Plain,
    Invert,
    Bios,
    SpaceWarp,
}

impl BoxKind {
    fn from_label(label: &str) -> Self {
        match label {
            "invert" => Self::Invert,
            "bios" => Self::Bios,
            "space_warp" => Self::SpaceWarp,
            _ => Self::Plain,
        }
    }
}

/// One placed box; recorded on the session for downstream reuse and
/// discarded with it.
#[derive(Debug, Clone, Copy)]
pub struct PlacedBox {
    pub kind: BoxKind,
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl PlacedBox {
    fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.w as f32 / 2.0,
            self.y as f32 + self.h as f32 / 2.0,
        )
    }
}

pub fn draw_boxes(session: &mut RenderSession) {
    let width = session.width() as i32;
    let height = session.height() as i32;
    let scale = session.scale;

    let num_boxes = session.rng.general.span_u32(session.cfg.box_count);

    // Placement pass.
    let mut boxes: Vec<PlacedBox> = Vec::with_capacity(num_boxes as usize);
    for _ in 0..num_boxes {
        let kind = BoxKind::from_label(
            session
                .rng
                .general
                .weighted_choice(&session.cfg.box_type_weights)
                .unwrap_or("plain"),
        );

        let size = session.cfg.box_size_range;
        let box_w = session
            .rng
            .general
            .int_in((size.0 as f32 * scale) as i32, (size.1 as f32 * scale) as i32)
            .max(2) as u32;
        let box_h = session
            .rng
            .general
            .int_in(
                (box_w as f32 * HEIGHT_RATIO_LO) as i32,
                (box_w as f32 * HEIGHT_RATIO_HI) as i32,
            )
            .max(2) as u32;

        let x = session.rng.general.int_in(
            PLACEMENT_MARGIN,
            (width - box_w as i32 - PLACEMENT_MARGIN).max(PLACEMENT_MARGIN + 1),
        );
        let y = session.rng.general.int_in(
            PLACEMENT_MARGIN,
            (height - box_h as i32 - PLACEMENT_MARGIN).max(PLACEMENT_MARGIN + 1),
        );

        boxes.push(PlacedBox {
            kind,
            x,
            y,
            w: box_w,
            h: box_h,
        });
    }
    session.boxes_info = boxes.clone();

    // Treatment pass, before any labels or borders.
    for placed in &boxes {
        match placed.kind {
            BoxKind::Invert => invert_interior(&mut session.canvas, placed),
            BoxKind::SpaceWarp => {
                apply_space_warp(
                    &mut session.canvas,
                    &session.cfg,
                    &mut session.rng.array,
                    scale,
                    placed.x.max(0) as u32,
                    placed.y.max(0) as u32,
                    placed.w,
                    placed.h,
                );
                session.stats.warp_boxes += 1;
            }
            BoxKind::Plain | BoxKind::Bios => {}
        }
    }

    // Label pass.
    let error_codes: &[&str] = if session.cfg.use_extended_errors {
        SHORT_ERROR_CODES
    } else {
        SIMPLE_BOX_CODES
    };
    for placed in &boxes {
        if session.cfg.box_float_display {
            let value = session.rng.general.span_f32(session.cfg.box_float_range);
            let float_text = format!(
                "{value:.precision$}",
                precision = session.cfg.box_float_precision as usize
            );
            let font = session.font(8.0);
            let text_width = font.measure(&float_text);
            let text_x = placed.x + ((placed.w as f32 - text_width) / 2.0) as i32;
            let text_y = placed.y + (placed.h as i32 - 8) / 2;
            let fill = session.cfg.color_float;
            session.draw_text_stroked(text_x, text_y, &float_text, 8.0, fill, false);
        }

        if placed.kind == BoxKind::Bios {
            let title_h = (session.cfg.bios_title_bar_height as f32 * scale) as i32;
            let formats = session.cfg.bios_title_formats.clone();
            let title_format = if formats.is_empty() {
                "[BIOS]".to_string()
            } else {
                session.rng.general.choose(&formats).clone()
            };
            let code = session.rng.general.choose(error_codes).to_string();
            let title = format!("{title_format}:{code}");
            let fill = session.cfg.color_normal_text;
            session.draw_text_stroked(
                placed.x + 3,
                placed.y + (title_h - 10) / 2,
                &title,
                10.0,
                fill,
                false,
            );
        }

        if placed.kind == BoxKind::SpaceWarp {
            session.draw_text_stroked(
                placed.x + 3,
                placed.y + 3,
                WARP_MARK,
                6.0,
                WARP_MARK_COLOR,
                false,
            );
        }

        session.stats.boxes_drawn += 1;
    }

    // Connector pass on its own layer.
    if session.cfg.box_line_connect_chance > 0.0 {
        draw_box_connections(session, &boxes);
    }

    // Border pass on its own layer, always on top.
    if let Ok(mut border_layer) = Canvas::layer(width as u32, height as u32) {
        let border_color = session.cfg.color_border;
        let thickness = session.cfg.box_border_thickness as f32;
        for placed in &boxes {
            border_layer.stroke_rect(
                placed.x as f32,
                placed.y as f32,
                placed.w as f32,
                placed.h as f32,
                border_color,
                thickness,
            );
            if placed.kind == BoxKind::Bios {
                let title_h = (session.cfg.bios_title_bar_height as f32 * scale) as i32;
                border_layer.line(
                    Point::new(placed.x as f32, (placed.y + title_h) as f32),
                    Point::new((placed.x + placed.w as i32) as f32, (placed.y + title_h) as f32),
                    border_color,
                    thickness,
                );
            }
        }
        session.canvas.composite(&border_layer);
    }

    debug!(
        boxes = boxes.len(),
        warp_boxes = session.stats.warp_boxes,
        "box compositor done"
    );
}

/// Numeric channel inversion of the interior, excluding a 1px margin.
fn invert_interior(canvas: &mut Canvas, placed: &PlacedBox) {
    let width = canvas.width() as i32;
    let height = canvas.height() as i32;
    let x0 = (placed.x + 1).max(0);
    let y0 = (placed.y + 1).max(0);
    let x1 = (placed.x + placed.w as i32 - 1).min(width);
    let y1 = (placed.y + placed.h as i32 - 1).min(height);
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    let data = canvas.data_mut();
    for y in y0..y1 {
        for x in x0..x1 {
            let offset = ((y * width + x) * 4) as usize;
            for channel in 0..3 {
                data[offset + channel] = 255 - data[offset + channel];
            }
        }
    }
}

/// Proximity connectors between box centers: closer pairs connect more
/// often, optionally routed through a jittered midpoint.
fn draw_box_connections(session: &mut RenderSession, boxes: &[PlacedBox]) {
    if boxes.len() < 2 {
        return;
    }

    let mut layer = match Canvas::layer(session.width(), session.height()) {
        Ok(layer) => layer,
        Err(_) => return,
    };

    let max_distance = session.cfg.box_line_max_distance * session.scale;
    let color = session.cfg.box_line_color;
    let thickness = session.cfg.box_line_thickness as f32;
    let centers: Vec<Point> = boxes.iter().map(PlacedBox::center).collect();

    let mut connections = 0u32;
    for i in 0..centers.len() {
        for j in (i + 1)..centers.len() {
            let dist = centers[i].distance(&centers[j]);
            if dist >= max_distance {
                continue;
            }
            let probability =
                session.cfg.box_line_connect_chance * (1.0 - dist / max_distance);
            if !session.rng.general.chance(probability) {
                continue;
            }

            if session.rng.general.chance(session.cfg.box_line_jitter_chance) {
                let amount = session.cfg.box_line_jitter_amount;
                let mid = Point::new(
                    (centers[i].x + centers[j].x) / 2.0
                        + session.rng.general.int_in(-amount, amount) as f32,
                    (centers[i].y + centers[j].y) / 2.0
                        + session.rng.general.int_in(-amount, amount) as f32,
                );
                layer.line(centers[i], mid, color, thickness);
                layer.line(mid, centers[j], color, thickness);
            } else {
                layer.line(centers[i], centers[j], color, thickness);
            }
            connections += 1;
        }
    }

    session.canvas.composite(&layer);
    session.stats.box_connections = connections;
    debug!(connections, "box connectors drawn");
}
