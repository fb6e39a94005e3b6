//! Chaotic text overlay: styled log blocks, fatal captions, node
//! annotations, the title block, and the character-erosion transform.

use tracing::debug;

use crate::color::Rgba;
use crate::geometry::Point;
use crate::messages::SHORT_ERROR_CODES;
use crate::renderer::RenderSession;
use crate::rng::Stream;

const ERROR_TAGS: &[&str] = &["[ERR]", "[WARN]", "[FAIL]", "[BUG]", "[FATAL]"];
const INFO_TAGS: &[&str] = &["[INFO]", "[DEBUG]", "[LOG]", "[TRACE]"];
const FORMAT_VARIANTS: &[&str] = &["plain", "hex", "code"];
const NOISE_GLYPHS: &[char] = &['_', ' ', '.', 'x'];
const SIMPLE_NODE_LABELS: &[&str] = &["ERR", "FAIL", "BAD", "NULL"];

const FONT_TINY: f32 = 8.0;
const FONT_SMALL: f32 = 10.0;
const FONT_MEDIUM: f32 = 13.0;
const FONT_LARGE: f32 = 18.0;

const HUD_LINE_COLOR: Rgba = Rgba([200, 200, 200, 60]);
const FATAL_EROSION_RATE: f32 = 0.1;

/// Per-character probabilistic corruption. Spaces are never altered; every
/// other character is replaced by a noise glyph with probability `rate`.
pub fn erode_text(rng: &mut Stream, text: &str, rate: f32) -> String {
    text.chars()
        .map(|character| {
            if rng.unit() < rate && character != ' ' {
                *rng.choose(NOISE_GLYPHS)
            } else {
                character
            }
        })
        .collect()
}

pub fn draw_chaotic_text(session: &mut RenderSession, points: &[Point]) {
    let width = session.width() as f32;
    let height = session.height() as f32;
    let scale = session.scale;

    // Styled log blocks.
    let num_blocks = session.rng.general.span_u32(session.cfg.log_blocks_range);
    session.stats.text_blocks = num_blocks;

    for _ in 0..num_blocks {
        let style = session
            .rng
            .general
            .weighted_choice(&session.cfg.style_weights)
            .unwrap_or("normal")
            .to_string();

        let base_x = session
            .rng
            .general
            .int_in((10.0 * scale) as i32, (width * 0.85) as i32) as f32;
        let mut curr_y = (height * session.rng.general.uniform(0.1, 0.9)) as i32;
        let mut curr_x = base_x;

        let lines = session.rng.general.span_u32(session.cfg.log_lines_per_block);
        for _ in 0..lines {
            let message = session.random_error_message();
            let is_error = session.rng.general.unit() > 0.7;
            let tag = if is_error {
                session.rng.general.choose(ERROR_TAGS)
            } else {
                session.rng.general.choose(INFO_TAGS)
            }
            .to_string();

            let full_text = match *session.rng.general.choose(FORMAT_VARIANTS) {
                "hex" => session.format_with_hex(&message),
                "code" => {
                    let code = session.random_short_code();
                    session.format_with_code(&message, &code)
                }
                _ => format!("{tag} {message}"),
            };

            match style.as_str() {
                "staircase" => {
                    curr_x += session.rng.general.span_i32(session.cfg.staircase_step) as f32
                        * scale;
                }
                "jitter" => {
                    curr_x = base_x + session.rng.general.int_in(-40, 40) as f32 * scale;
                }
                _ => curr_x = base_x,
            }
            curr_y += (session.rng.general.uniform(15.0, 40.0) * scale) as i32;

            let torn = style == "torn"
                && session.rng.general.chance(session.cfg.torn_trigger_chance);
            if torn {
                // Scan-tear: split at the tag boundary and offset the tail.
                let split = tag.len().min(full_text.len());
                let (head, tail) = full_text.split_at(split);
                let head = head.to_string();
                let tail = tail.to_string();

                let fill = session.cfg.color_normal_text;
                session.draw_text_stroked(
                    curr_x as i32,
                    curr_y,
                    &head,
                    FONT_SMALL,
                    fill,
                    is_error,
                );

                let gap_x = session.rng.general.span_i32(session.cfg.torn_offset_x) as f32
                    * scale;
                let gap_y = session.rng.general.span_i32(session.cfg.torn_offset_y) as f32
                    * scale;
                session.draw_text_stroked(
                    (curr_x + gap_x) as i32,
                    curr_y + gap_y as i32,
                    &tail,
                    FONT_SMALL,
                    fill,
                    is_error,
                );
            } else {
                let fill = session.cfg.color_normal_text;
                session.draw_text_stroked(
                    curr_x as i32,
                    curr_y,
                    &full_text,
                    FONT_SMALL,
                    fill,
                    is_error,
                );
            }
        }
    }

    // Standalone fatal captions, each optionally tethered to a feature
    // point by a faint HUD line.
    let fatal_count = session.rng.general.span_u32(session.cfg.fatal_error_count);
    for _ in 0..fatal_count {
        let ex = session
            .rng
            .general
            .int_in((width * 0.1) as i32, (width * 0.8) as i32);
        let ey = session
            .rng
            .general
            .int_in((height * 0.1) as i32, (height * 0.8) as i32);

        let message = session.random_error_message();
        let with_address = session.format_with_hex(&message);
        let eroded = erode_text(&mut session.rng.general, &with_address, FATAL_EROSION_RATE);
        let fill = session.cfg.color_error_text;
        session.draw_text_stroked(ex, ey, &eroded, FONT_MEDIUM, fill, true);

        if !points.is_empty() && session.rng.general.chance(session.cfg.hud_line_chance) {
            let target = *session.rng.general.choose(points);
            session.canvas.line(
                Point::new(ex as f32 + 80.0 * scale, ey as f32 + 5.0 * scale),
                target,
                HUD_LINE_COLOR,
                1.0,
            );
        }
    }

    // Node annotations at feature points.
    for point in points {
        if !session.rng.general.chance(session.cfg.node_text_chance) {
            continue;
        }
        let label = if session.cfg.use_extended_errors {
            session.rng.general.choose(SHORT_ERROR_CODES)
        } else {
            session.rng.general.choose(SIMPLE_NODE_LABELS)
        }
        .to_string();
        let ox = session.rng.general.int_in(4, 15) * session.rng.general.sign();
        let oy = session.rng.general.int_in(4, 15) * session.rng.general.sign();
        let fill = session.cfg.color_normal_text;
        session.draw_text_stroked(
            point.x as i32 + ox,
            point.y as i32 + oy,
            &label,
            FONT_TINY,
            fill,
            false,
        );
    }

    // Title block.
    let rate = session.cfg.title_erosion_rate;
    let title1 = erode_text(&mut session.rng.general, "SYSTEM_PANIC", rate);
    let title2 = erode_text(&mut session.rng.general, ":: KERNEL_DUMP", rate * 0.6);
    let title3 = erode_text(&mut session.rng.general, "CRITICAL ERROR", rate * 0.4);

    let normal = session.cfg.color_normal_text;
    let error = session.cfg.color_error_text;
    session.draw_text_stroked(20, 20, &title1, FONT_LARGE, normal, true);
    session.draw_text_stroked(25, 20 + (22.0 * scale) as i32, &title2, FONT_LARGE, normal, false);
    session.draw_text_stroked(20, 20 + (50.0 * scale) as i32, &title3, FONT_MEDIUM, error, true);

    debug!(blocks = num_blocks, fatals = fatal_count, "text overlay done");
}
