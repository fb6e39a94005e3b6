//! Wireframe mesh: feature points, triangulation, nerve lines.
//!
//! Corner-like features are sampled inside the subject mask, triangulated
//! together with the hull vertices, and a stochastic subset of triangle
//! edges is drawn as "nerve lines" on an overlay that is blended 65/35
//! onto the canvas — a translucent ghost mesh rather than opaque strokes.
//! The accepted point list is returned for the text stage to anchor on.

use tracing::debug;

use crate::canvas::Canvas;
use crate::config::GlitchConfig;
use crate::delaunay::Triangulation;
use crate::geometry::{point_in_polygon, Point};
use crate::rng::Stream;
use crate::subject::{grayscale, Subject};

const CORNER_QUALITY_LEVEL: f32 = 0.015;
const CORNER_MIN_DISTANCE: f32 = 25.0;
const OVERLAY_WEIGHT: f32 = 0.65;
const SECOND_EDGE_CHANCE: f32 = 0.4;
const MARKER_CHANCE: f32 = 0.05;
const NERVE_CURVE_CHANCE: f32 = 0.6;
const NERVE_NODE_CHANCE: f32 = 0.6;

pub fn draw_sparse_wireframe(
    canvas: &mut Canvas,
    source: &Canvas,
    subject: &Subject,
    cfg: &GlitchConfig,
    rng: &mut Stream,
    scale: f32,
) -> Vec<Point> {
    let width = source.width();
    let height = source.height();

    let gray = grayscale(source);
    let max_corners = (cfg.mesh_complexity as f32 * scale).max(1.0) as usize;
    let min_distance = CORNER_MIN_DISTANCE * scale;
    let mut candidates = good_features(
        &gray,
        width as usize,
        height as usize,
        &subject.mask,
        max_corners,
        CORNER_QUALITY_LEVEL,
        min_distance,
    );
    candidates.extend(subject.hull.iter().copied());

    let mut triangulation = Triangulation::new(width as f32, height as f32);
    let mut accepted: Vec<Point> = Vec::new();
    for point in candidates {
        let in_bounds =
            point.x >= 0.0 && point.x < width as f32 && point.y >= 0.0 && point.y < height as f32;
        if in_bounds && triangulation.insert(point) {
            accepted.push(point);
        }
    }

    let triangles = triangulation.triangles();
    debug!(
        points = accepted.len(),
        triangles = triangles.len(),
        "wireframe mesh built"
    );

    let mut overlay = canvas.clone();
    for triangle in &triangles {
        let [a, b, c] = *triangle;
        let centroid = Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
        if !point_in_polygon(centroid, &subject.hull) {
            continue;
        }

        if rng.chance(cfg.line_connect_chance) {
            draw_nerve_line(&mut overlay, a, b, cfg, rng, scale);
            if rng.chance(SECOND_EDGE_CHANCE) {
                draw_nerve_line(&mut overlay, b, c, cfg, rng, scale);
            }
        }

        if rng.chance(MARKER_CHANCE) {
            let size = 3.0 * scale;
            overlay.line(
                Point::new(a.x - size, a.y),
                Point::new(a.x + size, a.y),
                cfg.mesh_color,
                1.0,
            );
            overlay.line(
                Point::new(a.x, a.y - size),
                Point::new(a.x, a.y + size),
                cfg.mesh_color,
                1.0,
            );
        }
    }

    canvas.blend_weighted(&overlay, OVERLAY_WEIGHT, 1.0 - OVERLAY_WEIGHT);
    accepted
}

/// One nerve line: straight, or mutated through a displaced midpoint as a
/// quadratic curve or a two-segment elbow with an optional node dot.
pub fn draw_nerve_line(
    canvas: &mut Canvas,
    from: Point,
    to: Point,
    cfg: &GlitchConfig,
    rng: &mut Stream,
    scale: f32,
) {
    if rng.chance(cfg.nerve_mutation_chance) {
        let mid = Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
        let offset = (from.distance(&to) * rng.uniform(0.1, 0.35)) as i32;
        let displaced = Point::new(
            mid.x + rng.int_in(-offset, offset) as f32,
            mid.y + rng.int_in(-offset, offset) as f32,
        );

        if rng.chance(NERVE_CURVE_CHANCE) {
            canvas.quad_bezier(from, displaced, to, cfg.mesh_color, 1.0);
        } else {
            canvas.line(from, displaced, cfg.mesh_color, 1.0);
            canvas.line(displaced, to, cfg.mesh_color, 1.0);
            if rng.chance(NERVE_NODE_CHANCE) {
                canvas.fill_circle(displaced, (1.5 * scale).max(1.0), cfg.color_warning);
            }
        }
    } else {
        canvas.line(from, to, cfg.mesh_color, 1.0);
    }
}

/// Shi-Tomasi corner detection: minimum-eigenvalue response over a 3x3
/// structure tensor window, quality-thresholded against the strongest
/// response, non-maximum suppressed, then greedily accepted strongest-first
/// under the minimum-separation constraint.
fn good_features(
    gray: &[u8],
    width: usize,
    height: usize,
    mask: &[u8],
    max_corners: usize,
    quality_level: f32,
    min_distance: f32,
) -> Vec<Point> {
    if width < 3 || height < 3 || max_corners == 0 {
        return Vec::new();
    }

    let at = |x: usize, y: usize| f32::from(gray[y * width + x]);
    let mut gx = vec![0f32; gray.len()];
    let mut gy = vec![0f32; gray.len()];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            gx[y * width + x] = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x - 1, y)
                - at(x - 1, y + 1);
            gy[y * width + x] = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x, y - 1)
                - at(x + 1, y - 1);
        }
    }

    let mut response = vec![0f32; gray.len()];
    let mut max_response = 0f32;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if mask[y * width + x] == 0 {
                continue;
            }
            let mut sxx = 0f32;
            let mut syy = 0f32;
            let mut sxy = 0f32;
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    let index = (y as isize + dy) as usize * width + (x as isize + dx) as usize;
                    sxx += gx[index] * gx[index];
                    syy += gy[index] * gy[index];
                    sxy += gx[index] * gy[index];
                }
            }
            let trace = sxx + syy;
            let delta = ((sxx - syy) * (sxx - syy) + 4.0 * sxy * sxy).sqrt();
            let score = (trace - delta) / 2.0;
            response[y * width + x] = score;
            max_response = max_response.max(score);
        }
    }
    if max_response <= 0.0 {
        return Vec::new();
    }

    let threshold = quality_level * max_response;
    let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let score = response[y * width + x];
            if score < threshold {
                continue;
            }
            let mut local_max = true;
            'window: for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    let index = (y as isize + dy) as usize * width + (x as isize + dx) as usize;
                    if response[index] > score {
                        local_max = false;
                        break 'window;
                    }
                }
            }
            if local_max {
                candidates.push((score, x, y));
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.2.cmp(&b.2))
            .then(a.1.cmp(&b.1))
    });

    let min_distance_sq = min_distance * min_distance;
    let mut accepted: Vec<Point> = Vec::new();
    for (_, x, y) in candidates {
        if accepted.len() >= max_corners {
            break;
        }
        let point = Point::new(x as f32, y as f32);
        let too_close = accepted.iter().any(|other| {
            let dx = other.x - point.x;
            let dy = other.y - point.y;
            dx * dx + dy * dy < min_distance_sq
        });
        if !too_close {
            accepted.push(point);
        }
    }
    accepted
}
