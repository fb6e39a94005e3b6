//! Salient-subject detection.
//!
//! grayscale -> Gaussian blur -> gradient edges -> dilation -> connected
//! components -> convex hull of the 3 largest -> filled mask. The result
//! feeds the wireframe stage; a frame with no detectable structure yields
//! `None` and downstream stages proceed with an empty point set.

use tracing::debug;

use crate::canvas::Canvas;
use crate::geometry::{convex_hull, fill_polygon_mask, Point};

const EDGE_HIGH_THRESHOLD: f32 = 120.0;
const DILATE_RADIUS: usize = 4;
const DILATE_ITERATIONS: usize = 3;
const KEEP_LARGEST: usize = 3;

pub struct Subject {
    /// Convex polygon enclosing the detected contours, CCW.
    pub hull: Vec<Point>,
    /// 0/255 single-channel mask, same dimensions as the source.
    pub mask: Vec<u8>,
}

/// BT.709 luma of an opaque canvas.
pub fn grayscale(canvas: &Canvas) -> Vec<u8> {
    canvas
        .data()
        .chunks_exact(4)
        .map(|pixel| {
            ((u32::from(pixel[0]) * 2126 + u32::from(pixel[1]) * 7152 + u32::from(pixel[2]) * 722)
                / 10_000) as u8
        })
        .collect()
}

pub fn detect_subject(source: &Canvas) -> Option<Subject> {
    let width = source.width() as usize;
    let height = source.height() as usize;

    let gray = grayscale(source);
    let blurred = gaussian5(&gray, width, height);
    let mut edges = gradient_edges(&blurred, width, height);
    for _ in 0..DILATE_ITERATIONS {
        edges = dilate(&edges, width, height, DILATE_RADIUS);
    }

    let contour_points = largest_component_extremes(&edges, width, height);
    if contour_points.is_empty() {
        debug!("no contours found, subject detection skipped");
        return None;
    }

    let hull = convex_hull(&contour_points);
    if hull.len() < 3 {
        debug!("degenerate hull, subject detection skipped");
        return None;
    }

    let mask = fill_polygon_mask(&hull, width as u32, height as u32);
    debug!(hull_points = hull.len(), "subject detected");
    Some(Subject { hull, mask })
}

/// Separable 5x5 Gaussian, kernel [1, 4, 6, 4, 1] / 16.
fn gaussian5(input: &[u8], width: usize, height: usize) -> Vec<u8> {
    const KERNEL: [u32; 5] = [1, 4, 6, 4, 1];
    let clamp_x = |x: isize| x.clamp(0, width as isize - 1) as usize;
    let clamp_y = |y: isize| y.clamp(0, height as isize - 1) as usize;

    let mut horizontal = vec![0u8; input.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u32;
            for (offset, weight) in KERNEL.iter().enumerate() {
                let sx = clamp_x(x as isize + offset as isize - 2);
                sum += u32::from(input[y * width + sx]) * weight;
            }
            horizontal[y * width + x] = (sum / 16) as u8;
        }
    }

    let mut output = vec![0u8; input.len()];
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0u32;
            for (offset, weight) in KERNEL.iter().enumerate() {
                let sy = clamp_y(y as isize + offset as isize - 2);
                sum += u32::from(horizontal[sy * width + x]) * weight;
            }
            output[y * width + x] = (sum / 16) as u8;
        }
    }
    output
}

/// Sobel gradient magnitude, thresholded to a binary edge map.
fn gradient_edges(input: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut edges = vec![0u8; input.len()];
    if width < 3 || height < 3 {
        return edges;
    }
    let at = |x: usize, y: usize| f32::from(input[y * width + x]);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x - 1, y)
                - at(x - 1, y + 1);
            let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x, y - 1)
                - at(x + 1, y - 1);
            if (gx * gx + gy * gy).sqrt() >= EDGE_HIGH_THRESHOLD {
                edges[y * width + x] = 255;
            }
        }
    }
    edges
}

/// Binary dilation by a square structuring element, as two 1D max passes.
fn dilate(input: &[u8], width: usize, height: usize, radius: usize) -> Vec<u8> {
    let mut horizontal = vec![0u8; input.len()];
    for y in 0..height {
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            if input[y * width + lo..=y * width + hi].iter().any(|&v| v > 0) {
                horizontal[y * width + x] = 255;
            }
        }
    }

    let mut output = vec![0u8; input.len()];
    for x in 0..width {
        for y in 0..height {
            let lo = y.saturating_sub(radius);
            let hi = (y + radius).min(height - 1);
            if (lo..=hi).any(|sy| horizontal[sy * width + x] > 0) {
                output[y * width + x] = 255;
            }
        }
    }
    output
}

/// Label 8-connected components of the edge map, keep the largest few, and
/// return their per-row extreme points (enough to span the convex hull).
fn largest_component_extremes(edges: &[u8], width: usize, height: usize) -> Vec<Point> {
    let mut labels = vec![0u32; edges.len()];
    let mut sizes: Vec<usize> = vec![0]; // index 0 = unlabeled
    let mut next_label = 1u32;

    for start in 0..edges.len() {
        if edges[start] == 0 || labels[start] != 0 {
            continue;
        }
        let label = next_label;
        next_label += 1;
        let mut size = 0usize;
        let mut stack = vec![start];
        labels[start] = label;
        while let Some(index) = stack.pop() {
            size += 1;
            let x = index % width;
            let y = index / width;
            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue;
                    }
                    let neighbor = ny as usize * width + nx as usize;
                    if edges[neighbor] != 0 && labels[neighbor] == 0 {
                        labels[neighbor] = label;
                        stack.push(neighbor);
                    }
                }
            }
        }
        sizes.push(size);
    }

    if next_label == 1 {
        return Vec::new();
    }

    let mut order: Vec<u32> = (1..next_label).collect();
    order.sort_by_key(|&label| std::cmp::Reverse(sizes[label as usize]));
    order.truncate(KEEP_LARGEST);

    let mut points = Vec::new();
    for y in 0..height {
        for &label in &order {
            let mut min_x: Option<usize> = None;
            let mut max_x: Option<usize> = None;
            for x in 0..width {
                if labels[y * width + x] == label {
                    min_x.get_or_insert(x);
                    max_x = Some(x);
                }
            }
            if let (Some(min_x), Some(max_x)) = (min_x, max_x) {
                points.push(Point::new(min_x as f32, y as f32));
                if max_x != min_x {
                    points.push(Point::new(max_x as f32, y as f32));
                }
            }
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    #[test]
    fn flat_image_has_no_subject() {
        let canvas = Canvas::solid(64, 64, Rgba::new(128, 128, 128, 255)).expect("canvas");
        assert!(detect_subject(&canvas).is_none());
    }

    #[test]
    fn bright_square_on_dark_ground_is_detected() {
        let mut canvas = Canvas::solid(96, 96, Rgba::new(10, 10, 10, 255)).expect("canvas");
        let data = canvas.data_mut();
        for y in 30..66 {
            for x in 30..66 {
                let offset = (y * 96 + x) * 4;
                data[offset] = 240;
                data[offset + 1] = 240;
                data[offset + 2] = 240;
            }
        }
        let subject = detect_subject(&canvas).expect("square should be found");
        assert!(subject.hull.len() >= 3);
        let center = (48 * 96 + 48) as usize;
        assert_eq!(subject.mask[center], 255, "center should be inside the mask");
        assert_eq!(subject.mask[0], 0, "far corner should be outside the mask");
    }

    #[test]
    fn grayscale_of_white_is_white() {
        let canvas = Canvas::solid(4, 4, Rgba::new(255, 255, 255, 255)).expect("canvas");
        assert!(grayscale(&canvas).iter().all(|&v| v == 255));
    }
}
