use imageproc::geometry::{arc_length, convex_hull};
use imageproc::point::Point;
use std::f64::consts::PI;

use super::contours::{external_contours, region_bounds};
use crate::models::{Circle, Coin, LabelMap};

const EPS: f64 = 1e-7;

/// Perimeter, area and circularity of a closed contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeMetrics {
    pub perimeter: f64,
    pub area: f64,
    pub circularity: f64,
}

/// Area of the polygon through the contour points (shoelace formula)
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

/// `None` for zero-length contours, which cannot be scored
pub fn shape_metrics(points: &[Point<i32>]) -> Option<ShapeMetrics> {
    let perimeter = arc_length(points, true);
    if perimeter <= 0.0 {
        return None;
    }
    let area = polygon_area(points);
    Some(ShapeMetrics {
        perimeter,
        area,
        circularity: 4.0 * PI * area / (perimeter * perimeter),
    })
}

fn circle_from_diameter(a: (f64, f64), b: (f64, f64)) -> Circle {
    let x = (a.0 + b.0) / 2.0;
    let y = (a.1 + b.1) / 2.0;
    Circle {
        x,
        y,
        radius: ((a.0 - x).powi(2) + (a.1 - y).powi(2)).sqrt(),
    }
}

fn circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Circle {
    let (bx, by) = (b.0 - a.0, b.1 - a.1);
    let (cx, cy) = (c.0 - a.0, c.1 - a.1);
    let d = 2.0 * (bx * cy - by * cx);
    if d.abs() < EPS {
        // collinear: the two farthest points span the circle
        let candidates = [circle_from_diameter(a, b), circle_from_diameter(a, c), circle_from_diameter(b, c)];
        return candidates
            .into_iter()
            .fold(candidates[0], |best, cand| if cand.radius > best.radius { cand } else { best });
    }
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;
    Circle {
        x: a.0 + ux,
        y: a.1 + uy,
        radius: (ux * ux + uy * uy).sqrt(),
    }
}

fn contains(circle: &Circle, p: (f64, f64)) -> bool {
    let dx = p.0 - circle.x;
    let dy = p.1 - circle.y;
    (dx * dx + dy * dy).sqrt() <= circle.radius + EPS
}

/// Smallest circle containing every point.
///
/// Runs the incremental construction over the convex hull in hull order,
/// which keeps the result independent of any random shuffling.
pub fn min_enclosing_circle(points: &[Point<i32>]) -> Circle {
    let hull: Vec<Point<i32>> = convex_hull(points);
    let source = if hull.is_empty() { points } else { hull.as_slice() };
    let pts: Vec<(f64, f64)> = source.iter().map(|p| (p.x as f64, p.y as f64)).collect();

    let Some(&first) = pts.first() else {
        return Circle {
            x: 0.0,
            y: 0.0,
            radius: 0.0,
        };
    };

    let mut circle = Circle {
        x: first.0,
        y: first.1,
        radius: 0.0,
    };
    for i in 1..pts.len() {
        if contains(&circle, pts[i]) {
            continue;
        }
        circle = Circle {
            x: pts[i].0,
            y: pts[i].1,
            radius: 0.0,
        };
        for j in 0..i {
            if contains(&circle, pts[j]) {
                continue;
            }
            circle = circle_from_diameter(pts[i], pts[j]);
            for k in 0..j {
                if !contains(&circle, pts[k]) {
                    circle = circumcircle(pts[i], pts[j], pts[k]);
                }
            }
        }
    }
    circle
}

/// Score every region of the final label map and keep the round ones.
///
/// Labels are visited in ascending order and each external contour is
/// judged on its own, so display indices follow label discovery order.
pub fn classify_regions(labels: &LabelMap, circularity_threshold: f64) -> Vec<Coin> {
    let mut coins = Vec::new();

    for region in region_bounds(labels) {
        for contour in external_contours(labels, &region) {
            let Some(metrics) = shape_metrics(&contour) else {
                log::trace!("label {}: degenerate contour skipped", region.label);
                continue;
            };

            log::trace!(
                "label {}: perimeter={:.1} area={:.1} circularity={:.3}",
                region.label,
                metrics.perimeter,
                metrics.area,
                metrics.circularity
            );

            if metrics.circularity > circularity_threshold {
                coins.push(Coin {
                    index: coins.len() + 1,
                    label: region.label,
                    circle: min_enclosing_circle(&contour),
                    circularity: metrics.circularity,
                    area: metrics.area,
                    perimeter: metrics.perimeter,
                });
            }
        }
    }

    coins
}
