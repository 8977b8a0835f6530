//! Plane geometry helpers for drawing diagrams.
//!
//! Angles are in degrees, measured counter-clockwise from the positive x axis.

/// A point in figure coordinates.
pub type Point = (f64, f64);

/// Midpoint of two points.
pub fn midpoint(a: Point, b: Point) -> Point {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Direction from `start` to `end`, normalised to `[0, 360)`.
pub fn angle_between(start: Point, end: Point) -> f64 {
    let degrees = (end.1 - start.1).atan2(end.0 - start.0).to_degrees();
    if degrees < 0.0 { degrees + 360.0 } else { degrees }
}

/// End point of a segment of `length` leaving `start` at `angle_deg`.
pub fn arrow_endpoint(start: Point, angle_deg: f64, length: f64) -> Point {
    let angle = angle_deg.to_radians().rem_euclid(std::f64::consts::TAU);
    (start.0 + length * angle.cos(), start.1 + length * angle.sin())
}

/// Intersection of the line through `p1` at `a1_deg` and the line through `p2`
/// at `a2_deg`. Returns `None` when the lines are parallel.
pub fn intersection(p1: Point, a1_deg: f64, p2: Point, a2_deg: f64) -> Option<Point> {
    let (d1x, d1y) = (a1_deg.to_radians().cos(), a1_deg.to_radians().sin());
    let (d2x, d2y) = (a2_deg.to_radians().cos(), a2_deg.to_radians().sin());

    let cross = d1x * d2y - d1y * d2x;
    if cross.abs() < 1e-12 {
        return None;
    }

    // p1 + t * d1 == p2 + s * d2
    let t = ((p2.0 - p1.0) * d2y - (p2.1 - p1.1) * d2x) / cross;
    Some((p1.0 + t * d1x, p1.1 + t * d1y))
}

/// `count` evenly spaced points along a circular arc, both ends included.
pub fn arc_points(
    center: Point,
    radius: f64,
    start_deg: f64,
    end_deg: f64,
    count: usize,
) -> Vec<Point> {
    match count {
        0 => Vec::new(),
        1 => vec![arrow_endpoint(center, start_deg, radius)],
        _ => {
            let step = (end_deg - start_deg) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    let angle = (start_deg + step * i as f64).to_radians();
                    (center.0 + radius * angle.cos(), center.1 + radius * angle.sin())
                })
                .collect()
        }
    }
}

/// `count` evenly spaced points from `start` to `end`, both ends included.
pub fn spaced_points(start: Point, end: Point, count: usize) -> Vec<Point> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let steps = (count - 1) as f64;
            (0..count)
                .map(|i| {
                    let t = i as f64 / steps;
                    (start.0 + t * (end.0 - start.0), start.1 + t * (end.1 - start.1))
                })
                .collect()
        }
    }
}

/// Closed outline of a rectangle centred on `center` with rounded corners.
///
/// Each corner is approximated by `per_corner` points; the radius is clamped to
/// half the shorter side. The first point is repeated at the end.
pub fn rounded_rectangle_points(
    center: Point,
    width: f64,
    height: f64,
    radius: f64,
    per_corner: usize,
) -> Vec<Point> {
    let r = radius.clamp(0.0, width.abs().min(height.abs()) / 2.0);
    let (half_w, half_h) = (width.abs() / 2.0 - r, height.abs() / 2.0 - r);

    // Counter-clockwise from the bottom-left corner
    let corners = [
        ((center.0 - half_w, center.1 - half_h), 180.0),
        ((center.0 + half_w, center.1 - half_h), 270.0),
        ((center.0 + half_w, center.1 + half_h), 0.0),
        ((center.0 - half_w, center.1 + half_h), 90.0),
    ];

    let mut outline: Vec<Point> = corners
        .iter()
        .flat_map(|&(corner, start)| arc_points(corner, r, start, start + 90.0, per_corner.max(1)))
        .collect();
    if let Some(&first) = outline.first() {
        outline.push(first);
    }
    outline
}
