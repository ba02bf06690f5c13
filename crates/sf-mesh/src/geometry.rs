//! Small fixed-size vector helpers and entity measures.
//!
//! Positions are stored as `[f64; 3]` regardless of the geometric dimension;
//! unused trailing coordinates are zero, so the 3-D formulas below are valid
//! for 1-D and 2-D meshes as well.

pub type Point = [f64; 3];

#[inline]
pub fn sub(a: Point, b: Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: Point, b: Point) -> Point {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: Point, s: f64) -> Point {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: Point, b: Point) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Point, b: Point) -> Point {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: Point) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    norm(sub(a, b))
}

/// Arithmetic mean of a set of points (zero for an empty set).
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return [0.0; 3];
    }
    let sum = points.iter().fold([0.0; 3], |acc, &p| add(acc, p));
    scale(sum, 1.0 / points.len() as f64)
}

/// Measure of a simplex or polygon given by its vertices.
///
/// - 1 point: 1 (a 0-dimensional facet carries unit "area")
/// - 2 points: segment length
/// - 3 points: triangle area
/// - 4 points, `solid = false`: planar quadrilateral area (cyclic order)
/// - 4 points, `solid = true`: tetrahedron volume
pub fn measure(points: &[Point], solid: bool) -> f64 {
    match points {
        [_] => 1.0,
        [a, b] => distance(*a, *b),
        [a, b, c] => 0.5 * norm(cross(sub(*b, *a), sub(*c, *a))),
        [a, b, c, d] if solid => {
            let v = dot(sub(*b, *a), cross(sub(*c, *a), sub(*d, *a)));
            v.abs() / 6.0
        }
        [a, b, c, d] => {
            0.5 * norm(cross(sub(*b, *a), sub(*c, *a))) + 0.5 * norm(cross(sub(*c, *a), sub(*d, *a)))
        }
        _ => 0.0,
    }
}
