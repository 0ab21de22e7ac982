//! Polygon helpers: circles, pills, insets and slices built on `geo`.
//!
//! Coordinates are raw points. Shapes are `MultiPolygon`s throughout since
//! boolean operations may split a shape into pieces.

use std::f64::consts::TAU;

use geo::orient::{Direction, Orient};
use geo::{BooleanOps, BoundingRect, Buffer, Coord, LineString, MultiPolygon, Polygon, Rect, coord};

use super::surface::Surface;
use crate::types::{BoundingBox, CanvasPoint};

/// Regular polygon approximating a circle, first vertex at angle zero
pub fn circle_polygon(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(3);
    let ring: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let t = TAU * i as f64 / n as f64;
            coord! { x: center.x + radius * t.cos(), y: center.y + radius * t.sin() }
        })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

pub fn rect_polygon(min: Coord<f64>, max: Coord<f64>) -> Polygon<f64> {
    Rect::new(min, max).to_polygon()
}

/// Rectangle with semicircular end caps spanning `[0, length] x [-radius, radius]`,
/// built as the union of two circles and the rectangle joining their centers.
pub fn pill(length: f64, radius: f64, segments: usize) -> MultiPolygon<f64> {
    let start = circle_polygon(coord! { x: radius, y: 0.0 }, radius, segments);
    let end = circle_polygon(coord! { x: length - radius, y: 0.0 }, radius, segments);
    let body = rect_polygon(coord! { x: radius, y: -radius }, coord! { x: length - radius, y: radius });

    MultiPolygon::new(vec![start])
        .union(&MultiPolygon::new(vec![body]))
        .union(&MultiPolygon::new(vec![end]))
}

/// Erode a shape by `distance` (a negative buffer)
pub fn inset(shape: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    shape.buffer(-distance)
}

/// Full-height slice of segment `index` out of `count` equal divisions of `length`
pub fn segment_slice(index: usize, count: usize, length: f64, half_height: f64) -> MultiPolygon<f64> {
    let step = length / count as f64;
    let x0 = index as f64 * step;
    let x1 = (index + 1) as f64 * step;
    MultiPolygon::new(vec![rect_polygon(
        coord! { x: x0, y: -half_height },
        coord! { x: x1, y: half_height },
    )])
}

/// Bounds of a shape; empty for an empty shape
pub fn polygon_bounds(shape: &MultiPolygon<f64>) -> BoundingBox {
    match shape.bounding_rect() {
        Some(rect) => BoundingBox::from_corners(
            CanvasPoint::pt(rect.min().x, rect.min().y),
            CanvasPoint::pt(rect.max().x, rect.max().y),
        ),
        None => BoundingBox::new(),
    }
}

/// Append every ring as a closed sub-path. Exteriors and holes get opposite
/// windings so a nonzero fill leaves holes empty.
pub fn append_polygons(surface: &mut dyn Surface, shape: &MultiPolygon<f64>) {
    let oriented = shape.orient(Direction::Default);
    for polygon in oriented.0.iter() {
        append_ring(surface, polygon.exterior());
        for hole in polygon.interiors() {
            append_ring(surface, hole);
        }
    }
}

fn append_ring(surface: &mut dyn Surface, ring: &LineString<f64>) {
    let mut coords = ring.coords();
    let Some(first) = coords.next() else {
        return;
    };
    surface.move_to(CanvasPoint::pt(first.x, first.y));
    for c in coords {
        surface.line_to(CanvasPoint::pt(c.x, c.y));
    }
    surface.close_path();
}
