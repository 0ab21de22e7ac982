//! Drawing surface contract.
//!
//! Mirrors the cairo model the map scripts draw with: a current path built
//! with move/line/curve/arc, consumed by `stroke` or `fill`, and a graphics
//! state (transform, source color, line style) kept on a save/restore stack.
//! Coordinates are canvas points; the surface owns the mapping to device
//! space.

use std::ops::{Deref, DerefMut};

use glam::{DAffine2, DVec2};

use crate::types::{Angle, CanvasOffset, CanvasPoint, Color, Length};

/// Line cap style for strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// One element of a path, in whatever space the owner documents
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathEl {
    MoveTo(DVec2),
    LineTo(DVec2),
    CurveTo(DVec2, DVec2, DVec2),
    Arc {
        center: DVec2,
        radius: f64,
        /// Radians, clockwise on a y-down canvas
        start: f64,
        end: f64,
    },
    Close,
}

impl PathEl {
    /// Apply an affine transform. Arcs keep their radius, so only rigid
    /// transforms (translate/rotate) are exact for them.
    pub fn transformed(self, m: &DAffine2) -> PathEl {
        match self {
            PathEl::MoveTo(p) => PathEl::MoveTo(m.transform_point2(p)),
            PathEl::LineTo(p) => PathEl::LineTo(m.transform_point2(p)),
            PathEl::CurveTo(a, b, c) => PathEl::CurveTo(
                m.transform_point2(a),
                m.transform_point2(b),
                m.transform_point2(c),
            ),
            PathEl::Arc { center, radius, start, end } => {
                let rotation = m.matrix2.x_axis.y.atan2(m.matrix2.x_axis.x);
                PathEl::Arc {
                    center: m.transform_point2(center),
                    radius,
                    start: start + rotation,
                    end: end + rotation,
                }
            }
            PathEl::Close => PathEl::Close,
        }
    }
}

/// The drawing surface the annotation and scale bar code paints onto.
///
/// `stroke` and `fill` consume the current path. Every state mutation done
/// by a caller for a local purpose must sit inside a [`SurfaceGuard`].
pub trait Surface {
    fn move_to(&mut self, p: CanvasPoint);
    fn line_to(&mut self, p: CanvasPoint);
    fn curve_to(&mut self, c1: CanvasPoint, c2: CanvasPoint, end: CanvasPoint);
    fn close_path(&mut self);
    /// Circular arc from `start` to `end`, clockwise on a y-down canvas
    fn arc(&mut self, center: CanvasPoint, radius: Length, start: Angle, end: Angle);

    fn set_source(&mut self, color: Color);
    fn set_line_width(&mut self, width: Length);
    fn set_line_cap(&mut self, cap: LineCap);
    /// Empty `dashes` means a solid line
    fn set_dash(&mut self, dashes: &[Length], offset: Length);

    fn stroke(&mut self);
    fn fill(&mut self);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, offset: CanvasOffset);
    fn rotate(&mut self, angle: Angle);

    /// Full circle as a closed sub-path
    fn circle(&mut self, center: CanvasPoint, radius: Length) {
        self.arc(center, radius, Angle::ZERO, Angle(360.0));
        self.close_path();
    }

    /// Append path elements given in the current user space
    fn append_path(&mut self, elements: &[PathEl]) {
        for el in elements {
            match *el {
                PathEl::MoveTo(p) => self.move_to(CanvasPoint::from_dvec2(p)),
                PathEl::LineTo(p) => self.line_to(CanvasPoint::from_dvec2(p)),
                PathEl::CurveTo(a, b, c) => self.curve_to(
                    CanvasPoint::from_dvec2(a),
                    CanvasPoint::from_dvec2(b),
                    CanvasPoint::from_dvec2(c),
                ),
                PathEl::Arc { center, radius, start, end } => self.arc(
                    CanvasPoint::from_dvec2(center),
                    Length::pt(radius),
                    Angle(start.to_degrees()),
                    Angle(end.to_degrees()),
                ),
                PathEl::Close => self.close_path(),
            }
        }
    }
}

/// Scoped save/restore. The surface state is restored when the guard drops,
/// on every exit path.
pub struct SurfaceGuard<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: Surface + ?Sized> SurfaceGuard<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        surface.save();
        Self { surface }
    }
}

impl<S: Surface + ?Sized> Deref for SurfaceGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for SurfaceGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: Surface + ?Sized> Drop for SurfaceGuard<'_, S> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}

/// Graphics state shared by the surface implementations
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GraphicsState {
    pub transform: DAffine2,
    pub source: Color,
    pub line_width: Length,
    pub line_cap: LineCap,
    pub dash: Vec<Length>,
    pub dash_offset: Length,
}

impl GraphicsState {
    pub fn with_transform(transform: DAffine2) -> Self {
        Self {
            transform,
            source: Color::BLACK,
            // cairo's default line width is 2 user units
            line_width: Length::pt(2.0),
            line_cap: LineCap::Butt,
            dash: Vec::new(),
            dash_offset: Length::ZERO,
        }
    }

    pub fn translate(&mut self, offset: CanvasOffset) {
        self.transform = self.transform * DAffine2::from_translation(glam::dvec2(offset.dx.raw(), offset.dy.raw()));
    }

    pub fn rotate(&mut self, angle: Angle) {
        self.transform = self.transform * DAffine2::from_angle(angle.radians());
    }
}

/// Split an arc into cubic Bezier segments of at most a quarter turn.
///
/// Returns `(start_point, segments)` where each segment is `(c1, c2, end)`.
pub fn arc_to_cubics(center: DVec2, radius: f64, start: f64, end: f64) -> (DVec2, Vec<(DVec2, DVec2, DVec2)>) {
    let point_at = |a: f64| center + radius * DVec2::new(a.cos(), a.sin());
    let sweep = end - start;
    let pieces = (sweep.abs() / std::f64::consts::FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / pieces as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut segments = Vec::with_capacity(pieces);
    let mut a0 = start;
    for _ in 0..pieces {
        let a1 = a0 + step;
        let p0 = point_at(a0);
        let p1 = point_at(a1);
        let t0 = DVec2::new(-a0.sin(), a0.cos());
        let t1 = DVec2::new(-a1.sin(), a1.cos());
        segments.push((p0 + t0 * k * radius, p1 - t1 * k * radius, p1));
        a0 = a1;
    }
    (point_at(start), segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn quarter_arc_ends_on_circle() {
        let (start, segs) = arc_to_cubics(DVec2::ZERO, 10.0, 0.0, std::f64::consts::FRAC_PI_2);
        assert!((start - dvec2(10.0, 0.0)).length() < 1e-9);
        assert_eq!(segs.len(), 1);
        assert!((segs[0].2 - dvec2(0.0, 10.0)).length() < 1e-9);
    }

    #[test]
    fn full_circle_uses_four_segments() {
        let (_, segs) = arc_to_cubics(dvec2(5.0, 5.0), 3.0, 0.0, std::f64::consts::TAU);
        assert_eq!(segs.len(), 4);
        // Cubic midpoint stays within 0.1% of the radius
        for (i, (c1, c2, p1)) in segs.iter().enumerate() {
            let p0 = if i == 0 { dvec2(8.0, 5.0) } else { segs[i - 1].2 };
            let mid = 0.125 * p0 + 0.375 * *c1 + 0.375 * *c2 + 0.125 * *p1;
            let r = (mid - dvec2(5.0, 5.0)).length();
            assert!((r - 3.0).abs() < 3e-3, "segment {i} midpoint radius {r}");
        }
    }

    #[test]
    fn path_el_transform_rotates_arc_angles() {
        let m = DAffine2::from_angle(std::f64::consts::FRAC_PI_2);
        let arc = PathEl::Arc { center: dvec2(1.0, 0.0), radius: 2.0, start: 0.0, end: 1.0 };
        match arc.transformed(&m) {
            PathEl::Arc { center, radius, start, end } => {
                assert!((center - dvec2(0.0, 1.0)).length() < 1e-12);
                assert_eq!(radius, 2.0);
                assert!((start - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
                assert!((end - 1.0 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn graphics_state_translate_composes_after_existing_transform() {
        let mut state = GraphicsState::with_transform(DAffine2::from_scale(dvec2(2.0, 2.0)));
        state.translate(CanvasOffset::pt(3.0, 4.0));
        let p = state.transform.transform_point2(DVec2::ZERO);
        assert_eq!(p, dvec2(6.0, 8.0));
    }
}
