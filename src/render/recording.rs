//! A surface that records what would be painted, in device space.
//!
//! Used to inspect layouts without a raster backend: each `stroke` or `fill`
//! becomes one [`DrawOp`] carrying the transformed path and the graphics
//! state it was painted with.

use std::fmt;

use glam::{DAffine2, DVec2};

use super::surface::{GraphicsState, LineCap, PathEl, Surface};
use crate::types::{Angle, BoundingBox, CanvasOffset, CanvasPoint, Color, Length};

/// How a recorded path was painted
#[derive(Debug, Clone, PartialEq)]
pub enum PaintKind {
    Fill,
    Stroke {
        width: Length,
        cap: LineCap,
        dash: Vec<Length>,
    },
}

/// One painted path
#[derive(Debug, Clone, PartialEq)]
pub struct DrawOp {
    pub kind: PaintKind,
    pub color: Color,
    /// Path in device space (all transforms applied)
    pub path: Vec<PathEl>,
}

impl DrawOp {
    pub fn is_fill(&self) -> bool {
        matches!(self.kind, PaintKind::Fill)
    }

    pub fn is_stroke(&self) -> bool {
        matches!(self.kind, PaintKind::Stroke { .. })
    }

    /// Bounds of every point, control point and arc circle in the path
    pub fn bounds(&self) -> BoundingBox {
        let mut bb = BoundingBox::new();
        let mut add = |p: DVec2| bb.expand_point(CanvasPoint::from_dvec2(p));
        for el in &self.path {
            match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => add(p),
                PathEl::CurveTo(a, b, c) => {
                    add(a);
                    add(b);
                    add(c);
                }
                PathEl::Arc { center, radius, .. } => {
                    add(center - DVec2::splat(radius));
                    add(center + DVec2::splat(radius));
                }
                PathEl::Close => {}
            }
        }
        bb
    }

    /// Last explicit point of the path, if any
    pub fn end_point(&self) -> Option<DVec2> {
        self.path.iter().rev().find_map(|el| match *el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::CurveTo(_, _, p) => Some(p),
            _ => None,
        })
    }
}

impl fmt::Display for DrawOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PaintKind::Fill => write!(f, "fill {}", self.color)?,
            PaintKind::Stroke { width, cap, dash } => {
                write!(f, "stroke {} w={:.2} cap={:?}", self.color, width.raw(), cap)?;
                if !dash.is_empty() {
                    write!(f, " dash={:?}", dash.iter().map(|d| d.raw()).collect::<Vec<_>>())?;
                }
            }
        }
        for el in &self.path {
            match el {
                PathEl::MoveTo(p) => write!(f, " M{:.2},{:.2}", p.x, p.y)?,
                PathEl::LineTo(p) => write!(f, " L{:.2},{:.2}", p.x, p.y)?,
                PathEl::CurveTo(a, b, c) => write!(
                    f,
                    " C{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
                    a.x, a.y, b.x, b.y, c.x, c.y
                )?,
                PathEl::Arc { center, radius, .. } => {
                    write!(f, " A{:.2},{:.2} r={:.2}", center.x, center.y, radius)?
                }
                PathEl::Close => write!(f, " Z")?,
            }
        }
        Ok(())
    }
}

/// Surface implementation that records draw operations
#[derive(Debug)]
pub struct RecordingSurface {
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    path: Vec<PathEl>,
    ops: Vec<DrawOp>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            state: GraphicsState::with_transform(DAffine2::IDENTITY),
            stack: Vec::new(),
            path: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    /// Number of saves not yet restored
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Current user-to-device transform
    pub fn transform(&self) -> DAffine2 {
        self.state.transform
    }

    pub fn source(&self) -> Color {
        self.state.source
    }

    /// One line per op, for snapshot tests
    pub fn trace(&self) -> String {
        self.ops.iter().map(|op| op.to_string()).collect::<Vec<_>>().join("\n")
    }

    fn push_el(&mut self, el: PathEl) {
        self.path.push(el.transformed(&self.state.transform));
    }

    fn take_path(&mut self, kind: PaintKind) {
        let path = std::mem::take(&mut self.path);
        if path.is_empty() {
            return;
        }
        self.ops.push(DrawOp { kind, color: self.state.source, path });
    }
}

impl Surface for RecordingSurface {
    fn move_to(&mut self, p: CanvasPoint) {
        self.push_el(PathEl::MoveTo(p.to_dvec2()));
    }

    fn line_to(&mut self, p: CanvasPoint) {
        self.push_el(PathEl::LineTo(p.to_dvec2()));
    }

    fn curve_to(&mut self, c1: CanvasPoint, c2: CanvasPoint, end: CanvasPoint) {
        self.push_el(PathEl::CurveTo(c1.to_dvec2(), c2.to_dvec2(), end.to_dvec2()));
    }

    fn close_path(&mut self) {
        self.path.push(PathEl::Close);
    }

    fn arc(&mut self, center: CanvasPoint, radius: Length, start: Angle, end: Angle) {
        self.push_el(PathEl::Arc {
            center: center.to_dvec2(),
            radius: radius.raw(),
            start: start.radians(),
            end: end.radians(),
        });
    }

    fn set_source(&mut self, color: Color) {
        self.state.source = color;
    }

    fn set_line_width(&mut self, width: Length) {
        self.state.line_width = width;
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    fn set_dash(&mut self, dashes: &[Length], offset: Length) {
        self.state.dash = dashes.to_vec();
        self.state.dash_offset = offset;
    }

    fn stroke(&mut self) {
        let kind = PaintKind::Stroke {
            width: self.state.line_width,
            cap: self.state.line_cap,
            dash: self.state.dash.clone(),
        };
        self.take_path(kind);
    }

    fn fill(&mut self) {
        self.take_path(PaintKind::Fill);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        // Unbalanced restores are ignored, like cairo's error-state no-op
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, offset: CanvasOffset) {
        self.state.translate(offset);
    }

    fn rotate(&mut self, angle: Angle) {
        self.state.rotate(angle);
    }
}
