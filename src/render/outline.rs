//! Device-independent vector outlines.
//!
//! Glyph runs and icons are both flattened from usvg trees into an
//! [`Outline`]: a list of filled or stroked paths in a local coordinate
//! space, painted at the surface's current origin.

use glam::{DVec2, dvec2};
use tiny_skia::PathSegment;

use super::surface::{PathEl, Surface, SurfaceGuard};
use crate::log;
use crate::types::{BoundingBox, CanvasOffset, CanvasPoint, Color, Length};

/// How a layer is painted. `None` colors use the surface's current source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerPaint {
    Fill(Option<Color>),
    Stroke { color: Option<Color>, width: Length },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub path: Vec<PathEl>,
    pub paint: LayerPaint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub layers: Vec<Layer>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|l| l.path.is_empty())
    }

    pub fn push(&mut self, path: Vec<PathEl>, paint: LayerPaint) {
        if !path.is_empty() {
            self.layers.push(Layer { path, paint });
        }
    }

    pub fn extend(&mut self, other: Outline) {
        self.layers.extend(other.layers);
    }

    /// Flatten every visible path under a usvg group, in document order
    pub fn from_usvg(group: &usvg::Group) -> Self {
        let mut outline = Outline::new();
        flatten_group(group, &mut outline);
        outline
    }

    /// Drop own colors so the outline paints with the current source
    pub fn inked(mut self) -> Self {
        for layer in &mut self.layers {
            layer.paint = match layer.paint {
                LayerPaint::Fill(_) => LayerPaint::Fill(None),
                LayerPaint::Stroke { width, .. } => LayerPaint::Stroke { color: None, width },
            };
        }
        self
    }

    pub fn translated(mut self, offset: CanvasOffset) -> Self {
        let d = dvec2(offset.dx.raw(), offset.dy.raw());
        for layer in &mut self.layers {
            for el in &mut layer.path {
                *el = match *el {
                    PathEl::MoveTo(p) => PathEl::MoveTo(p + d),
                    PathEl::LineTo(p) => PathEl::LineTo(p + d),
                    PathEl::CurveTo(a, b, c) => PathEl::CurveTo(a + d, b + d, c + d),
                    PathEl::Arc { center, radius, start, end } => {
                        PathEl::Arc { center: center + d, radius, start, end }
                    }
                    PathEl::Close => PathEl::Close,
                };
            }
        }
        self
    }

    /// Control-point bounds (a superset of the exact curve bounds)
    pub fn bounds(&self) -> BoundingBox {
        let mut bb = BoundingBox::new();
        for el in self.layers.iter().flat_map(|l| l.path.iter()) {
            match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => bb.expand_point(CanvasPoint::from_dvec2(p)),
                PathEl::CurveTo(a, b, c) => {
                    for p in [a, b, c] {
                        bb.expand_point(CanvasPoint::from_dvec2(p));
                    }
                }
                PathEl::Arc { center, radius, .. } => {
                    bb.expand_point(CanvasPoint::from_dvec2(center - DVec2::splat(radius)));
                    bb.expand_point(CanvasPoint::from_dvec2(center + DVec2::splat(radius)));
                }
                PathEl::Close => {}
            }
        }
        bb
    }

    /// Paint every layer at the surface's current origin
    pub fn paint(&self, surface: &mut dyn Surface) {
        for layer in &self.layers {
            let mut s = SurfaceGuard::new(&mut *surface);
            s.append_path(&layer.path);
            match layer.paint {
                LayerPaint::Fill(color) => {
                    if let Some(color) = color {
                        s.set_source(color);
                    }
                    s.fill();
                }
                LayerPaint::Stroke { color, width } => {
                    if let Some(color) = color {
                        s.set_source(color);
                    }
                    s.set_line_width(width);
                    s.stroke();
                }
            }
        }
    }
}

fn flatten_group(group: &usvg::Group, out: &mut Outline) {
    for node in group.children() {
        match node {
            usvg::Node::Group(g) => flatten_group(g, out),
            usvg::Node::Path(p) => flatten_path(p, out),
            usvg::Node::Text(t) => flatten_group(t.flattened(), out),
            usvg::Node::Image(_) => {
                log::warn!("skipping raster image in vector outline");
            }
        }
    }
}

fn flatten_path(path: &usvg::Path, out: &mut Outline) {
    if !path.is_visible() {
        return;
    }
    let ts = path.abs_transform();
    let map = |p: tiny_skia::Point| {
        dvec2(
            (ts.sx * p.x + ts.kx * p.y + ts.tx) as f64,
            (ts.ky * p.x + ts.sy * p.y + ts.ty) as f64,
        )
    };

    let mut els = Vec::new();
    let mut current = DVec2::ZERO;
    let mut start = DVec2::ZERO;
    for seg in path.data().segments() {
        match seg {
            PathSegment::MoveTo(p) => {
                current = map(p);
                start = current;
                els.push(PathEl::MoveTo(current));
            }
            PathSegment::LineTo(p) => {
                current = map(p);
                els.push(PathEl::LineTo(current));
            }
            PathSegment::QuadTo(q, p) => {
                let q = map(q);
                let p = map(p);
                els.push(PathEl::CurveTo(
                    current + (q - current) * (2.0 / 3.0),
                    p + (q - p) * (2.0 / 3.0),
                    p,
                ));
                current = p;
            }
            PathSegment::CubicTo(a, b, p) => {
                current = map(p);
                els.push(PathEl::CurveTo(map(a), map(b), current));
            }
            PathSegment::Close => {
                current = start;
                els.push(PathEl::Close);
            }
        }
    }

    if let Some(fill) = path.fill() {
        match paint_color(fill.paint(), fill.opacity().get()) {
            Some(color) => out.push(els.clone(), LayerPaint::Fill(Some(color))),
            None => {
                log::warn!(id = path.id(), "skipping non-solid fill");
            }
        }
    }
    if let Some(stroke) = path.stroke() {
        let scale = ((ts.sx * ts.sy - ts.kx * ts.ky).abs() as f64).sqrt();
        match paint_color(stroke.paint(), stroke.opacity().get()) {
            Some(color) => out.push(
                els,
                LayerPaint::Stroke { color: Some(color), width: Length::pt(stroke.width().get() as f64 * scale) },
            ),
            None => {
                log::warn!(id = path.id(), "skipping non-solid stroke");
            }
        }
    }
}

fn paint_color(paint: &usvg::Paint, opacity: f32) -> Option<Color> {
    match paint {
        usvg::Paint::Color(c) => Some(Color::rgb8(c.red, c.green, c.blue).with_alpha(opacity as f64)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingSurface;

    fn parse(svg: &str) -> usvg::Tree {
        usvg::Tree::from_str(svg, &usvg::Options::default()).unwrap()
    }

    #[test]
    fn flattens_translated_rect() {
        let tree = parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
                <g transform="translate(5 5)"><rect width="10" height="4" fill="#ff0000"/></g>
            </svg>"##,
        );
        let outline = Outline::from_usvg(tree.root());
        assert_eq!(outline.layers.len(), 1);
        assert_eq!(outline.layers[0].paint, LayerPaint::Fill(Some(Color::rgb8(255, 0, 0))));
        let bb = outline.bounds();
        assert_eq!(bb.min, CanvasPoint::pt(5.0, 5.0));
        assert_eq!(bb.max, CanvasPoint::pt(15.0, 9.0));
    }

    #[test]
    fn fill_and_stroke_become_two_layers() {
        let tree = parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
                <rect x="1" y="1" width="8" height="8" fill="white" stroke="black" stroke-width="2"/>
            </svg>"##,
        );
        let outline = Outline::from_usvg(tree.root());
        assert_eq!(outline.layers.len(), 2);
        assert!(matches!(outline.layers[0].paint, LayerPaint::Fill(Some(_))));
        assert_eq!(
            outline.layers[1].paint,
            LayerPaint::Stroke { color: Some(Color::BLACK), width: Length::pt(2.0) }
        );
    }

    #[test]
    fn inked_outline_paints_with_current_source() {
        let tree = parse(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4">
                <rect width="4" height="4" fill="red"/>
            </svg>"##,
        );
        let outline = Outline::from_usvg(tree.root()).inked();

        let mut surface = RecordingSurface::new();
        surface.set_source(Color::WHITE);
        outline.translated(CanvasOffset::pt(10.0, 0.0)).paint(&mut surface);

        let ops = surface.ops();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].color, Color::WHITE);
        assert_eq!(ops[0].bounds().min, CanvasPoint::pt(10.0, 0.0));
        assert_eq!(surface.depth(), 0);
    }
}
