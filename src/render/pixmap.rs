//! Raster surface backed by a tiny-skia pixmap.

use std::path::Path;

use glam::{DAffine2, DVec2, dvec2};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

use super::surface::{GraphicsState, LineCap, Surface, arc_to_cubics};
use crate::errors::{Error, Result};
use crate::log;
use crate::types::{Angle, CanvasOffset, CanvasPoint, CanvasSize, Color, Length};

/// A [`Surface`] that rasterizes onto an RGBA pixmap.
///
/// Canvas points are mapped to pixels by `pixels_per_point`. Like cairo,
/// each path point is mapped through the transform current when it is
/// appended; the transform current at `stroke` only shapes the pen.
pub struct PixmapSurface {
    pixmap: Pixmap,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    builder: PathBuilder,
    has_current_point: bool,
}

impl PixmapSurface {
    /// Allocate a transparent pixmap covering `size` at the given density.
    pub fn new(size: CanvasSize, pixels_per_point: f64) -> Result<Self> {
        if !(pixels_per_point.is_finite() && pixels_per_point > 0.0) {
            return Err(Error::surface(format!("invalid pixel density {pixels_per_point}")));
        }
        let width = (size.w.raw() * pixels_per_point).ceil();
        let height = (size.h.raw() * pixels_per_point).ceil();
        if !(width.is_finite() && height.is_finite()) || width < 1.0 || height < 1.0 {
            return Err(Error::surface(format!("invalid canvas size {}x{}", size.w, size.h)));
        }
        let pixmap = Pixmap::new(width as u32, height as u32)
            .ok_or_else(|| Error::surface(format!("cannot allocate {width}x{height} pixmap")))?;
        log::debug!(width, height, pixels_per_point, "allocated pixmap surface");

        Ok(Self {
            pixmap,
            state: GraphicsState::with_transform(DAffine2::from_scale(dvec2(pixels_per_point, pixels_per_point))),
            stack: Vec::new(),
            builder: PathBuilder::new(),
            has_current_point: false,
        })
    }

    /// Pixmap sized in CSS pixels (one device pixel per px)
    pub fn from_px(width: f64, height: f64) -> Result<Self> {
        Self::new(
            CanvasSize::new(Length::px(width), Length::px(height)),
            1.0 / Length::px(1.0).raw(),
        )
    }

    /// Paint the whole pixmap with one color, ignoring the current transform
    pub fn clear(&mut self, color: Color) {
        let [r, g, b, a] = color.to_rgba8();
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::Encode { source: Box::new(e) })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.pixmap
            .save_png(path)
            .map_err(|e| Error::Encode { source: Box::new(e) })
    }

    fn device_transform(&self) -> Transform {
        let m = self.state.transform;
        Transform::from_row(
            m.matrix2.x_axis.x as f32,
            m.matrix2.x_axis.y as f32,
            m.matrix2.y_axis.x as f32,
            m.matrix2.y_axis.y as f32,
            m.translation.x as f32,
            m.translation.y as f32,
        )
    }

    fn paint(&self) -> Paint<'static> {
        let [r, g, b, a] = self.state.source.to_rgba8();
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        paint
    }

    fn device_point(&self, p: DVec2) -> (f32, f32) {
        let d = self.state.transform.transform_point2(p);
        (d.x as f32, d.y as f32)
    }

    fn append_cubic(&mut self, c1: DVec2, c2: DVec2, end: DVec2) {
        let (x1, y1) = self.device_point(c1);
        let (x2, y2) = self.device_point(c2);
        let (x, y) = self.device_point(end);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn take_path(&mut self) -> Option<tiny_skia::Path> {
        self.has_current_point = false;
        std::mem::replace(&mut self.builder, PathBuilder::new()).finish()
    }
}

impl Surface for PixmapSurface {
    fn move_to(&mut self, p: CanvasPoint) {
        let (x, y) = self.device_point(p.to_dvec2());
        self.builder.move_to(x, y);
        self.has_current_point = true;
    }

    fn line_to(&mut self, p: CanvasPoint) {
        if !self.has_current_point {
            return self.move_to(p);
        }
        let (x, y) = self.device_point(p.to_dvec2());
        self.builder.line_to(x, y);
    }

    fn curve_to(&mut self, c1: CanvasPoint, c2: CanvasPoint, end: CanvasPoint) {
        if !self.has_current_point {
            self.move_to(c1);
        }
        self.append_cubic(c1.to_dvec2(), c2.to_dvec2(), end.to_dvec2());
    }

    fn close_path(&mut self) {
        self.builder.close();
    }

    fn arc(&mut self, center: CanvasPoint, radius: Length, start: Angle, end: Angle) {
        let (first, segments) = arc_to_cubics(center.to_dvec2(), radius.raw(), start.radians(), end.radians());
        // Like cairo, connect from the current point to the arc start
        if self.has_current_point {
            let (x, y) = self.device_point(first);
            self.builder.line_to(x, y);
        } else {
            self.move_to(CanvasPoint::from_dvec2(first));
        }
        for (c1, c2, p) in segments {
            self.append_cubic(c1, c2, p);
        }
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
        let Some(path) = self.take_path() else {
            return;
        };
        let dash = if self.state.dash.is_empty() {
            None
        } else {
            // tiny-skia needs an even number of intervals, cairo repeats odd lists
            let mut intervals: Vec<f32> = self.state.dash.iter().map(|d| d.raw() as f32).collect();
            if intervals.len() % 2 == 1 {
                intervals.extend_from_within(..);
            }
            let dash = StrokeDash::new(intervals, self.state.dash_offset.raw() as f32);
            if dash.is_none() {
                log::warn!(dashes = ?self.state.dash, "ignoring invalid dash pattern");
            }
            dash
        };
        let stroke = Stroke {
            width: self.state.line_width.raw() as f32,
            line_cap: match self.state.line_cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            dash,
            ..Stroke::default()
        };
        // The path is already in device space; pull it back into the current
        // user space so tiny-skia applies the transform to the pen alone
        let transform = self.device_transform();
        let Some(user_path) = transform.invert().and_then(|inverse| path.transform(inverse)) else {
            log::warn!("skipping stroke under a singular transform");
            return;
        };
        let paint = self.paint();
        self.pixmap.stroke_path(&user_path, &paint, &stroke, transform, None);
    }

    fn fill(&mut self) {
        let Some(path) = self.take_path() else {
            return;
        };
        let paint = self.paint();
        self.pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(surface: &PixmapSurface, x: u32, y: u32) -> [u8; 4] {
        let p = surface.pixmap().pixel(x, y).expect("pixel in bounds");
        [p.red(), p.green(), p.blue(), p.alpha()]
    }

    #[test]
    fn from_px_maps_one_px_to_one_pixel() {
        let surface = PixmapSurface::from_px(40.0, 30.0).unwrap();
        assert_eq!(surface.pixmap().width(), 40);
        assert_eq!(surface.pixmap().height(), 30);
    }

    #[test]
    fn rejects_degenerate_density() {
        let size = CanvasSize::new(Length::pt(10.0), Length::pt(10.0));
        assert!(PixmapSurface::new(size, 0.0).is_err());
        assert!(PixmapSurface::new(size, f64::NAN).is_err());
    }

    #[test]
    fn fill_paints_translated_square() {
        let mut surface = PixmapSurface::new(CanvasSize::new(Length::pt(20.0), Length::pt(20.0)), 1.0).unwrap();
        surface.save();
        surface.translate(CanvasOffset::pt(10.0, 10.0));
        surface.set_source(Color::WHITE);
        surface.move_to(CanvasPoint::pt(0.0, 0.0));
        surface.line_to(CanvasPoint::pt(10.0, 0.0));
        surface.line_to(CanvasPoint::pt(10.0, 10.0));
        surface.line_to(CanvasPoint::pt(0.0, 10.0));
        surface.close_path();
        surface.fill();
        surface.restore();

        assert_eq!(pixel(&surface, 15, 15), [255, 255, 255, 255]);
        assert_eq!(pixel(&surface, 5, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn stroke_with_round_caps_covers_endpoint() {
        let mut surface = PixmapSurface::new(CanvasSize::new(Length::pt(20.0), Length::pt(20.0)), 1.0).unwrap();
        surface.set_source(Color::WHITE);
        surface.set_line_width(Length::pt(4.0));
        surface.set_line_cap(LineCap::Round);
        surface.move_to(CanvasPoint::pt(5.0, 10.0));
        surface.line_to(CanvasPoint::pt(15.0, 10.0));
        surface.stroke();

        // One pixel past the end is inside the round cap
        assert_eq!(pixel(&surface, 15, 10)[3], 255);
        assert_eq!(pixel(&surface, 10, 2)[3], 0);
    }

    fn square_then_translate(surface: &mut dyn Surface) {
        surface.set_source(Color::WHITE);
        surface.move_to(CanvasPoint::pt(0.0, 0.0));
        surface.line_to(CanvasPoint::pt(6.0, 0.0));
        surface.line_to(CanvasPoint::pt(6.0, 6.0));
        surface.line_to(CanvasPoint::pt(0.0, 6.0));
        surface.close_path();
        surface.translate(CanvasOffset::pt(15.0, 15.0));
        surface.fill();
    }

    #[test]
    fn path_keeps_the_transform_it_was_built_under() {
        let mut recording = crate::render::recording::RecordingSurface::new();
        square_then_translate(&mut recording);
        let bb = recording.ops()[0].bounds();
        assert_eq!(bb.min, CanvasPoint::pt(0.0, 0.0));
        assert_eq!(bb.max, CanvasPoint::pt(6.0, 6.0));

        let mut surface = PixmapSurface::new(CanvasSize::new(Length::pt(30.0), Length::pt(30.0)), 1.0).unwrap();
        square_then_translate(&mut surface);
        assert_eq!(pixel(&surface, 3, 3)[3], 255);
        assert_eq!(pixel(&surface, 24, 24)[3], 0);
    }

    #[test]
    fn stroke_width_follows_the_scale_at_stroke_time() {
        // Two pixels per point: a 2 pt line covers 4 px
        let mut surface = PixmapSurface::new(CanvasSize::new(Length::pt(20.0), Length::pt(20.0)), 2.0).unwrap();
        surface.set_source(Color::WHITE);
        surface.set_line_width(Length::pt(2.0));
        surface.move_to(CanvasPoint::pt(2.0, 10.0));
        surface.line_to(CanvasPoint::pt(18.0, 10.0));
        surface.stroke();

        assert_eq!(pixel(&surface, 20, 18)[3], 255);
        assert_eq!(pixel(&surface, 20, 21)[3], 255);
        assert_eq!(pixel(&surface, 20, 23)[3], 0);
        assert_eq!(pixel(&surface, 20, 16)[3], 0);
    }

    #[test]
    fn encodes_png_signature() {
        let surface = PixmapSurface::from_px(4.0, 4.0).unwrap();
        let png = surface.encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
