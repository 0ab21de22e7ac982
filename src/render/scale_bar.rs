//! Distance scale bar: a pill-shaped bar split into equal segments, with
//! alternate segments cut out of its face and distance labels above it.
//!
//! [`ScaleBarBuilder::build`] computes everything in bar-local coordinates
//! (x from 0 at the left end, y = 0 on the bar's center line) plus the
//! translation that pins the bar's top-right corner to the canvas.
//! [`ScaleBar::draw`] then paints it; nothing is drawn until the whole layout
//! succeeded.

use geo::{BooleanOps, MultiPolygon};

use super::geometry::{append_polygons, inset, pill, polygon_bounds, segment_slice};
use super::surface::{Surface, SurfaceGuard};
use super::text::{Alignment, TextBlock, TextEngine, TextLayout};
use super::theme::{ScaleBarOptions, Theme};
use crate::errors::{Error, Result};
use crate::log;
use crate::types::{BoundingBox, CanvasOffset, CanvasPoint, Length};

/// Projection scale: `canvas_units` points on the canvas per `geo_units`
/// of geographic distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoScale {
    canvas_units: f64,
    geo_units: f64,
}

impl GeoScale {
    pub fn new(canvas_units: f64, geo_units: f64) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(canvas_units) || !valid(geo_units) {
            return Err(Error::InvalidScale { canvas_units, geo_units });
        }
        Ok(Self { canvas_units, geo_units })
    }

    pub fn canvas_per_geo(&self) -> f64 {
        self.canvas_units / self.geo_units
    }

    /// Canvas length of a geographic distance
    pub fn to_canvas(&self, geo_distance: f64) -> Length {
        Length::pt(self.canvas_per_geo() * geo_distance)
    }
}

/// A distance label, e.g. `(500.0, "500 km")`
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLabel {
    pub geo_distance: f64,
    pub text: String,
}

impl ScaleLabel {
    pub fn new(geo_distance: f64, text: impl Into<String>) -> Self {
        Self { geo_distance, text: text.into() }
    }
}

/// One of the equal divisions of the bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSegment {
    pub index: usize,
    pub start: Length,
    pub end: Length,
    /// Cut out of the face, so the bar fill shows through
    pub is_cut: bool,
}

/// What to draw: the canvas, the projection and the bar's extent
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBarRequest {
    pub canvas_bounds: BoundingBox,
    pub scale: GeoScale,
    pub width_in_geo_units: f64,
    pub segment_count: usize,
    pub labels: Vec<ScaleLabel>,
}

impl ScaleBarRequest {
    pub fn new(canvas_bounds: BoundingBox, scale: GeoScale, width_in_geo_units: f64, segment_count: usize) -> Self {
        Self {
            canvas_bounds,
            scale,
            width_in_geo_units,
            segment_count,
            labels: Vec::new(),
        }
    }

    pub fn with_label(mut self, geo_distance: f64, text: impl Into<String>) -> Self {
        self.labels.push(ScaleLabel::new(geo_distance, text));
        self
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = ScaleLabel>) -> Self {
        self.labels.extend(labels);
        self
    }
}

/// A label laid out above the bar
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub text: String,
    /// Bar-local x of the tick the label is centered on
    pub x: Length,
    /// Bar-local top-left of the text block
    pub position: CanvasPoint,
    pub block: TextBlock,
}

impl PlacedLabel {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_origin_size(self.position, self.block.size())
    }
}

/// A fully laid-out scale bar
#[derive(Debug, Clone)]
pub struct ScaleBar {
    pub width: Length,
    pub radius: Length,
    pub pill: MultiPolygon<f64>,
    /// Inset pill minus the cut segments
    pub face: MultiPolygon<f64>,
    pub segments: Vec<ScaleSegment>,
    pub labels: Vec<PlacedLabel>,
    /// Pill and labels, bar-local
    pub bbox: BoundingBox,
    /// Bar-local to canvas
    pub translation: CanvasOffset,
}

impl ScaleBar {
    /// Bounds of the bar and its labels on the canvas
    pub fn placed_bounds(&self) -> BoundingBox {
        self.bbox.translated(self.translation)
    }

    /// Paint the pill, then the face, then the labels. Surface state is
    /// unchanged afterwards.
    pub fn draw(&self, surface: &mut dyn Surface, theme: &Theme) {
        let mut s = SurfaceGuard::new(surface);
        s.translate(self.translation);

        append_polygons(&mut *s, &self.pill);
        s.set_source(theme.scale_fill);
        s.fill();

        append_polygons(&mut *s, &self.face);
        s.set_source(theme.tick_fill);
        s.fill();

        for label in &self.labels {
            let mut s = SurfaceGuard::new(&mut *s);
            s.translate(label.position - CanvasPoint::default());
            s.set_source(theme.label_ink);
            label.block.paint(&mut *s);
        }
    }
}

/// Builds scale bars with one theme, set of options and text engine
#[derive(Debug, Clone, Default)]
pub struct ScaleBarBuilder {
    theme: Theme,
    options: ScaleBarOptions,
    engine: TextEngine,
}

impl ScaleBarBuilder {
    pub fn new(engine: impl Into<TextEngine>) -> Self {
        Self { engine: engine.into(), ..Self::default() }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_options(mut self, options: ScaleBarOptions) -> Self {
        self.options = options;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn options(&self) -> &ScaleBarOptions {
        &self.options
    }

    /// Lay out the bar without drawing
    pub fn build(&self, request: &ScaleBarRequest) -> Result<ScaleBar> {
        let count = request.segment_count;
        if count == 0 {
            return Err(Error::InvalidSegmentCount { count });
        }
        Length::try_new(request.width_in_geo_units).map_err(Error::invalid("scale bar geo width"))?;
        for corner in [request.canvas_bounds.min, request.canvas_bounds.max] {
            Length::try_new(corner.x.raw()).map_err(Error::invalid("canvas bounds"))?;
            Length::try_new(corner.y.raw()).map_err(Error::invalid("canvas bounds"))?;
        }
        let line = Length::try_non_negative(self.options.line_width.raw()).map_err(Error::invalid("scale bar line width"))?;

        let width = request.scale.to_canvas(request.width_in_geo_units);
        Length::try_new(width.raw()).map_err(Error::invalid("scale bar width"))?;
        let radius = self.options.radius();
        if width <= radius * 2.0 {
            return Err(Error::ScaleBarTooShort {
                width: width.raw(),
                diameter: (radius * 2.0).raw(),
            });
        }

        let (w, r) = (width.raw(), radius.raw());
        let pill = pill(w, r, self.options.circle_segments);
        let inner = inset(&pill, line.raw());
        if inner.0.is_empty() {
            return Err(Error::EmptyGeometry { what: "scale bar face" });
        }

        let step = width / count as f64;
        let segments: Vec<ScaleSegment> = (0..count)
            .map(|index| ScaleSegment {
                index,
                start: step * index as f64,
                end: step * (index + 1) as f64,
                is_cut: self.options.tick_parity.is_cut(index),
            })
            .collect();

        let face = segments
            .iter()
            .filter(|seg| seg.is_cut)
            .fold(inner, |face, seg| face.difference(&segment_slice(seg.index, count, w, r)));

        let mut bbox = polygon_bounds(&pill);
        let baseline = -(radius + line);
        let mut labels = Vec::with_capacity(request.labels.len());
        for label in &request.labels {
            Length::try_new(label.geo_distance).map_err(Error::invalid("scale label distance"))?;
            let block = self.engine.layout(&label.text, &self.theme.font, Alignment::Center)?;
            let x = request.scale.to_canvas(label.geo_distance);
            let position = CanvasPoint::new(x - block.width / 2.0, baseline - block.height);
            let placed = PlacedLabel { text: label.text.clone(), x, position, block };
            bbox.union(&placed.bounds());
            labels.push(placed);
        }

        let canvas = &request.canvas_bounds;
        let translation = CanvasOffset::new(
            canvas.max.x - self.options.margin - bbox.max.x,
            canvas.min.y + self.options.margin - bbox.min.y,
        );

        log::debug!(
            width = width.raw(),
            segments = count,
            labels = labels.len(),
            dx = translation.dx.raw(),
            dy = translation.dy.raw(),
            "laid out scale bar"
        );

        Ok(ScaleBar {
            width,
            radius,
            pill,
            face,
            segments,
            labels,
            bbox,
            translation,
        })
    }

    /// Build and draw in one go
    pub fn render(&self, surface: &mut dyn Surface, request: &ScaleBarRequest) -> Result<ScaleBar> {
        let bar = self.build(request)?;
        bar.draw(surface, &self.theme);
        Ok(bar)
    }
}
