//! Leader-line annotations: a line from an anchor to a label point, an
//! optional anchor marker, a text label and an optional icon.
//!
//! Placement is split into pure functions ([`resolve_offset`],
//! [`leader_curve`], [`place_label`], [`place_icon`]) so positions can be
//! checked without drawing. [`AnnotationRenderer`] composes them and paints
//! in a fixed order: line, marker, text, icon. The icon is placed from the
//! final text origin, so text is always positioned first.

use std::fmt;
use std::str::FromStr;

use super::icon::IconAsset;
use super::surface::{LineCap, Surface, SurfaceGuard};
use super::text::{Alignment, TextBlock, TextEngine, TextLayout};
use super::theme::{AnnotationMetrics, Theme};
use crate::errors::{Error, Result};
use crate::log;
use crate::types::{CanvasOffset, CanvasPoint, CanvasSize, Length};

/// Side of the anchor the label goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(Error::UnknownDirection { value: s.to_string() }),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        })
    }
}

/// Distance from the anchor to the label point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeaderOffset {
    /// Along the direction's axis
    Along(Length),
    /// Any displacement; the direction then only affects label placement
    Explicit(CanvasOffset),
}

impl From<Length> for LeaderOffset {
    fn from(length: Length) -> Self {
        LeaderOffset::Along(length)
    }
}

impl From<CanvasOffset> for LeaderOffset {
    fn from(offset: CanvasOffset) -> Self {
        LeaderOffset::Explicit(offset)
    }
}

/// Bezier control deltas. `start` is relative to the anchor, `end` to the
/// label point. Missing deltas leave the control on its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurveControl {
    pub start: Option<CanvasOffset>,
    pub end: Option<CanvasOffset>,
}

impl CurveControl {
    pub fn new(start: Option<CanvasOffset>, end: Option<CanvasOffset>) -> Self {
        Self { start, end }
    }
}

/// Cubic Bezier from the anchor to the label point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderCurve {
    pub start: CanvasPoint,
    pub control_a: CanvasPoint,
    pub control_b: CanvasPoint,
    pub end: CanvasPoint,
}

impl LeaderCurve {
    /// Both controls on their endpoints, so the curve is a segment
    pub fn is_straight(&self) -> bool {
        self.control_a == self.start && self.control_b == self.end
    }
}

/// Everything needed to draw one annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub anchor: CanvasPoint,
    pub direction: Direction,
    pub offset: LeaderOffset,
    /// Label markup
    pub label: String,
    pub alignment: Alignment,
    pub show_marker: bool,
    pub curve: CurveControl,
}

impl Annotation {
    pub fn new(
        anchor: CanvasPoint,
        direction: Direction,
        offset: impl Into<LeaderOffset>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            anchor,
            direction,
            offset: offset.into(),
            label: label.into(),
            alignment: Alignment::Left,
            show_marker: true,
            curve: CurveControl::default(),
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_marker(mut self, show: bool) -> Self {
        self.show_marker = show;
        self
    }

    pub fn with_curve(mut self, curve: CurveControl) -> Self {
        self.curve = curve;
        self
    }

    fn validate(&self) -> Result<()> {
        Length::try_new(self.anchor.x.raw()).map_err(Error::invalid("anchor x"))?;
        Length::try_new(self.anchor.y.raw()).map_err(Error::invalid("anchor y"))?;
        match self.offset {
            LeaderOffset::Along(d) => {
                Length::try_new(d.raw()).map_err(Error::invalid("leader offset"))?;
            }
            LeaderOffset::Explicit(o) => {
                Length::try_new(o.dx.raw()).map_err(Error::invalid("leader offset dx"))?;
                Length::try_new(o.dy.raw()).map_err(Error::invalid("leader offset dy"))?;
            }
        }
        for delta in [self.curve.start, self.curve.end].into_iter().flatten() {
            Length::try_new(delta.dx.raw()).map_err(Error::invalid("curve control dx"))?;
            Length::try_new(delta.dy.raw()).map_err(Error::invalid("curve control dy"))?;
        }
        Ok(())
    }
}

/// Where everything of one annotation ended up
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationLayout {
    pub leader: LeaderCurve,
    /// End of the leader line; text and icon are placed from here
    pub label_point: CanvasPoint,
    /// Top-left of the text block
    pub text_origin: CanvasPoint,
    pub text_size: CanvasSize,
    pub line_count: usize,
    /// Top-left of the icon, when one was drawn
    pub icon_position: Option<CanvasPoint>,
}

/// Turn a leader offset into a displacement
pub fn resolve_offset(direction: Direction, offset: LeaderOffset) -> CanvasOffset {
    match offset {
        LeaderOffset::Explicit(o) => o,
        LeaderOffset::Along(d) => match direction {
            Direction::Up => CanvasOffset::new(Length::ZERO, -d),
            Direction::Down => CanvasOffset::new(Length::ZERO, d),
            Direction::Right => CanvasOffset::new(d, Length::ZERO),
            Direction::Left => CanvasOffset::new(-d, Length::ZERO),
        },
    }
}

/// Leader curve from `anchor` to the offset label point
pub fn leader_curve(anchor: CanvasPoint, direction: Direction, offset: LeaderOffset, curve: &CurveControl) -> LeaderCurve {
    let end = anchor + resolve_offset(direction, offset);
    LeaderCurve {
        start: anchor,
        control_a: anchor + curve.start.unwrap_or(CanvasOffset::ZERO),
        control_b: end + curve.end.unwrap_or(CanvasOffset::ZERO),
        end,
    }
}

/// Top-left corner of the text block.
///
/// Vertical labels hang above or below the label point; sideways labels are
/// centered on their first line. Text starts at the label point nudged by
/// `horizontal_margin`, except for right-aligned vertical labels, which end
/// there, and right-pointing labels, which are kept clear of the line end
/// by `label_gap` and leave room for the icon between line and text.
pub fn place_label(
    label_point: CanvasPoint,
    direction: Direction,
    alignment: Alignment,
    text_size: CanvasSize,
    line_count: usize,
    icon_width: Option<Length>,
    metrics: &AnnotationMetrics,
) -> CanvasPoint {
    let x = match direction {
        Direction::Up | Direction::Down => match alignment {
            Alignment::Right => label_point.x - text_size.w - metrics.horizontal_margin,
            Alignment::Left | Alignment::Center => label_point.x + metrics.horizontal_margin,
        },
        Direction::Right => {
            let x = label_point.x + metrics.label_gap + metrics.horizontal_margin;
            match icon_width {
                Some(w) => x + w + metrics.icon_gap,
                None => x,
            }
        }
        Direction::Left => label_point.x + metrics.horizontal_margin,
    };

    let y = match direction {
        Direction::Up => label_point.y - text_size.h - metrics.vertical_margin,
        Direction::Down => label_point.y + metrics.vertical_margin,
        Direction::Left | Direction::Right => {
            let first_line = text_size.h / line_count.max(1) as f64;
            label_point.y - first_line / 2.0
        }
    };

    CanvasPoint::new(x, y)
}

/// Top-left corner of an icon preceding the text at `text_origin`
pub fn place_icon(text_origin: CanvasPoint, metrics: &AnnotationMetrics, icon_size: CanvasSize) -> CanvasPoint {
    CanvasPoint::new(
        text_origin.x - icon_size.w - metrics.icon_gap,
        text_origin.y + metrics.icon_drop,
    )
}

/// Lays out and draws annotations with one theme and text engine
#[derive(Debug, Clone, Default)]
pub struct AnnotationRenderer {
    theme: Theme,
    metrics: AnnotationMetrics,
    engine: TextEngine,
}

impl AnnotationRenderer {
    pub fn new(engine: impl Into<TextEngine>) -> Self {
        Self { engine: engine.into(), ..Self::default() }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_metrics(mut self, metrics: AnnotationMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn metrics(&self) -> &AnnotationMetrics {
        &self.metrics
    }

    /// Compute the layout without drawing
    pub fn measure(&self, annotation: &Annotation, icon_size: Option<CanvasSize>) -> Result<AnnotationLayout> {
        let block = self.layout_text(annotation)?;
        Ok(self.arrange(annotation, &block, icon_size))
    }

    /// Draw the annotation: leader, optional marker, label, optional icon.
    ///
    /// The icon's position is overwritten. Surface state is unchanged
    /// afterwards.
    pub fn render(
        &self,
        surface: &mut dyn Surface,
        annotation: &Annotation,
        icon: Option<&mut dyn IconAsset>,
    ) -> Result<AnnotationLayout> {
        // Shape first so a text failure leaves the surface untouched
        let block = self.layout_text(annotation)?;
        let icon_size = icon.as_ref().map(|i| i.size());
        let layout = self.arrange(annotation, &block, icon_size);

        self.draw_leader(surface, annotation, &layout.leader);

        {
            let mut s = SurfaceGuard::new(&mut *surface);
            s.translate(layout.text_origin - CanvasPoint::default());
            s.set_source(self.theme.label_ink);
            block.paint(&mut *s);
        }

        if let (Some(icon), Some(position)) = (icon, layout.icon_position) {
            icon.set_position(position);
            icon.paint(surface);
        }

        log::debug!(
            label = %annotation.label,
            direction = %annotation.direction,
            x = layout.text_origin.x.raw(),
            y = layout.text_origin.y.raw(),
            "drew annotation"
        );
        Ok(layout)
    }

    fn layout_text(&self, annotation: &Annotation) -> Result<TextBlock> {
        annotation.validate()?;
        self.engine.layout(&annotation.label, &self.theme.font, annotation.alignment)
    }

    fn arrange(&self, annotation: &Annotation, block: &TextBlock, icon_size: Option<CanvasSize>) -> AnnotationLayout {
        let leader = leader_curve(annotation.anchor, annotation.direction, annotation.offset, &annotation.curve);
        let text_origin = place_label(
            leader.end,
            annotation.direction,
            annotation.alignment,
            block.size(),
            block.line_count,
            icon_size.map(|s| s.w),
            &self.metrics,
        );
        AnnotationLayout {
            leader,
            label_point: leader.end,
            text_origin,
            text_size: block.size(),
            line_count: block.line_count,
            icon_position: icon_size.map(|size| place_icon(text_origin, &self.metrics, size)),
        }
    }

    fn draw_leader(&self, surface: &mut dyn Surface, annotation: &Annotation, leader: &LeaderCurve) {
        let mut s = SurfaceGuard::new(surface);
        s.move_to(leader.start);
        s.curve_to(leader.control_a, leader.control_b, leader.end);
        s.set_dash(&[], Length::ZERO);
        s.set_source(self.theme.leader_ink);
        s.set_line_cap(LineCap::Round);
        s.set_line_width(self.metrics.leader_width);
        s.stroke();

        if annotation.show_marker {
            s.circle(annotation.anchor, self.metrics.marker_ring_radius);
            s.stroke();
            s.circle(annotation.anchor, self.metrics.marker_core_radius);
            s.set_source(self.theme.marker_core);
            s.fill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> AnnotationMetrics {
        AnnotationMetrics::default()
    }

    #[test]
    fn direction_parses_known_names_only() {
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!(" Right ".parse::<Direction>().unwrap(), Direction::Right);
        let err = "north".parse::<Direction>().unwrap_err();
        assert!(matches!(err, Error::UnknownDirection { ref value } if value == "north"));
        for d in Direction::ALL {
            assert_eq!(d.to_string().parse::<Direction>().unwrap(), d);
        }
    }

    #[test]
    fn scalar_offset_follows_direction_axis() {
        let d = Length::pt(7.0);
        assert_eq!(resolve_offset(Direction::Up, d.into()), CanvasOffset::pt(0.0, -7.0));
        assert_eq!(resolve_offset(Direction::Down, d.into()), CanvasOffset::pt(0.0, 7.0));
        assert_eq!(resolve_offset(Direction::Right, d.into()), CanvasOffset::pt(7.0, 0.0));
        assert_eq!(resolve_offset(Direction::Left, d.into()), CanvasOffset::pt(-7.0, 0.0));
    }

    #[test]
    fn explicit_offset_ignores_direction() {
        let o = CanvasOffset::pt(3.0, -4.0);
        for d in Direction::ALL {
            assert_eq!(resolve_offset(d, o.into()), o);
        }
    }

    #[test]
    fn leader_without_control_is_straight() {
        let leader = leader_curve(
            CanvasPoint::pt(10.0, 10.0),
            Direction::Up,
            Length::pt(5.0).into(),
            &CurveControl::default(),
        );
        assert!(leader.is_straight());
        assert_eq!(leader.end, CanvasPoint::pt(10.0, 5.0));
    }

    #[test]
    fn curve_deltas_are_relative_to_each_endpoint() {
        let curve = CurveControl::new(Some(CanvasOffset::pt(1.0, 2.0)), Some(CanvasOffset::pt(-3.0, 0.0)));
        let leader = leader_curve(CanvasPoint::pt(0.0, 0.0), Direction::Right, Length::pt(20.0).into(), &curve);
        assert_eq!(leader.control_a, CanvasPoint::pt(1.0, 2.0));
        assert_eq!(leader.control_b, CanvasPoint::pt(17.0, 0.0));
        assert!(!leader.is_straight());
    }

    #[test]
    fn up_right_aligned_text_grows_leftward() {
        let m = metrics();
        let label = CanvasPoint::pt(100.0, 50.0);
        let size = CanvasSize::new(Length::pt(40.0), Length::pt(12.0));
        let origin = place_label(label, Direction::Up, Alignment::Right, size, 1, None, &m);
        assert_eq!(origin.x, label.x - size.w - m.horizontal_margin);
        assert_eq!(origin.y, label.y - size.h - m.vertical_margin);
    }

    #[test]
    fn right_label_reserves_icon_space() {
        let m = metrics();
        let label = CanvasPoint::pt(0.0, 0.0);
        let size = CanvasSize::new(Length::pt(40.0), Length::pt(24.0));
        let without = place_label(label, Direction::Right, Alignment::Left, size, 2, None, &m);
        let with = place_label(label, Direction::Right, Alignment::Left, size, 2, Some(Length::pt(12.0)), &m);
        assert_eq!(without.x, m.label_gap + m.horizontal_margin);
        assert_eq!(with.x - without.x, Length::pt(12.0) + m.icon_gap);
        // Centered on the first of two lines
        assert_eq!(without.y, Length::pt(-6.0));
    }

    #[test]
    fn left_label_starts_at_the_label_point() {
        let m = metrics();
        let label = CanvasPoint::pt(100.0, 100.0);
        let size = CanvasSize::new(Length::pt(40.0), Length::pt(12.0));
        let right = place_label(label, Direction::Right, Alignment::Left, size, 1, None, &m);
        for alignment in [Alignment::Left, Alignment::Center, Alignment::Right] {
            let left = place_label(label, Direction::Left, alignment, size, 1, None, &m);
            assert_eq!(left.x, Length::pt(98.5));
            // Centered on the first line, like right-pointing labels
            assert_eq!(left.y, right.y);
        }
        // No icon space is reserved
        let with_icon = place_label(label, Direction::Left, Alignment::Left, size, 1, Some(Length::pt(12.0)), &m);
        assert_eq!(with_icon.x, Length::pt(98.5));
    }

    #[test]
    fn icon_precedes_text() {
        let m = metrics();
        let text = CanvasPoint::pt(50.0, 20.0);
        let icon = place_icon(text, &m, CanvasSize::new(Length::pt(12.0), Length::pt(8.0)));
        assert_eq!(icon, CanvasPoint::new(Length::pt(38.0) - m.icon_gap, Length::pt(20.0) + m.icon_drop));
    }

    #[test]
    fn measure_rejects_non_finite_offsets() {
        let renderer = AnnotationRenderer::default();
        let annotation = Annotation::new(CanvasPoint::pt(0.0, 0.0), Direction::Up, Length::pt(f64::NAN), "x");
        let err = renderer.measure(&annotation, None).unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { what: "leader offset", .. }));
    }
}
