//! Immutable drawing configuration: colors, label font and layout metrics.
//!
//! Nothing here is global. Renderers take these by value at construction and
//! never mutate them, so light and dark maps are just two values.

use super::defaults;
use super::text::LabelFont;
use crate::types::{Color, Length};

/// Colors and font shared by annotations and scale bars
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Leader line and outer marker ring
    pub leader_ink: Color,
    /// Inner disc of the anchor marker
    pub marker_core: Color,
    pub label_ink: Color,
    /// Scale bar silhouette
    pub scale_fill: Color,
    /// Scale bar face left after the tick cuts
    pub tick_fill: Color,
    pub font: LabelFont,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// White ink for dark backgrounds (hillshade, night globes)
    pub fn dark() -> Self {
        Self {
            leader_ink: Color::WHITE,
            marker_core: Color::BLACK,
            label_ink: Color::WHITE,
            scale_fill: Color::WHITE,
            tick_fill: Color::BLACK,
            font: LabelFont::default(),
        }
    }

    /// Black ink for light backgrounds
    pub fn light() -> Self {
        Self {
            leader_ink: Color::BLACK,
            marker_core: Color::WHITE,
            label_ink: Color::BLACK,
            scale_fill: Color::BLACK,
            tick_fill: Color::WHITE,
            font: LabelFont::default(),
        }
    }

    pub fn with_font(mut self, font: LabelFont) -> Self {
        self.font = font;
        self
    }

    pub fn with_leader_ink(mut self, color: Color) -> Self {
        self.leader_ink = color;
        self
    }

    pub fn with_label_ink(mut self, color: Color) -> Self {
        self.label_ink = color;
        self
    }
}

/// Fixed distances used to place leader lines, labels and icons
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationMetrics {
    pub leader_width: Length,
    pub marker_ring_radius: Length,
    pub marker_core_radius: Length,
    /// Added to the label x; negative nudges text toward the anchor
    pub horizontal_margin: Length,
    pub vertical_margin: Length,
    /// Space between the label point and text for sideways labels
    pub label_gap: Length,
    /// Space between icon and text
    pub icon_gap: Length,
    /// Icon top below the text top
    pub icon_drop: Length,
}

impl Default for AnnotationMetrics {
    fn default() -> Self {
        Self {
            leader_width: defaults::LEADER_WIDTH,
            marker_ring_radius: defaults::MARKER_RING_RADIUS,
            marker_core_radius: defaults::MARKER_CORE_RADIUS,
            horizontal_margin: defaults::HORIZONTAL_MARGIN,
            vertical_margin: defaults::VERTICAL_MARGIN,
            label_gap: defaults::LABEL_GAP,
            icon_gap: defaults::ICON_GAP,
            icon_drop: defaults::ICON_DROP,
        }
    }
}

impl AnnotationMetrics {
    pub fn with_leader_width(mut self, width: Length) -> Self {
        self.leader_width = width;
        self
    }

    pub fn with_margins(mut self, horizontal: Length, vertical: Length) -> Self {
        self.horizontal_margin = horizontal;
        self.vertical_margin = vertical;
        self
    }

    pub fn with_label_gap(mut self, gap: Length) -> Self {
        self.label_gap = gap;
        self
    }
}

/// Which scale bar segments are cut out of the face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickParity {
    /// Segments 1, 3, 5, ...
    #[default]
    Odd,
    /// Segments 0, 2, 4, ...
    Even,
}

impl TickParity {
    pub fn is_cut(self, index: usize) -> bool {
        match self {
            TickParity::Odd => index % 2 == 1,
            TickParity::Even => index % 2 == 0,
        }
    }
}

/// Scale bar proportions and placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBarOptions {
    /// Inset of the bar's top-right corner from the canvas top-right corner
    pub margin: Length,
    pub line_width: Length,
    /// Bar thickness as a multiple of the line width
    pub thickness_factor: f64,
    pub tick_parity: TickParity,
    /// Vertices per end-cap circle
    pub circle_segments: usize,
}

impl Default for ScaleBarOptions {
    fn default() -> Self {
        Self {
            margin: defaults::SCALE_MARGIN,
            line_width: defaults::SCALE_LINE_WIDTH,
            thickness_factor: defaults::SCALE_THICKNESS_FACTOR,
            tick_parity: TickParity::default(),
            circle_segments: defaults::CIRCLE_SEGMENTS,
        }
    }
}

impl ScaleBarOptions {
    pub fn thickness(&self) -> Length {
        self.line_width * self.thickness_factor
    }

    pub fn radius(&self) -> Length {
        self.thickness() / 2.0
    }

    pub fn with_margin(mut self, margin: Length) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_line_width(mut self, width: Length) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_tick_parity(mut self, parity: TickParity) -> Self {
        self.tick_parity = parity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_bar_thickness_is_four_lines() {
        let options = ScaleBarOptions::default();
        assert_eq!(options.thickness(), Length::px(8.0));
        assert_eq!(options.radius(), Length::px(4.0));
    }

    #[test]
    fn tick_parity_selects_alternate_segments() {
        let odd: Vec<_> = (0..5).filter(|&i| TickParity::Odd.is_cut(i)).collect();
        let even: Vec<_> = (0..5).filter(|&i| TickParity::Even.is_cut(i)).collect();
        assert_eq!(odd, vec![1, 3]);
        assert_eq!(even, vec![0, 2, 4]);
    }

    #[test]
    fn light_theme_inverts_dark() {
        let dark = Theme::dark();
        let light = Theme::light();
        assert_eq!(dark.leader_ink, light.marker_core);
        assert_eq!(dark.tick_fill, light.scale_fill);
        assert_eq!(Theme::default(), dark);
    }
}
