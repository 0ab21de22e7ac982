//! Default sizes and settings (in points; most are whole CSS pixels on the map)

use crate::markup::Weight;
use crate::types::Length;

// Leader line and anchor marker
pub const LEADER_WIDTH: Length = Length::px(2.0);
pub const MARKER_RING_RADIUS: Length = Length::px(3.0);
pub const MARKER_CORE_RADIUS: Length = Length::px(2.0);

// Label placement
pub const HORIZONTAL_MARGIN: Length = Length::px(-2.0);
pub const VERTICAL_MARGIN: Length = Length::px(2.0);
pub const LABEL_GAP: Length = Length::px(6.0);
pub const ICON_GAP: Length = Length::px(3.0);
pub const ICON_DROP: Length = Length::px(3.0);

// Scale bar
pub const SCALE_MARGIN: Length = Length::px(50.0);
pub const SCALE_LINE_WIDTH: Length = Length::px(2.0);
pub const SCALE_THICKNESS_FACTOR: f64 = 4.0;
/// Segments used to approximate a full circle (16 per quarter, as GEOS)
pub const CIRCLE_SEGMENTS: usize = 64;

// Label font
pub const FONT_FAMILY: &str = "SF Pro Rounded";
pub const FONT_WEIGHT: Weight = Weight::MEDIUM;
pub const FONT_SIZE: Length = Length::pt(10.0);
pub const LETTER_SPACING: Length = Length::pango(-600.0);
/// Generic family tried after the configured one
pub const FALLBACK_FAMILY: &str = "sans-serif";

// Font metrics in em, used where the font itself cannot be measured
pub const LINE_HEIGHT: f64 = 1.2;
pub const ASCENT: f64 = 0.93;
pub const CHARWID: f64 = 0.57;
