//! Leader-line annotations and distance scale bars for static map
//! illustrations.
//!
//! An annotation connects an anchor on the map to a text label, optionally
//! with a marker on the anchor and a flag icon next to the text. A scale bar
//! is a pill-shaped bar with alternating ticks and distance labels, pinned
//! to the top-right corner of the canvas.
//!
//! Everything draws onto a [`Surface`]: [`PixmapSurface`] rasterizes with
//! tiny-skia, [`RecordingSurface`] keeps a list of paint operations.
//!
//! ```no_run
//! use cartouche::{Annotation, AnnotationRenderer, CanvasPoint, Direction, Length, PixmapSurface};
//!
//! # fn main() -> cartouche::Result<()> {
//! let mut surface = PixmapSurface::from_px(400.0, 300.0)?;
//! let annotation = Annotation::new(CanvasPoint::px(120.0, 180.0), Direction::Up, Length::px(60.0), "Lisbon");
//! AnnotationRenderer::default().render(&mut surface, &annotation, None)?;
//! surface.save_png("lisbon.png")?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod log;
pub mod markup;
pub mod render;
pub mod types;

pub use errors::{Error, Result};
pub use markup::{StyledText, Weight, parse_markup};
pub use render::annotation::{
    Annotation, AnnotationLayout, AnnotationRenderer, CurveControl, Direction, LeaderCurve, LeaderOffset,
};
pub use render::icon::{IconAsset, SvgIcon};
pub use render::pixmap::PixmapSurface;
pub use render::recording::RecordingSurface;
pub use render::scale_bar::{GeoScale, ScaleBar, ScaleBarBuilder, ScaleBarRequest, ScaleLabel};
pub use render::surface::{LineCap, Surface, SurfaceGuard};
pub use render::text::{Alignment, LabelFont, MetricTextLayout, ShapedTextLayout, TextBlock, TextEngine, TextLayout};
pub use render::theme::{AnnotationMetrics, ScaleBarOptions, Theme, TickParity};
pub use types::{Angle, BoundingBox, CanvasOffset, CanvasPoint, CanvasSize, Color, Length};
