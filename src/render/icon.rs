//! Vector icons (flags) placed next to labels.

use std::path::{Path, PathBuf};

use super::outline::Outline;
use super::surface::{Surface, SurfaceGuard};
use crate::errors::{Error, Result};
use crate::log;
use crate::types::{Angle, CanvasOffset, CanvasPoint, CanvasSize, Length};

/// A vector image with an intrinsic size that paints itself.
///
/// Painting applies, in order: translate to `position`, rotate by
/// `rotation` about that point, then shift by `-origin` so the origin offset
/// is the icon-local point that lands on `position`.
pub trait IconAsset {
    fn size(&self) -> CanvasSize;
    fn set_position(&mut self, position: CanvasPoint);
    fn set_origin(&mut self, origin: CanvasOffset);
    fn set_rotation(&mut self, rotation: Angle);
    fn paint(&self, surface: &mut dyn Surface);
}

/// An SVG file flattened to colored outlines
#[derive(Debug, Clone)]
pub struct SvgIcon {
    path: Option<PathBuf>,
    size: CanvasSize,
    outline: Outline,
    position: CanvasPoint,
    origin: CanvasOffset,
    rotation: Angle,
}

impl SvgIcon {
    /// Read and parse an SVG icon. Missing or malformed files are errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::IconLoad { path: path.to_path_buf(), source })?;
        let mut icon = Self::parse(&data).map_err(|source| Error::IconParse { path: path.to_path_buf(), source })?;
        icon.path = Some(path.to_path_buf());
        log::debug!(path = %path.display(), width = icon.size.w.raw(), height = icon.size.h.raw(), "loaded icon");
        Ok(icon)
    }

    /// Parse SVG data held in memory. One SVG user unit is one point.
    pub fn parse(data: &[u8]) -> std::result::Result<Self, usvg::Error> {
        let tree = usvg::Tree::from_data(data, &usvg::Options::default())?;
        let size = tree.size();
        Ok(Self {
            path: None,
            size: CanvasSize::new(Length::pt(size.width() as f64), Length::pt(size.height() as f64)),
            outline: Outline::from_usvg(tree.root()),
            position: CanvasPoint::default(),
            origin: CanvasOffset::ZERO,
            rotation: Angle::ZERO,
        })
    }

    /// File the icon was loaded from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn position(&self) -> CanvasPoint {
        self.position
    }
}

impl IconAsset for SvgIcon {
    fn size(&self) -> CanvasSize {
        self.size
    }

    fn set_position(&mut self, position: CanvasPoint) {
        self.position = position;
    }

    fn set_origin(&mut self, origin: CanvasOffset) {
        self.origin = origin;
    }

    fn set_rotation(&mut self, rotation: Angle) {
        self.rotation = rotation;
    }

    fn paint(&self, surface: &mut dyn Surface) {
        let mut s = SurfaceGuard::new(surface);
        s.translate(self.position - CanvasPoint::default());
        if self.rotation != Angle::ZERO {
            s.rotate(self.rotation);
        }
        s.translate(-self.origin);
        self.outline.paint(&mut *s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::RecordingSurface;
    use crate::types::Color;

    const FLAG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="12" height="8">
        <rect width="12" height="8" fill="#ffffff"/>
        <rect width="6" height="8" fill="#aa151b"/>
    </svg>"##;

    #[test]
    fn parse_reads_intrinsic_size() {
        let icon = SvgIcon::parse(FLAG.as_bytes()).unwrap();
        assert_eq!(icon.size(), CanvasSize::new(Length::pt(12.0), Length::pt(8.0)));
        assert!(icon.source_path().is_none());
    }

    #[test]
    fn paint_draws_at_position_in_document_order() {
        let mut icon = SvgIcon::parse(FLAG.as_bytes()).unwrap();
        icon.set_position(CanvasPoint::pt(30.0, 40.0));

        let mut surface = RecordingSurface::new();
        icon.paint(&mut surface);

        let ops = surface.ops();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].color, Color::WHITE);
        assert_eq!(ops[1].color, Color::rgb8(0xaa, 0x15, 0x1b));
        assert_eq!(ops[0].bounds().min, CanvasPoint::pt(30.0, 40.0));
        assert_eq!(ops[0].bounds().max, CanvasPoint::pt(42.0, 48.0));
        assert_eq!(surface.depth(), 0);
    }

    #[test]
    fn origin_offset_shifts_the_anchor() {
        let mut icon = SvgIcon::parse(FLAG.as_bytes()).unwrap();
        icon.set_position(CanvasPoint::pt(30.0, 40.0));
        icon.set_origin(CanvasOffset::pt(6.0, 4.0));

        let mut surface = RecordingSurface::new();
        icon.paint(&mut surface);
        assert_eq!(surface.ops()[0].bounds().center(), CanvasPoint::pt(30.0, 40.0));
    }

    #[test]
    fn rotation_turns_about_the_position() {
        let mut icon = SvgIcon::parse(FLAG.as_bytes()).unwrap();
        icon.set_position(CanvasPoint::pt(10.0, 10.0));
        icon.set_rotation(Angle(90.0));

        let mut surface = RecordingSurface::new();
        icon.paint(&mut surface);
        let bb = surface.ops()[0].bounds();
        assert!((bb.min.x.raw() - 2.0).abs() < 1e-9, "{bb:?}");
        assert!((bb.max.y.raw() - 22.0).abs() < 1e-9, "{bb:?}");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SvgIcon::load("/nonexistent/flag-of-nowhere.svg").unwrap_err();
        assert!(matches!(err, Error::IconLoad { .. }));
    }

    #[test]
    fn load_reports_malformed_svg() {
        let dir = std::env::temp_dir().join(format!("cartouche-icon-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("broken.svg");
        std::fs::write(&file, "<svg").unwrap();
        let err = SvgIcon::load(&file).unwrap_err();
        assert!(matches!(err, Error::IconParse { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }
}
