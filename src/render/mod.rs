//! Drawing annotations and scale bars
//!
//! This module is organized into submodules:
//! - `surface`: the drawing contract and its save/restore guard
//! - `recording`, `pixmap`: surfaces that record operations or rasterize
//! - `outline`: flattened, colored vector paths (glyphs, icons)
//! - `text`: label layout engines
//! - `icon`: SVG flag icons
//! - `geometry`: polygon helpers for the scale bar
//! - `defaults`, `theme`: configuration
//! - `annotation`, `scale_bar`: the two things this crate draws

pub mod annotation;
pub mod defaults;
pub mod geometry;
pub mod icon;
pub mod outline;
pub mod pixmap;
pub mod recording;
pub mod scale_bar;
pub mod surface;
pub mod text;
pub mod theme;

pub use annotation::{Annotation, AnnotationLayout, AnnotationRenderer, Direction};
pub use scale_bar::{ScaleBar, ScaleBarBuilder, ScaleBarRequest};
pub use surface::{Surface, SurfaceGuard};
