//! Error types with rich diagnostics using miette
//!
//! Markup errors carry source spans for labelled error messages; the rest wrap
//! the collaborator failure they came from.

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::types::NumericError;

/// Errors raised while laying out or drawing annotations and scale bars
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    // ========================================================================
    // Input errors
    // ========================================================================
    #[error("unknown direction: {value:?}")]
    #[diagnostic(
        code(cartouche::input::unknown_direction),
        help("expected one of `up`, `down`, `left`, `right`")
    )]
    UnknownDirection { value: String },

    #[error("invalid {what}: {source}")]
    #[diagnostic(code(cartouche::input::invalid_number))]
    InvalidNumber {
        what: &'static str,
        #[source]
        source: NumericError,
    },

    #[error("invalid projection scale: {canvas_units} canvas units per {geo_units} geo units")]
    #[diagnostic(
        code(cartouche::input::invalid_scale),
        help("both sides of the scale ratio must be finite and positive")
    )]
    InvalidScale { canvas_units: f64, geo_units: f64 },

    // ========================================================================
    // Scale bar errors
    // ========================================================================
    #[error("scale bar needs at least one segment, got {count}")]
    #[diagnostic(code(cartouche::scale_bar::invalid_segment_count))]
    InvalidSegmentCount { count: usize },

    #[error("scale bar of width {width} is shorter than its end caps ({diameter})")]
    #[diagnostic(
        code(cartouche::scale_bar::too_short),
        help("increase the geographic width or zoom in")
    )]
    ScaleBarTooShort { width: f64, diameter: f64 },

    #[error("polygon operation produced no geometry: {what}")]
    #[diagnostic(code(cartouche::geometry::empty))]
    EmptyGeometry { what: &'static str },

    // ========================================================================
    // Text errors
    // ========================================================================
    #[error("invalid label markup: {message}")]
    #[diagnostic(code(cartouche::text::markup))]
    Markup {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("text layout failed: {message}")]
    #[diagnostic(code(cartouche::text::layout))]
    TextLayout { message: String },

    // ========================================================================
    // Icon errors
    // ========================================================================
    #[error("failed to read icon {}", path.display())]
    #[diagnostic(code(cartouche::icon::load))]
    IconLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse icon {}", path.display())]
    #[diagnostic(code(cartouche::icon::parse))]
    IconParse {
        path: PathBuf,
        #[source]
        source: usvg::Error,
    },

    // ========================================================================
    // Surface errors
    // ========================================================================
    #[error("drawing surface error: {message}")]
    #[diagnostic(code(cartouche::surface::draw))]
    Surface { message: String },

    #[error("failed to encode png")]
    #[diagnostic(code(cartouche::surface::encode))]
    Encode {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Wrap a numeric validation failure for the named input
    pub fn invalid(what: &'static str) -> impl FnOnce(NumericError) -> Error {
        move |source| Error::InvalidNumber { what, source }
    }

    pub(crate) fn surface(message: impl Into<String>) -> Error {
        Error::Surface { message: message.into() }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
