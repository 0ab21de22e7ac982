//! Text layout for labels.
//!
//! A [`TextLayout`] turns label markup into a [`TextBlock`]: measured size,
//! line count and glyph outlines in block-local coordinates (origin at the
//! top-left of the logical box). Two engines are provided:
//!
//! - [`ShapedTextLayout`] shapes real glyphs through usvg and a fontdb
//!   database, so output matches the installed fonts.
//! - [`MetricTextLayout`] measures with a fixed proportional width table and
//!   draws one bar per glyph. It needs no fonts and is fully deterministic.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use enum_dispatch::enum_dispatch;
use glam::dvec2;

use super::defaults;
use super::outline::{LayerPaint, Outline};
use super::surface::{PathEl, Surface};
use crate::errors::{Error, Result};
use crate::log;
use crate::markup::{Run, Weight, parse_markup};
use crate::types::{CanvasOffset, CanvasSize, Length};

/// Horizontal alignment of lines inside a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(format!("unknown alignment {other:?}")),
        }
    }
}

/// Base font a label is set in. Markup spans override parts of it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelFont {
    pub family: String,
    pub weight: Weight,
    pub size: Length,
    pub letter_spacing: Length,
}

impl Default for LabelFont {
    fn default() -> Self {
        Self {
            family: defaults::FONT_FAMILY.to_string(),
            weight: defaults::FONT_WEIGHT,
            size: defaults::FONT_SIZE,
            letter_spacing: defaults::LETTER_SPACING,
        }
    }
}

impl LabelFont {
    pub fn new(family: impl Into<String>) -> Self {
        Self { family: family.into(), ..Self::default() }
    }

    pub fn with_size(mut self, size: Length) -> Self {
        self.size = size;
        self
    }

    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_letter_spacing(mut self, spacing: Length) -> Self {
        self.letter_spacing = spacing;
        self
    }

    fn resolve<'a>(&'a self, run: &'a Run) -> ResolvedRun<'a> {
        ResolvedRun {
            text: &run.text,
            family: run.style.family.as_deref().unwrap_or(&self.family),
            weight: run.style.weight.unwrap_or(self.weight),
            italic: run.style.italic,
            size: run.style.resolve_size(self.size),
            letter_spacing: run.style.letter_spacing.unwrap_or(self.letter_spacing),
        }
    }
}

/// A run with every style property resolved against the base font
#[derive(Debug, Clone, Copy)]
struct ResolvedRun<'a> {
    text: &'a str,
    family: &'a str,
    weight: Weight,
    italic: bool,
    size: Length,
    letter_spacing: Length,
}

/// A laid-out label
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub alignment: Alignment,
    pub width: Length,
    pub height: Length,
    pub line_count: usize,
    /// Glyphs relative to the block's top-left corner
    pub outline: Outline,
}

impl TextBlock {
    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }

    /// Average line height
    pub fn line_height(&self) -> Length {
        self.height / self.line_count.max(1) as f64
    }

    /// Fill the glyph outlines at the surface's current origin
    pub fn paint(&self, surface: &mut dyn Surface) {
        self.outline.paint(surface);
    }
}

/// Turns markup into measured, paintable text blocks
#[enum_dispatch]
pub trait TextLayout {
    fn layout(&self, markup: &str, font: &LabelFont, alignment: Alignment) -> Result<TextBlock>;
}

/// The text engines, dispatched statically
#[enum_dispatch(TextLayout)]
#[derive(Debug, Clone)]
pub enum TextEngine {
    Shaped(ShapedTextLayout),
    Metric(MetricTextLayout),
}

impl Default for TextEngine {
    fn default() -> Self {
        TextEngine::Metric(MetricTextLayout::default())
    }
}

/// One line before alignment: outline with x from 0 and y from the line top
struct LineBox {
    width: Length,
    height: Length,
    outline: Outline,
}

/// Line height and baseline for a line of resolved runs
fn line_metrics(runs: &[ResolvedRun<'_>], font: &LabelFont) -> (Length, Length) {
    let em = runs.iter().map(|r| r.size).fold(Length::ZERO, Length::max);
    let em = if runs.is_empty() { font.size } else { em };
    (em * defaults::LINE_HEIGHT, em * defaults::ASCENT)
}

/// Stack lines top to bottom and shift each one by the alignment
fn assemble(lines: Vec<LineBox>, alignment: Alignment) -> TextBlock {
    let width = lines.iter().map(|l| l.width).fold(Length::ZERO, Length::max);
    let line_count = lines.len();
    let mut outline = Outline::new();
    let mut y = Length::ZERO;
    for line in lines {
        let shift = match alignment {
            Alignment::Left => Length::ZERO,
            Alignment::Center => (width - line.width) / 2.0,
            Alignment::Right => width - line.width,
        };
        outline.extend(line.outline.translated(CanvasOffset::new(shift, y)));
        y += line.height;
    }
    TextBlock { alignment, width, height: y, line_count, outline }
}

// ============================================================================
// Metric engine
// ============================================================================

/// Proportional character widths (hundredths of the average advance) for
/// printable ASCII, as used by pikchr.
#[rustfmt::skip]
const AW_CHAR: [u8; 95] = [
    45,  55,  62, 115,  90, 132, 125,  40,
    55,  55,  71, 115,  45,  48,  45,  50,
    91,  91,  91,  91,  91,  91,  91,  91,
    91,  91,  50,  50, 120, 120, 120,  78,
   142, 102, 105, 110, 115, 105,  98, 105,
   125,  58,  58, 107,  95, 145, 125, 115,
    95, 115, 107,  95,  97, 118, 102, 150,
   100,  93, 100,  58,  50,  58, 119,  72,
    72,  86,  92,  80,  92,  85,  52,  92,
    92,  47,  47,  88,  48, 135,  92,  86,
    92,  92,  69,  75,  58,  92,  80, 121,
    81,  80,  76,  91,  49,  91, 118,
];

/// Width table layout: no fonts, deterministic output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricTextLayout {
    /// Average advance in em
    pub charwid: f64,
}

impl Default for MetricTextLayout {
    fn default() -> Self {
        Self { charwid: defaults::CHARWID }
    }
}

impl MetricTextLayout {
    /// Advance of one character in em, before letter spacing
    pub fn advance_em(&self, c: char) -> f64 {
        let hundredths = if (' '..='~').contains(&c) {
            AW_CHAR[c as usize - 0x20] as f64
        } else {
            100.0
        };
        hundredths * 0.01 * self.charwid
    }

    fn layout_line(&self, runs: &[ResolvedRun<'_>], font: &LabelFont) -> LineBox {
        let (height, baseline) = line_metrics(runs, font);
        let mut outline = Outline::new();
        let mut x = Length::ZERO;
        for run in runs {
            // Heavier weights set slightly wider
            let weight_scale = if run.weight >= Weight(600) { 1.05 } else { 1.0 };
            for c in run.text.chars() {
                let advance = run.size * (self.advance_em(c) * weight_scale);
                if !c.is_whitespace() {
                    let glyph_h = run.size * 0.7;
                    let x0 = (x + advance * 0.1).raw();
                    let x1 = (x + advance * 0.9).raw();
                    let y0 = (baseline - glyph_h).raw();
                    let y1 = baseline.raw();
                    outline.push(
                        vec![
                            PathEl::MoveTo(dvec2(x0, y0)),
                            PathEl::LineTo(dvec2(x1, y0)),
                            PathEl::LineTo(dvec2(x1, y1)),
                            PathEl::LineTo(dvec2(x0, y1)),
                            PathEl::Close,
                        ],
                        LayerPaint::Fill(None),
                    );
                }
                x += advance + run.letter_spacing;
            }
        }
        LineBox { width: x.max(Length::ZERO), height, outline }
    }
}

impl TextLayout for MetricTextLayout {
    fn layout(&self, markup: &str, font: &LabelFont, alignment: Alignment) -> Result<TextBlock> {
        let styled = parse_markup(markup)?;
        let lines = styled
            .lines
            .iter()
            .map(|line| {
                let runs: Vec<_> = line.iter().map(|r| font.resolve(r)).collect();
                self.layout_line(&runs, font)
            })
            .collect();
        let block = assemble(lines, alignment);
        log::trace!(width = block.width.raw(), height = block.height.raw(), "metric text layout");
        Ok(block)
    }
}

// ============================================================================
// Shaped engine
// ============================================================================

/// Glyph-accurate layout through usvg's text shaping
#[derive(Clone)]
pub struct ShapedTextLayout {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl fmt::Debug for ShapedTextLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapedTextLayout").field("faces", &self.fontdb.len()).finish()
    }
}

impl ShapedTextLayout {
    pub fn new(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { fontdb }
    }

    /// Layout against the fonts installed on this machine
    pub fn system() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        log::debug!(faces = db.len(), "loaded system fonts");
        Self::new(Arc::new(db))
    }

    /// Layout against in-memory font files only
    pub fn from_font_data(fonts: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        for data in fonts {
            db.load_font_data(data);
        }
        Self::new(Arc::new(db))
    }

    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }
}

/// Build a one-`<text>`-per-line SVG document for usvg to shape
fn shaping_document(lines: &[Vec<ResolvedRun<'_>>], font: &LabelFont) -> (String, Vec<(Length, Length)>) {
    let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1">"#);
    let mut metrics = Vec::with_capacity(lines.len());
    for (i, runs) in lines.iter().enumerate() {
        let (height, baseline) = line_metrics(runs, font);
        metrics.push((height, baseline));
        if runs.iter().all(|r| r.text.is_empty()) {
            continue;
        }
        // Each line is shaped at y = baseline and shifted to its slot later
        svg.push_str(&format!(r#"<text id="line{i}" x="0" y="{}" xml:space="preserve">"#, baseline.raw()));
        for run in runs {
            svg.push_str(&format!(
                r#"<tspan font-family="'{}', {}" font-size="{}" font-weight="{}" font-style="{}" letter-spacing="{}">{}</tspan>"#,
                escape_xml(run.family),
                defaults::FALLBACK_FAMILY,
                run.size.raw(),
                run.weight.0,
                if run.italic { "italic" } else { "normal" },
                run.letter_spacing.raw(),
                escape_xml(run.text),
            ));
        }
        svg.push_str("</text>");
    }
    svg.push_str("</svg>");
    (svg, metrics)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

impl TextLayout for ShapedTextLayout {
    fn layout(&self, markup: &str, font: &LabelFont, alignment: Alignment) -> Result<TextBlock> {
        let styled = parse_markup(markup)?;
        let lines: Vec<Vec<ResolvedRun<'_>>> = styled
            .lines
            .iter()
            .map(|line| line.iter().map(|r| font.resolve(r)).collect())
            .collect();
        let (svg, metrics) = shaping_document(&lines, font);

        let mut options = usvg::Options::default();
        options.fontdb = self.fontdb.clone();
        options.font_family = font.family.clone();
        let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| Error::TextLayout { message: e.to_string() })?;

        let mut boxes = Vec::with_capacity(lines.len());
        for (i, (runs, (height, _))) in lines.iter().zip(metrics).enumerate() {
            if runs.iter().all(|r| r.text.is_empty()) {
                boxes.push(LineBox { width: Length::ZERO, height, outline: Outline::new() });
                continue;
            }
            let outline = match tree.node_by_id(&format!("line{i}")) {
                Some(usvg::Node::Text(text)) => Outline::from_usvg(text.flattened()).inked(),
                _ => Outline::new(),
            };
            let has_ink = runs.iter().any(|r| r.text.chars().any(|c| !c.is_whitespace()));
            if outline.is_empty() && has_ink {
                return Err(Error::TextLayout {
                    message: format!("no installed font could shape line {} of {:?}", i + 1, styled.plain_text()),
                });
            }
            let width = outline.bounds().max.x.max(Length::ZERO);
            boxes.push(LineBox { width, height, outline });
        }

        let block = assemble(boxes, alignment);
        log::debug!(width = block.width.raw(), height = block.height.raw(), lines = block.line_count, "shaped text layout");
        Ok(block)
    }
}
