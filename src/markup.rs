//! Parse label markup into styled lines of text runs.
//!
//! The accepted subset is what map labels actually use: `\n` line breaks,
//! `<span>` with `size`, `weight`, `style`, `face` and `letter_spacing`,
//! `<b>`/`<i>` shorthands and the five XML entities plus numeric ones.

use miette::{NamedSource, SourceSpan};
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::errors::{Error, Result};
use crate::log;
use crate::types::Length;

#[derive(Parser)]
#[grammar = "markup.pest"]
struct MarkupParser;

/// Font weight on the CSS 100..=900 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Weight(pub u16);

impl Weight {
    pub const NORMAL: Weight = Weight(400);
    pub const MEDIUM: Weight = Weight(500);
    pub const BOLD: Weight = Weight(700);

    fn parse(value: &str) -> Option<Weight> {
        match value.to_ascii_lowercase().as_str() {
            "thin" => Some(Weight(100)),
            "ultralight" => Some(Weight(200)),
            "light" => Some(Weight(300)),
            "normal" | "book" => Some(Weight::NORMAL),
            "medium" => Some(Weight::MEDIUM),
            "semibold" => Some(Weight(600)),
            "bold" => Some(Weight::BOLD),
            "ultrabold" => Some(Weight(800)),
            "heavy" => Some(Weight(900)),
            other => other
                .parse::<u16>()
                .ok()
                .filter(|w| (100..=1000).contains(w))
                .map(Weight),
        }
    }
}

/// Font size override carried by a span
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    /// Multiplier of the enclosing size (`size="80%"`)
    Relative(f64),
    /// Absolute size (`size="12pt"` or a bare pango-unit integer)
    Absolute(Length),
}

/// Style overrides accumulated from enclosing spans. `None` inherits the
/// label's base font.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStyle {
    pub family: Option<String>,
    pub weight: Option<Weight>,
    pub italic: bool,
    /// Sizes applied outermost first
    pub sizes: Vec<FontSize>,
    pub letter_spacing: Option<Length>,
}

impl RunStyle {
    /// Resolve the effective size against a base size
    pub fn resolve_size(&self, base: Length) -> Length {
        self.sizes.iter().fold(base, |size, s| match s {
            FontSize::Relative(scale) => size * *scale,
            FontSize::Absolute(abs) => *abs,
        })
    }
}

/// A run of text sharing one style
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

/// Parsed label: one entry per line, each a sequence of runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledText {
    pub lines: Vec<Vec<Run>>,
}

impl StyledText {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The label with markup stripped, lines joined by `\n`
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|r| r.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push_text(&mut self, text: &str, style: &RunStyle) {
        let run = Run { text: text.to_string(), style: style.clone() };
        let Some(line) = self.lines.last_mut() else {
            self.lines.push(vec![run]);
            return;
        };
        match line.last_mut() {
            Some(last) if last.style == *style => last.text.push_str(text),
            _ => line.push(run),
        }
    }

    fn break_line(&mut self) {
        self.lines.push(Vec::new());
    }
}

/// Parse label markup into styled lines.
///
/// An empty string yields a single empty line, so every label has at least
/// one line for vertical centering.
pub fn parse_markup(source: &str) -> Result<StyledText> {
    let pairs = MarkupParser::parse(Rule::markup, source).map_err(|e| {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        markup_error(source, e.variant.message().into_owned(), start, end - start)
    })?;

    let mut out = StyledText { lines: vec![Vec::new()] };
    let root_style = RunStyle::default();
    for pair in pairs {
        if pair.as_rule() == Rule::markup {
            for inner in pair.into_inner() {
                parse_node(source, inner, &root_style, &mut out)?;
            }
        }
    }

    log::trace!(lines = out.line_count(), "parsed label markup");
    Ok(out)
}

fn parse_node(source: &str, pair: Pair<Rule>, style: &RunStyle, out: &mut StyledText) -> Result<()> {
    match pair.as_rule() {
        Rule::text => out.push_text(pair.as_str(), style),
        Rule::newline => out.break_line(),
        Rule::entity => {
            let decoded = decode_entity(pair.as_str()).ok_or_else(|| {
                let span = pair.as_span();
                markup_error(source, format!("unknown entity {}", pair.as_str()), span.start(), span.end() - span.start())
            })?;
            out.push_text(&decoded.to_string(), style);
        }
        Rule::bold => {
            let inner_style = RunStyle { weight: Some(Weight::BOLD), ..style.clone() };
            for child in pair.into_inner() {
                parse_node(source, child, &inner_style, out)?;
            }
        }
        Rule::italic => {
            let inner_style = RunStyle { italic: true, ..style.clone() };
            for child in pair.into_inner() {
                parse_node(source, child, &inner_style, out)?;
            }
        }
        Rule::span => {
            let mut inner_style = style.clone();
            for child in pair.into_inner() {
                if child.as_rule() == Rule::attribute {
                    apply_attribute(source, child, &mut inner_style)?;
                } else {
                    parse_node(source, child, &inner_style, out)?;
                }
            }
        }
        Rule::EOI => {}
        other => {
            let span = pair.as_span();
            return Err(markup_error(source, format!("unexpected {:?}", other), span.start(), span.end() - span.start()));
        }
    }
    Ok(())
}

fn apply_attribute(source: &str, pair: Pair<Rule>, style: &mut RunStyle) -> Result<()> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let name = inner.next().map(|p| p.as_str()).unwrap_or_default();
    let value = inner.next().map(|p| p.as_str()).unwrap_or_default();
    let invalid = |what: &str| {
        markup_error(
            source,
            format!("invalid {what} {value:?}"),
            span.start(),
            span.end() - span.start(),
        )
    };

    match name {
        "size" | "font_size" => style.sizes.push(parse_size(value).ok_or_else(|| invalid("size"))?),
        "weight" | "font_weight" => {
            style.weight = Some(Weight::parse(value).ok_or_else(|| invalid("weight"))?)
        }
        "style" | "font_style" => match value {
            "italic" | "oblique" => style.italic = true,
            "normal" => style.italic = false,
            _ => return Err(invalid("style")),
        },
        "face" | "font_family" | "font" => style.family = Some(value.to_string()),
        "letter_spacing" => {
            let units: f64 = value.parse().map_err(|_| invalid("letter spacing"))?;
            style.letter_spacing = Some(Length::pango(units));
        }
        _ => {
            return Err(markup_error(
                source,
                format!("unsupported span attribute `{name}`"),
                span.start(),
                span.end() - span.start(),
            ));
        }
    }
    Ok(())
}

fn parse_size(value: &str) -> Option<FontSize> {
    let value = value.trim();
    if let Some(pct) = value.strip_suffix('%') {
        let pct: f64 = pct.trim().parse().ok()?;
        return (pct.is_finite() && pct > 0.0).then_some(FontSize::Relative(pct / 100.0));
    }
    if let Some(pt) = value.strip_suffix("pt") {
        let pt: f64 = pt.trim().parse().ok()?;
        return Length::try_non_negative(pt).ok().map(FontSize::Absolute);
    }
    match value {
        "smaller" => Some(FontSize::Relative(1.0 / 1.2)),
        "larger" => Some(FontSize::Relative(1.2)),
        // Bare integers are pango units, as in `size="10240"`
        _ => value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| FontSize::Absolute(Length::pango(v))),
    }
}

fn decode_entity(entity: &str) -> Option<char> {
    let body = entity.strip_prefix('&')?.strip_suffix(';')?;
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = body.strip_prefix('#')?.parse::<u32>().ok()?;
            char::from_u32(code)
        }
    }
}

fn markup_error(source: &str, message: String, offset: usize, len: usize) -> Error {
    Error::Markup {
        message,
        src: NamedSource::new("<label>", source.to_string()),
        span: SourceSpan::new(offset.into(), len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_label() {
        let text = parse_markup("Portobelo").unwrap();
        assert_eq!(text.line_count(), 1);
        assert_eq!(text.lines[0].len(), 1);
        assert_eq!(text.lines[0][0].text, "Portobelo");
        assert_eq!(text.lines[0][0].style, RunStyle::default());
    }

    #[test]
    fn parse_empty_label_has_one_line() {
        let text = parse_markup("").unwrap();
        assert_eq!(text.line_count(), 1);
        assert!(text.lines[0].is_empty());
    }

    #[test]
    fn parse_city_with_founding_year() {
        let text = parse_markup("New Caledonia\n<span size=\"80%\">Est. 1698</span>").unwrap();
        assert_eq!(text.line_count(), 2);
        assert_eq!(text.lines[1][0].text, "Est. 1698");
        assert_eq!(text.lines[1][0].style.sizes, vec![FontSize::Relative(0.8)]);
        assert_eq!(text.plain_text(), "New Caledonia\nEst. 1698");
    }

    #[test]
    fn parse_nested_spans_accumulate_sizes() {
        let text = parse_markup("<span size=\"50%\"><span size=\"50%\">tiny</span></span>").unwrap();
        let style = &text.lines[0][0].style;
        assert_eq!(style.resolve_size(Length::pt(10.0)), Length::pt(2.5));
    }

    #[test]
    fn parse_span_attributes() {
        let text = parse_markup(
            "<span face=\"SF Pro Rounded\" weight=\"Medium\" size=\"10pt\" letter_spacing=\"-600\">x</span>",
        )
        .unwrap();
        let style = &text.lines[0][0].style;
        assert_eq!(style.family.as_deref(), Some("SF Pro Rounded"));
        assert_eq!(style.weight, Some(Weight::MEDIUM));
        assert_eq!(style.resolve_size(Length::pt(99.0)), Length::pt(10.0));
        assert_eq!(style.letter_spacing, Some(Length::pango(-600.0)));
    }

    #[test]
    fn parse_bold_and_italic_shorthands() {
        let text = parse_markup("<b>Spanish</b> <i>Empire</i>").unwrap();
        let runs = &text.lines[0];
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].style.weight, Some(Weight::BOLD));
        assert_eq!(runs[1].text, " ");
        assert!(runs[2].style.italic);
    }

    #[test]
    fn parse_entities_merge_into_adjacent_run() {
        let text = parse_markup("Trinidad &amp; Tobago &#8212; 1962").unwrap();
        assert_eq!(text.lines[0].len(), 1);
        assert_eq!(text.lines[0][0].text, "Trinidad & Tobago \u{2014} 1962");
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let err = parse_markup("a &bogus; b").unwrap_err();
        assert!(matches!(err, Error::Markup { .. }));
    }

    #[test]
    fn unterminated_span_is_rejected() {
        let err = parse_markup("<span size=\"80%\">Est. 1698").unwrap_err();
        assert!(matches!(err, Error::Markup { .. }));
    }

    #[test]
    fn unsupported_attribute_reports_span() {
        let err = parse_markup("<span color=\"red\">x</span>").unwrap_err();
        match err {
            Error::Markup { message, span, .. } => {
                assert!(message.contains("color"), "{message}");
                assert_eq!(span.offset(), 5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn size_keywords_and_pango_units() {
        assert_eq!(parse_size("larger"), Some(FontSize::Relative(1.2)));
        assert_eq!(parse_size("10240"), Some(FontSize::Absolute(Length::pt(10.0))));
        assert_eq!(parse_size("-5%"), None);
        assert_eq!(parse_size("big"), None);
    }

    #[test]
    fn weight_names_and_numbers() {
        assert_eq!(Weight::parse("Bold"), Some(Weight::BOLD));
        assert_eq!(Weight::parse("650"), Some(Weight(650)));
        assert_eq!(Weight::parse("50"), None);
    }
}
