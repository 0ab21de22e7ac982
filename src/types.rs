//! Strongly-typed numeric primitives for canvas geometry (zero-cost newtypes).
//!
//! Design goals:
//! - No raw `f64` in layout logic
//! - One canonical unit (points) for all arithmetic
//! - Conversions from other physical units only through named constructors

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value is negative when positive required
    Negative,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Negative => write!(f, "value is negative"),
        }
    }
}

impl std::error::Error for NumericError {}

const PT_PER_PX: f64 = 0.75;
const PT_PER_INCH: f64 = 72.0;
const PT_PER_MM: f64 = 72.0 / 25.4;
const PANGO_SCALE: f64 = 1024.0;

/// Canvas length in points (1/72 inch), the canonical unit.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
#[repr(transparent)]
pub struct Length(pub f64);

impl Length {
    pub const ZERO: Length = Length(0.0);

    /// Length in points (const-friendly, unchecked).
    #[inline]
    pub const fn pt(val: f64) -> Length {
        Length(val)
    }

    /// Length in CSS pixels (96 per inch).
    #[inline]
    pub const fn px(val: f64) -> Length {
        Length(val * PT_PER_PX)
    }

    #[inline]
    pub const fn inches(val: f64) -> Length {
        Length(val * PT_PER_INCH)
    }

    #[inline]
    pub const fn mm(val: f64) -> Length {
        Length(val * PT_PER_MM)
    }

    #[inline]
    pub const fn cm(val: f64) -> Length {
        Length(val * PT_PER_MM * 10.0)
    }

    /// Length in pango units (1/1024 point).
    #[inline]
    pub const fn pango(val: f64) -> Length {
        Length(val / PANGO_SCALE)
    }

    /// Create a Length with validation (rejects NaN/infinite)
    #[inline]
    pub fn try_new(val: f64) -> Result<Length, NumericError> {
        if val.is_nan() {
            Err(NumericError::NaN)
        } else if val.is_infinite() {
            Err(NumericError::Infinite)
        } else {
            Ok(Length(val))
        }
    }

    /// Create a non-negative Length with validation
    #[inline]
    pub fn try_non_negative(val: f64) -> Result<Length, NumericError> {
        let len = Length::try_new(val)?;
        if len.0 < 0.0 {
            Err(NumericError::Negative)
        } else {
            Ok(len)
        }
    }

    /// Value in CSS pixels
    #[inline]
    pub fn to_px(self) -> f64 {
        self.0 / PT_PER_PX
    }

    #[inline]
    pub fn abs(self) -> Length {
        Length(self.0.abs())
    }

    #[inline]
    pub fn min(self, other: Length) -> Length {
        Length(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Length) -> Length {
        Length(self.0.max(other.0))
    }

    /// Get the raw value in points (use sparingly, prefer typed operations)
    #[inline]
    pub fn raw(self) -> f64 {
        self.0
    }

    /// Check if this length is finite (not NaN or infinite)
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Length { Length(self.0 + rhs.0) }
}
impl Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Length { Length(self.0 - rhs.0) }
}
impl Mul<f64> for Length {
    type Output = Length;
    fn mul(self, rhs: f64) -> Length { Length(self.0 * rhs) }
}
impl Div<f64> for Length {
    type Output = Length;
    fn div(self, rhs: f64) -> Length { Length(self.0 / rhs) }
}

impl Neg for Length {
    type Output = Length;
    fn neg(self) -> Length { Length(-self.0) }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pt", self.0)
    }
}

impl AddAssign for Length {
    fn add_assign(&mut self, rhs: Length) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Length {
    fn sub_assign(&mut self, rhs: Length) {
        self.0 -= rhs.0;
    }
}

/// Angle in degrees, clockwise on a y-down canvas
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Angle(pub f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn radians(self) -> f64 {
        self.0.to_radians()
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}deg", self.0)
    }
}

/// Straight RGBA color, channels in 0..=1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Color {
        Color { r, g, b, a }
    }

    /// Build from 8-bit channels, as palettes are usually written.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Color {
        Color::rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    pub fn with_alpha(self, a: f64) -> Color {
        Color { a, ..self }
    }

    /// Channels quantized to 8 bits (clamped)
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            write!(f, "rgb({},{},{})", r, g, b)
        } else {
            write!(f, "rgba({},{},{},{})", r, g, b, a)
        }
    }
}

/// Generic 2D point
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self { Point { x, y } }
}

impl Point<Length> {
    /// Point from raw point values
    pub const fn pt(x: f64, y: f64) -> Self {
        Point { x: Length(x), y: Length(y) }
    }

    /// Point from CSS pixel values
    pub const fn px(x: f64, y: f64) -> Self {
        Point { x: Length::px(x), y: Length::px(y) }
    }

    pub fn to_dvec2(self) -> glam::DVec2 {
        glam::dvec2(self.x.0, self.y.0)
    }

    pub fn from_dvec2(v: glam::DVec2) -> Self {
        Point::pt(v.x, v.y)
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size<T> {
    pub w: T,
    pub h: T,
}

impl<T> Size<T> {
    pub fn new(w: T, h: T) -> Self { Size { w, h } }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox<T> {
    pub min: Point<T>,
    pub max: Point<T>,
}

impl Default for BBox<Length> {
    fn default() -> Self {
        Self::new()
    }
}

impl BBox<Length> {
    /// Create an empty bounding box (will expand on first point)
    pub fn new() -> Self {
        BBox {
            min: Point { x: Length(f64::MAX), y: Length(f64::MAX) },
            max: Point { x: Length(f64::MIN), y: Length(f64::MIN) },
        }
    }

    /// Box spanning two corners in any order
    pub fn from_corners(a: Point<Length>, b: Point<Length>) -> Self {
        let mut bb = Self::new();
        bb.expand_point(a);
        bb.expand_point(b);
        bb
    }

    /// Box with its top-left corner at `origin`
    pub fn from_origin_size(origin: Point<Length>, size: Size<Length>) -> Self {
        BBox {
            min: origin,
            max: Point { x: origin.x + size.w, y: origin.y + size.h },
        }
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x.0 > self.max.x.0 || self.min.y.0 > self.max.y.0
    }

    /// Expand to include a point
    pub fn expand_point(&mut self, p: Point<Length>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Expand to include another box. Empty boxes are ignored.
    pub fn union(&mut self, other: &BBox<Length>) {
        if other.is_empty() {
            return;
        }
        self.expand_point(other.min);
        self.expand_point(other.max);
    }

    pub fn width(&self) -> Length { self.max.x - self.min.x }

    pub fn height(&self) -> Length { self.max.y - self.min.y }

    pub fn size(&self) -> Size<Length> {
        Size { w: self.width(), h: self.height() }
    }

    pub fn center(&self) -> Point<Length> {
        Point {
            x: (self.min.x + self.max.x) / 2.0,
            y: (self.min.y + self.max.y) / 2.0,
        }
    }

    pub fn top_right(&self) -> Point<Length> {
        Point { x: self.max.x, y: self.min.y }
    }

    pub fn translated(&self, offset: Offset<Length>) -> Self {
        if self.is_empty() {
            return *self;
        }
        BBox { min: self.min + offset, max: self.max + offset }
    }

    /// Whether `other` lies entirely inside this box (edges included)
    pub fn contains(&self, other: &BBox<Length>) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }
}

/// A displacement/offset vector (not an absolute position)
/// Use this for translations; Point + Offset = Point
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Offset<T> {
    pub dx: T,
    pub dy: T,
}

impl<T> Offset<T> {
    pub fn new(dx: T, dy: T) -> Self {
        Offset { dx, dy }
    }
}

impl Offset<Length> {
    pub const ZERO: Offset<Length> = Offset { dx: Length::ZERO, dy: Length::ZERO };

    pub const fn pt(dx: f64, dy: f64) -> Self {
        Offset { dx: Length(dx), dy: Length(dy) }
    }

    pub const fn px(dx: f64, dy: f64) -> Self {
        Offset { dx: Length::px(dx), dy: Length::px(dy) }
    }
}

impl Neg for Offset<Length> {
    type Output = Offset<Length>;
    fn neg(self) -> Offset<Length> {
        Offset { dx: -self.dx, dy: -self.dy }
    }
}

/// Add an offset to a point to get a new point
impl Add<Offset<Length>> for Point<Length> {
    type Output = Point<Length>;
    fn add(self, rhs: Offset<Length>) -> Point<Length> {
        Point {
            x: self.x + rhs.dx,
            y: self.y + rhs.dy,
        }
    }
}

/// Subtract two points to get an offset
impl Sub<Point<Length>> for Point<Length> {
    type Output = Offset<Length>;
    fn sub(self, rhs: Point<Length>) -> Offset<Length> {
        Offset {
            dx: self.x - rhs.x,
            dy: self.y - rhs.y,
        }
    }
}

/// Canvas aliases
pub type CanvasPoint = Point<Length>;
pub type CanvasOffset = Offset<Length>;
pub type CanvasSize = Size<Length>;
pub type BoundingBox = BBox<Length>;
