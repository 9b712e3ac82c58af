//! Stroke and fill styling carried by every item.

use peniko::Color;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Serializable color representation (RGBA8).
///
/// On the wire this is a CSS-style hex string: `#rrggbb` when fully
/// opaque, `#rrggbbaa` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ItemColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(digits.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::new(out[0], out[1], out[2], 255))
            }
            6 => Some(Self::new(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
                255,
            )),
            8 => Some(Self::new(
                channel(digits.get(0..2)?)?,
                channel(digits.get(2..4)?)?,
                channel(digits.get(4..6)?)?,
                channel(digits.get(6..8)?)?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for ItemColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<ItemColor> for Color {
    fn from(color: ItemColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

impl Serialize for ItemColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ItemColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = ItemColor;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a hex color string such as #1e293b")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ItemColor, E> {
                ItemColor::from_hex(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

/// Stroke dash style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Dash pattern handed to the render layer (empty = continuous).
    pub fn dash_pattern(self) -> &'static [f64] {
        match self {
            StrokeStyle::Solid => &[],
            StrokeStyle::Dashed => &[15.0, 15.0],
            StrokeStyle::Dotted => &[5.0, 5.0],
        }
    }
}

/// Stroke and fill flags plus values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStyle {
    /// Whether the item supports a stroke at all.
    pub is_strokeable: bool,
    #[serde(default = "default_true")]
    pub is_stroke_enabled: bool,
    pub stroke_color: ItemColor,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    /// Whether the item supports a fill at all.
    pub is_fillable: bool,
    #[serde(default)]
    pub is_fill_enabled: bool,
    pub fill_color: ItemColor,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_true() -> bool {
    true
}

fn default_stroke_width() -> f64 {
    1.0
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for ItemStyle {
    fn default() -> Self {
        Self {
            is_strokeable: true,
            is_stroke_enabled: true,
            stroke_color: ItemColor::black(),
            stroke_width: 1.0,
            stroke_style: StrokeStyle::Solid,
            is_fillable: true,
            is_fill_enabled: false,
            fill_color: ItemColor::white(),
            opacity: 1.0,
        }
    }
}

impl ItemStyle {
    /// Effective stroke color, or `None` when stroking is off.
    pub fn stroke(&self) -> Option<Color> {
        (self.is_strokeable && self.is_stroke_enabled).then(|| self.with_opacity(self.stroke_color))
    }

    /// Effective fill color, or `None` when filling is off.
    pub fn fill(&self) -> Option<Color> {
        (self.is_fillable && self.is_fill_enabled).then(|| self.with_opacity(self.fill_color))
    }

    fn with_opacity(&self, color: ItemColor) -> Color {
        let alpha = (color.a as f64 * self.opacity.clamp(0.0, 1.0)) as u8;
        Color::from_rgba8(color.r, color.g, color.b, alpha)
    }
}
