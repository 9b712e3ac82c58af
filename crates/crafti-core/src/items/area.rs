//! Area items: everything with a box of its own (`size`).

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Rectangle (and diamond) payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub size: Size,
    /// Corner radius (0 = sharp corners). Ignored for diamonds.
    #[serde(default)]
    pub border_radius: f64,
}

impl Rectangle {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            border_radius: 0.0,
        }
    }
}

/// Ellipse inscribed in its box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontEffect {
    #[default]
    Normal,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

/// A text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub size: Size,
    pub text: String,
    #[serde(default)]
    pub text_align: TextAlign,
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub font_effect: FontEffect,
    #[serde(default)]
    pub font_decoration: FontDecoration,
}

fn default_font_family() -> String {
    "Arial".to_string()
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    pub fn new(size: Size, text: impl Into<String>) -> Self {
        Self {
            size,
            text: text.into(),
            text_align: TextAlign::default(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: default_font_family(),
            font_effect: FontEffect::default(),
            font_decoration: FontDecoration::default(),
        }
    }
}

/// Reference to an image held in the user's library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryImage {
    pub id: u64,
    pub name: String,
    /// Data URL or remote URL of the image content.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub size: Size,
    #[serde(default)]
    pub border_radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<LibraryImage>,
}

/// One line of a custom item's tooltip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipLine {
    pub text: String,
    #[serde(default)]
    pub text_align: TextAlign,
    pub font_size: f64,
}

/// A user-defined entity: an image plus tooltip metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Custom {
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<LibraryImage>,
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<TooltipLine>,
    #[serde(default)]
    pub lore: Vec<TooltipLine>,
    #[serde(default)]
    pub show_tooltip: bool,
}

impl Custom {
    pub fn new(size: Size, entity: impl Into<String>) -> Self {
        Self {
            size,
            image: None,
            entity: entity.into(),
            display_name: None,
            lore: Vec::new(),
            show_tooltip: false,
        }
    }
}
