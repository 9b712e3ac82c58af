//! Board-level settings: grid, snapping and presentation.

use crate::items::Item;
use crate::snap::snap_point;
use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// Per-board configuration persisted with the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardSettings {
    pub id: Option<String>,
    pub name: String,
    pub enable_grid: bool,
    /// Round gesture positions to `snap_increment`.
    pub snap_to_grid: bool,
    pub grid_spacing: f64,
    pub sub_grid_spacing: f64,
    pub snap_increment: f64,
    pub show_items: bool,
    pub theme: Theme,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            id: None,
            name: "New Board".to_string(),
            enable_grid: true,
            snap_to_grid: false,
            grid_spacing: 100.0,
            sub_grid_spacing: 20.0,
            snap_increment: 5.0,
            show_items: false,
            theme: Theme::System,
        }
    }
}

impl BoardSettings {
    /// Apply grid snapping if it is enabled for this board.
    pub fn snap(&self, point: Point) -> Point {
        snap_point(point, self.snap_to_grid, self.snap_increment).point
    }
}

/// How the current user may interact with the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardMode {
    #[default]
    Editor,
    Viewer,
    Commenter,
}

/// Board payload handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardInfo {
    pub board: BoardSettings,
    #[serde(default)]
    pub mode: BoardMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_only_when_enabled() {
        let mut board = BoardSettings::default();
        let p = Point::new(12.0, 13.0);
        assert_eq!(board.snap(p), p);
        board.snap_to_grid = true;
        assert_eq!(board.snap(p), Point::new(10.0, 15.0));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let board: BoardSettings = serde_json::from_str(r#"{"snapToGrid": true, "theme": "dark"}"#).unwrap();
        assert!(board.snap_to_grid);
        assert_eq!(board.theme, Theme::Dark);
        assert!((board.snap_increment - 5.0).abs() < f64::EPSILON);
        assert_eq!(board.name, "New Board");
    }
}
