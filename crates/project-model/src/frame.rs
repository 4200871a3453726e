//! Output frame geometry and pixel rectangles.

use serde::{Deserialize, Serialize};

/// Coarse aspect classification used for caption placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectClass {
    /// Wider than tall (e.g. 16:9).
    Landscape,
    /// Taller than wide (e.g. 9:16).
    Portrait,
    /// Equal sides (1:1).
    Square,
}

impl AspectClass {
    /// Classify a width/height pair.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        match width.cmp(&height) {
            std::cmp::Ordering::Greater => AspectClass::Landscape,
            std::cmp::Ordering::Less => AspectClass::Portrait,
            std::cmp::Ordering::Equal => AspectClass::Square,
        }
    }
}

/// Output frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    pub aspect: AspectClass,
}

impl FrameGeometry {
    /// Frame with the aspect class derived from its dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            aspect: AspectClass::from_dimensions(width, height),
        }
    }

    /// 1920x1080.
    pub fn landscape_hd() -> Self {
        Self::new(1920, 1080)
    }

    /// 1080x1920.
    pub fn portrait_hd() -> Self {
        Self::new(1080, 1920)
    }
}

/// Axis-aligned rectangle in output pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Whether this rectangle lies entirely within a frame.
    pub fn fits_within(&self, frame: &FrameGeometry) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= frame.width as f64
            && self.bottom() <= frame.height as f64
    }
}
