//! Screen geometry and HUD placement
//!
//! The host lays out its widgets in pixels; the core needs them in the
//! normalised space the sprites live in (x in [-1, 1], y in [-ratio, ratio]).

use std::collections::HashMap;

use glam::Vec2;

/// HUD widgets whose rectangles the host reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HudElement {
    /// Small asteroid icon next to the score
    ObstacleIcon,
    /// Score counter text
    ObstacleCounter,
}

/// Axis-aligned rectangle in screen pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PixelRect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Swap inverted edges and zero out non-finite ones
    pub fn normalized(self) -> Self {
        let fix = |v: f32| if v.is_finite() { v } else { 0.0 };
        let (l, r) = (fix(self.left), fix(self.right));
        let (t, b) = (fix(self.top), fix(self.bottom));
        Self {
            left: l.min(r),
            right: l.max(r),
            top: t.min(b),
            bottom: t.max(b),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.left.is_finite()
            && self.right.is_finite()
            && self.top.is_finite()
            && self.bottom.is_finite())
            || self.right < self.left
            || self.bottom < self.top
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

/// Widget rectangles keyed by HUD element
pub type ViewportLayout = HashMap<HudElement, PixelRect>;

/// Current surface size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
    /// height / width
    pub ratio: f32,
}

impl Screen {
    /// Zero-sized surfaces are clamped to one pixel
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1) as f32;
        let height = height.max(1) as f32;
        Self {
            width,
            height,
            ratio: height / width,
        }
    }

    /// Pixel point to sprite space
    pub fn to_ndc(&self, px: f32, py: f32) -> Vec2 {
        let x = px / self.width * 2.0 - 1.0;
        let y = -(py / self.height * 2.0 * self.ratio - self.ratio);
        Vec2::new(x, y)
    }

    /// Rectangle center in sprite space
    pub fn rect_center(&self, rect: &PixelRect) -> Vec2 {
        let rect = checked(rect);
        let c = rect.center();
        self.to_ndc(c.x, c.y)
    }

    /// Bottom-left corner of a rectangle in sprite space
    pub fn rect_anchor(&self, rect: &PixelRect) -> Vec2 {
        let rect = checked(rect);
        self.to_ndc(rect.left, rect.bottom)
    }

    /// Half-extents of a rectangle in sprite space (unit quads span [-1, 1])
    pub fn rect_scale(&self, rect: &PixelRect) -> Vec2 {
        let rect = checked(rect);
        self.pixel_scale(rect.width(), rect.height())
    }

    /// Half-extents for an image of the given pixel size
    pub fn pixel_scale(&self, width: f32, height: f32) -> Vec2 {
        Vec2::new(width / self.width, height / self.width)
    }
}

fn checked(rect: &PixelRect) -> PixelRect {
    if rect.is_degenerate() {
        log::warn!("Degenerate layout rectangle {:?} clamped", rect);
    }
    rect.normalized()
}
