//! Mapping between viewport pixels and image-space pixels.
//!
//! Marks always store image-space coordinates. Only the rendered position is
//! derived from the current zoom, so a mark stays on the same image feature
//! no matter how often the zoom changes.

use egui::{Pos2, Vec2};

/// Zoom increment applied by a single zoom in / zoom out step.
pub const ZOOM_STEP: f32 = 0.1;
/// Lowest zoom factor reachable by zooming out.
pub const ZOOM_MIN: f32 = 0.2;

/// Convert a pointer position to image space.
///
/// `image_origin` is where the image's top-left corner currently sits in the
/// viewport.
pub fn to_image_space(pointer: Pos2, image_origin: Pos2, zoom: f32) -> Pos2 {
    ((pointer - image_origin) / zoom).to_pos2()
}

/// Scale an image-space coordinate to its on-screen offset from the image origin.
pub fn to_screen_space(image_pos: Pos2, zoom: f32) -> Pos2 {
    (image_pos.to_vec2() * zoom).to_pos2()
}

/// Native pixel dimensions of the loaded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether an image-space position falls on the image.
    pub fn contains(&self, pos: Pos2) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x < self.width as f32 && pos.y < self.height as f32
    }

    /// Size of the rendered image at the given zoom.
    pub fn on_screen(&self, zoom: f32) -> Vec2 {
        to_screen_space(egui::pos2(self.width as f32, self.height as f32), zoom).to_vec2()
    }
}

/// Stepped zoom factor with a floor and no ceiling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Zoom {
    factor: f32,
    step: f32,
    min: f32,
}

impl Zoom {
    /// Non-positive or non-finite step and floor fall back to
    /// [`ZOOM_STEP`] and [`ZOOM_MIN`].
    pub fn new(step: f32, min: f32) -> Self {
        let step = positive_or(step, ZOOM_STEP, "zoom step");
        let min = positive_or(min, ZOOM_MIN, "zoom floor");
        Self {
            factor: 1.0_f32.max(min),
            step,
            min,
        }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn zoom_in(&mut self) {
        self.factor += self.step;
    }

    pub fn zoom_out(&mut self) {
        self.factor = (self.factor - self.step).max(self.min);
    }

    pub fn reset(&mut self) {
        self.factor = 1.0_f32.max(self.min);
    }

    /// Zoom factor as a whole percentage, for display.
    pub fn percent(&self) -> u32 {
        (self.factor * 100.0).round() as u32
    }
}

fn positive_or(value: f32, fallback: f32, what: &str) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("Invalid {} {}, using {}", what, value, fallback);
        fallback
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self::new(ZOOM_STEP, ZOOM_MIN)
    }
}
