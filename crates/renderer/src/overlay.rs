use crate::types::{OverlayAnchor, ViewportSize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverlayError {
    #[error("overlay image has no pixels")]
    Empty,
    #[error("overlay image is {width}x{height}, the GPU accepts at most {max}x{max}")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Rejects images the device cannot hold in a single 2D texture.
pub fn fits_texture(image: (u32, u32), max_dimension: u32) -> Result<(), OverlayError> {
    let (width, height) = image;
    if width == 0 || height == 0 {
        return Err(OverlayError::Empty);
    }
    if width > max_dimension || height > max_dimension {
        return Err(OverlayError::TooLarge {
            width,
            height,
            max: max_dimension,
        });
    }
    Ok(())
}

/// Overlay placement in physical pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl OverlayRect {
    /// Fits an image to the viewport height, preserving its aspect ratio.
    pub fn place(anchor: OverlayAnchor, image: (u32, u32), viewport: ViewportSize) -> Self {
        let height = viewport.height as f32;
        let width = if image.1 == 0 {
            0.0
        } else {
            image.0 as f32 * height / image.1 as f32
        };
        let x = match anchor {
            OverlayAnchor::Center => (viewport.width as f32 - width) / 2.0,
            OverlayAnchor::TopLeft => 0.0,
        };
        Self {
            x,
            y: 0.0,
            width,
            height,
        }
    }

    /// Clip-space `[left, bottom, right, top]` for the overlay vertex stage.
    pub fn to_clip_space(&self, viewport: ViewportSize) -> [f32; 4] {
        let w = viewport.width.max(1) as f32;
        let h = viewport.height.max(1) as f32;
        let left = self.x / w * 2.0 - 1.0;
        let right = (self.x + self.width) / w * 2.0 - 1.0;
        let top = 1.0 - self.y / h * 2.0;
        let bottom = 1.0 - (self.y + self.height) / h * 2.0;
        [left, bottom, right, top]
    }
}
