//! Viewport geometry for the scaling contract.

/// Reference design width the deck markup is authored against, in
/// device-independent units.
pub const REFERENCE_WIDTH: u32 = 1280;
/// Reference design height the deck markup is authored against.
pub const REFERENCE_HEIGHT: u32 = 720;

/// Viewport dimensions reported by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Uniform scale factor fitting the reference frame inside the viewport:
/// `min(width / 1280, height / 720)`.
pub fn scale_factor(viewport: Size) -> f64 {
    let horizontal = viewport.width as f64 / REFERENCE_WIDTH as f64;
    let vertical = viewport.height as f64 / REFERENCE_HEIGHT as f64;
    horizontal.min(vertical)
}
