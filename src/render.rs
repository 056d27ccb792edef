use anyhow::{ensure, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::{curator::Transition, mask::Mask};

pub const DEFAULT_ALPHA: f32 = 0.5;
pub const MARKER_RADIUS: i32 = 4;
pub const REJECT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: usize,
    pub y: usize,
    pub color: Rgb<u8>,
}

impl Marker {
    /// Marker for a transition that changed state; misses draw nothing.
    pub fn for_transition(transition: Transition, accept_color: Rgb<u8>) -> Option<Self> {
        match transition {
            Transition::Accepted { x, y, .. } => Some(Self { x, y, color: accept_color }),
            Transition::Rejected { x, y, .. } => Some(Self { x, y, color: REJECT_COLOR }),
            Transition::Missed { .. } | Transition::Ignored => None,
        }
    }
}

/// Base image with the overlay blended on top as grayscale at `alpha`,
/// plus an optional click marker.
pub fn compose(base: &RgbImage, overlay: &Mask, alpha: f32, marker: Option<Marker>) -> Result<RgbImage> {
    let (width, height) = base.dimensions();
    ensure!(
        overlay.dim() == (height as usize, width as usize),
        "overlay shape {:?} does not match image {}x{}",
        overlay.dim(),
        width,
        height
    );

    let alpha = alpha.clamp(0.0, 1.0);
    let mut frame = RgbImage::from_fn(width, height, |x, y| {
        let layer = if overlay[[y as usize, x as usize]] { 255.0 } else { 0.0 };
        let Rgb(channels) = *base.get_pixel(x, y);
        Rgb(channels.map(|c| ((1.0 - alpha) * c as f32 + alpha * layer).round() as u8))
    });

    if let Some(Marker { x, y, color }) = marker {
        draw_filled_circle_mut(&mut frame, (x as i32, y as i32), MARKER_RADIUS, color);
    }

    Ok(frame)
}
