use std::sync::mpsc;

use anyhow::Result;
use image::{Rgb, RgbImage};
use opencv::{
    highgui::{
        destroy_window, get_window_property, imshow, named_window, set_mouse_callback, wait_key,
        EVENT_LBUTTONDOWN, EVENT_MBUTTONDOWN, EVENT_RBUTTONDOWN, WINDOW_AUTOSIZE,
        WND_PROP_VISIBLE,
    },
    imgproc::{cvt_color, COLOR_RGB2BGR},
    prelude::*,
};

use crate::{
    curator::{Button, Curator, PointerEvent, Transition},
    render::{compose, Marker},
};

pub const WINDOW: &str = "Original Image with Mask";

const KEY_ESC: i32 = 27;

#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub accept_color: Rgb<u8>,
    pub alpha: f32,
}

fn to_mat(frame: &RgbImage) -> Result<Mat> {
    let (width, height) = frame.dimensions();
    let flat = Mat::from_slice_rows_cols(frame.as_raw().as_slice(), height as usize, width as usize * 3)?;
    let rgb = flat.reshape(3, height as i32)?;
    let mut bgr = Mat::default();
    cvt_color(&rgb, &mut bgr, COLOR_RGB2BGR, 0)?;
    Ok(bgr)
}

/// Shows the image and overlay and feeds clicks to the curator until the
/// window is closed or Esc/q is pressed.
pub fn run(mut curator: Curator, base: RgbImage, style: Style) -> Result<()> {
    named_window(WINDOW, WINDOW_AUTOSIZE)?;

    let (tx, rx) = mpsc::channel();
    set_mouse_callback(
        WINDOW,
        Some(Box::new(move |event, x, y, _flags| {
            let button = match event {
                EVENT_LBUTTONDOWN => Button::Primary,
                EVENT_RBUTTONDOWN => Button::Secondary,
                EVENT_MBUTTONDOWN => Button::Other,
                _ => return,
            };
            if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) {
                tx.send(PointerEvent { x, y, button }).ok();
            }
        })),
    )?;

    let mut frame = to_mat(&compose(&base, curator.overlay(), style.alpha, None)?)?;
    loop {
        imshow(WINDOW, &frame)?;
        let key = wait_key(30)?;
        if key == KEY_ESC || key == 'q' as i32 {
            break;
        }
        if get_window_property(WINDOW, WND_PROP_VISIBLE)? < 1.0 {
            break;
        }

        for event in rx.try_iter() {
            let transition = curator.dispatch(event)?;
            if matches!(transition, Transition::Missed { .. } | Transition::Ignored) {
                continue;
            }
            let marker = Marker::for_transition(transition, style.accept_color);
            frame = to_mat(&compose(&base, curator.overlay(), style.alpha, marker)?)?;
        }
    }

    destroy_window(WINDOW)?;
    Ok(())
}
