use std::time::Duration;

use smart_leds::RGB8;
use tokio::time::sleep;

use crate::strip::{Frame, StripHandle};

/// Pause between steps of the keep-alive sweep
pub const HIGHLIGHT_STEP: Duration = Duration::from_millis(40);

/// The moving pixel of the keep-alive sweep, a dimmer green
pub const WAVE: RGB8 = RGB8 { r: 0, g: 80, b: 0 };

/// Set every pixel to `color`. With a step delay each pixel is pushed on
/// its own, giving a visible sweep; without one the whole strip changes
/// in a single push.
pub async fn color_wipe(strip: &StripHandle, color: RGB8, step_delay: Duration) {
    if step_delay.is_zero() {
        strip.fill(color).await;
        return;
    }

    for i in 0..strip.pixel_count() {
        strip.frame(Frame::shown([(i, color)])).await;
        sleep(step_delay).await;
    }
}

/// Position on a red -> green -> blue -> red color wheel
pub fn wheel(pos: u8) -> RGB8 {
    match pos {
        0..=84 => RGB8::new(pos * 3, 255 - pos * 3, 0),
        85..=169 => {
            let pos = pos - 85;
            RGB8::new(255 - pos * 3, 0, pos * 3)
        }
        _ => {
            let pos = pos - 170;
            RGB8::new(0, pos * 3, 255 - pos * 3)
        }
    }
}

/// Rotate the color wheel across the strip `256 * iterations` times
pub async fn rainbow_cycle(strip: &StripHandle, step_delay: Duration, iterations: usize) {
    let count = strip.pixel_count();

    for step in 0..256 * iterations {
        strip
            .frame(Frame::shown(
                (0..count).map(|i| (i, wheel(((i + step) & 255) as u8))),
            ))
            .await;
        sleep(step_delay).await;
    }
}

/// Sweep a `wave` pixel to the end of the strip and back, leaving `trail`
/// behind it, then settle the whole strip on `trail`.
pub async fn ping_pong(strip: &StripHandle, trail: RGB8, wave: RGB8, step_delay: Duration) {
    let count = strip.pixel_count();

    for i in 0..count {
        let mut pixels = vec![(i, wave)];
        if i > 0 {
            pixels.push((i - 1, trail));
        }
        strip.frame(Frame::shown(pixels)).await;
        sleep(step_delay).await;
    }

    for i in (0..count).rev() {
        let mut pixels = vec![(i, wave)];
        if i + 1 < count {
            pixels.push((i + 1, trail));
        }
        strip.frame(Frame::shown(pixels)).await;
        sleep(step_delay).await;
    }

    color_wipe(strip, trail, Duration::ZERO).await;
}
