use anyhow::Error;
use log::{debug, error, warn};
use smart_leds::RGB8;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::StripMessage;

pub mod gamma;
mod memory;
#[cfg(feature = "pi")]
mod spi;

pub use memory::MemoryStrip;
#[cfg(feature = "pi")]
pub use spi::SpiStrip;

const QUEUE_DEPTH: usize = 100;

/// What the indicator needs from a physical (or virtual) LED strip.
pub trait Strip {
    /// Set one pixel in the buffer. Nothing is visible until [`Strip::show`].
    fn set_pixel(&mut self, index: usize, color: RGB8);
    /// Push the buffer out to the LEDs
    fn show(&mut self) -> Result<(), Error>;
    fn set_brightness(&mut self, brightness: u8);
    fn pixel_count(&self) -> usize;
}

/// A batch of pixel writes applied atomically by the strip writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub pixels: Vec<(usize, RGB8)>,
    pub show: bool,
}

impl Frame {
    /// Pixels followed by a push to the strip
    pub fn shown(pixels: impl IntoIterator<Item = (usize, RGB8)>) -> Self {
        Self {
            pixels: pixels.into_iter().collect(),
            show: true,
        }
    }

    /// Pixels written to the buffer only; they appear with the next push
    pub fn staged(pixels: impl IntoIterator<Item = (usize, RGB8)>) -> Self {
        Self {
            pixels: pixels.into_iter().collect(),
            show: false,
        }
    }
}

/// Cloneable sending side of the strip writer.
#[derive(Clone, Debug)]
pub struct StripHandle {
    sender: mpsc::Sender<StripMessage>,
    pixel_count: usize,
}

impl StripHandle {
    pub fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub async fn frame(&self, frame: Frame) {
        self.send(StripMessage::Frame(frame)).await;
    }

    /// Set every pixel to `color` and push once
    pub async fn fill(&self, color: RGB8) {
        self.frame(Frame::shown((0..self.pixel_count).map(|i| (i, color))))
            .await;
    }

    pub async fn set_brightness(&self, brightness: u8) {
        self.send(StripMessage::Brightness(brightness)).await;
    }

    /// Wait until the writer has applied everything queued so far
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(StripMessage::Flush(tx)).await;
        if rx.await.is_err() {
            warn!("Strip writer stopped before acknowledging a flush");
        }
    }

    async fn send(&self, message: StripMessage) {
        if let Err(e) = self.sender.send(message).await {
            error!("Strip writer is gone, dropping {:?}", e.0);
        }
    }
}

/// Start the task that owns the strip. It is the only place that touches
/// the pixel buffer, and runs until every [`StripHandle`] has been dropped.
pub fn spawn<S>(strip: S) -> (StripHandle, JoinHandle<()>)
where
    S: Strip + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
    let handle = StripHandle {
        sender,
        pixel_count: strip.pixel_count(),
    };

    let writer = tokio::spawn(writer_loop(strip, receiver));

    (handle, writer)
}

async fn writer_loop<S: Strip>(mut strip: S, mut receiver: mpsc::Receiver<StripMessage>) {
    while let Some(message) = receiver.recv().await {
        match message {
            StripMessage::Frame(frame) => {
                for (index, color) in frame.pixels {
                    strip.set_pixel(index, color);
                }

                if frame.show {
                    if let Err(e) = strip.show() {
                        error!("Failed to push pixels to the strip: {}", e);
                    }
                }
            }
            StripMessage::Brightness(brightness) => {
                debug!("Strip brightness set to {}", brightness);
                strip.set_brightness(brightness);
                if let Err(e) = strip.show() {
                    error!("Failed to push pixels to the strip: {}", e);
                }
            }
            StripMessage::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    debug!("Strip writer stopped");
}
