use strip::Frame;
use tokio::sync::oneshot;

pub mod animation;
pub mod blink;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod lights;
pub mod selftest;
pub mod strip;

pub mod prelude {
    pub use crate::{
        animation::*, blink::*, config::*, dispatch::*, engine::*, lights::*, strip::*,
    };
    pub use common::{Command, Segment, SegmentStates, Severity};
}

/// Messages processed in order by the strip writer. Every change to the
/// pixel buffer goes through this queue, whether it comes from the engine
/// or from the blink task.
#[derive(Debug)]
pub enum StripMessage {
    /// Write a batch of pixels, then optionally push the buffer to the strip
    Frame(Frame),
    /// Change the global brightness
    Brightness(u8),
    /// Reply once every message queued before this one has been applied
    Flush(oneshot::Sender<()>),
}
