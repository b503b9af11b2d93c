use std::time::Duration;

use common::Segment;
use log::{debug, error, info};
use smart_leds::RGB8;
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

use crate::{
    lights::{ALERT, OFF},
    strip::{Frame, StripHandle},
};

/// Time between two toggles of the blinking pixels
pub const BLINK_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Off,
    Alert,
}

impl Phase {
    pub fn next(self) -> Self {
        match self {
            Phase::Off => Phase::Alert,
            Phase::Alert => Phase::Off,
        }
    }

    pub fn color(self) -> RGB8 {
        match self {
            Phase::Off => OFF,
            Phase::Alert => ALERT,
        }
    }
}

/// The running blink task of one generation
struct BlinkJob {
    generation: u64,
    targets: Vec<Segment>,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the background task that blinks segments during an outage.
///
/// There is never more than one task. [`BlinkController::start`] and
/// [`BlinkController::stop`] both wait for the running task to exit, so
/// once they return nothing from an older generation can reach the strip
/// writer anymore.
pub struct BlinkController {
    strip: StripHandle,
    job: Option<BlinkJob>,
    generation: u64,
}

impl BlinkController {
    pub fn new(strip: StripHandle) -> Self {
        Self {
            strip,
            job: None,
            generation: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.job.is_some()
    }

    /// Segments blinking right now, empty when idle
    pub fn targets(&self) -> &[Segment] {
        self.job.as_ref().map_or(&[][..], |job| job.targets.as_slice())
    }

    /// Generation of the running task, or of the last one if idle
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace whatever is blinking with `targets`, drawn on `pixels`
    pub async fn start(&mut self, targets: Vec<Segment>, pixels: Vec<usize>) {
        self.stop().await;

        self.generation += 1;
        let generation = self.generation;
        info!("Blink {}: starting on {:?}", generation, targets);

        let (stop, stop_rx) = oneshot::channel();
        let handle = tokio::spawn(blink_loop(self.strip.clone(), pixels, stop_rx));

        self.job = Some(BlinkJob {
            generation,
            targets,
            stop,
            handle,
        });
    }

    /// Stop the running task and wait for it to finish its last write
    pub async fn stop(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };

        // The task may already be gone if it panicked
        let _ = job.stop.send(());
        if let Err(e) = job.handle.await {
            error!("Blink {}: task failed: {}", job.generation, e);
        }

        info!("Blink {}: stopped", job.generation);
    }
}

async fn blink_loop(strip: StripHandle, pixels: Vec<usize>, mut stop: oneshot::Receiver<()>) {
    let mut ticker = interval(BLINK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut phase = Phase::Alert;

    loop {
        tokio::select! {
            biased;

            // A dropped sender counts as a stop as well
            _ = &mut stop => break,
            _ = ticker.tick() => {
                phase = phase.next();
                let color = phase.color();
                strip
                    .frame(Frame::shown(pixels.iter().map(|&i| (i, color))))
                    .await;
            }
        }
    }

    debug!("Blink loop on {:?} exited", pixels);
}
