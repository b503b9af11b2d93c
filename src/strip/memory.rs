use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Error;
use log::trace;
use smart_leds::RGB8;

use super::{gamma::ColorCorrection, Strip};

/// How many pushed frames are kept around for inspection
const HISTORY_LIMIT: usize = 4096;

/// A strip that only lives in memory. Used when no hardware is attached,
/// and by the tests to look at what would have been displayed.
///
/// Clones share the same buffer, so a clone can be handed to the strip
/// writer while another one is kept for inspection.
#[derive(Clone, Debug)]
pub struct MemoryStrip {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug)]
struct MemoryState {
    buffer: Vec<RGB8>,
    displayed: Vec<RGB8>,
    history: VecDeque<Vec<RGB8>>,
    correction: ColorCorrection,
    writes: usize,
    shows: usize,
}

impl MemoryStrip {
    pub fn new(pixel_count: usize, gamma: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState {
                buffer: vec![RGB8::default(); pixel_count],
                displayed: vec![RGB8::default(); pixel_count],
                history: VecDeque::new(),
                correction: ColorCorrection::new(gamma),
                writes: 0,
                shows: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Colors as of the last push
    pub fn displayed(&self) -> Vec<RGB8> {
        self.state().displayed.clone()
    }

    /// Wire values as of the last push, after gamma and brightness
    pub fn output(&self) -> Vec<RGB8> {
        let state = self.state();
        let output = state
            .correction
            .correct(state.displayed.iter().copied())
            .collect();
        output
    }

    /// Every pushed frame, oldest first
    pub fn history(&self) -> Vec<Vec<RGB8>> {
        self.state().history.iter().cloned().collect()
    }

    /// Total number of pushes
    pub fn shows(&self) -> usize {
        self.state().shows
    }

    /// Total number of pixel writes
    pub fn writes(&self) -> usize {
        self.state().writes
    }

    pub fn brightness(&self) -> u8 {
        self.state().correction.brightness()
    }
}

impl Strip for MemoryStrip {
    fn set_pixel(&mut self, index: usize, color: RGB8) {
        let mut state = self.state();
        if index >= state.buffer.len() {
            panic!(
                "pixel {} is outside of a {} pixel strip",
                index,
                state.buffer.len()
            );
        }

        state.buffer[index] = color;
        state.writes += 1;
    }

    fn show(&mut self) -> Result<(), Error> {
        let mut state = self.state();
        let frame = state.buffer.clone();
        trace!("Strip: {:?}", frame);

        if state.history.len() == HISTORY_LIMIT {
            state.history.pop_front();
        }
        state.history.push_back(frame.clone());
        state.displayed = frame;
        state.shows += 1;

        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.state().correction.set_brightness(brightness);
    }

    fn pixel_count(&self) -> usize {
        self.state().buffer.len()
    }
}
