use anyhow::{bail, Error};
use common::{Segment, Severity};
use log::info;
use serde::{Deserialize, Serialize};
use smart_leds::RGB8;

pub const OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };
pub const GREEN: RGB8 = RGB8 { r: 0, g: 255, b: 0 };
pub const YELLOW: RGB8 = RGB8 { r: 255, g: 255, b: 0 };
pub const AMBER: RGB8 = RGB8 { r: 255, g: 200, b: 0 };
pub const RED: RGB8 = RGB8 { r: 255, g: 0, b: 0 };
pub const BLUE: RGB8 = RGB8 { r: 0, g: 0, b: 255 };

/// Color of the blink task and of the ping failure flash
pub const ALERT: RGB8 = RED;

/// Steady color of a severity level. The two worst levels share red.
pub fn color_for(severity: Severity) -> RGB8 {
    match severity {
        Severity::Healthy => GREEN,
        Severity::Low => YELLOW,
        Severity::Medium => AMBER,
        Severity::High => RED,
        Severity::Outage => RED,
    }
}

/// How many pixels, counted from the start of the strip, light up for an
/// internet severity. A healthy link fills the strip and every level
/// above takes away another quarter. An outage lights nothing steadily,
/// it blinks instead.
pub fn lit_span(severity: Severity, pixel_count: usize) -> usize {
    let remaining = (Severity::Outage.level() - severity.level()) as usize;
    pixel_count * remaining / Severity::Outage.level() as usize
}

/// Pixel indices of each segment, fixed at startup.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct SegmentPixels {
    pub local: Vec<usize>,
    pub gateway: Vec<usize>,
    pub internet: Vec<usize>,
}

impl Default for SegmentPixels {
    fn default() -> Self {
        Self {
            local: vec![0],
            gateway: vec![3],
            internet: vec![7],
        }
    }
}

/// A segment to pixel mapping that has been checked against the strip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SegmentMap {
    pixels: SegmentPixels,
}

impl SegmentMap {
    pub fn new(pixels: SegmentPixels, pixel_count: usize) -> Result<Self, Error> {
        for segment in Segment::ALL {
            let indices = match segment {
                Segment::Local => &pixels.local,
                Segment::Gateway => &pixels.gateway,
                Segment::Internet => &pixels.internet,
            };

            if indices.is_empty() {
                bail!("segment {} has no pixels", segment);
            }

            if let Some(index) = indices.iter().find(|&&i| i >= pixel_count) {
                bail!(
                    "segment {} uses pixel {}, but the strip only has {} pixels",
                    segment,
                    index,
                    pixel_count
                );
            }

            info!("Segment {}: pixels {:?}", segment, indices);
        }

        Ok(Self { pixels })
    }

    pub fn pixels_for(&self, segment: Segment) -> &[usize] {
        match segment {
            Segment::Local => &self.pixels.local,
            Segment::Gateway => &self.pixels.gateway,
            Segment::Internet => &self.pixels.internet,
        }
    }

    /// Every pixel of `segments`, in order
    pub fn pixels_of(&self, segments: &[Segment]) -> Vec<usize> {
        segments
            .iter()
            .flat_map(|&segment| self.pixels_for(segment).iter().copied())
            .collect()
    }
}
