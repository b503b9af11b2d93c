use anyhow::Error;
use log::info;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use smart_leds::RGB8;

use super::{gamma::ColorCorrection, Strip};

/// Each SPI byte carries two WS2812 bits at this clock
const CLOCK_SPEED: u32 = 3_200_000;

const COLOR_CMD_LEN: usize = 12;
const RESET_LEN: usize = 50;
const PATTERNS: [u8; 4] = [0b1000_1000, 0b1000_1110, 0b1110_1000, 0b1110_1110];

/// WS2812 strip wired to the SPI0 MOSI pin of a Raspberry Pi.
pub struct SpiStrip {
    spi: Spi,
    buffer: Vec<RGB8>,
    correction: ColorCorrection,
}

impl SpiStrip {
    pub fn init(pixel_count: usize, gamma: bool) -> Result<Self, Error> {
        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, CLOCK_SPEED, Mode::Mode0)?;
        info!("SPI strip: {} pixels on /dev/spidev0.0", pixel_count);

        Ok(Self {
            spi,
            buffer: vec![RGB8::default(); pixel_count],
            correction: ColorCorrection::new(gamma),
        })
    }

    fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.buffer.len() * COLOR_CMD_LEN + RESET_LEN);

        for pixel in self.correction.correct(self.buffer.iter().copied()) {
            // WS2812 expects green first
            for mut channel in [pixel.g, pixel.r, pixel.b] {
                for _ in 0..4 {
                    bytes.push(PATTERNS[((channel & 0b1100_0000) >> 6) as usize]);
                    channel <<= 2;
                }
            }
        }

        bytes.extend_from_slice(&[0u8; RESET_LEN]);
        bytes
    }
}

impl Strip for SpiStrip {
    fn set_pixel(&mut self, index: usize, color: RGB8) {
        let len = self.buffer.len();
        match self.buffer.get_mut(index) {
            Some(pixel) => *pixel = color,
            None => panic!("pixel {} is outside of a {} pixel strip", index, len),
        }
    }

    fn show(&mut self) -> Result<(), Error> {
        let bytes = self.encode();
        self.spi.write(&bytes)?;
        Ok(())
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.correction.set_brightness(brightness);
    }

    fn pixel_count(&self) -> usize {
        self.buffer.len()
    }
}
