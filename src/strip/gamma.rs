use smart_leds::{brightness, RGB8};

/// Gamma table used by the WS281x driver library the indicator was first
/// built against.
pub const GAMMA: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2,
    2, 2, 2, 3, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5,
    6, 6, 6, 7, 7, 7, 8, 8, 8, 9, 9, 9, 10, 10, 11, 11,
    11, 12, 12, 13, 13, 13, 14, 14, 15, 15, 16, 16, 17, 17, 18, 18,
    19, 19, 20, 21, 21, 22, 22, 23, 23, 24, 25, 25, 26, 27, 27, 28,
    29, 29, 30, 31, 31, 32, 33, 34, 34, 35, 36, 37, 37, 38, 39, 40,
    40, 41, 42, 43, 44, 45, 46, 46, 47, 48, 49, 50, 51, 52, 53, 54,
    55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70,
    71, 72, 73, 74, 76, 77, 78, 79, 80, 81, 83, 84, 85, 86, 88, 89,
    90, 91, 93, 94, 95, 96, 98, 99, 100, 102, 103, 104, 106, 107, 109, 110,
    111, 113, 114, 116, 117, 119, 120, 121, 123, 124, 126, 128, 129, 131, 132, 134,
    135, 137, 138, 140, 142, 143, 145, 146, 148, 150, 151, 153, 155, 157, 158, 160,
    162, 163, 165, 167, 169, 170, 172, 174, 176, 178, 179, 181, 183, 185, 187, 189,
    191, 193, 194, 196, 198, 200, 202, 204, 206, 208, 210, 212, 214, 216, 218, 220,
    222, 224, 227, 229, 231, 233, 235, 237, 239, 241, 244, 246, 248, 250, 252, 255,
];

fn identity() -> [u8; 256] {
    let mut table = [0u8; 256];
    for (i, value) in table.iter_mut().enumerate() {
        *value = i as u8;
    }
    table
}

/// Converts buffer colors into the values that go out on the wire: gamma
/// lookup first, then global brightness scaling.
#[derive(Clone, Debug)]
pub struct ColorCorrection {
    table: [u8; 256],
    brightness: u8,
}

impl ColorCorrection {
    pub fn new(gamma: bool) -> Self {
        Self {
            table: if gamma { GAMMA } else { identity() },
            brightness: 255,
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        self.brightness = brightness;
    }

    fn lookup(&self, color: RGB8) -> RGB8 {
        RGB8 {
            r: self.table[color.r as usize],
            g: self.table[color.g as usize],
            b: self.table[color.b as usize],
        }
    }

    /// Wire values of `pixels`, in the same order
    pub fn correct<'a, I>(&'a self, pixels: I) -> impl Iterator<Item = RGB8> + 'a
    where
        I: Iterator<Item = RGB8> + 'a,
    {
        brightness(
            pixels.map(move |color| self.lookup(color)),
            self.brightness,
        )
    }
}

/// Scale a 0-100 brightness percentage to the 0-255 range of the driver
pub fn scale_brightness(percent: f64) -> u8 {
    (percent.max(0.0) * 255.0 / 100.0).min(255.0) as u8
}
