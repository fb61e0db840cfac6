//! Identity blockie for addresses
//!
//! Same seeding, xorshift generator and palette as the ethereum-blockies
//! identicons, drawn with upper-half-block cells so one cell holds two pixels.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

pub const BLOCKIE_SIZE: usize = 8;

/// Pixel classes of a blockie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
    Background,
    Color,
    Spot,
}

/// xorshift128 generator seeded from the address text
struct Xorshift {
    seed: [i32; 4],
}

impl Xorshift {
    fn new(seed: &str) -> Self {
        let mut state = [0i32; 4];
        for (i, byte) in seed.bytes().enumerate() {
            let slot = &mut state[i % 4];
            *slot = (*slot << 5).wrapping_sub(*slot).wrapping_add(i32::from(byte));
        }
        Self { seed: state }
    }

    fn next(&mut self) -> f64 {
        let t = self.seed[0] ^ (self.seed[0] << 11);
        self.seed[0] = self.seed[1];
        self.seed[1] = self.seed[2];
        self.seed[2] = self.seed[3];
        self.seed[3] = self.seed[3] ^ (self.seed[3] >> 19) ^ t ^ (t >> 8);
        f64::from(self.seed[3] as u32) / f64::from(1u32 << 31)
    }

    fn color(&mut self) -> Color {
        let h = (self.next() * 360.0).floor();
        let s = self.next() * 60.0 + 40.0;
        let l = (self.next() + self.next() + self.next() + self.next()) * 25.0;
        hsl_to_rgb(h, s / 100.0, l / 100.0)
    }
}

/// Deterministic blockie of an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blockie {
    pub color: Color,
    pub background: Color,
    pub spot: Color,
    pub pixels: [[Pixel; BLOCKIE_SIZE]; BLOCKIE_SIZE],
}

impl Blockie {
    pub fn new(address: &str) -> Self {
        let mut rng = Xorshift::new(&address.trim().to_lowercase());
        let color = rng.color();
        let background = rng.color();
        let spot = rng.color();

        let data_width = BLOCKIE_SIZE.div_ceil(2);
        let mirror_width = BLOCKIE_SIZE - data_width;
        let mut pixels = [[Pixel::Background; BLOCKIE_SIZE]; BLOCKIE_SIZE];
        for row in pixels.iter_mut() {
            for x in 0..data_width {
                row[x] = match (rng.next() * 2.3).floor() as u8 {
                    0 => Pixel::Background,
                    1 => Pixel::Color,
                    _ => Pixel::Spot,
                };
            }
            for x in 0..mirror_width {
                row[data_width + x] = row[mirror_width - 1 - x];
            }
        }

        Self {
            color,
            background,
            spot,
            pixels,
        }
    }

    fn paint(&self, pixel: Pixel) -> Color {
        match pixel {
            Pixel::Background => self.background,
            Pixel::Color => self.color,
            Pixel::Spot => self.spot,
        }
    }
}

impl Widget for &Blockie {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = (BLOCKIE_SIZE / 2).min(area.height as usize);
        let cols = BLOCKIE_SIZE.min(area.width as usize);
        for row in 0..rows {
            for col in 0..cols {
                let top = self.paint(self.pixels[row * 2][col]);
                let bottom = self.paint(self.pixels[row * 2 + 1][col]);
                buf.get_mut(area.x + col as u16, area.y + row as u16)
                    .set_char('▀')
                    .set_style(Style::default().fg(top).bg(bottom));
            }
        }
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Color {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h % 360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let channel = |v: f64| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb(channel(r), channel(g), channel(b))
}
