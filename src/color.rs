//! Palette generation for the procedurally built tank dwellers.
//!
//! Colors travel through the export format as `#RRGGBB` strings, so `Rgb`
//! serializes to and from that form.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::from_hex(&s).ok_or_else(|| D::Error::custom(format!("invalid hex color {s:?}")))
    }
}

// Curated 8-bit style palettes: bright, earth, ocean, purple-pink.
pub const FIXED_PALETTES: [[Rgb; 5]; 4] = [
    [
        Rgb::new(0xFF, 0x63, 0x47),
        Rgb::new(0x46, 0x82, 0xB4),
        Rgb::new(0xFF, 0xD7, 0x00),
        Rgb::new(0x32, 0xCD, 0x32),
        Rgb::new(0x93, 0x70, 0xDB),
    ],
    [
        Rgb::new(0x8B, 0x45, 0x13),
        Rgb::new(0x55, 0x6B, 0x2F),
        Rgb::new(0xB8, 0x86, 0x0B),
        Rgb::new(0xA0, 0x52, 0x2D),
        Rgb::new(0xCD, 0x85, 0x3F),
    ],
    [
        Rgb::new(0x00, 0xCE, 0xD1),
        Rgb::new(0x20, 0xB2, 0xAA),
        Rgb::new(0x5F, 0x9E, 0xA0),
        Rgb::new(0x46, 0x82, 0xB4),
        Rgb::new(0x87, 0xCE, 0xEB),
    ],
    [
        Rgb::new(0xFF, 0x69, 0xB4),
        Rgb::new(0xDA, 0x70, 0xD6),
        Rgb::new(0xBA, 0x55, 0xD3),
        Rgb::new(0x93, 0x70, 0xDB),
        Rgb::new(0x8A, 0x2B, 0xE2),
    ],
];

#[derive(Clone, Copy, Debug)]
pub struct PaletteOptions {
    pub saturation: f32,
    pub lightness: f32,
    /// Degrees of hue spread around the base hue.
    pub hue_variation: f32,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            saturation: 0.7,
            lightness: 0.5,
            hue_variation: 60.0,
        }
    }
}

/// Generate `num_colors` colors around `base_hue` (degrees).
///
/// 70% of the time the base hue is ignored and a shuffled subset of one of
/// the fixed palettes is returned for a cohesive retro look; otherwise hue
/// offsets are spread evenly across the variation window with jittered
/// saturation/lightness.
pub fn generate_palette<R: Rng>(
    rng: &mut R,
    base_hue: f32,
    num_colors: usize,
    opts: PaletteOptions,
) -> Vec<Rgb> {
    if rng.gen::<f32>() < 0.7 {
        let palette = &FIXED_PALETTES[rng.gen_range(0..FIXED_PALETTES.len())];
        let mut pool = palette.to_vec();
        pool.shuffle(rng);
        pool.truncate(num_colors.min(pool.len()).max(1));
        return pool;
    }

    let mut base = base_hue % 360.0;
    if base < 0.0 {
        base += 360.0;
    }

    let mut colors = Vec::with_capacity(num_colors);
    for i in 0..num_colors {
        let offset = i as f32 * (opts.hue_variation / num_colors as f32) - opts.hue_variation / 2.0;
        let mut hue = (base + offset) % 360.0;
        if hue < 0.0 {
            hue += 360.0;
        }

        let s = (opts.saturation + (rng.gen::<f32>() * 0.2 - 0.1)).clamp(0.0, 1.0);
        let l = (opts.lightness + (rng.gen::<f32>() * 0.2 - 0.1)).clamp(0.0, 1.0);
        colors.push(hsl_to_rgb(hue / 360.0, s, l));
    }
    colors
}

/// Standard piecewise HSL to RGB conversion. `h` is in turns (0..1).
/// Channels round half away from zero so hex output matches the reference
/// palette values bit for bit.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };

    Rgb {
        r: (r * 255.0).round() as u8,
        g: (g * 255.0).round() as u8,
        b: (b * 255.0).round() as u8,
    }
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Inverse conversion, used by tests and the plant color variation.
/// Returns (hue degrees, saturation, lightness).
pub fn rgb_to_hsl(c: Rgb) -> (f32, f32, f32) {
    let r = c.r as f32 / 255.0;
    let g = c.g as f32 / 255.0;
    let b = c.b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f32::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h * 60.0, s, l)
}
