//! One-shot background textures. Generated at startup and on resize,
//! never per frame; the frame loop just blits them.

use crate::color::Rgb;
use crate::generators::EARTH_TONES;
use crate::render::{Pixel, Texture};
use rand::Rng;

const WATER_BASE: Rgb = Rgb::new(0x10, 0x3C, 0x78);

/// Water backdrop: a faint blue field whose alpha rises toward the
/// surface, with shimmer noise in the top 20%. Alpha stays low so the
/// braille conversion renders water as sparse dots behind the dwellers.
pub fn water_texture<R: Rng>(rng: &mut R, w: usize, h: usize) -> Texture {
    let mut tex = Texture::new(w, h);
    if w == 0 || h == 0 {
        return tex;
    }

    let water_line = h as f32 * 0.2;
    for y in 0..h {
        let ny = y as f32 / h as f32;
        for x in 0..w {
            let nx = x as f32 / w as f32;

            let wave = (nx * 9.0 + ny * 5.0).sin() * 0.5 + (nx * 23.0).sin() * 0.3;
            let mut alpha = 14.0 + 18.0 * (1.0 - ny) + wave * 12.0;

            let mut r = WATER_BASE.r as f32;
            let mut g = WATER_BASE.g as f32;
            let mut b = WATER_BASE.b as f32;

            if (y as f32) < water_line {
                // Shimmer band near the surface.
                let noise = (rng.gen::<f32>() - 0.5) * 40.0;
                r += noise;
                g += noise;
                b += noise;
                alpha += rng.gen::<f32>() * 30.0;
            }

            tex.px[y * w + x] = Pixel {
                r: r.clamp(0.0, 255.0) as u8,
                g: g.clamp(0.0, 255.0) as u8,
                b: b.clamp(0.0, 255.0) as u8,
                a: alpha.clamp(0.0, 255.0) as u8,
            };
        }
    }
    tex
}

/// Gravel strip: a random earth-tone base with per-pixel noise and an
/// uneven, wave-shaped top edge (transparent above the edge).
pub fn ground_texture<R: Rng>(rng: &mut R, w: usize, h: usize) -> Texture {
    let mut tex = Texture::new(w, h);
    if w == 0 || h == 0 {
        return tex;
    }

    let base = EARTH_TONES[rng.gen_range(0..EARTH_TONES.len())];
    // The wavy edge meanders around one fifth of the strip height.
    let edge_base = h as f32 * 0.2;

    for x in 0..w {
        let fx = x as f32;
        let wave = (fx * 0.02).sin() * 5.0 + (fx * 0.05).sin() * 3.0;
        let jitter = (rng.gen::<f32>() - 0.5) * 4.0;
        let edge = (edge_base + wave + jitter).clamp(0.0, h as f32 - 1.0) as usize;

        for y in 0..h {
            let i = y * w + x;
            if y < edge {
                tex.px[i] = Pixel::default();
            } else {
                let noise = (rng.gen::<f32>() - 0.5) * 30.0;
                tex.px[i] = Pixel {
                    r: (base.r as f32 + noise).clamp(0.0, 255.0) as u8,
                    g: (base.g as f32 + noise).clamp(0.0, 255.0) as u8,
                    b: (base.b as f32 + noise).clamp(0.0, 255.0) as u8,
                    a: 255,
                };
            }
        }
    }
    tex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::INK_ALPHA;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ground_edge_is_transparent_above_and_solid_below() {
        let mut rng = StdRng::seed_from_u64(4);
        let tex = ground_texture(&mut rng, 120, 40);

        for x in 0..tex.w {
            assert_eq!(tex.px[x].a, 0, "top row should be above the edge");
            assert_eq!(tex.px[(tex.h - 1) * tex.w + x].a, 255);
        }
    }

    #[test]
    fn water_is_sparse_ink() {
        let mut rng = StdRng::seed_from_u64(4);
        let tex = water_texture(&mut rng, 100, 100);
        let inked = tex.px.iter().filter(|p| p.a >= INK_ALPHA).count();
        // Some shimmer, but nowhere near a solid fill.
        assert!(inked > 0);
        assert!(inked < tex.px.len() * 3 / 4);
    }

    #[test]
    fn zero_sized_textures_are_fine() {
        let mut rng = StdRng::seed_from_u64(4);
        let t = water_texture(&mut rng, 0, 10);
        assert_eq!(t.px.len(), 0);
        let g = ground_texture(&mut rng, 10, 0);
        assert_eq!(g.px.len(), 0);
    }
}
