//! Procedural generators. Every entity is built here; any option field
//! the caller supplies overrides the generated default for that field
//! alone, which is also how import reconstructs exported tanks.

use crate::color::{generate_palette, PaletteOptions, Rgb};
use crate::entity::{Body, Size, Vec2, GRAVEL_HEIGHT, TANK_HEIGHT};
use crate::fish::{Appendages, Eye, Fin, Fish, FishShape, Pattern, Spot, Stripe, Tail};
use crate::plant::{Plant, PlantShape, Segment};
use crate::rock::Rock;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Placement attempts per spot/stripe before the element is dropped.
/// Bounds the rejection sampling on degenerate bodies.
const PATTERN_ATTEMPTS: usize = 50;

pub const EARTH_TONES: [Rgb; 8] = [
    Rgb::new(0x8B, 0x45, 0x13), // saddle brown
    Rgb::new(0xA0, 0x52, 0x2D), // sienna
    Rgb::new(0x6B, 0x44, 0x23), // dark brown
    Rgb::new(0x8B, 0x73, 0x55), // burly wood
    Rgb::new(0xA9, 0xA9, 0xA9), // dark gray
    Rgb::new(0x80, 0x80, 0x80), // gray
    Rgb::new(0x69, 0x69, 0x69), // dim gray
    Rgb::new(0x4A, 0x4A, 0x4A), // darker gray
];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FishOptions {
    pub position: Option<Vec2>,
    pub velocity: Option<Vec2>,
    pub size: Option<Size>,
    pub base_shape: Option<FishShape>,
    pub colors: Option<Vec<Rgb>>,
    pub appendages: Option<Appendages>,
    pub patterns: Option<Vec<Pattern>>,
    pub speed: Option<f32>,
}

#[derive(Clone, Debug, Default)]
pub struct PlantOptions {
    pub position: Option<Vec2>,
    pub size: Option<Size>,
    pub base_shape: Option<PlantShape>,
    pub colors: Option<Vec<Rgb>>,
    pub segments: Option<Vec<Segment>>,
    pub max_segments: Option<usize>,
    pub growth_interval: Option<f32>,
    pub branch_probability: Option<f32>,
}

#[derive(Clone, Debug, Default)]
pub struct RockOptions {
    pub position: Option<Vec2>,
    pub size: Option<Size>,
    pub colors: Option<Vec<Rgb>>,
    pub points: Option<Vec<Vec2>>,
    /// Force (or forbid) the wide "pile" size category.
    pub pile: Option<bool>,
}

pub fn random_fish<R: Rng>(rng: &mut R, opts: FishOptions) -> Fish {
    // Keep defaults away from the walls and the gravel strip.
    let position = opts
        .position
        .unwrap_or_else(|| Vec2::new(rng.gen::<f32>() * 700.0 + 150.0, rng.gen::<f32>() * 500.0 + 100.0));
    let size = opts
        .size
        .unwrap_or_else(|| Size::new(rng.gen::<f32>() * 30.0 + 40.0, rng.gen::<f32>() * 20.0 + 30.0));
    let base_shape = opts
        .base_shape
        .unwrap_or_else(|| *FishShape::ALL.choose(rng).expect("non-empty shape list"));
    let colors = match opts.colors {
        Some(c) if !c.is_empty() => c,
        _ => {
            let n = rng.gen_range(2..=4);
            let hue = rng.gen::<f32>() * 360.0;
            generate_palette(rng, hue, n, PaletteOptions::default())
        }
    };
    let appendages = opts
        .appendages
        .unwrap_or_else(|| fish_appendages(rng, size, &colors));
    let patterns = opts
        .patterns
        .unwrap_or_else(|| fish_patterns(rng, base_shape, size, &colors));
    let speed = opts.speed.unwrap_or_else(|| rng.gen::<f32>() * 50.0 + 20.0);
    let velocity = opts.velocity.unwrap_or_else(|| {
        let angle = rng.gen::<f32>() * TAU;
        Vec2::new(angle.cos() * speed, angle.sin() * speed * 0.5)
    });

    let facing_right = velocity.x >= 0.0;
    Fish {
        body: Body::new(rng, position, velocity, size),
        base_shape,
        colors,
        appendages,
        patterns,
        speed,
        facing_right,
        dir_timer: 0.0,
        dir_interval: rng.gen::<f32>() * 2.0 + 1.0,
    }
}

fn pick_color<R: Rng>(rng: &mut R, colors: &[Rgb]) -> Rgb {
    colors
        .get(rng.gen_range(0..colors.len().max(1)))
        .copied()
        .unwrap_or(Rgb::new(0xFF, 0xFF, 0xFF))
}

fn fish_appendages<R: Rng>(rng: &mut R, size: Size, colors: &[Rgb]) -> Appendages {
    let tail = Tail {
        size: Size::new(
            size.width * (rng.gen::<f32>() * 0.3 + 0.2),
            size.height * (rng.gen::<f32>() * 0.3 + 0.6),
        ),
        color: pick_color(rng, colors),
    };

    let mut fins = Vec::new();
    for _ in 0..rng.gen_range(1..=3) {
        fins.push(Fin {
            position: Vec2::new(
                (rng.gen::<f32>() * 0.6 - 0.3) * size.width,
                (rng.gen::<f32>() * 0.6 - 0.3) * size.height,
            ),
            size: Size::new(
                size.width * (rng.gen::<f32>() * 0.2 + 0.1),
                size.height * (rng.gen::<f32>() * 0.3 + 0.2),
            ),
            color: pick_color(rng, colors),
        });
    }

    // Eye count is heavily weighted toward one, with rare mutants.
    let eye_size = size.height * (rng.gen::<f32>() * 0.1 + 0.08);
    let roll = rng.gen::<f32>();
    let num_eyes = if roll < 0.01 {
        0
    } else if roll < 0.02 {
        2
    } else if roll < 0.03 {
        3
    } else {
        1
    };

    let mut eyes = Vec::new();
    for i in 0..num_eyes {
        let position = match num_eyes {
            1 => Vec2::new(size.width * 0.3, -size.height * 0.15),
            2 => Vec2::new(
                size.width * (0.3 + (i as f32 - 0.5) * 0.1),
                -size.height * 0.15,
            ),
            _ => {
                let angle = i as f32 * TAU / 3.0;
                Vec2::new(
                    size.width * (0.3 + angle.cos() * 0.1),
                    size.height * (-0.15 + angle.sin() * 0.1),
                )
            }
        };
        eyes.push(Eye {
            position,
            size: eye_size,
            color: Rgb::new(0xFF, 0xFF, 0xFF),
        });
    }

    Appendages {
        tail: Some(tail),
        fins,
        eyes,
    }
}

fn fish_patterns<R: Rng>(rng: &mut R, shape: FishShape, size: Size, colors: &[Rgb]) -> Vec<Pattern> {
    if !rng.gen_bool(0.5) {
        return Vec::new();
    }

    let color = colors.get(1).or_else(|| colors.first()).copied().unwrap_or(Rgb::new(0xFF, 0xFF, 0xFF));

    if rng.gen_bool(0.5) {
        let mut spots = Vec::new();
        for _ in 0..rng.gen_range(3..=10) {
            for _ in 0..PATTERN_ATTEMPTS {
                let x = (rng.gen::<f32>() * 0.8 - 0.4) * size.width;
                let y = (rng.gen::<f32>() * 0.8 - 0.4) * size.height;
                if shape.contains(size, x, y) {
                    spots.push(Spot {
                        x,
                        y,
                        size: rng.gen::<f32>() * 3.0 + 2.0,
                    });
                    break;
                }
            }
        }
        vec![Pattern::Spots { spots, color }]
    } else {
        let mut stripes = Vec::new();
        for _ in 0..rng.gen_range(2..=5) {
            for _ in 0..PATTERN_ATTEMPTS {
                let x = (rng.gen::<f32>() * 0.4 - 0.2) * size.width;
                let y = (rng.gen::<f32>() * 0.8 - 0.4) * size.height;
                let width = size.width * (rng.gen::<f32>() * 0.4 + 0.3);
                let height = size.height * (rng.gen::<f32>() * 0.2 + 0.1);

                let corners = [
                    (x - width / 2.0, y - height / 2.0),
                    (x + width / 2.0, y - height / 2.0),
                    (x - width / 2.0, y + height / 2.0),
                    (x + width / 2.0, y + height / 2.0),
                ];
                if corners.iter().all(|&(cx, cy)| shape.contains(size, cx, cy)) {
                    stripes.push(Stripe {
                        x,
                        y,
                        width,
                        height,
                    });
                    break;
                }
            }
        }
        vec![Pattern::Stripes { stripes, color }]
    }
}

pub fn random_plant<R: Rng>(rng: &mut R, opts: PlantOptions) -> Plant {
    let floor = TANK_HEIGHT - GRAVEL_HEIGHT;
    let position = opts
        .position
        .unwrap_or_else(|| Vec2::new(rng.gen::<f32>() * 700.0 + 150.0, floor - rng.gen::<f32>() * 20.0));
    let size = opts
        .size
        .unwrap_or_else(|| Size::new(rng.gen::<f32>() * 20.0 + 20.0, rng.gen::<f32>() * 30.0 + 30.0));
    let base_shape = opts
        .base_shape
        .unwrap_or_else(|| *PlantShape::ALL.choose(rng).expect("non-empty shape list"));
    let colors = match opts.colors {
        Some(c) if !c.is_empty() => c,
        _ => {
            // Green-hued tones only.
            let n = rng.gen_range(1..=2);
            let hue = 90.0 + rng.gen::<f32>() * 60.0;
            let saturation = 0.5 + rng.gen::<f32>() * 0.5;
            let lightness = 0.3 + rng.gen::<f32>() * 0.3;
            generate_palette(
                rng,
                hue,
                n,
                PaletteOptions {
                    saturation,
                    lightness,
                    ..PaletteOptions::default()
                },
            )
        }
    };

    let mut plant = Plant {
        body: Body::new(rng, position, Vec2::default(), size),
        base_shape,
        colors,
        segments: Vec::new(),
        branches: Vec::new(),
        max_segments: opts.max_segments.unwrap_or_else(|| rng.gen_range(5..=10)),
        growth_interval: opts.growth_interval.unwrap_or_else(|| rng.gen::<f32>() * 3.0 + 3.0),
        branch_probability: opts
            .branch_probability
            .unwrap_or_else(|| rng.gen::<f32>() * 0.3 + 0.1),
        growth_timer: 0.0,
        growth: 0,
    };

    match opts.segments {
        Some(segments) if !segments.is_empty() => plant.segments = segments,
        _ => {
            for _ in 0..rng.gen_range(1..=3) {
                plant.push_segment(rng);
            }
        }
    }

    plant
}

pub fn random_rock<R: Rng>(rng: &mut R, opts: RockOptions) -> Rock {
    let floor = TANK_HEIGHT - GRAVEL_HEIGHT;
    let position = opts
        .position
        .unwrap_or_else(|| Vec2::new(rng.gen::<f32>() * 800.0 + 100.0, floor + rng.gen::<f32>() * 30.0));

    let size = opts.size.unwrap_or_else(|| {
        let pile = opts.pile.unwrap_or_else(|| rng.gen::<f32>() < 0.2);
        if pile {
            Size::new(rng.gen::<f32>() * 100.0 + 80.0, rng.gen::<f32>() * 60.0 + 40.0)
        } else if rng.gen::<f32>() < 0.3 {
            Size::new(rng.gen::<f32>() * 60.0 + 50.0, rng.gen::<f32>() * 40.0 + 30.0)
        } else {
            Size::new(rng.gen::<f32>() * 40.0 + 30.0, rng.gen::<f32>() * 30.0 + 20.0)
        }
    });

    let colors = match opts.colors {
        Some(c) if !c.is_empty() => c,
        _ => rock_colors(rng),
    };
    let points = opts.points.unwrap_or_else(|| rock_points(rng, size));

    Rock::new(Body::new(rng, position, Vec2::default(), size), colors, points)
}

/// 2-3 distinct earth tones.
fn rock_colors<R: Rng>(rng: &mut R) -> Vec<Rgb> {
    let n = rng.gen_range(2..=3);
    let mut pool = EARTH_TONES.to_vec();
    pool.shuffle(rng);
    pool.truncate(n);
    pool
}

/// Irregular outline: points spaced evenly by angle with independent
/// radius jitter on both axes. Wide rocks get a denser outline.
fn rock_points<R: Rng>(rng: &mut R, size: Size) -> Vec<Vec2> {
    let n = if size.width >= 80.0 {
        rng.gen_range(8..=11)
    } else {
        rng.gen_range(6..=9)
    };

    let rx = size.width / 2.0;
    let ry = size.height / 2.0;
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let angle = i as f32 / n as f32 * 2.0 * PI;
        let jitter_x = rx * (0.7 + rng.gen::<f32>() * 0.6);
        let jitter_y = ry * (0.7 + rng.gen::<f32>() * 0.6);
        points.push(Vec2::new(angle.cos() * jitter_x, angle.sin() * jitter_y));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Tank, GRAVEL_HEIGHT, TANK_HEIGHT, TANK_WIDTH};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fish_defaults_are_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let f = random_fish(&mut rng, FishOptions::default());
            assert!(f.body.pos.x.is_finite() && f.body.pos.y.is_finite());
            assert!((150.0..=850.0).contains(&f.body.pos.x));
            assert!((100.0..=600.0).contains(&f.body.pos.y));
            assert!((40.0..=70.0).contains(&f.body.size.width));
            assert!((30.0..=50.0).contains(&f.body.size.height));
            assert!((2..=4).contains(&f.colors.len()));
            assert!((20.0..=70.0).contains(&f.speed));
            assert!((1.0..=3.0).contains(&f.dir_interval));
            assert!((1..=3).contains(&f.appendages.fins.len()));
            assert!(f.appendages.eyes.len() <= 3);
            assert!(f.patterns.len() <= 1);

            let tail = f.appendages.tail.as_ref().expect("fish always grow a tail");
            assert!(tail.size.width >= f.body.size.width * 0.2 - 1e-3);
            assert!(tail.size.width <= f.body.size.width * 0.5 + 1e-3);
            assert!(tail.size.height >= f.body.size.height * 0.6 - 1e-3);
            assert!(tail.size.height <= f.body.size.height * 0.9 + 1e-3);
        }
    }

    #[test]
    fn field_overrides_are_per_field() {
        let mut rng = StdRng::seed_from_u64(7);
        let f = random_fish(
            &mut rng,
            FishOptions {
                base_shape: Some(FishShape::Triangle),
                colors: Some(vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]),
                ..FishOptions::default()
            },
        );
        assert_eq!(f.base_shape, FishShape::Triangle);
        assert_eq!(f.colors, vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]);
        // Everything else still generated.
        assert!(f.appendages.tail.is_some());
        assert!((40.0..=70.0).contains(&f.body.size.width));
    }

    #[test]
    fn patterns_stay_inside_the_silhouette() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..400 {
            let f = random_fish(&mut rng, FishOptions::default());
            for pattern in &f.patterns {
                match pattern {
                    Pattern::Spots { spots, .. } => {
                        for s in spots {
                            assert!(
                                f.base_shape.contains(f.body.size, s.x, s.y),
                                "spot ({}, {}) outside {:?}",
                                s.x,
                                s.y,
                                f.base_shape
                            );
                        }
                    }
                    Pattern::Stripes { stripes, .. } => {
                        for s in stripes {
                            for (cx, cy) in [
                                (s.x - s.width / 2.0, s.y - s.height / 2.0),
                                (s.x + s.width / 2.0, s.y - s.height / 2.0),
                                (s.x - s.width / 2.0, s.y + s.height / 2.0),
                                (s.x + s.width / 2.0, s.y + s.height / 2.0),
                            ] {
                                assert!(f.base_shape.contains(f.body.size, cx, cy));
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn degenerate_body_terminates_with_empty_patterns() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let f = random_fish(
                &mut rng,
                FishOptions {
                    size: Some(Size::new(0.0, 0.0)),
                    ..FishOptions::default()
                },
            );
            for pattern in &f.patterns {
                assert_eq!(pattern.element_count(), 0);
            }
        }
    }

    #[test]
    fn plant_defaults_are_in_range() {
        let mut rng = StdRng::seed_from_u64(17);
        let floor = TANK_HEIGHT - GRAVEL_HEIGHT;
        for _ in 0..300 {
            let p = random_plant(&mut rng, PlantOptions::default());
            assert!((150.0..=850.0).contains(&p.body.pos.x));
            assert!(p.body.pos.y <= floor && p.body.pos.y >= floor - 20.0);
            assert!((1..=3).contains(&p.segments.len()));
            assert!((5..=10).contains(&p.max_segments));
            assert!((3.0..=6.0).contains(&p.growth_interval));
            assert!((0.1..=0.4).contains(&p.branch_probability));
            assert!(!p.colors.is_empty() && p.colors.len() <= 2);
            for seg in &p.segments {
                assert!((20.0..=30.0).contains(&seg.size.height));
                assert!((15.0..=25.0).contains(&seg.size.width));
                assert!(seg.rotation.abs() <= 0.1);
            }
        }
    }

    #[test]
    fn forced_pile_rocks_are_wide_and_dense() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let r = random_rock(
                &mut rng,
                RockOptions {
                    pile: Some(true),
                    ..RockOptions::default()
                },
            );
            assert!((80.0..=180.0).contains(&r.body.size.width));
            assert!((40.0..=100.0).contains(&r.body.size.height));
            assert!(r.points.len() >= 8, "pile rock with {} points", r.points.len());
        }
    }

    #[test]
    fn rock_colors_are_distinct_earth_tones() {
        let mut rng = StdRng::seed_from_u64(23);
        for _ in 0..200 {
            let r = random_rock(&mut rng, RockOptions::default());
            assert!((2..=3).contains(&r.colors.len()));
            for (i, a) in r.colors.iter().enumerate() {
                assert!(EARTH_TONES.contains(a));
                for b in &r.colors[i + 1..] {
                    assert_ne!(a, b);
                }
            }
            assert!((6..=11).contains(&r.points.len()));
        }
    }

    #[test]
    fn generated_entities_survive_simulation() {
        let mut rng = StdRng::seed_from_u64(31);
        let tank = Tank::default();
        let mut fish: Vec<_> = (0..40)
            .map(|_| random_fish(&mut rng, FishOptions::default()))
            .collect();

        for _ in 0..2_000 {
            for f in &mut fish {
                f.update(0.016, &tank, &mut rng);
                assert!(f.body.pos.x.is_finite() && f.body.pos.y.is_finite());
                assert!(f.body.pos.x >= f.body.half_width() - 1e-3);
                assert!(f.body.pos.x <= TANK_WIDTH - f.body.half_width() + 1e-3);
                assert!(f.body.pos.y >= f.body.half_height() - 1e-3);
                assert!(f.body.pos.y <= tank.floor_y() - f.body.half_height() + 1e-3);
            }
        }
    }
}
