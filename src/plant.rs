//! Plants: rooted, immobile, and slowly growing. A stem of stacked
//! segments gains one segment per growth interval and occasionally roots
//! a branch; every segment sways with the global frame clock.

use crate::color::Rgb;
use crate::entity::{Body, Size, Tank, Vec2};
use crate::render::{Canvas, Pixel};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantShape {
    Leaf,
    Round,
    Rectangular,
}

impl PlantShape {
    pub const ALL: [PlantShape; 3] = [PlantShape::Leaf, PlantShape::Round, PlantShape::Rectangular];
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Segment {
    pub position: Vec2,
    #[serde(default)]
    pub offset: Vec2,
    pub size: Size,
    pub color: Rgb,
    pub rotation: f32,
}

#[derive(Clone, Debug)]
pub struct Branch {
    /// Offset of the branch root from the plant anchor.
    pub position: Vec2,
    pub angle: f32,
    /// Sway phase so branches don't move in lockstep with the stem.
    pub phase: f32,
    pub segments: Vec<Segment>,
}

#[derive(Clone, Debug)]
pub struct Plant {
    pub body: Body,
    pub base_shape: PlantShape,
    pub colors: Vec<Rgb>,
    pub segments: Vec<Segment>,
    pub branches: Vec<Branch>,
    pub max_segments: usize,
    pub growth_interval: f32,
    pub branch_probability: f32,
    pub growth_timer: f32,
    pub growth: u32,
}

impl Plant {
    pub fn update<R: Rng>(&mut self, dt: f32, tank: &Tank, rng: &mut R) {
        self.growth_timer += dt;
        if self.growth_timer >= self.growth_interval && self.segments.len() < self.max_segments {
            self.grow(rng);
            self.growth_timer = 0.0;
        }

        // Water-current sway, a pure function of the global clock and each
        // segment's height above the anchor.
        let t = tank.frame_count as f32 * 0.02;
        for seg in &mut self.segments {
            seg.offset.x = (t + seg.position.y * 0.1).sin() * 2.0;
        }
        for branch in &mut self.branches {
            for seg in &mut branch.segments {
                seg.offset.x = (t + seg.position.y * 0.1 + branch.phase).sin() * 2.0;
            }
        }

        // Velocity is pinned to zero, so this only clamps a floor-level
        // anchor into the tank on the first tick.
        self.body.vel = Vec2::default();
        self.body.step(dt, tank);
    }

    fn grow<R: Rng>(&mut self, rng: &mut R) {
        self.push_segment(rng);
        self.growth += 1;

        if rng.gen::<f32>() < self.branch_probability && self.segments.len() > 2 {
            self.push_branch(rng);
        }
    }

    /// Stack one segment on top of the stem.
    pub fn push_segment<R: Rng>(&mut self, rng: &mut R) {
        let height = rng.gen::<f32>() * 10.0 + 20.0;
        let width = rng.gen::<f32>() * 10.0 + 15.0;
        let y = match self.segments.last() {
            Some(last) => last.position.y + height * 0.7,
            None => 0.0,
        };
        let color = self.segment_color(rng);
        self.segments.push(Segment {
            position: Vec2::new(0.0, y),
            offset: Vec2::default(),
            size: Size::new(width, height),
            color,
            rotation: (rng.gen::<f32>() - 0.5) * 0.2,
        });
    }

    fn push_branch<R: Rng>(&mut self, rng: &mut R) {
        // Root at any segment but the newest.
        let root_ix = rng.gen_range(0..self.segments.len() - 1);
        let root = self.segments[root_ix].position;

        let mut branch = Branch {
            position: root,
            angle: if rng.gen_bool(0.5) { PI * 0.2 } else { -PI * 0.2 },
            phase: rng.gen::<f32>() * 5.0,
            segments: Vec::new(),
        };

        let count = rng.gen_range(2..=4);
        for i in 0..count {
            let height = rng.gen::<f32>() * 8.0 + 15.0;
            let width = rng.gen::<f32>() * 8.0 + 10.0;
            let position = if i == 0 {
                Vec2::default()
            } else {
                let prev = branch.segments[i - 1].position;
                Vec2::new(prev.x + width * 0.5, prev.y + height * 0.6)
            };
            let color = self.segment_color(rng);
            branch.segments.push(Segment {
                position,
                offset: Vec2::default(),
                size: Size::new(width, height),
                color,
                rotation: (rng.gen::<f32>() - 0.5) * 0.2,
            });
        }

        self.branches.push(branch);
    }

    /// Pick from the palette, or for single-color plants vary the green
    /// channel a little for a more natural stem.
    fn segment_color<R: Rng>(&self, rng: &mut R) -> Rgb {
        if self.colors.len() > 1 {
            self.colors[rng.gen_range(0..self.colors.len())]
        } else {
            let base = self.colors.first().copied().unwrap_or(Rgb::new(0x22, 0x8B, 0x22));
            let variation = ((rng.gen::<f32>() - 0.5) * 30.0).floor() as i32;
            Rgb {
                r: base.r,
                g: (base.g as i32 + variation).clamp(0, 255) as u8,
                b: base.b,
            }
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        for seg in &self.segments {
            canvas.save();
            canvas.translate(
                self.body.pos.x + seg.position.x + seg.offset.x,
                self.body.pos.y - seg.position.y,
            );
            canvas.rotate(seg.rotation);
            draw_segment(canvas, self.base_shape, seg, 1.0);
            canvas.restore();
        }

        for branch in &self.branches {
            for seg in &branch.segments {
                canvas.save();
                canvas.translate(
                    self.body.pos.x + branch.position.x + seg.position.x + seg.offset.x,
                    self.body.pos.y - branch.position.y - seg.position.y,
                );
                canvas.rotate(branch.angle + seg.rotation);
                // Branch foliage runs slightly smaller than the stem.
                draw_segment(canvas, self.base_shape, seg, 0.8);
                canvas.restore();
            }
        }
    }
}

fn draw_segment(canvas: &mut Canvas, shape: PlantShape, seg: &Segment, scale: f32) {
    let paint = Pixel::solid(seg.color);
    let w = seg.size.width * scale;
    let h = seg.size.height * scale;
    match shape {
        PlantShape::Leaf => {
            // Pointed leaf: two lobes meeting at the anchor and the tip.
            canvas.fill_polygon(
                &[
                    Vec2::new(0.0, 0.0),
                    Vec2::new(w * 0.5, -h * 0.35),
                    Vec2::new(w * 0.3, -h * 0.75),
                    Vec2::new(0.0, -h),
                    Vec2::new(-w * 0.3, -h * 0.75),
                    Vec2::new(-w * 0.5, -h * 0.35),
                ],
                paint,
            );
        }
        PlantShape::Round => {
            canvas.fill_circle(0.0, -h / 2.0, w / 2.0, paint);
        }
        PlantShape::Rectangular => {
            canvas.fill_rect(-w / 2.0, -h, w, h, paint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Body;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_plant(rng: &mut StdRng, max_segments: usize, interval: f32, branch_p: f32) -> Plant {
        let mut plant = Plant {
            body: Body::new(
                rng,
                Vec2::new(400.0, 640.0),
                Vec2::default(),
                Size::new(30.0, 45.0),
            ),
            base_shape: PlantShape::Leaf,
            colors: vec![Rgb::new(0x22, 0x8B, 0x22)],
            segments: Vec::new(),
            branches: Vec::new(),
            max_segments,
            growth_interval: interval,
            branch_probability: branch_p,
            growth_timer: 0.0,
            growth: 0,
        };
        plant.push_segment(rng);
        plant
    }

    #[test]
    fn growth_is_monotone_and_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let tank = Tank::default();
        let mut plant = test_plant(&mut rng, 7, 2.0, 0.0);

        let mut prev = plant.segments.len();
        // 60 simulated seconds in quarter-second ticks: far past the point
        // where max_segments saturates.
        for _ in 0..240 {
            plant.update(0.25, &tank, &mut rng);
            let now = plant.segments.len();
            assert!(now >= prev);
            assert!(now <= 7);
            prev = now;
        }
        assert_eq!(plant.segments.len(), 7);
    }

    #[test]
    fn growth_respects_interval() {
        let mut rng = StdRng::seed_from_u64(5);
        let tank = Tank::default();
        let mut plant = test_plant(&mut rng, 10, 3.0, 0.0);

        plant.update(2.9, &tank, &mut rng);
        assert_eq!(plant.segments.len(), 1);
        plant.update(0.2, &tank, &mut rng);
        assert_eq!(plant.segments.len(), 2);
    }

    #[test]
    fn branches_need_three_segments() {
        let mut rng = StdRng::seed_from_u64(21);
        let tank = Tank::default();
        let mut plant = test_plant(&mut rng, 10, 1.0, 1.0);

        // Two grows reach three segments; only then may a branch appear.
        plant.update(1.0, &tank, &mut rng);
        assert!(plant.branches.len() <= 1);
        for _ in 0..8 {
            plant.update(1.0, &tank, &mut rng);
        }
        assert!(!plant.branches.is_empty());
        for branch in &plant.branches {
            assert!((2..=4).contains(&branch.segments.len()));
            assert!((branch.angle.abs() - PI * 0.2).abs() < 1e-5);
        }
    }

    #[test]
    fn segments_stack_upward() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut plant = test_plant(&mut rng, 10, 1.0, 0.0);
        for _ in 0..5 {
            plant.push_segment(&mut rng);
        }
        for pair in plant.segments.windows(2) {
            assert!(pair[1].position.y > pair[0].position.y);
        }
    }

    #[test]
    fn sway_tracks_frame_counter() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut tank = Tank::default();
        let mut plant = test_plant(&mut rng, 3, 100.0, 0.0);

        tank.frame_count = 40;
        plant.update(0.016, &tank, &mut rng);
        let expected = (40.0f32 * 0.02 + plant.segments[0].position.y * 0.1).sin() * 2.0;
        assert!((plant.segments[0].offset.x - expected).abs() < 1e-5);
        assert!(plant.segments[0].offset.x.abs() <= 2.0);
    }
}
