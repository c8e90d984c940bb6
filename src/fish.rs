//! Fish: the only mobile tank dweller. Parametric body shape, appendages
//! and patterns come from the generator; behavior is a direction-change
//! timer on top of the shared boundary physics.

use crate::color::Rgb;
use crate::entity::{Body, Size, Tank, Vec2};
use crate::render::{Canvas, Pixel};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FishShape {
    Oval,
    Rectangle,
    Triangle,
}

impl FishShape {
    pub const ALL: [FishShape; 3] = [FishShape::Oval, FishShape::Rectangle, FishShape::Triangle];

    /// Is a body-local point inside the silhouette? Used both to place
    /// patterns and to verify them.
    pub fn contains(self, size: Size, x: f32, y: f32) -> bool {
        let hw = size.width / 2.0;
        let hh = size.height / 2.0;
        if hw <= 0.0 || hh <= 0.0 {
            return false;
        }
        match self {
            FishShape::Oval => (x * x) / (hw * hw) + (y * y) / (hh * hh) <= 1.0,
            FishShape::Rectangle => x.abs() <= hw && y.abs() <= hh,
            FishShape::Triangle => {
                y >= -hh && y <= hh && x.abs() <= hw * (1.0 - (y + hh) / (2.0 * hh))
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tail {
    pub size: Size,
    pub color: Rgb,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fin {
    pub position: Vec2,
    pub size: Size,
    pub color: Rgb,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Eye {
    pub position: Vec2,
    pub size: f32,
    pub color: Rgb,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Appendages {
    pub tail: Option<Tail>,
    pub fins: Vec<Fin>,
    pub eyes: Vec<Eye>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Spot {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Stripe {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Pattern {
    Spots { spots: Vec<Spot>, color: Rgb },
    Stripes { stripes: Vec<Stripe>, color: Rgb },
}

impl Pattern {
    pub fn element_count(&self) -> usize {
        match self {
            Pattern::Spots { spots, .. } => spots.len(),
            Pattern::Stripes { stripes, .. } => stripes.len(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fish {
    pub body: Body,
    pub base_shape: FishShape,
    pub colors: Vec<Rgb>,
    pub appendages: Appendages,
    pub patterns: Vec<Pattern>,
    pub speed: f32,
    pub facing_right: bool,
    pub dir_timer: f32,
    pub dir_interval: f32,
}

impl Fish {
    pub fn update<R: Rng>(&mut self, dt: f32, tank: &Tank, rng: &mut R) {
        self.facing_right = self.body.vel.x >= 0.0;

        self.dir_timer += dt;
        if self.dir_timer >= self.dir_interval {
            self.change_direction(rng);
            self.dir_timer = 0.0;
            self.dir_interval = rng.gen::<f32>() * 2.0 + 1.0;
        }

        self.body.step(dt, tank);
    }

    /// Redraw velocity from a uniform angle, damping the vertical
    /// component so fish mostly cruise sideways.
    pub fn change_direction<R: Rng>(&mut self, rng: &mut R) {
        let angle = rng.gen::<f32>() * TAU;
        self.body.vel = Vec2::new(angle.cos() * self.speed, angle.sin() * self.speed * 0.5);
    }

    pub fn primary_color(&self) -> Rgb {
        self.colors.first().copied().unwrap_or(Rgb::new(0xFF, 0x63, 0x47))
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        canvas.save();
        canvas.translate(self.body.pos.x, self.body.pos.y);
        if !self.facing_right {
            canvas.scale(-1.0, 1.0);
        }

        self.draw_body(canvas);
        self.draw_appendages(canvas);
        self.draw_patterns(canvas);

        canvas.restore();
    }

    fn draw_body(&self, canvas: &mut Canvas) {
        let paint = Pixel::solid(self.primary_color());
        let w = self.body.size.width;
        let h = self.body.size.height;
        match self.base_shape {
            FishShape::Oval => canvas.fill_ellipse(0.0, 0.0, w / 2.0, h / 2.0, paint),
            FishShape::Rectangle => canvas.fill_rect(-w / 2.0, -h / 2.0, w, h, paint),
            FishShape::Triangle => canvas.fill_polygon(
                &[
                    Vec2::new(w / 2.0, 0.0),
                    Vec2::new(-w / 2.0, -h / 2.0),
                    Vec2::new(-w / 2.0, h / 2.0),
                ],
                paint,
            ),
        }
    }

    fn draw_appendages(&self, canvas: &mut Canvas) {
        let hw = self.body.half_width();

        if let Some(tail) = &self.appendages.tail {
            canvas.fill_polygon(
                &[
                    Vec2::new(-hw, 0.0),
                    Vec2::new(-hw - tail.size.width, -tail.size.height / 2.0),
                    Vec2::new(-hw - tail.size.width, tail.size.height / 2.0),
                ],
                Pixel::solid(tail.color),
            );
        }

        for fin in &self.appendages.fins {
            canvas.fill_polygon(
                &[
                    fin.position,
                    Vec2::new(fin.position.x, fin.position.y + fin.size.height),
                    Vec2::new(
                        fin.position.x - fin.size.width,
                        fin.position.y + fin.size.height / 2.0,
                    ),
                ],
                Pixel::solid(fin.color),
            );
        }

        // Only the visible-side eye gets painted even when the fish grew a
        // rarer eye count; the full list still rides along in exports.
        if let Some(eye) = self.appendages.eyes.first() {
            canvas.fill_circle(eye.position.x, eye.position.y, eye.size, Pixel::solid(eye.color));
            canvas.fill_circle(
                eye.position.x + eye.size * 0.3,
                eye.position.y,
                eye.size * 0.4,
                Pixel::solid(Rgb::new(0, 0, 0)),
            );
        }
    }

    fn draw_patterns(&self, canvas: &mut Canvas) {
        for pattern in &self.patterns {
            match pattern {
                Pattern::Spots { spots, color } => {
                    let paint = Pixel::solid(*color);
                    for s in spots {
                        canvas.fill_circle(s.x, s.y, s.size, paint);
                    }
                }
                Pattern::Stripes { stripes, color } => {
                    let paint = Pixel::solid(*color);
                    for s in stripes {
                        canvas.fill_rect(
                            s.x - s.width / 2.0,
                            s.y - s.height / 2.0,
                            s.width,
                            s.height,
                            paint,
                        );
                    }
                }
            }
        }
    }
}
