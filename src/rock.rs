//! Rocks: static, irregular polygons. The collision box is shorter than
//! the visual height so fish can slip over the top edge.

use crate::color::Rgb;
use crate::entity::{Body, Vec2};
use crate::render::{Canvas, Pixel};

#[derive(Clone, Debug)]
pub struct Rock {
    pub body: Body,
    pub colors: Vec<Rgb>,
    /// Local polygon outline around the rock centre.
    pub points: Vec<Vec2>,
    pub collision_height: f32,
}

impl Rock {
    pub fn new(body: Body, colors: Vec<Rgb>, points: Vec<Vec2>) -> Self {
        let collision_height = body.size.height * 0.7;
        Self {
            body,
            colors,
            points,
            collision_height,
        }
    }

    /// Rocks never move.
    pub fn update(&self) {}

    /// AABB check against a fish body using the reduced height.
    pub fn blocks(&self, other: &Body) -> bool {
        let rock_top = self.body.pos.y - self.collision_height;
        let rock_bottom = self.body.pos.y;
        let rock_left = self.body.pos.x - self.body.half_width();
        let rock_right = self.body.pos.x + self.body.half_width();

        let top = other.pos.y - other.half_height();
        let bottom = other.pos.y + other.half_height();
        let left = other.pos.x - other.half_width();
        let right = other.pos.x + other.half_width();

        !(left > rock_right || right < rock_left || bottom < rock_top || top > rock_bottom)
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if self.points.is_empty() {
            return;
        }
        let paint = Pixel::solid(self.colors.first().copied().unwrap_or(Rgb::new(0x8B, 0x45, 0x13)));
        canvas.save();
        canvas.translate(self.body.pos.x, self.body.pos.y);
        canvas.fill_polygon(&self.points, paint);
        canvas.restore();
    }
}
