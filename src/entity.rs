//! Common entity body: position, velocity, size, and the tank boundary
//! rules every dweller obeys.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

pub const TANK_WIDTH: f32 = 1000.0;
pub const TANK_HEIGHT: f32 = 700.0;
pub const GRAVEL_HEIGHT: f32 = 50.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn len(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct EntityId(u64);

impl EntityId {
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self(rng.gen())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:013x}", self.0 & 0xFFFF_FFFF_FFFF_F)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Fish,
    Plant,
    Rock,
}

/// World view handed to entity updates: tank dimensions plus the global
/// frame counter that drives sway animation.
#[derive(Clone, Copy, Debug)]
pub struct Tank {
    pub width: f32,
    pub height: f32,
    pub gravel_h: f32,
    pub frame_count: u64,
}

impl Default for Tank {
    fn default() -> Self {
        Self {
            width: TANK_WIDTH,
            height: TANK_HEIGHT,
            gravel_h: GRAVEL_HEIGHT,
            frame_count: 0,
        }
    }
}

impl Tank {
    /// Top of the gravel strip; entities may not sink below it.
    pub fn floor_y(&self) -> f32 {
        self.height - self.gravel_h
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Size,
}

impl Body {
    pub fn new<R: Rng>(rng: &mut R, pos: Vec2, vel: Vec2, size: Size) -> Self {
        Self {
            id: EntityId::random(rng),
            pos,
            vel,
            size,
        }
    }

    pub fn half_width(&self) -> f32 {
        self.size.width / 2.0
    }

    pub fn half_height(&self) -> f32 {
        self.size.height / 2.0
    }

    /// Integrate one step and resolve boundary contact.
    pub fn step(&mut self, dt: f32, tank: &Tank) {
        self.pos += self.vel * dt;
        self.resolve_bounds(tank);
    }

    /// Clamp to the tank walls and gravel line, reflecting the violated
    /// velocity component.
    pub fn resolve_bounds(&mut self, tank: &Tank) {
        let hw = self.half_width();
        let hh = self.half_height();

        if self.pos.x < hw {
            self.pos.x = hw;
            self.vel.x = -self.vel.x;
        }
        if self.pos.x > tank.width - hw {
            self.pos.x = tank.width - hw;
            self.vel.x = -self.vel.x;
        }
        if self.pos.y < hh {
            self.pos.y = hh;
            self.vel.y = -self.vel.y;
        }
        let floor = tank.floor_y();
        if self.pos.y > floor - hh {
            self.pos.y = floor - hh;
            self.vel.y = -self.vel.y;
        }
    }

    /// Circle-approximation overlap test against another body.
    pub fn overlaps(&self, other: &Body) -> bool {
        let d = self.pos - other.pos;
        d.len() < self.half_width() + other.half_width()
    }

    /// Hit test used by canvas clicks.
    pub fn contains_point(&self, p: Vec2) -> bool {
        (self.pos - p).len() < self.half_width()
    }
}
