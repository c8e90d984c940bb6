//! The tank itself: owns every entity collection, the global frame
//! clock, and the per-tick update pass. Update never draws and draw
//! never mutates, so a dropped frame cannot corrupt simulation state.

use crate::color::Rgb;
use crate::entity::{EntityId, EntityKind, Tank, Vec2};
use crate::fish::Fish;
use crate::generators::{self, FishOptions, PlantOptions, RockOptions};
use crate::plant::Plant;
use crate::render::{Canvas, Pixel};
use crate::rock::Rock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Transient feeding particle, advanced by the tick like everything else
/// rather than by host timers.
#[derive(Clone, Debug)]
pub struct FoodParticle {
    pub pos: Vec2,
    /// Seconds until the particle is released (staggers the drop).
    pub delay: f32,
    pub size: f32,
    fall_speed: f32,
}

pub struct Aquarium {
    pub tank: Tank,
    rng: StdRng,
    fish: Vec<Fish>,
    plants: Vec<Plant>,
    rocks: Vec<Rock>,
    food: Vec<FoodParticle>,
    running: bool,
    pub elapsed: f32,
    pub show_grid: bool,
}

impl Aquarium {
    pub fn new(seed: u64) -> Self {
        Self {
            tank: Tank::default(),
            rng: StdRng::seed_from_u64(seed),
            fish: Vec::new(),
            plants: Vec::new(),
            rocks: Vec::new(),
            food: Vec::new(),
            running: false,
            elapsed: 0.0,
            show_grid: false,
        }
    }

    /* ---- run state ---- */

    /// Idempotent while already running.
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /* ---- population ---- */

    pub fn spawn_fish(&mut self, opts: FishOptions) -> EntityId {
        let fish = generators::random_fish(&mut self.rng, opts);
        let id = fish.body.id;
        self.fish.push(fish);
        id
    }

    pub fn spawn_plant(&mut self, opts: PlantOptions) -> EntityId {
        let plant = generators::random_plant(&mut self.rng, opts);
        let id = plant.body.id;
        self.plants.push(plant);
        id
    }

    pub fn spawn_rock(&mut self, opts: RockOptions) -> EntityId {
        let rock = generators::random_rock(&mut self.rng, opts);
        let id = rock.body.id;
        self.rocks.push(rock);
        id
    }

    pub fn remove_fish(&mut self, id: EntityId) -> bool {
        let before = self.fish.len();
        self.fish.retain(|f| f.body.id != id);
        self.fish.len() != before
    }

    pub fn remove_plant(&mut self, id: EntityId) -> bool {
        let before = self.plants.len();
        self.plants.retain(|p| p.body.id != id);
        self.plants.len() != before
    }

    pub fn remove_rock(&mut self, id: EntityId) -> bool {
        let before = self.rocks.len();
        self.rocks.retain(|r| r.body.id != id);
        self.rocks.len() != before
    }

    pub fn clear_fish(&mut self) {
        self.fish.clear();
    }

    /// Drop everything and install imported entities in one step, so a
    /// failed import never leaves the tank half-replaced.
    pub fn replace_entities(&mut self, fish: Vec<Fish>, plants: Vec<Plant>) {
        self.fish = fish;
        self.plants = plants;
    }

    pub fn import_fish(&mut self, opts: FishOptions) -> Fish {
        generators::random_fish(&mut self.rng, opts)
    }

    pub fn import_plant(&mut self, opts: PlantOptions) -> Plant {
        generators::random_plant(&mut self.rng, opts)
    }

    /* ---- defensive-copy getters ---- */

    pub fn fish(&self) -> Vec<Fish> {
        self.fish.clone()
    }

    pub fn plants(&self) -> Vec<Plant> {
        self.plants.clone()
    }

    pub fn rocks(&self) -> Vec<Rock> {
        self.rocks.clone()
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.fish.len(), self.plants.len(), self.rocks.len())
    }

    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    /* ---- interaction ---- */

    /// Random spot that avoids the floor strip.
    pub fn random_position(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.gen::<f32>() * self.tank.width,
            self.rng.gen::<f32>() * (self.tank.height - 70.0),
        )
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.show_grid = !self.show_grid;
        self.show_grid
    }

    /// Drop a handful of food flakes from the surface, staggered.
    pub fn feed(&mut self) {
        let count = self.rng.gen_range(5..10);
        for i in 0..count {
            let x = self.rng.gen::<f32>() * self.tank.width;
            self.food.push(FoodParticle {
                pos: Vec2::new(x, 20.0),
                delay: i as f32 * 0.1,
                size: self.rng.gen::<f32>() * 3.0 + 2.0,
                fall_speed: 20.0,
            });
        }
    }

    /// Hit-test a world-space point against entity centres; a clicked
    /// fish darts off in a new direction. Reports what was hit.
    pub fn click(&mut self, p: Vec2) -> Option<(EntityId, EntityKind)> {
        for f in &mut self.fish {
            if f.body.contains_point(p) {
                f.change_direction(&mut self.rng);
                return Some((f.body.id, EntityKind::Fish));
            }
        }
        for plant in &self.plants {
            if plant.body.contains_point(p) {
                return Some((plant.body.id, EntityKind::Plant));
            }
        }
        None
    }

    /* ---- the tick ---- */

    /// One simulation step. Fixed order: food, rocks, plants, fish — the
    /// same order draw layers them. Gated on the running flag so stopping
    /// halts transient effects too.
    pub fn tick(&mut self, dt: f32) {
        if !self.running {
            return;
        }

        self.tank.frame_count += 1;
        self.elapsed += dt;
        let tank = self.tank;

        for p in &mut self.food {
            if p.delay > 0.0 {
                p.delay -= dt;
                continue;
            }
            p.pos.x += (self.rng.gen::<f32>() - 0.5) * 40.0 * dt;
            p.pos.y += p.fall_speed * dt;
        }
        let floor = tank.floor_y();
        self.food.retain(|p| p.pos.y < floor);

        for r in &self.rocks {
            r.update();
        }
        for p in &mut self.plants {
            p.update(dt, &tank, &mut self.rng);
        }
        for f in &mut self.fish {
            f.update(dt, &tank, &mut self.rng);
        }
    }

    /* ---- the draw pass ---- */

    /// Paint the world into the canvas in layer order. Read-only with
    /// respect to simulation state.
    pub fn draw(&self, canvas: &mut Canvas, world_scale: (f32, f32)) {
        canvas.save();
        canvas.scale(world_scale.0, world_scale.1);

        for r in &self.rocks {
            r.draw(canvas);
        }
        for p in &self.plants {
            p.draw(canvas);
        }
        for f in &self.fish {
            f.draw(canvas);
        }

        let food_paint = Pixel::solid(Rgb::new(0xF0, 0xD8, 0x90));
        for p in &self.food {
            if p.delay > 0.0 {
                continue;
            }
            canvas.fill_circle(p.pos.x, p.pos.y, p.size, food_paint);
        }

        canvas.restore();
    }
}
