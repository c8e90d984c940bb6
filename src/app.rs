//! Terminal application: owns the frame loop, wires input actions to the
//! tank, and layers HUD/status/help text over the rendered world.

use crate::aquarium::Aquarium;
use crate::color::Rgb;
use crate::config::{load_settings, project_paths, save_settings, Paths, Settings};
use crate::entity::{EntityKind, Vec2, GRAVEL_HEIGHT, TANK_HEIGHT, TANK_WIDTH};
use crate::generators::{FishOptions, PlantOptions, RockOptions};
use crate::input::{map_event, Action};
use crate::render::{canvas_to_cells, Canvas, Cell, Pixel, Renderer, Texture, SUB_X, SUB_Y};
use crate::storage;
use crate::texture::{ground_texture, water_texture};
use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor, event, execute, queue,
    event::{DisableMouseCapture, EnableMouseCapture},
    style::{Color, ResetColor},
    terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

const DT_CLAMP: f32 = 0.05;
const STATUS_SECS: f32 = 4.0;

const BG: Color = Color::Rgb { r: 2, g: 6, b: 14 };
const HUD_FG: Color = Color::Rgb { r: 170, g: 215, b: 255 };
const GRID_INK: Pixel = Pixel::tinted(Rgb::new(0xFF, 0xFF, 0xFF), 52);

#[derive(Parser, Debug)]
#[command(name = "aquarium-sim", about = "Procedural terminal aquarium")]
pub struct Args {
    /// RNG seed; 0 (or absent with no saved setting) falls back to the clock.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Frame cap in frames per second.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Initial fish count.
    #[arg(long)]
    pub fish: Option<usize>,

    /// Initial plant count.
    #[arg(long)]
    pub plants: Option<usize>,

    /// Initial rock count.
    #[arg(long)]
    pub rocks: Option<usize>,

    /// Disable per-cell RGB color.
    #[arg(long)]
    pub no_color: bool,
}

struct App {
    settings: Settings,
    paths: Paths,
    aquarium: Aquarium,
    renderer: Renderer,
    canvas: Canvas,
    water: Texture,
    ground: Texture,
    texture_rng: StdRng,
    cols: u16,
    rows: u16,
    show_hud: bool,
    show_help: bool,
    status: Option<(String, f32)>,
    should_quit: bool,
}

impl App {
    fn init(args: Args) -> Result<Self> {
        let paths = project_paths()?;
        let mut settings = load_settings(&paths.settings_path);
        if let Some(seed) = args.seed {
            settings.seed = seed;
        }
        if let Some(fps) = args.fps {
            settings.fps_cap = fps;
        }
        if let Some(n) = args.fish {
            settings.initial_fish = n;
        }
        if let Some(n) = args.plants {
            settings.initial_plants = n;
        }
        if let Some(n) = args.rocks {
            settings.initial_rocks = n;
        }
        if args.no_color {
            settings.enable_color = false;
        }

        let seed = if settings.seed != 0 {
            settings.seed
        } else {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0xA11CE)
        };

        let mut aquarium = Aquarium::new(seed);
        for _ in 0..settings.initial_rocks {
            aquarium.spawn_rock(RockOptions::default());
        }
        for _ in 0..settings.initial_plants {
            aquarium.spawn_plant(PlantOptions::default());
        }
        for _ in 0..settings.initial_fish {
            aquarium.spawn_fish(FishOptions::default());
        }
        aquarium.start();

        let (cols, rows) = terminal::size()?;
        let canvas = Canvas::new(cols as usize * SUB_X, rows as usize * SUB_Y);
        let renderer = Renderer::new(cols, rows, BG);

        let mut texture_rng = StdRng::seed_from_u64(seed ^ 0x7E47);
        let (water, ground) = make_textures(&mut texture_rng, canvas.w, canvas.h);

        Ok(Self {
            settings,
            paths,
            aquarium,
            renderer,
            canvas,
            water,
            ground,
            texture_rng,
            cols,
            rows,
            show_hud: true,
            show_help: false,
            status: None,
            should_quit: false,
        })
    }

    fn world_scale(&self) -> (f32, f32) {
        (
            self.canvas.w as f32 / TANK_WIDTH,
            self.canvas.h as f32 / TANK_HEIGHT,
        )
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.canvas.resize(cols as usize * SUB_X, rows as usize * SUB_Y);
        self.renderer.resize(cols, rows, BG);
        let (water, ground) = make_textures(&mut self.texture_rng, self.canvas.w, self.canvas.h);
        self.water = water;
        self.ground = ground;
    }

    fn set_status(&mut self, text: String) {
        self.status = Some((text, STATUS_SECS));
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::TogglePause => {
                if self.aquarium.is_running() {
                    self.aquarium.stop();
                } else {
                    self.aquarium.start();
                }
            }
            Action::Feed => self.aquarium.feed(),
            Action::SpawnFish => {
                self.aquarium.spawn_fish(FishOptions::default());
            }
            Action::SpawnPlant => {
                self.aquarium.spawn_plant(PlantOptions::default());
            }
            Action::SpawnRock => {
                self.aquarium.spawn_rock(RockOptions::default());
            }
            Action::ClearFish => {
                self.aquarium.clear_fish();
                self.set_status("fish cleared".into());
            }
            Action::Export => match storage::export_to_path(&self.aquarium, &self.paths.export_path) {
                Ok(()) => {
                    let (f, p, _) = self.aquarium.counts();
                    self.set_status(format!(
                        "exported {f} fish, {p} plants to {}",
                        self.paths.export_path.display()
                    ));
                }
                Err(err) => self.set_status(format!("export failed: {err:#}")),
            },
            Action::Import => match storage::import_from_path(&self.paths.export_path) {
                Ok(data) => {
                    let summary = storage::apply_import(&mut self.aquarium, data);
                    let mut msg = format!("imported {} fish, {} plants", summary.fish, summary.plants);
                    if summary.regenerated_fields > 0 {
                        msg.push_str(&format!(" ({} fields regenerated)", summary.regenerated_fields));
                    }
                    self.set_status(msg);
                }
                Err(err) => self.set_status(format!("import failed: {err:#}")),
            },
            Action::ToggleGrid => {
                let on = self.aquarium.toggle_grid();
                self.set_status(format!("grid {}", if on { "on" } else { "off" }));
            }
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::Click(col, row) => {
                let (sx, sy) = self.world_scale();
                if sx > 0.0 && sy > 0.0 {
                    let world = Vec2::new(
                        (col as f32 * SUB_X as f32 + 1.0) / sx,
                        (row as f32 * SUB_Y as f32 + 2.0) / sy,
                    );
                    if let Some((_, EntityKind::Fish)) = self.aquarium.click(world) {
                        self.set_status("startled a fish".into());
                    }
                }
            }
            Action::Resize(w, h) => self.resize(w, h),
        }
    }

    fn render_frame(&mut self, fps_est: f32) -> Result<()> {
        self.canvas.clear();
        self.canvas.blit(&self.water, 0, 0);
        let gy = self.canvas.h as i32 - self.ground.h as i32;
        self.canvas.blit(&self.ground, 0, gy);

        if self.aquarium.show_grid {
            self.draw_grid_lines();
        }

        let scale = self.world_scale();
        self.aquarium.draw(&mut self.canvas, scale);

        self.renderer.clear_back(BG);
        canvas_to_cells(&self.canvas, &mut self.renderer, self.settings.enable_color, BG);

        if self.aquarium.show_grid {
            self.draw_grid_labels();
        }
        if self.show_hud {
            self.draw_hud(fps_est);
        }
        if self.show_help {
            self.draw_help();
        }

        let mut out = io::stdout();
        self.renderer.flush(&mut out)?;
        Ok(())
    }

    /// Debug gridlines every 100 world units, drawn in device space so
    /// they stay hairline-thin at any terminal size.
    fn draw_grid_lines(&mut self) {
        let (sx, sy) = self.world_scale();

        let mut x = 0.0;
        while x <= TANK_WIDTH {
            let dx = (x * sx) as i32;
            for dy in 0..self.canvas.h as i32 {
                self.canvas.plot(dx, dy, GRID_INK);
            }
            x += 100.0;
        }

        let mut y = 0.0;
        while y <= TANK_HEIGHT {
            let dy = (y * sy) as i32;
            for dx in 0..self.canvas.w as i32 {
                self.canvas.plot(dx, dy, GRID_INK);
            }
            y += 100.0;
        }
    }

    fn draw_grid_labels(&mut self) {
        let (sx, sy) = self.world_scale();
        let label_fg = Color::Rgb {
            r: 220,
            g: 220,
            b: 220,
        };

        let mut x = 100.0f32;
        while x < TANK_WIDTH {
            let col = (x * sx) as u16 / SUB_X as u16;
            self.renderer
                .draw_text(col.saturating_add(1), 2, &format!("{}", x as i32), label_fg, BG);
            x += 100.0;
        }

        let mut y = 100.0f32;
        while y < TANK_HEIGHT {
            let row = (y * sy) as u16 / SUB_Y as u16;
            self.renderer
                .draw_text(0, row, &format!("{}", y as i32), label_fg, BG);
            y += 100.0;
        }
    }

    fn draw_hud(&mut self, fps_est: f32) {
        let (fish, plants, rocks) = self.aquarium.counts();
        let line = format!(
            " aquarium | fish: {fish}  plants: {plants}  rocks: {rocks} | {} | grid: {} | {:.0} fps ",
            if self.aquarium.is_running() {
                "running"
            } else {
                "paused"
            },
            if self.aquarium.show_grid { "on" } else { "off" },
            fps_est
        );
        self.renderer.draw_text(0, 0, &line, HUD_FG, BG);

        let hint = " q quit  space pause  f feed  s fish  p plant  r rock  x clear  e export  i import  g grid  ? help ";
        if self.rows > 1 {
            let row = self.rows - 1;
            if let Some((msg, _)) = &self.status {
                let text = format!(" {msg} ");
                self.renderer.draw_text(0, row, &text, HUD_FG, BG);
            } else {
                self.renderer.draw_text(0, row, hint, HUD_FG, BG);
            }
        }
    }

    fn draw_help(&mut self) {
        let lines = [
            "Procedural Aquarium",
            "",
            "q / esc   quit",
            "space     pause or resume the tank",
            "f         drop food (flakes sink from the surface)",
            "s / p / r spawn a fish / plant / rock",
            "x         clear all fish",
            "e / i     export / import tank JSON",
            "g         toggle the 100-unit debug grid",
            "h         toggle the HUD",
            "click     poke a fish to change its direction",
        ];

        let box_w = (lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4).min(self.cols as usize);
        let box_h = (lines.len() + 2).min(self.rows as usize);
        let x0 = (self.cols as usize).saturating_sub(box_w) / 2;
        let y0 = (self.rows as usize).saturating_sub(box_h) / 2;

        for y in 0..box_h {
            for x in 0..box_w {
                let border = x == 0 || x == box_w - 1 || y == 0 || y == box_h - 1;
                let ch = if border {
                    match (x == 0, x == box_w - 1, y == 0, y == box_h - 1) {
                        (true, _, true, _) => '┌',
                        (_, true, true, _) => '┐',
                        (true, _, _, true) => '└',
                        (_, true, _, true) => '┘',
                        (_, _, true, _) | (_, _, _, true) => '─',
                        _ => '│',
                    }
                } else {
                    ' '
                };
                self.renderer.put(
                    (x0 + x) as u16,
                    (y0 + y) as u16,
                    Cell {
                        ch,
                        fg: HUD_FG,
                        bg: BG,
                    },
                );
            }
        }

        for (i, line) in lines.iter().enumerate() {
            if i + 1 >= box_h {
                break;
            }
            self.renderer
                .draw_text((x0 + 2) as u16, (y0 + 1 + i) as u16, line, HUD_FG, BG);
        }
    }

    fn run(&mut self) -> Result<()> {
        let frame_budget = Duration::from_millis(1000 / self.settings.fps_cap.clamp(10, 240) as u64);

        let mut last = Instant::now();
        let mut fps_acc = 0.0f32;
        let mut fps_frames = 0u32;
        let mut fps_est = 0.0f32;

        while !self.should_quit {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                if let Some(action) = map_event(event::read()?) {
                    self.apply(action);
                }
            }

            let now = Instant::now();
            let dt = ((now - last).as_secs_f32()).min(DT_CLAMP);
            last = now;

            fps_acc += dt;
            fps_frames += 1;
            if fps_acc >= 0.5 {
                fps_est = fps_frames as f32 / fps_acc;
                fps_acc = 0.0;
                fps_frames = 0;
            }

            if let Some((_, remaining)) = &mut self.status {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    self.status = None;
                }
            }

            self.aquarium.tick(dt);
            self.render_frame(fps_est)?;

            let elapsed = frame_start.elapsed();
            if elapsed < frame_budget {
                std::thread::sleep(frame_budget - elapsed);
            }
        }

        save_settings(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }
}

fn make_textures<R: rand::Rng>(rng: &mut R, w: usize, h: usize) -> (Texture, Texture) {
    let water = water_texture(rng, w, h);
    // The gravel strip plus a small margin for the wavy top edge.
    let strip = ((GRAVEL_HEIGHT * 1.25) * (h as f32 / TANK_HEIGHT)) as usize;
    let ground = ground_texture(rng, w, strip.max(1));
    (water, ground)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = queue!(
            out,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = out.flush();
        let _ = terminal::disable_raw_mode();
    }
}

pub fn run(args: Args) -> Result<()> {
    let mut out = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(
        out,
        EnterAlternateScreen,
        DisableLineWrap,
        cursor::Hide,
        EnableMouseCapture,
        Clear(ClearType::All)
    )?;
    let _guard = TerminalGuard;

    let mut app = App::init(args)?;
    app.run()
}
