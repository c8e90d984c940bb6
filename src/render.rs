//! Terminal rendering: an RGBA subpixel canvas the entities paint into
//! (with a 2D transform stack mirroring their draw calls), braille
//! conversion with per-cell ink color, and a double-buffered diff
//! renderer over crossterm.

use crate::color::Rgb;
use crate::entity::Vec2;
use crossterm::{
    cursor, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate},
};
use std::io::{self, Stdout, Write};

// Braille: each terminal cell is 2x4 subpixels.
pub const SUB_X: usize = 2;
pub const SUB_Y: usize = 4;

/// Alpha at or above which a subpixel counts as ink for the braille mask.
pub const INK_ALPHA: u8 = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn solid(c: Rgb) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: 255,
        }
    }

    pub const fn tinted(c: Rgb, a: u8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a,
        }
    }
}

/// Row-major affine transform, canvas-2D convention:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Clone, Copy, Debug)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translation(tx: f32, ty: f32) -> Self {
        Affine {
            e: tx,
            f: ty,
            ..Affine::IDENTITY
        }
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Affine {
            a: sx,
            d: sy,
            ..Affine::IDENTITY
        }
    }

    pub fn rotation(theta: f32) -> Self {
        let (s, c) = theta.sin_cos();
        Affine {
            a: c,
            b: s,
            c: -s,
            d: c,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Compose so that `rhs` applies first: `(self * rhs)(p) = self(rhs(p))`.
    pub fn then(self, rhs: Affine) -> Affine {
        Affine {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn invert(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-9 {
            return None;
        }
        let inv = 1.0 / det;
        let a = self.d * inv;
        let b = -self.b * inv;
        let c = -self.c * inv;
        let d = self.a * inv;
        Some(Affine {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }
}

/// Subpixel drawing surface. Shape fills rasterize over the device-space
/// bounding box of the transformed shape and test each pixel centre back
/// in shape-local space, so arbitrary translate/scale/rotate stacks work.
pub struct Canvas {
    pub w: usize,
    pub h: usize,
    pub px: Vec<Pixel>,
    cur: Affine,
    stack: Vec<Affine>,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); w * h],
            cur: Affine::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px = vec![Pixel::default(); w * h];
        self.cur = Affine::IDENTITY;
        self.stack.clear();
    }

    pub fn clear(&mut self) {
        self.px.fill(Pixel::default());
        self.cur = Affine::IDENTITY;
        self.stack.clear();
    }

    pub fn save(&mut self) {
        self.stack.push(self.cur);
    }

    pub fn restore(&mut self) {
        if let Some(m) = self.stack.pop() {
            self.cur = m;
        }
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.cur = self.cur.then(Affine::translation(tx, ty));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.cur = self.cur.then(Affine::scaling(sx, sy));
    }

    pub fn rotate(&mut self, theta: f32) {
        self.cur = self.cur.then(Affine::rotation(theta));
    }

    pub fn transform(&self) -> Affine {
        self.cur
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }

    /// Alpha-over blend a pixel in device space.
    pub fn plot(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }

    /// Device-space bbox of a set of local points under the current
    /// transform, padded a little and clipped to the canvas.
    fn device_bbox(&self, pts: &[(f32, f32)]) -> Option<(i32, i32, i32, i32)> {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for &(x, y) in pts {
            let (dx, dy) = self.cur.apply(x, y);
            if !dx.is_finite() || !dy.is_finite() {
                return None;
            }
            min_x = min_x.min(dx);
            min_y = min_y.min(dy);
            max_x = max_x.max(dx);
            max_y = max_y.max(dy);
        }
        let x0 = (min_x.floor() as i32 - 1).max(0);
        let y0 = (min_y.floor() as i32 - 1).max(0);
        let x1 = (max_x.ceil() as i32 + 1).min(self.w as i32 - 1);
        let y1 = (max_y.ceil() as i32 + 1).min(self.h as i32 - 1);
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }

    fn fill_with<F: Fn(f32, f32) -> bool>(&mut self, corners: &[(f32, f32)], paint: Pixel, inside: F) {
        let Some(inv) = self.cur.invert() else {
            return;
        };
        let Some((x0, y0, x1, y1)) = self.device_bbox(corners) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (lx, ly) = inv.apply(x as f32 + 0.5, y as f32 + 0.5);
                if inside(lx, ly) {
                    self.plot(x, y, paint);
                }
            }
        }
    }

    /// Axis-aligned (in local space) rectangle from its top-left corner.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: Pixel) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let corners = [(x, y), (x + w, y), (x, y + h), (x + w, y + h)];
        self.fill_with(&corners, paint, |lx, ly| {
            lx >= x && lx <= x + w && ly >= y && ly <= y + h
        });
    }

    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, paint: Pixel) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let corners = [
            (cx - rx, cy - ry),
            (cx + rx, cy - ry),
            (cx - rx, cy + ry),
            (cx + rx, cy + ry),
        ];
        self.fill_with(&corners, paint, |lx, ly| {
            let dx = (lx - cx) / rx;
            let dy = (ly - cy) / ry;
            dx * dx + dy * dy <= 1.0
        });
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, paint: Pixel) {
        self.fill_ellipse(cx, cy, r, r, paint);
    }

    /// Even-odd filled polygon; the point test runs in device space.
    pub fn fill_polygon(&mut self, points: &[Vec2], paint: Pixel) {
        if points.len() < 3 {
            return;
        }
        let device: Vec<(f32, f32)> = points.iter().map(|p| self.cur.apply(p.x, p.y)).collect();
        if device.iter().any(|&(x, y)| !x.is_finite() || !y.is_finite()) {
            return;
        }

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        for &(x, y) in &device {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let x0 = (min_x.floor() as i32 - 1).max(0);
        let y0 = (min_y.floor() as i32 - 1).max(0);
        let x1 = (max_x.ceil() as i32 + 1).min(self.w as i32 - 1);
        let y1 = (max_y.ceil() as i32 + 1).min(self.h as i32 - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                if point_in_polygon(&device, x as f32 + 0.5, y as f32 + 0.5) {
                    self.plot(x, y, paint);
                }
            }
        }
    }

    /// Copy a pregenerated texture at a device-space offset.
    pub fn blit(&mut self, texture: &Texture, dx: i32, dy: i32) {
        for ty in 0..texture.h {
            for tx in 0..texture.w {
                let p = texture.px[ty * texture.w + tx];
                if p.a == 0 {
                    continue;
                }
                self.plot(dx + tx as i32, dy + ty as i32, p);
            }
        }
    }
}

/// A pregenerated pixel rectangle (water/ground backgrounds).
#[derive(Clone)]
pub struct Texture {
    pub w: usize,
    pub h: usize,
    pub px: Vec<Pixel>,
}

impl Texture {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); w * h],
        }
    }
}

fn point_in_polygon(pts: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut inside = false;
    let n = pts.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = pts[i];
        let (xj, yj) = pts[j];
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/* -----------------------------
   Cell grid + diff flush
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    pub fn blank(bg: Color) -> Self {
        Self {
            ch: ' ',
            fg: Color::Reset,
            bg,
        }
    }
}

pub struct Renderer {
    pub w: u16,
    pub h: u16,
    front: Vec<Cell>,
    back: Vec<Cell>,
    pub full_redraw: bool,
    last_fg: Color,
    last_bg: Color,
}

impl Renderer {
    pub fn new(w: u16, h: u16, bg: Color) -> Self {
        let n = (w as usize) * (h as usize);
        Self {
            w,
            h,
            front: vec![Cell::blank(bg); n],
            back: vec![Cell::blank(bg); n],
            full_redraw: true,
            last_fg: Color::Reset,
            last_bg: bg,
        }
    }

    pub fn resize(&mut self, w: u16, h: u16, bg: Color) {
        *self = Renderer::new(w, h, bg);
    }

    #[inline]
    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub fn clear_back(&mut self, bg: Color) {
        for c in &mut self.back {
            *c = Cell::blank(bg);
        }
    }

    pub fn put(&mut self, x: u16, y: u16, cell: Cell) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        self.back[i] = cell;
    }

    pub fn draw_text(&mut self, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            let xx = x.saturating_add(i as u16);
            if xx >= self.w {
                break;
            }
            self.put(xx, y, Cell { ch, fg, bg });
        }
    }

    pub fn flush(&mut self, out: &mut Stdout) -> io::Result<()> {
        queue!(out, BeginSynchronizedUpdate)?;

        let w = self.w as usize;
        let h = self.h as usize;
        for y in 0..h {
            for x in 0..w {
                let i = y * w + x;
                let b = self.back[i];
                if !self.full_redraw && b == self.front[i] {
                    continue;
                }

                if b.bg != self.last_bg {
                    queue!(out, SetBackgroundColor(b.bg))?;
                    self.last_bg = b.bg;
                }
                if b.fg != self.last_fg {
                    queue!(out, SetForegroundColor(b.fg))?;
                    self.last_fg = b.fg;
                }

                queue!(out, cursor::MoveTo(x as u16, y as u16), Print(b.ch))?;
                self.front[i] = b;
            }
        }

        self.full_redraw = false;
        queue!(out, ResetColor, EndSynchronizedUpdate)?;
        out.flush()
    }
}

/// Collapse the subpixel canvas into braille cells, coloring each cell by
/// the average of its inked subpixels.
pub fn canvas_to_cells(canvas: &Canvas, out: &mut Renderer, enable_color: bool, bg: Color) {
    let cols = (out.w as usize).min(canvas.w / SUB_X);
    let rows = (out.h as usize).min(canvas.h / SUB_Y);

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * SUB_X;
            let py0 = cy * SUB_Y;

            let mut mask = 0u8;
            let mut sum_r = 0u32;
            let mut sum_g = 0u32;
            let mut sum_b = 0u32;
            let mut ink = 0u32;

            for dy in 0..SUB_Y {
                for dx in 0..SUB_X {
                    let p = canvas.px[(py0 + dy) * canvas.w + (px0 + dx)];
                    if p.a >= INK_ALPHA {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink += 1;
                    }
                }
            }

            let ch = if mask == 0 {
                ' '
            } else {
                char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
            };
            let fg = if enable_color && ink > 0 {
                Color::Rgb {
                    r: (sum_r / ink) as u8,
                    g: (sum_g / ink) as u8,
                    b: (sum_b / ink) as u8,
                }
            } else {
                Color::White
            };

            out.put(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

fn braille_bit(dx: usize, dy: usize) -> u8 {
    // Dot layout: (0,0)=1 (0,1)=2 (0,2)=3 (0,3)=7 / (1,0)=4 (1,1)=5 (1,2)=6 (1,3)=8
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_count(canvas: &Canvas) -> usize {
        canvas.px.iter().filter(|p| p.a >= INK_ALPHA).count()
    }

    #[test]
    fn affine_round_trip() {
        let m = Affine::translation(3.0, 4.0)
            .then(Affine::rotation(0.7))
            .then(Affine::scaling(2.0, -1.5));
        let inv = m.invert().expect("invertible");
        let (x, y) = m.apply(5.0, -2.0);
        let (bx, by) = inv.apply(x, y);
        assert!((bx - 5.0).abs() < 1e-4 && (by + 2.0).abs() < 1e-4);
    }

    #[test]
    fn rect_fill_respects_translation() {
        let mut canvas = Canvas::new(40, 40);
        canvas.save();
        canvas.translate(10.0, 10.0);
        canvas.fill_rect(0.0, 0.0, 4.0, 4.0, Pixel::solid(Rgb::new(255, 0, 0)));
        canvas.restore();

        assert!(canvas.px[12 * 40 + 12].a > 0);
        assert_eq!(canvas.px[2 * 40 + 2].a, 0);
    }

    #[test]
    fn mirrored_scale_flips_shapes() {
        let triangle = [Vec2::new(8.0, 0.0), Vec2::new(-8.0, -4.0), Vec2::new(-8.0, 4.0)];
        let paint = Pixel::solid(Rgb::new(0, 255, 0));

        let mut plain = Canvas::new(40, 40);
        plain.save();
        plain.translate(20.0, 20.0);
        plain.fill_polygon(&triangle, paint);
        plain.restore();

        let mut flipped = Canvas::new(40, 40);
        flipped.save();
        flipped.translate(20.0, 20.0);
        flipped.scale(-1.0, 1.0);
        flipped.fill_polygon(&triangle, paint);
        flipped.restore();

        // The flipped render is the mirror image around device x = 20,
        // give or take the half-pixel sampling offset.
        assert_eq!(ink_count(&plain), ink_count(&flipped));
        for y in 0..40usize {
            for x in 0..40usize {
                let mirror_x = 39 - x;
                assert_eq!(
                    plain.px[y * 40 + x].a >= INK_ALPHA,
                    flipped.px[y * 40 + mirror_x].a >= INK_ALPHA,
                    "mismatch at ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn degenerate_transform_draws_nothing() {
        let mut canvas = Canvas::new(20, 20);
        canvas.scale(0.0, 0.0);
        canvas.fill_rect(0.0, 0.0, 10.0, 10.0, Pixel::solid(Rgb::new(1, 2, 3)));
        assert_eq!(ink_count(&canvas), 0);
    }

    #[test]
    fn ellipse_is_bounded_by_radii() {
        let mut canvas = Canvas::new(30, 30);
        canvas.fill_ellipse(15.0, 15.0, 6.0, 3.0, Pixel::solid(Rgb::new(9, 9, 9)));
        assert!(canvas.px[15 * 30 + 15].a > 0);
        assert_eq!(canvas.px[15 * 30 + 23].a, 0);
        assert_eq!(canvas.px[20 * 30 + 15].a, 0);
    }

    #[test]
    fn braille_mask_uses_standard_dots() {
        let mut canvas = Canvas::new(SUB_X, SUB_Y);
        canvas.plot(0, 0, Pixel::solid(Rgb::new(255, 255, 255)));
        canvas.plot(1, 3, Pixel::solid(Rgb::new(255, 255, 255)));
        let mut renderer = Renderer::new(1, 1, Color::Black);
        canvas_to_cells(&canvas, &mut renderer, false, Color::Black);
        assert_eq!(renderer.back[0].ch, char::from_u32(0x2800 + 0x81).unwrap());
    }
}
