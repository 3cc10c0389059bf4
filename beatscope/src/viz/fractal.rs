// Escape-time fractals. Each pixel is iterated until |z|^2 reaches 4 or
// the cap is hit; the count picks the hue.

use serde::{Deserialize, Serialize};

use crate::error::{BeatError, BeatResult};
use super::surface::{Color, Surface};

pub const PIXEL_STRIDE: u32 = 2;

// Julia constant magnitude and drift rate per frame
const JULIA_RADIUS: f64 = 0.7885;
const JULIA_DRIFT: f64 = 0.005;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FractalKind {
    Mandelbrot,
    Julia,
    BurningShip,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    pub zoom: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub iterations: u32,
    pub color_offset: f32, // degrees of hue
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            iterations: 100,
            color_offset: 0.0,
        }
    }
}

// Partial update: only the fields that are Some change.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FractalParamsUpdate {
    pub zoom: Option<f64>,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
    pub iterations: Option<u32>,
    pub color_offset: Option<f32>,
}

impl FractalParams {
    pub fn apply(&self, update: FractalParamsUpdate) -> BeatResult<Self> {
        let next = Self {
            zoom: update.zoom.unwrap_or(self.zoom),
            offset_x: update.offset_x.unwrap_or(self.offset_x),
            offset_y: update.offset_y.unwrap_or(self.offset_y),
            iterations: update.iterations.unwrap_or(self.iterations),
            color_offset: update.color_offset.unwrap_or(self.color_offset),
        };
        if !next.zoom.is_finite() || next.zoom <= 0.0 {
            return Err(BeatError::invalid("zoom", next.zoom));
        }
        if next.iterations == 0 {
            return Err(BeatError::invalid("iterations", 0));
        }
        if !next.offset_x.is_finite() || !next.offset_y.is_finite() {
            return Err(BeatError::invalid("offset", next.offset_x + next.offset_y));
        }
        if !next.color_offset.is_finite() {
            return Err(BeatError::invalid("color_offset", next.color_offset));
        }
        Ok(next)
    }
}

// z <- z^2 + c from z0, counting iterations while |z|^2 < 4
pub fn escape_time(kind: FractalKind, z0: (f64, f64), c: (f64, f64), max_iter: u32) -> u32 {
    let (mut zx, mut zy) = z0;
    let mut i = 0;
    while zx * zx + zy * zy < 4.0 && i < max_iter {
        if kind == FractalKind::BurningShip {
            zx = zx.abs();
            zy = zy.abs();
        }
        let next_x = zx * zx - zy * zy + c.0;
        zy = 2.0 * zx * zy + c.1;
        zx = next_x;
        i += 1;
    }
    i
}

pub fn julia_constant(frame: u64) -> (f64, f64) {
    let t = frame as f64 * JULIA_DRIFT;
    (JULIA_RADIUS * t.sin(), JULIA_RADIUS * t.cos())
}

// The parameters actually used for one frame: the configured ones, breathing
// with the frame count and pushed by the signal level. At frame 0 in
// silence this is exactly `params`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameView {
    pub zoom: f64,
    pub center: (f64, f64),
    pub max_iter: u32,
}

impl FrameView {
    pub fn new(params: &FractalParams, frame: u64, level: f32) -> Self {
        let f = frame as f64;
        let level = level as f64;
        let breath = (f * 0.02).sin();
        let zoom = params.zoom * (1.0 + 0.15 * breath + level);
        let drift = 0.05 * level;
        let center = (
            params.offset_x + drift * (f * 0.01).cos(),
            params.offset_y + drift * (f * 0.01).sin(),
        );
        let iters = params.iterations as f64 * (1.0 + 0.2 * breath) + level * 50.0;
        Self {
            zoom,
            center,
            max_iter: iters.round().max(1.0) as u32,
        }
    }

    // the full width spans 3 units of the plane at zoom 1
    pub fn to_plane(&self, px: f64, py: f64, width: f64, height: f64) -> (f64, f64) {
        let scale = 3.0 / (width.max(1.0) * self.zoom);
        (
            (px - width / 2.0) * scale + self.center.0,
            (py - height / 2.0) * scale + self.center.1,
        )
    }
}

pub fn hue_for(iter: u32, max_iter: u32, color_offset: f32) -> Color {
    if iter >= max_iter {
        return Color::BLACK;
    }
    let hue = iter as f32 / max_iter as f32 * 360.0 + color_offset;
    Color::hsl(hue, 1.0, 0.5)
}

pub fn draw(
    surface: &mut dyn Surface,
    kind: FractalKind,
    params: &FractalParams,
    frame: u64,
    level: f32,
) {
    let view = FrameView::new(params, frame, level);
    let (w, h) = (surface.width(), surface.height());
    let julia_c = julia_constant(frame);
    for py in (0..h).step_by(PIXEL_STRIDE as usize) {
        for px in (0..w).step_by(PIXEL_STRIDE as usize) {
            let p = view.to_plane(px as f64, py as f64, w as f64, h as f64);
            let iter = match kind {
                FractalKind::Julia => escape_time(kind, p, julia_c, view.max_iter),
                _ => escape_time(kind, (0.0, 0.0), p, view.max_iter),
            };
            let color = hue_for(iter, view.max_iter, params.color_offset);
            if color == Color::BLACK {
                continue;
            }
            surface.set_fill_color(color);
            surface.fill_rect(px as f32, py as f32, PIXEL_STRIDE as f32, PIXEL_STRIDE as f32);
        }
    }
}
