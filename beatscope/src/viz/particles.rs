use rand::Rng;

use super::palette::ColorScheme;
use super::surface::{Color, Surface};

pub const MAX_PARTICLES: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub color: Color,
}

impl Particle {
    pub fn spawn(rng: &mut impl Rng, width: f32, height: f32, scheme: ColorScheme) -> Self {
        Self {
            x: rng.gen_range(0.0..width.max(1.0)),
            y: rng.gen_range(0.0..height.max(1.0)),
            size: rng.gen_range(2.0..7.0),
            speed_x: rng.gen_range(-2.0..2.0),
            speed_y: rng.gen_range(-2.0..2.0),
            color: scheme.random_color(rng),
        }
    }

    // wraps to the opposite edge once fully past one
    pub fn step(&mut self, speed: f32, width: f32, height: f32) {
        self.x += self.speed_x * speed;
        self.y += self.speed_y * speed;
        if self.x < 0.0 {
            self.x = width;
        } else if self.x > width {
            self.x = 0.0;
        }
        if self.y < 0.0 {
            self.y = height;
        } else if self.y > height {
            self.y = 0.0;
        }
    }
}

pub fn spawn_pool(
    rng: &mut impl Rng,
    count: usize,
    width: f32,
    height: f32,
    scheme: ColorScheme,
) -> Vec<Particle> {
    (0..count).map(|_| Particle::spawn(rng, width, height, scheme)).collect()
}

pub fn draw(
    surface: &mut dyn Surface,
    particles: &mut [Particle],
    speed: f32,
    level: f32,
    link_distance: Option<f32>,
) {
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    for p in particles.iter_mut() {
        p.step(speed, w, h);
    }

    if let Some(max_d) = link_distance.filter(|d| *d > 0.0) {
        for i in 0..particles.len() {
            for j in (i + 1)..particles.len() {
                let (a, b) = (&particles[i], &particles[j]);
                let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
                if d < max_d {
                    surface.set_stroke_color(a.color.with_alpha(1.0 - d / max_d));
                    surface.stroke_polyline(&[(a.x, a.y), (b.x, b.y)], false);
                }
            }
        }
    }

    let grow = 1.0 + level * 2.0;
    for p in particles.iter() {
        surface.set_fill_color(p.color);
        surface.fill_circle(p.x, p.y, p.size * grow);
    }
}
