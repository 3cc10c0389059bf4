use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BeatError, BeatResult};
use super::fractal::{self, FractalKind, FractalParams, FractalParamsUpdate};
use super::palette::ColorScheme;
use super::particles::{self, Particle, MAX_PARTICLES};
use super::scope;
use super::surface::Surface;

pub const ANALYSIS_WINDOW: usize = 1024;

// Non-blocking read of the most recent analysis window, if there is one yet.
pub trait SignalTap {
    fn sample_frame(&mut self) -> Option<&[f32]>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VizType {
    Particles,
    Waveform,
    Spectrum,
    Circular,
    Matrix,
    Vortex,
    Mandelbrot,
    Julia,
    BurningShip,
    LightTunnel,
}

impl VizType {
    pub const ALL: [VizType; 10] = [
        VizType::Particles,
        VizType::Waveform,
        VizType::Spectrum,
        VizType::Circular,
        VizType::Matrix,
        VizType::Vortex,
        VizType::Mandelbrot,
        VizType::Julia,
        VizType::BurningShip,
        VizType::LightTunnel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VizType::Particles => "PARTCL",
            VizType::Waveform => "WAVE",
            VizType::Spectrum => "SPECTR",
            VizType::Circular => "CIRCLE",
            VizType::Matrix => "MATRIX",
            VizType::Vortex => "VORTEX",
            VizType::Mandelbrot => "MANDEL",
            VizType::Julia => "JULIA",
            VizType::BurningShip => "SHIP",
            VizType::LightTunnel => "TUNNEL",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    fn fractal(self) -> Option<FractalKind> {
        match self {
            VizType::Mandelbrot => Some(FractalKind::Mandelbrot),
            VizType::Julia => Some(FractalKind::Julia),
            VizType::BurningShip => Some(FractalKind::BurningShip),
            _ => None,
        }
    }
}

// Everything the user can set on the visualizer; persisted with the project.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub viz_type: VizType,
    pub color_scheme: ColorScheme,
    pub particle_count: usize,
    pub speed: f32,
    pub fractal: FractalParams,
    pub link_distance: Option<f32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viz_type: VizType::Particles,
            color_scheme: ColorScheme::Neon,
            particle_count: 50,
            speed: 1.0,
            fractal: FractalParams::default(),
            link_distance: Some(24.0),
        }
    }
}

pub struct SignalRenderer<R: Rng> {
    config: RenderConfig,
    rng: R,
    particles: Vec<Particle>,
    pool_size: (u32, u32), // surface size the pool was spawned for
    frame: Vec<f32>,
    frame_count: u64,
    tunnel_rotation: f32,
    min_frame_ms: Option<f64>,
    last_frame_ms: Option<f64>,
}

impl<R: Rng> SignalRenderer<R> {
    pub fn new(rng: R, config: RenderConfig) -> Self {
        Self {
            config,
            rng,
            particles: Vec::new(),
            pool_size: (0, 0),
            frame: vec![0.0; ANALYSIS_WINDOW],
            frame_count: 0,
            tunnel_rotation: 0.0,
            min_frame_ms: None,
            last_frame_ms: None,
        }
    }

    // Optional cap; frames arriving sooner than 1000/fps ms after the last
    // drawn one are skipped.
    pub fn with_frame_cap(mut self, fps: Option<u32>) -> Self {
        self.min_frame_ms = fps.filter(|f| *f > 0).map(|f| 1000.0 / f as f64);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn fractal_params(&self) -> FractalParams {
        self.config.fractal
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn update_particle_count(&mut self, count: i64) -> BeatResult<()> {
        if count < 0 {
            return Err(BeatError::invalid("particle_count", count as f64));
        }
        self.config.particle_count = (count as usize).min(MAX_PARTICLES);
        self.rebuild_particles();
        Ok(())
    }

    pub fn update_color_scheme(&mut self, scheme: ColorScheme) {
        self.config.color_scheme = scheme;
        self.rebuild_particles();
    }

    pub fn update_speed(&mut self, speed: f32) -> BeatResult<()> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(BeatError::invalid("speed", speed));
        }
        self.config.speed = speed;
        Ok(())
    }

    pub fn update_viz_type(&mut self, viz_type: VizType) {
        debug!(viz = viz_type.label(), "viz type");
        self.config.viz_type = viz_type;
    }

    pub fn update_fractal_params(&mut self, update: FractalParamsUpdate) -> BeatResult<()> {
        self.config.fractal = self.config.fractal.apply(update)?;
        Ok(())
    }

    fn rebuild_particles(&mut self) {
        let (w, h) = self.pool_size;
        self.particles = particles::spawn_pool(
            &mut self.rng,
            self.config.particle_count,
            w as f32,
            h as f32,
            self.config.color_scheme,
        );
    }

    // Latest window from the tap, or silence when there is none yet.
    pub fn sample_signal(&mut self, tap: &mut dyn SignalTap) -> &[f32] {
        match tap.sample_frame() {
            Some(samples) => {
                self.frame.clear();
                self.frame.extend_from_slice(samples);
            }
            None => self.frame.fill(0.0),
        }
        &self.frame
    }

    // One display refresh. Returns false when the frame cap skipped it.
    pub fn frame(&mut self, now_ms: f64, tap: &mut dyn SignalTap, surface: &mut dyn Surface) -> bool {
        if let (Some(min), Some(last)) = (self.min_frame_ms, self.last_frame_ms) {
            if now_ms - last < min {
                return false;
            }
        }
        self.last_frame_ms = Some(now_ms);
        self.sample_signal(tap);
        let frame = std::mem::take(&mut self.frame);
        surface.clear();
        self.render(&frame, surface);
        self.frame = frame;
        true
    }

    pub fn render(&mut self, frame: &[f32], surface: &mut dyn Surface) {
        let size = (surface.width(), surface.height());
        if size != self.pool_size {
            self.pool_size = size;
            self.rebuild_particles();
        }
        let level = scope::mean_abs(frame);
        let scheme = self.config.color_scheme;
        let rng = &mut self.rng;

        match self.config.viz_type {
            VizType::Particles => particles::draw(
                surface,
                &mut self.particles,
                self.config.speed,
                level,
                self.config.link_distance,
            ),
            VizType::Waveform => scope::waveform(surface, frame, scheme.random_color(rng)),
            VizType::Spectrum => scope::spectrum(surface, frame, || scheme.random_color(rng)),
            VizType::Circular => scope::circular(surface, frame, scheme.random_color(rng)),
            VizType::Matrix => scope::matrix(surface, frame),
            VizType::Vortex => {
                scope::vortex(surface, frame, self.frame_count, || scheme.random_color(rng))
            }
            VizType::LightTunnel => {
                self.tunnel_rotation += 0.01 * self.config.speed * (1.0 + level * 4.0);
                scope::light_tunnel(surface, self.tunnel_rotation, level, scheme.colors());
            }
            kind => {
                if let Some(kind) = kind.fractal() {
                    fractal::draw(surface, kind, &self.config.fractal, self.frame_count, level);
                }
            }
        }
        self.frame_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedTap;
    use crate::viz::PixelSurface;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn renderer() -> SignalRenderer<StdRng> {
        SignalRenderer::new(StdRng::seed_from_u64(1), RenderConfig::default())
    }

    #[test]
    fn missing_signal_reads_as_silence() {
        let mut r = renderer();
        let mut tap = FixedTap::default();
        let frame = r.sample_signal(&mut tap);
        assert_eq!(frame.len(), ANALYSIS_WINDOW);
        assert!(frame.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn sampled_signal_is_copied_through() {
        let mut r = renderer();
        let mut tap = FixedTap::constant(ANALYSIS_WINDOW, 0.25);
        assert!(r.sample_signal(&mut tap).iter().all(|s| *s == 0.25));
        tap.frame = None;
        assert!(r.sample_signal(&mut tap).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn particle_pool_is_rebuilt_fresh() {
        let mut r = renderer();
        let mut surface = PixelSurface::new(80, 60);
        r.render(&[0.0; 16], &mut surface);
        r.update_particle_count(50).unwrap();
        assert_eq!(r.particles().len(), 50);
        // move the old pool so stale state would be visible
        for _ in 0..5 {
            r.render(&[0.0; 16], &mut surface);
        }
        let old: Vec<Particle> = r.particles().to_vec();
        r.update_particle_count(10).unwrap();
        assert_eq!(r.particles().len(), 10);
        assert_eq!(r.config().particle_count, 10);
        for p in r.particles() {
            assert!((2.0..7.0).contains(&p.size));
            assert!(ColorScheme::Neon.colors().contains(&p.color));
            assert!(!old.contains(p));
        }
    }

    #[test]
    fn particle_count_limits() {
        let mut r = renderer();
        assert!(matches!(
            r.update_particle_count(-1),
            Err(BeatError::InvalidConfiguration { param: "particle_count", .. })
        ));
        r.update_particle_count(500).unwrap();
        assert_eq!(r.particles().len(), MAX_PARTICLES);
    }

    #[test]
    fn color_scheme_change_recolors_particles() {
        let mut r = renderer();
        r.update_particle_count(30).unwrap();
        r.update_color_scheme(ColorScheme::Monochrome);
        assert_eq!(r.particles().len(), 30);
        assert!(r.particles().iter().all(|p| ColorScheme::Monochrome.colors().contains(&p.color)));
    }

    #[test]
    fn fractal_params_partial_update() {
        let mut r = renderer();
        let before = r.fractal_params();
        r.update_fractal_params(FractalParamsUpdate { zoom: Some(2.0), ..Default::default() })
            .unwrap();
        assert_eq!(r.fractal_params(), FractalParams { zoom: 2.0, ..before });
        assert!(r.update_fractal_params(FractalParamsUpdate { zoom: Some(-1.0), ..Default::default() }).is_err());
        assert_eq!(r.fractal_params().zoom, 2.0);
    }

    #[test]
    fn speed_validation() {
        let mut r = renderer();
        r.update_speed(2.5).unwrap();
        assert_eq!(r.config().speed, 2.5);
        assert!(r.update_speed(-0.1).is_err());
        assert!(r.update_speed(f32::INFINITY).is_err());
        assert_eq!(r.config().speed, 2.5);
    }

    #[test]
    fn frame_cap_skips_early_frames() {
        let mut r = renderer().with_frame_cap(Some(60));
        let mut tap = FixedTap::default();
        let mut surface = PixelSurface::new(32, 32);
        assert!(r.frame(0.0, &mut tap, &mut surface));
        assert!(!r.frame(10.0, &mut tap, &mut surface));
        assert!(r.frame(17.0, &mut tap, &mut surface));
        assert_eq!(r.frame_count(), 2);
    }

    #[test]
    fn every_mode_draws_something_for_a_loud_signal() {
        let mut surface = PixelSurface::new(64, 48);
        let mut tap = FixedTap {
            frame: Some((0..ANALYSIS_WINDOW).map(|i| ((i as f32) * 0.05).sin() * 0.8).collect()),
        };
        for viz in VizType::ALL {
            let mut r = renderer();
            r.update_viz_type(viz);
            assert!(r.frame(0.0, &mut tap, &mut surface));
            assert!(surface.lit_pixels() > 0, "{:?} drew nothing", viz);
        }
    }

    #[test]
    fn frame_clears_previous_image() {
        let mut surface = PixelSurface::new(32, 32);
        let mut r = renderer();
        r.update_viz_type(VizType::Vortex);
        let mut loud = FixedTap::constant(256, 0.9);
        r.frame(0.0, &mut loud, &mut surface);
        assert!(surface.lit_pixels() > 0);
        let mut silent = FixedTap::default();
        r.frame(100.0, &mut silent, &mut surface);
        assert_eq!(surface.lit_pixels(), 0);
    }

    #[test]
    fn viz_type_cycles() {
        let mut v = VizType::Particles;
        for _ in 0..VizType::ALL.len() {
            v = v.next();
        }
        assert_eq!(v, VizType::Particles);
    }
}
