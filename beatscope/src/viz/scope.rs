// The stateless draw modes: each maps one analysis window straight onto
// the surface.

use std::f32::consts::TAU;

use super::surface::{Color, Point, Surface};

const MATRIX_COLS: usize = 20;
const MATRIX_ROWS: usize = 10;
const MATRIX_GREEN: Color = Color::rgb(0, 255, 136);

pub fn mean_abs(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    frame.iter().map(|s| s.abs()).sum::<f32>() / frame.len() as f32
}

pub fn waveform(surface: &mut dyn Surface, frame: &[f32], color: Color) {
    if frame.is_empty() {
        return;
    }
    let center_y = surface.height() as f32 / 2.0;
    let slice = surface.width() as f32 / frame.len() as f32;
    let points: Vec<Point> = frame
        .iter()
        .enumerate()
        .map(|(i, s)| (i as f32 * slice, center_y + s * center_y * 0.8))
        .collect();
    surface.set_stroke_color(color);
    surface.stroke_polyline(&points, false);
}

pub fn spectrum(surface: &mut dyn Surface, frame: &[f32], mut color: impl FnMut() -> Color) {
    if frame.is_empty() {
        return;
    }
    let h = surface.height() as f32;
    let bar = surface.width() as f32 / frame.len() as f32;
    for (i, s) in frame.iter().enumerate() {
        let height = s.abs() * h;
        surface.set_fill_color(color());
        surface.fill_rect(i as f32 * bar, h - height, bar, height);
    }
}

pub fn circular(surface: &mut dyn Surface, frame: &[f32], color: Color) {
    if frame.is_empty() {
        return;
    }
    let cx = surface.width() as f32 / 2.0;
    let cy = surface.height() as f32 / 2.0;
    let radius = cx.min(cy) * 0.8;
    let points: Vec<Point> = frame
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let angle = i as f32 / frame.len() as f32 * TAU;
            let r = radius * (1.0 + s * 0.5);
            (cx + angle.cos() * r, cy + angle.sin() * r)
        })
        .collect();
    surface.set_stroke_color(color);
    surface.stroke_polyline(&points, true);
}

pub fn matrix(surface: &mut dyn Surface, frame: &[f32]) {
    if frame.is_empty() {
        return;
    }
    let cell_w = surface.width() as f32 / MATRIX_COLS as f32;
    let cell_h = surface.height() as f32 / MATRIX_ROWS as f32;
    let cells = MATRIX_COLS * MATRIX_ROWS;
    for i in 0..MATRIX_COLS {
        for j in 0..MATRIX_ROWS {
            let index = (i * MATRIX_ROWS + j) * frame.len() / cells;
            let value = frame[index].abs();
            surface.set_fill_color(MATRIX_GREEN.with_alpha(value));
            // one pixel gutter between cells
            surface.fill_rect(i as f32 * cell_w, j as f32 * cell_h, cell_w - 1.0, cell_h - 1.0);
        }
    }
}

pub fn vortex(surface: &mut dyn Surface, frame: &[f32], frame_count: u64, mut color: impl FnMut() -> Color) {
    if frame.is_empty() {
        return;
    }
    let cx = surface.width() as f32 / 2.0;
    let cy = surface.height() as f32 / 2.0;
    let max_radius = cx.min(cy) * 0.8;
    let spin = frame_count as f32 * 0.02;
    let n = frame.len() as f32;
    for (i, s) in frame.iter().enumerate() {
        let angle = i as f32 / n * TAU + spin;
        let radius = i as f32 / n * max_radius;
        surface.set_fill_color(color());
        surface.fill_circle(cx + angle.cos() * radius, cy + angle.sin() * radius, s.abs() * 5.0);
    }
}

pub const TUNNEL_RINGS: usize = 10;
pub const TUNNEL_SEGMENTS: usize = 12;

// Concentric rings of wedges. Alternate wedges are left dark; every other
// ring turns the opposite way. Colours grade from the first palette entry
// at the centre to the last at the rim.
pub fn light_tunnel(surface: &mut dyn Surface, rotation: f32, level: f32, palette: &[Color]) {
    let (Some(&inner), Some(&outer)) = (palette.first(), palette.last()) else {
        return;
    };
    let cx = surface.width() as f32 / 2.0;
    let cy = surface.height() as f32 / 2.0;
    let max_r = (cx * cx + cy * cy).sqrt();
    let wedge = TAU / TUNNEL_SEGMENTS as f32;
    for ring in (0..TUNNEL_RINGS).rev() {
        let t0 = ring as f32 / TUNNEL_RINGS as f32;
        let t1 = (ring + 1) as f32 / TUNNEL_RINGS as f32;
        // rings bunch up toward the centre like a perspective tunnel
        let r0 = max_r * t0 * t0;
        let r1 = max_r * t1 * t1 * (1.0 + level * 0.3);
        let dir = if ring % 2 == 0 { 1.0 } else { -1.0 };
        let color = inner.lerp(outer, t1).with_alpha(0.35 + 0.65 * t1);
        surface.set_fill_color(color);
        for seg in (0..TUNNEL_SEGMENTS).step_by(2) {
            let a0 = seg as f32 * wedge + rotation * dir;
            let a1 = a0 + wedge;
            let quad = [
                (cx + a0.cos() * r0, cy + a0.sin() * r0),
                (cx + a0.cos() * r1, cy + a0.sin() * r1),
                (cx + a1.cos() * r1, cy + a1.sin() * r1),
                (cx + a1.cos() * r0, cy + a1.sin() * r0),
            ];
            surface.fill_polygon(&quad);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::PixelSurface;

    const WHITE: Color = Color::rgb(255, 255, 255);

    #[test]
    fn mean_abs_of_empty_and_mixed() {
        assert_eq!(mean_abs(&[]), 0.0);
        assert_eq!(mean_abs(&[0.5, -0.5, 1.0, -1.0]), 0.75);
    }

    #[test]
    fn silent_waveform_is_a_centre_line() {
        let mut s = PixelSurface::new(64, 32);
        waveform(&mut s, &[0.0; 64], WHITE);
        assert_eq!(s.pixel(10, 16), Some([255, 255, 255]));
        assert_eq!(s.pixel(10, 8), Some([0, 0, 0]));
    }

    #[test]
    fn waveform_offset_follows_amplitude() {
        let mut s = PixelSurface::new(64, 40);
        waveform(&mut s, &[0.5; 64], WHITE);
        // 20 + 0.5 * 20 * 0.8 = 28
        assert_eq!(s.pixel(30, 28), Some([255, 255, 255]));
        assert_eq!(s.pixel(30, 20), Some([0, 0, 0]));
    }

    #[test]
    fn spectrum_bars_grow_with_magnitude() {
        let mut s = PixelSurface::new(4, 10);
        spectrum(&mut s, &[0.0, 0.5, -1.0, 0.2], || WHITE);
        let column = |x| (0..10).filter(|&y| s.pixel(x, y) != Some([0, 0, 0])).count();
        assert_eq!(column(0), 0);
        assert_eq!(column(1), 5);
        assert_eq!(column(2), 10);
        assert_eq!(column(3), 2);
    }

    #[test]
    fn circular_ring_at_base_radius_in_silence() {
        let mut s = PixelSurface::new(50, 50);
        circular(&mut s, &[0.0; 256], WHITE);
        // base radius is 0.8 * 25 = 20
        assert_ne!(s.pixel(45, 25), Some([0, 0, 0]));
        assert_eq!(s.pixel(25, 25), Some([0, 0, 0]));
    }

    #[test]
    fn matrix_cells_brightness_tracks_samples() {
        let mut s = PixelSurface::new(40, 20);
        let mut frame = vec![0.0; 200];
        frame[0] = 1.0;
        matrix(&mut s, &frame);
        assert_eq!(s.pixel(0, 0), Some([0, 255, 136]));
        assert_eq!(s.pixel(0, 2), Some([0, 0, 0]));
    }

    #[test]
    fn vortex_draws_nothing_in_silence() {
        let mut s = PixelSurface::new(40, 40);
        vortex(&mut s, &[0.0; 128], 10, || WHITE);
        assert_eq!(s.lit_pixels(), 0);
        vortex(&mut s, &[0.8; 128], 10, || WHITE);
        assert!(s.lit_pixels() > 0);
    }

    #[test]
    fn tunnel_rotation_moves_the_wedges() {
        let palette = [Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)];
        let mut a = PixelSurface::new(60, 60);
        let mut b = PixelSurface::new(60, 60);
        light_tunnel(&mut a, 0.0, 0.0, &palette);
        light_tunnel(&mut b, TAU / TUNNEL_SEGMENTS as f32, 0.0, &palette);
        assert!(a.lit_pixels() > 0);
        let differs = (0..60).any(|x| (0..60).any(|y| a.pixel(x, y) != b.pixel(x, y)));
        assert!(differs);
    }

    #[test]
    fn tunnel_with_empty_palette_is_blank() {
        let mut s = PixelSurface::new(10, 10);
        light_tunnel(&mut s, 0.3, 0.5, &[]);
        assert_eq!(s.lit_pixels(), 0);
    }
}
