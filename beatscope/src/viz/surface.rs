// The drawing target for the visualizer, plus an in-memory RGB raster that
// implements it. The terminal view blits the raster; tests read it back.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32, // 0.0 - 1.0
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    // h in degrees, s and l in 0..1
    pub fn hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let to_u8 = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
        Color::rgb(to_u8(r), to_u8(g), to_u8(b))
    }

    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }
}

pub type Point = (f32, f32);

pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    fn set_fill_color(&mut self, color: Color);
    fn set_stroke_color(&mut self, color: Color);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);
    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32);
    fn fill_polygon(&mut self, points: &[Point]);
    fn stroke_polyline(&mut self, points: &[Point], closed: bool);
}

#[derive(Clone, Debug)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
    fill: Color,
    stroke: Color,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 3]; (width * height) as usize],
            fill: Color::BLACK,
            stroke: Color::BLACK,
        }
    }

    // Contents are discarded on a size change.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![[0; 3]; (width * height) as usize];
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| **p != [0, 0, 0]).count()
    }

    fn blend(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let px = &mut self.pixels[(y as u64 * self.width as u64 + x as u64) as usize];
        let a = color.a;
        let mix = |dst: u8, src: u8| (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8;
        *px = [mix(px[0], color.r), mix(px[1], color.g), mix(px[2], color.b)];
    }

    fn span(&mut self, y: i64, x0: f32, x1: f32, color: Color) {
        // pixel centres in [x0, x1)
        let start = (x0 - 0.5).ceil().max(0.0) as i64;
        let end = ((x1 - 0.5).ceil() as i64).min(self.width as i64);
        for x in start..end {
            self.blend(x, y, color);
        }
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.pixels.fill([0; 3]);
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.stroke = color;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let y0 = (y - 0.5).ceil().max(0.0) as i64;
        let y1 = ((y + h - 0.5).ceil() as i64).min(self.height as i64);
        let color = self.fill;
        for py in y0..y1 {
            self.span(py, x, x + w, color);
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32) {
        if r <= 0.0 {
            return;
        }
        let color = self.fill;
        if r < 0.5 {
            // too small to cover a pixel centre; still leave a dot
            self.blend(cx.floor() as i64, cy.floor() as i64, color);
            return;
        }
        let y0 = (cy - r).floor() as i64;
        let y1 = (cy + r).ceil() as i64;
        for py in y0..=y1 {
            let dy = py as f32 + 0.5 - cy;
            let d2 = r * r - dy * dy;
            if d2 < 0.0 {
                continue;
            }
            let dx = d2.sqrt();
            self.span(py, cx - dx, cx + dx, color);
        }
    }

    fn fill_polygon(&mut self, points: &[Point]) {
        if points.len() < 3 {
            return;
        }
        let color = self.fill;
        let (min_y, max_y) = points
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
        let y0 = (min_y - 0.5).ceil().max(0.0) as i64;
        let y1 = ((max_y - 0.5).ceil() as i64).min(self.height as i64);
        let mut crossings: Vec<f32> = Vec::with_capacity(points.len());
        for py in y0..y1 {
            let sy = py as f32 + 0.5;
            crossings.clear();
            for i in 0..points.len() {
                let (ax, ay) = points[i];
                let (bx, by) = points[(i + 1) % points.len()];
                // half-open so shared vertices count once
                if (ay <= sy && by > sy) || (by <= sy && ay > sy) {
                    crossings.push(ax + (sy - ay) / (by - ay) * (bx - ax));
                }
            }
            crossings.sort_by(|a, b| a.total_cmp(b));
            for pair in crossings.chunks_exact(2) {
                self.span(py, pair[0], pair[1], color);
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], closed: bool) {
        let color = self.stroke;
        let mut segment = |(ax, ay): Point, (bx, by): Point| {
            let steps = (bx - ax).abs().max((by - ay).abs()).ceil().max(1.0) as usize;
            for s in 0..=steps {
                let t = s as f32 / steps as f32;
                let x = ax + (bx - ax) * t;
                let y = ay + (by - ay) * t;
                self.blend(x.floor() as i64, y.floor() as i64, color);
            }
        };
        for pair in points.windows(2) {
            segment(pair[0], pair[1]);
        }
        if closed && points.len() > 2 {
            segment(points[points.len() - 1], points[0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        assert_eq!(Color::hsl(0.0, 1.0, 0.5), Color::rgb(255, 0, 0));
        assert_eq!(Color::hsl(120.0, 1.0, 0.5), Color::rgb(0, 255, 0));
        assert_eq!(Color::hsl(240.0, 1.0, 0.5), Color::rgb(0, 0, 255));
        assert_eq!(Color::hsl(360.0, 1.0, 0.5), Color::rgb(255, 0, 0));
    }

    #[test]
    fn rect_covers_exact_pixels() {
        let mut s = PixelSurface::new(10, 10);
        s.set_fill_color(Color::rgb(255, 255, 255));
        s.fill_rect(2.0, 3.0, 2.0, 2.0);
        assert_eq!(s.lit_pixels(), 4);
        assert_eq!(s.pixel(2, 3), Some([255, 255, 255]));
        assert_eq!(s.pixel(4, 3), Some([0, 0, 0]));
    }

    #[test]
    fn drawing_is_clipped() {
        let mut s = PixelSurface::new(4, 4);
        s.set_fill_color(Color::rgb(10, 20, 30));
        s.fill_rect(-5.0, -5.0, 100.0, 100.0);
        s.fill_circle(100.0, 100.0, 5.0);
        assert_eq!(s.lit_pixels(), 16);
    }

    #[test]
    fn alpha_blends_over_background() {
        let mut s = PixelSurface::new(1, 1);
        s.set_fill_color(Color::rgb(200, 100, 0).with_alpha(0.5));
        s.fill_rect(0.0, 0.0, 1.0, 1.0);
        assert_eq!(s.pixel(0, 0), Some([100, 50, 0]));
    }

    #[test]
    fn polygon_square() {
        let mut s = PixelSurface::new(10, 10);
        s.set_fill_color(Color::rgb(1, 1, 1));
        s.fill_polygon(&[(1.0, 1.0), (5.0, 1.0), (5.0, 5.0), (1.0, 5.0)]);
        assert_eq!(s.lit_pixels(), 16);
    }

    #[test]
    fn circle_is_roughly_pi_r_squared() {
        let mut s = PixelSurface::new(40, 40);
        s.set_fill_color(Color::rgb(1, 1, 1));
        s.fill_circle(20.0, 20.0, 10.0);
        let area = s.lit_pixels() as f32;
        assert!((area - std::f32::consts::PI * 100.0).abs() < 20.0, "area {}", area);
    }

    #[test]
    fn polyline_touches_both_ends() {
        let mut s = PixelSurface::new(10, 10);
        s.set_stroke_color(Color::rgb(9, 9, 9));
        s.stroke_polyline(&[(0.5, 0.5), (8.5, 8.5)], false);
        assert_eq!(s.pixel(0, 0), Some([9, 9, 9]));
        assert_eq!(s.pixel(8, 8), Some([9, 9, 9]));
        assert_eq!(s.pixel(8, 0), Some([0, 0, 0]));
    }

    #[test]
    fn resize_and_clear() {
        let mut s = PixelSurface::new(2, 2);
        s.set_fill_color(Color::rgb(5, 5, 5));
        s.fill_rect(0.0, 0.0, 2.0, 2.0);
        s.clear();
        assert_eq!(s.lit_pixels(), 0);
        s.resize(3, 5);
        assert_eq!((s.width(), s.height()), (3, 5));
        assert_eq!(s.pixel(2, 4), Some([0, 0, 0]));
    }
}
