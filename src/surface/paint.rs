use vello_cpu::kurbo::Shape as _;

use crate::{
    field::particle::Particle,
    foundation::{
        color::Rgba8,
        core::{Canvas, Point},
        error::{PointCloudError, PointCloudResult},
    },
};

/// Opacity of particles outside the colour-reveal radius.
pub const DIM_OPACITY: f64 = 0.3;

const DISC_TOLERANCE: f64 = 0.1;

/// One painted frame.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
    /// Whether colour channels are multiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA bytes of pixel `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Pixel data with straight alpha, as image files expect.
    pub fn to_straight_alpha(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if !self.premultiplied {
            return out;
        }
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Per-particle appearance inputs taken from the surface configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleStyle {
    /// Disc radius in pixels.
    pub point_size: f64,
    /// Colour of particles away from the pointer.
    pub point_color: Rgba8,
    /// Repulsion radius; colour is revealed within twice this distance.
    pub mouse_radius: f64,
}

impl ParticleStyle {
    /// Paint colour of a particle at `at` carrying `own`.
    ///
    /// Within `2 * mouse_radius` of the pointer the particle shows its own colour, fading from
    /// full opacity at the pointer to [`DIM_OPACITY`] at the edge. Everywhere else it shows the
    /// configured point colour at [`DIM_OPACITY`].
    pub fn appearance(&self, at: Point, own: Rgba8, pointer: Option<Point>) -> Rgba8 {
        let color_radius = 2.0 * self.mouse_radius;
        match pointer.map(|p| p.distance(at)) {
            Some(d) if d < color_radius => {
                let blend = 1.0 - d / color_radius;
                own.with_opacity(DIM_OPACITY + blend * (1.0 - DIM_OPACITY))
            }
            _ => self.point_color.with_opacity(DIM_OPACITY),
        }
    }
}

/// CPU rasteriser for particle frames.
pub struct Painter {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl Painter {
    /// A painter sized to `canvas`.
    pub fn new(canvas: Canvas) -> PointCloudResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| PointCloudError::render("surface width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| PointCloudError::render("surface height exceeds u16"))?;
        Ok(Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    /// Clear, then draw every particle as a disc of radius `style.point_size`.
    pub fn paint(
        &mut self,
        particles: &[Particle],
        pointer: Option<Point>,
        style: &ParticleStyle,
        background: Option<Rgba8>,
    ) -> FrameRGBA {
        clear_pixmap(&mut self.pixmap, [0, 0, 0, 0]);

        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let r = style.point_size;
        let ctx = &mut self.ctx;
        ctx.reset();

        if let Some(bg) = background {
            ctx.set_paint(to_cpu_color(bg));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        }

        for p in particles {
            let at = p.position();
            if at.x < -r || at.y < -r || at.x > w + r || at.y > h + r || !at.is_finite() {
                continue;
            }
            ctx.set_paint(to_cpu_color(style.appearance(at, p.color(), pointer)));
            let disc = vello_cpu::kurbo::Circle::new((at.x, at.y), r).to_path(DISC_TOLERANCE);
            ctx.fill_path(&disc);
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);

        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

fn to_cpu_color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> ParticleStyle {
        ParticleStyle {
            point_size: 3.0,
            point_color: Rgba8::WHITE,
            mouse_radius: 100.0,
        }
    }

    #[test]
    fn far_particles_are_dim_and_neutral() {
        let red = Rgba8::rgb(255, 0, 0);
        let at = Point::new(0.0, 0.0);
        let dim = Rgba8::WHITE.with_opacity(DIM_OPACITY);
        assert_eq!(style().appearance(at, red, None), dim);
        assert_eq!(style().appearance(at, red, Some(Point::new(200.0, 0.0))), dim);
    }

    #[test]
    fn near_particles_reveal_their_color() {
        let red = Rgba8::rgb(255, 0, 0);
        let at = Point::new(0.0, 0.0);
        assert_eq!(style().appearance(at, red, Some(at)), red);
        let halfway = style().appearance(at, red, Some(Point::new(100.0, 0.0)));
        assert_eq!((halfway.r, halfway.g, halfway.b), (255, 0, 0));
        assert_eq!(halfway.a, (255.0 * 0.65_f64).round() as u8);
    }

    #[test]
    fn paints_discs_and_leaves_the_rest_clear() {
        let canvas = Canvas::new(64, 32).unwrap();
        let mut painter = Painter::new(canvas).unwrap();
        let at = Point::new(10.5, 10.5);
        let particles = [Particle::new(at, at, Rgba8::rgb(0, 0, 255))];

        let frame = painter.paint(&particles, Some(at), &style(), None);
        assert_eq!((frame.width, frame.height), (64, 32));
        assert_eq!(frame.data.len(), 64 * 32 * 4);
        let px = frame.pixel(10, 10).unwrap();
        assert!(px[3] > 240 && px[2] > 240 && px[0] < 10, "{px:?}");
        assert_eq!(frame.pixel(50, 25).unwrap(), [0, 0, 0, 0]);
        assert_eq!(frame.pixel(64, 0), None);

        let frame = painter.paint(&particles, None, &style(), Some(Rgba8::rgb(0, 0, 0)));
        let px = frame.pixel(10, 10).unwrap();
        assert_eq!(px[3], 255);
        assert!((i32::from(px[0]) - 77).abs() <= 3, "{px:?}");
        assert_eq!(frame.pixel(50, 25).unwrap(), [0, 0, 0, 255]);
    }

    #[test]
    fn repainting_does_not_carry_over_the_previous_frame() {
        let canvas = Canvas::new(32, 32).unwrap();
        let mut painter = Painter::new(canvas).unwrap();
        let first = Point::new(8.5, 8.5);
        let second = Point::new(24.5, 24.5);
        let red = Rgba8::rgb(255, 0, 0);

        let a = painter.paint(
            &[Particle::new(first, first, red)],
            Some(first),
            &style(),
            Some(Rgba8::rgb(0, 0, 0)),
        );
        assert_eq!(a.pixel(8, 8).unwrap()[0], 255);

        for _ in 0..3 {
            let b = painter.paint(&[Particle::new(second, second, red)], Some(second), &style(), None);
            assert_eq!(b.pixel(8, 8).unwrap(), [0, 0, 0, 0]);
            assert_eq!(b.pixel(1, 30).unwrap(), [0, 0, 0, 0]);
            assert_eq!(b.pixel(24, 24).unwrap()[0], 255);
        }
    }

    #[test]
    fn straight_alpha_undoes_premultiplication() {
        let frame = FrameRGBA {
            width: 2,
            height: 1,
            data: vec![64, 0, 0, 128, 0, 0, 0, 0],
            premultiplied: true,
        };
        assert_eq!(frame.to_straight_alpha(), vec![128, 0, 0, 128, 0, 0, 0, 0]);
    }
}
