//! Software renderer using tiny-skia
//!
//! Rasterizes [`Primitive`]s into the platform's RGBA pixel buffer.
//! All rendering is done on the CPU.

use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, PixmapMut, Stroke, Transform,
};

use crate::utils::color_from_paint;
use crate::view::Primitive;

/// A software renderer for the crosshair
#[derive(Debug, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Create a new pixel buffer (RGBA format)
    pub fn create_buffer(width: u32, height: u32) -> Vec<u8> {
        vec![0u8; (width * height * 4) as usize]
    }

    /// Clear to fully transparent, then draw every primitive in order
    pub fn paint(&self, buffer: &mut [u8], width: u32, height: u32, primitives: &[Primitive]) {
        let Some(mut pixmap) = PixmapMut::from_bytes(buffer, width, height) else {
            return;
        };
        pixmap.fill(Color::TRANSPARENT);

        for primitive in primitives {
            draw_primitive(&mut pixmap, primitive);
        }
    }
}

fn draw_primitive(pixmap: &mut PixmapMut, primitive: &Primitive) {
    match *primitive {
        Primitive::Line {
            from,
            to,
            width,
            color,
        } => {
            let mut pb = PathBuilder::new();
            pb.move_to(from.x, from.y);
            pb.line_to(to.x, to.y);
            let Some(path) = pb.finish() else { return };

            let mut paint = Paint::default();
            paint.set_color(color_from_paint(color));
            paint.anti_alias = true;

            let stroke = Stroke {
                width,
                line_cap: LineCap::Butt,
                line_join: LineJoin::Miter,
                ..Default::default()
            };

            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
        Primitive::Dot {
            center,
            diameter,
            color,
        } => {
            let Some(path) = PathBuilder::from_circle(center.x, center.y, diameter / 2.0) else {
                return;
            };

            let mut paint = Paint::default();
            paint.set_color(color_from_paint(color));
            paint.anti_alias = true;

            pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{PaintColor, Point};

    const W: u32 = 16;
    const H: u32 = 16;

    fn alpha_at(buffer: &[u8], x: u32, y: u32) -> u8 {
        buffer[((y * W + x) * 4 + 3) as usize]
    }

    fn white(alpha: f32) -> PaintColor {
        PaintColor {
            rgb: [255, 255, 255],
            alpha,
        }
    }

    #[test]
    fn test_paint_clears_previous_frame() {
        let renderer = Renderer::new();
        let mut buffer = vec![0xffu8; (W * H * 4) as usize];

        renderer.paint(&mut buffer, W, H, &[]);
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_line_covers_its_span_only() {
        let renderer = Renderer::new();
        let mut buffer = Renderer::create_buffer(W, H);
        let line = Primitive::Line {
            from: Point::new(2.0, 8.0),
            to: Point::new(12.0, 8.0),
            width: 2.0,
            color: white(1.0),
        };

        renderer.paint(&mut buffer, W, H, &[line]);

        assert!(alpha_at(&buffer, 5, 7) > 250);
        assert!(alpha_at(&buffer, 5, 8) > 250);
        assert_eq!(alpha_at(&buffer, 5, 3), 0);
        // Butt caps: nothing past the endpoint
        assert_eq!(alpha_at(&buffer, 13, 8), 0);
    }

    #[test]
    fn test_dot_fills_center() {
        let renderer = Renderer::new();
        let mut buffer = Renderer::create_buffer(W, H);
        let dot = Primitive::Dot {
            center: Point::new(8.0, 8.0),
            diameter: 6.0,
            color: white(1.0),
        };

        renderer.paint(&mut buffer, W, H, &[dot]);

        assert!(alpha_at(&buffer, 8, 8) > 250);
        assert_eq!(alpha_at(&buffer, 0, 0), 0);
    }

    #[test]
    fn test_alpha_is_applied() {
        let renderer = Renderer::new();
        let mut buffer = Renderer::create_buffer(W, H);
        let dot = Primitive::Dot {
            center: Point::new(8.0, 8.0),
            diameter: 10.0,
            color: white(0.5),
        };

        renderer.paint(&mut buffer, W, H, &[dot]);

        let a = alpha_at(&buffer, 8, 8);
        assert!((120..=135).contains(&a), "alpha was {}", a);
    }

    #[test]
    fn test_mismatched_buffer_is_ignored() {
        let renderer = Renderer::new();
        let mut buffer = vec![7u8; 10];
        renderer.paint(&mut buffer, W, H, &[]);
        assert!(buffer.iter().all(|&b| b == 7));
    }
}
