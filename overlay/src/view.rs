//! Crosshair geometry
//!
//! Turns a [`RenderState`] and a surface size into drawing primitives. Pure:
//! no buffers, no platform calls, no repaint scheduling.

use crosshair_core::{CrosshairMode, RenderState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Straight (non-premultiplied) RGB color with a separate alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintColor {
    pub rgb: [u8; 3],
    pub alpha: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    /// Segment stroked with flat caps
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: PaintColor,
    },
    /// Filled circle
    Dot {
        center: Point,
        diameter: f32,
        color: PaintColor,
    },
}

/// Surface center, integer division on both axes
pub fn center(width: u32, height: u32) -> Point {
    Point::new((width / 2) as f32, (height / 2) as f32)
}

/// Primitives for one paint of the crosshair
pub fn compose(state: &RenderState, width: u32, height: u32) -> Vec<Primitive> {
    let c = center(width, height);
    let color = PaintColor {
        rgb: state.color,
        alpha: state.alpha,
    };
    let dot = Primitive::Dot {
        center: c,
        diameter: state.dot_size as f32,
        color,
    };

    match state.mode {
        CrosshairMode::Dot => vec![dot],
        CrosshairMode::Cross => {
            let gap = state.gap as f32;
            let reach = gap + state.length as f32;
            let line = |from: Point, to: Point| Primitive::Line {
                from,
                to,
                width: state.thickness as f32,
                color,
            };

            let mut primitives = vec![
                line(Point::new(c.x, c.y - gap), Point::new(c.x, c.y - reach)),
                line(Point::new(c.x, c.y + gap), Point::new(c.x, c.y + reach)),
                line(Point::new(c.x - gap, c.y), Point::new(c.x - reach, c.y)),
                line(Point::new(c.x + gap, c.y), Point::new(c.x + reach, c.y)),
            ];
            if state.show_center_dot {
                primitives.push(dot);
            }
            primitives
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(p: &Primitive) -> (Point, Point) {
        match p {
            Primitive::Line { from, to, .. } => (*from, *to),
            Primitive::Dot { .. } => panic!("expected a line, got {:?}", p),
        }
    }

    #[test]
    fn test_center_even_and_odd() {
        assert_eq!(center(1920, 1080), Point::new(960.0, 540.0));
        assert_eq!(center(801, 601), Point::new(400.0, 300.0));
        assert_eq!(center(1, 1), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_default_settings_on_full_hd() {
        let state = RenderState::default();
        let primitives = compose(&state, 1920, 1080);

        assert_eq!(primitives.len(), 4);
        let origin = Point::new(960.0, 540.0);
        let expected_tips = [
            Point::new(960.0, 539.0),
            Point::new(960.0, 541.0),
            Point::new(959.0, 540.0),
            Point::new(961.0, 540.0),
        ];
        for (primitive, tip) in primitives.iter().zip(expected_tips) {
            assert_eq!(endpoints(primitive), (origin, tip));
            match primitive {
                Primitive::Line { width, color, .. } => {
                    assert_eq!(*width, 1.0);
                    assert_eq!(color.rgb, [255, 255, 255]);
                    assert_eq!(color.alpha, 1.0);
                }
                Primitive::Dot { .. } => unreachable!(),
            }
        }
    }

    #[test]
    fn test_gap_offsets_segments() {
        let state = RenderState {
            gap: 4,
            length: 10,
            ..RenderState::default()
        };
        let primitives = compose(&state, 100, 100);

        assert_eq!(
            endpoints(&primitives[0]),
            (Point::new(50.0, 46.0), Point::new(50.0, 36.0))
        );
        assert_eq!(
            endpoints(&primitives[3]),
            (Point::new(54.0, 50.0), Point::new(64.0, 50.0))
        );
    }

    #[test]
    fn test_center_dot_in_cross_mode() {
        let state = RenderState {
            show_center_dot: true,
            dot_size: 3,
            ..RenderState::default()
        };
        let primitives = compose(&state, 101, 51);

        assert_eq!(primitives.len(), 5);
        assert!(matches!(
            primitives[4],
            Primitive::Dot { center, diameter, .. }
                if center == Point::new(50.0, 25.0) && diameter == 3.0
        ));
    }

    #[test]
    fn test_dot_mode_draws_only_a_dot() {
        let state = RenderState {
            mode: CrosshairMode::Dot,
            show_center_dot: true,
            ..RenderState::default()
        };
        let primitives = compose(&state, 640, 480);

        assert_eq!(primitives.len(), 1);
        assert!(matches!(
            primitives[0],
            Primitive::Dot { diameter, .. } if diameter == 6.0
        ));
    }
}
