//! The shape object model: paths of straight and quadratic edges with
//! resolved fill and stroke styles.
//!
//! Shapes are immutable once built. Edge coordinates are stored relative to
//! the shape's twip offset, so placing a shape composes the placement matrix
//! with `translate(x_offset, y_offset)`.

// Submodule declarations
pub mod fill;
pub mod morph;
pub mod processor;

// Re-exports
pub use fill::{BitmapFill, Fill, GradientFill, GradientStop};
pub use morph::MorphShapeProcessor;
pub use processor::ShapeProcessor;

use crate::common::{Color, ColorTransform, Rectangle};

/// A single edge of a path, in coordinates relative to the shape offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Straight {
        from: (i32, i32),
        to: (i32, i32),
    },
    /// A quadratic Bezier segment.
    Curved {
        from: (i32, i32),
        control: (i32, i32),
        to: (i32, i32),
    },
}

impl Edge {
    #[inline]
    pub fn start(&self) -> (i32, i32) {
        match self {
            Edge::Straight { from, .. } | Edge::Curved { from, .. } => *from,
        }
    }

    #[inline]
    pub fn end(&self) -> (i32, i32) {
        match self {
            Edge::Straight { to, .. } | Edge::Curved { to, .. } => *to,
        }
    }

    /// The same edge traversed in the opposite direction.
    pub fn reversed(&self) -> Edge {
        match *self {
            Edge::Straight { from, to } => Edge::Straight { from: to, to: from },
            Edge::Curved { from, control, to } => Edge::Curved {
                from: to,
                control,
                to: from,
            },
        }
    }
}

/// The paint applied to one path: an interior fill, or a stroke by color or
/// by fill, with a twip stroke width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathStyle {
    pub fill: Option<Fill>,
    pub line_fill: Option<Fill>,
    pub line_color: Option<Color>,
    pub line_width: Option<i32>,
}

impl PathStyle {
    pub fn fill(fill: Fill) -> Self {
        Self {
            fill: Some(fill),
            ..Self::default()
        }
    }

    pub fn line_color(color: Color, width: i32) -> Self {
        Self {
            line_color: Some(color),
            line_width: Some(width),
            ..Self::default()
        }
    }

    pub fn line_fill(fill: Fill, width: i32) -> Self {
        Self {
            line_fill: Some(fill),
            line_width: Some(width),
            ..Self::default()
        }
    }

    /// Whether this style strokes rather than fills.
    pub fn is_stroke(&self) -> bool {
        self.line_width.is_some()
    }

    fn transform_colors(&self, ct: &ColorTransform) -> PathStyle {
        PathStyle {
            fill: self.fill.as_ref().map(|f| f.transform_colors(ct)),
            line_fill: self.line_fill.as_ref().map(|f| f.transform_colors(ct)),
            line_color: self.line_color.map(|c| ct.apply(c)),
            line_width: self.line_width,
        }
    }
}

/// One continuous subpath drawn with a single style.
///
/// Edges are stored in the order the shape records produced them. A path
/// flushed for fillStyle0 (the left fill) is marked `reversed` and is
/// traversed back to front with each edge flipped, which restores the
/// winding the even-odd fill rule expects.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub style: PathStyle,
    pub edges: Vec<Edge>,
    pub reversed: bool,
}

impl Path {
    pub fn new(style: PathStyle, edges: Vec<Edge>, reversed: bool) -> Self {
        Self {
            style,
            edges,
            reversed,
        }
    }

    /// First point in built (not drawn) order.
    pub fn built_start(&self) -> Option<(i32, i32)> {
        self.edges.first().map(Edge::start)
    }

    /// Last point in built (not drawn) order.
    pub fn built_end(&self) -> Option<(i32, i32)> {
        self.edges.last().map(Edge::end)
    }

    /// Edges in drawing order, honoring the reversal flag.
    pub fn drawn_edges(&self) -> Vec<Edge> {
        if self.reversed {
            self.edges.iter().rev().map(Edge::reversed).collect()
        } else {
            self.edges.clone()
        }
    }

    /// Whether `next` continues this path with the same style, so the two
    /// can merge into one subpath.
    pub fn can_merge(&self, next: &Path) -> bool {
        self.style == next.style
            && self.reversed == next.reversed
            && self.built_end() == next.built_start()
    }

    /// Append the edges of `next`. Callers check [`Path::can_merge`] first.
    pub fn merge(&mut self, next: Path) {
        self.edges.extend(next.edges);
    }

    fn transform_colors(&self, ct: &ColorTransform) -> Path {
        Path {
            style: self.style.transform_colors(ct),
            edges: self.edges.clone(),
            reversed: self.reversed,
        }
    }
}

/// An immutable shape: twip size, twip offset, and ordered paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub width: i32,
    pub height: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub paths: Vec<Path>,
}

impl Shape {
    /// The shape's bounds in file coordinates.
    pub fn bounds(&self) -> Rectangle {
        Rectangle {
            x_min: self.x_offset,
            x_max: self.x_offset + self.width,
            y_min: self.y_offset,
            y_max: self.y_offset + self.height,
        }
    }

    /// A copy with every fill and stroke color transformed and clamped.
    pub fn transform_colors(&self, ct: &ColorTransform) -> Shape {
        Shape {
            width: self.width,
            height: self.height,
            x_offset: self.x_offset,
            y_offset: self.y_offset,
            paths: self.paths.iter().map(|p| p.transform_colors(ct)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_edges() -> Vec<Edge> {
        vec![
            Edge::Straight {
                from: (0, 0),
                to: (100, 0),
            },
            Edge::Straight {
                from: (100, 0),
                to: (100, 100),
            },
            Edge::Straight {
                from: (100, 100),
                to: (0, 100),
            },
            Edge::Straight {
                from: (0, 100),
                to: (0, 0),
            },
        ]
    }

    #[test]
    fn test_drawn_edges_reversal() {
        let path = Path::new(
            PathStyle::fill(Fill::Solid(Color::rgb(0, 0, 0))),
            square_edges(),
            true,
        );
        let drawn = path.drawn_edges();
        assert_eq!(drawn[0].start(), (0, 0));
        assert_eq!(drawn[0].end(), (0, 100));
        assert_eq!(drawn.last().unwrap().end(), (0, 0));
    }

    #[test]
    fn test_curved_reversal_keeps_control() {
        let edge = Edge::Curved {
            from: (0, 0),
            control: (50, 80),
            to: (100, 0),
        };
        assert_eq!(
            edge.reversed(),
            Edge::Curved {
                from: (100, 0),
                control: (50, 80),
                to: (0, 0),
            }
        );
    }

    #[test]
    fn test_merge_requires_continuity() {
        let style = PathStyle::fill(Fill::Solid(Color::rgb(1, 2, 3)));
        let mut a = Path::new(
            style.clone(),
            vec![Edge::Straight {
                from: (0, 0),
                to: (100, 0),
            }],
            false,
        );
        let b = Path::new(
            style.clone(),
            vec![Edge::Straight {
                from: (100, 0),
                to: (100, 100),
            }],
            false,
        );
        let gap = Path::new(
            style,
            vec![Edge::Straight {
                from: (500, 500),
                to: (600, 500),
            }],
            false,
        );

        assert!(a.can_merge(&b));
        assert!(!a.can_merge(&gap));

        a.merge(b);
        assert_eq!(a.edges.len(), 2);
        assert_eq!(a.built_end(), Some((100, 100)));
    }

    #[test]
    fn test_transform_colors_returns_new_shape() {
        let shape = Shape {
            width: 100,
            height: 100,
            x_offset: 0,
            y_offset: 0,
            paths: vec![Path::new(
                PathStyle::fill(Fill::Solid(Color::rgb(200, 200, 200))),
                square_edges(),
                false,
            )],
        };
        let ct = crate::common::ColorTransform::multiply(0.5, 0.5, 0.5, 1.0);
        let darker = shape.transform_colors(&ct);

        assert_eq!(
            darker.paths[0].style.fill,
            Some(Fill::Solid(Color::rgb(100, 100, 100)))
        );
        // Original untouched
        assert_eq!(
            shape.paths[0].style.fill,
            Some(Fill::Solid(Color::rgb(200, 200, 200)))
        );
    }
}
