//! Resolved fill styles: solids, gradients, and bitmap patterns.
//!
//! Unlike the tag-level records, these carry a resolved image handle for
//! bitmap fills, so a shape can be drawn without going back to the
//! character dictionary. All variants are comparable and hashable through
//! their canonical `<defs>` key (see the svg module), which is what makes
//! gradient and pattern deduplication work.

use crate::common::{Color, ColorTransform, Matrix};
use crate::images::EncodedImage;
use std::rc::Rc;

/// The paint of a filled path region or a fill-styled stroke.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Color),
    LinearGradient(GradientFill),
    RadialGradient(GradientFill),
    Bitmap(BitmapFill),
}

impl Fill {
    /// A copy with all colors transformed and clamped.
    pub fn transform_colors(&self, ct: &ColorTransform) -> Fill {
        match self {
            Fill::Solid(color) => Fill::Solid(ct.apply(*color)),
            Fill::LinearGradient(g) => Fill::LinearGradient(g.transform_colors(ct)),
            Fill::RadialGradient(g) => Fill::RadialGradient(g.transform_colors(ct)),
            // Pixel data is untouched by color transforms
            Fill::Bitmap(b) => Fill::Bitmap(b.clone()),
        }
    }
}

/// A gradient in the fixed 32768x32768 twip gradient square, positioned by
/// its matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientFill {
    pub matrix: Matrix,
    pub stops: Vec<GradientStop>,
    /// Focal point in [-1, 1] for focal radial gradients.
    pub focal_point: Option<f32>,
}

impl GradientFill {
    fn transform_colors(&self, ct: &ColorTransform) -> GradientFill {
        GradientFill {
            matrix: self.matrix,
            stops: self
                .stops
                .iter()
                .map(|s| GradientStop {
                    ratio: s.ratio,
                    color: ct.apply(s.color),
                })
                .collect(),
            focal_point: self.focal_point,
        }
    }
}

/// One gradient stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Position on the gradient ray, 0-255.
    pub ratio: u8,
    pub color: Color,
}

/// A bitmap pattern fill with its resolved image.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapFill {
    pub image: Rc<EncodedImage>,
    /// Maps bitmap pixel space into twip space (typically a scale of 20).
    pub matrix: Matrix,
    pub smoothed: bool,
    pub repeating: bool,
}
