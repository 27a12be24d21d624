//! Display-list control records: placements, removals, filters, blending.

use crate::common::{CharacterId, Color, ColorTransform, Depth, Matrix};
use crate::tags::styles::GradientRecord;

/// PlaceObject, versions 1 through 3.
///
/// Version 1 always carries a character id and matrix with `is_move` false;
/// later versions set `is_move` to modify the object already at `depth`.
/// Optional fields replace the existing object's fields only when present.
#[derive(Debug, Clone, Default)]
pub struct PlaceObjectTag {
    pub version: u8,
    pub depth: Depth,
    pub character_id: Option<CharacterId>,
    pub matrix: Option<Matrix>,
    pub color_transform: Option<ColorTransform>,
    /// Morph ratio in [0, 65535].
    pub ratio: Option<u16>,
    pub name: Option<String>,
    pub clip_depth: Option<Depth>,
    pub filters: Option<Vec<Filter>>,
    pub blend_mode: Option<BlendMode>,
    pub is_move: bool,
}

/// RemoveObject (v1 also names the character, v2 only the depth).
#[derive(Debug, Clone)]
pub struct RemoveObjectTag {
    pub depth: Depth,
    pub character_id: Option<CharacterId>,
}

/// A surface filter attached by PlaceObject3.
///
/// Filters are carried through the object model and propagated down nested
/// sprites; rasterizing them is left to downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    DropShadow(DropShadowFilter),
    Blur(BlurFilter),
    Glow(GlowFilter),
    Bevel(BevelFilter),
    GradientGlow(GradientGlowFilter),
    Convolution(ConvolutionFilter),
    ColorMatrix(ColorMatrixFilter),
    GradientBevel(GradientGlowFilter),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropShadowFilter {
    pub color: Color,
    pub blur_x: f32,
    pub blur_y: f32,
    pub angle: f32,
    pub distance: f32,
    pub strength: f32,
    pub inner: bool,
    pub knockout: bool,
    pub passes: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlurFilter {
    pub blur_x: f32,
    pub blur_y: f32,
    pub passes: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlowFilter {
    pub color: Color,
    pub blur_x: f32,
    pub blur_y: f32,
    pub strength: f32,
    pub inner: bool,
    pub knockout: bool,
    pub passes: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BevelFilter {
    pub shadow_color: Color,
    pub highlight_color: Color,
    pub blur_x: f32,
    pub blur_y: f32,
    pub angle: f32,
    pub distance: f32,
    pub strength: f32,
    pub inner: bool,
    pub knockout: bool,
    pub on_top: bool,
    pub passes: u8,
}

/// Shared body of the gradient glow and gradient bevel filters.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientGlowFilter {
    pub colors: Vec<GradientRecord>,
    pub blur_x: f32,
    pub blur_y: f32,
    pub angle: f32,
    pub distance: f32,
    pub strength: f32,
    pub inner: bool,
    pub knockout: bool,
    pub on_top: bool,
    pub passes: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvolutionFilter {
    pub matrix_x: u8,
    pub matrix_y: u8,
    pub divisor: f32,
    pub bias: f32,
    pub matrix: Vec<f32>,
    pub default_color: Color,
    pub clamp: bool,
    pub preserve_alpha: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorMatrixFilter {
    pub matrix: [f32; 20],
}

/// Layer compositing mode from PlaceObject3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Layer,
    Multiply,
    Screen,
    Lighten,
    Darken,
    Difference,
    Add,
    Subtract,
    Invert,
    Alpha,
    Erase,
    Overlay,
    Hardlight,
}
