//! Shape records and fill/line style records, static and morph variants.
//!
//! Shape records use the SWF delta encoding: edges advance an implicit
//! current point, and style changes select 1-based indices into the active
//! style tables (index 0 clears the slot).

use crate::common::{CharacterId, Color, Matrix};

/// One record of a shape's edge stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeRecord {
    StyleChange(StyleChangeRecord),
    StraightEdge(StraightEdgeRecord),
    CurvedEdge(CurvedEdgeRecord),
    EndShape,
}

/// Select styles, move the pen, or replace the style tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleChangeRecord {
    /// Absolute twip position to move the pen to.
    pub move_to: Option<(i32, i32)>,
    /// 1-based index into the fill table for the left fill, 0 to clear.
    pub fill_style0: Option<u32>,
    /// 1-based index into the fill table for the right fill, 0 to clear.
    pub fill_style1: Option<u32>,
    /// 1-based index into the line table, 0 to clear.
    pub line_style: Option<u32>,
    /// Replacement style tables (DefineShape2+).
    pub new_styles: Option<NewStyles>,
}

/// Replacement style tables carried by a style change record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewStyles {
    pub fill_styles: Vec<FillStyle>,
    pub line_styles: Vec<LineStyle>,
}

/// A line segment as twip deltas from the current point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StraightEdgeRecord {
    pub delta_x: i32,
    pub delta_y: i32,
}

/// A quadratic segment: control delta from the current point, anchor delta
/// from the control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurvedEdgeRecord {
    pub control_delta_x: i32,
    pub control_delta_y: i32,
    pub anchor_delta_x: i32,
    pub anchor_delta_y: i32,
}

/// A fill style table entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
    Solid(Color),
    LinearGradient {
        matrix: Matrix,
        gradient: Gradient,
    },
    RadialGradient {
        matrix: Matrix,
        gradient: Gradient,
    },
    Bitmap {
        bitmap_id: CharacterId,
        matrix: Matrix,
        smoothed: bool,
        repeating: bool,
    },
}

/// Gradient control points in record order.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub records: Vec<GradientRecord>,
    /// Focal point in [-1, 1] for focal radial gradients (DefineShape4).
    pub focal_point: Option<f32>,
}

/// One gradient stop: position on the gradient ray and its color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientRecord {
    pub ratio: u8,
    pub color: Color,
}

/// A line style table entry. LineStyle2 (DefineShape4) may stroke with a
/// fill style instead of a plain color.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// Stroke width in twips.
    pub width: i32,
    pub color: Option<Color>,
    pub fill: Option<FillStyle>,
}

/// A morph fill style: paired start and end forms.
#[derive(Debug, Clone, PartialEq)]
pub enum MorphFillStyle {
    Solid {
        start: Color,
        end: Color,
    },
    LinearGradient {
        start_matrix: Matrix,
        end_matrix: Matrix,
        gradient: MorphGradient,
    },
    RadialGradient {
        start_matrix: Matrix,
        end_matrix: Matrix,
        gradient: MorphGradient,
    },
    Bitmap {
        bitmap_id: CharacterId,
        start_matrix: Matrix,
        end_matrix: Matrix,
        smoothed: bool,
        repeating: bool,
    },
}

/// Gradient records with paired start and end stops.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphGradient {
    pub records: Vec<MorphGradientRecord>,
    pub start_focal_point: Option<f32>,
    pub end_focal_point: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphGradientRecord {
    pub start_ratio: u8,
    pub end_ratio: u8,
    pub start_color: Color,
    pub end_color: Color,
}

/// A morph line style. MorphLineStyle2 may stroke with a morph fill.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphLineStyle {
    pub start_width: i32,
    pub end_width: i32,
    pub start_color: Option<Color>,
    pub end_color: Option<Color>,
    pub fill: Option<MorphFillStyle>,
}
