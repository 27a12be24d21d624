//! Materializes a morph shape at a ratio.
//!
//! The start and end edge streams are walked in lock step. End-stream style
//! changes are inert except for their pen moves; when a straight edge pairs
//! with a curved edge, the straight side is promoted to a degenerate
//! quadratic whose control point is its midpoint, and the interpolated edge
//! is emitted as a curve.

use crate::character::CharacterSource;
use crate::common::{Color, Error, ErrorMask, Matrix, Rectangle, Result};
use crate::shape::fill::{BitmapFill, Fill, GradientFill, GradientStop};
use crate::shape::processor::{resolve_bitmap, LinePaint, ShapeAssembler};
use crate::shape::{Edge, Shape};
use crate::tags::{DefineMorphShapeTag, MorphFillStyle, MorphGradient, MorphLineStyle, ShapeRecord};
use log::warn;

/// Builds a concrete [`Shape`] from a morph-shape tag at a ratio in [0, 1].
pub struct MorphShapeProcessor<'a> {
    source: &'a dyn CharacterSource,
    mask: ErrorMask,
}

impl<'a> MorphShapeProcessor<'a> {
    pub fn new(source: &'a dyn CharacterSource) -> Self {
        Self {
            source,
            mask: source.error_mask(),
        }
    }

    pub fn process(&self, tag: &DefineMorphShapeTag, ratio: f64) -> Result<Shape> {
        let ratio = ratio.clamp(0.0, 1.0);
        let bounds = lerp_rectangle(&tag.start_bounds, &tag.end_bounds, ratio);

        let fills = tag
            .fill_styles
            .iter()
            .map(|style| self.interpolate_fill(style, ratio))
            .collect::<Result<Vec<_>>>()?;
        let lines = tag
            .line_styles
            .iter()
            .map(|style| self.interpolate_line(style, ratio))
            .collect::<Result<Vec<_>>>()?;

        let mut assembler = ShapeAssembler::new();
        let mut cur = (0i32, 0i32);
        let mut end_stream = EndEdges::new(&tag.end_records);

        for record in &tag.start_records {
            match record {
                ShapeRecord::StyleChange(change) => {
                    assembler.flush();
                    if let Some(index) = change.fill_style0 {
                        assembler.fill0 = self.select(tag.id, index, &fills)?.cloned();
                    }
                    if let Some(index) = change.fill_style1 {
                        assembler.fill1 = self.select(tag.id, index, &fills)?.cloned();
                    }
                    if let Some(index) = change.line_style {
                        assembler.line = self.select(tag.id, index, &lines)?.cloned();
                    }
                    if let Some(position) = change.move_to {
                        cur = position;
                    }
                },
                ShapeRecord::StraightEdge(edge) => {
                    let to = (cur.0 + edge.delta_x, cur.1 + edge.delta_y);
                    let start_edge = Edge::Straight { from: cur, to };
                    cur = to;
                    assembler.push_edge(self.pair(tag.id, start_edge, &mut end_stream, ratio)?);
                },
                ShapeRecord::CurvedEdge(edge) => {
                    let control = (cur.0 + edge.control_delta_x, cur.1 + edge.control_delta_y);
                    let to = (control.0 + edge.anchor_delta_x, control.1 + edge.anchor_delta_y);
                    let start_edge = Edge::Curved {
                        from: cur,
                        control,
                        to,
                    };
                    cur = to;
                    assembler.push_edge(self.pair(tag.id, start_edge, &mut end_stream, ratio)?);
                },
                ShapeRecord::EndShape => break,
            }
        }

        Ok(assembler.finish(bounds))
    }

    /// Pair a start edge with the next end edge and interpolate.
    fn pair(
        &self,
        morph_id: u16,
        start: Edge,
        end_stream: &mut EndEdges<'_>,
        ratio: f64,
    ) -> Result<Edge> {
        let end = match end_stream.next_edge() {
            Some(edge) => edge,
            None => {
                if self.mask.raises(ErrorMask::UNPROCESSABLE_DATA) {
                    return Err(Error::ProcessingInvalidData(format!(
                        "morph shape {}: end edge stream exhausted",
                        morph_id
                    )));
                }
                warn!("morph shape {}: end edge stream exhausted, pairing edge with itself", morph_id);
                start
            },
        };
        Ok(interpolate_edges(&start, &end, ratio))
    }

    fn select<'s, T>(&self, morph_id: u16, index: u32, table: &'s [T]) -> Result<Option<&'s T>> {
        if index == 0 {
            return Ok(None);
        }
        match table.get(index as usize - 1) {
            Some(entry) => Ok(Some(entry)),
            None => {
                if self.mask.raises(ErrorMask::UNPROCESSABLE_DATA) {
                    return Err(Error::ProcessingInvalidData(format!(
                        "morph shape {}: style index {} out of range",
                        morph_id, index
                    )));
                }
                warn!("morph shape {}: style index {} out of range, clearing register", morph_id, index);
                Ok(None)
            },
        }
    }

    fn interpolate_fill(&self, style: &MorphFillStyle, ratio: f64) -> Result<Fill> {
        Ok(match style {
            MorphFillStyle::Solid { start, end } => Fill::Solid(lerp_color(start, end, ratio)),
            MorphFillStyle::LinearGradient {
                start_matrix,
                end_matrix,
                gradient,
            } => Fill::LinearGradient(interpolate_gradient(
                start_matrix,
                end_matrix,
                gradient,
                ratio,
            )),
            MorphFillStyle::RadialGradient {
                start_matrix,
                end_matrix,
                gradient,
            } => Fill::RadialGradient(interpolate_gradient(
                start_matrix,
                end_matrix,
                gradient,
                ratio,
            )),
            MorphFillStyle::Bitmap {
                bitmap_id,
                start_matrix,
                end_matrix,
                smoothed,
                repeating,
            } => Fill::Bitmap(BitmapFill {
                image: resolve_bitmap(self.source, *bitmap_id, self.mask)?,
                matrix: lerp_matrix(start_matrix, end_matrix, ratio),
                smoothed: *smoothed,
                repeating: *repeating,
            }),
        })
    }

    fn interpolate_line(&self, style: &MorphLineStyle, ratio: f64) -> Result<LinePaint> {
        let width = lerp_i32(style.start_width, style.end_width, ratio);
        if let Some(fill) = &style.fill {
            return Ok(LinePaint {
                width,
                color: None,
                fill: Some(self.interpolate_fill(fill, ratio)?),
            });
        }
        let color = match (&style.start_color, &style.end_color) {
            (Some(start), Some(end)) => Some(lerp_color(start, end, ratio)),
            (Some(only), None) | (None, Some(only)) => Some(*only),
            (None, None) => None,
        };
        Ok(LinePaint {
            width,
            color,
            fill: None,
        })
    }
}

/// Walks the end edge stream: style changes only move the pen, edges come
/// out with absolute coordinates.
struct EndEdges<'t> {
    records: &'t [ShapeRecord],
    index: usize,
    cur: (i32, i32),
}

impl<'t> EndEdges<'t> {
    fn new(records: &'t [ShapeRecord]) -> Self {
        Self {
            records,
            index: 0,
            cur: (0, 0),
        }
    }

    fn next_edge(&mut self) -> Option<Edge> {
        while self.index < self.records.len() {
            let record = &self.records[self.index];
            self.index += 1;
            match record {
                ShapeRecord::StyleChange(change) => {
                    if let Some(position) = change.move_to {
                        self.cur = position;
                    }
                },
                ShapeRecord::StraightEdge(edge) => {
                    let from = self.cur;
                    let to = (from.0 + edge.delta_x, from.1 + edge.delta_y);
                    self.cur = to;
                    return Some(Edge::Straight { from, to });
                },
                ShapeRecord::CurvedEdge(edge) => {
                    let from = self.cur;
                    let control = (from.0 + edge.control_delta_x, from.1 + edge.control_delta_y);
                    let to = (control.0 + edge.anchor_delta_x, control.1 + edge.anchor_delta_y);
                    self.cur = to;
                    return Some(Edge::Curved { from, control, to });
                },
                ShapeRecord::EndShape => return None,
            }
        }
        None
    }
}

fn interpolate_edges(start: &Edge, end: &Edge, ratio: f64) -> Edge {
    match (start, end) {
        (
            Edge::Straight {
                from: start_from,
                to: start_to,
            },
            Edge::Straight {
                from: end_from,
                to: end_to,
            },
        ) => Edge::Straight {
            from: lerp_point(start_from, end_from, ratio),
            to: lerp_point(start_to, end_to, ratio),
        },
        _ => {
            let (sf, sc, st) = as_quadratic(start);
            let (ef, ec, et) = as_quadratic(end);
            Edge::Curved {
                from: lerp_point(&sf, &ef, ratio),
                control: lerp_point(&sc, &ec, ratio),
                to: lerp_point(&st, &et, ratio),
            }
        },
    }
}

/// Promote a straight edge to a degenerate quadratic with its midpoint as
/// control point.
fn as_quadratic(edge: &Edge) -> ((i32, i32), (i32, i32), (i32, i32)) {
    match *edge {
        Edge::Straight { from, to } => {
            let control = ((from.0 + to.0) / 2, (from.1 + to.1) / 2);
            (from, control, to)
        },
        Edge::Curved { from, control, to } => (from, control, to),
    }
}

fn interpolate_gradient(
    start_matrix: &Matrix,
    end_matrix: &Matrix,
    gradient: &MorphGradient,
    ratio: f64,
) -> GradientFill {
    GradientFill {
        matrix: lerp_matrix(start_matrix, end_matrix, ratio),
        stops: gradient
            .records
            .iter()
            .map(|record| GradientStop {
                ratio: lerp_i32(record.start_ratio as i32, record.end_ratio as i32, ratio) as u8,
                color: lerp_color(&record.start_color, &record.end_color, ratio),
            })
            .collect(),
        focal_point: match (gradient.start_focal_point, gradient.end_focal_point) {
            (None, None) => None,
            (start, end) => Some(lerp_f32(
                start.unwrap_or(0.0),
                end.unwrap_or(0.0),
                ratio,
            )),
        },
    }
}

#[inline]
fn lerp_f32(start: f32, end: f32, ratio: f64) -> f32 {
    (start as f64 + (end as f64 - start as f64) * ratio) as f32
}

#[inline]
fn lerp_i32(start: i32, end: i32, ratio: f64) -> i32 {
    (start as f64 + (end as f64 - start as f64) * ratio).round() as i32
}

#[inline]
fn lerp_point(start: &(i32, i32), end: &(i32, i32), ratio: f64) -> (i32, i32) {
    (
        lerp_i32(start.0, end.0, ratio),
        lerp_i32(start.1, end.1, ratio),
    )
}

/// Interpolate colors channelwise, treating absent alpha as 255.
fn lerp_color(start: &Color, end: &Color, ratio: f64) -> Color {
    let channel = |a: u8, b: u8| lerp_i32(a as i32, b as i32, ratio) as u8;
    Color {
        red: channel(start.red, end.red),
        green: channel(start.green, end.green),
        blue: channel(start.blue, end.blue),
        alpha: match (start.alpha, end.alpha) {
            (None, None) => None,
            _ => Some(channel(start.alpha_or_opaque(), end.alpha_or_opaque())),
        },
    }
}

fn lerp_matrix(start: &Matrix, end: &Matrix, ratio: f64) -> Matrix {
    Matrix {
        scale_x: lerp_f32(start.scale_x, end.scale_x, ratio),
        scale_y: lerp_f32(start.scale_y, end.scale_y, ratio),
        rotate_skew0: lerp_f32(start.rotate_skew0, end.rotate_skew0, ratio),
        rotate_skew1: lerp_f32(start.rotate_skew1, end.rotate_skew1, ratio),
        translate_x: lerp_i32(start.translate_x, end.translate_x, ratio),
        translate_y: lerp_i32(start.translate_y, end.translate_y, ratio),
    }
}

fn lerp_rectangle(start: &Rectangle, end: &Rectangle, ratio: f64) -> Rectangle {
    Rectangle {
        x_min: lerp_i32(start.x_min, end.x_min, ratio),
        x_max: lerp_i32(start.x_max, end.x_max, ratio),
        y_min: lerp_i32(start.y_min, end.y_min, ratio),
        y_max: lerp_i32(start.y_max, end.y_max, ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Character;
    use crate::common::CharacterId;
    use crate::shape::ShapeProcessor;
    use crate::tags::{
        DefineShapeTag, FillStyle, MorphFillStyle, StraightEdgeRecord, StyleChangeRecord,
    };

    struct EmptySource(ErrorMask);

    impl CharacterSource for EmptySource {
        fn character(&self, id: CharacterId) -> Character<'_> {
            Character::Missing(id)
        }

        fn error_mask(&self) -> ErrorMask {
            self.0
        }
    }

    fn triangle_records(scale: i32) -> Vec<ShapeRecord> {
        vec![
            ShapeRecord::StyleChange(StyleChangeRecord {
                fill_style1: Some(1),
                ..Default::default()
            }),
            ShapeRecord::StraightEdge(StraightEdgeRecord {
                delta_x: 100 * scale,
                delta_y: 0,
            }),
            ShapeRecord::StraightEdge(StraightEdgeRecord {
                delta_x: -50 * scale,
                delta_y: 100 * scale,
            }),
            ShapeRecord::StraightEdge(StraightEdgeRecord {
                delta_x: -50 * scale,
                delta_y: -100 * scale,
            }),
            ShapeRecord::EndShape,
        ]
    }

    fn morph_tag() -> DefineMorphShapeTag {
        DefineMorphShapeTag {
            id: 5,
            version: 1,
            start_bounds: Rectangle::new(0, 100, 0, 100),
            end_bounds: Rectangle::new(0, 200, 0, 200),
            fill_styles: vec![MorphFillStyle::Solid {
                start: Color::rgba(0, 0, 0, 255),
                end: Color::rgba(255, 255, 255, 255),
            }],
            line_styles: vec![],
            start_records: triangle_records(1),
            end_records: triangle_records(2),
        }
    }

    #[test]
    fn test_midpoint_color_rounds_up() {
        let shape = MorphShapeProcessor::new(&EmptySource(ErrorMask::NONE))
            .process(&morph_tag(), 0.5)
            .unwrap();
        assert_eq!(
            shape.paths[0].style.fill,
            Some(Fill::Solid(Color::rgba(128, 128, 128, 255)))
        );
    }

    #[test]
    fn test_bounds_interpolate() {
        let processor = MorphShapeProcessor::new(&EmptySource(ErrorMask::NONE));
        let shape = processor.process(&morph_tag(), 0.5).unwrap();
        assert_eq!((shape.width, shape.height), (150, 150));

        // Out-of-range ratios clamp
        let clamped = processor.process(&morph_tag(), 7.0).unwrap();
        assert_eq!((clamped.width, clamped.height), (200, 200));
    }

    #[test]
    fn test_endpoint_matches_static_processor() {
        let source = EmptySource(ErrorMask::NONE);
        let start_shape = MorphShapeProcessor::new(&source)
            .process(&morph_tag(), 0.0)
            .unwrap();

        let static_tag = DefineShapeTag {
            id: 5,
            version: 1,
            bounds: Rectangle::new(0, 100, 0, 100),
            fill_styles: vec![FillStyle::Solid(Color::rgba(0, 0, 0, 255))],
            line_styles: vec![],
            records: triangle_records(1),
        };
        let static_shape = ShapeProcessor::new(&source).process(&static_tag).unwrap();

        assert_eq!(start_shape.paths, static_shape.paths);
        assert_eq!(start_shape.bounds(), static_shape.bounds());
    }

    #[test]
    fn test_straight_promoted_to_quadratic_when_paired_with_curve() {
        let mut tag = morph_tag();
        tag.end_records = vec![
            ShapeRecord::StyleChange(StyleChangeRecord {
                fill_style1: Some(1),
                ..Default::default()
            }),
            ShapeRecord::CurvedEdge(crate::tags::CurvedEdgeRecord {
                control_delta_x: 100,
                control_delta_y: 100,
                anchor_delta_x: 100,
                anchor_delta_y: -100,
            }),
            ShapeRecord::StraightEdge(StraightEdgeRecord {
                delta_x: -100,
                delta_y: 200,
            }),
            ShapeRecord::StraightEdge(StraightEdgeRecord {
                delta_x: -100,
                delta_y: -200,
            }),
            ShapeRecord::EndShape,
        ];

        let shape = MorphShapeProcessor::new(&EmptySource(ErrorMask::NONE))
            .process(&tag, 0.5)
            .unwrap();

        // First edge pair mixes straight and curved: the output is a curve
        // whose control point blends the midpoint with the real control
        match shape.paths[0].edges[0] {
            Edge::Curved { from, control, to } => {
                assert_eq!(from, (0, 0));
                assert_eq!(control, (75, 50));
                assert_eq!(to, (150, 0));
            },
            other => panic!("expected curved edge, got {:?}", other),
        }
        // Straight-straight pairs stay straight
        assert!(matches!(shape.paths[0].edges[1], Edge::Straight { .. }));
    }

    #[test]
    fn test_exhausted_end_stream_behavior() {
        let mut tag = morph_tag();
        tag.end_records = vec![ShapeRecord::EndShape];

        // Lenient: pairs edges with themselves
        let shape = MorphShapeProcessor::new(&EmptySource(ErrorMask::NONE))
            .process(&tag, 0.5)
            .unwrap();
        assert_eq!(shape.paths[0].edges.len(), 3);

        // Strict: raises
        let result = MorphShapeProcessor::new(&EmptySource(ErrorMask::UNPROCESSABLE_DATA))
            .process(&tag, 0.5);
        assert!(matches!(result, Err(Error::ProcessingInvalidData(_))));
    }

    #[test]
    fn test_gradient_stops_and_matrix_interpolate() {
        let gradient = MorphGradient {
            records: vec![crate::tags::MorphGradientRecord {
                start_ratio: 0,
                end_ratio: 100,
                start_color: Color::rgba(0, 0, 0, 255),
                end_color: Color::rgba(200, 100, 0, 255),
            }],
            start_focal_point: None,
            end_focal_point: None,
        };
        let start_matrix = Matrix::translation(0, 0);
        let end_matrix = Matrix::translation(400, 0);

        let fill = interpolate_gradient(&start_matrix, &end_matrix, &gradient, 0.5);
        assert_eq!(fill.stops[0].ratio, 50);
        assert_eq!(fill.stops[0].color, Color::rgba(100, 50, 0, 255));
        assert_eq!(fill.matrix.translate_x, 200);
        assert_eq!(fill.focal_point, None);
    }

    #[test]
    fn test_line_width_interpolates() {
        let mut tag = morph_tag();
        tag.line_styles = vec![MorphLineStyle {
            start_width: 20,
            end_width: 60,
            start_color: Some(Color::rgb(0, 0, 0)),
            end_color: Some(Color::rgb(255, 255, 255)),
            fill: None,
        }];
        tag.start_records[0] = ShapeRecord::StyleChange(StyleChangeRecord {
            fill_style1: Some(1),
            line_style: Some(1),
            ..Default::default()
        });

        let shape = MorphShapeProcessor::new(&EmptySource(ErrorMask::NONE))
            .process(&tag, 0.25)
            .unwrap();
        let stroke = shape
            .paths
            .iter()
            .find(|p| p.style.is_stroke())
            .expect("stroke path");
        assert_eq!(stroke.style.line_width, Some(30));
        assert_eq!(stroke.style.line_color, Some(Color::rgb(64, 64, 64)));
    }
}
