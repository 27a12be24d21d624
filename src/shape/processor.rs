//! Transforms a parsed DefineShape tag into a [`Shape`].
//!
//! Shape records form a little state machine: an implicit current point,
//! three active-style registers (left fill, right fill, line), and an edge
//! accumulator that flushes into one path per active style whenever the
//! styles change.

use crate::character::{Character, CharacterSource};
use crate::common::{CharacterId, Color, Error, ErrorMask, Matrix, Rectangle, Result};
use crate::images::EncodedImage;
use crate::shape::fill::{BitmapFill, Fill, GradientFill, GradientStop};
use crate::shape::{Edge, Path, PathStyle, Shape};
use crate::tags::{DefineShapeTag, FillStyle, Gradient, LineStyle, ShapeRecord};
use log::warn;
use std::rc::Rc;

/// Builds a [`Shape`] from a DefineShape tag, resolving bitmap fills
/// through the character dictionary.
pub struct ShapeProcessor<'a> {
    source: &'a dyn CharacterSource,
    mask: ErrorMask,
}

impl<'a> ShapeProcessor<'a> {
    pub fn new(source: &'a dyn CharacterSource) -> Self {
        Self {
            source,
            mask: source.error_mask(),
        }
    }

    pub fn process(&self, tag: &DefineShapeTag) -> Result<Shape> {
        let mut fills: &[FillStyle] = &tag.fill_styles;
        let mut lines: &[LineStyle] = &tag.line_styles;
        let mut cur = (0i32, 0i32);
        let mut assembler = ShapeAssembler::new();
        let mut ended = false;

        for record in &tag.records {
            if ended {
                if self.mask.raises(ErrorMask::EXTRA_DATA) {
                    return Err(Error::ProcessingInvalidData(format!(
                        "shape {}: records after EndShape",
                        tag.id
                    )));
                }
                warn!("shape {}: ignoring records after EndShape", tag.id);
                break;
            }
            match record {
                ShapeRecord::StyleChange(change) => {
                    assembler.flush();
                    if let Some(new_styles) = &change.new_styles {
                        fills = &new_styles.fill_styles;
                        lines = &new_styles.line_styles;
                    }
                    if let Some(index) = change.fill_style0 {
                        assembler.fill0 = self.select_fill(tag.id, index, fills)?;
                    }
                    if let Some(index) = change.fill_style1 {
                        assembler.fill1 = self.select_fill(tag.id, index, fills)?;
                    }
                    if let Some(index) = change.line_style {
                        assembler.line = self.select_line(tag.id, index, lines)?;
                    }
                    if let Some(position) = change.move_to {
                        cur = position;
                    }
                },
                ShapeRecord::StraightEdge(edge) => {
                    let to = (cur.0 + edge.delta_x, cur.1 + edge.delta_y);
                    assembler.push_edge(Edge::Straight { from: cur, to });
                    cur = to;
                },
                ShapeRecord::CurvedEdge(edge) => {
                    let control = (cur.0 + edge.control_delta_x, cur.1 + edge.control_delta_y);
                    let to = (control.0 + edge.anchor_delta_x, control.1 + edge.anchor_delta_y);
                    assembler.push_edge(Edge::Curved {
                        from: cur,
                        control,
                        to,
                    });
                    cur = to;
                },
                ShapeRecord::EndShape => {
                    ended = true;
                },
            }
        }

        Ok(assembler.finish(tag.bounds))
    }

    /// Resolve a 1-based fill table index; 0 clears the register.
    fn select_fill(
        &self,
        shape_id: CharacterId,
        index: u32,
        fills: &[FillStyle],
    ) -> Result<Option<Fill>> {
        if index == 0 {
            return Ok(None);
        }
        match fills.get(index as usize - 1) {
            Some(style) => Ok(Some(self.convert_fill(style)?)),
            None => {
                if self.mask.raises(ErrorMask::UNPROCESSABLE_DATA) {
                    return Err(Error::ProcessingInvalidData(format!(
                        "shape {}: fill style index {} out of range",
                        shape_id, index
                    )));
                }
                warn!(
                    "shape {}: fill style index {} out of range, substituting transparent",
                    shape_id, index
                );
                Ok(Some(Fill::Solid(Color::TRANSPARENT)))
            },
        }
    }

    /// Resolve a 1-based line table index; 0 clears the register.
    fn select_line(
        &self,
        shape_id: CharacterId,
        index: u32,
        lines: &[LineStyle],
    ) -> Result<Option<LinePaint>> {
        if index == 0 {
            return Ok(None);
        }
        match lines.get(index as usize - 1) {
            Some(style) => Ok(Some(LinePaint {
                width: style.width,
                color: style.color,
                fill: style.fill.as_ref().map(|f| self.convert_fill(f)).transpose()?,
            })),
            None => {
                if self.mask.raises(ErrorMask::UNPROCESSABLE_DATA) {
                    return Err(Error::ProcessingInvalidData(format!(
                        "shape {}: line style index {} out of range",
                        shape_id, index
                    )));
                }
                warn!(
                    "shape {}: line style index {} out of range, dropping stroke",
                    shape_id, index
                );
                Ok(None)
            },
        }
    }

    fn convert_fill(&self, style: &FillStyle) -> Result<Fill> {
        Ok(match style {
            FillStyle::Solid(color) => Fill::Solid(*color),
            FillStyle::LinearGradient { matrix, gradient } => {
                Fill::LinearGradient(convert_gradient(matrix, gradient))
            },
            FillStyle::RadialGradient { matrix, gradient } => {
                Fill::RadialGradient(convert_gradient(matrix, gradient))
            },
            FillStyle::Bitmap {
                bitmap_id,
                matrix,
                smoothed,
                repeating,
            } => Fill::Bitmap(BitmapFill {
                image: resolve_bitmap(self.source, *bitmap_id, self.mask)?,
                matrix: *matrix,
                smoothed: *smoothed,
                repeating: *repeating,
            }),
        })
    }
}

fn convert_gradient(matrix: &Matrix, gradient: &Gradient) -> GradientFill {
    GradientFill {
        matrix: *matrix,
        stops: gradient
            .records
            .iter()
            .map(|r| GradientStop {
                ratio: r.ratio,
                color: r.color,
            })
            .collect(),
        focal_point: gradient.focal_point,
    }
}

/// Resolve a bitmap fill reference to its encoded image.
///
/// Ids that are missing or name a non-image character downgrade to the
/// empty image unless UNPROCESSABLE_DATA raises.
pub(crate) fn resolve_bitmap(
    source: &dyn CharacterSource,
    id: CharacterId,
    mask: ErrorMask,
) -> Result<Rc<EncodedImage>> {
    match source.character(id) {
        Character::Image(def) => Ok(def.encoded()),
        other => {
            if mask.raises(ErrorMask::UNPROCESSABLE_DATA) {
                return Err(Error::ProcessingInvalidData(format!(
                    "bitmap fill references character {} which is {}",
                    id,
                    if other.is_missing() { "missing" } else { "not an image" }
                )));
            }
            warn!("bitmap fill references unusable character {}, substituting empty image", id);
            Ok(Rc::new(EncodedImage::empty()))
        },
    }
}

/// The line register: width plus either a color or a fill.
#[derive(Debug, Clone)]
pub(crate) struct LinePaint {
    pub width: i32,
    pub color: Option<Color>,
    pub fill: Option<Fill>,
}

/// Accumulates edges and flushes them into per-style paths, merging
/// continuous same-style runs into single subpaths.
pub(crate) struct ShapeAssembler {
    paths: Vec<Path>,
    pending: Vec<Edge>,
    pub fill0: Option<Fill>,
    pub fill1: Option<Fill>,
    pub line: Option<LinePaint>,
}

impl ShapeAssembler {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            pending: Vec::new(),
            fill0: None,
            fill1: None,
            line: None,
        }
    }

    pub fn push_edge(&mut self, edge: Edge) {
        self.pending.push(edge);
    }

    /// Emit the accumulated edges as one path per active style. The left
    /// fill is marked reversed so its winding matches the right fill.
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let edges = std::mem::take(&mut self.pending);

        if let Some(fill) = &self.fill0 {
            self.push_path(Path::new(PathStyle::fill(fill.clone()), edges.clone(), true));
        }
        if let Some(fill) = &self.fill1 {
            self.push_path(Path::new(PathStyle::fill(fill.clone()), edges.clone(), false));
        }
        if let Some(line) = &self.line {
            let style = PathStyle {
                fill: None,
                line_fill: line.fill.clone(),
                line_color: line.color,
                line_width: Some(line.width),
            };
            self.push_path(Path::new(style, edges, false));
        }
    }

    /// Push a path, merging into a just-flushed path when style and
    /// endpoints continue it. A flush emits at most three paths, so only
    /// that many candidates need checking.
    fn push_path(&mut self, path: Path) {
        let checked = self.paths.len().min(3);
        let start = self.paths.len() - checked;
        for existing in self.paths[start..].iter_mut() {
            if existing.can_merge(&path) {
                existing.merge(path);
                return;
            }
        }
        self.paths.push(path);
    }

    /// Flush the tail run and assemble the shape, rebasing edges onto the
    /// bounds origin.
    pub fn finish(mut self, bounds: Rectangle) -> Shape {
        self.flush();

        let (dx, dy) = (bounds.x_min, bounds.y_min);
        let shift = |point: (i32, i32)| (point.0 - dx, point.1 - dy);
        for path in &mut self.paths {
            for edge in &mut path.edges {
                *edge = match *edge {
                    Edge::Straight { from, to } => Edge::Straight {
                        from: shift(from),
                        to: shift(to),
                    },
                    Edge::Curved { from, control, to } => Edge::Curved {
                        from: shift(from),
                        control: shift(control),
                        to: shift(to),
                    },
                };
            }
        }

        Shape {
            width: bounds.width(),
            height: bounds.height(),
            x_offset: dx,
            y_offset: dy,
            paths: self.paths,
        }
    }
}
