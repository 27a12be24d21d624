//! Character definitions and the drawable capability.
//!
//! Every addressable object in a movie is a character: a shape, a morph
//! shape, a sprite, or a bitmap. Definitions live in dictionaries owned by
//! the extractor; the borrowing [`Character`] view unifies them behind the
//! drawable operations (bounds, frame count, draw, color transforms), with
//! [`Character::Missing`] as the never-failing sentinel.

// Submodule declarations
pub mod image;
pub mod sprite;

// Re-exports
pub use image::{BitsImage, ImageDef, JpegImage, LosslessImage};
pub use sprite::SpriteDef;

use crate::common::{CharacterId, ColorTransform, ErrorMask, Matrix, Rectangle, Result};
use crate::shape::{MorphShapeProcessor, Shape, ShapeProcessor};
use crate::svg::SvgCanvas;
use crate::tags::{DefineMorphShapeTag, DefineShapeTag};
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Resolves character ids to definitions.
///
/// Implemented by the extractor; processors and draw calls depend on this
/// seam rather than on the extractor type, which also keeps them testable
/// against hand-built dictionaries.
pub trait CharacterSource {
    /// Resolve an id. Never fails: unknown ids yield [`Character::Missing`].
    fn character(&self, id: CharacterId) -> Character<'_>;

    /// The error mask processors consult before raising.
    fn error_mask(&self) -> ErrorMask;
}

/// A shape character: the parsed tag plus its lazily processed geometry.
#[derive(Debug, Clone)]
pub struct ShapeDef {
    pub id: CharacterId,
    tag: DefineShapeTag,
    cache: OnceCell<Rc<Shape>>,
}

impl ShapeDef {
    pub fn new(tag: DefineShapeTag) -> Self {
        Self {
            id: tag.id,
            tag,
            cache: OnceCell::new(),
        }
    }

    pub fn tag(&self) -> &DefineShapeTag {
        &self.tag
    }

    /// Declared shape bounds, available without processing.
    pub fn bounds(&self) -> Rectangle {
        self.tag.bounds
    }

    /// The processed geometry, built on first use and memoized.
    pub fn shape(&self, source: &dyn CharacterSource) -> Result<Rc<Shape>> {
        self.cache
            .get_or_try_init(|| ShapeProcessor::new(source).process(&self.tag).map(Rc::new))
            .cloned()
    }
}

/// A morph shape character with a per-ratio shape cache.
///
/// Cache keys are the ratio rounded to four decimals, which coalesces
/// close ratios on purpose.
#[derive(Debug, Clone)]
pub struct MorphShapeDef {
    pub id: CharacterId,
    tag: DefineMorphShapeTag,
    cache: RefCell<HashMap<String, Rc<Shape>>>,
}

impl MorphShapeDef {
    pub fn new(tag: DefineMorphShapeTag) -> Self {
        Self {
            id: tag.id,
            tag,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn tag(&self) -> &DefineMorphShapeTag {
        &self.tag
    }

    /// The union of the start and end bounds, covering every ratio.
    pub fn bounds(&self) -> Rectangle {
        self.tag.start_bounds.union(&self.tag.end_bounds)
    }

    /// Materialize the shape at a ratio, clamped to [0, 1].
    pub fn shape_at(&self, ratio: f64, source: &dyn CharacterSource) -> Result<Rc<Shape>> {
        let ratio = ratio.clamp(0.0, 1.0);
        let key = format!("{:.4}", ratio);
        if let Some(shape) = self.cache.borrow().get(&key) {
            return Ok(shape.clone());
        }
        let shape = Rc::new(MorphShapeProcessor::new(source).process(&self.tag, ratio)?);
        self.cache.borrow_mut().insert(key, shape.clone());
        Ok(shape)
    }
}

/// A borrowing view over any character definition, with the missing-id
/// sentinel as a first-class variant.
#[derive(Debug, Clone, Copy)]
pub enum Character<'a> {
    Shape(&'a ShapeDef),
    MorphShape(&'a MorphShapeDef),
    Sprite(&'a SpriteDef),
    Image(&'a ImageDef),
    Missing(CharacterId),
}

impl<'a> Character<'a> {
    pub fn id(&self) -> CharacterId {
        match *self {
            Character::Shape(d) => d.id,
            Character::MorphShape(d) => d.id,
            Character::Sprite(d) => d.id,
            Character::Image(d) => d.id(),
            Character::Missing(id) => id,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Character::Missing(_))
    }

    /// The character's bounds in twips. Sprites materialize their timeline;
    /// the missing sentinel is empty.
    pub fn bounds(&self, source: &dyn CharacterSource) -> Result<Rectangle> {
        match *self {
            Character::Shape(d) => Ok(d.bounds()),
            Character::MorphShape(d) => Ok(d.bounds()),
            Character::Sprite(d) => d.bounds(source),
            Character::Image(d) => Ok(d.bounds()),
            Character::Missing(_) => Ok(Rectangle::EMPTY),
        }
    }

    /// How many frames this character animates over. Non-sprites are a
    /// single frame; with `recursive`, nested sprites extend the count.
    pub fn frames_count(&self, source: &dyn CharacterSource, recursive: bool) -> Result<usize> {
        let mut visited = HashSet::new();
        self.frames_count_inner(source, recursive, &mut visited)
    }

    fn frames_count_inner(
        &self,
        source: &dyn CharacterSource,
        recursive: bool,
        visited: &mut HashSet<CharacterId>,
    ) -> Result<usize> {
        match *self {
            Character::Sprite(def) => {
                if !visited.insert(def.id) {
                    return Ok(1);
                }
                let timeline = def.timeline(source)?;
                let mut count = timeline.frames.len();
                if recursive {
                    for frame in &timeline.frames {
                        for object in &frame.objects {
                            let nested = source.character(object.character_id);
                            count =
                                count.max(nested.frames_count_inner(source, true, visited)?);
                        }
                    }
                }
                Ok(count)
            },
            _ => Ok(1),
        }
    }

    /// Draw the character onto the canvas.
    ///
    /// `transform` is the placement matrix in the enclosing coordinate
    /// space; `color_transforms` is the ordered list accumulated down the
    /// sprite tree, folded into fill colors at emission.
    pub fn draw(
        &self,
        canvas: &mut SvgCanvas,
        frame: usize,
        source: &dyn CharacterSource,
        transform: &Matrix,
        color_transforms: &[ColorTransform],
    ) -> Result<()> {
        match *self {
            Character::Shape(def) => {
                let shape = def.shape(source)?;
                draw_shape(canvas, &shape, transform, color_transforms)
            },
            Character::MorphShape(def) => MorphShapeAtRatio {
                morph: def,
                ratio: 0.0,
            }
            .draw(canvas, source, transform, color_transforms),
            Character::Sprite(def) => {
                draw_sprite(def, canvas, frame, source, transform, color_transforms)
            },
            Character::Image(def) => {
                canvas.draw_image(&def.encoded(), transform);
                Ok(())
            },
            Character::Missing(_) => Ok(()),
        }
    }
}

/// A morph shape pinned to a ratio, drawable like any static shape.
#[derive(Debug, Clone, Copy)]
pub struct MorphShapeAtRatio<'a> {
    pub morph: &'a MorphShapeDef,
    pub ratio: f64,
}

impl MorphShapeAtRatio<'_> {
    pub fn draw(
        &self,
        canvas: &mut SvgCanvas,
        source: &dyn CharacterSource,
        transform: &Matrix,
        color_transforms: &[ColorTransform],
    ) -> Result<()> {
        let shape = self.morph.shape_at(self.ratio, source)?;
        draw_shape(canvas, &shape, transform, color_transforms)
    }
}

/// Emit a shape, folding the accumulated color transforms first.
pub(crate) fn draw_shape(
    canvas: &mut SvgCanvas,
    shape: &Shape,
    transform: &Matrix,
    color_transforms: &[ColorTransform],
) -> Result<()> {
    if color_transforms.is_empty() {
        return canvas.draw_shape(shape, transform);
    }
    let mut shape = shape.clone();
    for ct in color_transforms {
        shape = shape.transform_colors(ct);
    }
    canvas.draw_shape(&shape, transform)
}

/// Render one sprite frame into a shared defs group and reference it.
///
/// Groups are deduplicated by (sprite id, frame, color-transform list), so
/// repeated placements of the same sprite state reuse one `<g>`.
pub(crate) fn draw_sprite(
    def: &SpriteDef,
    canvas: &mut SvgCanvas,
    frame: usize,
    source: &dyn CharacterSource,
    transform: &Matrix,
    color_transforms: &[ColorTransform],
) -> Result<()> {
    let timeline = def.timeline(source)?;
    if timeline.frames.is_empty() {
        return Ok(());
    }
    let index = frame % timeline.frames.len();
    let key = sprite_group_key(def.id, index, color_transforms);
    if canvas.group_in_progress(&key) {
        // The sprite reaches itself through the dictionary; cut the cycle
        log::warn!("sprite {} draws itself, dropping the inner reference", def.id);
        return Ok(());
    }
    let frame_ref = &timeline.frames[index];
    let group_id = canvas.object_group(&key, |canvas| {
        frame_ref.draw(canvas, index, source, color_transforms)
    })?;
    canvas.use_ref(&group_id, transform);
    Ok(())
}

fn sprite_group_key(
    id: CharacterId,
    frame: usize,
    color_transforms: &[ColorTransform],
) -> String {
    use std::fmt::Write;

    let mut key = format!("sprite:{}:{}", id, frame);
    for ct in color_transforms {
        write!(
            key,
            ":{},{},{},{},{},{},{},{}",
            ct.red_mult,
            ct.green_mult,
            ct.blue_mult,
            ct.alpha_mult,
            ct.red_add,
            ct.green_add,
            ct.blue_add,
            ct.alpha_add
        )
        .expect("write to String");
    }
    key
}
