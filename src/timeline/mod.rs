//! Timelines, frames, and frame objects.
//!
//! A timeline is the replayed result of a display list: one [`Frame`] per
//! ShowFrame record, each holding the depth-ordered objects visible at that
//! instant. After processing, every frame carries the timeline's final
//! union bounds.

// Submodule declarations
pub mod processor;

// Re-exports
pub use processor::{TimelineProcessor, MAX_BOUNDS};

use crate::character::{Character, CharacterSource, MorphShapeAtRatio};
use crate::common::{CharacterId, ColorTransform, Depth, Matrix, Rectangle, Result};
use crate::svg::SvgCanvas;
use crate::tags::{BlendMode, Filter};
use smallvec::SmallVec;

/// A replayed display list: final bounds plus one frame per ShowFrame.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub bounds: Rectangle,
    /// Never empty; see [`Timeline::empty`] for the degenerate case.
    pub frames: Vec<Frame>,
}

impl Timeline {
    /// The sentinel for timelines that could not be built: zero bounds and
    /// a single frame with no objects.
    pub fn empty() -> Timeline {
        Timeline {
            bounds: Rectangle::EMPTY,
            frames: vec![Frame::default()],
        }
    }

    pub fn frames_count(&self) -> usize {
        self.frames.len()
    }

    /// Draw one frame. Frame indices wrap around the frame count.
    pub fn draw(
        &self,
        canvas: &mut SvgCanvas,
        frame: usize,
        source: &dyn CharacterSource,
        color_transforms: &[ColorTransform],
    ) -> Result<()> {
        if self.frames.is_empty() {
            return Ok(());
        }
        let index = frame % self.frames.len();
        self.frames[index].draw(canvas, index, source, color_transforms)
    }
}

/// One rendered state of a timeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub bounds: Rectangle,
    /// Objects ordered by depth ascending.
    pub objects: Vec<FrameObject>,
    /// DoAction payloads attached to this frame, in record order.
    pub actions: Vec<Vec<u8>>,
    pub label: Option<String>,
}

impl Frame {
    /// Draw every object in depth order. `frame` is the index this frame
    /// occupies, used to pick nested sprite frames.
    pub fn draw(
        &self,
        canvas: &mut SvgCanvas,
        frame: usize,
        source: &dyn CharacterSource,
        color_transforms: &[ColorTransform],
    ) -> Result<()> {
        for object in &self.objects {
            object.draw(canvas, frame, source, color_transforms)?;
        }
        Ok(())
    }
}

/// One object placed at a depth slot.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameObject {
    pub character_id: CharacterId,
    pub depth: Depth,
    /// Character bounds projected through the placement matrix.
    pub bounds: Rectangle,
    /// The composed matrix: placement followed by a translation onto the
    /// character's bounds origin.
    pub matrix: Matrix,
    /// The raw placement matrix from the tag, kept so moves can recompose.
    pub place_matrix: Matrix,
    pub color_transform: Option<ColorTransform>,
    /// Set when this object masks the depths up to the given value.
    pub clip_depth: Option<Depth>,
    pub name: Option<String>,
    pub filters: Vec<Filter>,
    pub blend_mode: BlendMode,
    /// Morph ratio in [0, 65535].
    pub ratio: Option<u16>,
    /// Additional color transforms applied lazily at render, in order.
    pub color_transforms: SmallVec<[ColorTransform; 2]>,
}

impl FrameObject {
    /// Append a lazily applied color transform.
    pub fn push_color_transform(&mut self, transform: ColorTransform) {
        self.color_transforms.push(transform);
    }

    /// The ordered color transforms in effect for this object, inherited
    /// ones first.
    fn effective_color_transforms(
        &self,
        inherited: &[ColorTransform],
    ) -> SmallVec<[ColorTransform; 4]> {
        let mut transforms = SmallVec::new();
        transforms.extend_from_slice(inherited);
        if let Some(ct) = self.color_transform {
            if !ct.is_identity() {
                transforms.push(ct);
            }
        }
        transforms.extend(self.color_transforms.iter().copied());
        transforms
    }

    /// Draw the object's character with this object's placement and color
    /// state. Mask objects (clip depth set) are not painted.
    pub fn draw(
        &self,
        canvas: &mut SvgCanvas,
        frame: usize,
        source: &dyn CharacterSource,
        inherited: &[ColorTransform],
    ) -> Result<()> {
        if self.clip_depth.is_some() {
            return Ok(());
        }
        let transforms = self.effective_color_transforms(inherited);
        let character = source.character(self.character_id);
        match (character, self.ratio) {
            (Character::MorphShape(def), Some(ratio)) => MorphShapeAtRatio {
                morph: def,
                ratio: ratio as f64 / 65535.0,
            }
            .draw(canvas, source, &self.place_matrix, &transforms),
            _ => character.draw(canvas, frame, source, &self.place_matrix, &transforms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorMask;

    struct EmptySource;

    impl CharacterSource for EmptySource {
        fn character(&self, id: CharacterId) -> Character<'_> {
            Character::Missing(id)
        }

        fn error_mask(&self) -> ErrorMask {
            ErrorMask::NONE
        }
    }

    fn object(depth: Depth) -> FrameObject {
        FrameObject {
            character_id: 1,
            depth,
            bounds: Rectangle::EMPTY,
            matrix: Matrix::IDENTITY,
            place_matrix: Matrix::IDENTITY,
            color_transform: None,
            clip_depth: None,
            name: None,
            filters: vec![],
            blend_mode: BlendMode::Normal,
            ratio: None,
            color_transforms: SmallVec::new(),
        }
    }

    #[test]
    fn test_empty_timeline_sentinel() {
        let timeline = Timeline::empty();
        assert_eq!(timeline.bounds, Rectangle::EMPTY);
        assert_eq!(timeline.frames_count(), 1);
        assert!(timeline.frames[0].objects.is_empty());
    }

    #[test]
    fn test_effective_color_transforms_order() {
        let mut obj = object(1);
        let place_ct = ColorTransform::multiply(0.5, 1.0, 1.0, 1.0);
        let lazy_ct = ColorTransform::add(10, 0, 0, 0);
        obj.color_transform = Some(place_ct);
        obj.push_color_transform(lazy_ct);

        let inherited = [ColorTransform::multiply(1.0, 0.5, 1.0, 1.0)];
        let transforms = obj.effective_color_transforms(&inherited);
        assert_eq!(transforms.len(), 3);
        assert_eq!(transforms[0], inherited[0]);
        assert_eq!(transforms[1], place_ct);
        assert_eq!(transforms[2], lazy_ct);
    }

    #[test]
    fn test_identity_place_transform_is_dropped() {
        let mut obj = object(1);
        obj.color_transform = Some(ColorTransform::IDENTITY);
        assert!(obj.effective_color_transforms(&[]).is_empty());
    }

    #[test]
    fn test_draw_wraps_frame_index() {
        let mut timeline = Timeline::empty();
        timeline.frames[0].objects.push(object(3));

        let mut canvas = SvgCanvas::new(Rectangle::EMPTY);
        // Frame 5 of a 1-frame timeline resolves to frame 0; missing
        // characters draw nothing
        timeline.draw(&mut canvas, 5, &EmptySource, &[]).unwrap();
    }
}
