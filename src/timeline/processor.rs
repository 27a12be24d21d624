//! Replays display-list control records into a [`Timeline`].

use crate::character::CharacterSource;
use crate::common::{Depth, Error, ErrorMask, Matrix, Rectangle, Result};
use crate::tags::{PlaceObjectTag, Tag};
use crate::timeline::{Frame, FrameObject, Timeline};
use log::{debug, warn};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Objects larger than this in either dimension (163,840 twips = 8,192 px)
/// are excluded from the running union bounds, as is any object whose
/// inclusion would push the union past it.
pub const MAX_BOUNDS: i32 = 163_840;

/// Replays Place/Remove/ShowFrame records into per-frame object lists.
pub struct TimelineProcessor<'a> {
    source: &'a dyn CharacterSource,
    mask: ErrorMask,
}

impl<'a> TimelineProcessor<'a> {
    pub fn new(source: &'a dyn CharacterSource) -> Self {
        Self {
            source,
            mask: source.error_mask(),
        }
    }

    /// Consume control records until End (or the end of the sequence) and
    /// assemble the timeline. Every emitted frame is rewritten to the final
    /// union bounds.
    pub fn process(&self, tags: &[Tag]) -> Result<Timeline> {
        let mut objects: BTreeMap<Depth, FrameObject> = BTreeMap::new();
        let mut frames: Vec<Frame> = Vec::new();
        let mut pending_actions: Vec<Vec<u8>> = Vec::new();
        let mut frame_label: Option<String> = None;
        let mut union: Option<Rectangle> = None;

        for tag in tags {
            match tag {
                Tag::End => break,
                Tag::ShowFrame => {
                    // BTreeMap iteration gives depth-ascending order
                    let snapshot: Vec<FrameObject> = objects.values().cloned().collect();
                    for object in &snapshot {
                        accumulate_union(&mut union, object.bounds);
                    }
                    frames.push(Frame {
                        bounds: Rectangle::EMPTY,
                        objects: snapshot,
                        actions: std::mem::take(&mut pending_actions),
                        label: frame_label.take(),
                    });
                },
                Tag::DoAction(action) => pending_actions.push(action.actions.clone()),
                Tag::FrameLabel(label) => frame_label = Some(label.label.clone()),
                Tag::RemoveObject(remove) => {
                    objects.remove(&remove.depth);
                },
                Tag::PlaceObject(place) => self.place(&mut objects, place)?,
                // Definitions, sounds, and unknown records are inert here
                _ => {},
            }
        }

        if frames.is_empty() {
            if self.mask.raises(ErrorMask::UNPROCESSABLE_DATA) {
                return Err(Error::ProcessingInvalidData(
                    "timeline has no ShowFrame records".to_string(),
                ));
            }
            warn!("timeline has no ShowFrame records, substituting empty timeline");
            return Ok(Timeline::empty());
        }

        let bounds = union.unwrap_or(Rectangle::EMPTY);
        for frame in &mut frames {
            frame.bounds = bounds;
        }
        debug!("built timeline: {} frames, bounds {:?}", frames.len(), bounds);
        Ok(Timeline { bounds, frames })
    }

    fn place(&self, objects: &mut BTreeMap<Depth, FrameObject>, tag: &PlaceObjectTag) -> Result<()> {
        if !tag.is_move {
            let Some(id) = tag.character_id else {
                return self.invalid(format!(
                    "placement at depth {} without a character id",
                    tag.depth
                ));
            };
            let character = self.source.character(id);
            if character.is_missing() {
                return self.invalid(format!("placement of missing character {}", id));
            }
            let char_bounds = character.bounds(self.source)?;
            let place_matrix = tag.matrix.unwrap_or(Matrix::IDENTITY);
            objects.insert(
                tag.depth,
                FrameObject {
                    character_id: id,
                    depth: tag.depth,
                    bounds: char_bounds.transform(&place_matrix),
                    matrix: place_matrix.translate(char_bounds.x_min, char_bounds.y_min),
                    place_matrix,
                    color_transform: tag.color_transform,
                    clip_depth: tag.clip_depth,
                    name: tag.name.clone(),
                    filters: tag.filters.clone().unwrap_or_default(),
                    blend_mode: tag.blend_mode.unwrap_or_default(),
                    ratio: tag.ratio,
                    color_transforms: SmallVec::new(),
                },
            );
            return Ok(());
        }

        let Some(object) = objects.get_mut(&tag.depth) else {
            return self.invalid(format!("modify of empty depth {}", tag.depth));
        };

        if let Some(id) = tag.character_id {
            // Swap the character and redo the translation dance against the
            // new character's bounds
            let character = self.source.character(id);
            if character.is_missing() {
                return self.invalid(format!("modify with missing character {}", id));
            }
            let char_bounds = character.bounds(self.source)?;
            let place_matrix = tag.matrix.unwrap_or(object.place_matrix);
            object.character_id = id;
            object.place_matrix = place_matrix;
            object.matrix = place_matrix.translate(char_bounds.x_min, char_bounds.y_min);
            object.bounds = char_bounds.transform(&place_matrix);
        } else if let Some(matrix) = tag.matrix {
            let char_bounds = self
                .source
                .character(object.character_id)
                .bounds(self.source)?;
            object.place_matrix = matrix;
            object.matrix = matrix.translate(char_bounds.x_min, char_bounds.y_min);
            object.bounds = char_bounds.transform(&matrix);
        }

        if let Some(ct) = tag.color_transform {
            object.color_transform = Some(ct);
        }
        if let Some(ratio) = tag.ratio {
            object.ratio = Some(ratio);
        }
        if let Some(clip_depth) = tag.clip_depth {
            object.clip_depth = Some(clip_depth);
        }
        if let Some(name) = &tag.name {
            object.name = Some(name.clone());
        }
        if let Some(filters) = &tag.filters {
            object.filters = filters.clone();
        }
        if let Some(blend_mode) = tag.blend_mode {
            object.blend_mode = blend_mode;
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> Result<()> {
        if self.mask.raises(ErrorMask::UNPROCESSABLE_DATA) {
            return Err(Error::ProcessingInvalidData(message));
        }
        warn!("{}, skipping record", message);
        Ok(())
    }
}

/// Grow the running union, excluding oversized objects and objects that
/// would push the union past [`MAX_BOUNDS`].
fn accumulate_union(union: &mut Option<Rectangle>, bounds: Rectangle) {
    if bounds.width() > MAX_BOUNDS || bounds.height() > MAX_BOUNDS {
        return;
    }
    let candidate = match union {
        Some(current) => current.union(&bounds),
        None => bounds,
    };
    if candidate.width() > MAX_BOUNDS || candidate.height() > MAX_BOUNDS {
        return;
    }
    *union = Some(candidate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Character, CharacterSource, ShapeDef};
    use crate::common::{CharacterId, Color};
    use crate::tags::{
        DefineShapeTag, FillStyle, ShapeRecord, StraightEdgeRecord, StyleChangeRecord,
    };
    use std::collections::BTreeMap as Map;

    struct TestSource {
        shapes: Map<CharacterId, ShapeDef>,
        mask: ErrorMask,
    }

    impl TestSource {
        fn new(ids_and_bounds: &[(CharacterId, Rectangle)]) -> Self {
            let mut shapes = Map::new();
            for (id, bounds) in ids_and_bounds {
                shapes.insert(*id, ShapeDef::new(shape_tag(*id, *bounds)));
            }
            Self {
                shapes,
                mask: ErrorMask::NONE,
            }
        }
    }

    impl CharacterSource for TestSource {
        fn character(&self, id: CharacterId) -> Character<'_> {
            match self.shapes.get(&id) {
                Some(def) => Character::Shape(def),
                None => Character::Missing(id),
            }
        }

        fn error_mask(&self) -> ErrorMask {
            self.mask
        }
    }

    fn shape_tag(id: CharacterId, bounds: Rectangle) -> DefineShapeTag {
        DefineShapeTag {
            id,
            version: 1,
            bounds,
            fill_styles: vec![FillStyle::Solid(Color::rgb(0, 0, 0))],
            line_styles: vec![],
            records: vec![
                ShapeRecord::StyleChange(StyleChangeRecord {
                    fill_style1: Some(1),
                    move_to: Some((bounds.x_min, bounds.y_min)),
                    ..Default::default()
                }),
                ShapeRecord::StraightEdge(StraightEdgeRecord {
                    delta_x: bounds.width(),
                    delta_y: bounds.height(),
                }),
                ShapeRecord::EndShape,
            ],
        }
    }

    fn place(depth: Depth, id: CharacterId, matrix: Option<Matrix>) -> Tag {
        Tag::PlaceObject(PlaceObjectTag {
            version: 2,
            depth,
            character_id: Some(id),
            matrix,
            ..Default::default()
        })
    }

    fn move_by(depth: Depth, matrix: Matrix) -> Tag {
        Tag::PlaceObject(PlaceObjectTag {
            version: 2,
            depth,
            matrix: Some(matrix),
            is_move: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_two_frame_move() {
        let source = TestSource::new(&[(7, Rectangle::new(0, 200, 0, 100))]);
        let tags = vec![
            place(1, 7, None),
            Tag::ShowFrame,
            move_by(1, Matrix::translation(2000, 0)),
            Tag::ShowFrame,
            Tag::End,
        ];
        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();

        assert_eq!(timeline.frames.len(), 2);
        let first = &timeline.frames[0].objects[0];
        let second = &timeline.frames[1].objects[0];
        assert_eq!(first.matrix.translate_x - second.matrix.translate_x, -2000);
        assert_eq!(timeline.frames[0].bounds, timeline.frames[1].bounds);
        assert_eq!(timeline.bounds, Rectangle::new(0, 2200, 0, 100));
        // Every surviving object sits inside the final union
        for frame in &timeline.frames {
            for object in &frame.objects {
                assert!(timeline.bounds.contains(&object.bounds));
            }
        }
    }

    #[test]
    fn test_composed_matrix_lands_on_bounds_origin() {
        let source = TestSource::new(&[(7, Rectangle::new(100, 300, 40, 140))]);
        let tags = vec![place(1, 7, None), Tag::ShowFrame, Tag::End];
        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();

        let object = &timeline.frames[0].objects[0];
        assert_eq!(object.place_matrix, Matrix::IDENTITY);
        assert_eq!(object.matrix, Matrix::translation(100, 40));
        assert_eq!(object.bounds, Rectangle::new(100, 300, 40, 140));
    }

    #[test]
    fn test_objects_ordered_by_depth() {
        let source = TestSource::new(&[
            (1, Rectangle::new(0, 10, 0, 10)),
            (2, Rectangle::new(0, 20, 0, 20)),
        ]);
        let tags = vec![
            place(5, 2, None),
            place(1, 1, None),
            Tag::ShowFrame,
            Tag::End,
        ];
        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();
        let depths: Vec<Depth> = timeline.frames[0].objects.iter().map(|o| o.depth).collect();
        assert_eq!(depths, vec![1, 5]);
    }

    #[test]
    fn test_remove_object() {
        let source = TestSource::new(&[(1, Rectangle::new(0, 10, 0, 10))]);
        let tags = vec![
            place(1, 1, None),
            Tag::ShowFrame,
            Tag::RemoveObject(crate::tags::RemoveObjectTag {
                depth: 1,
                character_id: None,
            }),
            Tag::ShowFrame,
            Tag::End,
        ];
        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();
        assert_eq!(timeline.frames[0].objects.len(), 1);
        assert_eq!(timeline.frames[1].objects.len(), 0);
    }

    #[test]
    fn test_no_frames_behavior() {
        let mut source = TestSource::new(&[]);
        let timeline = TimelineProcessor::new(&source).process(&[Tag::End]).unwrap();
        assert_eq!(timeline, Timeline::empty());

        source.mask = ErrorMask::UNPROCESSABLE_DATA;
        let result = TimelineProcessor::new(&source).process(&[Tag::End]);
        assert!(matches!(result, Err(Error::ProcessingInvalidData(_))));
    }

    #[test]
    fn test_missing_character_placement_behavior() {
        let mut source = TestSource::new(&[]);
        let tags = vec![place(1, 99, None), Tag::ShowFrame, Tag::End];

        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();
        assert!(timeline.frames[0].objects.is_empty());

        source.mask = ErrorMask::UNPROCESSABLE_DATA;
        let result = TimelineProcessor::new(&source).process(&tags);
        assert!(matches!(result, Err(Error::ProcessingInvalidData(_))));
    }

    #[test]
    fn test_modify_of_empty_depth_behavior() {
        let mut source = TestSource::new(&[]);
        let tags = vec![
            move_by(4, Matrix::translation(100, 0)),
            Tag::ShowFrame,
            Tag::End,
        ];

        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();
        assert!(timeline.frames[0].objects.is_empty());

        source.mask = ErrorMask::UNPROCESSABLE_DATA;
        let result = TimelineProcessor::new(&source).process(&tags);
        assert!(matches!(result, Err(Error::ProcessingInvalidData(_))));
    }

    #[test]
    fn test_oversized_object_excluded_from_union() {
        let source = TestSource::new(&[
            (1, Rectangle::new(0, 200, 0, 100)),
            (2, Rectangle::new(0, 1_000_000, 0, 100)),
        ]);
        let tags = vec![
            place(1, 1, None),
            place(2, 2, None),
            Tag::ShowFrame,
            Tag::End,
        ];
        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();
        assert_eq!(timeline.bounds, Rectangle::new(0, 200, 0, 100));
    }

    #[test]
    fn test_union_growth_past_limit_excluded() {
        let source = TestSource::new(&[
            (1, Rectangle::new(0, 200, 0, 100)),
            (2, Rectangle::new(0, 200, 0, 100)),
        ]);
        // The second object fits on its own but would stretch the union
        // past the limit
        let tags = vec![
            place(1, 1, None),
            place(2, 2, Some(Matrix::translation(163_800, 0))),
            Tag::ShowFrame,
            Tag::End,
        ];
        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();
        assert_eq!(timeline.bounds, Rectangle::new(0, 200, 0, 100));
    }

    #[test]
    fn test_character_swap_recomputes_bounds() {
        let source = TestSource::new(&[
            (1, Rectangle::new(0, 100, 0, 100)),
            (2, Rectangle::new(50, 250, 50, 150)),
        ]);
        let tags = vec![
            place(1, 1, None),
            Tag::ShowFrame,
            Tag::PlaceObject(PlaceObjectTag {
                version: 2,
                depth: 1,
                character_id: Some(2),
                is_move: true,
                ..Default::default()
            }),
            Tag::ShowFrame,
            Tag::End,
        ];
        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();

        let swapped = &timeline.frames[1].objects[0];
        assert_eq!(swapped.character_id, 2);
        assert_eq!(swapped.bounds, Rectangle::new(50, 250, 50, 150));
        assert_eq!(swapped.matrix, Matrix::translation(50, 50));
    }

    #[test]
    fn test_frame_label_and_actions_consumed() {
        let source = TestSource::new(&[(1, Rectangle::new(0, 10, 0, 10))]);
        let tags = vec![
            Tag::FrameLabel(crate::tags::FrameLabelTag {
                label: "intro".to_string(),
            }),
            Tag::DoAction(crate::tags::DoActionTag {
                actions: vec![0x81, 0x00],
            }),
            place(1, 1, None),
            Tag::ShowFrame,
            Tag::ShowFrame,
            Tag::End,
        ];
        let timeline = TimelineProcessor::new(&source).process(&tags).unwrap();

        assert_eq!(timeline.frames[0].label.as_deref(), Some("intro"));
        assert_eq!(timeline.frames[0].actions.len(), 1);
        // Label and actions do not leak into the next frame
        assert_eq!(timeline.frames[1].label, None);
        assert!(timeline.frames[1].actions.is_empty());
    }
}
