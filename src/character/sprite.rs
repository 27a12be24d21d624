//! Sprite definitions: nested timelines materialized lazily.

use crate::common::{CharacterId, Error, ErrorMask, Rectangle, Result};
use crate::character::CharacterSource;
use crate::tags::{DefineSpriteTag, Tag};
use crate::timeline::{Timeline, TimelineProcessor};
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum SpriteState {
    Unprocessed,
    /// Materialization in flight; hitting this state again means the sprite
    /// reaches itself through the character dictionary.
    Processing,
    Ready(Rc<Timeline>),
}

/// A sprite character: a reusable nested timeline.
///
/// The timeline is built from the sprite's control tags on first request
/// and cached. Re-entrant materialization raises [`Error::CircularReference`]
/// or yields [`Timeline::empty`] depending on the error mask.
#[derive(Debug, Clone)]
pub struct SpriteDef {
    pub id: CharacterId,
    /// Declared frame count from the tag header; the materialized timeline
    /// is authoritative.
    pub frame_count: u16,
    tags: Vec<Tag>,
    state: RefCell<SpriteState>,
}

impl SpriteDef {
    pub fn new(tag: DefineSpriteTag) -> Self {
        Self {
            id: tag.id,
            frame_count: tag.frame_count,
            tags: tag.tags,
            state: RefCell::new(SpriteState::Unprocessed),
        }
    }

    /// The sprite's control tags.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Materialize (or fetch) the sprite's timeline.
    pub fn timeline(&self, source: &dyn CharacterSource) -> Result<Rc<Timeline>> {
        {
            let state = self.state.borrow();
            match &*state {
                SpriteState::Ready(timeline) => return Ok(timeline.clone()),
                SpriteState::Processing => {
                    if source.error_mask().raises(ErrorMask::CIRCULAR_REFERENCE) {
                        return Err(Error::CircularReference(self.id));
                    }
                    warn!("sprite {} references itself, substituting empty timeline", self.id);
                    return Ok(Rc::new(Timeline::empty()));
                },
                SpriteState::Unprocessed => {},
            }
        }

        *self.state.borrow_mut() = SpriteState::Processing;
        // The processor only lives for this call; dropping it afterwards is
        // what breaks the extractor <-> sprite-tree cycle.
        let result = TimelineProcessor::new(source).process(&self.tags);
        match result {
            Ok(timeline) => {
                let timeline = Rc::new(timeline);
                *self.state.borrow_mut() = SpriteState::Ready(timeline.clone());
                Ok(timeline)
            },
            Err(e) => {
                // No partial state survives a failed materialization
                *self.state.borrow_mut() = SpriteState::Unprocessed;
                Err(e)
            },
        }
    }

    /// The timeline's bounds, materializing it if needed.
    pub fn bounds(&self, source: &dyn CharacterSource) -> Result<Rectangle> {
        Ok(self.timeline(source)?.bounds)
    }
}
