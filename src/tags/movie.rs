//! The parsed movie: header fields plus the top-level tag sequence.

use crate::common::{CharacterId, Rectangle};
use crate::tags::define::{
    DefineBitsJpegTag, DefineBitsLosslessTag, DefineBitsTag, DefineMorphShapeTag,
    DefineShapeTag, DefineSpriteTag, DoActionTag, ExportAssetsTag, FrameLabelTag,
    JpegTablesTag, UnknownTag,
};
use crate::tags::display::{PlaceObjectTag, RemoveObjectTag};

/// A parsed SWF movie as delivered by the upstream byte-level parser.
#[derive(Debug, Clone)]
pub struct Movie {
    /// SWF file version.
    pub version: u8,
    /// Declared display bounds in twips.
    pub bounds: Rectangle,
    /// Frames per second.
    pub frame_rate: f32,
    /// Declared frame count of the main timeline.
    pub frame_count: u16,
    tags: Vec<Tag>,
}

impl Movie {
    pub fn new(
        version: u8,
        bounds: Rectangle,
        frame_rate: f32,
        frame_count: u16,
        tags: Vec<Tag>,
    ) -> Self {
        Self {
            version,
            bounds,
            frame_rate,
            frame_count,
            tags,
        }
    }

    /// The top-level tag sequence. Callers may iterate this any number of
    /// times.
    #[inline]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }
}

/// One tagged record from the movie or from a sprite body.
#[derive(Debug, Clone)]
pub enum Tag {
    DefineShape(DefineShapeTag),
    DefineMorphShape(DefineMorphShapeTag),
    DefineSprite(DefineSpriteTag),
    DefineBitsLossless(DefineBitsLosslessTag),
    JpegTables(JpegTablesTag),
    DefineBits(DefineBitsTag),
    DefineBitsJpeg(DefineBitsJpegTag),
    ExportAssets(ExportAssetsTag),
    ShowFrame,
    FrameLabel(FrameLabelTag),
    PlaceObject(PlaceObjectTag),
    RemoveObject(RemoveObjectTag),
    DoAction(DoActionTag),
    End,
    /// A record kind this crate ignores (sounds, fonts, scripting metadata).
    Unknown(UnknownTag),
}

impl Tag {
    /// The character id a definition tag introduces, if any.
    pub fn character_id(&self) -> Option<CharacterId> {
        match self {
            Tag::DefineShape(t) => Some(t.id),
            Tag::DefineMorphShape(t) => Some(t.id),
            Tag::DefineSprite(t) => Some(t.id),
            Tag::DefineBitsLossless(t) => Some(t.id),
            Tag::DefineBits(t) => Some(t.id),
            Tag::DefineBitsJpeg(t) => Some(t.id),
            _ => None,
        }
    }
}
