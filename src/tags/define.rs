//! Definition tag records: shapes, morph shapes, sprites, bitmaps, exports.

use crate::common::{CharacterId, Rectangle};
use crate::images::EncodedImage;
use crate::tags::movie::Tag;
use crate::tags::styles::{
    FillStyle, LineStyle, MorphFillStyle, MorphLineStyle, ShapeRecord,
};

/// DefineShape, versions 1 through 4.
#[derive(Debug, Clone)]
pub struct DefineShapeTag {
    pub id: CharacterId,
    pub version: u8,
    pub bounds: Rectangle,
    pub fill_styles: Vec<FillStyle>,
    pub line_styles: Vec<LineStyle>,
    pub records: Vec<ShapeRecord>,
}

/// DefineMorphShape, versions 1 and 2.
#[derive(Debug, Clone)]
pub struct DefineMorphShapeTag {
    pub id: CharacterId,
    pub version: u8,
    pub start_bounds: Rectangle,
    pub end_bounds: Rectangle,
    pub fill_styles: Vec<MorphFillStyle>,
    pub line_styles: Vec<MorphLineStyle>,
    pub start_records: Vec<ShapeRecord>,
    pub end_records: Vec<ShapeRecord>,
}

/// DefineSprite: a nested timeline of control tags.
#[derive(Debug, Clone)]
pub struct DefineSpriteTag {
    pub id: CharacterId,
    pub frame_count: u16,
    pub tags: Vec<Tag>,
}

/// DefineBitsLossless, versions 1 and 2.
///
/// The zlib pixel payload is transcoded by the out-of-scope codec layer;
/// this record transports its output.
#[derive(Debug, Clone)]
pub struct DefineBitsLosslessTag {
    pub id: CharacterId,
    pub version: u8,
    pub image: EncodedImage,
}

/// The shared JPEG encoding tables used by every DefineBits tag.
#[derive(Debug, Clone)]
pub struct JpegTablesTag {
    pub data: Vec<u8>,
}

/// DefineBits: a JPEG body whose tables live in the JPEGTables tag.
#[derive(Debug, Clone)]
pub struct DefineBitsTag {
    pub id: CharacterId,
    pub data: Vec<u8>,
}

/// DefineBitsJPEG2/3/4: a standalone image payload.
#[derive(Debug, Clone)]
pub struct DefineBitsJpegTag {
    pub id: CharacterId,
    /// 2, 3, or 4.
    pub version: u8,
    pub data: Vec<u8>,
    /// Zlib-compressed alpha plane (version 3 and 4).
    pub alpha_data: Option<Vec<u8>>,
    /// Deblocking filter strength (version 4).
    pub deblock: Option<f32>,
}

/// ExportAssets: published name aliases for character ids.
#[derive(Debug, Clone)]
pub struct ExportAssetsTag {
    pub assets: Vec<(CharacterId, String)>,
}

/// FrameLabel: names the frame the next ShowFrame emits.
#[derive(Debug, Clone)]
pub struct FrameLabelTag {
    pub label: String,
}

/// DoAction: ActionScript bytecode attached to the current frame. Carried
/// opaquely; execution is out of scope.
#[derive(Debug, Clone)]
pub struct DoActionTag {
    pub actions: Vec<u8>,
}

/// Any record kind the extractor ignores.
#[derive(Debug, Clone)]
pub struct UnknownTag {
    pub code: u16,
}
