//! The typed tag record contract consumed from an upstream SWF parser.
//!
//! This crate does not read SWF bytes itself: an external parser produces a
//! [`Movie`] holding the header fields and a finite, restartable sequence of
//! [`Tag`] records. Dictionaries re-iterate the same sequence several times
//! (shapes, then morph shapes, then sprites, then images), so the records
//! are owned values rather than a one-shot stream.

// Submodule declarations
pub mod define;
pub mod display;
pub mod movie;
pub mod styles;

// Re-exports
pub use define::{
    DefineBitsJpegTag, DefineBitsLosslessTag, DefineBitsTag, DefineMorphShapeTag,
    DefineShapeTag, DefineSpriteTag, DoActionTag, ExportAssetsTag, FrameLabelTag,
    JpegTablesTag, UnknownTag,
};
pub use display::{
    BevelFilter, BlendMode, BlurFilter, ColorMatrixFilter, ConvolutionFilter,
    DropShadowFilter, Filter, GlowFilter, GradientGlowFilter, PlaceObjectTag,
    RemoveObjectTag,
};
pub use movie::{Movie, Tag};
pub use styles::{
    CurvedEdgeRecord, FillStyle, Gradient, GradientRecord, LineStyle, MorphFillStyle,
    MorphGradient, MorphGradientRecord, MorphLineStyle, NewStyles, ShapeRecord,
    StraightEdgeRecord, StyleChangeRecord,
};
