//! Lantern - A Rust library for extracting and rendering Flash SWF graphics
//!
//! This library decodes the character dictionary of a parsed SWF movie into a
//! structured object model (shapes, morph shapes, sprites, bitmaps), replays
//! display-list records into per-frame timelines, and renders characters or
//! whole frames to Scalable Vector Graphics.
//!
//! # Features
//!
//! - **Character extraction**: Group tagged records into addressable
//!   dictionaries keyed by character id and by exported name
//! - **Morph-shape interpolation**: Materialize a morph shape at any ratio,
//!   blending positions, colors, gradients, and matrices
//! - **Timeline assembly**: Replay place/remove records into depth-ordered
//!   frame object lists with union bounds
//! - **SVG rendering**: Emit a single SVG document with deduplicated
//!   gradients, bitmap patterns, and reusable sprite groups
//! - **Lazy everything**: Dictionaries, shapes, and timelines are built on
//!   first access, memoized, and releasable under memory pressure
//!
//! # Example - Rendering the first frame
//!
//! ```no_run
//! use lantern::{Movie, SwfExtractor, RenderOptions};
//!
//! # fn main() -> lantern::Result<()> {
//! # let movie: Movie = unimplemented!();
//! // `movie` comes from an upstream SWF tag parser
//! let extractor = SwfExtractor::new(movie);
//!
//! let svg = extractor.render_frame(0, RenderOptions::default())?;
//! println!("{}", svg);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Extracting a single character
//!
//! ```no_run
//! use lantern::{Movie, SwfExtractor, RenderOptions};
//!
//! # fn main() -> lantern::Result<()> {
//! # let movie: Movie = unimplemented!();
//! let extractor = SwfExtractor::new(movie);
//!
//! // Address characters by exported name or by numeric id
//! let logo = extractor.by_name("logo")?;
//! let id = logo.id();
//! let svg = extractor.render_character(id, 0, RenderOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error handling
//!
//! Recoverable error classes (invalid tags, extra data, unprocessable
//! structures, circular sprite references) are controlled by an
//! [`ErrorMask`]: classes present in the mask raise, classes absent are
//! downgraded to sentinels (an empty timeline, a transparent fill, an empty
//! bitmap) with a `log` warning.

/// Shared primitives: geometry, colors, units, errors.
pub mod common;

/// The typed tag record contract consumed from an upstream SWF parser.
pub mod tags;

/// Encoded raster blobs and JPEG container plumbing.
pub mod images;

/// Shape object model and the static/morph shape processors.
pub mod shape;

/// Character definitions, dictionaries, and the drawable capability.
pub mod character;

/// Timeline, frames, and the display-list processor.
pub mod timeline;

/// SVG canvas, defs deduplication, and element emission.
pub mod svg;

mod extractor;

// Re-export the main entry points for convenience
pub use character::{Character, CharacterSource, MorphShapeAtRatio};
pub use common::{
    CharacterId, Color, ColorTransform, Error, ErrorMask, Matrix, Rectangle, Result,
};
pub use extractor::SwfExtractor;
pub use shape::{Edge, Fill, Path, PathStyle, Shape};
pub use svg::{RenderOptions, SvgCanvas};
pub use tags::{Movie, Tag};
pub use timeline::{Frame, FrameObject, Timeline};
