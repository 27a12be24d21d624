//! The extraction facade: owns the parsed movie and every cached
//! dictionary, and exposes the character and timeline accessors.

use crate::character::{
    BitsImage, Character, CharacterSource, ImageDef, JpegImage, LosslessImage, MorphShapeDef,
    ShapeDef, SpriteDef,
};
use crate::common::{CharacterId, Error, ErrorMask, Matrix, Result};
use crate::svg::{RenderOptions, SvgCanvas};
use crate::tags::{Movie, Tag};
use crate::timeline::{Timeline, TimelineProcessor};
use log::debug;
use once_cell::unsync::OnceCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Extracts characters and timelines from a parsed SWF movie.
///
/// Dictionaries are built on the first access and memoized; [`release`]
/// drops every cache back to the unbuilt state. One extractor belongs to
/// one actor: it is not synchronized.
///
/// [`release`]: SwfExtractor::release
pub struct SwfExtractor {
    movie: Movie,
    mask: ErrorMask,
    memory_limit: Option<u64>,
    shapes: OnceCell<BTreeMap<CharacterId, ShapeDef>>,
    morph_shapes: OnceCell<BTreeMap<CharacterId, MorphShapeDef>>,
    sprites: OnceCell<BTreeMap<CharacterId, SpriteDef>>,
    images: OnceCell<BTreeMap<CharacterId, ImageDef>>,
    exported: OnceCell<BTreeMap<String, CharacterId>>,
    timeline: OnceCell<Rc<Timeline>>,
    timeline_file_bounds: OnceCell<Rc<Timeline>>,
}

impl SwfExtractor {
    pub fn new(movie: Movie) -> Self {
        Self {
            movie,
            mask: ErrorMask::default(),
            memory_limit: None,
            shapes: OnceCell::new(),
            morph_shapes: OnceCell::new(),
            sprites: OnceCell::new(),
            images: OnceCell::new(),
            exported: OnceCell::new(),
            timeline: OnceCell::new(),
            timeline_file_bounds: OnceCell::new(),
        }
    }

    /// Select which recoverable error classes raise instead of downgrading.
    pub fn with_error_mask(mut self, mask: ErrorMask) -> Self {
        self.mask = mask;
        self
    }

    /// Configure the process memory limit consulted by
    /// [`SwfExtractor::release_if_over_budget`].
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    pub fn movie(&self) -> &Movie {
        &self.movie
    }

    /// Shape definitions by id, from DefineShape v1-v4 tags. Id 0 is
    /// skipped; duplicate ids keep the last definition.
    pub fn shapes(&self) -> &BTreeMap<CharacterId, ShapeDef> {
        self.shapes.get_or_init(|| {
            let mut shapes = BTreeMap::new();
            for tag in self.movie.tags() {
                if let Tag::DefineShape(t) = tag {
                    if t.id != 0 {
                        shapes.insert(t.id, ShapeDef::new(t.clone()));
                    }
                }
            }
            debug!("built shape dictionary: {} entries", shapes.len());
            shapes
        })
    }

    /// Morph shape definitions by id, from DefineMorphShape v1-v2 tags.
    pub fn morph_shapes(&self) -> &BTreeMap<CharacterId, MorphShapeDef> {
        self.morph_shapes.get_or_init(|| {
            let mut morphs = BTreeMap::new();
            for tag in self.movie.tags() {
                if let Tag::DefineMorphShape(t) = tag {
                    if t.id != 0 {
                        morphs.insert(t.id, MorphShapeDef::new(t.clone()));
                    }
                }
            }
            debug!("built morph shape dictionary: {} entries", morphs.len());
            morphs
        })
    }

    /// Sprite definitions by id, from DefineSprite tags.
    pub fn sprites(&self) -> &BTreeMap<CharacterId, SpriteDef> {
        self.sprites.get_or_init(|| {
            let mut sprites = BTreeMap::new();
            for tag in self.movie.tags() {
                if let Tag::DefineSprite(t) = tag {
                    if t.id != 0 {
                        sprites.insert(t.id, SpriteDef::new(t.clone()));
                    }
                }
            }
            debug!("built sprite dictionary: {} entries", sprites.len());
            sprites
        })
    }

    /// Bitmap definitions by id: lossless records, DefineBits bodies paired
    /// with the preceding JPEGTables, and standalone JPEG payloads. The
    /// union is biased first-seen: a lossless definition is never
    /// overwritten by a DefineBits one, nor that by a JPEG one.
    pub fn images(&self) -> &BTreeMap<CharacterId, ImageDef> {
        self.images.get_or_init(|| {
            let mut lossless = BTreeMap::new();
            let mut bits = BTreeMap::new();
            let mut jpegs = BTreeMap::new();
            let mut tables: Option<Rc<Vec<u8>>> = None;
            for tag in self.movie.tags() {
                match tag {
                    Tag::JpegTables(t) => tables = Some(Rc::new(t.data.clone())),
                    Tag::DefineBitsLossless(t) if t.id != 0 => {
                        lossless.insert(t.id, ImageDef::Lossless(LosslessImage::new(t.clone())));
                    },
                    Tag::DefineBits(t) if t.id != 0 => {
                        bits.insert(
                            t.id,
                            ImageDef::Bits(BitsImage::new(t.clone(), tables.clone())),
                        );
                    },
                    Tag::DefineBitsJpeg(t) if t.id != 0 => {
                        jpegs.insert(t.id, ImageDef::Jpeg(JpegImage::new(t.clone())));
                    },
                    _ => {},
                }
            }

            let mut images = lossless;
            for (id, def) in bits {
                images.entry(id).or_insert(def);
            }
            for (id, def) in jpegs {
                images.entry(id).or_insert(def);
            }
            debug!("built image dictionary: {} entries", images.len());
            images
        })
    }

    /// Exported name to id, from every ExportAssets tag. On name collision
    /// the earliest mapping wins. Numeric-looking names stay strings.
    pub fn exported(&self) -> &BTreeMap<String, CharacterId> {
        self.exported.get_or_init(|| {
            let mut names = BTreeMap::new();
            for tag in self.movie.tags() {
                if let Tag::ExportAssets(t) = tag {
                    for (id, name) in &t.assets {
                        names.entry(name.clone()).or_insert(*id);
                    }
                }
            }
            names
        })
    }

    /// Look up a character by exported name.
    pub fn by_name(&self, name: &str) -> Result<Character<'_>> {
        match self.exported().get(name) {
            Some(id) => Ok(self.character(*id)),
            None => Err(Error::NameNotExported(name.to_string())),
        }
    }

    /// The root timeline built from the movie's top-level display list.
    ///
    /// With `use_file_bounds`, the timeline and every frame carry the
    /// file's declared display bounds instead of the computed union.
    pub fn timeline(&self, use_file_bounds: bool) -> Result<Rc<Timeline>> {
        let timeline = self
            .timeline
            .get_or_try_init(|| {
                TimelineProcessor::new(self)
                    .process(self.movie.tags())
                    .map(Rc::new)
            })?
            .clone();
        if !use_file_bounds || *timeline == Timeline::empty() {
            // The empty sentinel keeps its zero bounds
            return Ok(timeline);
        }
        self.timeline_file_bounds
            .get_or_try_init(|| {
                let bounds = self.movie.bounds;
                let mut rebounded = (*timeline).clone();
                rebounded.bounds = bounds;
                for frame in &mut rebounded.frames {
                    frame.bounds = bounds;
                }
                Ok(Rc::new(rebounded))
            })
            .cloned()
    }

    /// Drop every cache back to the unbuilt state.
    pub fn release(&mut self) {
        self.shapes = OnceCell::new();
        self.morph_shapes = OnceCell::new();
        self.sprites = OnceCell::new();
        self.images = OnceCell::new();
        self.exported = OnceCell::new();
        self.timeline = OnceCell::new();
        self.timeline_file_bounds = OnceCell::new();
        debug!("released all extractor caches");
    }

    /// Release the caches when `current` memory usage exceeds `limit`,
    /// defaulting to 75% of the configured memory limit. Returns whether a
    /// release happened.
    pub fn release_if_over_budget(&mut self, current: u64, limit: Option<u64>) -> bool {
        let Some(limit) = limit.or_else(|| self.memory_limit.map(|l| l / 4 * 3)) else {
            return false;
        };
        if current <= limit {
            return false;
        }
        self.release();
        true
    }

    /// Render one character to a standalone SVG document.
    pub fn render_character(
        &self,
        id: CharacterId,
        frame: usize,
        options: RenderOptions,
    ) -> Result<String> {
        let character = self.character(id);
        let bounds = character.bounds(self)?;
        let mut canvas = SvgCanvas::with_options(bounds, options);
        character.draw(&mut canvas, frame, self, &Matrix::IDENTITY, &[])?;
        canvas.render()
    }

    /// Render one frame of the root timeline to an SVG document sized to
    /// the file's display bounds.
    pub fn render_frame(&self, frame: usize, options: RenderOptions) -> Result<String> {
        let timeline = self.timeline(true)?;
        let mut canvas = SvgCanvas::with_options(timeline.bounds, options);
        timeline.draw(&mut canvas, frame, self, &[])?;
        canvas.render()
    }
}

impl CharacterSource for SwfExtractor {
    /// Union view across all dictionaries, first-seen biased in the order
    /// shapes, morph shapes, sprites, images. Never fails.
    fn character(&self, id: CharacterId) -> Character<'_> {
        if let Some(def) = self.shapes().get(&id) {
            return Character::Shape(def);
        }
        if let Some(def) = self.morph_shapes().get(&id) {
            return Character::MorphShape(def);
        }
        if let Some(def) = self.sprites().get(&id) {
            return Character::Sprite(def);
        }
        if let Some(def) = self.images().get(&id) {
            return Character::Image(def);
        }
        Character::Missing(id)
    }

    fn error_mask(&self) -> ErrorMask {
        self.mask
    }
}

impl SwfExtractor {
    /// Resolve a character id across every dictionary; unknown ids yield
    /// the [`Character::Missing`] sentinel.
    pub fn character(&self, id: CharacterId) -> Character<'_> {
        CharacterSource::character(self, id)
    }
}
