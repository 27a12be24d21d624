//! Bitmap character definitions.
//!
//! Three tag families define bitmaps: DefineBits bodies that share the
//! file-wide JPEGTables stream, standalone DefineBitsJPEG2/3/4 payloads,
//! and DefineBitsLossless records whose blob the external codec already
//! produced. All of them materialize into an [`EncodedImage`] on first use.

use crate::common::{CharacterId, Rectangle};
use crate::common::unit::TWIPS_PER_PIXEL;
use crate::images::{merge_jpeg_tables, strip_erroneous_header, EncodedImage};
use crate::tags::{DefineBitsJpegTag, DefineBitsLosslessTag, DefineBitsTag};
use log::warn;
use once_cell::unsync::OnceCell;
use std::rc::Rc;

/// A bitmap character definition.
#[derive(Debug, Clone)]
pub enum ImageDef {
    Bits(BitsImage),
    Jpeg(JpegImage),
    Lossless(LosslessImage),
}

impl ImageDef {
    pub fn id(&self) -> CharacterId {
        match self {
            ImageDef::Bits(i) => i.id,
            ImageDef::Jpeg(i) => i.id,
            ImageDef::Lossless(i) => i.id,
        }
    }

    /// The encoded blob, built on first use and memoized.
    pub fn encoded(&self) -> Rc<EncodedImage> {
        match self {
            ImageDef::Bits(i) => i.encoded(),
            ImageDef::Jpeg(i) => i.encoded(),
            ImageDef::Lossless(i) => i.image.clone(),
        }
    }

    /// Bounds in twips: the pixel size scaled by 20.
    pub fn bounds(&self) -> Rectangle {
        let image = self.encoded();
        Rectangle::from_size(
            image.width as i32 * TWIPS_PER_PIXEL,
            image.height as i32 * TWIPS_PER_PIXEL,
        )
    }
}

fn encode_or_empty(id: CharacterId, data: Vec<u8>) -> Rc<EncodedImage> {
    match EncodedImage::from_encoded(data) {
        Some(image) => Rc::new(image),
        None => {
            warn!("character {}: unrecognized image payload, substituting empty image", id);
            Rc::new(EncodedImage::empty())
        },
    }
}

/// A DefineBits body paired with the file's JPEGTables stream.
#[derive(Debug, Clone)]
pub struct BitsImage {
    pub id: CharacterId,
    data: Vec<u8>,
    tables: Option<Rc<Vec<u8>>>,
    cache: OnceCell<Rc<EncodedImage>>,
}

impl BitsImage {
    pub fn new(tag: DefineBitsTag, tables: Option<Rc<Vec<u8>>>) -> Self {
        Self {
            id: tag.id,
            data: tag.data,
            tables,
            cache: OnceCell::new(),
        }
    }

    fn encoded(&self) -> Rc<EncodedImage> {
        self.cache
            .get_or_init(|| {
                let merged = match &self.tables {
                    Some(tables) => merge_jpeg_tables(tables, &self.data),
                    None => strip_erroneous_header(&self.data).to_vec(),
                };
                encode_or_empty(self.id, merged)
            })
            .clone()
    }
}

/// A standalone DefineBitsJPEG2/3/4 payload.
#[derive(Debug, Clone)]
pub struct JpegImage {
    pub id: CharacterId,
    pub version: u8,
    data: Vec<u8>,
    /// Zlib-compressed alpha plane (v3/v4). Compositing it over the JPEG is
    /// codec work and happens downstream.
    pub alpha_data: Option<Vec<u8>>,
    cache: OnceCell<Rc<EncodedImage>>,
}

impl JpegImage {
    pub fn new(tag: DefineBitsJpegTag) -> Self {
        Self {
            id: tag.id,
            version: tag.version,
            data: tag.data,
            alpha_data: tag.alpha_data,
            cache: OnceCell::new(),
        }
    }

    fn encoded(&self) -> Rc<EncodedImage> {
        self.cache
            .get_or_init(|| encode_or_empty(self.id, strip_erroneous_header(&self.data).to_vec()))
            .clone()
    }
}

/// A DefineBitsLossless record carrying a ready encoded blob.
#[derive(Debug, Clone)]
pub struct LosslessImage {
    pub id: CharacterId,
    pub version: u8,
    pub image: Rc<EncodedImage>,
}

impl LosslessImage {
    pub fn new(tag: DefineBitsLosslessTag) -> Self {
        Self {
            id: tag.id,
            version: tag.version,
            image: Rc::new(tag.image),
        }
    }
}
