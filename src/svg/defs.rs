//! The shared `<defs>` section: deduplicated gradients, bitmap patterns,
//! embedded images, and reusable object groups.
//!
//! Every reusable element is keyed by a canonical string of the inputs that
//! shape its markup; the MD5 of that string becomes the element id, so the
//! same gradient or pattern is emitted exactly once per document.

use crate::common::unit::GRADIENT_EXTENT_PIXELS;
use crate::common::Matrix;
use crate::images::EncodedImage;
use crate::shape::{BitmapFill, Fill, GradientFill};
use std::collections::HashMap;
use std::fmt::Write;

/// Hex MD5 digest used for content-addressed element ids.
pub(crate) fn md5_hex(data: &[u8]) -> String {
    use md5::{Digest, Md5};

    let digest = Md5::digest(data);
    let mut out = String::with_capacity(32);
    for byte in digest {
        write!(out, "{:02x}", byte).expect("write to String");
    }
    out
}

/// The growing defs table of one SVG document.
#[derive(Debug, Default)]
pub(crate) struct SvgDefs {
    /// Rendered def elements in insertion order.
    items: Vec<String>,
    /// Dedup table: canonical key -> element id.
    ids: HashMap<String, String>,
    next_object: u32,
}

impl SvgDefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The next `object-N` id.
    pub fn next_object_id(&mut self) -> String {
        let id = format!("object-{}", self.next_object);
        self.next_object += 1;
        id
    }

    /// Look up a previously registered group by its dedup key.
    pub fn group_id(&self, key: &str) -> Option<String> {
        self.ids.get(key).cloned()
    }

    /// Register a rendered `<g>` body under a dedup key, returning its id.
    pub fn insert_group(&mut self, key: &str, body: String) -> String {
        let id = self.next_object_id();
        self.items.push(format!(r#"<g id="{}">{}</g>"#, id, body));
        self.ids.insert(key.to_string(), id.clone());
        id
    }

    /// The paint attribute value for a fill, registering defs as needed.
    /// Returns the paint plus an opacity to emit alongside it, if any.
    pub fn paint(&mut self, fill: &Fill) -> (String, Option<f64>) {
        match fill {
            Fill::Solid(color) => (color.to_hex(), color.opacity()),
            Fill::LinearGradient(gradient) => {
                (format!("url(#{})", self.gradient_id(gradient, false)), None)
            },
            Fill::RadialGradient(gradient) => {
                (format!("url(#{})", self.gradient_id(gradient, true)), None)
            },
            Fill::Bitmap(bitmap) => (format!("url(#{})", self.pattern_id(bitmap)), None),
        }
    }

    fn gradient_id(&mut self, gradient: &GradientFill, radial: bool) -> String {
        let key = gradient_key(gradient, radial);
        if let Some(id) = self.ids.get(&key) {
            return id.clone();
        }
        let id = format!("gradient-{}", md5_hex(key.as_bytes()));
        let markup = gradient_markup(&id, gradient, radial);
        self.ids.insert(key, id.clone());
        self.items.push(markup);
        id
    }

    fn pattern_id(&mut self, bitmap: &BitmapFill) -> String {
        let image_digest = md5_hex(bitmap.image.base64().as_bytes());
        let key = format!(
            "pattern:{}:{}:{}:{}",
            image_digest,
            pattern_transform(&bitmap.matrix),
            bitmap.smoothed,
            bitmap.repeating
        );
        if let Some(id) = self.ids.get(&key) {
            return id.clone();
        }
        let id = format!("pattern-{}", md5_hex(key.as_bytes()));
        let content = self.image_element(&bitmap.image, &image_digest);
        let markup = format!(
            r#"<pattern id="{}" patternUnits="userSpaceOnUse" width="{}" height="{}" viewBox="0 0 {} {}" patternTransform="{}">{}</pattern>"#,
            id,
            bitmap.image.width,
            bitmap.image.height,
            bitmap.image.width,
            bitmap.image.height,
            pattern_transform(&bitmap.matrix),
            content
        );
        self.ids.insert(key, id.clone());
        self.items.push(markup);
        id
    }

    /// An `<image>` element carrying the blob, or a `<use>` of the element
    /// that already carries it. The id is the MD5 of the base64 payload.
    pub fn image_element(&mut self, image: &EncodedImage, digest: &str) -> String {
        let image_id = format!("image-{}", digest);
        let key = format!("image:{}", digest);
        if self.ids.contains_key(&key) {
            return format!(r##"<use xlink:href="#{}"/>"##, image_id);
        }
        self.ids.insert(key, image_id.clone());
        format!(
            r#"<image id="{}" width="{}" height="{}" xlink:href="{}"/>"#,
            image_id,
            image.width,
            image.height,
            image.data_url()
        )
    }

    /// Render the `<defs>` element, or nothing when no defs were needed.
    pub fn render(&self) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        let mut out = String::from("<defs>");
        for item in &self.items {
            out.push_str(item);
        }
        out.push_str("</defs>");
        out
    }
}

fn gradient_key(gradient: &GradientFill, radial: bool) -> String {
    let mut key = String::from(if radial { "radial" } else { "linear" });
    write!(key, ":{}", gradient.matrix.to_svg_transform()).expect("write to String");
    if let Some(focal) = gradient.focal_point {
        write!(key, ":f{}", focal).expect("write to String");
    }
    for stop in &gradient.stops {
        write!(
            key,
            ":{},{},{}",
            stop.ratio,
            stop.color.to_hex(),
            stop.color.alpha_or_opaque()
        )
        .expect("write to String");
    }
    key
}

fn gradient_markup(id: &str, gradient: &GradientFill, radial: bool) -> String {
    let mut stops = String::new();
    for stop in &gradient.stops {
        write!(
            stops,
            r#"<stop offset="{}" stop-color="{}""#,
            stop.ratio as f64 / 255.0,
            stop.color.to_hex()
        )
        .expect("write to String");
        if let Some(opacity) = stop.color.opacity() {
            write!(stops, r#" stop-opacity="{}""#, opacity).expect("write to String");
        }
        stops.push_str("/>");
    }

    let transform = gradient.matrix.to_svg_transform();
    if radial {
        let mut focal_attrs = String::new();
        if let Some(focal) = gradient.focal_point {
            write!(
                focal_attrs,
                r#" fx="0" fy="{}""#,
                focal as f64 * GRADIENT_EXTENT_PIXELS
            )
            .expect("write to String");
        }
        format!(
            r#"<radialGradient id="{}" gradientUnits="userSpaceOnUse" cx="0" cy="0" r="{}"{} gradientTransform="{}">{}</radialGradient>"#,
            id, GRADIENT_EXTENT_PIXELS, focal_attrs, transform, stops
        )
    } else {
        format!(
            r#"<linearGradient id="{}" gradientUnits="userSpaceOnUse" x1="{}" x2="{}" gradientTransform="{}">{}</linearGradient>"#,
            id, -GRADIENT_EXTENT_PIXELS, GRADIENT_EXTENT_PIXELS, transform, stops
        )
    }
}

/// The pattern transform: the fill matrix with an extra 1/20 scale folded
/// into every term, undoing twip units for the pixel-space pattern content.
fn pattern_transform(matrix: &Matrix) -> String {
    format!(
        "matrix({}, {}, {}, {}, {}, {})",
        matrix.scale_x as f64 / 20.0,
        matrix.rotate_skew0 as f64 / 20.0,
        matrix.rotate_skew1 as f64 / 20.0,
        matrix.scale_y as f64 / 20.0,
        matrix.translate_x as f64 / 20.0,
        matrix.translate_y as f64 / 20.0,
    )
}
