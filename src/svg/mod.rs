//! The SVG canvas: accepts shape and image draw calls and emits a single
//! SVG document with a shared, deduplicated `<defs>` section.
//!
//! Nested sprite frames render through [`SvgCanvas::object_group`], which
//! redirects drawing into a `<g>` stored in the root defs and hands back
//! its id for a `<use>` reference. Calling [`SvgCanvas::render`] while such
//! a group is open is a usage error.

// Submodule declarations
pub(crate) mod defs;

use crate::common::unit::twips_to_pixels;
use crate::common::{Error, Matrix, Rectangle, Result};
use crate::images::EncodedImage;
use crate::shape::{Edge, Path, Shape};
use defs::{md5_hex, SvgDefs};
use std::collections::HashSet;
use std::fmt::Write;

/// Rendering knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Allow stroke widths below one pixel. When false (the default),
    /// sub-pixel strokes clamp to one pixel and pin their width with
    /// `vector-effect="non-scaling-stroke"`.
    pub subpixel_stroke_width: bool,
}

/// An SVG document under construction.
pub struct SvgCanvas {
    bounds: Rectangle,
    options: RenderOptions,
    elements: Vec<String>,
    include_stack: Vec<Vec<String>>,
    open_groups: HashSet<String>,
    defs: SvgDefs,
}

impl SvgCanvas {
    pub fn new(bounds: Rectangle) -> Self {
        Self::with_options(bounds, RenderOptions::default())
    }

    pub fn with_options(bounds: Rectangle, options: RenderOptions) -> Self {
        Self {
            bounds,
            options,
            elements: Vec::new(),
            include_stack: Vec::new(),
            open_groups: HashSet::new(),
            defs: SvgDefs::new(),
        }
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// The next `object-N` id.
    pub fn next_object_id(&mut self) -> String {
        self.defs.next_object_id()
    }

    /// Rebase a file-space transform onto the canvas origin. Content drawn
    /// inside an included group stays in its own sprite space.
    fn adjust(&self, matrix: &Matrix) -> Matrix {
        if self.include_stack.is_empty() {
            let mut adjusted = *matrix;
            adjusted.translate_x -= self.bounds.x_min;
            adjusted.translate_y -= self.bounds.y_min;
            adjusted
        } else {
            *matrix
        }
    }

    /// Draw a shape placed by `transform` (which does not include the
    /// shape's own offset; that is composed here).
    pub fn draw_shape(&mut self, shape: &Shape, transform: &Matrix) -> Result<()> {
        let matrix = self.adjust(&transform.translate(shape.x_offset, shape.y_offset));
        let mut body = String::new();
        for path in &shape.paths {
            body.push_str(&self.path_markup(path));
        }
        self.elements.push(format!(
            r#"<g transform="{}">{}</g>"#,
            matrix.to_svg_transform(),
            body
        ));
        Ok(())
    }

    /// Draw an embedded raster image placed by `transform`.
    pub fn draw_image(&mut self, image: &EncodedImage, transform: &Matrix) {
        let matrix = self.adjust(transform);
        let digest = md5_hex(image.base64().as_bytes());
        let markup = self.defs.image_element(image, &digest);
        self.elements.push(format!(
            r#"<g transform="{}">{}</g>"#,
            matrix.to_svg_transform(),
            markup
        ));
    }

    /// Render reusable content into a defs group, deduplicated by `key`.
    ///
    /// The closure draws into the group; its elements land in the root
    /// `<defs>` as `<g id="object-N">` and the id is returned for
    /// [`SvgCanvas::use_ref`] sites.
    pub fn object_group<F>(&mut self, key: &str, draw: F) -> Result<String>
    where
        F: FnOnce(&mut SvgCanvas) -> Result<()>,
    {
        if let Some(id) = self.defs.group_id(key) {
            return Ok(id);
        }
        self.open_groups.insert(key.to_string());
        self.include_stack.push(std::mem::take(&mut self.elements));
        let result = draw(self);
        let body = std::mem::replace(
            &mut self.elements,
            self.include_stack.pop().expect("include stack underflow"),
        );
        self.open_groups.remove(key);
        result?;
        Ok(self.defs.insert_group(key, body.concat()))
    }

    /// Whether a group with this key is currently being drawn. Callers use
    /// this to cut self-referential content instead of recursing.
    pub fn group_in_progress(&self, key: &str) -> bool {
        self.open_groups.contains(key)
    }

    /// Reference a defs group with a placement transform.
    pub fn use_ref(&mut self, id: &str, transform: &Matrix) {
        let matrix = self.adjust(transform);
        self.elements.push(format!(
            r##"<use xlink:href="#{}" transform="{}"/>"##,
            id,
            matrix.to_svg_transform()
        ));
    }

    /// Serialize the document.
    pub fn render(&self) -> Result<String> {
        if !self.include_stack.is_empty() {
            return Err(Error::Unsupported(
                "render() called on a canvas with an open included group".to_string(),
            ));
        }
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}px" height="{}px">"#,
            twips_to_pixels(self.bounds.width()),
            twips_to_pixels(self.bounds.height())
        );
        svg.push_str(&self.defs.render());
        for element in &self.elements {
            svg.push_str(element);
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    fn path_markup(&mut self, path: &Path) -> String {
        let mut attrs = format!(r#"d="{}""#, path_data(path));

        if let Some(fill) = &path.style.fill {
            let (paint, opacity) = self.defs.paint(fill);
            write!(attrs, r#" fill="{}""#, paint).expect("write to String");
            if let Some(opacity) = opacity {
                write!(attrs, r#" fill-opacity="{}""#, opacity).expect("write to String");
            }
            attrs.push_str(r#" fill-rule="evenodd""#);
        } else {
            attrs.push_str(r#" fill="none""#);
        }

        if let Some(width) = path.style.line_width {
            if let Some(line_fill) = &path.style.line_fill {
                let (paint, opacity) = self.defs.paint(line_fill);
                write!(attrs, r#" stroke="{}""#, paint).expect("write to String");
                if let Some(opacity) = opacity {
                    write!(attrs, r#" stroke-opacity="{}""#, opacity).expect("write to String");
                }
            } else if let Some(color) = path.style.line_color {
                write!(attrs, r#" stroke="{}""#, color.to_hex()).expect("write to String");
                if let Some(opacity) = color.opacity() {
                    write!(attrs, r#" stroke-opacity="{}""#, opacity).expect("write to String");
                }
            }

            let mut stroke_width = twips_to_pixels(width);
            if !self.options.subpixel_stroke_width && stroke_width < 1.0 {
                stroke_width = 1.0;
                attrs.push_str(r#" vector-effect="non-scaling-stroke""#);
            }
            write!(attrs, r#" stroke-width="{}""#, stroke_width).expect("write to String");
            attrs.push_str(r#" stroke-linecap="round" stroke-linejoin="round""#);
        }

        format!("<path {}/>", attrs)
    }
}

/// The `d` attribute: move/line/quadratic commands in pixel coordinates,
/// with a fresh `M` wherever the pen jumps.
fn path_data(path: &Path) -> String {
    let mut d = String::new();
    let mut pen: Option<(i32, i32)> = None;
    for edge in path.drawn_edges() {
        let start = edge.start();
        if pen != Some(start) {
            write!(
                d,
                "M {} {} ",
                twips_to_pixels(start.0),
                twips_to_pixels(start.1)
            )
            .expect("write to String");
        }
        match edge {
            Edge::Straight { to, .. } => {
                write!(d, "L {} {} ", twips_to_pixels(to.0), twips_to_pixels(to.1))
                    .expect("write to String");
            },
            Edge::Curved { control, to, .. } => {
                write!(
                    d,
                    "Q {} {} {} {} ",
                    twips_to_pixels(control.0),
                    twips_to_pixels(control.1),
                    twips_to_pixels(to.0),
                    twips_to_pixels(to.1)
                )
                .expect("write to String");
            },
        }
        pen = Some(edge.end());
    }
    d.trim_end().to_string()
}
