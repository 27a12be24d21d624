//! RGBA colors and clamping color transforms.

/// An RGB color with an optional alpha channel.
///
/// `alpha == None` denotes a fully opaque color whose SVG output omits the
/// opacity attribute entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: Option<u8>,
}

impl Color {
    /// Fully transparent black, used as the sentinel for unresolvable fills.
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: None,
        }
    }

    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: Some(alpha),
        }
    }

    /// Lowercase `#rrggbb` hex string for SVG attributes.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// The alpha channel, treating `None` as opaque.
    #[inline]
    pub fn alpha_or_opaque(&self) -> u8 {
        self.alpha.unwrap_or(255)
    }

    /// The SVG opacity value, or `None` when no opacity attribute should be
    /// emitted (opaque or absent alpha).
    pub fn opacity(&self) -> Option<f64> {
        match self.alpha {
            Some(a) if a < 255 => Some(a as f64 / 255.0),
            _ => None,
        }
    }
}

/// A per-channel `value * mult + add` transform, clamped to [0, 255].
///
/// Because of the clamping, composing two transforms is not equivalent to
/// applying them in sequence, so callers keep ordered lists of transforms
/// and fold them left to right with [`ColorTransform::apply_all`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTransform {
    pub red_mult: f32,
    pub green_mult: f32,
    pub blue_mult: f32,
    pub alpha_mult: f32,
    pub red_add: i16,
    pub green_add: i16,
    pub blue_add: i16,
    pub alpha_add: i16,
}

impl Default for ColorTransform {
    fn default() -> Self {
        ColorTransform::IDENTITY
    }
}

impl ColorTransform {
    pub const IDENTITY: ColorTransform = ColorTransform {
        red_mult: 1.0,
        green_mult: 1.0,
        blue_mult: 1.0,
        alpha_mult: 1.0,
        red_add: 0,
        green_add: 0,
        blue_add: 0,
        alpha_add: 0,
    };

    /// A transform that only multiplies channels.
    pub const fn multiply(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        ColorTransform {
            red_mult: red,
            green_mult: green,
            blue_mult: blue,
            alpha_mult: alpha,
            red_add: 0,
            green_add: 0,
            blue_add: 0,
            alpha_add: 0,
        }
    }

    /// A transform that only offsets channels.
    pub const fn add(red: i16, green: i16, blue: i16, alpha: i16) -> Self {
        ColorTransform {
            red_mult: 1.0,
            green_mult: 1.0,
            blue_mult: 1.0,
            alpha_mult: 1.0,
            red_add: red,
            green_add: green,
            blue_add: blue,
            alpha_add: alpha,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == ColorTransform::IDENTITY
    }

    #[inline]
    fn channel(value: u8, mult: f32, add: i16) -> u8 {
        (value as f32 * mult + add as f32).round().clamp(0.0, 255.0) as u8
    }

    /// Apply the transform to a color, clamping each channel.
    ///
    /// An absent alpha is treated as 255; it stays absent when the transform
    /// leaves it at 255.
    pub fn apply(&self, color: Color) -> Color {
        let alpha = Self::channel(color.alpha_or_opaque(), self.alpha_mult, self.alpha_add);
        Color {
            red: Self::channel(color.red, self.red_mult, self.red_add),
            green: Self::channel(color.green, self.green_mult, self.green_add),
            blue: Self::channel(color.blue, self.blue_mult, self.blue_add),
            alpha: match color.alpha {
                None if alpha == 255 => None,
                _ => Some(alpha),
            },
        }
    }

    /// Fold an ordered list of transforms over a color, re-clamping after
    /// each stage.
    pub fn apply_all(transforms: &[ColorTransform], color: Color) -> Color {
        transforms.iter().fold(color, |c, t| t.apply(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_is_lowercase() {
        assert_eq!(Color::rgb(255, 0, 0).to_hex(), "#ff0000");
        assert_eq!(Color::rgba(0xab, 0xcd, 0xef, 12).to_hex(), "#abcdef");
    }

    #[test]
    fn test_opacity_rules() {
        assert_eq!(Color::rgb(1, 2, 3).opacity(), None);
        assert_eq!(Color::rgba(1, 2, 3, 255).opacity(), None);
        assert_eq!(Color::rgba(1, 2, 3, 0).opacity(), Some(0.0));
        assert_eq!(Color::rgba(1, 2, 3, 51).opacity(), Some(0.2));
    }

    #[test]
    fn test_transform_clamps() {
        let darken = ColorTransform::multiply(0.5, 0.5, 0.5, 1.0);
        assert_eq!(darken.apply(Color::rgb(200, 100, 0)), Color::rgb(100, 50, 0));

        let blow_out = ColorTransform::add(300, -300, 0, 0);
        assert_eq!(
            blow_out.apply(Color::rgb(10, 200, 77)),
            Color::rgb(255, 0, 77)
        );
    }

    #[test]
    fn test_opaque_alpha_stays_absent() {
        let darken = ColorTransform::multiply(0.5, 0.5, 0.5, 1.0);
        assert_eq!(darken.apply(Color::rgb(10, 10, 10)).alpha, None);

        let fade = ColorTransform::multiply(1.0, 1.0, 1.0, 0.5);
        assert_eq!(fade.apply(Color::rgb(10, 10, 10)).alpha, Some(128));
    }

    #[test]
    fn test_clamping_is_order_dependent() {
        // Saturating first then halving differs from composing the scalars,
        // which is why transforms are kept as lists.
        let saturate = ColorTransform::add(255, 0, 0, 0);
        let halve = ColorTransform::multiply(0.5, 1.0, 1.0, 1.0);

        let sequential =
            ColorTransform::apply_all(&[saturate, halve], Color::rgb(200, 0, 0));
        assert_eq!(sequential.red, 128);

        let reversed = ColorTransform::apply_all(&[halve, saturate], Color::rgb(200, 0, 0));
        assert_eq!(reversed.red, 255);
    }

    #[test]
    fn test_uniform_scale_never_brightens() {
        let scale = ColorTransform::multiply(0.7, 0.7, 0.7, 1.0);
        for value in [0u8, 1, 77, 128, 254, 255] {
            let out = scale.apply(Color::rgb(value, value, value));
            assert!(out.red <= value);
            assert!(out.green <= value);
            assert!(out.blue <= value);
        }
    }
}
