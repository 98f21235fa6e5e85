//! Linear RGBA colors for vertex color attributes.

/// Red, green and blue channels without alpha.
pub type Rgb = [f32; 3];

/// A linear RGBA color with f32 channels.
///
/// The layout matches a `Float4` vertex attribute, so a `&[Color]` can be
/// uploaded directly with [`bytemuck::cast_slice`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// All channels zero. This is the value of a freshly allocated color attribute.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Create a color from its four channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// The RGB channels of this color.
    pub fn rgb(&self) -> Rgb {
        [self.r, self.g, self.b]
    }

    /// Replace the RGB channels, keeping alpha.
    pub fn with_rgb(self, rgb: Rgb) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: self.a,
        }
    }

    /// Linearly interpolate the RGB channels of `a` and `b`.
    ///
    /// `t` is not clamped: values outside `[0, 1]` extrapolate past the
    /// endpoints.
    pub fn lerp_rgb_unclamped(a: &Self, b: &Self, t: f32) -> Rgb {
        [
            a.r + (b.r - a.r) * t,
            a.g + (b.g - a.g) * t,
            a.b + (b.b - a.b) * t,
        ]
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}
