//! Brush configuration and the immutable per-job brush snapshot.

use vcpaint_core::color::Color;
use vcpaint_core::math::Vec3;

use crate::error::PaintError;

/// How the kernel treats blend weights outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightMode {
    /// Use the raw weight. Vertices inside the inner radius get a negative
    /// weight and vertices past the outer radius a weight above one, so the
    /// blend extrapolates beyond both colors.
    #[default]
    Extrapolate,
    /// Clamp the weight to `[0, 1]`.
    Clamp,
}

impl WeightMode {
    /// Apply this mode to a raw weight.
    pub fn apply(self, weight: f32) -> f32 {
        match self {
            Self::Extrapolate => weight,
            Self::Clamp => weight.clamp(0.0, 1.0),
        }
    }
}

/// User-facing brush parameters.
///
/// This is the mutable configuration a host edits between paint operations.
/// Jobs never read it directly; they take a [`BrushState`] snapshot through
/// [`snapshot`](Self::snapshot).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    /// Brush center in world space.
    pub position: Vec3,
    /// Color at and inside the inner radius.
    pub inner_color: Color,
    /// Color at and beyond the outer radius.
    pub outer_color: Color,
    /// Distance at which blending starts.
    pub inner_radius: f32,
    /// Distance at which blending ends.
    pub outer_radius: f32,
    /// Treatment of weights outside `[0, 1]`.
    pub weight_mode: WeightMode,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            inner_color: Color::RED,
            outer_color: Color::BLUE,
            inner_radius: 0.9,
            outer_radius: 1.0,
            weight_mode: WeightMode::Extrapolate,
        }
    }
}

impl BrushSettings {
    /// Set the brush position.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the inner and outer colors.
    pub fn with_colors(mut self, inner: Color, outer: Color) -> Self {
        self.inner_color = inner;
        self.outer_color = outer;
        self
    }

    /// Set the inner and outer radii.
    pub fn with_radii(mut self, inner: f32, outer: f32) -> Self {
        self.inner_radius = inner;
        self.outer_radius = outer;
        self
    }

    /// Set the weight mode.
    pub fn with_weight_mode(mut self, weight_mode: WeightMode) -> Self {
        self.weight_mode = weight_mode;
        self
    }

    /// Check the radii precondition required before scheduling:
    /// both finite and `0 <= inner < outer`.
    pub fn validate(&self) -> Result<(), PaintError> {
        let (inner, outer) = (self.inner_radius, self.outer_radius);
        if inner.is_finite() && outer.is_finite() && inner >= 0.0 && outer > inner {
            Ok(())
        } else {
            Err(PaintError::InvalidRadii { inner, outer })
        }
    }

    /// Return a copy with radii forced into range, the way an editor
    /// inspector would: `outer = max(outer, 0)`, `inner = clamp(inner, 0, outer)`.
    ///
    /// The result may still have `inner == outer`, which [`validate`](Self::validate)
    /// rejects.
    pub fn sanitized(&self) -> Self {
        let outer_radius = self.outer_radius.max(0.0);
        let inner_radius = self.inner_radius.clamp(0.0, outer_radius);
        Self {
            inner_radius,
            outer_radius,
            ..*self
        }
    }

    /// Take a validated snapshot for one paint job.
    pub fn snapshot(&self) -> Result<BrushState, PaintError> {
        self.validate()?;
        Ok(self.snapshot_unchecked())
    }

    /// Take a snapshot without validating the radii.
    ///
    /// With `inner_radius == outer_radius` the kernel divides by zero and
    /// produces NaN or infinite colors.
    pub fn snapshot_unchecked(&self) -> BrushState {
        BrushState {
            position: self.position,
            inner_color: self.inner_color,
            outer_color: self.outer_color,
            inner_radius: self.inner_radius,
            outer_radius: self.outer_radius,
            inner_radius_sq: self.inner_radius * self.inner_radius,
            outer_radius_sq: self.outer_radius * self.outer_radius,
            weight_mode: self.weight_mode,
        }
    }
}

/// Immutable brush snapshot shared by every batch of one job.
///
/// Squared radii are computed once here rather than per vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushState {
    position: Vec3,
    inner_color: Color,
    outer_color: Color,
    inner_radius: f32,
    outer_radius: f32,
    inner_radius_sq: f32,
    outer_radius_sq: f32,
    weight_mode: WeightMode,
}

impl BrushState {
    pub fn position(&self) -> &Vec3 {
        &self.position
    }

    pub fn inner_color(&self) -> &Color {
        &self.inner_color
    }

    pub fn outer_color(&self) -> &Color {
        &self.outer_color
    }

    pub fn inner_radius(&self) -> f32 {
        self.inner_radius
    }

    pub fn outer_radius(&self) -> f32 {
        self.outer_radius
    }

    pub fn inner_radius_sq(&self) -> f32 {
        self.inner_radius_sq
    }

    pub fn outer_radius_sq(&self) -> f32 {
        self.outer_radius_sq
    }

    pub fn weight_mode(&self) -> WeightMode {
        self.weight_mode
    }
}
