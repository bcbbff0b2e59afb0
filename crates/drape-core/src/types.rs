//! Shared types for the drape geometry and compositing engine.

use serde::{Deserialize, Deserializer, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference decoded
/// rasters without depending on `image` directly.
pub use image::RgbaImage;

/// Largest skew angle (degrees, either sign) a mask may carry.
pub const MAX_SKEW_DEG: f64 = 75.0;

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Rotate this vector about the origin by `degrees`.
    ///
    /// Positive angles turn clockwise on screen (y grows downward),
    /// matching the rotation convention of the mask.
    #[must_use]
    pub fn rotated(self, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(
            self.x.mul_add(cos, -(self.y * sin)),
            self.x.mul_add(sin, self.y * cos),
        )
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Rendered size of the reference image inside its container.
///
/// Produced by the host's layout observer. It is never mutated by the
/// geometry code; a resize yields a fresh value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Create a new viewport.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns `true` when both dimensions are positive and finite.
    #[must_use]
    pub fn has_area(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Width divided by height, or `None` for a zero-area viewport.
    #[must_use]
    pub fn aspect(self) -> Option<f64> {
        self.has_area().then(|| self.width / self.height)
    }
}

impl From<Dimensions> for Viewport {
    fn from(d: Dimensions) -> Self {
        Self::new(f64::from(d.width), f64::from(d.height))
    }
}

/// Normalized print placement on one garment side.
///
/// `x`, `y`, `width` and `height` are fractions of the reference image's
/// natural width/height. `rotation` and both skews are degrees. Skews are
/// clamped to `[-MAX_SKEW_DEG, MAX_SKEW_DEG]` on deserialization and
/// default to zero when absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mask {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    #[serde(default, deserialize_with = "deserialize_skew")]
    pub skew_x: f64,
    #[serde(default, deserialize_with = "deserialize_skew")]
    pub skew_y: f64,
}

impl Mask {
    /// Centered square whose side is `fraction` of the image width.
    ///
    /// `aspect` is the reference image's width / height; the normalized
    /// height is scaled by it so the mask is square in pixels.
    #[must_use]
    pub fn centered_square(fraction: f64, aspect: f64) -> Self {
        let width = fraction;
        let height = fraction * aspect;
        Self {
            x: (1.0 - width) / 2.0,
            y: (1.0 - height) / 2.0,
            width,
            height,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }

    /// This mask with both skews clamped to `±MAX_SKEW_DEG`.
    #[must_use]
    pub fn with_clamped_skew(self) -> Self {
        Self {
            skew_x: clamp_skew(self.skew_x),
            skew_y: clamp_skew(self.skew_y),
            ..self
        }
    }
}

/// A [`Mask`] denormalized against one viewport.
///
/// Only lives inside the editor or the compositor for a single viewport;
/// convert back with [`crate::geometry::to_normalized`] before storing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelMask {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub skew_x: f64,
    pub skew_y: f64,
}

impl PixelMask {
    /// Center of the mask rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Map a screen point into the mask's rotated frame, relative to the
    /// center. Skew is not undone.
    #[must_use]
    pub fn to_local(&self, point: Point) -> Point {
        let c = self.center();
        Point::new(point.x - c.x, point.y - c.y).rotated(-self.rotation)
    }

    /// Map a point in the rotated frame (relative to the center) back to
    /// screen space.
    #[must_use]
    pub fn to_screen(&self, local: Point) -> Point {
        let c = self.center();
        let v = local.rotated(self.rotation);
        Point::new(c.x + v.x, c.y + v.y)
    }

    /// Whether `point` lies inside the rotated rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let local = self.to_local(point);
        local.x.abs() <= self.width / 2.0 && local.y.abs() <= self.height / 2.0
    }
}

/// Which side of a garment a mask belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentSide {
    Front,
    Back,
}

impl GarmentSide {
    /// Lowercase name, used in file names and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

impl std::fmt::Display for GarmentSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry cannot be resolved against the current viewport.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// One of the viewport dimensions is zero, negative or not finite.
    #[error("viewport has no area ({width}x{height})")]
    EmptyViewport { width: f64, height: f64 },
}

impl GeometryError {
    pub(crate) const fn empty(viewport: Viewport) -> Self {
        Self::EmptyViewport {
            width: viewport.width,
            height: viewport.height,
        }
    }
}

/// Clamp a skew angle into `[-MAX_SKEW_DEG, MAX_SKEW_DEG]`.
#[must_use]
pub fn clamp_skew(degrees: f64) -> f64 {
    let clamped = degrees.clamp(-MAX_SKEW_DEG, MAX_SKEW_DEG);
    if (clamped - degrees).abs() > f64::EPSILON {
        tracing::debug!(requested = degrees, clamped, "skew angle clamped");
    }
    clamped
}

fn deserialize_skew<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map_or(0.0, clamp_skew))
}
