//! Deterministic garment + print compositor.
//!
//! Reproduces the placement authored in the editor on the garment's
//! natural pixel grid:
//!
//! 1. Decode the garment (and the print, only when a mask is given)
//! 2. Lay out the canvas for the requested aspect ratio
//! 3. Optional luminosity tint of the garment
//! 4. Draw the garment centered on the canvas
//! 5. Draw the print inside the mask's rotated, sheared frame
//! 6. Encode the canvas as PNG
//!
//! The same inputs always produce the same bytes.

use serde::{Deserialize, Serialize};

use crate::aspect::{AspectRatio, ParseAspectRatioError};
use crate::blend::{BlendMode, UnknownBlendMode};
use crate::color::{ParseColorError, Rgb};
use crate::decode::{self, DecodeError};
use crate::geometry;
use crate::surface::{Affine, Clip, LocalRect, SkiaSurface, Surface};
use crate::types::{Dimensions, GeometryError, Mask, RgbaImage, Viewport};

/// Everything about a composite that is not an image or a mask.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompositeOptions {
    /// Canvas shape; `original` keeps the garment's natural size.
    pub aspect_ratio: AspectRatio,

    /// Recolor the garment towards this color, keeping its shading.
    pub color: Option<Rgb>,

    /// How the print is blended onto the garment.
    pub blend_mode: BlendMode,
}

impl CompositeOptions {
    /// Build options from the raw string tokens a host passes around.
    ///
    /// # Errors
    ///
    /// Returns the matching [`CompositeError`] variant for a malformed
    /// aspect token, color or blend-mode name.
    pub fn from_tokens(
        aspect_ratio: &str,
        color: Option<&str>,
        blend_mode: &str,
    ) -> Result<Self, CompositeError> {
        Ok(Self {
            aspect_ratio: aspect_ratio.parse()?,
            color: color.map(Rgb::from_hex).transpose()?,
            blend_mode: blend_mode.parse()?,
        })
    }
}

/// Why a composite could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum CompositeError {
    #[error("garment image could not be decoded")]
    GarmentDecode(#[source] DecodeError),

    #[error("print image could not be decoded")]
    PrintDecode(#[source] DecodeError),

    #[error(transparent)]
    InvalidAspectRatio(#[from] ParseAspectRatioError),

    #[error(transparent)]
    InvalidColor(#[from] ParseColorError),

    #[error(transparent)]
    UnknownBlendMode(#[from] UnknownBlendMode),

    #[error("garment size is unusable: {0}")]
    Geometry(#[from] GeometryError),

    #[error("cannot allocate a {width}x{height} drawing surface")]
    Canvas { width: u32, height: u32 },

    #[error("failed to encode PNG")]
    Encode(#[source] image::ImageError),
}

impl CompositeError {
    const fn canvas(size: Dimensions) -> Self {
        Self::Canvas {
            width: size.width,
            height: size.height,
        }
    }
}

/// Render a composite to PNG bytes.
///
/// `garment_size` is the natural size the mask was authored against; the
/// garment is drawn at that size. The print is only decoded when a mask
/// is present, so a missing mask never fails on a bad print.
///
/// # Errors
///
/// Returns [`CompositeError::GarmentDecode`] or
/// [`CompositeError::PrintDecode`] when the respective image is empty or
/// corrupt, [`CompositeError::Geometry`] when `garment_size` has no area,
/// and [`CompositeError::Encode`] if PNG encoding fails.
pub fn composite(
    garment: &[u8],
    print: Option<&[u8]>,
    mask: Option<&Mask>,
    garment_size: Dimensions,
    options: &CompositeOptions,
) -> Result<Vec<u8>, CompositeError> {
    let garment = decode::decode_rgba(garment).map_err(CompositeError::GarmentDecode)?;
    let print = match (print, mask) {
        (Some(bytes), Some(_)) => {
            Some(decode::decode_rgba(bytes).map_err(CompositeError::PrintDecode)?)
        }
        _ => None,
    };

    let canvas: SkiaSurface = compose(&garment, print.as_ref(), mask, garment_size, options)?;
    decode::encode_png(&canvas.to_rgba()).map_err(CompositeError::Encode)
}

/// [`composite`] with the options given as string tokens
/// (`"original"` / `"W:H"`, `"#rrggbb"`, blend-mode name).
///
/// # Errors
///
/// Token errors are reported before any image is decoded; otherwise as
/// [`composite`].
pub fn composite_with_tokens(
    garment: &[u8],
    print: Option<&[u8]>,
    mask: Option<&Mask>,
    garment_size: Dimensions,
    aspect_ratio: &str,
    color: Option<&str>,
    blend_mode: &str,
) -> Result<Vec<u8>, CompositeError> {
    let options = CompositeOptions::from_tokens(aspect_ratio, color, blend_mode)?;
    composite(garment, print, mask, garment_size, &options)
}

/// Render a composite onto a fresh surface of type `S`.
///
/// # Errors
///
/// Returns [`CompositeError::Geometry`] when `garment_size` has no area
/// and [`CompositeError::Canvas`] when a surface cannot be allocated.
pub fn compose<S: Surface>(
    garment: &RgbaImage,
    print: Option<&RgbaImage>,
    mask: Option<&Mask>,
    garment_size: Dimensions,
    options: &CompositeOptions,
) -> Result<S, CompositeError> {
    let viewport = Viewport::from(garment_size);
    if !viewport.has_area() {
        return Err(GeometryError::empty(viewport).into());
    }
    let layout = options.aspect_ratio.layout(garment_size);
    tracing::debug!(
        width = layout.canvas.width,
        height = layout.canvas.height,
        offset_x = layout.offset_x,
        offset_y = layout.offset_y,
        "composite canvas"
    );

    // 1. Garment at its authoring size.
    let mut layer = garment_layer::<S>(garment, garment_size)?;

    // 2. Luminosity tint.
    if let Some(color) = options.color {
        let mut tinted = S::new(garment_size).ok_or(CompositeError::canvas(garment_size))?;
        tinted.draw(&layer, Affine::IDENTITY, BlendMode::SourceOver, None);
        tinted.fill(color, BlendMode::SourceIn);
        tinted.draw(&layer, Affine::IDENTITY, BlendMode::Luminosity, None);
        layer = tinted;
    }

    // 3. Garment centered on the canvas.
    let mut canvas = S::new(layout.canvas).ok_or(CompositeError::canvas(layout.canvas))?;
    let offset_x = f64::from(layout.offset_x);
    let offset_y = f64::from(layout.offset_y);
    canvas.draw(
        &layer,
        Affine::translate(offset_x, offset_y),
        BlendMode::SourceOver,
        None,
    );

    // 4. Print inside the mask.
    let (Some(print), Some(mask)) = (print, mask) else {
        return Ok(canvas);
    };
    let print_dims = Dimensions {
        width: print.width(),
        height: print.height(),
    };
    let print_layer = S::from_rgba(print).ok_or(CompositeError::canvas(print_dims))?;
    let pixel = geometry::to_pixel(mask, viewport)?;

    let pw = f64::from(print_dims.width);
    let ph = f64::from(print_dims.height);
    let scale = (pixel.width / pw).min(pixel.height / ph);
    if !scale.is_finite() || scale <= 0.0 {
        tracing::debug!(scale, "print scale degenerate, skipping print");
        return Ok(canvas);
    }

    let center = pixel.center();
    let frame = Affine::translate(offset_x + center.x, offset_y + center.y)
        .then(Affine::rotate(pixel.rotation))
        .then(Affine::shear(
            pixel.skew_x.to_radians().tan(),
            pixel.skew_y.to_radians().tan(),
        ));
    let clip = Clip {
        rect: LocalRect {
            x: -pixel.width / 2.0,
            y: -pixel.height / 2.0,
            width: pixel.width,
            height: pixel.height,
        },
        transform: frame,
    };
    // Horizontally centered, top-aligned.
    let placement = frame
        .then(Affine::translate(-pw * scale / 2.0, -pixel.height / 2.0))
        .then(Affine::scale(scale, scale));
    canvas.draw(&print_layer, placement, options.blend_mode, Some(&clip));

    Ok(canvas)
}

/// Upload the garment and resample it to `size` if its pixels differ.
fn garment_layer<S: Surface>(garment: &RgbaImage, size: Dimensions) -> Result<S, CompositeError> {
    let natural = Dimensions {
        width: garment.width(),
        height: garment.height(),
    };
    let source = S::from_rgba(garment).ok_or(CompositeError::canvas(natural))?;
    if natural == size {
        return Ok(source);
    }
    tracing::debug!(
        decoded_width = natural.width,
        decoded_height = natural.height,
        width = size.width,
        height = size.height,
        "resampling garment to authoring size"
    );
    let mut layer = S::new(size).ok_or(CompositeError::canvas(size))?;
    layer.draw(
        &source,
        Affine::scale(
            f64::from(size.width) / f64::from(natural.width),
            f64::from(size.height) / f64::from(natural.height),
        ),
        BlendMode::SourceOver,
        None,
    );
    Ok(layer)
}
