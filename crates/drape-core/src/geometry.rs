//! Conversion between normalized masks and pixel masks.
//!
//! A persisted [`Mask`] stores position and size as fractions of the
//! reference image. Every consumer that draws or edits it first resolves
//! it against the viewport it is working in, and every producer converts
//! back before storing. Rotation passes through untouched; skew passes
//! through clamped to `±MAX_SKEW_DEG`.

use crate::types::{GeometryError, Mask, PixelMask, Viewport, clamp_skew};

/// Denormalize `mask` against `viewport`.
///
/// # Errors
///
/// Returns [`GeometryError::EmptyViewport`] if either viewport dimension
/// is zero, negative or not finite.
pub fn to_pixel(mask: &Mask, viewport: Viewport) -> Result<PixelMask, GeometryError> {
    if !viewport.has_area() {
        return Err(GeometryError::empty(viewport));
    }
    Ok(PixelMask {
        x: mask.x * viewport.width,
        y: mask.y * viewport.height,
        width: mask.width * viewport.width,
        height: mask.height * viewport.height,
        rotation: mask.rotation,
        skew_x: clamp_skew(mask.skew_x),
        skew_y: clamp_skew(mask.skew_y),
    })
}

/// Normalize a pixel mask authored against `viewport`.
///
/// # Errors
///
/// Returns [`GeometryError::EmptyViewport`] if either viewport dimension
/// is zero, negative or not finite. A mask derived from such a viewport
/// must never be persisted.
pub fn to_normalized(pixel: &PixelMask, viewport: Viewport) -> Result<Mask, GeometryError> {
    if !viewport.has_area() {
        return Err(GeometryError::empty(viewport));
    }
    Ok(Mask {
        x: pixel.x / viewport.width,
        y: pixel.y / viewport.height,
        width: pixel.width / viewport.width,
        height: pixel.height / viewport.height,
        rotation: pixel.rotation,
        skew_x: clamp_skew(pixel.skew_x),
        skew_y: clamp_skew(pixel.skew_y),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_mask_close(a: &Mask, b: &Mask, tol: f64) {
        let pairs = [
            (a.x, b.x),
            (a.y, b.y),
            (a.width, b.width),
            (a.height, b.height),
            (a.rotation, b.rotation),
            (a.skew_x, b.skew_x),
            (a.skew_y, b.skew_y),
        ];
        for (l, r) in pairs {
            assert!((l - r).abs() <= tol, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn quarter_mask_on_square_viewport() {
        let mask = Mask {
            x: 0.25,
            y: 0.25,
            width: 0.5,
            height: 0.5,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
        };
        let px = to_pixel(&mask, Viewport::new(400.0, 400.0)).unwrap();
        assert!((px.x - 100.0).abs() < 1e-9);
        assert!((px.y - 100.0).abs() < 1e-9);
        assert!((px.width - 200.0).abs() < 1e-9);
        assert!((px.height - 200.0).abs() < 1e-9);
        assert!(px.rotation.abs() < f64::EPSILON);
    }

    #[test]
    fn angles_pass_through() {
        let mask = Mask {
            x: 0.1,
            y: 0.2,
            width: 0.3,
            height: 0.4,
            rotation: 400.0,
            skew_x: -12.5,
            skew_y: 30.0,
        };
        let px = to_pixel(&mask, Viewport::new(640.0, 480.0)).unwrap();
        assert!((px.rotation - 400.0).abs() < f64::EPSILON);
        assert!((px.skew_x + 12.5).abs() < f64::EPSILON);
        assert!((px.skew_y - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_skew_is_clamped_both_ways() {
        let mask = Mask {
            skew_x: 89.0,
            skew_y: -120.0,
            ..Mask::centered_square(0.5, 1.0)
        };
        let vp = Viewport::new(200.0, 100.0);
        let px = to_pixel(&mask, vp).unwrap();
        assert!((px.skew_x - 75.0).abs() < f64::EPSILON);
        assert!((px.skew_y + 75.0).abs() < f64::EPSILON);

        let wild = PixelMask {
            skew_x: -80.0,
            skew_y: 76.0,
            ..px
        };
        let back = to_normalized(&wild, vp).unwrap();
        assert!((back.skew_x + 75.0).abs() < f64::EPSILON);
        assert!((back.skew_y - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn round_trip_across_viewports() {
        let masks = [
            Mask::centered_square(0.5, 1.0),
            Mask {
                x: 0.013,
                y: 0.97,
                width: 0.333_333,
                height: 1.7,
                rotation: -725.0,
                skew_x: 74.9,
                skew_y: -3.0,
            },
            Mask {
                x: -0.2,
                y: 0.0,
                width: 0.0,
                height: 0.05,
                rotation: 45.0,
                skew_x: 0.0,
                skew_y: 0.0,
            },
        ];
        let viewports = [
            Viewport::new(1.0, 1.0),
            Viewport::new(37.5, 913.25),
            Viewport::new(4096.0, 3.0),
            Viewport::new(0.001, 0.002),
        ];
        for mask in &masks {
            for &vp in &viewports {
                let back = to_normalized(&to_pixel(mask, vp).unwrap(), vp).unwrap();
                assert_mask_close(mask, &back, 1e-6);
            }
        }
    }

    #[test]
    fn zero_viewport_fails_both_ways() {
        let mask = Mask::centered_square(0.5, 1.0);
        let zero_w = Viewport::new(0.0, 300.0);
        let zero_h = Viewport::new(300.0, 0.0);
        assert!(matches!(
            to_pixel(&mask, zero_w),
            Err(GeometryError::EmptyViewport { .. })
        ));
        let px = to_pixel(&mask, Viewport::new(300.0, 300.0)).unwrap();
        assert!(matches!(
            to_normalized(&px, zero_h),
            Err(GeometryError::EmptyViewport { .. })
        ));
    }
}
