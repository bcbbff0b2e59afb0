//! Drawing backend for the compositor.
//!
//! The compositor only needs a handful of canvas operations: allocate a
//! transparent surface, draw another surface through an affine transform
//! with a blend mode and optional clip, and flood-fill with a color. The
//! [`Surface`] trait captures exactly that so the placement math can be
//! exercised against any rasterizer. [`SkiaSurface`] is the software
//! implementation backed by `tiny-skia`.

use image::{Rgba, RgbaImage};
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Transform,
};

use crate::blend::BlendMode;
use crate::color::Rgb;
use crate::types::{Dimensions, Point};

/// A 2D affine transform.
///
/// Maps `(x, y)` to `(sx*x + kx*y + tx, ky*x + sy*y + ty)`, the same
/// row layout as a canvas `transform(a, b, c, d, e, f)` call with
/// `a=sx, b=ky, c=kx, d=sy, e=tx, f=ty`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub sx: f64,
    pub ky: f64,
    pub kx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        sx: 1.0,
        ky: 0.0,
        kx: 0.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[must_use]
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self {
            sx,
            sy,
            ..Self::IDENTITY
        }
    }

    /// Clockwise rotation on screen by `degrees`.
    #[must_use]
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            sx: cos,
            ky: sin,
            kx: -sin,
            sy: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Shear with `kx` feeding y into x and `ky` feeding x into y.
    #[must_use]
    pub const fn shear(kx: f64, ky: f64) -> Self {
        Self {
            kx,
            ky,
            ..Self::IDENTITY
        }
    }

    /// `self * inner`: the result applies `inner` first, then `self`.
    #[must_use]
    pub fn then(self, inner: Self) -> Self {
        Self {
            sx: self.sx.mul_add(inner.sx, self.kx * inner.ky),
            ky: self.ky.mul_add(inner.sx, self.sy * inner.ky),
            kx: self.sx.mul_add(inner.kx, self.kx * inner.sy),
            sy: self.ky.mul_add(inner.kx, self.sy * inner.sy),
            tx: self.sx.mul_add(inner.tx, self.kx.mul_add(inner.ty, self.tx)),
            ty: self.ky.mul_add(inner.tx, self.sy.mul_add(inner.ty, self.ty)),
        }
    }

    #[must_use]
    pub fn map(self, p: Point) -> Point {
        Point::new(
            self.sx.mul_add(p.x, self.kx.mul_add(p.y, self.tx)),
            self.ky.mul_add(p.x, self.sy.mul_add(p.y, self.ty)),
        )
    }

    /// Inverse transform, `None` when singular.
    #[must_use]
    pub fn invert(self) -> Option<Self> {
        let det = self.sx.mul_add(self.sy, -(self.kx * self.ky));
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return None;
        }
        let sx = self.sy / det;
        let ky = -self.ky / det;
        let kx = -self.kx / det;
        let sy = self.sx / det;
        Some(Self {
            sx,
            ky,
            kx,
            sy,
            tx: -sx.mul_add(self.tx, kx * self.ty),
            ty: -ky.mul_add(self.tx, sy * self.ty),
        })
    }

    /// Whether the transform only translates by whole pixels.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_pixel_aligned(self) -> bool {
        self.sx == 1.0
            && self.sy == 1.0
            && self.kx == 0.0
            && self.ky == 0.0
            && self.tx.fract() == 0.0
            && self.ty.fract() == 0.0
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_skia(self) -> Transform {
        Transform::from_row(
            self.sx as f32,
            self.ky as f32,
            self.kx as f32,
            self.sy as f32,
            self.tx as f32,
            self.ty as f32,
        )
    }
}

/// An axis-aligned rectangle in some local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A clip region: `rect` in a local frame, placed by `transform`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clip {
    pub rect: LocalRect,
    pub transform: Affine,
}

/// Minimal canvas interface the compositor draws through.
pub trait Surface: Sized {
    /// Allocate a fully transparent surface. `None` for zero or
    /// unrepresentable sizes.
    fn new(size: Dimensions) -> Option<Self>;

    /// Wrap a decoded straight-alpha image.
    fn from_rgba(image: &RgbaImage) -> Option<Self>;

    fn size(&self) -> Dimensions;

    /// Draw `layer` (its own pixel grid at the origin) through `transform`.
    ///
    /// Operators for which [`BlendMode::is_unbounded`] holds also act on
    /// the part of `clip` (or of the surface, without a clip) that the
    /// layer does not cover, as if a transparent source were drawn there.
    fn draw(&mut self, layer: &Self, transform: Affine, blend: BlendMode, clip: Option<&Clip>);

    /// Cover the whole surface with an opaque color.
    fn fill(&mut self, color: Rgb, blend: BlendMode);

    /// Straight-alpha pixels.
    fn to_rgba(&self) -> RgbaImage;
}

/// Software surface backed by a `tiny-skia` pixmap (premultiplied RGBA).
#[derive(Debug, Clone, PartialEq)]
pub struct SkiaSurface {
    pixmap: Pixmap,
}

impl SkiaSurface {
    fn clip_mask(&self, clip: &Clip) -> Option<tiny_skia::Mask> {
        #[allow(clippy::cast_possible_truncation)]
        let rect = Rect::from_xywh(
            clip.rect.x as f32,
            clip.rect.y as f32,
            clip.rect.width as f32,
            clip.rect.height as f32,
        )?;
        let path = PathBuilder::from_rect(rect);
        let mut mask = tiny_skia::Mask::new(self.pixmap.width(), self.pixmap.height())?;
        mask.fill_path(&path, FillRule::Winding, true, clip.transform.to_skia());
        Some(mask)
    }
}

impl Surface for SkiaSurface {
    fn new(size: Dimensions) -> Option<Self> {
        Pixmap::new(size.width, size.height).map(|pixmap| Self { pixmap })
    }

    fn from_rgba(image: &RgbaImage) -> Option<Self> {
        let mut pixmap = Pixmap::new(image.width(), image.height())?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Some(Self { pixmap })
    }

    fn size(&self) -> Dimensions {
        Dimensions {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
        }
    }

    fn draw(&mut self, layer: &Self, transform: Affine, blend: BlendMode, clip: Option<&Clip>) {
        let mask = match clip {
            Some(clip) => match self.clip_mask(clip) {
                Some(mask) => Some(mask),
                // Degenerate clip: nothing is visible through it.
                None => return,
            },
            None => None,
        };
        let quality = if transform.is_pixel_aligned() {
            FilterQuality::Nearest
        } else {
            FilterQuality::Bilinear
        };

        if blend.is_unbounded() {
            // Place the layer on a transparent surface-sized pixmap so the
            // operator also runs over the uncovered part of the clip.
            let Some(mut placed) = Pixmap::new(self.pixmap.width(), self.pixmap.height()) else {
                return;
            };
            let place = PixmapPaint {
                opacity: 1.0,
                blend_mode: tiny_skia::BlendMode::Source,
                quality,
            };
            placed.draw_pixmap(0, 0, layer.pixmap.as_ref(), &place, transform.to_skia(), None);
            let paint = PixmapPaint {
                opacity: 1.0,
                blend_mode: blend.to_skia(),
                quality: FilterQuality::Nearest,
            };
            self.pixmap.draw_pixmap(
                0,
                0,
                placed.as_ref(),
                &paint,
                Transform::identity(),
                mask.as_ref(),
            );
            return;
        }

        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: blend.to_skia(),
            quality,
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            layer.pixmap.as_ref(),
            &paint,
            transform.to_skia(),
            mask.as_ref(),
        );
    }

    fn fill(&mut self, color: Rgb, blend: BlendMode) {
        #[allow(clippy::cast_precision_loss)]
        let Some(rect) = Rect::from_xywh(
            0.0,
            0.0,
            self.pixmap.width() as f32,
            self.pixmap.height() as f32,
        ) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, 255);
        paint.blend_mode = blend.to_skia();
        paint.anti_alias = false;
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    fn to_rgba(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.pixmap.width(), self.pixmap.height());
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image
    }
}
