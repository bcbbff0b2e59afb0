//! Interactive mask editor: move, resize, rotate and skew from pointer
//! events.
//!
//! The editor owns one live [`PixelMask`] for the current [`Viewport`]
//! and the last normalized form it was derived from. Exactly one
//! transform can be active at a time; [`EditorState`] carries the data
//! that transform needs and nothing else.
//!
//! The host is expected to route pointer-move and pointer-up events to
//! the editor from a global scope while [`MaskEditor::is_active`] is
//! true, so a drag that leaves the editable element still completes.
//!
//! ```rust
//! # use drape_core::editor::{EditorConfig, Handle, MaskEditor};
//! # use drape_core::{Point, Viewport};
//! let mut editor = MaskEditor::new(EditorConfig::default());
//! editor.set_viewport(Viewport::new(400.0, 400.0));
//! editor.load(None);
//!
//! editor.pointer_down(Handle::Body, Point::new(200.0, 200.0));
//! editor.pointer_move(Point::new(210.0, 190.0));
//! let saved = editor.pointer_up();
//! assert!(saved.is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{GeometryError, Mask, PixelMask, Point, Viewport, clamp_skew};

/// Tunable parameters for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Smallest width or height, in pixels, a resize may produce.
    pub min_size_px: f64,

    /// Side of the default square mask as a fraction of image width.
    pub default_size_fraction: f64,

    /// Pointer distance, in pixels, within which a handle is grabbed.
    pub handle_radius_px: f64,

    /// Distance of the rotate knob above the top edge, in pixels.
    pub rotate_handle_offset_px: f64,
}

impl EditorConfig {
    pub const DEFAULT_MIN_SIZE_PX: f64 = 20.0;
    pub const DEFAULT_SIZE_FRACTION: f64 = 0.5;
    pub const DEFAULT_HANDLE_RADIUS_PX: f64 = 12.0;
    pub const DEFAULT_ROTATE_HANDLE_OFFSET_PX: f64 = 30.0;
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_size_px: Self::DEFAULT_MIN_SIZE_PX,
            default_size_fraction: Self::DEFAULT_SIZE_FRACTION,
            handle_radius_px: Self::DEFAULT_HANDLE_RADIUS_PX,
            rotate_handle_offset_px: Self::DEFAULT_ROTATE_HANDLE_OFFSET_PX,
        }
    }
}

/// A grabbable part of the mask overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    /// Inside the rectangle: moves the mask.
    Body,
    /// Bottom-right corner: resizes.
    Resize,
    /// Knob above the top edge: rotates about the center.
    Rotate,
    /// Bottom edge center: horizontal skew.
    SkewX,
    /// Right edge center: vertical skew.
    SkewY,
}

/// The transform currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    /// Grab point in the mask's unrotated frame, measured from its
    /// top-left corner.
    Dragging { grab_offset: Point },
    Resizing { anchor: PixelMask, start: Point },
    /// Angles in degrees.
    Rotating {
        start_pointer_angle: f64,
        start_rotation: f64,
    },
    SkewingX { anchor: PixelMask, start: Point },
    SkewingY { anchor: PixelMask, start: Point },
}

impl EditorState {
    /// The handle that started this transform, `None` when idle.
    #[must_use]
    pub const fn handle(&self) -> Option<Handle> {
        match self {
            Self::Idle => None,
            Self::Dragging { .. } => Some(Handle::Body),
            Self::Resizing { .. } => Some(Handle::Resize),
            Self::Rotating { .. } => Some(Handle::Rotate),
            Self::SkewingX { .. } => Some(Handle::SkewX),
            Self::SkewingY { .. } => Some(Handle::SkewY),
        }
    }
}

/// Editor for the active mask of one garment side.
#[derive(Debug, Clone)]
pub struct MaskEditor {
    config: EditorConfig,
    viewport: Viewport,
    /// Last normalized form; the source for every re-denormalization.
    committed: Option<Mask>,
    /// Live geometry for `viewport`. `None` while the viewport has no area.
    mask: Option<PixelMask>,
    state: EditorState,
}

impl MaskEditor {
    /// Create an editor with no viewport and no mask.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            viewport: Viewport::new(0.0, 0.0),
            committed: None,
            mask: None,
            state: EditorState::Idle,
        }
    }

    /// Start editing `mask`, or a centered default square when `None`.
    ///
    /// Any transform in progress is dropped.
    pub fn load(&mut self, mask: Option<Mask>) {
        self.state = EditorState::Idle;
        self.committed = mask;
        self.refresh();
    }

    /// Feed a new viewport size from the host's layout observer.
    ///
    /// When the size actually changes, the live mask is rebuilt from the
    /// last normalized form instead of rescaling the stale pixel values,
    /// and any transform in progress is dropped.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        if self.is_active() {
            tracing::debug!(?viewport, "viewport changed mid-transform, dropping it");
        }
        self.viewport = viewport;
        self.state = EditorState::Idle;
        self.refresh();
    }

    #[must_use]
    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub const fn state(&self) -> &EditorState {
        &self.state
    }

    /// Live pixel geometry, `None` while the viewport has no area.
    #[must_use]
    pub const fn pixel_mask(&self) -> Option<&PixelMask> {
        self.mask.as_ref()
    }

    /// Last normalized form (updated on pointer-up and [`finalize`](Self::finalize)).
    #[must_use]
    pub const fn normalized(&self) -> Option<&Mask> {
        self.committed.as_ref()
    }

    /// Whether a transform is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.state, EditorState::Idle)
    }

    /// Find the handle under `point`, if any.
    ///
    /// Handles take priority over the body so a corner grab near the edge
    /// resizes instead of moving.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<Handle> {
        let mask = self.mask.as_ref()?;
        let radius_sq = self.config.handle_radius_px * self.config.handle_radius_px;
        let half_w = mask.width / 2.0;
        let half_h = mask.height / 2.0;

        let handles = [
            (
                Handle::Rotate,
                Point::new(0.0, -half_h - self.config.rotate_handle_offset_px),
            ),
            (Handle::Resize, Point::new(half_w, half_h)),
            (Handle::SkewX, Point::new(0.0, half_h)),
            (Handle::SkewY, Point::new(half_w, 0.0)),
        ];
        for (handle, local) in handles {
            let at = mask.to_screen(shear(mask, local));
            if at.distance_squared(point) <= radius_sq {
                return Some(handle);
            }
        }

        let local = unshear(mask, mask.to_local(point));
        (local.x.abs() <= half_w && local.y.abs() <= half_h).then_some(Handle::Body)
    }

    /// Hit-test `point` and start the matching transform.
    pub fn pointer_down_at(&mut self, point: Point) -> Option<Handle> {
        let handle = self.hit_test(point)?;
        self.pointer_down(handle, point).then_some(handle)
    }

    /// Begin a transform on `handle`.
    ///
    /// Returns `false` (and changes nothing) if another transform is
    /// already active or there is no live mask.
    pub fn pointer_down(&mut self, handle: Handle, point: Point) -> bool {
        if self.is_active() {
            return false;
        }
        let Some(mask) = self.mask else {
            return false;
        };

        self.state = match handle {
            Handle::Body => {
                let local = mask.to_local(point);
                EditorState::Dragging {
                    grab_offset: Point::new(local.x + mask.width / 2.0, local.y + mask.height / 2.0),
                }
            }
            Handle::Resize => EditorState::Resizing {
                anchor: mask,
                start: point,
            },
            Handle::Rotate => EditorState::Rotating {
                start_pointer_angle: pointer_angle(&mask, point),
                start_rotation: mask.rotation,
            },
            Handle::SkewX => EditorState::SkewingX {
                anchor: mask,
                start: point,
            },
            Handle::SkewY => EditorState::SkewingY {
                anchor: mask,
                start: point,
            },
        };
        tracing::debug!(?handle, "transform started");
        true
    }

    /// Apply a pointer move to the active transform.
    ///
    /// Returns `true` if the live mask changed.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let Some(current) = self.mask else {
            return false;
        };
        let next = match self.state {
            EditorState::Idle => return false,
            EditorState::Dragging { grab_offset } => {
                move_to(&current, point, grab_offset, self.viewport)
            }
            EditorState::Resizing { anchor, start } => {
                resize(&anchor, start, point, self.config.min_size_px)
            }
            EditorState::Rotating {
                start_pointer_angle,
                start_rotation,
            } => PixelMask {
                rotation: start_rotation + (pointer_angle(&current, point) - start_pointer_angle),
                ..current
            },
            EditorState::SkewingX { anchor, start } => {
                let delta = local_delta(&anchor, start, point);
                match skew_from_drag(anchor.skew_x, anchor.height / 2.0, delta.x) {
                    Some(skew_x) => PixelMask { skew_x, ..current },
                    None => return false,
                }
            }
            EditorState::SkewingY { anchor, start } => {
                let delta = local_delta(&anchor, start, point);
                match skew_from_drag(anchor.skew_y, anchor.width / 2.0, delta.y) {
                    Some(skew_y) => PixelMask { skew_y, ..current },
                    None => return false,
                }
            }
        };
        let changed = next != current;
        self.mask = Some(next);
        changed
    }

    /// End the active transform and renormalize the result.
    ///
    /// Returns the new normalized mask, or `None` if nothing was active.
    pub fn pointer_up(&mut self) -> Option<Mask> {
        let prev = std::mem::take(&mut self.state);
        if matches!(prev, EditorState::Idle) {
            return None;
        }
        tracing::debug!(handle = ?prev.handle(), "transform finished");
        self.commit().ok()
    }

    /// Abort the active transform, restoring the last normalized form.
    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
        self.refresh();
    }

    /// Renormalize the live mask for saving.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyViewport`] if the viewport has no
    /// area. Nothing is committed in that case.
    pub fn finalize(&mut self) -> Result<Mask, GeometryError> {
        self.commit().inspect_err(|err| {
            tracing::warn!(%err, "geometry error, mask not saved");
        })
    }

    fn commit(&mut self) -> Result<Mask, GeometryError> {
        let Some(mask) = self.mask else {
            return Err(GeometryError::empty(self.viewport));
        };
        let normalized = geometry::to_normalized(&mask, self.viewport)?;
        self.committed = Some(normalized);
        Ok(normalized)
    }

    fn refresh(&mut self) {
        let Some(aspect) = self.viewport.aspect() else {
            self.mask = None;
            return;
        };
        let fraction = self.config.default_size_fraction;
        let committed = *self
            .committed
            .get_or_insert_with(|| Mask::centered_square(fraction, aspect));
        self.mask = geometry::to_pixel(&committed, self.viewport).ok();
    }
}

/// Angle in degrees from the mask center to `point`.
fn pointer_angle(mask: &PixelMask, point: Point) -> f64 {
    let c = mask.center();
    (point.y - c.y).atan2(point.x - c.x).to_degrees()
}

/// Pointer displacement since `start`, expressed in the anchor's rotated frame.
fn local_delta(anchor: &PixelMask, start: Point, point: Point) -> Point {
    Point::new(point.x - start.x, point.y - start.y).rotated(-anchor.rotation)
}

/// Clamp `value` into `[0, max]`, pinning to zero when `max` is negative.
fn clamp_into(value: f64, max: f64) -> f64 {
    value.min(max).max(0.0)
}

fn move_to(mask: &PixelMask, point: Point, grab_offset: Point, viewport: Viewport) -> PixelMask {
    PixelMask {
        x: clamp_into(point.x - grab_offset.x, viewport.width - mask.width),
        y: clamp_into(point.y - grab_offset.y, viewport.height - mask.height),
        ..*mask
    }
}

fn resize(anchor: &PixelMask, start: Point, point: Point, min_size: f64) -> PixelMask {
    let delta = local_delta(anchor, start, point);
    let width = (anchor.width + delta.x).max(min_size);
    let height = (anchor.height + delta.y).max(min_size);

    // Move the center by half the size change (in screen space) so the
    // top-left corner of the rotated box stays where it was.
    let grow = Point::new(width - anchor.width, height - anchor.height);
    let shift = grow.rotated(anchor.rotation);
    PixelMask {
        x: anchor.x + (shift.x - grow.x) / 2.0,
        y: anchor.y + (shift.y - grow.y) / 2.0,
        width,
        height,
        ..*anchor
    }
}

/// New skew angle after dragging an edge handle by `delta` along its edge.
///
/// The handle sits `half_length` from the center; its tangent offset is
/// `tan(skew) * half_length`. Returns `None` for a zero lever arm.
fn skew_from_drag(anchor_skew: f64, half_length: f64, delta: f64) -> Option<f64> {
    if half_length.abs() < f64::EPSILON {
        return None;
    }
    let offset = anchor_skew.to_radians().tan().mul_add(half_length, delta);
    Some(clamp_skew(offset.atan2(half_length).to_degrees()))
}

/// Apply the mask's shear to a point in its rotated frame.
fn shear(mask: &PixelMask, p: Point) -> Point {
    let kx = mask.skew_x.to_radians().tan();
    let ky = mask.skew_y.to_radians().tan();
    Point::new(kx.mul_add(p.y, p.x), ky.mul_add(p.x, p.y))
}

/// Undo the mask's shear. Degenerate shears are left as-is.
fn unshear(mask: &PixelMask, p: Point) -> Point {
    let kx = mask.skew_x.to_radians().tan();
    let ky = mask.skew_y.to_radians().tan();
    let det = kx.mul_add(-ky, 1.0);
    if det.abs() < 1e-9 {
        return p;
    }
    Point::new(kx.mul_add(-p.y, p.x) / det, ky.mul_add(-p.x, p.y) / det)
}
