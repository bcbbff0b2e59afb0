//! drape-core: Mask geometry, transform editor and compositor (sans-IO).
//!
//! A print placement is stored as a resolution-independent [`Mask`]
//! (fractions of the garment photo's natural size plus rotation and two
//! skew angles). The pieces of this crate move that mask through its
//! life:
//!
//! - [`geometry`]: normalized <-> pixel conversion for a viewport
//! - [`editor`]: pointer-driven move / resize / rotate / skew
//! - [`registry`]: named presets per garment side
//! - [`composite`]: deterministic garment + print rendering to PNG
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Reading files, persisting
//! registries and packaging exports live with the caller.

pub mod aspect;
pub mod blend;
pub mod color;
pub mod composite;
pub mod decode;
pub mod editor;
pub mod geometry;
pub mod registry;
pub mod surface;
pub mod types;

pub use aspect::{AspectRatio, CanvasLayout};
pub use blend::BlendMode;
pub use color::Rgb;
pub use composite::{CompositeError, CompositeOptions, composite, composite_with_tokens};
pub use editor::{EditorConfig, EditorState, Handle, MaskEditor};
pub use geometry::{to_normalized, to_pixel};
pub use registry::{GarmentMasks, MaskRegistry, RegistryError, SavedMask};
pub use surface::{SkiaSurface, Surface};
pub use types::{
    Dimensions, GarmentSide, GeometryError, MAX_SKEW_DEG, Mask, PixelMask, Point, Viewport,
};
