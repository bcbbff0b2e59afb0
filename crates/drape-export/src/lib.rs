//! drape-export: Batch export of garment/print composites (sans-IO)
//!
//! Reads an export manifest, renders one composite per garment side and
//! print through `drape-core`, and reports what was rendered or skipped.
//! Writing the PNGs (or packaging them) is left to the caller.

pub mod batch;
pub mod manifest;

pub use batch::{ExportReport, ExportedImage, Skipped, export_batch};
pub use manifest::{ExportError, ExportManifest, Garment, ManifestFile, Print};
