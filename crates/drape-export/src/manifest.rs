//! Export manifests.
//!
//! A [`ManifestFile`] is the JSON document a user writes: garments and
//! prints referenced by path. [`ManifestFile::resolve`] turns it into an
//! in-memory [`ExportManifest`] by asking the caller for each file's
//! bytes, so this crate never touches the filesystem itself.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use drape_core::{Dimensions, GarmentSide, Mask};
use serde::{Deserialize, Serialize};

/// Errors while reading or resolving a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A garment as listed in the manifest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentFile {
    pub name: String,
    pub image: PathBuf,

    /// Natural size the masks were authored against. Read from the image
    /// header when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Dimensions>,

    /// At most one mask per side; sides without a mask are not exported.
    #[serde(default)]
    pub masks: BTreeMap<GarmentSide, Mask>,
}

/// A print as listed in the manifest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintFile {
    pub name: String,
    pub image: PathBuf,
}

/// The on-disk manifest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestFile {
    pub garments: Vec<GarmentFile>,
    pub prints: Vec<PrintFile>,
}

/// A garment with its image bytes loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Garment {
    pub name: String,
    pub image: Vec<u8>,
    /// Size the masks were authored against; `None` reads it from the
    /// image header when the batch runs.
    pub size: Option<Dimensions>,
    pub masks: BTreeMap<GarmentSide, Mask>,
}

/// A print with its image bytes loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Print {
    pub name: String,
    pub image: Vec<u8>,
}

/// Everything one export batch needs, in manifest order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportManifest {
    pub garments: Vec<Garment>,
    pub prints: Vec<Print>,
}

impl ManifestFile {
    /// Parse a manifest from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Manifest`] for malformed JSON or masks.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load every referenced image through `read`.
    ///
    /// Relative image paths are joined onto `base`. Bytes are not decoded
    /// here: a garment or print that is not a readable image is kept and
    /// the batch reports each of its combinations as skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Read`] when `read` fails.
    pub fn resolve<F>(self, base: &Path, mut read: F) -> Result<ExportManifest, ExportError>
    where
        F: FnMut(&Path) -> io::Result<Vec<u8>>,
    {
        let mut load = |image: &Path| {
            let path = base.join(image);
            read(&path).map_err(|source| ExportError::Read { path, source })
        };

        let mut garments = Vec::with_capacity(self.garments.len());
        for garment in self.garments {
            garments.push(Garment {
                image: load(&garment.image)?,
                name: garment.name,
                size: garment.size,
                masks: garment.masks,
            });
        }

        let mut prints = Vec::with_capacity(self.prints.len());
        for print in self.prints {
            prints.push(Print {
                image: load(&print.image)?,
                name: print.name,
            });
        }

        Ok(ExportManifest { garments, prints })
    }
}
