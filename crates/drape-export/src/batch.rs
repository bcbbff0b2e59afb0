//! One composite per garment side and print.

use std::collections::HashSet;

use drape_core::decode;
use drape_core::{CompositeError, CompositeOptions, Dimensions, GarmentSide, composite};

use crate::manifest::{ExportManifest, Garment};

/// A rendered combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub file_name: String,
    pub garment: String,
    pub side: GarmentSide,
    pub print: String,
    pub png: Vec<u8>,
}

/// A combination that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub file_name: String,
    pub reason: String,
}

/// Outcome of a batch, each list in manifest order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportReport {
    pub rendered: Vec<ExportedImage>,
    pub skipped: Vec<Skipped>,
}

/// Render every (garment, side with a mask, print) combination.
///
/// Combinations are visited garment by garment, front before back, then
/// print by print. A failing combination is recorded in
/// [`ExportReport::skipped`] and the batch carries on. A garment without
/// an explicit size whose image header cannot be read skips all of its
/// combinations.
#[must_use]
pub fn export_batch(manifest: &ExportManifest, options: &CompositeOptions) -> ExportReport {
    let mut report = ExportReport::default();
    let mut names = FileNames::default();

    for garment in &manifest.garments {
        let size = garment_size(garment);
        for (&side, mask) in &garment.masks {
            for print in &manifest.prints {
                let file_name = names.claim(&garment.name, side, &print.name);
                let result = size.as_ref().map_err(|err| error_chain(err)).and_then(|&size| {
                    composite(
                        &garment.image,
                        Some(print.image.as_slice()),
                        Some(mask),
                        size,
                        options,
                    )
                    .map_err(|err| error_chain(&err))
                });
                match result {
                    Ok(png) => {
                        tracing::debug!(file_name = %file_name, bytes = png.len(), "rendered");
                        report.rendered.push(ExportedImage {
                            file_name,
                            garment: garment.name.clone(),
                            side,
                            print: print.name.clone(),
                            png,
                        });
                    }
                    Err(reason) => {
                        tracing::warn!(file_name = %file_name, reason = %reason, "skipping combination");
                        report.skipped.push(Skipped { file_name, reason });
                    }
                }
            }
        }
    }

    tracing::info!(
        rendered = report.rendered.len(),
        skipped = report.skipped.len(),
        "export batch finished"
    );
    report
}

/// The manifest's size for `garment`, or the one in its image header.
fn garment_size(garment: &Garment) -> Result<Dimensions, CompositeError> {
    match garment.size {
        Some(size) => Ok(size),
        None => decode::read_dimensions(&garment.image).map_err(|err| {
            tracing::warn!(garment = %garment.name, "cannot read garment size from its image");
            CompositeError::GarmentDecode(err)
        }),
    }
}

/// `error: cause: cause` on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Hands out unique `<garment>-<side>-<print>.png` names.
#[derive(Default)]
struct FileNames {
    taken: HashSet<String>,
}

impl FileNames {
    fn claim(&mut self, garment: &str, side: GarmentSide, print: &str) -> String {
        let stem = format!("{}-{side}-{}", slug(garment), slug(print));
        let mut candidate = format!("{stem}.png");
        let mut n = 2;
        while !self.taken.insert(candidate.clone()) {
            candidate = format!("{stem}-{n}.png");
            n += 1;
        }
        candidate
    }
}

/// Lowercase ASCII alphanumerics with single dashes between words.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("untitled");
    }
    out
}
