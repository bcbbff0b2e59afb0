//! Integration test: export a small catalogue with one corrupt print.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;

use drape_core::decode::{decode_rgba, encode_png};
use drape_core::{CompositeOptions, Dimensions, GarmentSide, Mask};
use drape_export::{ExportManifest, Garment, Print, export_batch};
use image::{Rgba, RgbaImage};

fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
}

fn chest() -> Mask {
    Mask {
        x: 0.25,
        y: 0.2,
        width: 0.5,
        height: 0.4,
        rotation: 0.0,
        skew_x: 0.0,
        skew_y: 0.0,
    }
}

fn catalogue() -> ExportManifest {
    let size = Dimensions {
        width: 80,
        height: 100,
    };
    ExportManifest {
        garments: vec![
            Garment {
                name: "Classic Tee".to_owned(),
                image: png(80, 100, [250, 250, 250, 255]),
                size: Some(size),
                masks: BTreeMap::from([(GarmentSide::Back, chest()), (GarmentSide::Front, chest())]),
            },
            Garment {
                name: "Hoodie".to_owned(),
                image: png(80, 100, [20, 20, 20, 255]),
                size: Some(size),
                masks: BTreeMap::from([(GarmentSide::Back, chest())]),
            },
            Garment {
                name: "Blank".to_owned(),
                image: png(80, 100, [0, 0, 0, 255]),
                size: Some(size),
                masks: BTreeMap::new(),
            },
        ],
        prints: vec![
            Print {
                name: "Logo".to_owned(),
                image: png(10, 10, [200, 0, 0, 255]),
            },
            Print {
                name: "Broken".to_owned(),
                image: b"definitely not a png".to_vec(),
            },
        ],
    }
}

#[test]
fn corrupt_print_is_skipped_without_aborting() {
    let report = export_batch(&catalogue(), &CompositeOptions::default());

    let rendered: Vec<_> = report.rendered.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(
        rendered,
        [
            "classic-tee-front-logo.png",
            "classic-tee-back-logo.png",
            "hoodie-back-logo.png",
        ]
    );

    let skipped: Vec<_> = report.skipped.iter().map(|s| s.file_name.as_str()).collect();
    assert_eq!(
        skipped,
        [
            "classic-tee-front-broken.png",
            "classic-tee-back-broken.png",
            "hoodie-back-broken.png",
        ]
    );
    for skip in &report.skipped {
        assert!(
            skip.reason.starts_with("print image could not be decoded"),
            "unexpected reason: {}",
            skip.reason
        );
    }
}

#[test]
fn rendered_entries_are_valid_composites() {
    let report = export_batch(&catalogue(), &CompositeOptions::default());
    let hoodie = report
        .rendered
        .iter()
        .find(|r| r.garment == "Hoodie")
        .expect("hoodie rendered");
    assert_eq!(hoodie.side, GarmentSide::Back);
    assert_eq!(hoodie.print, "Logo");

    let img = decode_rgba(&hoodie.png).unwrap();
    assert_eq!(img.dimensions(), (80, 100));
    // Mask is 40x40 at (20, 20); the print fills it.
    assert_eq!(img.get_pixel(40, 40), &Rgba([200, 0, 0, 255]));
    assert_eq!(img.get_pixel(40, 80), &Rgba([20, 20, 20, 255]));
}

#[test]
fn options_apply_to_every_combination() {
    let options = CompositeOptions {
        aspect_ratio: "1:1".parse().unwrap(),
        ..CompositeOptions::default()
    };
    let report = export_batch(&catalogue(), &options);
    assert_eq!(report.rendered.len(), 3);
    for entry in &report.rendered {
        let img = decode_rgba(&entry.png).unwrap();
        assert_eq!(img.dimensions(), (100, 100), "{}", entry.file_name);
    }
}

#[test]
fn corrupt_garment_skips_all_its_combinations() {
    let mut manifest = catalogue();
    manifest.garments[0].image = Vec::new();
    let report = export_batch(&manifest, &CompositeOptions::default());

    assert_eq!(report.rendered.len(), 1);
    assert_eq!(report.rendered[0].file_name, "hoodie-back-logo.png");
    let garment_failures = report
        .skipped
        .iter()
        .filter(|s| s.reason.starts_with("garment image could not be decoded"))
        .count();
    assert_eq!(garment_failures, 4);
}

#[test]
fn unsized_garment_with_unreadable_image_is_skipped() {
    let mut manifest = catalogue();
    manifest.garments.insert(
        0,
        Garment {
            name: "Bad".to_owned(),
            image: b"not an image".to_vec(),
            size: None,
            masks: BTreeMap::from([(GarmentSide::Front, chest()), (GarmentSide::Back, chest())]),
        },
    );
    // Sized from its own header.
    manifest.garments[2].size = None;
    manifest.prints.truncate(1);

    let report = export_batch(&manifest, &CompositeOptions::default());

    let rendered: Vec<_> = report.rendered.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(
        rendered,
        [
            "classic-tee-front-logo.png",
            "classic-tee-back-logo.png",
            "hoodie-back-logo.png",
        ]
    );
    let hoodie = decode_rgba(&report.rendered[2].png).unwrap();
    assert_eq!(hoodie.dimensions(), (80, 100));

    let skipped: Vec<_> = report.skipped.iter().map(|s| s.file_name.as_str()).collect();
    assert_eq!(skipped, ["bad-front-logo.png", "bad-back-logo.png"]);
    for skip in &report.skipped {
        assert!(
            skip.reason.starts_with("garment image could not be decoded"),
            "unexpected reason: {}",
            skip.reason
        );
    }
}
