//! Compositing operators for drawing the print onto the garment.
//!
//! Names follow the canvas `globalCompositeOperation` vocabulary, matched
//! case-insensitively. `normal` is accepted as an alias for
//! `source-over`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A standard compositing operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    SourceOver,
    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

/// A blend-mode name that matches no known operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blend mode {0:?}")]
pub struct UnknownBlendMode(pub String);

const NAMES: &[(&str, BlendMode)] = &[
    ("source-over", BlendMode::SourceOver),
    ("source-in", BlendMode::SourceIn),
    ("source-out", BlendMode::SourceOut),
    ("source-atop", BlendMode::SourceAtop),
    ("destination-over", BlendMode::DestinationOver),
    ("destination-in", BlendMode::DestinationIn),
    ("destination-out", BlendMode::DestinationOut),
    ("destination-atop", BlendMode::DestinationAtop),
    ("lighter", BlendMode::Lighter),
    ("copy", BlendMode::Copy),
    ("xor", BlendMode::Xor),
    ("multiply", BlendMode::Multiply),
    ("screen", BlendMode::Screen),
    ("overlay", BlendMode::Overlay),
    ("darken", BlendMode::Darken),
    ("lighten", BlendMode::Lighten),
    ("color-dodge", BlendMode::ColorDodge),
    ("color-burn", BlendMode::ColorBurn),
    ("hard-light", BlendMode::HardLight),
    ("soft-light", BlendMode::SoftLight),
    ("difference", BlendMode::Difference),
    ("exclusion", BlendMode::Exclusion),
    ("hue", BlendMode::Hue),
    ("saturation", BlendMode::Saturation),
    ("color", BlendMode::Color),
    ("luminosity", BlendMode::Luminosity),
];

impl BlendMode {
    /// Canonical operator name.
    #[must_use]
    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find_map(|&(name, mode)| (mode == self).then_some(name))
            .unwrap_or("source-over")
    }

    /// Whether the operator changes the destination where the source is
    /// fully transparent. A canvas applies these across the whole clip
    /// region, not only under the drawn image.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(
            self,
            Self::Copy
                | Self::SourceIn
                | Self::SourceOut
                | Self::DestinationIn
                | Self::DestinationAtop
        )
    }

    /// Equivalent `tiny-skia` blend mode.
    #[must_use]
    pub const fn to_skia(self) -> tiny_skia::BlendMode {
        match self {
            Self::SourceOver => tiny_skia::BlendMode::SourceOver,
            Self::SourceIn => tiny_skia::BlendMode::SourceIn,
            Self::SourceOut => tiny_skia::BlendMode::SourceOut,
            Self::SourceAtop => tiny_skia::BlendMode::SourceAtop,
            Self::DestinationOver => tiny_skia::BlendMode::DestinationOver,
            Self::DestinationIn => tiny_skia::BlendMode::DestinationIn,
            Self::DestinationOut => tiny_skia::BlendMode::DestinationOut,
            Self::DestinationAtop => tiny_skia::BlendMode::DestinationAtop,
            Self::Lighter => tiny_skia::BlendMode::Plus,
            Self::Copy => tiny_skia::BlendMode::Source,
            Self::Xor => tiny_skia::BlendMode::Xor,
            Self::Multiply => tiny_skia::BlendMode::Multiply,
            Self::Screen => tiny_skia::BlendMode::Screen,
            Self::Overlay => tiny_skia::BlendMode::Overlay,
            Self::Darken => tiny_skia::BlendMode::Darken,
            Self::Lighten => tiny_skia::BlendMode::Lighten,
            Self::ColorDodge => tiny_skia::BlendMode::ColorDodge,
            Self::ColorBurn => tiny_skia::BlendMode::ColorBurn,
            Self::HardLight => tiny_skia::BlendMode::HardLight,
            Self::SoftLight => tiny_skia::BlendMode::SoftLight,
            Self::Difference => tiny_skia::BlendMode::Difference,
            Self::Exclusion => tiny_skia::BlendMode::Exclusion,
            Self::Hue => tiny_skia::BlendMode::Hue,
            Self::Saturation => tiny_skia::BlendMode::Saturation,
            Self::Color => tiny_skia::BlendMode::Color,
            Self::Luminosity => tiny_skia::BlendMode::Luminosity,
        }
    }
}

impl FromStr for BlendMode {
    type Err = UnknownBlendMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("normal") {
            return Ok(Self::SourceOver);
        }
        NAMES
            .iter()
            .find_map(|&(name, mode)| name.eq_ignore_ascii_case(wanted).then_some(mode))
            .ok_or_else(|| UnknownBlendMode(s.to_owned()))
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for BlendMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for BlendMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normal_is_source_over() {
        assert_eq!("normal".parse::<BlendMode>().unwrap(), BlendMode::SourceOver);
        assert_eq!("Normal".parse::<BlendMode>().unwrap(), BlendMode::SourceOver);
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!("MULTIPLY".parse::<BlendMode>().unwrap(), BlendMode::Multiply);
        assert_eq!(
            "Color-Burn".parse::<BlendMode>().unwrap(),
            BlendMode::ColorBurn
        );
    }

    #[test]
    fn every_name_round_trips() {
        for &(name, mode) in NAMES {
            assert_eq!(name.parse::<BlendMode>().unwrap(), mode);
            assert_eq!(mode.name(), name);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "sparkle".parse::<BlendMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown blend mode \"sparkle\"");
    }

    #[test]
    fn canvas_aliases_map_to_skia_equivalents() {
        assert_eq!(BlendMode::Lighter.to_skia(), tiny_skia::BlendMode::Plus);
        assert_eq!(BlendMode::Copy.to_skia(), tiny_skia::BlendMode::Source);
    }

    #[test]
    fn unbounded_operators() {
        let unbounded: Vec<_> = NAMES
            .iter()
            .filter(|(_, mode)| mode.is_unbounded())
            .map(|&(name, _)| name)
            .collect();
        assert_eq!(
            unbounded,
            ["source-in", "source-out", "destination-in", "destination-atop", "copy"]
        );
    }

    #[test]
    fn serde_uses_canonical_name() {
        let json = serde_json::to_string(&BlendMode::HardLight).unwrap();
        assert_eq!(json, "\"hard-light\"");
        let back: BlendMode = serde_json::from_str("\"normal\"").unwrap();
        assert_eq!(back, BlendMode::SourceOver);
    }
}
