//! Output aspect ratios and letterboxed canvas layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::Dimensions;

/// Requested shape of the composite canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AspectRatio {
    /// Canvas matches the garment's natural size.
    #[default]
    Original,
    /// Canvas has `width:height` proportions and letterboxes the garment.
    Ratio { width: f64, height: f64 },
}

/// An aspect-ratio token that is neither `original` nor `W:H`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid aspect ratio {0:?} (expected \"original\" or \"W:H\")")]
pub struct ParseAspectRatioError(pub String);

/// Where the garment sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasLayout {
    /// Full canvas size.
    pub canvas: Dimensions,
    /// Top-left corner of the garment on the canvas.
    pub offset_x: u32,
    pub offset_y: u32,
}

impl AspectRatio {
    /// Compute the canvas for a garment of the given natural size.
    ///
    /// The garment is never cropped or scaled: the canvas grows along one
    /// axis until it reaches the requested proportions, and the garment is
    /// centered on it (offsets round down).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn layout(self, garment: Dimensions) -> CanvasLayout {
        let canvas = match self {
            Self::Original => garment,
            Self::Ratio { width, height } => {
                let target = width / height;
                let gw = f64::from(garment.width);
                let gh = f64::from(garment.height);
                if gw / gh > target {
                    Dimensions {
                        width: garment.width,
                        height: ((gw / target).round() as u32).max(garment.height),
                    }
                } else {
                    Dimensions {
                        width: ((gh * target).round() as u32).max(garment.width),
                        height: garment.height,
                    }
                }
            }
        };
        CanvasLayout {
            canvas,
            offset_x: (canvas.width - garment.width) / 2,
            offset_y: (canvas.height - garment.height) / 2,
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ParseAspectRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("original") {
            return Ok(Self::Original);
        }
        let err = || ParseAspectRatioError(s.to_owned());
        let (w, h) = token.split_once(':').ok_or_else(err)?;
        let width: f64 = w.trim().parse().map_err(|_| err())?;
        let height: f64 = h.trim().parse().map_err(|_| err())?;
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(err());
        }
        Ok(Self::Ratio { width, height })
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::Ratio { width, height } => write!(f, "{width}:{height}"),
        }
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn parses_tokens() {
        assert_eq!("original".parse::<AspectRatio>().unwrap(), AspectRatio::Original);
        assert_eq!(" Original ".parse::<AspectRatio>().unwrap(), AspectRatio::Original);
        assert_eq!(
            "16:9".parse::<AspectRatio>().unwrap(),
            AspectRatio::Ratio {
                width: 16.0,
                height: 9.0
            }
        );
        assert_eq!(
            "1.91 : 1".parse::<AspectRatio>().unwrap(),
            AspectRatio::Ratio {
                width: 1.91,
                height: 1.0
            }
        );
    }

    #[test]
    fn rejects_bad_tokens() {
        for bad in ["", "square", "4x3", "4:", ":3", "0:1", "1:-2", "inf:1", "NaN:1", "1:2:3"] {
            assert!(bad.parse::<AspectRatio>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn original_keeps_garment_size() {
        let layout = AspectRatio::Original.layout(dims(500, 300));
        assert_eq!(layout.canvas, dims(500, 300));
        assert_eq!((layout.offset_x, layout.offset_y), (0, 0));
    }

    #[test]
    fn wide_garment_in_square_gets_vertical_bars() {
        let ratio = "1:1".parse::<AspectRatio>().unwrap();
        let layout = ratio.layout(dims(400, 200));
        assert_eq!(layout.canvas, dims(400, 400));
        assert_eq!((layout.offset_x, layout.offset_y), (0, 100));
    }

    #[test]
    fn tall_garment_in_wide_ratio_gets_side_bars() {
        let ratio = "16:9".parse::<AspectRatio>().unwrap();
        let layout = ratio.layout(dims(300, 900));
        assert_eq!(layout.canvas, dims(1600, 900));
        assert_eq!((layout.offset_x, layout.offset_y), (650, 0));
    }

    #[test]
    fn matching_ratio_adds_no_bars() {
        let ratio = "3:2".parse::<AspectRatio>().unwrap();
        let layout = ratio.layout(dims(600, 400));
        assert_eq!(layout.canvas, dims(600, 400));
        assert_eq!((layout.offset_x, layout.offset_y), (0, 0));
    }

    #[test]
    fn canvas_always_contains_garment() {
        for token in ["1:1", "4:5", "9:16", "2.35:1", "3:7"] {
            let ratio = token.parse::<AspectRatio>().unwrap();
            for garment in [dims(1, 1), dims(333, 777), dims(1024, 7), dims(99, 100)] {
                let layout = ratio.layout(garment);
                assert!(layout.canvas.width >= garment.width);
                assert!(layout.canvas.height >= garment.height);
                assert!(layout.offset_x + garment.width <= layout.canvas.width);
                assert!(layout.offset_y + garment.height <= layout.canvas.height);
            }
        }
    }

    #[test]
    fn display_round_trips() {
        let ratio = "4:5".parse::<AspectRatio>().unwrap();
        assert_eq!(ratio.to_string(), "4:5");
        assert_eq!(ratio.to_string().parse::<AspectRatio>().unwrap(), ratio);
    }
}
