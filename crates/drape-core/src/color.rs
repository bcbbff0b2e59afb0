//! Target colors for garment recoloring.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A string that is not a `#rgb` or `#rrggbb` hex color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color {0:?}")]
pub struct ParseColorError(pub String);

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS hex color (`"#1a1a1a"` or `" #fff "`).
    ///
    /// # Errors
    ///
    /// Returns [`ParseColorError`] if the string is not `#` followed by
    /// three or six hex digits.
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let trimmed = s.trim();
        let err = || ParseColorError(s.to_owned());
        let hex = trimmed.strip_prefix('#').ok_or_else(err)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(err());
        }
        match hex.len() {
            3 => {
                // Short form: #rgb -> #rrggbb
                let mut rgb = [0u8; 3];
                for (slot, ch) in rgb.iter_mut().zip(hex.chars()) {
                    let n = ch.to_digit(16).ok_or_else(err)?;
                    *slot = u8::try_from(n * 17).map_err(|_| err())?;
                }
                Ok(Self::new(rgb[0], rgb[1], rgb[2]))
            }
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
                Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
            }
            _ => Err(err()),
        }
    }

    /// Lowercase `#rrggbb` form.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Luminosity in `[0, 1]` as used by the non-separable blend modes
    /// (`0.3 R + 0.59 G + 0.11 B`).
    #[must_use]
    pub fn luminosity(self) -> f64 {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;
        0.3f64.mul_add(r, 0.59f64.mul_add(g, 0.11 * b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
