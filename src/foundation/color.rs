use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{PointCloudError, PointCloudResult};

/// Straight (non-premultiplied) RGBA8 colour.
///
/// Parsed once from a CSS colour specifier (`red`, `#faecde`, `rgb(10,20,30)`, `hsl(...)`) and
/// displayed back as `rgb(r,g,b)` or `rgba(r,g,b,a)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white, the fill used when nothing in the document declares one.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque colour from its channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a CSS colour specifier.
    pub fn parse(text: &str) -> PointCloudResult<Self> {
        let parsed = svgtypes::Color::from_str(text.trim())
            .map_err(|e| PointCloudError::validation(format!("invalid color \"{text}\": {e}")))?;
        Ok(Self {
            r: parsed.red,
            g: parsed.green,
            b: parsed.blue,
            a: parsed.alpha,
        })
    }

    /// Multiply alpha by `opacity` (clamped to `0..=1`).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let a = (f64::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Premultiplied channels in `[r, g, b, a]` order.
    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            (((u16::from(c) * u16::from(a)) + 127) / 255) as u8
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

impl fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "rgb({},{},{})", self.r, self.g, self.b)
        } else {
            let a = f64::from(self.a) / 255.0;
            write!(f, "rgba({},{},{},{a:.3})", self.r, self.g, self.b)
        }
    }
}

impl FromStr for Rgba8 {
    type Err = PointCloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
