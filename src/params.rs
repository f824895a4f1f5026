// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parameters that make a render reproducible: the attractor
//! coefficients and view, the tone-mapping settings, and the parsing
//! of the size and color strings a user types.

use crate::error::{RenderError, Result};
use crate::variates::Variates;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Two reals closer than this are the same parameter value.
const EPSILON: f64 = 1e-9;

#[inline]
fn changed(old: f64, new: f64) -> bool {
    (old - new).abs() > EPSILON
}

/// The coefficients and viewing transform of the de Jong map.
///
/// Note that the second map equation uses `c` twice and `d` not at
/// all.  That is the reference behavior and every saved image depends
/// on it, so `d` is carried, saved and loaded but does not influence
/// the attractor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AttractorParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    /// Scale from attractor space to pixel space.  Must be positive.
    pub zoom: f64,
    pub xoffset: f64,
    pub yoffset: f64,
    /// Radians.  Exactly zero skips the rotation step.
    pub rotation: f64,
    /// Standard deviation of the blur, in attractor units.
    pub blur_radius: f64,
    /// Probability that a given step is blurred.
    pub blur_ratio: f64,
}

impl Default for AttractorParameters {
    fn default() -> Self {
        AttractorParameters {
            a: 1.4191403,
            b: -2.2841323,
            c: 2.4275403,
            d: -2.177196,
            zoom: 1.0,
            xoffset: 0.0,
            yoffset: 0.0,
            rotation: 0.0,
            blur_radius: 0.0,
            blur_ratio: 1.0,
        }
    }
}

impl AttractorParameters {
    /// Blur is only applied when both its knobs are nonzero.
    pub fn blur_enabled(&self) -> bool {
        self.blur_ratio != 0.0 && self.blur_radius != 0.0
    }

    /// Replaces the four coefficients with values drawn uniformly from
    /// [-6, 6).
    pub fn randomize<R: Rng>(&mut self, variates: &mut Variates<R>) {
        self.a = variates.uniform() * 12.0 - 6.0;
        self.b = variates.uniform() * 12.0 - 6.0;
        self.c = variates.uniform() * 12.0 - 6.0;
        self.d = variates.uniform() * 12.0 - 6.0;
    }

    /// True when any field differs by more than a rounding error.
    pub fn differs_from(&self, other: &AttractorParameters) -> bool {
        changed(self.a, other.a)
            || changed(self.b, other.b)
            || changed(self.c, other.c)
            || changed(self.d, other.d)
            || changed(self.zoom, other.zoom)
            || changed(self.xoffset, other.xoffset)
            || changed(self.yoffset, other.yoffset)
            || changed(self.rotation, other.rotation)
            || changed(self.blur_radius, other.blur_radius)
            || changed(self.blur_ratio, other.blur_ratio)
    }
}

/// A color with 16-bit channels.  Only the high byte of each channel
/// survives into pixels and saved parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Color {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Color {
    pub const WHITE: Color = Color {
        red: 0xFFFF,
        green: 0xFFFF,
        blue: 0xFFFF,
    };

    pub const BLACK: Color = Color {
        red: 0,
        green: 0,
        blue: 0,
    };

    /// Builds a color from 8-bit channels, replicating each byte into
    /// both halves of the 16-bit channel.
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Color {
            red: u16::from(red) * 0x101,
            green: u16::from(green) * 0x101,
            blue: u16::from(blue) * 0x101,
        }
    }

    /// The high byte of each channel.
    pub fn rgb8(&self) -> (u8, u8, u8) {
        ((self.red >> 8) as u8, (self.green >> 8) as u8, (self.blue >> 8) as u8)
    }
}

/// Parses `#RGB`, `#RRGGBB` or `#RRRRGGGGBBBB` into 16-bit channels.
fn parse_hex(digits: &str) -> Option<Color> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let width = match digits.len() {
        3 => 1,
        6 => 2,
        12 => 4,
        _ => return None,
    };
    let channel = |i: usize| -> Option<u16> {
        let raw = u16::from_str_radix(&digits[i * width..(i + 1) * width], 16).ok()?;
        Some(match width {
            1 => raw * 0x1111,
            2 => raw * 0x101,
            _ => raw,
        })
    };
    Some(Color {
        red: channel(0)?,
        green: channel(1)?,
        blue: channel(2)?,
    })
}

impl FromStr for Color {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = match s.to_ascii_lowercase().as_str() {
            "white" => Some(Color::WHITE),
            "black" => Some(Color::BLACK),
            lower if lower.starts_with('#') => parse_hex(&s[1..]),
            _ => None,
        };
        parsed.ok_or_else(|| RenderError::BadColor(s.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (r, g, b) = self.rgb8();
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// How the histogram becomes an image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub exposure: f64,
    pub gamma: f64,
    pub fgcolor: Color,
    pub bgcolor: Color,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            exposure: 0.05,
            gamma: 1.0,
            fgcolor: Color::BLACK,
            bgcolor: Color::WHITE,
        }
    }
}

impl RenderSettings {
    /// True when any field differs by more than a rounding error.
    pub fn differs_from(&self, other: &RenderSettings) -> bool {
        changed(self.exposure, other.exposure)
            || changed(self.gamma, other.gamma)
            || self.fgcolor != other.fgcolor
            || self.bgcolor != other.bgcolor
    }
}

/// Everything the parameter text carries.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ParameterSet {
    pub attractor: AttractorParameters,
    pub render: RenderSettings,
}

/// Given a string and a separator, returns the two values
/// separated by the separator.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// Parses an image size.  A single number gives a square image,
/// otherwise `WIDTHxHEIGHT`.  Neither dimension may be zero.
pub fn parse_size(s: &str) -> Result<(usize, usize)> {
    let s = s.trim();
    let size = if s.contains('x') {
        parse_pair::<usize>(s, 'x')
    } else {
        usize::from_str(s).ok().map(|side| (side, side))
    };
    match size {
        Some((0, _)) | Some((_, 0)) | None => Err(RenderError::BadSize(s.to_string())),
        Some(size) => Ok(size),
    }
}
