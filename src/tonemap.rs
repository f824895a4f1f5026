// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning counts into colors.
//!
//! A count is scaled by the exposure, relative to the average density
//! of the histogram, then gamma-corrected into a luminance that blends
//! the background color (no visits) into the foreground color.  Every
//! pixel with the same count gets the same color, so the colors are
//! computed once per count into a table and the image is a lookup.

use crate::params::{Color, RenderSettings};
use crate::surface::Surface;
use num::clamp;

/// The largest usable count-to-luminance factor.  Early frames are
/// badly underexposed and would otherwise scale past it.
pub const MAX_PIXEL_SCALE: f64 = 0.5;

/// The factor that turns a count into a luminance, where 0 is the
/// background and 1 the foreground.  Zero before anything has been
/// iterated.
pub fn pixel_scale(surface: &Surface, settings: &RenderSettings, zoom: f64) -> f64 {
    if surface.iterations() <= 0.0 || surface.area() == 0 {
        return 0.0;
    }
    let density = surface.iterations() / surface.area() as f64;
    let fscale = settings.exposure * zoom / density;
    if fscale > MAX_PIXEL_SCALE {
        MAX_PIXEL_SCALE
    } else {
        fscale
    }
}

#[inline]
fn blend(bg: u16, fg: u16, luma: f64) -> u32 {
    let mixed = (f64::from(bg) * (1.0 - luma) + f64::from(fg) * luma) as i64;
    clamp(mixed >> 8, 0, 255) as u32
}

/// Packs one opaque color, red in the low byte.
#[inline]
fn pack(bg: Color, fg: Color, luma: f64) -> u32 {
    let r = blend(bg.red, fg.red, luma);
    let g = blend(bg.green, fg.green, luma);
    let b = blend(bg.blue, fg.blue, luma);
    0xFF00_0000 | (b << 16) | (g << 8) | r
}

/// A color for every count from zero to the current density.
#[derive(Clone, Debug, Default)]
pub struct ColorTable {
    entries: Vec<u32>,
}

impl ColorTable {
    pub fn new() -> Self {
        ColorTable::default()
    }

    /// How many counts the table can currently hold.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// The color for a count.  Only meaningful after a rebuild that
    /// covered it.
    pub fn get(&self, count: u32) -> Option<u32> {
        self.entries.get(count as usize).cloned()
    }

    /// Recomputes every entry up to the surface's current density,
    /// growing to twice the required size when too small.
    pub fn rebuild(&mut self, surface: &Surface, settings: &RenderSettings, zoom: f64) {
        let required = surface.current_density() as usize + 1;
        if self.entries.len() < required {
            self.entries = vec![0; required * 2];
        }

        let scale = pixel_scale(surface, settings, zoom);
        let exponent = 1.0 / settings.gamma;
        for (count, entry) in self.entries[..required].iter_mut().enumerate() {
            let luma = (count as f64 * scale).powf(exponent);
            *entry = pack(settings.bgcolor, settings.fgcolor, luma);
        }
    }

    // Every count must already be covered by a rebuild.
    fn rasterize(&self, counts: &[u32], pixels: &mut [u32]) {
        for (pixel, count) in pixels.iter_mut().zip(counts) {
            *pixel = self.entries[*count as usize];
        }
    }

    /// Rebuilds the table and rasterizes the surface with it.  The two
    /// only ever happen together.
    pub fn render(&mut self, surface: &mut Surface, settings: &RenderSettings, zoom: f64) {
        self.rebuild(surface, settings, zoom);
        let (counts, pixels) = surface.histogram_mut();
        self.rasterize(counts, pixels);
    }
}
