// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A render session: the parameters, the surface they are iterated
//! onto, the color table that develops it, and the variate stream
//! that drives it, owned together.

use crate::attractor;
use crate::error::Result;
use crate::params::{AttractorParameters, ParameterSet, RenderSettings};
use crate::surface::Surface;
use crate::tonemap::{self, ColorTable};
use crate::variates::Variates;
use log::debug;

/// A copy of the image at one moment, safe to keep while the session
/// carries on.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    /// Packed ARGB, alpha in the high byte and red in the low byte.
    pub pixels: Vec<u32>,
    pub iterations: f64,
    pub current_density: u32,
    /// One line for a person to read.
    pub status: String,
}

impl Frame {
    /// The pixels as bytes in R, G, B, A order.
    pub fn rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes().to_vec()).collect()
    }
}

/// Everything one render needs, with no state shared outside it.
#[derive(Debug)]
pub struct Session {
    params: AttractorParameters,
    settings: RenderSettings,
    surface: Surface,
    table: ColorTable,
    variates: Variates,
}

impl Session {
    /// Allocates a `width` by `height` surface for the given
    /// parameters.
    pub fn new(set: ParameterSet, width: usize, height: usize, mut variates: Variates) -> Result<Self> {
        let surface = Surface::new(width, height, &mut variates)?;
        Ok(Session {
            params: set.attractor,
            settings: set.render,
            surface,
            table: ColorTable::new(),
            variates,
        })
    }

    pub fn parameters(&self) -> ParameterSet {
        ParameterSet {
            attractor: self.params,
            render: self.settings,
        }
    }

    pub fn attractor(&self) -> &AttractorParameters {
        &self.params
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Advances the orbit by `count` steps.
    pub fn run_iterations(&mut self, count: u64) {
        attractor::run_iterations(&self.params, &mut self.surface, &mut self.variates, count);
    }

    /// Throws away the histogram and restarts the orbit.
    pub fn clear(&mut self) {
        self.surface.clear(&mut self.variates);
    }

    /// Changes the image size, which throws away the histogram.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        self.surface.resize(width, height, &mut self.variates)
    }

    /// New attractor parameters invalidate everything accumulated.
    /// Returns whether anything changed; identical parameters keep the
    /// histogram.
    pub fn set_attractor(&mut self, params: AttractorParameters) -> bool {
        if !self.params.differs_from(&params) {
            return false;
        }
        debug!("attractor parameters changed, clearing");
        self.params = params;
        self.clear();
        true
    }

    /// New tone-mapping settings only change how the histogram is
    /// developed, so it is kept.  Returns whether anything changed.
    pub fn set_render_settings(&mut self, settings: RenderSettings) -> bool {
        if !self.settings.differs_from(&settings) {
            return false;
        }
        self.settings = settings;
        true
    }

    pub fn pixel_scale(&self) -> f64 {
        tonemap::pixel_scale(&self.surface, &self.settings, self.params.zoom)
    }

    /// Develops the histogram into the pixel buffer.
    pub fn render_pixels(&mut self) {
        self.table
            .render(&mut self.surface, &self.settings, self.params.zoom);
    }

    pub fn color_table(&self) -> &ColorTable {
        &self.table
    }

    /// Copies the pixel buffer as it stands.
    pub fn frame(&self, status: String) -> Frame {
        Frame {
            width: self.surface.width(),
            height: self.surface.height(),
            pixels: self.surface.pixels().to_vec(),
            iterations: self.surface.iterations(),
            current_density: self.surface.current_density(),
            status,
        }
    }
}
