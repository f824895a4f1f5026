// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render surface: the visitation histogram, the pixel buffer it
//! is tone-mapped into, and the live state of the iterator.

use crate::error::{RenderError, Result};
use crate::variates::Variates;
use log::debug;
use num::Complex;
use rand::Rng;

/// Allocates a zeroed buffer, failing cleanly instead of aborting
/// when the memory isn't there.
fn allocate<T: Clone + Default>(len: usize, width: usize, height: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RenderError::Allocation(width, height))?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

/// A histogram and its image, both `width * height` long, row-major.
#[derive(Clone, Debug)]
pub struct Surface {
    width: usize,
    height: usize,
    counts: Vec<u32>,
    pixels: Vec<u32>,
    /// Every map step since the last clear, including the ones that
    /// landed off the image.
    pub(crate) iterations: f64,
    /// The largest single count.  Never decreases between clears.
    pub(crate) current_density: u32,
    /// Where the iterator is now.
    pub(crate) point: Complex<f64>,
}

impl Surface {
    /// Allocates a cleared surface, drawing the first point from the
    /// variate stream.
    pub fn new<R: Rng>(width: usize, height: usize, variates: &mut Variates<R>) -> Result<Self> {
        let (counts, pixels) = Surface::buffers(width, height)?;
        let mut surface = Surface {
            width,
            height,
            counts,
            pixels,
            iterations: 0.0,
            current_density: 0,
            point: Complex::new(0.0, 0.0),
        };
        surface.clear(variates);
        Ok(surface)
    }

    fn buffers(width: usize, height: usize) -> Result<(Vec<u32>, Vec<u32>)> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySurface(width, height));
        }
        let len = width
            .checked_mul(height)
            .ok_or(RenderError::Allocation(width, height))?;
        let counts = allocate(len, width, height)?;
        let pixels = allocate(len, width, height)?;
        debug!("allocated {}x{} surface", width, height);
        Ok((counts, pixels))
    }

    /// Replaces both buffers with ones of the new size and clears.  The
    /// new buffers are allocated before the old ones are released, so
    /// on failure the surface is exactly as it was.
    pub fn resize<R: Rng>(
        &mut self,
        width: usize,
        height: usize,
        variates: &mut Variates<R>,
    ) -> Result<()> {
        let (counts, pixels) = Surface::buffers(width, height)?;
        self.counts = counts;
        self.pixels = pixels;
        self.width = width;
        self.height = height;
        self.clear(variates);
        Ok(())
    }

    /// Forgets everything accumulated and starts the iterator from a
    /// fresh random point in the unit square.
    pub fn clear<R: Rng>(&mut self, variates: &mut Variates<R>) {
        for count in self.counts.iter_mut() {
            *count = 0;
        }
        self.iterations = 0.0;
        self.current_density = 0;
        let x = variates.uniform();
        let y = variates.uniform();
        self.point = Complex::new(x, y);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The number of pixels.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Packed ARGB, alpha in the high byte and red in the low byte.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub(crate) fn histogram_mut(&mut self) -> (&[u32], &mut [u32]) {
        (&self.counts, &mut self.pixels)
    }

    pub(crate) fn counts_mut(&mut self) -> &mut [u32] {
        &mut self.counts
    }

    pub fn iterations(&self) -> f64 {
        self.iterations
    }

    pub fn current_density(&self) -> u32 {
        self.current_density
    }

    pub fn point(&self) -> Complex<f64> {
        self.point
    }
}
