// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The random variates that seed the iterator and drive the blur.
//!
//! A session owns exactly one stream.  Everything random in a render,
//! the starting point after a clear and every blur decision, is drawn
//! from it in order, so two sessions built from the same seed produce
//! the same histogram.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// A single stream of uniform and unit-normal variates.
#[derive(Clone, Debug)]
pub struct Variates<R = StdRng> {
    unit: Uniform<f64>,
    rng: R,
}

impl Variates<StdRng> {
    /// A stream seeded from the operating system.
    pub fn from_entropy() -> Self {
        Variates::with_rng(StdRng::from_entropy())
    }

    /// A reproducible stream.
    pub fn seeded(seed: u64) -> Self {
        Variates::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Variates<R> {
    /// Wraps any generator whose output is uniformly distributed.
    pub fn with_rng(rng: R) -> Self {
        Variates {
            unit: Uniform::new(0.0_f64, 1.0),
            rng,
        }
    }

    /// A uniform variate in [0, 1).
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.unit.sample(&mut self.rng)
    }

    /// A unit-normal variate by the Box-Muller method.  A zero first
    /// draw is thrown away so the logarithm stays finite.
    #[inline]
    pub fn normal(&mut self) -> f64 {
        let u1 = loop {
            let u = self.uniform();
            if u > 0.0 {
                break u;
            }
        };
        let u2 = self.uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl Default for Variates<StdRng> {
    fn default() -> Self {
        Variates::from_entropy()
    }
}
