// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The Peter de Jong map, iterated.
//!
//! The map takes a point on the real plane and produces another:
//!
//! ```text
//! x' = sin(a y) - cos(b x)
//! y' = sin(c x) - cos(c y)
//! ```
//!
//! For most coefficients the orbit never settles and never escapes; it
//! wanders forever over a bounded, intricate set.  Counting how often
//! the orbit passes through each pixel, over millions of steps, gives
//! the density picture we render.
//!
//! The published map uses `d` in the last term.  This renderer uses
//! `c` there, as the images it has always produced depend on it.

use crate::params::AttractorParameters;
use crate::planes::PlaneMapper;
use crate::surface::Surface;
use crate::variates::Variates;
use num::Complex;
use rand::Rng;

/// One step of the map.
#[inline]
pub fn next_point(params: &AttractorParameters, point: Complex<f64>) -> Complex<f64> {
    Complex::new(
        (params.a * point.im).sin() - (params.b * point.re).cos(),
        (params.c * point.re).sin() - (params.c * point.im).cos(),
    )
}

/// Runs `count` steps of the map, plotting every step that lands on
/// the surface.  The orbit itself is never rotated or blurred; only
/// the copy that gets plotted is.
///
/// Steps that fall off the image are counted in `iterations` but
/// leave no mark.  Consecutive calls continue the same orbit, so
/// splitting a run into batches changes nothing.
pub fn run_iterations<R: Rng>(
    params: &AttractorParameters,
    surface: &mut Surface,
    variates: &mut Variates<R>,
    count: u64,
) {
    let plane = PlaneMapper::new(
        surface.width(),
        surface.height(),
        params.zoom,
        Complex::new(params.xoffset, params.yoffset),
    );

    // Rotating by multiplying with a unit complex number.
    let rotation = if params.rotation != 0.0 {
        Some(Complex::new(params.rotation.cos(), -params.rotation.sin()))
    } else {
        None
    };
    let blur = params.blur_enabled();

    let mut point = surface.point;
    let mut density = surface.current_density;
    {
        let counts = surface.counts_mut();
        for _ in 0..count {
            point = next_point(params, point);

            let mut plotted = match rotation {
                Some(r) => point * r,
                None => point,
            };

            if blur && variates.uniform() < params.blur_ratio {
                plotted.re += variates.normal() * params.blur_radius;
                plotted.im += variates.normal() * params.blur_radius;
            }

            if let Some(offset) = plane.point_to_offset(plotted) {
                let hits = counts[offset].saturating_add(1);
                counts[offset] = hits;
                if hits > density {
                    density = hits;
                }
            }
        }
    }
    surface.point = point;
    surface.current_density = density;
    surface.iterations += count as f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(size: usize, seed: u64) -> (Surface, Variates) {
        let mut v = Variates::seeded(seed);
        let s = Surface::new(size, size, &mut v).unwrap();
        (s, v)
    }

    #[test]
    fn map_uses_c_twice() {
        let mut p = AttractorParameters::default();
        let start = Complex::new(0.3, -0.7);
        let before = next_point(&p, start);
        p.d = 100.0;
        assert_eq!(next_point(&p, start), before);
        let expected = Complex::new(
            (p.a * -0.7_f64).sin() - (p.b * 0.3_f64).cos(),
            (p.c * 0.3_f64).sin() - (p.c * -0.7_f64).cos(),
        );
        assert_eq!(before, expected);
    }

    #[test]
    fn zero_iterations_do_nothing() {
        let (mut s, mut v) = surface(20, 1);
        let p = AttractorParameters::default();
        let point = s.point();
        run_iterations(&p, &mut s, &mut v, 0);
        assert_eq!(s.point(), point);
        assert_eq!(s.iterations(), 0.0);
        assert_eq!(s.current_density(), 0);
    }

    #[test]
    fn iterations_count_every_step() {
        let (mut s, mut v) = surface(20, 2);
        let mut p = AttractorParameters::default();
        // Zoomed so far in that almost nothing lands on the image.
        p.zoom = 1000.0;
        p.xoffset = 50.0;
        run_iterations(&p, &mut s, &mut v, 5_000);
        assert_eq!(s.iterations(), 5_000.0);
        assert_eq!(s.counts().iter().map(|c| u64::from(*c)).sum::<u64>(), 0);
    }

    #[test]
    fn density_tracks_the_busiest_pixel() {
        let (mut s, mut v) = surface(50, 3);
        let p = AttractorParameters::default();
        let mut last = 0;
        for _ in 0..20 {
            run_iterations(&p, &mut s, &mut v, 2_000);
            let max = *s.counts().iter().max().unwrap();
            assert!(s.current_density() >= last);
            assert_eq!(s.current_density(), max);
            assert!(s.iterations() >= f64::from(s.current_density()));
            last = s.current_density();
        }
        assert!(last > 0);
    }

    #[test]
    fn split_runs_match_one_run() {
        let mut p = AttractorParameters::default();
        p.blur_radius = 0.05;
        p.blur_ratio = 0.5;
        p.rotation = 0.3;
        let (mut one, mut v1) = surface(40, 9);
        let (mut two, mut v2) = surface(40, 9);
        run_iterations(&p, &mut one, &mut v1, 30_000);
        run_iterations(&p, &mut two, &mut v2, 12_345);
        run_iterations(&p, &mut two, &mut v2, 30_000 - 12_345);
        assert_eq!(one.counts(), two.counts());
        assert_eq!(one.point(), two.point());
        assert_eq!(one.iterations(), two.iterations());
        assert_eq!(one.current_density(), two.current_density());
    }

    #[test]
    fn rotation_changes_the_picture_not_the_orbit() {
        let mut rotated = AttractorParameters::default();
        rotated.rotation = 1.0;
        let (mut a, mut va) = surface(40, 4);
        let (mut b, mut vb) = surface(40, 4);
        run_iterations(&AttractorParameters::default(), &mut a, &mut va, 10_000);
        run_iterations(&rotated, &mut b, &mut vb, 10_000);
        assert_eq!(a.point(), b.point());
        assert_ne!(a.counts(), b.counts());
    }

    #[test]
    fn disabled_blur_draws_no_variates() {
        let mut no_radius = AttractorParameters::default();
        no_radius.blur_radius = 0.0;
        no_radius.blur_ratio = 1.0;
        let mut no_ratio = AttractorParameters::default();
        no_ratio.blur_radius = 0.2;
        no_ratio.blur_ratio = 0.0;

        let (mut a, mut va) = surface(40, 5);
        let (mut b, mut vb) = surface(40, 5);
        let mut untouched_a = va.clone();
        let mut untouched_b = vb.clone();
        run_iterations(&no_radius, &mut a, &mut va, 20_000);
        run_iterations(&no_ratio, &mut b, &mut vb, 20_000);
        assert_eq!(a.counts(), b.counts());
        assert_eq!(va.uniform().to_bits(), untouched_a.uniform().to_bits());
        assert_eq!(vb.uniform().to_bits(), untouched_b.uniform().to_bits());
    }

    #[test]
    fn blur_spreads_the_histogram() {
        let mut blurred = AttractorParameters::default();
        blurred.blur_radius = 0.1;
        blurred.blur_ratio = 1.0;
        let (mut a, mut va) = surface(60, 6);
        let (mut b, mut vb) = surface(60, 6);
        run_iterations(&AttractorParameters::default(), &mut a, &mut va, 50_000);
        run_iterations(&blurred, &mut b, &mut vb, 50_000);
        let lit = |s: &Surface| s.counts().iter().filter(|c| **c > 0).count();
        assert!(lit(&b) > lit(&a));
    }
}
