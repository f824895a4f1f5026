// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Peter de Jong attractor renderer
//!
//! The de Jong map takes a point on the plane and sends it somewhere
//! else by a pair of sines and cosines.  Follow one point through
//! millions of steps and it never repeats and never escapes: it
//! traces out a strange attractor.  Divide the plane into pixels,
//! count how often the orbit passes through each one, and the counts
//! form a density picture with a silky, photographic texture.
//!
//! This crate accumulates that histogram progressively and develops it
//! into an image with an exposure and gamma curve between two colors.
//! A [`Controller`] either refines the image interactively, redrawing
//! less often as it settles, or runs in batch until the busiest pixel
//! reaches a target count.  The parameters that produced an image are
//! saved inside it as text, so any image can be rendered again.

pub mod attractor;
pub mod codec;
pub mod controller;
pub mod error;
pub mod output;
pub mod params;
pub mod planes;
pub mod session;
pub mod surface;
pub mod tonemap;
pub mod variates;

pub use controller::{BatchProgress, Controller, Observer, State};
pub use error::{RenderError, Result};
pub use params::{parse_size, AttractorParameters, Color, ParameterSet, RenderSettings};
pub use session::{Frame, Session};
pub use variates::Variates;
