// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The one error type shared by every fallible operation in the
//! crate.  Parameter-file leniency is not an error: see
//! [`codec::LoadIssue`](../codec/enum.LoadIssue.html).

use failure::Fail;
use std::io;

/// Everything that can stop a render from starting or an image from
/// being written.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The size string was neither `WIDTH` nor `WIDTHxHEIGHT`.
    #[fail(display = "could not parse image size \"{}\", expected WIDTH or WIDTHxHEIGHT", _0)]
    BadSize(String),

    /// A surface must have at least one pixel.
    #[fail(display = "image dimensions must be non-zero, got {}x{}", _0, _1)]
    EmptySurface(usize, usize),

    /// The counts or pixel buffer could not be reserved.
    #[fail(display = "could not allocate a {}x{} render surface", _0, _1)]
    Allocation(usize, usize),

    /// The color string was not a name or hex triple we understand.
    #[fail(display = "could not parse color \"{}\"", _0)]
    BadColor(String),

    /// The image file carried no parameter chunk.
    #[fail(display = "no parameters chunk found in {}", _0)]
    MissingParameters(String),

    /// PNG encoding failed after the file was opened.
    #[fail(display = "could not encode PNG: {}", _0)]
    Encoding(String),

    /// PNG decoding failed while looking for the parameter chunk.
    #[fail(display = "could not decode PNG: {}", _0)]
    Decoding(String),

    /// Reading or writing a file failed.
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for RenderError {
    fn from(error: io::Error) -> Self {
        RenderError::Io(error)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
