// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing finished images, and reading parameters back out of them.
//!
//! PNG files carry the parameter text in a `tEXt` chunk, so any image
//! this program saved can be loaded to render it again.  Other formats
//! are written through `image` and carry pixels only.

use crate::error::{RenderError, Result};
use crate::session::Frame;
use image::ColorType;
use log::info;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// The `tEXt` keyword the parameter text is stored under.
pub const PARAMETERS_KEY: &str = "de_jong_params";

fn is_png(path: &Path) -> bool {
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) => ext.eq_ignore_ascii_case("png"),
        None => true,
    }
}

fn write_png(path: &Path, frame: &Frame, parameters: &str) -> Result<()> {
    let output = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(output, frame.width as u32, frame.height as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder
        .add_text_chunk(PARAMETERS_KEY.to_string(), parameters.to_string())
        .map_err(|e| RenderError::Encoding(e.to_string()))?;
    let mut writer = encoder
        .write_header()
        .map_err(|e| RenderError::Encoding(e.to_string()))?;
    writer
        .write_image_data(&frame.rgba_bytes())
        .map_err(|e| RenderError::Encoding(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| RenderError::Encoding(e.to_string()))?;
    Ok(())
}

fn write_other(path: &Path, frame: &Frame) -> Result<()> {
    // Every pixel is opaque, so nothing is lost by dropping alpha, and
    // every format can take RGB.
    let rgb: Vec<u8> = frame
        .rgba_bytes()
        .chunks(4)
        .flat_map(|p| p[..3].to_vec())
        .collect();
    image::save_buffer(
        path,
        &rgb,
        frame.width as u32,
        frame.height as u32,
        ColorType::RGB(8),
    )?;
    Ok(())
}

/// Writes a frame.  PNG (or no extension) embeds the parameter text;
/// any other extension `image` knows is written without it.
pub fn save_image<P: AsRef<Path>>(path: P, frame: &Frame, parameters: &str) -> Result<()> {
    let path = path.as_ref();
    if is_png(path) {
        write_png(path, frame, parameters)?;
    } else {
        write_other(path, frame)?;
    }
    info!("wrote {}x{} image to {}", frame.width, frame.height, path.display());
    Ok(())
}

/// The parameter text embedded in a PNG this program wrote.
pub fn load_parameter_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let decoder = png::Decoder::new(File::open(path)?);
    let reader = decoder
        .read_info()
        .map_err(|e| RenderError::Decoding(e.to_string()))?;
    reader
        .info()
        .uncompressed_latin1_text
        .iter()
        .find(|chunk| chunk.keyword == PARAMETERS_KEY)
        .map(|chunk| chunk.text.clone())
        .ok_or_else(|| RenderError::MissingParameters(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn frame() -> Frame {
        Frame {
            width: 3,
            height: 2,
            pixels: vec![0xFF00_00FF, 0xFF00_FF00, 0xFFFF_0000, 0xFFFF_FFFF, 0xFF00_0000, 0xFF80_8080],
            iterations: 0.0,
            current_density: 0,
            status: String::new(),
        }
    }

    #[test]
    fn png_carries_the_parameters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        save_image(&path, &frame(), "a = 1.000000\n").unwrap();
        assert_eq!(load_parameter_text(&path).unwrap(), "a = 1.000000\n");
    }

    #[test]
    fn png_pixels_are_rgba() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");
        save_image(&path, &frame(), "").unwrap();
        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        reader.next_frame(&mut buf).unwrap();
        assert_eq!(&buf[..8], &[0xFF, 0, 0, 0xFF, 0, 0xFF, 0, 0xFF]);
        assert_eq!(buf.len(), 3 * 2 * 4);
    }

    #[test]
    fn other_formats_skip_the_parameters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bmp");
        save_image(&path, &frame(), "a = 1.000000\n").unwrap();
        assert!(path.exists());
        assert!(load_parameter_text(&path).is_err());
    }

    #[test]
    fn missing_chunk_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.png");
        let file = BufWriter::new(File::create(&path).unwrap());
        let mut encoder = png::Encoder::new(file, 1, 1);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[0, 0, 0, 255]).unwrap();
        writer.finish().unwrap();
        match load_parameter_text(&path) {
            Err(RenderError::MissingParameters(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.png");
        match save_image(&path, &frame(), "") {
            Err(RenderError::Io(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
