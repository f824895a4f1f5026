// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use assert_cmd::prelude::*;
use dejong::{codec, output, ParameterSet};
use predicates::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::process::Command;
use tempfile::tempdir;

fn dejong() -> Command {
    Command::cargo_bin("dejong").unwrap()
}

#[test]
fn renders_and_embeds_the_parameters() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.png");
    dejong()
        .args(&["-s", "32", "-t", "5", "--seed", "1", "-a", "-2.5", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Creating image..."));

    let (set, issues) = codec::deserialize(&output::load_parameter_text(&out).unwrap());
    assert!(issues.is_empty());
    assert_eq!(set.attractor.a, -2.5);
}

#[test]
fn rerenders_from_a_saved_image() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.png");
    let second = dir.path().join("second.png");
    dejong()
        .args(&["-s", "24x16", "-t", "3", "--seed", "2", "--gamma", "2", "-o"])
        .arg(&first)
        .assert()
        .success();
    dejong()
        .args(&["-s", "24x16", "-t", "3", "--seed", "2", "-e", "0.5", "-i"])
        .arg(&first)
        .arg("-o")
        .arg(&second)
        .assert()
        .success();

    let (set, _) = codec::deserialize(&output::load_parameter_text(&second).unwrap());
    assert_eq!(set.render.gamma, 2.0);
    assert_eq!(set.render.exposure, 0.5);
}

#[test]
fn rejects_a_bad_size() {
    let dir = tempdir().unwrap();
    dejong()
        .args(&["-s", "0x10", "-o"])
        .arg(dir.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("size"));
}

#[test]
fn needs_an_output_or_a_preview() {
    dejong().args(&["-s", "32"]).assert().failure();
}

#[test]
fn input_without_parameters_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("plain.png");
    let file = BufWriter::new(File::create(&plain).unwrap());
    let mut encoder = png::Encoder::new(file, 1, 1);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&[0, 0, 0, 255]).unwrap();
    writer.finish().unwrap();

    let out = dir.path().join("out.png");
    dejong()
        .env("RUST_LOG", "warn")
        .args(&["-s", "16", "-t", "2", "--seed", "4", "-b", "-1.5", "-i"])
        .arg(&plain)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("no parameters chunk found"));

    let (set, _) = codec::deserialize(&output::load_parameter_text(&out).unwrap());
    let defaults = ParameterSet::default();
    assert!((set.attractor.a - defaults.attractor.a).abs() < 1e-6);
    assert_eq!(set.attractor.b, -1.5);
}

#[test]
fn unreadable_input_is_fatal() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("plain.bmp");
    std::fs::write(&plain, b"not a png").unwrap();
    dejong()
        .args(&["-s", "16", "-i"])
        .arg(&plain)
        .arg("-o")
        .arg(dir.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failure"));
}
