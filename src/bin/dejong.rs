// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, AppSettings, Arg, ArgGroup, ArgMatches};
use dejong::codec;
use dejong::output;
use dejong::{
    parse_size, BatchProgress, Color, Controller, Frame, Observer, ParameterSet, RenderError,
    Session, Variates,
};
use env_logger::Env;
use log::warn;
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

fn validate_size(s: &str) -> Result<(), String> {
    parse_size(s).map(|_| ()).map_err(|e| e.to_string())
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_real(s: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(v) if v.is_finite() => Ok(()),
        _ => Err(format!("\"{}\" is not a number", s)),
    }
}

fn validate_color(s: &str) -> Result<(), String> {
    Color::from_str(s).map(|_| ()).map_err(|e| e.to_string())
}

const OUTPUT: &str = "output";
const PREVIEW: &str = "preview";
const DURATION: &str = "duration";
const INPUT: &str = "input";
const SIZE: &str = "size";
const DENSITY: &str = "density";
const A: &str = "a";
const B: &str = "b";
const C: &str = "c";
const D: &str = "d";
const XOFFSET: &str = "xoffset";
const YOFFSET: &str = "yoffset";
const ZOOM: &str = "zoom";
const ROTATION: &str = "rotation";
const BLUR_RADIUS: &str = "blur-radius";
const BLUR_RATIO: &str = "blur-ratio";
const EXPOSURE: &str = "exposure";
const GAMMA: &str = "gamma";
const FGCOLOR: &str = "fgcolor";
const BGCOLOR: &str = "bgcolor";
const RANDOM: &str = "random";
const SEED: &str = "seed";

fn real_arg(name: &'static str, short: Option<&'static str>, help: &'static str) -> Arg<'static, 'static> {
    let arg = Arg::with_name(name)
        .long(name)
        .takes_value(true)
        .validator(|s| validate_real(&s))
        .help(help);
    match short {
        Some(short) => arg.short(short),
        None => arg,
    }
}

fn args() -> ArgMatches<'static> {
    App::new("dejong")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Progressive Peter de Jong attractor renderer")
        .setting(AppSettings::AllowNegativeNumbers)
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Render until the target density, then write the image to FILE"),
        )
        .arg(
            Arg::with_name(PREVIEW)
                .long(PREVIEW)
                .short("p")
                .takes_value(true)
                .help("Refine interactively, rewriting FILE at every redraw"),
        )
        .group(ArgGroup::with_name("mode").args(&[OUTPUT, PREVIEW]).required(true))
        .arg(
            Arg::with_name(DURATION)
                .long(DURATION)
                .takes_value(true)
                .default_value("30")
                .validator(|s| {
                    validate_range(&s, 1, 86_400, "Could not parse duration", "Duration must be between 1 and 86400 seconds")
                })
                .help("Seconds to refine for in preview mode"),
        )
        .arg(
            Arg::with_name(INPUT)
                .long(INPUT)
                .short("i")
                .takes_value(true)
                .help("Load all parameters from a PNG this program wrote; other flags override them"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800")
                .validator(|s| validate_size(&s))
                .help("Image size, WIDTHxHEIGHT or a single number for a square"),
        )
        .arg(
            Arg::with_name(DENSITY)
                .long(DENSITY)
                .short("t")
                .takes_value(true)
                .default_value("10000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        u32::max_value(),
                        "Could not parse target density",
                        "Target density must be at least 1",
                    )
                })
                .help("Count density to stop rendering at; time grows linearly with it"),
        )
        .arg(real_arg(A, Some("a"), "The 'a' parameter"))
        .arg(real_arg(B, Some("b"), "The 'b' parameter"))
        .arg(real_arg(C, Some("c"), "The 'c' parameter"))
        .arg(real_arg(D, Some("d"), "The 'd' parameter"))
        .arg(real_arg(XOFFSET, Some("x"), "X offset"))
        .arg(real_arg(YOFFSET, Some("y"), "Y offset"))
        .arg(
            real_arg(ZOOM, Some("z"), "Zoom factor")
                .validator(|s| validate_range(&s, 1e-9, 1e9, "Could not parse zoom", "Zoom must be positive")),
        )
        .arg(real_arg(ROTATION, Some("r"), "Rotation in radians"))
        .arg(
            real_arg(BLUR_RADIUS, None, "Blur radius").validator(|s| {
                validate_range(&s, 0.0, 1e9, "Could not parse blur radius", "Blur radius must not be negative")
            }),
        )
        .arg(
            real_arg(BLUR_RATIO, None, "Fraction of points blurred").validator(|s| {
                validate_range(&s, 0.0, 1.0, "Could not parse blur ratio", "Blur ratio must be between 0 and 1")
            }),
        )
        .arg(
            real_arg(EXPOSURE, Some("e"), "Image exposure").validator(|s| {
                validate_range(&s, 0.0, 1e9, "Could not parse exposure", "Exposure must not be negative")
            }),
        )
        .arg(
            real_arg(GAMMA, Some("g"), "Image gamma correction")
                .validator(|s| validate_range(&s, 1e-6, 1e6, "Could not parse gamma", "Gamma must be positive")),
        )
        .arg(
            Arg::with_name(FGCOLOR)
                .long(FGCOLOR)
                .takes_value(true)
                .validator(|s| validate_color(&s))
                .help("Foreground color, #RRGGBB"),
        )
        .arg(
            Arg::with_name(BGCOLOR)
                .long(BGCOLOR)
                .takes_value(true)
                .validator(|s| validate_color(&s))
                .help("Background color, #RRGGBB"),
        )
        .arg(
            Arg::with_name(RANDOM)
                .long(RANDOM)
                .help("Pick random a, b, c and d before applying other flags"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .validator(|s| {
                    validate_range(&s, 0, u64::max_value(), "Could not parse seed", "Seed out of range")
                })
                .help("Seed the random stream, for a reproducible render"),
        )
        .get_matches()
}

fn real(matches: &ArgMatches, name: &str) -> Option<f64> {
    matches.value_of(name).and_then(|s| f64::from_str(s).ok())
}

/// Loaded parameters first, then randomness, then explicit flags.
fn parameters(matches: &ArgMatches, variates: &mut Variates) -> Result<ParameterSet, RenderError> {
    let mut set = ParameterSet::default();
    if let Some(input) = matches.value_of(INPUT) {
        match output::load_parameter_text(input) {
            Ok(text) => {
                codec::apply(&mut set, &text);
            }
            Err(RenderError::MissingParameters(path)) => {
                warn!("no parameters chunk found in {}, using defaults", path);
            }
            Err(e) => return Err(e),
        }
    }
    if matches.is_present(RANDOM) {
        set.attractor.randomize(variates);
    }

    let p = &mut set.attractor;
    for (name, slot) in vec![
        (A, &mut p.a),
        (B, &mut p.b),
        (C, &mut p.c),
        (D, &mut p.d),
        (XOFFSET, &mut p.xoffset),
        (YOFFSET, &mut p.yoffset),
        (ZOOM, &mut p.zoom),
        (ROTATION, &mut p.rotation),
        (BLUR_RADIUS, &mut p.blur_radius),
        (BLUR_RATIO, &mut p.blur_ratio),
        (EXPOSURE, &mut set.render.exposure),
        (GAMMA, &mut set.render.gamma),
    ] {
        if let Some(value) = real(matches, name) {
            *slot = value;
        }
    }
    if let Some(color) = matches.value_of(FGCOLOR) {
        set.render.fgcolor = color.parse()?;
    }
    if let Some(color) = matches.value_of(BGCOLOR) {
        set.render.bgcolor = color.parse()?;
    }
    Ok(set)
}

/// Prints batch progress the way a person waiting for it wants.
struct Console;

impl Observer for Console {
    fn refresh(&mut self, frame: &Frame) {
        println!("{}", frame.status);
    }

    fn progress(&mut self, progress: &BatchProgress) {
        if progress.elapsed.as_secs() > 0 {
            println!("{}", progress);
        }
    }
}

/// Rewrites the preview image at every redraw.
struct PreviewWriter<'a> {
    path: &'a Path,
    parameters: String,
    failure: Option<RenderError>,
}

impl<'a> Observer for PreviewWriter<'a> {
    fn refresh(&mut self, frame: &Frame) {
        println!("{}", frame.status);
        if let Err(e) = output::save_image(self.path, frame, &self.parameters) {
            self.failure = Some(e);
        }
    }
}

fn render(controller: &mut Controller, outfile: &str, density: u32) -> Result<(), RenderError> {
    controller.run_to_density(density, &mut Console);
    println!("Creating image...");
    let session = controller.session();
    let frame = session.frame(controller.status());
    output::save_image(outfile, &frame, &codec::serialize(&session.parameters()))
}

fn preview(controller: &mut Controller, outfile: &str, duration: Duration) -> Result<(), RenderError> {
    let mut writer = PreviewWriter {
        path: Path::new(outfile),
        parameters: codec::serialize(&controller.session().parameters()),
        failure: None,
    };
    let deadline = Instant::now() + duration;
    controller.start();
    while Instant::now() < deadline && controller.tick(&mut writer) {
        if let Some(e) = writer.failure.take() {
            return Err(e);
        }
    }
    controller.stop();

    // One last frame with everything that was accumulated.
    controller.redraw(&mut writer);
    match writer.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run(matches: &ArgMatches) -> Result<(), RenderError> {
    let (width, height) = parse_size(matches.value_of(SIZE).unwrap_or("800"))?;
    let mut variates = match matches.value_of(SEED).and_then(|s| u64::from_str(s).ok()) {
        Some(seed) => Variates::seeded(seed),
        None => Variates::from_entropy(),
    };
    let set = parameters(matches, &mut variates)?;
    let session = Session::new(set, width, height, variates)?;
    let mut controller = Controller::new(session);

    if let Some(outfile) = matches.value_of(OUTPUT) {
        let density = matches
            .value_of(DENSITY)
            .and_then(|s| u32::from_str(s).ok())
            .unwrap_or(10_000);
        render(&mut controller, outfile, density)
    } else if let Some(outfile) = matches.value_of(PREVIEW) {
        let seconds = matches
            .value_of(DURATION)
            .and_then(|s| u64::from_str(s).ok())
            .unwrap_or(30);
        preview(&mut controller, outfile, Duration::from_secs(seconds))
    } else {
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
