// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parameter text: one `key = value` line per parameter, readable
//! by people and by this module.  It is embedded in every saved image,
//! so loading it back reproduces the render.
//!
//! Loading is lenient.  A line that can't be used is reported and
//! skipped, and every good line still applies, so a partially
//! understood file loads partially.

use crate::params::{Color, ParameterSet};
use log::{debug, warn};
use std::fmt;
use std::fmt::Write;
use std::str::FromStr;

/// A line of parameter text that was not applied.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadIssue {
    /// Not of the form `key = value`.
    Malformed { line: usize, text: String },
    /// A well-formed line naming no parameter we know.
    UnknownKey { line: usize, key: String },
    /// A known parameter whose value did not parse.
    BadValue {
        line: usize,
        key: String,
        value: String,
    },
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadIssue::Malformed { line, text } => {
                write!(f, "line {}: expected \"key = value\", got \"{}\"", line, text)
            }
            LoadIssue::UnknownKey { line, key } => {
                write!(f, "line {}: {} (unrecognized)", line, key)
            }
            LoadIssue::BadValue { line, key, value } => {
                write!(f, "line {}: could not use \"{}\" for {}", line, value, key)
            }
        }
    }
}

/// Writes every parameter, numbers to six decimal places.
pub fn serialize(set: &ParameterSet) -> String {
    let p = &set.attractor;
    let r = &set.render;
    let mut text = String::new();
    for (key, value) in &[
        ("a", p.a),
        ("b", p.b),
        ("c", p.c),
        ("d", p.d),
        ("zoom", p.zoom),
        ("xoffset", p.xoffset),
        ("yoffset", p.yoffset),
        ("rotation", p.rotation),
        ("blur_radius", p.blur_radius),
        ("blur_ratio", p.blur_ratio),
        ("exposure", r.exposure),
        ("gamma", r.gamma),
    ] {
        // Writing to a String cannot fail.
        let _ = writeln!(text, "{} = {:.6}", key, value);
    }
    let _ = writeln!(text, "bgcolor = {}", r.bgcolor);
    let _ = writeln!(text, "fgcolor = {}", r.fgcolor);
    text
}

/// Splits a line into its key and value, or nothing if it isn't of
/// the form `key = value`.  Both sides are single words.
fn split_line(line: &str) -> Option<(&str, &str)> {
    let index = line.find('=')?;
    let key = line[..index].trim();
    let value = line[index + 1..].trim();
    let single = |s: &str| !s.is_empty() && !s.contains(char::is_whitespace);
    if single(key) && single(value) {
        Some((key, value))
    } else {
        None
    }
}

enum Applied {
    Done,
    Unknown,
    Unparsed,
}

fn set_real(slot: &mut f64, value: &str) -> Applied {
    match f64::from_str(value) {
        Ok(v) if v.is_finite() => {
            *slot = v;
            Applied::Done
        }
        _ => Applied::Unparsed,
    }
}

fn set_color(slot: &mut Color, value: &str) -> Applied {
    match Color::from_str(value) {
        Ok(c) => {
            *slot = c;
            Applied::Done
        }
        Err(_) => Applied::Unparsed,
    }
}

fn set_parameter(set: &mut ParameterSet, key: &str, value: &str) -> Applied {
    let p = &mut set.attractor;
    let r = &mut set.render;
    match key {
        "a" => set_real(&mut p.a, value),
        "b" => set_real(&mut p.b, value),
        "c" => set_real(&mut p.c, value),
        "d" => set_real(&mut p.d, value),
        "zoom" => set_real(&mut p.zoom, value),
        "xoffset" => set_real(&mut p.xoffset, value),
        "yoffset" => set_real(&mut p.yoffset, value),
        "rotation" => set_real(&mut p.rotation, value),
        "blur_radius" => set_real(&mut p.blur_radius, value),
        "blur_ratio" => set_real(&mut p.blur_ratio, value),
        "exposure" => set_real(&mut r.exposure, value),
        "gamma" => set_real(&mut r.gamma, value),
        "fgcolor" => set_color(&mut r.fgcolor, value),
        "bgcolor" => set_color(&mut r.bgcolor, value),
        _ => Applied::Unknown,
    }
}

/// Applies every usable line of `text` to `set`, returning what could
/// not be used.  Blank lines are ignored.
pub fn apply(set: &mut ParameterSet, text: &str) -> Vec<LoadIssue> {
    let mut issues = vec![];
    for (number, line) in text.lines().enumerate() {
        let number = number + 1;
        if line.trim().is_empty() {
            continue;
        }
        let issue = match split_line(line) {
            None => Some(LoadIssue::Malformed {
                line: number,
                text: line.to_string(),
            }),
            Some((key, value)) => match set_parameter(set, key, value) {
                Applied::Done => {
                    debug!("{} = {}", key, value);
                    None
                }
                Applied::Unknown => Some(LoadIssue::UnknownKey {
                    line: number,
                    key: key.to_string(),
                }),
                Applied::Unparsed => Some(LoadIssue::BadValue {
                    line: number,
                    key: key.to_string(),
                    value: value.to_string(),
                }),
            },
        };
        if let Some(issue) = issue {
            warn!("{}", issue);
            issues.push(issue);
        }
    }
    issues
}

/// Reads a parameter set, starting from the defaults for anything the
/// text leaves out.
pub fn deserialize(text: &str) -> (ParameterSet, Vec<LoadIssue>) {
    let mut set = ParameterSet::default();
    let issues = apply(&mut set, text);
    (set, issues)
}
