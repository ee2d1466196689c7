// src/photo/options.rs

//! Option flags shared by the photo subcommands (`copy`, `data`, `get`,
//! `put`, `read`, `transparency`, `write`).
//!
//! Every subcommand accepts a subset of the same flags. `SubcommandOptions`
//! parses an argument list against the allowed subset; option names may be
//! abbreviated to any unique prefix.

use crate::format::{FormatSpec, Metadata};
use crate::image::color::Rgb;
use crate::image::compositor::{CompositingRule, Scale};
use crate::image::geom::Rect;
use crate::utils::error::{PhotoError, Result};
use crate::utils::list::{merge_list, split_list};
use std::ops::BitOr;

/// A set of subcommand option flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OptionSet(u16);

impl OptionSet {
    pub const EMPTY: OptionSet = OptionSet(0);
    pub const ALPHA: OptionSet = OptionSet(1 << 0);
    pub const BACKGROUND: OptionSet = OptionSet(1 << 1);
    pub const COMPOSITE: OptionSet = OptionSet(1 << 2);
    pub const FORMAT: OptionSet = OptionSet(1 << 3);
    pub const FROM: OptionSet = OptionSet(1 << 4);
    pub const GRAYSCALE: OptionSet = OptionSet(1 << 5);
    pub const METADATA: OptionSet = OptionSet(1 << 6);
    pub const SHRINK: OptionSet = OptionSet(1 << 7);
    pub const SUBSAMPLE: OptionSet = OptionSet(1 << 8);
    pub const TO: OptionSet = OptionSet(1 << 9);
    pub const WITHALPHA: OptionSet = OptionSet(1 << 10);
    pub const ZOOM: OptionSet = OptionSet(1 << 11);

    pub const COPY: OptionSet = Self::COMPOSITE
        .union(Self::FROM)
        .union(Self::SHRINK)
        .union(Self::SUBSAMPLE)
        .union(Self::TO)
        .union(Self::ZOOM);
    pub const DATA: OptionSet = Self::BACKGROUND
        .union(Self::FORMAT)
        .union(Self::FROM)
        .union(Self::GRAYSCALE)
        .union(Self::METADATA);
    pub const GET: OptionSet = Self::WITHALPHA;
    pub const PUT: OptionSet = Self::COMPOSITE
        .union(Self::FORMAT)
        .union(Self::METADATA)
        .union(Self::TO);
    pub const READ: OptionSet = Self::FORMAT
        .union(Self::FROM)
        .union(Self::METADATA)
        .union(Self::SHRINK)
        .union(Self::TO);
    pub const TRANSPARENCY: OptionSet = Self::ALPHA;
    pub const WRITE: OptionSet = Self::DATA;

    pub const fn union(self, other: OptionSet) -> OptionSet {
        OptionSet(self.0 | other.0)
    }

    pub fn contains(self, other: OptionSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: OptionSet) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for OptionSet {
    type Output = OptionSet;

    fn bitor(self, rhs: OptionSet) -> OptionSet {
        self.union(rhs)
    }
}

const OPTION_NAMES: [(&str, OptionSet); 12] = [
    ("-alpha", OptionSet::ALPHA),
    ("-background", OptionSet::BACKGROUND),
    ("-compositingrule", OptionSet::COMPOSITE),
    ("-format", OptionSet::FORMAT),
    ("-from", OptionSet::FROM),
    ("-grayscale", OptionSet::GRAYSCALE),
    ("-metadata", OptionSet::METADATA),
    ("-shrink", OptionSet::SHRINK),
    ("-subsample", OptionSet::SUBSAMPLE),
    ("-to", OptionSet::TO),
    ("-withalpha", OptionSet::WITHALPHA),
    ("-zoom", OptionSet::ZOOM),
];

/// Resolves `word` against `names`, accepting an exact match or a unique
/// prefix.
pub(crate) fn lookup<'n, T: Copy>(word: &str, names: &'n [(&'n str, T)]) -> Option<(&'n str, T)> {
    if let Some(&exact) = names.iter().find(|(name, _)| *name == word) {
        return Some(exact);
    }
    if word.len() < 2 {
        return None;
    }
    let mut candidates = names.iter().filter(|(name, _)| name.starts_with(word));
    match (candidates.next(), candidates.next()) {
        (Some(&only), None) => Some(only),
        _ => None,
    }
}

/// A `-from` or `-to` value: a point, or a rectangle given by two corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coords {
    Point(u32, u32),
    Area(Rect),
}

impl Coords {
    /// The top-left corner.
    pub fn origin(&self) -> (u32, u32) {
        match *self {
            Coords::Point(x, y) => (x, y),
            Coords::Area(r) => (r.x as u32, r.y as u32),
        }
    }
}

/// Parsed options of one subcommand invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SubcommandOptions {
    /// Flags that were given.
    pub present: OptionSet,
    /// The single non-option word (file name or data), if any.
    pub name: Option<String>,
    pub format: Option<FormatSpec>,
    pub metadata: Option<Metadata>,
    pub from: Option<Coords>,
    pub to: Option<Coords>,
    pub zoom: (i32, i32),
    pub subsample: (i32, i32),
    pub background: Option<Rgb>,
    pub compositing_rule: CompositingRule,
}

impl Default for SubcommandOptions {
    fn default() -> Self {
        SubcommandOptions {
            present: OptionSet::EMPTY,
            name: None,
            format: None,
            metadata: None,
            from: None,
            to: None,
            zoom: (1, 1),
            subsample: (1, 1),
            background: None,
            compositing_rule: CompositingRule::Overlay,
        }
    }
}

impl SubcommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `args`, rejecting any flag outside `allowed`.
    pub fn parse<S: AsRef<str>>(args: &[S], allowed: OptionSet) -> Result<Self> {
        let mut options = SubcommandOptions::new();
        let mut i = 0;
        while i < args.len() {
            let word = args[i].as_ref();
            i += 1;

            if !word.starts_with('-') {
                if options.name.is_some() {
                    return Err(PhotoError::BadOption(word.to_string()));
                }
                options.name = Some(word.to_string());
                continue;
            }

            let Some((flag_name, flag)) = lookup(word, &OPTION_NAMES) else {
                return Err(PhotoError::BadOption(word.to_string()));
            };
            if !allowed.contains(flag) {
                return Err(PhotoError::BadOption(word.to_string()));
            }
            options.present.insert(flag);

            match flag {
                OptionSet::ALPHA
                | OptionSet::GRAYSCALE
                | OptionSet::SHRINK
                | OptionSet::WITHALPHA => {}
                OptionSet::FROM | OptionSet::TO => {
                    let values = take_integers(args, &mut i, 4);
                    let coords = coords(flag_name, &values)?;
                    if flag == OptionSet::FROM {
                        options.from = Some(coords);
                    } else {
                        options.to = Some(coords);
                    }
                }
                OptionSet::ZOOM | OptionSet::SUBSAMPLE => {
                    let values = take_integers(args, &mut i, 2);
                    let (x, y) = match values.as_slice() {
                        [] => return Err(PhotoError::MissingValue(flag_name.to_string())),
                        [v] => (*v, *v),
                        [x, y, ..] => (*x, *y),
                    };
                    if flag == OptionSet::ZOOM {
                        if x <= 0 || y <= 0 {
                            return Err(PhotoError::bad_value(
                                "value(s) for the -zoom option must be positive",
                            ));
                        }
                        options.zoom = (x, y);
                    } else {
                        options.subsample = (x, y);
                    }
                }
                _ => {
                    let value = args
                        .get(i)
                        .map(|v| v.as_ref())
                        .ok_or_else(|| PhotoError::MissingValue(flag_name.to_string()))?;
                    i += 1;
                    match flag {
                        OptionSet::BACKGROUND => {
                            options.background = if value.is_empty() {
                                None
                            } else {
                                Some(Rgb::parse(value)?)
                            };
                        }
                        OptionSet::COMPOSITE => options.compositing_rule = value.parse()?,
                        OptionSet::FORMAT => {
                            options.format = if value.is_empty() {
                                None
                            } else {
                                Some(FormatSpec::parse(value)?)
                            };
                        }
                        _ => options.metadata = Some(parse_metadata(value)?),
                    }
                }
            }
        }
        Ok(options)
    }

    pub fn has(&self, flag: OptionSet) -> bool {
        self.present.contains(flag)
    }

    /// Zoom and subsample factors as a `Scale`.
    pub fn scale(&self) -> Scale {
        Scale::new(self.zoom.0, self.zoom.1, self.subsample.0, self.subsample.1)
    }

    pub fn with_from(mut self, from: Coords) -> Self {
        self.from = Some(from);
        self.present.insert(OptionSet::FROM);
        self
    }

    pub fn with_to(mut self, to: Coords) -> Self {
        self.to = Some(to);
        self.present.insert(OptionSet::TO);
        self
    }

    pub fn with_zoom(mut self, x: i32, y: i32) -> Self {
        self.zoom = (x, y);
        self.present.insert(OptionSet::ZOOM);
        self
    }

    pub fn with_subsample(mut self, x: i32, y: i32) -> Self {
        self.subsample = (x, y);
        self.present.insert(OptionSet::SUBSAMPLE);
        self
    }

    pub fn with_compositing_rule(mut self, rule: CompositingRule) -> Self {
        self.compositing_rule = rule;
        self.present.insert(OptionSet::COMPOSITE);
        self
    }

    pub fn with_format(mut self, format: FormatSpec) -> Self {
        self.format = Some(format);
        self.present.insert(OptionSet::FORMAT);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self.present.insert(OptionSet::METADATA);
        self
    }

    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = Some(background);
        self.present.insert(OptionSet::BACKGROUND);
        self
    }

    pub fn with_grayscale(mut self) -> Self {
        self.present.insert(OptionSet::GRAYSCALE);
        self
    }

    pub fn with_shrink(mut self) -> Self {
        self.present.insert(OptionSet::SHRINK);
        self
    }
}

/// Consumes up to `max` integer arguments starting at `*i`.
fn take_integers<S: AsRef<str>>(args: &[S], i: &mut usize, max: usize) -> Vec<i32> {
    let mut values = Vec::new();
    while values.len() < max {
        match args.get(*i).and_then(|a| a.as_ref().parse::<i32>().ok()) {
            Some(v) => {
                values.push(v);
                *i += 1;
            }
            None => break,
        }
    }
    values
}

fn coords(flag_name: &str, values: &[i32]) -> Result<Coords> {
    if values.iter().any(|&v| v < 0) {
        return Err(PhotoError::bad_value(format!(
            "value(s) for the {} option must be non-negative",
            flag_name
        )));
    }
    match *values {
        [] => Err(PhotoError::MissingValue(flag_name.to_string())),
        [v] => Ok(Coords::Point(v as u32, v as u32)),
        [x, y] => Ok(Coords::Point(x as u32, y as u32)),
        [x1, y1, x2, y2] => Ok(Coords::Area(Rect::from_corners(x1, y1, x2, y2))),
        _ => Err(PhotoError::bad_value(format!(
            "the {} option needs one, two or four values",
            flag_name
        ))),
    }
}

/// Parses a `key value ?key value ...?` list.
pub fn parse_metadata(text: &str) -> Result<Metadata> {
    let words = split_list(text)?;
    if words.len() % 2 != 0 {
        return Err(PhotoError::bad_value(format!(
            "missing value to go with key in metadata \"{}\"",
            text
        )));
    }
    Ok(words
        .chunks_exact(2)
        .map(|kv| (kv[0].clone(), kv[1].clone()))
        .collect())
}

/// Formats metadata as a `key value ...` list.
pub fn format_metadata(metadata: &Metadata) -> String {
    let words: Vec<&str> = metadata
        .iter()
        .flat_map(|(k, v)| [k.as_str(), v.as_str()])
        .collect();
    merge_list(&words)
}
