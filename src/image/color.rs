// src/image/color.rs

//! Pixel and colour types.
//!
//! `Rgba` is the in-memory layout of every pixel in a photo image, and is
//! `Pod` so pixel buffers can be viewed as `&[Rgba]` without copying. `Rgb`
//! is a parsed colour value (as given to `-background`), and `Palette` the
//! parsed form of the `-palette` option.

use crate::utils::error::{PhotoError, Result};
use bytemuck::{Pod, Zeroable};
use std::fmt;

/// A single RGBA pixel with 8-bit components.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 255 }
    }

    /// True when the pixel is neither fully opaque nor fully transparent.
    pub fn is_partial(&self) -> bool {
        self.a != 0 && self.a != 255
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(arr: [u8; 4]) -> Self {
        Rgba::new(arr[0], arr[1], arr[2], arr[3])
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(p: Rgba) -> Self {
        [p.r, p.g, p.b, p.a]
    }
}

/// An opaque colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("black", Rgb::new(0, 0, 0)),
    ("white", Rgb::new(255, 255, 255)),
    ("red", Rgb::new(255, 0, 0)),
    ("green", Rgb::new(0, 128, 0)),
    ("lime", Rgb::new(0, 255, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("gray", Rgb::new(128, 128, 128)),
    ("grey", Rgb::new(128, 128, 128)),
    ("orange", Rgb::new(255, 165, 0)),
    ("purple", Rgb::new(128, 0, 128)),
    ("brown", Rgb::new(165, 42, 42)),
];

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub fn is_gray(&self) -> bool {
        self.r == self.g && self.r == self.b
    }

    /// Parses `#rgb`, `#rrggbb`, `#rrrgggbbb`, `#rrrrggggbbbb` or a colour name.
    ///
    /// Components wider than 8 bits keep their most significant byte.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex_rgb(hex).ok_or_else(|| unknown_color(s));
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, c)| c)
            .ok_or_else(|| unknown_color(s))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn unknown_color(s: &str) -> PhotoError {
    PhotoError::bad_value(format!("unknown color name \"{}\"", s))
}

fn parse_hex_rgb(hex: &str) -> Option<Rgb> {
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) || hex.len() % 3 != 0 {
        return None;
    }
    let digits = hex.len() / 3;
    if digits > 4 {
        return None;
    }
    let component = |i: usize| -> Option<u8> {
        let v = u16::from_str_radix(&hex[i * digits..(i + 1) * digits], 16).ok()?;
        Some(match digits {
            1 => (v * 0x11) as u8,
            2 => v as u8,
            3 => (v >> 4) as u8,
            _ => (v >> 8) as u8,
        })
    };
    Some(Rgb::new(component(0)?, component(1)?, component(2)?))
}

/// Parses `#rrggbb` or `#rrggbbaa`; other colour syntaxes come back opaque.
pub fn parse_rgba(s: &str) -> Result<Rgba> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed.strip_prefix('#') {
        if hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let byte = |i: usize| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok();
            if let (Some(r), Some(g), Some(b), Some(a)) = (byte(0), byte(1), byte(2), byte(3)) {
                return Ok(Rgba::new(r, g, b, a));
            }
        }
    }
    let c = Rgb::parse(trimmed)?;
    Ok(Rgba::opaque(c.r, c.g, c.b))
}

/// Colour reduction requested for display through `-palette`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// Let the display choose.
    #[default]
    Default,
    /// Number of gray levels.
    Gray(u16),
    /// Number of red, green and blue levels.
    Color(u16, u16, u16),
}

impl Palette {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Palette::Default);
        }
        let bad = || PhotoError::bad_value(format!("invalid palette specification \"{}\"", s));
        let levels = s
            .split('/')
            .map(|part| part.trim().parse::<u16>().map_err(|_| bad()))
            .collect::<Result<Vec<_>>>()?;
        if levels.iter().any(|&n| !(2..=256).contains(&n)) {
            return Err(bad());
        }
        match levels.as_slice() {
            [n] => Ok(Palette::Gray(*n)),
            [r, g, b] => Ok(Palette::Color(*r, *g, *b)),
            _ => Err(bad()),
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Palette::Default => Ok(()),
            Palette::Gray(n) => write!(f, "{}", n),
            Palette::Color(r, g, b) => write!(f, "{}/{}/{}", r, g, b),
        }
    }
}
