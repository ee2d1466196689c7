// src/format/list.rs

//! The `default` string format: a list of rows, each row a list of colours.
//!
//! Colours are `#rrggbb`, `#rrggbbaa` or any colour name `Rgb::parse`
//! accepts. Every row must have the same number of entries. When writing,
//! `-colorformat rgb` or `-colorformat rgba` picks the notation; without it,
//! `rgba` is used for blocks that carry alpha.

use super::{Capabilities, FormatGeneration, FormatRequest, Metadata, PhotoFormat, ReadRegion};
use crate::image::block::PhotoBlock;
use crate::image::color::parse_rgba;
use crate::image::compositor::CompositingRule;
use crate::photo::model::PhotoModel;
use crate::utils::error::{PhotoError, Result};
use crate::utils::list::{merge_list, split_list};
use std::borrow::Cow;

const NAME: &str = "default";

/// Handler for in-memory list-of-rows image data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListFormat;

/// Decoded rows, packed as RGBA.
struct Rows {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    has_alpha: bool,
    is_color: bool,
}

fn parse_rows(data: &[u8]) -> Option<Rows> {
    let text = std::str::from_utf8(data).ok()?;
    let rows = split_list(text).ok()?;
    let first = split_list(rows.first()?).ok()?;
    let width = first.len();
    if width == 0 {
        return None;
    }

    let mut pixels = Vec::with_capacity(width * rows.len() * 4);
    let (mut has_alpha, mut is_color) = (false, false);
    for row in &rows {
        let cells = split_list(row).ok()?;
        if cells.len() != width {
            return None;
        }
        for cell in &cells {
            let c = parse_rgba(cell).ok()?;
            has_alpha |= c.a != 255;
            is_color |= c.r != c.g || c.g != c.b;
            pixels.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }
    Some(Rows {
        pixels,
        width: u32::try_from(width).ok()?,
        height: u32::try_from(rows.len()).ok()?,
        has_alpha,
        is_color,
    })
}

fn color_format(request: &FormatRequest<'_>, block: &PhotoBlock<'_>) -> Result<bool> {
    match request.format.and_then(|f| f.option("-colorformat")) {
        None => Ok(block.has_alpha()),
        Some("rgb") => Ok(false),
        Some("rgba") => Ok(true),
        Some(other) => Err(PhotoError::bad_value(format!(
            "bad color format \"{}\": must be rgb or rgba",
            other
        ))),
    }
}

impl PhotoFormat for ListFormat {
    fn name(&self) -> &str {
        NAME
    }

    fn generation(&self) -> FormatGeneration {
        FormatGeneration::Metadata
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::STRING
    }

    fn string_match(
        &self,
        data: &[u8],
        _request: &FormatRequest<'_>,
        _metadata_out: &mut Metadata,
    ) -> Result<Option<(u32, u32)>> {
        Ok(parse_rows(data).map(|rows| (rows.width, rows.height)))
    }

    fn string_read(
        &self,
        data: &[u8],
        _request: &FormatRequest<'_>,
        image: &mut PhotoModel,
        region: ReadRegion,
        _metadata_out: &mut Metadata,
    ) -> Result<()> {
        let rows = parse_rows(data)
            .ok_or_else(|| PhotoError::UnrecognizedData("image data".to_string()))?;
        let width = region.width.min(rows.width.saturating_sub(region.src_x));
        let height = region.height.min(rows.height.saturating_sub(region.src_y));
        if width == 0 || height == 0 {
            return Ok(());
        }
        image.expand(
            region.dest_x.saturating_add(width),
            region.dest_y.saturating_add(height),
        )?;

        let pitch = rows.width as usize * 4;
        let start = region.src_y as usize * pitch + region.src_x as usize * 4;
        let block = PhotoBlock {
            pixels: Cow::Borrowed(&rows.pixels[start..]),
            width,
            height,
            pitch,
            pixel_size: 4,
            offset: if rows.is_color { [0, 1, 2] } else { [0, 0, 0] },
            alpha: rows.has_alpha.then_some(3),
        };
        image.put_block(
            &block,
            region.dest_x,
            region.dest_y,
            width,
            height,
            CompositingRule::Set,
        )
    }

    fn string_write(&self, request: &FormatRequest<'_>, block: &PhotoBlock<'_>) -> Result<Vec<u8>> {
        let with_alpha = color_format(request, block)?;
        let rows: Vec<String> = (0..block.height)
            .map(|y| {
                let cells: Vec<String> = (0..block.width)
                    .map(|x| {
                        let [r, g, b, a] = block.rgba_at(x, y);
                        if with_alpha {
                            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
                        } else {
                            format!("#{:02x}{:02x}{:02x}", r, g, b)
                        }
                    })
                    .collect();
                merge_list(&cells)
            })
            .collect();
        Ok(merge_list(&rows).into_bytes())
    }
}
