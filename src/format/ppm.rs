// src/format/ppm.rs

//! Binary PPM (`P6`) and PGM (`P5`) images, from files or in-memory data.
//!
//! Samples are one byte when the maximum value is at most 255 and two
//! big-endian bytes otherwise; either way they are rescaled to 0..=255.

use super::{Capabilities, FormatRequest, ImageSource, Metadata, PhotoFormat, ReadRegion};
use crate::image::block::PhotoBlock;
use crate::image::compositor::CompositingRule;
use crate::image::pixel_buffer::try_zeroed;
use crate::photo::model::PhotoModel;
use crate::utils::error::{PhotoError, Result};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use std::io::{self, Read, Write};

const NAME: &str = "ppm";

/// The built-in PPM/PGM handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct PpmFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PnmHeader {
    gray: bool,
    width: u32,
    height: u32,
    max_value: u32,
}

impl PnmHeader {
    fn samples(&self) -> usize {
        if self.gray { 1 } else { 3 }
    }

    fn sample_bytes(&self) -> usize {
        if self.max_value > 255 { 2 } else { 1 }
    }

    fn row_bytes(&self) -> usize {
        self.width as usize * self.samples() * self.sample_bytes()
    }

    fn sample(&self, raw: &[u8], index: usize) -> u8 {
        let value = match self.sample_bytes() {
            2 => BigEndian::read_u16(&raw[index * 2..]) as u32,
            _ => raw[index] as u32,
        };
        if self.max_value == 255 {
            value as u8
        } else {
            (value.min(self.max_value) * 255 / self.max_value) as u8
        }
    }
}

fn next_byte<R: Read + ?Sized>(r: &mut R) -> Result<Option<u8>> {
    match r.read_u8() {
        Ok(b) => Ok(Some(b)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn skip_comment<R: Read + ?Sized>(r: &mut R) -> Result<()> {
    while let Some(b) = next_byte(r)? {
        if b == b'\n' || b == b'\r' {
            break;
        }
    }
    Ok(())
}

/// Reads one decimal header field together with the byte that ends it.
/// `Ok(None)` means the bytes do not form a valid field.
fn read_field<R: Read + ?Sized>(r: &mut R, last: bool) -> Result<Option<u32>> {
    let mut b = loop {
        match next_byte(r)? {
            Some(b'#') => skip_comment(r)?,
            Some(b) if b.is_ascii_whitespace() => {}
            Some(b) => break b,
            None => return Ok(None),
        }
    };

    let mut value: u32 = 0;
    let mut digits = 0;
    loop {
        if !b.is_ascii_digit() {
            break;
        }
        value = match value.checked_mul(10).and_then(|v| v.checked_add((b - b'0') as u32)) {
            Some(v) => v,
            None => return Ok(None),
        };
        digits += 1;
        b = match next_byte(r)? {
            Some(b) => b,
            None => return Ok(None),
        };
    }

    match b {
        _ if digits == 0 => Ok(None),
        b if b.is_ascii_whitespace() => Ok(Some(value)),
        b'#' if !last => {
            skip_comment(r)?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}

fn read_header<R: Read + ?Sized>(r: &mut R) -> Result<Option<PnmHeader>> {
    let mut magic = [0u8; 2];
    for byte in magic.iter_mut() {
        match next_byte(r)? {
            Some(b) => *byte = b,
            None => return Ok(None),
        }
    }
    let gray = match &magic {
        b"P5" => true,
        b"P6" => false,
        _ => return Ok(None),
    };

    let Some(width) = read_field(r, false)? else {
        return Ok(None);
    };
    let Some(height) = read_field(r, false)? else {
        return Ok(None);
    };
    let Some(max_value) = read_field(r, true)? else {
        return Ok(None);
    };
    if width == 0 || height == 0 || max_value == 0 || max_value > 65535 {
        return Ok(None);
    }
    Ok(Some(PnmHeader {
        gray,
        width,
        height,
        max_value,
    }))
}

fn decode<R: Read + ?Sized>(r: &mut R, image: &mut PhotoModel, region: ReadRegion) -> Result<()> {
    let header = read_header(r)?
        .ok_or_else(|| PhotoError::codec(NAME, "couldn't read raw PPM header"))?;

    let width = region.width.min(header.width.saturating_sub(region.src_x));
    let height = region.height.min(header.height.saturating_sub(region.src_y));
    if width == 0 || height == 0 {
        return Ok(());
    }
    image.expand(
        region.dest_x.saturating_add(width),
        region.dest_y.saturating_add(height),
    )?;

    let row_bytes = header.row_bytes();
    let skip = region.src_y as u64 * row_bytes as u64;
    let skipped = io::copy(&mut (&mut *r).take(skip), &mut io::sink())?;
    if skipped != skip {
        return Err(PhotoError::codec(NAME, "error reading PPM image file data"));
    }

    let samples = header.samples();
    let mut raw = try_zeroed(row_bytes)?;
    let mut pixels = try_zeroed(width as usize * height as usize * samples)?;
    for line in pixels.chunks_exact_mut(width as usize * samples) {
        r.read_exact(&mut raw)
            .map_err(|e| PhotoError::codec(NAME, format!("error reading PPM image file data: {}", e)))?;
        let first = region.src_x as usize * samples;
        for (i, out) in line.iter_mut().enumerate() {
            *out = header.sample(&raw, first + i);
        }
    }

    let block = if header.gray {
        PhotoBlock::gray(pixels, width, height)
    } else {
        PhotoBlock::rgb(pixels, width, height)
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

fn encode(out: &mut dyn Write, block: &PhotoBlock<'_>) -> Result<()> {
    let gray = !block.is_color();
    write!(
        out,
        "{}\n{} {}\n255\n",
        if gray { "P5" } else { "P6" },
        block.width,
        block.height
    )?;
    let mut row = Vec::with_capacity(block.width as usize * if gray { 1 } else { 3 });
    for y in 0..block.height {
        row.clear();
        for x in 0..block.width {
            let [r, g, b, _] = block.rgba_at(x, y);
            if gray {
                row.push(r);
            } else {
                row.extend_from_slice(&[r, g, b]);
            }
        }
        out.write_all(&row)?;
    }
    Ok(())
}

impl PhotoFormat for PpmFormat {
    fn name(&self) -> &str {
        NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn file_match(
        &self,
        source: &mut dyn ImageSource,
        _request: &FormatRequest<'_>,
        _metadata_out: &mut Metadata,
    ) -> Result<Option<(u32, u32)>> {
        Ok(read_header(source)?.map(|h| (h.width, h.height)))
    }

    fn file_read(
        &self,
        source: &mut dyn ImageSource,
        _request: &FormatRequest<'_>,
        image: &mut PhotoModel,
        region: ReadRegion,
        _metadata_out: &mut Metadata,
    ) -> Result<()> {
        decode(source, image, region)
    }

    fn file_write(
        &self,
        out: &mut dyn Write,
        _request: &FormatRequest<'_>,
        block: &PhotoBlock<'_>,
    ) -> Result<()> {
        encode(out, block)
    }

    fn string_match(
        &self,
        data: &[u8],
        _request: &FormatRequest<'_>,
        _metadata_out: &mut Metadata,
    ) -> Result<Option<(u32, u32)>> {
        Ok(read_header(&mut &data[..])?.map(|h| (h.width, h.height)))
    }

    fn string_read(
        &self,
        data: &[u8],
        _request: &FormatRequest<'_>,
        image: &mut PhotoModel,
        region: ReadRegion,
        _metadata_out: &mut Metadata,
    ) -> Result<()> {
        decode(&mut &data[..], image, region)
    }

    fn string_write(&self, _request: &FormatRequest<'_>, block: &PhotoBlock<'_>) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        encode(&mut out, block)?;
        Ok(out)
    }
}
