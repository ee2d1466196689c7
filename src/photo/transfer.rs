// src/photo/transfer.rs

//! Moving pixels in and out of an image: `copy`, `read`, `write`, `data`
//! and `put`.

use crate::format::registry::request_for;
use crate::format::{FormatRegistry, Metadata, ReadRegion};
use crate::image::block::PhotoBlock;
use crate::image::compositor::{CompositingRule, subsampled_len};
use crate::image::geom::Rect;
use crate::photo::configure::keep_metadata;
use crate::photo::model::{ExportOptions, PhotoModel};
use crate::photo::options::{Coords, OptionSet, SubcommandOptions};
use crate::utils::error::{PhotoError, Result};
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

/// The source rectangle `from` selects in a `width` x `height` image.
///
/// A point extends to the far edges; anything reaching outside the image is
/// `BAD_FROM`.
fn resolve_from(from: Option<Coords>, width: u32, height: u32) -> Result<Rect> {
    let area = match from {
        None => Rect::sized(width, height),
        Some(Coords::Point(x, y)) => {
            if x > width || y > height {
                return Err(PhotoError::BadFrom);
            }
            Rect::new(x as i32, y as i32, width - x, height - y)
        }
        Some(Coords::Area(r)) => r,
    };
    if area.x_max() > width as i32 || area.y_max() > height as i32 {
        return Err(PhotoError::BadFrom);
    }
    Ok(area)
}

/// The destination rectangle `to` selects for content of the given size.
fn resolve_to(to: Option<Coords>, width: u32, height: u32) -> Rect {
    match to {
        None => Rect::sized(width, height),
        Some(Coords::Point(x, y)) => Rect::new(x as i32, y as i32, width, height),
        Some(Coords::Area(r)) => r,
    }
}

/// A view of `area` that reports gray when the image never held colour.
fn source_block(image: &PhotoModel, area: Rect) -> Result<PhotoBlock<'_>> {
    let mut block = image.view(area)?;
    if !image.is_color() {
        block.offset = [0, 0, 0];
    }
    Ok(block)
}

impl PhotoModel {
    /// Copies a region of `source` into this image (the `copy` subcommand).
    pub fn copy_from(&mut self, source: &PhotoModel, options: &SubcommandOptions) -> Result<()> {
        let from = resolve_from(options.from, source.width(), source.height())?;
        let block = source_block(source, from)?;
        self.copy_block(&block, options)
    }

    /// Copies a region of this image onto itself.
    ///
    /// The source pixels are snapshotted first, so overlapping source and
    /// destination rectangles behave as if the copy went through a
    /// temporary image.
    pub fn copy_within(&mut self, options: &SubcommandOptions) -> Result<()> {
        let from = resolve_from(options.from, self.width(), self.height())?;
        let block = source_block(self, from)?.into_owned();
        debug!("copying {:?} within the image through a snapshot", from);
        self.copy_block(&block, options)
    }

    fn copy_block(&mut self, block: &PhotoBlock<'_>, options: &SubcommandOptions) -> Result<()> {
        let scale = options.scale();
        if scale.zoom_x <= 0 || scale.zoom_y <= 0 {
            return Ok(());
        }
        let to = resolve_to(
            options.to,
            subsampled_len(block.width, scale.subsample_x).saturating_mul(scale.zoom_x as u32),
            subsampled_len(block.height, scale.subsample_y).saturating_mul(scale.zoom_y as u32),
        );
        let (x, y) = (to.x as u32, to.y as u32);
        self.put_zoomed_block(block, x, y, to.width, to.height, scale, options.compositing_rule)?;

        // A zero subsample samples nothing, so there is no result to shrink to.
        if options.has(OptionSet::SHRINK) && scale.subsample_x != 0 && scale.subsample_y != 0 {
            self.set_size(x.saturating_add(to.width), y.saturating_add(to.height))?;
        }
        Ok(())
    }

    /// Reads an image file into this image (the `read` subcommand).
    ///
    /// `-from` selects part of the file, `-to` the point it lands at, and
    /// `-shrink` sets the image to exactly the size of the result. The file
    /// is decoded into a scratch image first, so a failed decode leaves this
    /// image untouched.
    pub fn read_file(
        &mut self,
        registry: &FormatRegistry,
        path: &str,
        options: &SubcommandOptions,
    ) -> Result<()> {
        let (to_x, to_y) = match options.to {
            None => (0, 0),
            Some(Coords::Point(x, y)) => (x, y),
            Some(Coords::Area(_)) => {
                return Err(PhotoError::bad_value(
                    "the -to option of read takes only a point",
                ))
            }
        };

        let mut reader = BufReader::new(File::open(path)?);
        let format = options.format.as_ref();
        let metadata = options.metadata.as_ref();
        let matched = registry.match_file(&mut reader, path, format, metadata)?;
        let from = resolve_from(options.from, matched.width, matched.height)?;
        if from.is_empty() {
            return Ok(());
        }

        let request = request_for(matched.format, path, format, metadata);
        let mut produced = matched.metadata;
        let mut scratch = PhotoModel::new();
        scratch.resize_storage(from.width, from.height)?;
        matched.format.file_read(
            &mut reader,
            &request,
            &mut scratch,
            ReadRegion {
                dest_x: 0,
                dest_y: 0,
                width: from.width,
                height: from.height,
                src_x: from.x as u32,
                src_y: from.y as u32,
            },
            &mut produced,
        )?;
        debug!("read {:?} of \"{}\" as {}", from, path, matched.format.name());

        if options.has(OptionSet::SHRINK) {
            self.set_size(to_x.saturating_add(from.width), to_y.saturating_add(from.height))?;
        }
        let block = source_block(&scratch, scratch.buffer.bounds())?;
        self.put_block(&block, to_x, to_y, from.width, from.height, CompositingRule::Set)?;
        self.metadata
            .append(&mut keep_metadata(matched.format.generation(), produced));
        Ok(())
    }

    /// Writes this image to a file (the `write` subcommand).
    pub fn write_file(
        &self,
        registry: &FormatRegistry,
        path: &str,
        options: &SubcommandOptions,
    ) -> Result<()> {
        let format = options.format.as_ref();
        let handler = registry.match_file_writer(path, format)?;
        let block = self.export(&self.export_options(options)?)?;
        let metadata = self.write_metadata(options);
        let request = request_for(handler, path, format, metadata);

        let mut out = BufWriter::new(File::create(path)?);
        handler.file_write(&mut out, &request, &block)?;
        out.flush()?;
        debug!(
            "wrote {}x{} pixels to \"{}\" as {}",
            block.width,
            block.height,
            path,
            handler.name()
        );
        Ok(())
    }

    /// Encodes this image as in-memory data (the `data` subcommand).
    pub fn encode_data(&self, registry: &FormatRegistry, options: &SubcommandOptions) -> Result<Vec<u8>> {
        let format = options.format.as_ref();
        let handler = registry.match_string_writer(format)?;
        let block = self.export(&self.export_options(options)?)?;
        let request = request_for(handler, "", format, self.write_metadata(options));
        handler.string_write(&request, &block)
    }

    /// Decodes `data` and composites it into this image (the `put`
    /// subcommand).
    ///
    /// A `-to` point places the decoded image at that point; a `-to`
    /// rectangle is filled by tiling it.
    pub fn put_data(
        &mut self,
        registry: &FormatRegistry,
        data: &[u8],
        options: &SubcommandOptions,
    ) -> Result<()> {
        let format = options.format.as_ref();
        let metadata = options.metadata.as_ref();
        let matched = registry.match_string(data, format, metadata)?;

        let mut scratch = PhotoModel::new();
        scratch.resize_storage(matched.width, matched.height)?;
        let request = request_for(matched.format, "", format, metadata);
        let mut produced = matched.metadata;
        matched.format.string_read(
            data,
            &request,
            &mut scratch,
            ReadRegion::whole(matched.width, matched.height),
            &mut produced,
        )?;

        let block = scratch.export(&ExportOptions::default())?;
        let to = resolve_to(options.to, block.width, block.height);
        self.put_block(
            &block,
            to.x as u32,
            to.y as u32,
            to.width,
            to.height,
            options.compositing_rule,
        )?;
        self.metadata
            .append(&mut keep_metadata(matched.format.generation(), produced));
        Ok(())
    }

    fn export_options(&self, options: &SubcommandOptions) -> Result<ExportOptions> {
        Ok(ExportOptions {
            from: Some(resolve_from(options.from, self.width(), self.height())?),
            background: options.background,
            grayscale: options.has(OptionSet::GRAYSCALE),
        })
    }

    /// `-metadata` if given, otherwise the image's own metadata.
    fn write_metadata<'a>(&'a self, options: &'a SubcommandOptions) -> Option<&'a Metadata> {
        options
            .metadata
            .as_ref()
            .or(Some(&self.metadata))
            .filter(|m| !m.is_empty())
    }
}
