// src/photo/configure.rs

//! Image configuration: `-data`, `-file`, `-format`, `-gamma`, `-height`,
//! `-metadata`, `-palette` and `-width`.
//!
//! Configuring validates every value before anything changes. When the
//! image source or format changed, the new content is decoded into a scratch
//! image first, so a decoder failure leaves the old pixels, size and metadata
//! in place.

use crate::format::registry::request_for;
use crate::format::{FormatGeneration, FormatRegistry, FormatSpec, Metadata, ReadRegion};
use crate::image::color::Palette;
use crate::photo::model::PhotoModel;
use crate::photo::options::{format_metadata, lookup, parse_metadata};
use crate::utils::error::{PhotoError, Result};
use log::debug;
use std::fs::File;
use std::io::BufReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigOption {
    Data,
    File,
    Format,
    Gamma,
    Height,
    Metadata,
    Palette,
    Width,
}

const CONFIG_NAMES: [(&str, ConfigOption); 8] = [
    ("-data", ConfigOption::Data),
    ("-file", ConfigOption::File),
    ("-format", ConfigOption::Format),
    ("-gamma", ConfigOption::Gamma),
    ("-height", ConfigOption::Height),
    ("-metadata", ConfigOption::Metadata),
    ("-palette", ConfigOption::Palette),
    ("-width", ConfigOption::Width),
];

fn config_option(word: &str) -> Result<(&'static str, ConfigOption)> {
    lookup(word, &CONFIG_NAMES).ok_or_else(|| PhotoError::BadOption(word.to_string()))
}

/// A configuration request. Options left at `None` keep their current
/// value; an empty `file`, `data`, `format` or `metadata` unsets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoOptions {
    pub data: Option<Vec<u8>>,
    pub file: Option<String>,
    pub format: Option<String>,
    pub gamma: Option<f64>,
    pub height: Option<u32>,
    pub metadata: Option<Metadata>,
    pub palette: Option<String>,
    pub width: Option<u32>,
}

impl PhotoOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `-option value` pairs.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut options = PhotoOptions::new();
        let mut words = args.iter().map(|a| a.as_ref());
        while let Some(word) = words.next() {
            let (name, option) = config_option(word)?;
            let value = words
                .next()
                .ok_or_else(|| PhotoError::MissingValue(name.to_string()))?;
            match option {
                ConfigOption::Data => options.data = Some(value.as_bytes().to_vec()),
                ConfigOption::File => options.file = Some(value.to_string()),
                ConfigOption::Format => options.format = Some(value.to_string()),
                ConfigOption::Gamma => {
                    options.gamma = Some(value.trim().parse().map_err(|_| {
                        PhotoError::bad_value(format!(
                            "expected floating-point number but got \"{}\"",
                            value
                        ))
                    })?);
                }
                ConfigOption::Height => options.height = Some(parse_size(name, value)?),
                ConfigOption::Metadata => options.metadata = Some(parse_metadata(value)?),
                ConfigOption::Palette => options.palette = Some(value.to_string()),
                ConfigOption::Width => options.width = Some(parse_size(name, value)?),
            }
        }
        Ok(options)
    }

    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_palette(mut self, palette: impl Into<String>) -> Self {
        self.palette = Some(palette.into());
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }
}

fn parse_size(name: &str, value: &str) -> Result<u32> {
    let n: i64 = value
        .trim()
        .parse()
        .map_err(|_| PhotoError::bad_value(format!("expected integer but got \"{}\"", value)))?;
    if n < 0 {
        return Err(PhotoError::bad_value(format!(
            "value for {} must not be negative",
            name
        )));
    }
    u32::try_from(n)
        .map_err(|_| PhotoError::bad_value(format!("value for {} is too large", name)))
}

/// Where new content comes from.
enum Source<'a> {
    File(&'a str),
    Data(&'a [u8]),
}

/// Decodes `source` into a fresh image of the given user size.
fn decode(
    registry: &FormatRegistry,
    source: Source<'_>,
    format: Option<&FormatSpec>,
    metadata: &Metadata,
    user_size: (u32, u32),
) -> Result<(PhotoModel, Metadata)> {
    let mut scratch = PhotoModel::new();
    (scratch.user_width, scratch.user_height) = user_size;
    let metadata_in = (!metadata.is_empty()).then_some(metadata);

    let (format_name, mut produced) = match source {
        Source::File(path) => {
            let mut reader = BufReader::new(File::open(path)?);
            let matched = registry.match_file(&mut reader, path, format, metadata_in)?;
            scratch.resize_storage(matched.width, matched.height)?;
            let request = request_for(matched.format, path, format, metadata_in);
            let mut produced = matched.metadata;
            matched.format.file_read(
                &mut reader,
                &request,
                &mut scratch,
                ReadRegion::whole(matched.width, matched.height),
                &mut produced,
            )?;
            (matched.format.name().to_string(), keep_metadata(matched.format.generation(), produced))
        }
        Source::Data(bytes) => {
            let matched = registry.match_string(bytes, format, metadata_in)?;
            scratch.resize_storage(matched.width, matched.height)?;
            let request = request_for(matched.format, "", format, metadata_in);
            let mut produced = matched.metadata;
            matched.format.string_read(
                bytes,
                &request,
                &mut scratch,
                ReadRegion::whole(matched.width, matched.height),
                &mut produced,
            )?;
            (matched.format.name().to_string(), keep_metadata(matched.format.generation(), produced))
        }
    };

    debug!(
        "decoded {}x{} image as \"{}\" with {} metadata entries",
        scratch.width(),
        scratch.height(),
        format_name,
        produced.len()
    );
    let mut merged = metadata.clone();
    merged.append(&mut produced);
    Ok((scratch, merged))
}

pub(crate) fn keep_metadata(generation: FormatGeneration, produced: Metadata) -> Metadata {
    match generation {
        FormatGeneration::Legacy => Metadata::new(),
        FormatGeneration::Metadata => produced,
    }
}

fn format_gamma(gamma: f64) -> String {
    if gamma.fract() == 0.0 {
        format!("{:.1}", gamma)
    } else {
        gamma.to_string()
    }
}

impl PhotoModel {
    /// Applies a configuration request.
    pub fn configure(&mut self, registry: &FormatRegistry, options: &PhotoOptions) -> Result<()> {
        let palette = options.palette.as_deref().map(Palette::parse).transpose()?;
        let format = match options.format.as_deref() {
            None => self.format.clone(),
            Some("") => None,
            Some(text) => Some(FormatSpec::parse(text)?),
        };
        let mut file = match options.file.as_deref() {
            None => self.file.clone(),
            Some("") => None,
            Some(path) => Some(path.to_string()),
        };
        let data = match options.data.as_deref() {
            None => self.data.clone(),
            Some([]) => None,
            Some(bytes) => Some(bytes.to_vec()),
        };
        // New data replaces a file source unless a file is given as well.
        if options.file.is_none() && options.data.as_ref().is_some_and(|d| !d.is_empty()) {
            file = None;
        }
        let metadata = options.metadata.clone().unwrap_or_else(|| self.metadata.clone());
        let user_size = (
            options.width.unwrap_or(self.user_width),
            options.height.unwrap_or(self.user_height),
        );

        let format_changed = format != self.format;
        let size_changed = user_size != (self.user_width, self.user_height);

        let decoded = match (&file, &data) {
            (Some(path), _) if format_changed || file != self.file => Some(decode(
                registry,
                Source::File(path),
                format.as_ref(),
                &metadata,
                user_size,
            )?),
            (None, Some(bytes)) if format_changed || data != self.data => Some(decode(
                registry,
                Source::Data(bytes),
                format.as_ref(),
                &metadata,
                user_size,
            )?),
            _ => None,
        };

        let previous_size = (self.user_width, self.user_height);
        (self.user_width, self.user_height) = user_size;
        match decoded {
            Some((scratch, merged)) => {
                self.install(scratch);
                self.metadata = merged;
            }
            None => {
                if size_changed {
                    let (width, height) = self.dimensions();
                    if let Err(e) = self.resize_storage(width, height) {
                        (self.user_width, self.user_height) = previous_size;
                        return Err(e);
                    }
                    self.flags.image_changed = true;
                }
                self.metadata = metadata;
            }
        }
        self.format = format;
        self.file = file;
        self.data = data;

        if let Some(gamma) = options.gamma {
            let gamma = if gamma <= 0.0 { 1.0 } else { gamma };
            if gamma != self.gamma {
                self.gamma = gamma;
                self.flags.image_changed = true;
            }
        }
        if let Some(palette) = palette {
            if palette != self.palette {
                self.palette = palette;
                self.flags.image_changed = true;
            }
        }

        self.configure_instances();
        if self.flags.image_changed {
            self.flags.image_changed = false;
            self.notify(self.buffer.bounds());
        }
        Ok(())
    }

    /// Takes over the pixels of a freshly decoded image.
    fn install(&mut self, mut scratch: PhotoModel) {
        self.buffer = std::mem::take(&mut scratch.buffer);
        self.region = std::mem::take(&mut scratch.region);
        self.flags.color_image |= scratch.flags.color_image;
        self.flags.complex_alpha = scratch.flags.complex_alpha;
        self.flags.image_changed = true;
        (self.dither_x, self.dither_y) = (0, 0);

        let (width, height) = self.dimensions();
        self.resize_instances(width, height);
        self.dither(self.buffer.bounds());
    }

    /// Current value of a configuration option, as text.
    pub fn cget(&self, option: &str) -> Result<String> {
        let (_, option) = config_option(option)?;
        Ok(match option {
            ConfigOption::Data => self
                .data
                .as_deref()
                .map(|d| String::from_utf8_lossy(d).into_owned())
                .unwrap_or_default(),
            ConfigOption::File => self.file.clone().unwrap_or_default(),
            ConfigOption::Format => self
                .format
                .as_ref()
                .map(|f| f.as_str().to_string())
                .unwrap_or_default(),
            ConfigOption::Gamma => format_gamma(self.gamma),
            ConfigOption::Height => self.user_height.to_string(),
            ConfigOption::Metadata => format_metadata(&self.metadata),
            ConfigOption::Palette => self.palette.to_string(),
            ConfigOption::Width => self.user_width.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::Rgba;

    #[test]
    fn parse_pairs() {
        let opts = PhotoOptions::parse(&["-wid", "10", "-gamma", "2.2", "-palette", "5/5/4"]).unwrap();
        assert_eq!(opts, PhotoOptions::new().with_width(10).with_gamma(2.2).with_palette("5/5/4"));
        assert!(matches!(
            PhotoOptions::parse(&["-width"]),
            Err(PhotoError::MissingValue(_))
        ));
        assert!(matches!(
            PhotoOptions::parse(&["-width", "-3"]),
            Err(PhotoError::BadValue(_))
        ));
        assert!(matches!(
            PhotoOptions::parse(&["-colour", "red"]),
            Err(PhotoError::BadOption(_))
        ));
    }

    #[test]
    fn data_is_decoded_and_reported() {
        let registry = FormatRegistry::with_builtin();
        let mut model = PhotoModel::new();
        model
            .configure(&registry, &PhotoOptions::new().with_data("{red blue} {green white}"))
            .unwrap();
        assert_eq!(model.dimensions(), (2, 2));
        assert_eq!(model.get_pixel(1, 0).unwrap(), Rgba::opaque(0, 0, 255));
        assert_eq!(model.cget("-data").unwrap(), "{red blue} {green white}");
        assert_eq!(model.dither_cursor(), (0, 2));
    }

    #[test]
    fn failed_decode_keeps_everything() {
        let registry = FormatRegistry::with_builtin();
        let mut model = PhotoModel::new();
        model
            .configure(&registry, &PhotoOptions::new().with_data("{red}"))
            .unwrap();
        let err = model
            .configure(&registry, &PhotoOptions::new().with_data("not an image at all").with_gamma(3.0))
            .unwrap_err();
        assert!(matches!(err, PhotoError::UnrecognizedData(_)));
        assert_eq!(model.dimensions(), (1, 1));
        assert_eq!(model.cget("-data").unwrap(), "{red}");
        assert_eq!(model.gamma(), 1.0);
    }

    #[test]
    fn user_size_and_gamma() {
        let registry = FormatRegistry::with_builtin();
        let mut model = PhotoModel::new();
        model
            .configure(&registry, &PhotoOptions::new().with_width(3).with_height(2).with_gamma(-1.0))
            .unwrap();
        assert_eq!(model.dimensions(), (3, 2));
        assert_eq!(model.cget("-gamma").unwrap(), "1.0");
        assert_eq!(model.cget("-width").unwrap(), "3");

        model.configure(&registry, &PhotoOptions::new().with_gamma(2.2)).unwrap();
        assert_eq!(model.cget("-gamma").unwrap(), "2.2");
        assert!(model.cget("-bogus").is_err());
    }

    #[test]
    fn empty_values_unset() {
        let registry = FormatRegistry::with_builtin();
        let mut model = PhotoModel::new();
        let mut meta = Metadata::new();
        meta.insert("k".into(), "v".into());
        model
            .configure(&registry, &PhotoOptions::new().with_format("default").with_metadata(meta))
            .unwrap();
        assert_eq!(model.cget("-format").unwrap(), "default");
        assert_eq!(model.cget("-metadata").unwrap(), "k v");

        model
            .configure(&registry, &PhotoOptions::parse(&["-format", "", "-metadata", ""]).unwrap())
            .unwrap();
        assert!(model.format().is_none());
        assert!(model.metadata().is_empty());
    }
}
