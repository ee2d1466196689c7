//! Pluggable image file and string formats.
//!
//! A format handler recognises, decodes and encodes one image format. It can
//! work on files, on in-memory string data, or both; `Capabilities` tells the
//! registry which. Handlers decode by writing blocks into a `PhotoModel`
//! through its public put operations, and encode from an exported
//! `PhotoBlock`.
//!
//! Two generations of handlers exist. `Legacy` handlers never see metadata;
//! `Metadata` handlers receive the image's metadata dictionary and may add to
//! it while matching or reading. The registry tries every legacy handler
//! before any metadata-aware one.

pub mod list;
pub mod ppm;
pub mod registry;

use crate::image::block::PhotoBlock;
use crate::photo::model::PhotoModel;
use crate::utils::error::{PhotoError, Result};
use crate::utils::list::split_list;
use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

pub use registry::{FormatRegistry, Matched};

/// Key/value metadata attached to an image.
pub type Metadata = BTreeMap<String, String>;

/// A seekable byte source a handler can read a file from.
pub trait ImageSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> ImageSource for T {}

/// Which calling convention a handler follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatGeneration {
    /// Does not take or produce metadata.
    Legacy,
    /// Takes the image metadata and may return more.
    Metadata,
}

/// The operations a handler implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub file_match: bool,
    pub file_read: bool,
    pub file_write: bool,
    pub string_match: bool,
    pub string_read: bool,
    pub string_write: bool,
}

impl Capabilities {
    pub const FILE: Capabilities = Capabilities {
        file_match: true,
        file_read: true,
        file_write: true,
        string_match: false,
        string_read: false,
        string_write: false,
    };

    pub const STRING: Capabilities = Capabilities {
        file_match: false,
        file_read: false,
        file_write: false,
        string_match: true,
        string_read: true,
        string_write: true,
    };

    pub const ALL: Capabilities = Capabilities {
        file_match: true,
        file_read: true,
        file_write: true,
        string_match: true,
        string_read: true,
        string_write: true,
    };
}

/// The value of a `-format` option: a handler name followed by options for
/// that handler, e.g. `ppm` or `default -colorformat rgba`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    text: String,
    words: Vec<String>,
}

impl FormatSpec {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(FormatSpec {
            text: text.to_string(),
            words: split_list(text)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The handler name part.
    pub fn name(&self) -> &str {
        self.words.first().map(String::as_str).unwrap_or("")
    }

    /// Words after the handler name.
    pub fn args(&self) -> &[String] {
        self.words.get(1..).unwrap_or(&[])
    }

    /// Value following `key` among the handler options.
    pub fn option(&self, key: &str) -> Option<&str> {
        let args = self.args();
        args.iter()
            .position(|w| w == key)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    /// True if this format string selects the handler called `handler`,
    /// i.e. begins with its name, ignoring case.
    pub fn selects(&self, handler: &str) -> bool {
        self.text
            .get(..handler.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(handler))
    }
}

/// Arguments common to every handler call.
#[derive(Debug, Clone, Copy)]
pub struct FormatRequest<'a> {
    /// File name, or empty for string data.
    pub name: &'a str,
    pub format: Option<&'a FormatSpec>,
    /// Metadata passed in; always `None` for legacy handlers.
    pub metadata: Option<&'a Metadata>,
}

/// Where decoded pixels go: the `width` x `height` area at
/// (`src_x`, `src_y`) of the encoded image is written at (`dest_x`, `dest_y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRegion {
    pub dest_x: u32,
    pub dest_y: u32,
    pub width: u32,
    pub height: u32,
    pub src_x: u32,
    pub src_y: u32,
}

impl ReadRegion {
    /// The whole `width` x `height` image at the origin.
    pub fn whole(width: u32, height: u32) -> Self {
        ReadRegion {
            dest_x: 0,
            dest_y: 0,
            width,
            height,
            src_x: 0,
            src_y: 0,
        }
    }
}

/// A registered image format handler.
///
/// Match functions return `Ok(None)` when the content is not in this format
/// and `Ok(Some((width, height)))` when it is; a reported size of 0 means
/// "recognised, size not known yet". Operations a handler does not support
/// keep their default bodies and are left out of its `Capabilities`.
pub trait PhotoFormat {
    fn name(&self) -> &str;

    fn generation(&self) -> FormatGeneration {
        FormatGeneration::Legacy
    }

    fn capabilities(&self) -> Capabilities;

    fn file_match(
        &self,
        _source: &mut dyn ImageSource,
        _request: &FormatRequest<'_>,
        _metadata_out: &mut Metadata,
    ) -> Result<Option<(u32, u32)>> {
        Ok(None)
    }

    fn file_read(
        &self,
        _source: &mut dyn ImageSource,
        _request: &FormatRequest<'_>,
        _image: &mut PhotoModel,
        _region: ReadRegion,
        _metadata_out: &mut Metadata,
    ) -> Result<()> {
        Err(PhotoError::NotFileFormat(self.name().to_string()))
    }

    fn file_write(
        &self,
        _out: &mut dyn Write,
        _request: &FormatRequest<'_>,
        _block: &PhotoBlock<'_>,
    ) -> Result<()> {
        Err(PhotoError::NotFileFormat(self.name().to_string()))
    }

    fn string_match(
        &self,
        _data: &[u8],
        _request: &FormatRequest<'_>,
        _metadata_out: &mut Metadata,
    ) -> Result<Option<(u32, u32)>> {
        Ok(None)
    }

    fn string_read(
        &self,
        _data: &[u8],
        _request: &FormatRequest<'_>,
        _image: &mut PhotoModel,
        _region: ReadRegion,
        _metadata_out: &mut Metadata,
    ) -> Result<()> {
        Err(PhotoError::NotDataFormat(self.name().to_string()))
    }

    fn string_write(&self, _request: &FormatRequest<'_>, _block: &PhotoBlock<'_>) -> Result<Vec<u8>> {
        Err(PhotoError::NotDataFormat(self.name().to_string()))
    }
}
