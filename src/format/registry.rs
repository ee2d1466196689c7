// src/format/registry.rs

//! Registration and lookup of format handlers.
//!
//! Handlers live in two lists, one per `FormatGeneration`. Registering adds
//! to the front of the list, so a newer handler shadows an older one with the
//! same name. Lookups walk the legacy list first and the metadata list
//! second. The built-in `default` string format is held apart and only tried
//! after both lists have been exhausted.

use super::{
    FormatGeneration, FormatRequest, FormatSpec, ImageSource, Metadata, PhotoFormat,
};
use crate::format::list::ListFormat;
use crate::format::ppm::PpmFormat;
use crate::utils::error::{PhotoError, Result};
use log::{debug, trace};
use std::io::{Seek, SeekFrom};
use std::path::Path;

/// The outcome of a successful match.
pub struct Matched<'r> {
    pub format: &'r dyn PhotoFormat,
    /// Width reported by the handler, at least 1.
    pub width: u32,
    /// Height reported by the handler, at least 1.
    pub height: u32,
    /// Metadata produced while matching; empty for legacy handlers.
    pub metadata: Metadata,
}

impl std::fmt::Debug for Matched<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matched")
            .field("format", &self.format.name())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// The set of known image formats.
pub struct FormatRegistry {
    legacy: Vec<Box<dyn PhotoFormat>>,
    current: Vec<Box<dyn PhotoFormat>>,
    default_format: Option<Box<dyn PhotoFormat>>,
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.names())
            .finish()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl FormatRegistry {
    /// An empty registry with no fallback string format.
    pub fn new() -> Self {
        FormatRegistry {
            legacy: Vec::new(),
            current: Vec::new(),
            default_format: None,
        }
    }

    /// A registry holding the built-in `ppm` handler and the `default`
    /// string format.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PpmFormat));
        registry.set_default_format(Box::new(ListFormat));
        registry
    }

    /// Adds a handler in front of every handler of the same generation.
    pub fn register(&mut self, format: Box<dyn PhotoFormat>) {
        debug!(
            "registering {:?} photo format \"{}\"",
            format.generation(),
            format.name()
        );
        match format.generation() {
            FormatGeneration::Legacy => self.legacy.insert(0, format),
            FormatGeneration::Metadata => self.current.insert(0, format),
        }
    }

    /// Replaces the fallback string format.
    pub fn set_default_format(&mut self, format: Box<dyn PhotoFormat>) {
        self.default_format = Some(format);
    }

    /// Names of the registered handlers in lookup order, fallback last.
    pub fn names(&self) -> Vec<&str> {
        self.handlers()
            .chain(self.fallback())
            .map(|f| f.name())
            .collect()
    }

    fn handlers(&self) -> impl Iterator<Item = &dyn PhotoFormat> + '_ {
        self.legacy
            .iter()
            .chain(self.current.iter())
            .map(|f| f.as_ref() as &dyn PhotoFormat)
    }

    fn fallback(&self) -> Option<&dyn PhotoFormat> {
        self.default_format.as_deref().map(|f| f as &dyn PhotoFormat)
    }

    /// Finds the handler that recognises the file behind `source`.
    ///
    /// With an explicit `format`, only handlers it selects are tried, and a
    /// selected handler without file support is an error. `source` is
    /// rewound before every probe and again before returning.
    pub fn match_file(
        &self,
        source: &mut dyn ImageSource,
        file_name: &str,
        format: Option<&FormatSpec>,
        metadata: Option<&Metadata>,
    ) -> Result<Matched<'_>> {
        let mut name_matched = false;

        for handler in self.handlers() {
            if let Some(spec) = format {
                if !spec.selects(handler.name()) {
                    continue;
                }
                name_matched = true;
                if !handler.capabilities().file_match {
                    return Err(PhotoError::NotFileFormat(handler.name().to_string()));
                }
            }
            if !handler.capabilities().file_match {
                continue;
            }

            source.seek(SeekFrom::Start(0))?;
            let request = request_for(handler, file_name, format, metadata);
            let mut probe = Metadata::new();
            trace!("probing \"{}\" with format \"{}\"", file_name, handler.name());
            if let Some((width, height)) = handler.file_match(source, &request, &mut probe)? {
                source.seek(SeekFrom::Start(0))?;
                return Ok(matched(handler, width, height, probe));
            }
        }

        if let Some(spec) = format {
            if !name_matched {
                return Err(PhotoError::PhotoFormat(spec.as_str().to_string()));
            }
        }
        Err(PhotoError::UnrecognizedData(format!(
            "data in image file \"{}\"",
            file_name
        )))
    }

    /// Finds the handler that recognises in-memory image data.
    ///
    /// Behaves like [`match_file`](Self::match_file), except that the
    /// fallback `default` format is tried last when no format was given or
    /// the given one selects it.
    pub fn match_string(
        &self,
        data: &[u8],
        format: Option<&FormatSpec>,
        metadata: Option<&Metadata>,
    ) -> Result<Matched<'_>> {
        let mut name_matched = false;

        for handler in self.handlers() {
            if let Some(spec) = format {
                if !spec.selects(handler.name()) {
                    continue;
                }
                name_matched = true;
                if !handler.capabilities().string_match {
                    return Err(PhotoError::NotDataFormat(handler.name().to_string()));
                }
            }
            if !handler.capabilities().string_match {
                continue;
            }

            let request = request_for(handler, "", format, metadata);
            let mut probe = Metadata::new();
            if let Some((width, height)) = handler.string_match(data, &request, &mut probe)? {
                return Ok(matched(handler, width, height, probe));
            }
        }

        if let Some(fallback) = self.fallback() {
            if format.is_none_or(|spec| spec.selects(fallback.name())) {
                name_matched = true;
                let request = request_for(fallback, "", format, metadata);
                let mut probe = Metadata::new();
                if let Some((width, height)) = fallback.string_match(data, &request, &mut probe)? {
                    return Ok(matched(fallback, width, height, probe));
                }
            }
        }

        if let Some(spec) = format {
            if !name_matched {
                return Err(PhotoError::PhotoFormat(spec.as_str().to_string()));
            }
        }
        Err(PhotoError::UnrecognizedData("image data".to_string()))
    }

    /// Chooses the handler that writes `file_name`.
    ///
    /// Without an explicit format, the file name extension is used as one; if
    /// no handler carries that name, the first handler able to write files is
    /// taken instead.
    pub fn match_file_writer(
        &self,
        file_name: &str,
        format: Option<&FormatSpec>,
    ) -> Result<&dyn PhotoFormat> {
        let implicit = match format {
            Some(_) => None,
            None => Path::new(file_name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(FormatSpec::parse)
                .transpose()?,
        };
        let filter = format.or(implicit.as_ref());

        let mut name_matched = false;
        for handler in self.handlers() {
            if filter.is_some_and(|spec| !spec.selects(handler.name())) {
                continue;
            }
            name_matched = true;
            if handler.capabilities().file_write {
                return Ok(handler);
            }
        }

        if format.is_none() && implicit.is_some() && !name_matched {
            if let Some(handler) = self.handlers().find(|h| h.capabilities().file_write) {
                return Ok(handler);
            }
        }

        match filter {
            Some(spec) if !name_matched => Err(PhotoError::PhotoFormat(spec.as_str().to_string())),
            Some(spec) => Err(PhotoError::NotFileFormat(spec.name().to_string())),
            None => Err(PhotoError::PhotoFormat(String::new())),
        }
    }

    /// Chooses the handler that encodes image data in memory. Without an
    /// explicit format the fallback `default` format is used.
    pub fn match_string_writer(&self, format: Option<&FormatSpec>) -> Result<&dyn PhotoFormat> {
        let Some(spec) = format else {
            return self
                .fallback()
                .ok_or_else(|| PhotoError::PhotoFormat("default".to_string()));
        };

        let mut name_matched = false;
        for handler in self.handlers().chain(self.fallback()) {
            if !spec.selects(handler.name()) {
                continue;
            }
            name_matched = true;
            if handler.capabilities().string_write {
                return Ok(handler);
            }
        }

        if name_matched {
            Err(PhotoError::NotDataFormat(spec.name().to_string()))
        } else {
            Err(PhotoError::PhotoFormat(spec.as_str().to_string()))
        }
    }
}

impl Drop for FormatRegistry {
    fn drop(&mut self) {
        debug!(
            "releasing {} photo formats",
            self.legacy.len() + self.current.len() + usize::from(self.default_format.is_some())
        );
    }
}

/// Builds the request a handler sees; legacy handlers never get metadata.
pub(crate) fn request_for<'a>(
    handler: &dyn PhotoFormat,
    name: &'a str,
    format: Option<&'a FormatSpec>,
    metadata: Option<&'a Metadata>,
) -> FormatRequest<'a> {
    FormatRequest {
        name,
        format,
        metadata: match handler.generation() {
            FormatGeneration::Legacy => None,
            FormatGeneration::Metadata => metadata,
        },
    }
}

fn matched(handler: &dyn PhotoFormat, width: u32, height: u32, probe: Metadata) -> Matched<'_> {
    Matched {
        format: handler,
        width: width.max(1),
        height: height.max(1),
        metadata: match handler.generation() {
            FormatGeneration::Legacy => Metadata::new(),
            FormatGeneration::Metadata => probe,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Capabilities;
    use std::io::{Cursor, Read};

    /// Recognises data starting with its own name.
    struct Tagged {
        name: &'static str,
        generation: FormatGeneration,
        caps: Capabilities,
    }

    impl PhotoFormat for Tagged {
        fn name(&self) -> &str {
            self.name
        }

        fn generation(&self) -> FormatGeneration {
            self.generation
        }

        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        fn file_match(
            &self,
            source: &mut dyn ImageSource,
            _request: &FormatRequest<'_>,
            metadata_out: &mut Metadata,
        ) -> Result<Option<(u32, u32)>> {
            let mut head = vec![0; self.name.len()];
            if source.read_exact(&mut head).is_err() || head != self.name.as_bytes() {
                metadata_out.insert("discarded".into(), "yes".into());
                return Ok(None);
            }
            metadata_out.insert("probe".into(), self.name.into());
            Ok(Some((0, 7)))
        }

        fn string_match(
            &self,
            data: &[u8],
            _request: &FormatRequest<'_>,
            _metadata_out: &mut Metadata,
        ) -> Result<Option<(u32, u32)>> {
            Ok(data.starts_with(self.name.as_bytes()).then_some((2, 2)))
        }
    }

    fn tagged(name: &'static str, generation: FormatGeneration, caps: Capabilities) -> Box<Tagged> {
        Box::new(Tagged {
            name,
            generation,
            caps,
        })
    }

    #[test]
    fn legacy_formats_are_tried_first() {
        let mut registry = FormatRegistry::new();
        registry.register(tagged("aa", FormatGeneration::Metadata, Capabilities::ALL));
        registry.register(tagged("a", FormatGeneration::Legacy, Capabilities::ALL));
        let m = registry.match_string(b"aa", None, None).unwrap();
        assert_eq!(m.format.name(), "a");
    }

    #[test]
    fn newest_registration_wins() {
        let mut registry = FormatRegistry::new();
        registry.register(tagged("x", FormatGeneration::Legacy, Capabilities::ALL));
        registry.register(tagged("xy", FormatGeneration::Legacy, Capabilities::ALL));
        assert_eq!(registry.names(), vec!["xy", "x"]);
        let m = registry.match_string(b"xyz", None, None).unwrap();
        assert_eq!(m.format.name(), "xy");
    }

    #[test]
    fn sizes_are_clamped_and_probe_metadata_kept_only_on_success() {
        let mut registry = FormatRegistry::new();
        registry.register(tagged("meta", FormatGeneration::Metadata, Capabilities::FILE));
        registry.register(tagged("zzz", FormatGeneration::Metadata, Capabilities::FILE));
        let mut source = Cursor::new(b"meta-data".to_vec());
        let m = registry.match_file(&mut source, "f", None, None).unwrap();
        assert_eq!((m.width, m.height), (1, 7));
        assert_eq!(m.metadata.get("probe").map(String::as_str), Some("meta"));
        assert!(!m.metadata.contains_key("discarded"));
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn explicit_format_errors() {
        let mut registry = FormatRegistry::new();
        registry.register(tagged("str", FormatGeneration::Legacy, Capabilities::STRING));
        let mut source = Cursor::new(b"str".to_vec());

        let fmt = FormatSpec::parse("str").unwrap();
        let err = registry.match_file(&mut source, "f", Some(&fmt), None).unwrap_err();
        assert!(matches!(err, PhotoError::NotFileFormat(ref n) if n == "str"));

        let fmt = FormatSpec::parse("gif").unwrap();
        let err = registry.match_string(b"str", Some(&fmt), None).unwrap_err();
        assert!(matches!(err, PhotoError::PhotoFormat(ref n) if n == "gif"));

        let err = registry.match_string(b"nothing", None, None).unwrap_err();
        assert!(matches!(err, PhotoError::UnrecognizedData(_)));
    }

    #[test]
    fn fallback_format_is_last() {
        let registry = FormatRegistry::with_builtin();
        let m = registry.match_string(b"{#ff0000 #00ff00}", None, None).unwrap();
        assert_eq!(m.format.name(), "default");
        assert_eq!((m.width, m.height), (2, 1));
    }

    #[test]
    fn writer_selection() {
        let mut registry = FormatRegistry::with_builtin();
        registry.register(tagged("str", FormatGeneration::Legacy, Capabilities::STRING));

        assert_eq!(registry.match_file_writer("out.ppm", None).unwrap().name(), "ppm");
        // Unknown extension falls back to the first file writer.
        assert_eq!(registry.match_file_writer("out.xyz", None).unwrap().name(), "ppm");
        let fmt = FormatSpec::parse("str").unwrap();
        assert!(matches!(
            registry.match_file_writer("out", Some(&fmt)),
            Err(PhotoError::NotFileFormat(_))
        ));

        assert_eq!(registry.match_string_writer(None).unwrap().name(), "default");
        let fmt = FormatSpec::parse("ppm").unwrap();
        assert_eq!(registry.match_string_writer(Some(&fmt)).unwrap().name(), "ppm");
        let fmt = FormatSpec::parse("png").unwrap();
        assert!(matches!(
            registry.match_string_writer(Some(&fmt)),
            Err(PhotoError::PhotoFormat(_))
        ));
    }
}
