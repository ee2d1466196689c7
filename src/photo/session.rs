// src/photo/session.rs

//! A set of named photo images sharing one format registry.
//!
//! Each session owns its own `FormatRegistry`; sessions never share codecs,
//! so independent sessions can live on different threads.

use crate::format::FormatRegistry;
use crate::photo::configure::PhotoOptions;
use crate::photo::model::PhotoModel;
use crate::photo::options::SubcommandOptions;
use crate::utils::error::{PhotoError, Result};
use log::{debug, info};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct PhotoSession {
    registry: FormatRegistry,
    images: BTreeMap<String, PhotoModel>,
}

fn missing(name: &str) -> PhotoError {
    PhotoError::bad_value(format!("image \"{}\" doesn't exist", name))
}

impl PhotoSession {
    /// A session with the built-in codecs registered.
    pub fn new() -> Self {
        Self::with_registry(FormatRegistry::with_builtin())
    }

    pub fn with_registry(registry: FormatRegistry) -> Self {
        PhotoSession {
            registry,
            images: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FormatRegistry {
        &mut self.registry
    }

    /// Creates image `name`, replacing any image of that name.
    ///
    /// If configuring the new image fails, no image of that name remains.
    pub fn create(&mut self, name: &str, options: &PhotoOptions) -> Result<&mut PhotoModel> {
        if self.images.remove(name).is_some() {
            debug!("replacing image \"{}\"", name);
        }
        let mut model = PhotoModel::new();
        model.configure(&self.registry, options)?;
        info!("created image \"{}\" ({}x{})", name, model.width(), model.height());
        Ok(self.images.entry(name.to_string()).or_insert(model))
    }

    /// Deletes image `name`, disposing its display instances.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.images.remove(name).ok_or_else(|| missing(name))?;
        info!("deleted image \"{}\"", name);
        Ok(())
    }

    pub fn image(&self, name: &str) -> Result<&PhotoModel> {
        self.images.get(name).ok_or_else(|| missing(name))
    }

    pub fn image_mut(&mut self, name: &str) -> Result<&mut PhotoModel> {
        self.images.get_mut(name).ok_or_else(|| missing(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.images.keys().map(String::as_str).collect()
    }

    pub fn configure(&mut self, name: &str, options: &PhotoOptions) -> Result<()> {
        let (registry, model) = self.parts_mut(name)?;
        model.configure(registry, options)
    }

    /// The registry together with one image, for the operations that need
    /// both (`read`, `write`, `data`, `put`).
    pub fn parts_mut(&mut self, name: &str) -> Result<(&FormatRegistry, &mut PhotoModel)> {
        let model = self.images.get_mut(name).ok_or_else(|| missing(name))?;
        Ok((&self.registry, model))
    }

    /// Copies from image `source` into image `dest`; they may be the same.
    pub fn copy(&mut self, dest: &str, source: &str, options: &SubcommandOptions) -> Result<()> {
        if dest == source {
            return self.image_mut(dest)?.copy_within(options);
        }
        if !self.images.contains_key(source) {
            return Err(missing(source));
        }
        let (name, mut target) = self
            .images
            .remove_entry(dest)
            .ok_or_else(|| missing(dest))?;
        let result = match self.images.get(source) {
            Some(src) => target.copy_from(src, options),
            None => Err(missing(source)),
        };
        self.images.insert(name, target);
        result
    }
}
