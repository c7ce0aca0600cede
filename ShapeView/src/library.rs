//! Arena of decoded shapes addressed by stable handles
//!
//! Shapes are decoded to completion before they are published here, and are
//! never mutated afterwards; viewers hold a [`ShapeHandle`] and build their
//! own [`ShapeInstance`] from the shared `Arc<Shape>`.

use std::collections::HashMap;
use std::sync::Arc;

use darkstar::anim::ShapeInstance;
use darkstar::shape::{Shape, ShapeDecoder};
use darkstar::vfs::{AssetLocator, base_name};
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Stable index of a shape in a [`ShapeLibrary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(usize);

impl ShapeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct LibraryEntry {
    name: String,
    shape: Arc<Shape>,
}

/// Outcome of decoding one named shape in a batch
#[derive(Debug)]
pub struct DecodeOutcome {
    pub name: String,
    pub result: darkstar::Result<Shape>,
}

#[derive(Debug, Default)]
pub struct ShapeLibrary {
    entries: Vec<LibraryEntry>,
    /// Lower-cased base name -> handle
    by_name: HashMap<String, ShapeHandle>,
}

impl ShapeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Publish a decoded shape. A name already present keeps its handle
    /// and the new shape replaces the old one.
    pub fn insert(&mut self, name: &str, shape: Shape) -> ShapeHandle {
        let key = library_key(name);
        let shape = Arc::new(shape);
        if let Some(&handle) = self.by_name.get(&key) {
            self.entries[handle.0].shape = shape;
            return handle;
        }
        let handle = ShapeHandle(self.entries.len());
        self.entries.push(LibraryEntry {
            name: name.to_string(),
            shape,
        });
        self.by_name.insert(key, handle);
        handle
    }

    pub fn get(&self, handle: ShapeHandle) -> Result<&Arc<Shape>> {
        self.entries
            .get(handle.0)
            .map(|entry| &entry.shape)
            .ok_or(Error::InvalidHandle(handle.0))
    }

    pub fn name(&self, handle: ShapeHandle) -> Option<&str> {
        self.entries.get(handle.0).map(|entry| entry.name.as_str())
    }

    pub fn find(&self, name: &str) -> Option<ShapeHandle> {
        self.by_name.get(&library_key(name)).copied()
    }

    pub fn handles(&self) -> impl Iterator<Item = ShapeHandle> {
        (0..self.entries.len()).map(ShapeHandle)
    }

    /// A fresh playback cursor over the shape behind `handle`.
    pub fn instance(&self, handle: ShapeHandle) -> Result<ShapeInstance> {
        Ok(ShapeInstance::new(Arc::clone(self.get(handle)?)))
    }

    /// Resolve and decode `name`, then publish it.
    pub fn load(&mut self, locator: &AssetLocator, name: &str) -> Result<ShapeHandle> {
        if let Some(handle) = self.find(name) {
            return Ok(handle);
        }
        let bytes = locator.resolve(name)?;
        let shape = ShapeDecoder::decode(&bytes)?;
        tracing::debug!(
            "Loaded {name}: {} nodes, {} details, {} sequences",
            shape.nodes().len(),
            shape.detail_levels().len(),
            shape.sequences().len()
        );
        Ok(self.insert(name, shape))
    }
}

/// Names resolve the same way the locator does: directory prefixes are
/// dropped and case is ignored.
fn library_key(name: &str) -> String {
    base_name(name).to_ascii_lowercase()
}

/// Decode every name in parallel. Results come back in input order; nothing
/// is published, so callers decide what to keep.
pub fn decode_all(locator: &AssetLocator, names: &[String]) -> Vec<DecodeOutcome> {
    decode_all_with(locator, names, |_| {})
}

/// [`decode_all`] with a callback after each shape, for progress reporting.
/// The callback runs on worker threads.
pub fn decode_all_with<F>(locator: &AssetLocator, names: &[String], on_done: F) -> Vec<DecodeOutcome>
where
    F: Fn(&DecodeOutcome) + Sync,
{
    names
        .par_iter()
        .map(|name| {
            let result = locator
                .resolve(name)
                .and_then(|bytes| ShapeDecoder::decode(&bytes));
            let outcome = DecodeOutcome {
                name: name.clone(),
                result,
            };
            on_done(&outcome);
            outcome
        })
        .collect()
}
