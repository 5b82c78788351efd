//! Drawable name -> concrete asset inside a foreign package.
//!
//! Lookups go through the package's own namespace. An unknown name is not an
//! error: resolvers return `Ok(None)` so callers skip the entry, since packs
//! routinely reference drawables their authors renamed or removed.

use crate::bitmap::Bitmap;
use crate::resources::{NO_RESOURCE, PackageResources, ResourceId};
use anyhow::{Context, Result};
use std::fmt;
use std::io::Read;

/// Resource type drawables live under.
pub const DRAWABLE_KIND: &str = "drawable";
const DEFAULT_EXTENSION: &str = "xml";

/// Asset produced for one drawable during extraction; never stored.
pub enum ResolvedAsset {
    RawStream(RawAsset),
    DecodedBitmap(Bitmap),
}

/// Stored bytes of a drawable plus what its path says about the format.
pub struct RawAsset {
    pub stream: Box<dyn Read>,
    pub extension: String,
    pub mime_type: String,
}

impl fmt::Debug for RawAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawAsset")
            .field("extension", &self.extension)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// Extension after the last `.` of a stored path, `xml` when there is none.
///
/// Only the file-name segment is inspected, and a trailing `.` also yields `xml`.
pub fn extension_from_path(stored_path: &str) -> String {
    let file_name = stored_path.rsplit('/').next().unwrap_or(stored_path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Content type for an exported drawable extension.
pub fn mime_for_extension(extension: &str) -> String {
    if extension == "xml" {
        "text/xml".to_string()
    } else {
        format!("image/{extension}")
    }
}

/// Resolves drawable names against one package's resources.
pub struct ResourceResolver<'a> {
    resources: &'a dyn PackageResources,
}

impl<'a> ResourceResolver<'a> {
    pub fn new(resources: &'a dyn PackageResources) -> Self {
        Self { resources }
    }

    /// Resource id for `name`, or `None` when the package does not define it.
    pub fn lookup(&self, name: &str) -> Option<ResourceId> {
        let id = self
            .resources
            .identifier(name, DRAWABLE_KIND, self.resources.package());
        (id != NO_RESOURCE).then_some(id)
    }

    /// Open the drawable's stored bytes without decoding them.
    pub fn resolve_raw(&self, name: &str) -> Result<Option<RawAsset>> {
        let Some(id) = self.lookup(name) else {
            return Ok(None);
        };
        let stored_path = self
            .resources
            .stored_path(id)
            .with_context(|| format!("reading stored path of {name}"))?;
        let extension = extension_from_path(&stored_path);
        let stream = self
            .resources
            .open_raw(id)
            .with_context(|| format!("opening {stored_path}"))?;
        Ok(Some(RawAsset {
            stream,
            mime_type: mime_for_extension(&extension),
            extension,
        }))
    }

    /// Decode the drawable into a raster bitmap.
    pub fn resolve_bitmap(&self, name: &str) -> Result<Option<Bitmap>> {
        let Some(id) = self.lookup(name) else {
            return Ok(None);
        };
        self.resources
            .decode_drawable(id)
            .with_context(|| format!("decoding drawable {name}"))
            .map(Some)
    }

    /// Resolve in either mode, wrapped as a [`ResolvedAsset`].
    pub fn resolve(&self, name: &str, decode: bool) -> Result<Option<ResolvedAsset>> {
        if decode {
            Ok(self.resolve_bitmap(name)?.map(ResolvedAsset::DecodedBitmap))
        } else {
            Ok(self.resolve_raw(name)?.map(ResolvedAsset::RawStream))
        }
    }
}
