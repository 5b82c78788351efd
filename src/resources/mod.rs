//! Access to a foreign package's resource namespace.
//!
//! `PackageResources` is a capability bound to one installed package: it can
//! look up identifiers, report where a resource is stored, and open it either
//! as raw bytes or as a decoded drawable. `ResourceSource` hands out those
//! capabilities per package. The core never caches a capability across loads;
//! a fresh one is requested every time a pack is loaded.

pub mod directory;

use crate::bitmap::Bitmap;
use crate::manifest::PackageIdentity;
use anyhow::Result;
use std::io::{BufRead, Read};
use thiserror::Error;

pub use directory::{ActivityInfo, DirectoryDevice, DirectoryResources, PackageInfo};

/// Integer handle for a resource inside one package.
pub type ResourceId = u32;

/// Sentinel returned by [`PackageResources::identifier`] for unknown names.
pub const NO_RESOURCE: ResourceId = 0;

/// Provider-level failures callers may want to tell apart.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("package {0} is not installed")]
    PackageNotFound(PackageIdentity),
    #[error("package {0} has no accessible resources")]
    NoResources(PackageIdentity),
    #[error("resource id {0:#010x} is not defined in this package")]
    UnknownResource(ResourceId),
    #[error("{path} is a .{extension} drawable; rasterizing it needs the host renderer")]
    UnsupportedDrawable { path: String, extension: String },
}

/// Resource capability bound to a single package.
pub trait PackageResources {
    /// Package whose namespace this capability reads.
    fn package(&self) -> &PackageIdentity;

    /// Resolve `kind/name` inside `package`; [`NO_RESOURCE`] when unknown.
    fn identifier(&self, name: &str, kind: &str, package: &PackageIdentity) -> ResourceId;

    /// Path the resource is stored at inside the bundle
    /// (e.g. `res/drawable-nodpi-v4/icon.xml`).
    fn stored_path(&self, id: ResourceId) -> Result<String>;

    /// Open the stored bytes unmodified.
    fn open_raw(&self, id: ResourceId) -> Result<Box<dyn Read>>;

    /// Open an XML resource for event-stream parsing.
    fn open_xml(&self, id: ResourceId) -> Result<Box<dyn BufRead>>;

    /// Decode the resource into a raster bitmap.
    fn decode_drawable(&self, id: ResourceId) -> Result<Bitmap>;
}

/// Hands out resource capabilities for installed packages.
pub trait ResourceSource {
    fn resources_for(&self, package: &PackageIdentity) -> Result<Box<dyn PackageResources>>;
}
