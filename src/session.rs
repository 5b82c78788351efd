//! The icon pack currently selected for extraction.
//!
//! `LoadedPack` is an immutable value binding one package to its parsed
//! manifest and a resource capability. `IconPackSession` is the caller-owned
//! single slot holding the active pack; `load` clears the slot before reading
//! the new package, so a failed load leaves it empty instead of mixing old and
//! new data. Sessions are not meant for concurrent `load` calls; callers
//! serialize user actions (see `runtime::LoadingFlag`).

use crate::manifest::{ComponentMapping, DrawableCatalog, IconPackManifest, PackageIdentity};
use crate::manifest::load_manifest;
use crate::resources::{PackageResources, ResourceSource};
use std::sync::Arc;

/// One package's manifest plus the capability used to resolve its drawables.
pub struct LoadedPack {
    manifest: Arc<IconPackManifest>,
    resources: Option<Box<dyn PackageResources>>,
}

impl LoadedPack {
    /// Fetch a fresh resource capability for `package` and read its manifest.
    ///
    /// A missing package or unreadable manifest yields an empty manifest.
    pub fn open(source: &dyn ResourceSource, package: &PackageIdentity) -> Self {
        let resources = match source.resources_for(package) {
            Ok(resources) => Some(resources),
            Err(err) => {
                tracing::warn!(
                    package = %package,
                    error = %format!("{err:#}"),
                    "icon pack resources unavailable"
                );
                None
            }
        };
        let manifest = load_manifest(resources.as_deref(), package);
        Self {
            manifest: Arc::new(manifest),
            resources,
        }
    }

    pub fn package(&self) -> &PackageIdentity {
        &self.manifest.package
    }

    pub fn manifest(&self) -> Arc<IconPackManifest> {
        Arc::clone(&self.manifest)
    }

    pub fn resources(&self) -> Option<&dyn PackageResources> {
        self.resources.as_deref()
    }
}

#[derive(Default)]
/// Single-slot holder for the active icon pack.
pub struct IconPackSession {
    active: Option<LoadedPack>,
}

impl IconPackSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active pack with `package`, returning its manifest.
    pub fn load(
        &mut self,
        source: &dyn ResourceSource,
        package: &PackageIdentity,
    ) -> Arc<IconPackManifest> {
        self.active = None;
        let pack = LoadedPack::open(source, package);
        let manifest = pack.manifest();
        self.active = Some(pack);
        manifest
    }

    pub fn active(&self) -> Option<&LoadedPack> {
        self.active.as_ref()
    }

    pub fn package(&self) -> Option<&PackageIdentity> {
        self.active.as_ref().map(LoadedPack::package)
    }

    pub fn mappings(&self) -> &[ComponentMapping] {
        self.active
            .as_ref()
            .map(|pack| pack.manifest.mappings())
            .unwrap_or(&[])
    }

    pub fn catalog(&self) -> Option<&DrawableCatalog> {
        self.active.as_ref().map(|pack| pack.manifest.catalog())
    }
}
