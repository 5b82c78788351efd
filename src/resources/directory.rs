//! Directory-backed device: one sub-directory per installed package.
//!
//! Layout under the device root:
//!
//! ```text
//! <root>/<package>/package.json          optional metadata (label, actions, activities)
//! <root>/<package>/res/<type>[-qualifiers]/<name>.<ext>
//! ```
//!
//! Identifiers are assigned deterministically when a package is opened, in
//! sorted `(type, name)` order starting at `0x7f000001`, so repeated loads of
//! the same tree see the same ids. When several qualifier directories define
//! the same name, the densest variant wins.

use crate::bitmap::Bitmap;
use crate::discovery::{ComponentEnumerator, LaunchableComponent};
use crate::manifest::{ComponentName, PackageIdentity};
use crate::resources::{
    NO_RESOURCE, PackageResources, ResourceError, ResourceId, ResourceSource,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

const METADATA_FILE: &str = "package.json";
const RES_DIR: &str = "res";
const FIRST_RESOURCE_ID: ResourceId = 0x7f00_0001;
const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp"];
const ICON_KINDS: &[&str] = &["mipmap", "drawable"];

#[derive(Clone, Debug, Default, Deserialize)]
/// Contents of `package.json`.
pub struct PackageInfo {
    #[serde(default)]
    pub label: Option<String>,
    /// Intent actions the package advertises (icon pack themes, etc.).
    #[serde(default)]
    pub actions: Vec<String>,
    /// Launcher icon drawable name for the package.
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub activities: Vec<ActivityInfo>,
}

#[derive(Clone, Debug, Deserialize)]
/// Launchable activity declared by a package.
pub struct ActivityInfo {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Clone, Debug)]
/// Device whose installed packages are unpacked under one root directory.
pub struct DirectoryDevice {
    root: PathBuf,
}

impl DirectoryDevice {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every package directory under the root, sorted by identity.
    pub fn installed_packages(&self) -> Result<Vec<PackageIdentity>> {
        let mut packages = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("listing device root {}", self.root.display()))?
        {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                packages.push(PackageIdentity::new(name));
            }
        }
        packages.sort();
        Ok(packages)
    }

    /// Directory for `package`, refusing identities that would escape the root.
    pub fn package_dir(&self, package: &PackageIdentity) -> Result<PathBuf> {
        let name = package.as_str();
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        let dir = self.root.join(name);
        if !plain || !dir.is_dir() {
            return Err(ResourceError::PackageNotFound(package.clone()).into());
        }
        Ok(dir)
    }

    /// Read `package.json`; packages without one get default metadata.
    pub fn package_info(&self, package: &PackageIdentity) -> Result<PackageInfo> {
        let path = self.package_dir(package)?.join(METADATA_FILE);
        if !path.is_file() {
            return Ok(PackageInfo::default());
        }
        let data =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn open_package(&self, package: &PackageIdentity) -> Result<DirectoryResources> {
        let res_root = self.package_dir(package)?.join(RES_DIR);
        if !res_root.is_dir() {
            return Err(ResourceError::NoResources(package.clone()).into());
        }
        DirectoryResources::scan(package.clone(), &res_root)
    }
}

impl ResourceSource for DirectoryDevice {
    fn resources_for(&self, package: &PackageIdentity) -> Result<Box<dyn PackageResources>> {
        Ok(Box::new(self.open_package(package)?))
    }
}

impl ComponentEnumerator for DirectoryDevice {
    fn packages_for_action(&self, action: &str) -> Result<Vec<PackageIdentity>> {
        let mut matches = Vec::new();
        for package in self.installed_packages()? {
            match self.package_info(&package) {
                Ok(info) if info.actions.iter().any(|a| a == action) => matches.push(package),
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(
                        package = %package,
                        error = %format!("{err:#}"),
                        "skipping unreadable package metadata"
                    )
                }
            }
        }
        Ok(matches)
    }

    fn package_label(&self, package: &PackageIdentity) -> Result<String> {
        let info = self.package_info(package)?;
        Ok(info.label.unwrap_or_else(|| package.to_string()))
    }

    fn launchable_components(&self) -> Result<Vec<LaunchableComponent>> {
        let mut components = Vec::new();
        for package in self.installed_packages()? {
            let info = match self.package_info(&package) {
                Ok(info) => info,
                Err(err) => {
                    tracing::warn!(
                        package = %package,
                        error = %format!("{err:#}"),
                        "skipping package with unreadable metadata"
                    );
                    continue;
                }
            };
            let package_label = info.label.clone().unwrap_or_else(|| package.to_string());
            for activity in &info.activities {
                components.push(LaunchableComponent {
                    component: ComponentName {
                        package: package.clone(),
                        class_name: activity.class_name.clone(),
                    },
                    label: activity.label.clone().unwrap_or_else(|| package_label.clone()),
                });
            }
        }
        Ok(components)
    }

    fn component_icon(&self, component: &LaunchableComponent, size: u32) -> Result<Bitmap> {
        let package = &component.component.package;
        let info = self.package_info(package)?;
        let icon_name = info
            .activities
            .iter()
            .find(|activity| activity.class_name == component.component.class_name)
            .and_then(|activity| activity.icon.clone())
            .or(info.icon)
            .with_context(|| {
                format!("{} declares no launcher icon", component.component.flatten())
            })?;
        let resources = self.open_package(package)?;
        let id = ICON_KINDS
            .iter()
            .map(|kind| resources.identifier(&icon_name, kind, package))
            .find(|id| *id != NO_RESOURCE)
            .with_context(|| format!("launcher icon {icon_name} missing from {package}"))?;
        resources.decode_drawable(id)?.scaled(size, size)
    }
}

#[derive(Clone, Debug)]
struct ResourceEntry {
    stored_path: String,
    path: PathBuf,
}

#[derive(Debug)]
/// Resource table of one unpacked package.
pub struct DirectoryResources {
    package: PackageIdentity,
    ids: BTreeMap<(String, String), ResourceId>,
    entries: Vec<ResourceEntry>,
}

impl DirectoryResources {
    /// Build the resource table for `res_root`.
    pub fn scan(package: PackageIdentity, res_root: &Path) -> Result<Self> {
        let mut best: BTreeMap<(String, String), (u8, ResourceEntry)> = BTreeMap::new();
        for type_dir in sorted_entries(res_root)? {
            if !type_dir.is_dir() {
                continue;
            }
            let Some(dir_name) = type_dir.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let (kind, qualifiers) = dir_name.split_once('-').unwrap_or((dir_name, ""));
            let rank = density_rank(qualifiers);
            for file in sorted_entries(&type_dir)? {
                if !file.is_file() {
                    continue;
                }
                let Some(file_name) = file.file_name().and_then(|s| s.to_str()) else {
                    continue;
                };
                let name = file_name.split('.').next().unwrap_or(file_name);
                if name.is_empty() {
                    continue;
                }
                let key = (kind.to_string(), name.to_string());
                let entry = ResourceEntry {
                    stored_path: format!("{RES_DIR}/{dir_name}/{file_name}"),
                    path: file.clone(),
                };
                let denser = best
                    .get(&key)
                    .map_or(true, |(existing, _)| rank > *existing);
                if denser {
                    best.insert(key, (rank, entry));
                }
            }
        }

        let mut ids = BTreeMap::new();
        let mut entries = Vec::with_capacity(best.len());
        for (offset, (key, (_, entry))) in best.into_iter().enumerate() {
            ids.insert(key, FIRST_RESOURCE_ID + offset as ResourceId);
            entries.push(entry);
        }
        Ok(Self {
            package,
            ids,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: ResourceId) -> Result<&ResourceEntry> {
        id.checked_sub(FIRST_RESOURCE_ID)
            .and_then(|index| self.entries.get(index as usize))
            .ok_or_else(|| ResourceError::UnknownResource(id).into())
    }
}

impl PackageResources for DirectoryResources {
    fn package(&self) -> &PackageIdentity {
        &self.package
    }

    fn identifier(&self, name: &str, kind: &str, package: &PackageIdentity) -> ResourceId {
        if package != &self.package {
            return NO_RESOURCE;
        }
        self.ids
            .get(&(kind.to_string(), name.to_string()))
            .copied()
            .unwrap_or(NO_RESOURCE)
    }

    fn stored_path(&self, id: ResourceId) -> Result<String> {
        Ok(self.entry(id)?.stored_path.clone())
    }

    fn open_raw(&self, id: ResourceId) -> Result<Box<dyn Read>> {
        let entry = self.entry(id)?;
        let file = File::open(&entry.path)
            .with_context(|| format!("opening {}", entry.path.display()))?;
        Ok(Box::new(file))
    }

    fn open_xml(&self, id: ResourceId) -> Result<Box<dyn BufRead>> {
        let entry = self.entry(id)?;
        let file = File::open(&entry.path)
            .with_context(|| format!("opening {}", entry.path.display()))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn decode_drawable(&self, id: ResourceId) -> Result<Bitmap> {
        let entry = self.entry(id)?;
        let extension = entry
            .stored_path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !RASTER_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ResourceError::UnsupportedDrawable {
                path: entry.stored_path.clone(),
                extension,
            }
            .into());
        }
        let bytes = fs::read(&entry.path)
            .with_context(|| format!("reading {}", entry.path.display()))?;
        Bitmap::decode(&bytes).with_context(|| format!("decoding {}", entry.stored_path))
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        paths.push(entry?.path());
    }
    paths.sort();
    Ok(paths)
}

/// Preference among qualifier directories defining the same resource.
fn density_rank(qualifiers: &str) -> u8 {
    let mut rank = 1;
    for token in qualifiers.split('-') {
        let candidate = match token {
            "nodpi" | "anydpi" => 7,
            "xxxhdpi" => 6,
            "xxhdpi" => 5,
            "xhdpi" => 4,
            "hdpi" => 3,
            "mdpi" => 2,
            "ldpi" => 0,
            _ => continue,
        };
        rank = candidate;
    }
    rank
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn density_prefers_densest_variant() {
        assert!(density_rank("nodpi-v4") > density_rank("xxxhdpi"));
        assert!(density_rank("xxhdpi") > density_rank("mdpi"));
        assert!(density_rank("mdpi") > density_rank(""));
        assert!(density_rank("v21") > density_rank("ldpi"));
    }

    #[test]
    fn scan_assigns_stable_ids_and_picks_densest() {
        let dir = TempDir::new().unwrap();
        let res = dir.path().join("res");
        write(&res, "drawable-mdpi/icon_a.png", b"mdpi");
        write(&res, "drawable-xxhdpi/icon_a.png", b"xxhdpi");
        write(&res, "drawable/icon_b.xml", b"<vector/>");
        write(&res, "xml/appfilter.xml", b"<resources/>");

        let pack = PackageIdentity::new("com.example.pack");
        let resources = DirectoryResources::scan(pack.clone(), &res).unwrap();
        assert_eq!(resources.len(), 3);

        let a = resources.identifier("icon_a", "drawable", &pack);
        let b = resources.identifier("icon_b", "drawable", &pack);
        let filter = resources.identifier("appfilter", "xml", &pack);
        assert_eq!(a, FIRST_RESOURCE_ID);
        assert_eq!(b, FIRST_RESOURCE_ID + 1);
        assert_eq!(filter, FIRST_RESOURCE_ID + 2);
        assert_eq!(
            resources.stored_path(a).unwrap(),
            "res/drawable-xxhdpi/icon_a.png"
        );

        let mut raw = Vec::new();
        resources.open_raw(a).unwrap().read_to_end(&mut raw).unwrap();
        assert_eq!(raw, b"xxhdpi");

        assert_eq!(resources.identifier("missing", "drawable", &pack), NO_RESOURCE);
        assert_eq!(
            resources.identifier("icon_a", "drawable", &PackageIdentity::new("other")),
            NO_RESOURCE
        );
        assert!(resources.stored_path(NO_RESOURCE).is_err());
    }

    #[test]
    fn vector_drawables_are_not_decoded() {
        let dir = TempDir::new().unwrap();
        let res = dir.path().join("res");
        write(&res, "drawable-anydpi/clock.xml", b"<adaptive-icon/>");
        let pack = PackageIdentity::new("p");
        let resources = DirectoryResources::scan(pack.clone(), &res).unwrap();
        let id = resources.identifier("clock", "drawable", &pack);
        let err = resources.decode_drawable(id).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::UnsupportedDrawable { .. })
        ));
    }

    #[test]
    fn device_rejects_escaping_and_missing_packages() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("com.example.app")).unwrap();
        let device = DirectoryDevice::new(dir.path());

        for bad in ["..", "", "a/b", "com.missing"] {
            let err = device.package_dir(&PackageIdentity::new(bad)).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ResourceError>(),
                Some(ResourceError::PackageNotFound(_))
            ));
        }
        let err = device
            .resources_for(&PackageIdentity::new("com.example.app"))
            .err()
            .expect("package without res/ has no resources");
        assert!(matches!(
            err.downcast_ref::<ResourceError>(),
            Some(ResourceError::NoResources(_))
        ));
    }

    #[test]
    fn metadata_drives_labels_and_components() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "com.example.app/package.json",
            br#"{"label":"Example","activities":[{"class":"com.example.app.Main"},{"class":"com.example.app.Settings","label":"Settings"}]}"#,
        );
        fs::create_dir_all(dir.path().join("com.bare")).unwrap();
        let device = DirectoryDevice::new(dir.path());

        assert_eq!(
            device.package_label(&PackageIdentity::new("com.bare")).unwrap(),
            "com.bare"
        );
        let components = device.launchable_components().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].label, "Example");
        assert_eq!(components[1].label, "Settings");
        assert_eq!(components[1].component.class_name, "com.example.app.Settings");
    }
}
