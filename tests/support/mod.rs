#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use icondigger::resources::{PackageResources, ResourceError, ResourceId, ResourceSource};
use icondigger::{
    AssetSink, Bitmap, ComponentEnumerator, LaunchableComponent, NO_RESOURCE, PackageIdentity,
    SinkBody, SinkEntry,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufRead, Cursor, Read};
use std::path::Path;

/// One synthetic resource inside a fake package.
#[derive(Clone)]
pub struct FakeResource {
    pub kind: String,
    pub name: String,
    pub stored_path: String,
    pub bytes: Vec<u8>,
    pub bitmap: Option<Bitmap>,
    pub fail_open: bool,
}

/// In-memory resource table for one package.
#[derive(Clone)]
pub struct FakeResources {
    package: PackageIdentity,
    entries: Vec<FakeResource>,
}

impl FakeResources {
    pub fn new(package: &str) -> Self {
        Self {
            package: PackageIdentity::new(package),
            entries: Vec::new(),
        }
    }

    pub fn with_appfilter(self, xml: &str) -> Self {
        self.with_entry(FakeResource {
            kind: "xml".into(),
            name: "appfilter".into(),
            stored_path: "res/xml/appfilter.xml".into(),
            bytes: xml.as_bytes().to_vec(),
            bitmap: None,
            fail_open: false,
        })
    }

    /// Drawable stored at `stored_path`; raster paths decode to a 2x2 bitmap.
    pub fn with_drawable(self, name: &str, stored_path: &str) -> Self {
        let bitmap = (!stored_path.ends_with(".xml")).then(|| solid(2, 2, [10, 20, 30, 255]));
        self.with_entry(FakeResource {
            kind: "drawable".into(),
            name: name.into(),
            stored_path: stored_path.into(),
            bytes: format!("bytes of {stored_path}").into_bytes(),
            bitmap,
            fail_open: false,
        })
    }

    /// Drawable whose identifier resolves but whose stream cannot be opened.
    pub fn with_broken_drawable(self, name: &str) -> Self {
        self.with_entry(FakeResource {
            kind: "drawable".into(),
            name: name.into(),
            stored_path: format!("res/drawable/{name}.png"),
            bytes: Vec::new(),
            bitmap: None,
            fail_open: true,
        })
    }

    pub fn with_entry(mut self, entry: FakeResource) -> Self {
        self.entries.push(entry);
        self
    }

    fn entry(&self, id: ResourceId) -> Result<&FakeResource> {
        id.checked_sub(1)
            .and_then(|index| self.entries.get(index as usize))
            .ok_or_else(|| ResourceError::UnknownResource(id).into())
    }
}

impl PackageResources for FakeResources {
    fn package(&self) -> &PackageIdentity {
        &self.package
    }

    fn identifier(&self, name: &str, kind: &str, package: &PackageIdentity) -> ResourceId {
        if package != &self.package {
            return NO_RESOURCE;
        }
        self.entries
            .iter()
            .position(|entry| entry.kind == kind && entry.name == name)
            .map(|index| index as ResourceId + 1)
            .unwrap_or(NO_RESOURCE)
    }

    fn stored_path(&self, id: ResourceId) -> Result<String> {
        Ok(self.entry(id)?.stored_path.clone())
    }

    fn open_raw(&self, id: ResourceId) -> Result<Box<dyn Read>> {
        let entry = self.entry(id)?;
        if entry.fail_open {
            bail!("stream for {} is unreadable", entry.name);
        }
        Ok(Box::new(Cursor::new(entry.bytes.clone())))
    }

    fn open_xml(&self, id: ResourceId) -> Result<Box<dyn BufRead>> {
        let entry = self.entry(id)?;
        Ok(Box::new(Cursor::new(entry.bytes.clone())))
    }

    fn decode_drawable(&self, id: ResourceId) -> Result<Bitmap> {
        let entry = self.entry(id)?;
        entry
            .bitmap
            .clone()
            .ok_or_else(|| anyhow!("{} cannot be rasterized", entry.stored_path))
    }
}

/// Resource source backed by a table of fake packages.
#[derive(Default)]
pub struct FakeSource {
    packages: BTreeMap<String, FakeResources>,
    pub requests: RefCell<Vec<String>>,
}

impl FakeSource {
    pub fn with(mut self, resources: FakeResources) -> Self {
        self.packages
            .insert(resources.package.as_str().to_string(), resources);
        self
    }
}

impl ResourceSource for FakeSource {
    fn resources_for(&self, package: &PackageIdentity) -> Result<Box<dyn PackageResources>> {
        self.requests.borrow_mut().push(package.to_string());
        match self.packages.get(package.as_str()) {
            Some(resources) => Ok(Box::new(resources.clone())),
            None => Err(ResourceError::PackageNotFound(package.clone()).into()),
        }
    }
}

/// What a sink received for one entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Recorded {
    Bytes(Vec<u8>),
    Text(String),
    Pixels { width: u32, height: u32 },
}

/// Sink that remembers every write and can be told to reject some names.
#[derive(Default)]
pub struct RecordingSink {
    pub writes: RefCell<Vec<(SinkEntry, Recorded)>>,
    pub reject: BTreeSet<String>,
}

impl RecordingSink {
    pub fn rejecting(names: &[&str]) -> Self {
        Self {
            writes: RefCell::new(Vec::new()),
            reject: names.iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.writes
            .borrow()
            .iter()
            .map(|(entry, _)| entry.display_name())
            .collect()
    }
}

impl AssetSink for RecordingSink {
    fn write(&self, entry: &SinkEntry, body: SinkBody) -> Result<()> {
        if self.reject.contains(&entry.file_name) {
            bail!("sink refused {}", entry.display_name());
        }
        let recorded = match body {
            SinkBody::Bytes(bytes) => Recorded::Bytes(bytes),
            SinkBody::Text(text) => Recorded::Text(text),
            SinkBody::Stream(mut stream) => {
                let mut bytes = Vec::new();
                stream.read_to_end(&mut bytes)?;
                Recorded::Bytes(bytes)
            }
            SinkBody::Pixels(bitmap) => Recorded::Pixels {
                width: bitmap.width,
                height: bitmap.height,
            },
        };
        self.writes.borrow_mut().push((entry.clone(), recorded));
        Ok(())
    }
}

/// Enumerator with a fixed component list; icons fail for listed packages.
#[derive(Default)]
pub struct FakeEnumerator {
    pub components: Vec<LaunchableComponent>,
    pub broken_icons: BTreeSet<String>,
}

impl ComponentEnumerator for FakeEnumerator {
    fn packages_for_action(&self, _action: &str) -> Result<Vec<PackageIdentity>> {
        Ok(Vec::new())
    }

    fn package_label(&self, package: &PackageIdentity) -> Result<String> {
        Ok(package.to_string())
    }

    fn launchable_components(&self) -> Result<Vec<LaunchableComponent>> {
        Ok(self.components.clone())
    }

    fn component_icon(&self, component: &LaunchableComponent, size: u32) -> Result<Bitmap> {
        if self.broken_icons.contains(component.component.package.as_str()) {
            bail!("no icon for {}", component.component.flatten());
        }
        solid(4, 4, [0, 0, 0, 255]).scaled(size, size)
    }
}

pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Bitmap {
    let pixels = rgba
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 4)
        .collect();
    Bitmap::from_rgba(width, height, pixels).expect("solid bitmap dimensions")
}

pub fn write_file(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("fixture path has a parent"))
        .expect("create fixture dirs");
    fs::write(path, contents).expect("write fixture");
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    solid(width, height, [200, 100, 50, 255])
        .encode_png()
        .expect("encode fixture png")
}
