//! Appfilter manifest wiring.
//!
//! This module wraps the `xml/appfilter` resource shipped by icon packs so
//! callers get an ordered, deduplicated model of which component maps to which
//! drawable. Types here mirror the document; `parser` owns the streaming read.

pub mod identity;
pub mod model;
pub mod parser;

pub use identity::{
    BITMAP_FOLDER_TAG, ComponentName, DEVICE_ICONS_FOLDER, ExportMode, PackageIdentity,
    RAW_FOLDER_TAG,
};
pub use model::{ComponentMapping, DrawableCatalog, IconPackManifest};
pub use parser::{load_manifest, parse_appfilter, read_manifest};
