//! In-memory model of an icon pack's appfilter manifest.
//!
//! The types keep document order exactly as read: consumers of appfilter data
//! apply first-match-wins rules, so neither the mapping sequence nor the
//! drawable catalog may be reordered. The only coalescing allowed is exact
//! string dedup in the catalog.

use crate::manifest::identity::PackageIdentity;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
/// One `<item>` entry: "this component should display this drawable".
///
/// `drawable` stays `None` when the attribute was missing; resolution of such
/// an entry simply misses later on.
pub struct ComponentMapping {
    pub component: String,
    pub drawable: Option<String>,
}

impl ComponentMapping {
    pub fn new(component: impl Into<String>, drawable: Option<String>) -> Self {
        Self {
            component: component.into(),
            drawable,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
/// Ordered set of drawable names, first-seen order.
///
/// A missing `drawable` attribute is recorded once as `None`, matching how
/// existing appfilter readers behave; that entry never resolves.
pub struct DrawableCatalog {
    order: Vec<Option<String>>,
    seen: BTreeSet<Option<String>>,
}

impl DrawableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` unless an identical entry exists. Returns true when added.
    pub fn insert(&mut self, name: Option<String>) -> bool {
        if self.seen.contains(&name) {
            return false;
        }
        self.seen.insert(name.clone());
        self.order.push(name);
        true
    }

    pub fn contains(&self, name: Option<&str>) -> bool {
        self.seen.contains(&name.map(str::to_string))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.order.iter().map(|name| name.as_deref())
    }

    /// Named entries only, in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().filter_map(|name| name.as_deref())
    }
}

impl Serialize for DrawableCatalog {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.order.serialize(serializer)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
/// Mapping sequence plus drawable catalog read from one package's appfilter.
///
/// Always built fresh from a single document; an absent or unreadable
/// document produces `IconPackManifest::empty`, never a partial model.
pub struct IconPackManifest {
    pub package: PackageIdentity,
    mappings: Vec<ComponentMapping>,
    catalog: DrawableCatalog,
}

impl IconPackManifest {
    pub fn empty(package: PackageIdentity) -> Self {
        Self {
            package,
            mappings: Vec::new(),
            catalog: DrawableCatalog::new(),
        }
    }

    /// Apply one `<item>` tag's attributes to the model.
    ///
    /// The component check and the catalog update are independent: an item
    /// without a `component` still contributes its drawable.
    pub fn record_item(&mut self, component: Option<String>, drawable: Option<String>) {
        if let Some(component) = component {
            self.mappings
                .push(ComponentMapping::new(component, drawable.clone()));
        }
        self.catalog.insert(drawable);
    }

    pub fn mappings(&self) -> &[ComponentMapping] {
        &self.mappings
    }

    pub fn catalog(&self) -> &DrawableCatalog {
        &self.catalog
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty() && self.catalog.is_empty()
    }

    /// Component identifiers in document order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|mapping| mapping.component.as_str())
    }
}
