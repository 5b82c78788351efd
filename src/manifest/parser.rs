//! Streaming reader for appfilter documents.
//!
//! A single forward pass over the XML events; only `<item>` start tags and
//! their `component`/`drawable` attributes matter. Every other tag and
//! attribute is ignored. Faults abort the scan: callers get either the whole
//! document or an error, never the prefix that was read before the fault.

use crate::manifest::identity::PackageIdentity;
use crate::manifest::model::IconPackManifest;
use crate::resources::{NO_RESOURCE, PackageResources};
use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fmt;
use std::io::BufRead;

/// Resource name of the manifest inside an icon pack.
pub const APPFILTER_NAME: &str = "appfilter";
/// Resource type the manifest is stored under.
pub const APPFILTER_KIND: &str = "xml";

const ITEM_TAG: &[u8] = b"item";
const COMPONENT_ATTR: &[u8] = b"component";
const DRAWABLE_ATTR: &[u8] = b"drawable";

/// Parse an appfilter document into a manifest for `package`.
///
/// Returns an error for malformed or truncated input; an empty document or
/// one without `<item>` tags yields an empty manifest.
pub fn parse_appfilter<R: BufRead>(
    package: &PackageIdentity,
    source: R,
) -> Result<IconPackManifest> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut manifest = IconPackManifest::empty(package.clone());
    let mut depth: usize = 0;
    let mut root_closed = false;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).with_context(|| {
            format!("malformed appfilter at byte {}", reader.buffer_position())
        })?;
        let position = reader.buffer_position();
        match event {
            Event::Start(tag) => {
                ensure_in_document(depth, root_closed, position)?;
                depth += 1;
                apply_tag(&mut manifest, &tag)?;
            }
            Event::Empty(tag) => {
                ensure_in_document(depth, root_closed, position)?;
                apply_tag(&mut manifest, &tag)?;
                root_closed |= depth == 0;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                root_closed |= depth == 0;
            }
            Event::Text(_) | Event::CData(_) if depth == 0 => {
                bail!("character data outside the root element at byte {position}");
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth > 0 {
        bail!("appfilter truncated: {depth} element(s) left open at end of document");
    }
    Ok(manifest)
}

/// Only one root element is allowed; nothing may follow it.
fn ensure_in_document(depth: usize, root_closed: bool, position: impl fmt::Display) -> Result<()> {
    if depth == 0 && root_closed {
        bail!("content after the root element at byte {position}");
    }
    Ok(())
}

fn apply_tag(manifest: &mut IconPackManifest, tag: &BytesStart<'_>) -> Result<()> {
    if tag.name().as_ref() != ITEM_TAG {
        return Ok(());
    }
    let mut component = None;
    let mut drawable = None;
    for attr in tag.attributes() {
        let attr = attr.context("malformed attribute on <item>")?;
        let slot = match attr.key.as_ref() {
            COMPONENT_ATTR => &mut component,
            DRAWABLE_ATTR => &mut drawable,
            _ => continue,
        };
        let value = attr
            .unescape_value()
            .context("invalid escape in <item> attribute")?;
        *slot = Some(value.into_owned());
    }
    manifest.record_item(component, drawable);
    Ok(())
}

/// Read the manifest stored inside `resources` for `package`.
///
/// Strict variant: a missing `appfilter` resource is an error. Use
/// [`load_manifest`] for the all-or-nothing behavior sessions rely on.
pub fn read_manifest(
    resources: &dyn PackageResources,
    package: &PackageIdentity,
) -> Result<IconPackManifest> {
    let id = resources.identifier(APPFILTER_NAME, APPFILTER_KIND, package);
    if id == NO_RESOURCE {
        bail!("{package} has no {APPFILTER_KIND}/{APPFILTER_NAME} resource");
    }
    let source = resources
        .open_xml(id)
        .with_context(|| format!("opening appfilter of {package}"))?;
    parse_appfilter(package, source).with_context(|| format!("parsing appfilter of {package}"))
}

/// Read the manifest, falling back to an empty one on any fault.
///
/// Attempted exactly once; the fault is logged and the caller decides
/// whether to try again.
pub fn load_manifest(
    resources: Option<&dyn PackageResources>,
    package: &PackageIdentity,
) -> IconPackManifest {
    let Some(resources) = resources else {
        tracing::warn!(package = %package, "no resources available; using empty manifest");
        return IconPackManifest::empty(package.clone());
    };
    match read_manifest(resources, package) {
        Ok(manifest) => {
            tracing::debug!(
                package = %package,
                mappings = manifest.mappings().len(),
                drawables = manifest.catalog().len(),
                "loaded appfilter"
            );
            manifest
        }
        Err(err) => {
            tracing::warn!(
                package = %package,
                error = %format!("{err:#}"),
                "appfilter unavailable"
            );
            IconPackManifest::empty(package.clone())
        }
    }
}
