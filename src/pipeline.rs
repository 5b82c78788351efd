//! Extraction pipeline: walk a source list, resolve, hand to a sink.
//!
//! Every entry is processed on its own. A miss is counted as skipped, a
//! resolve or write fault is logged and counted as failed, and neither stops
//! the entries that follow. Each export returns an `ExtractionSummary` folded
//! from the per-item outcomes.

use crate::discovery::{ComponentEnumerator, LaunchableComponent, component_record};
use crate::manifest::{
    BITMAP_FOLDER_TAG, DEVICE_ICONS_FOLDER, ExportMode, PackageIdentity, RAW_FOLDER_TAG,
};
use crate::resolver::ResourceResolver;
use crate::resources::ResourceSource;
use crate::session::{IconPackSession, LoadedPack};
use crate::sink::{AssetSink, SinkBody, SinkEntry};
use anyhow::{Result, bail};
use serde::Serialize;

/// Edge length of exported launcher icons.
pub const DEVICE_ICON_SIZE: u32 = 512;
/// File name of the launchable-components export.
pub const MY_APPFILTERS_NAME: &str = "MyAppFilters";

const PNG_EXTENSION: &str = "png";
const PNG_MIME: &str = "image/png";
const TEXT_MIME: &str = "text/plain";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The name has no resource id in the pack's namespace.
    NotFound,
    /// Catalog entry recorded for `<item>` tags without a `drawable`.
    MissingName,
}

#[derive(Debug)]
/// Result of processing one entry.
pub enum ItemOutcome {
    Written,
    Skipped(SkipReason),
    Failed(anyhow::Error),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
/// Per-batch tally of item outcomes.
pub struct ExtractionSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExtractionSummary {
    pub fn record(mut self, outcome: &ItemOutcome) -> Self {
        match outcome {
            ItemOutcome::Written => self.succeeded += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
        self
    }

    /// Entries looked at, whatever their outcome.
    pub fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

/// Collaborators an export needs.
pub struct ExportContext<'a> {
    pub source: &'a dyn ResourceSource,
    pub enumerator: &'a dyn ComponentEnumerator,
    pub sink: &'a dyn AssetSink,
}

/// Run one user-selected export.
///
/// Icon pack modes (re)load `package` into `session` first, matching the
/// one-action-at-a-time flow: every action reads the manifest fresh.
pub fn run_export(
    ctx: &ExportContext<'_>,
    session: &mut IconPackSession,
    mode: ExportMode,
    package: Option<&PackageIdentity>,
) -> Result<ExtractionSummary> {
    if mode.needs_icon_pack() {
        let Some(package) = package else {
            bail!("{} export needs an icon pack package", mode.as_str());
        };
        session.load(ctx.source, package);
    }
    let summary = match mode {
        ExportMode::Appfilter => export_appfilter(session, ctx.sink),
        ExportMode::Drawables => export_raw_drawables(session, ctx.sink),
        ExportMode::Bitmaps => export_bitmaps(session, ctx.sink),
        ExportMode::DeviceIcons => export_device_icons(ctx.enumerator, ctx.sink, DEVICE_ICON_SIZE),
        ExportMode::MyAppfilters => export_my_appfilters(ctx.enumerator, ctx.sink),
    };
    tracing::info!(
        mode = mode.as_str(),
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        "export finished"
    );
    Ok(summary)
}

/// Write the active pack's component list as `<package>.appfilter.xml`.
pub fn export_appfilter(session: &IconPackSession, sink: &dyn AssetSink) -> ExtractionSummary {
    let Some(pack) = session.active() else {
        tracing::warn!("no icon pack loaded; nothing to export");
        return ExtractionSummary::default();
    };
    let manifest = pack.manifest();
    let text = manifest.components().collect::<Vec<_>>().join("\n");
    let entry = SinkEntry::new(
        format!("{}.appfilter", pack.package()),
        "xml",
        TEXT_MIME,
        None,
    );
    fold_items([entry], ExportMode::Appfilter, |entry| entry.display_name(), |entry| {
        sink.write(entry, SinkBody::Text(text.clone()))?;
        Ok(ItemOutcome::Written)
    })
}

/// Copy every catalog drawable's stored bytes, unmodified.
pub fn export_raw_drawables(session: &IconPackSession, sink: &dyn AssetSink) -> ExtractionSummary {
    let Some((pack, resolver)) = active_resolver(session) else {
        return ExtractionSummary::default();
    };
    let manifest = pack.manifest();
    let folder = pack.package().folder_name(RAW_FOLDER_TAG);
    fold_items(manifest.catalog().iter(), ExportMode::Drawables, describe_name, |name| {
        let Some(name) = *name else {
            return Ok(ItemOutcome::Skipped(SkipReason::MissingName));
        };
        let Some(asset) = resolver.resolve_raw(name)? else {
            return Ok(ItemOutcome::Skipped(SkipReason::NotFound));
        };
        let entry = SinkEntry::new(name, asset.extension, asset.mime_type, Some(folder.clone()));
        sink.write(&entry, SinkBody::Stream(asset.stream))?;
        Ok(ItemOutcome::Written)
    })
}

/// Decode every catalog drawable and write it as PNG.
pub fn export_bitmaps(session: &IconPackSession, sink: &dyn AssetSink) -> ExtractionSummary {
    let Some((pack, resolver)) = active_resolver(session) else {
        return ExtractionSummary::default();
    };
    let manifest = pack.manifest();
    let folder = pack.package().folder_name(BITMAP_FOLDER_TAG);
    fold_items(manifest.catalog().iter(), ExportMode::Bitmaps, describe_name, |name| {
        let Some(name) = *name else {
            return Ok(ItemOutcome::Skipped(SkipReason::MissingName));
        };
        let Some(bitmap) = resolver.resolve_bitmap(name)? else {
            return Ok(ItemOutcome::Skipped(SkipReason::NotFound));
        };
        let entry = SinkEntry::new(name, PNG_EXTENSION, PNG_MIME, Some(folder.clone()));
        sink.write(&entry, SinkBody::Pixels(bitmap))?;
        Ok(ItemOutcome::Written)
    })
}

/// Write every launchable component's launcher icon, `size` x `size`, as PNG.
///
/// Files are named after the component's package, so several activities of
/// one package overwrite each other; the last one written wins.
pub fn export_device_icons(
    enumerator: &dyn ComponentEnumerator,
    sink: &dyn AssetSink,
    size: u32,
) -> ExtractionSummary {
    let Some(components) = list_components(enumerator) else {
        return ExtractionSummary::default();
    };
    fold_items(
        components,
        ExportMode::DeviceIcons,
        |component: &LaunchableComponent| component.component.flatten(),
        |component| {
            let bitmap = enumerator.component_icon(component, size)?;
            let entry = SinkEntry::new(
                component.component.package.as_str(),
                PNG_EXTENSION,
                PNG_MIME,
                Some(DEVICE_ICONS_FOLDER.to_string()),
            );
            sink.write(&entry, SinkBody::Pixels(bitmap))?;
            Ok(ItemOutcome::Written)
        },
    )
}

/// Write `MyAppFilters.txt`: one pseudo-JSON record per launchable component.
pub fn export_my_appfilters(
    enumerator: &dyn ComponentEnumerator,
    sink: &dyn AssetSink,
) -> ExtractionSummary {
    let Some(components) = list_components(enumerator) else {
        return ExtractionSummary::default();
    };
    let text = components
        .iter()
        .map(component_record)
        .collect::<Vec<_>>()
        .join("\n");
    let entry = SinkEntry::new(MY_APPFILTERS_NAME, "txt", TEXT_MIME, None);
    fold_items([entry], ExportMode::MyAppfilters, |entry| entry.display_name(), |entry| {
        sink.write(entry, SinkBody::Text(text.clone()))?;
        Ok(ItemOutcome::Written)
    })
}

fn active_resolver(session: &IconPackSession) -> Option<(&LoadedPack, ResourceResolver<'_>)> {
    let Some(pack) = session.active() else {
        tracing::warn!("no icon pack loaded; nothing to export");
        return None;
    };
    let Some(resources) = pack.resources() else {
        tracing::warn!(package = %pack.package(), "icon pack has no resources; nothing to export");
        return None;
    };
    Some((pack, ResourceResolver::new(resources)))
}

fn list_components(enumerator: &dyn ComponentEnumerator) -> Option<Vec<LaunchableComponent>> {
    match enumerator.launchable_components() {
        Ok(components) => Some(components),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "listing launchable components failed");
            None
        }
    }
}

fn describe_name(name: &Option<&str>) -> String {
    name.unwrap_or("<missing drawable>").to_string()
}

/// Process each item independently and tally the outcomes.
fn fold_items<T>(
    items: impl IntoIterator<Item = T>,
    mode: ExportMode,
    describe: impl Fn(&T) -> String,
    mut step: impl FnMut(&T) -> Result<ItemOutcome>,
) -> ExtractionSummary {
    items.into_iter().fold(ExtractionSummary::default(), |summary, item| {
        let outcome = step(&item).unwrap_or_else(ItemOutcome::Failed);
        match &outcome {
            ItemOutcome::Written => {}
            ItemOutcome::Skipped(reason) => {
                tracing::debug!(mode = mode.as_str(), item = %describe(&item), ?reason, "skipped")
            }
            ItemOutcome::Failed(err) => {
                tracing::warn!(
                    mode = mode.as_str(),
                    item = %describe(&item),
                    error = %format!("{err:#}"),
                    "item failed"
                )
            }
        }
        summary.record(&outcome)
    })
}
