//! Shared library for the icondigger tool.
//!
//! The crate reads the appfilter manifest shipped inside installed icon packs
//! and extracts the drawables it names. Public items here form the contract
//! the `icondigger` binary depends on: device-root discovery, output and
//! action configuration, plus re-exports of the manifest model, resource
//! capabilities, session, and export pipeline.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod bitmap;
pub mod discovery;
pub mod logging;
pub mod manifest;
pub mod pipeline;
pub mod resolver;
pub mod resources;
pub mod runtime;
pub mod session;
pub mod sink;

pub use bitmap::Bitmap;
pub use discovery::{
    ComponentEnumerator, ICON_PACK_ACTIONS, IconPackInfo, LaunchableComponent, component_record,
    installed_icon_packs,
};
pub use manifest::{
    BITMAP_FOLDER_TAG, ComponentMapping, ComponentName, DEVICE_ICONS_FOLDER, DrawableCatalog,
    ExportMode, IconPackManifest, PackageIdentity, RAW_FOLDER_TAG, load_manifest, parse_appfilter,
    read_manifest,
};
pub use pipeline::{
    ExportContext, ExtractionSummary, ItemOutcome, SkipReason, export_appfilter, export_bitmaps,
    export_device_icons, export_my_appfilters, export_raw_drawables, run_export,
};
pub use resolver::{ResolvedAsset, ResourceResolver, extension_from_path, mime_for_extension};
pub use resources::{
    DirectoryDevice, NO_RESOURCE, PackageResources, ResourceError, ResourceId, ResourceSource,
};
pub use runtime::{BackgroundRunner, LoadingFlag};
pub use session::{IconPackSession, LoadedPack};
pub use sink::{AssetSink, DirectorySink, SinkBody, SinkEntry};

/// Directory holding one sub-directory per installed package.
pub const DEVICE_ROOT_ENV: &str = "ICONDIGGER_DEVICE_ROOT";
/// Where exports are written.
pub const OUTPUT_ENV: &str = "ICONDIGGER_OUTPUT";
/// Overrides the icon pack advertisement actions (comma or whitespace separated).
pub const ACTIONS_ENV: &str = "ICONDIGGER_ACTIONS";

const DEVICE_SENTINEL: &str = "packages";
const DEFAULT_OUTPUT_DIR: &str = "Downloads";

/// Returns the `packages/` directory under `candidate` when present.
fn device_dir_under(candidate: &Path) -> Option<PathBuf> {
    let dir = candidate.join(DEVICE_SENTINEL);
    dir.is_dir().then_some(dir)
}

fn device_root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !hint_path.is_dir() {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if let Some(found) = device_dir_under(&dir) {
            return Some(found);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the device root.
///
/// Search order: the explicit `--device` value (which must exist), then
/// `ICONDIGGER_DEVICE_ROOT`, then a `packages/` directory in the current
/// directory or any ancestor.
pub fn find_device_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_dir() {
            bail!("device root {} is not a directory", path.display());
        }
        return Ok(fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
    }

    if let Ok(env_root) = env::var(DEVICE_ROOT_ENV) {
        if let Some(root) = device_root_from_hint(&env_root) {
            return Ok(root);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(root) = search_upwards(&cwd) {
            return Ok(root);
        }
    }

    bail!(
        "Unable to locate a device root. Set {DEVICE_ROOT_ENV} or pass --device <dir>."
    );
}

/// Output directory: explicit value, then `ICONDIGGER_OUTPUT`, then `./Downloads`.
pub fn resolve_output_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    env::var_os(OUTPUT_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
}

/// Advertisement actions: explicit tokens, then `ICONDIGGER_ACTIONS`, then the defaults.
pub fn resolve_actions(explicit: &[String]) -> Vec<String> {
    let from_flags: Vec<String> = explicit.iter().flat_map(|raw| split_list(raw)).collect();
    if !from_flags.is_empty() {
        return from_flags;
    }
    if let Ok(value) = env::var(ACTIONS_ENV) {
        let from_env = split_list(&value);
        if !from_env.is_empty() {
            return from_env;
        }
    }
    ICON_PACK_ACTIONS.iter().map(|action| action.to_string()).collect()
}

/// Split comma- or whitespace-delimited configuration lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn split_list_accepts_commas_and_spaces() {
        assert_eq!(
            split_list("a.THEME, b.THEME  c.THEME,,"),
            vec!["a.THEME", "b.THEME", "c.THEME"]
        );
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn explicit_actions_win() {
        let actions = resolve_actions(&["x.THEME,y.THEME".to_string()]);
        assert_eq!(actions, vec!["x.THEME", "y.THEME"]);
    }

    #[test]
    fn explicit_device_root_must_exist() {
        let dir = TempDir::new().unwrap();
        let found = find_device_root(Some(dir.path())).unwrap();
        assert_eq!(found, fs::canonicalize(dir.path()).unwrap());
        assert!(find_device_root(Some(&dir.path().join("missing"))).is_err());
    }

    #[test]
    fn upward_search_finds_packages_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("packages")).unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let found = search_upwards(&nested).unwrap();
        assert_eq!(found, fs::canonicalize(dir.path()).unwrap().join("packages"));
    }

    #[test]
    fn explicit_output_dir_is_used_verbatim() {
        let path = PathBuf::from("/tmp/exports");
        assert_eq!(resolve_output_dir(Some(&path)), path);
    }
}
