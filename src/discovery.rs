//! Installed-package discovery.
//!
//! Icon packs advertise themselves through launcher theme intent actions;
//! `installed_icon_packs` unions the packages answering any of them. The same
//! enumerator also lists every launchable component, which backs the device
//! icon and "my appfilters" exports.

use crate::bitmap::Bitmap;
use crate::manifest::{ComponentName, PackageIdentity};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;

/// Intent actions launchers use to find icon packs.
pub const ICON_PACK_ACTIONS: &[&str] = &[
    "org.adw.launcher.THEMES",
    "com.novalauncher.THEME",
    "com.teslacoilsw.launcher.THEME",
    "com.fede.launcher.THEME_ICONPACK",
    "com.anddoes.launcher.THEME",
    "com.dlto.atom.launcher.THEME",
];

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
/// Icon pack shown in the selection list.
pub struct IconPackInfo {
    pub name: String,
    pub package: PackageIdentity,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
/// Launchable component plus the label the launcher shows for it.
pub struct LaunchableComponent {
    pub component: ComponentName,
    pub label: String,
}

/// Enumerates installed packages and launchable components.
pub trait ComponentEnumerator {
    /// Packages with an activity answering `action`.
    fn packages_for_action(&self, action: &str) -> Result<Vec<PackageIdentity>>;

    /// Human-readable application label.
    fn package_label(&self, package: &PackageIdentity) -> Result<String>;

    /// Every launchable component on the device.
    fn launchable_components(&self) -> Result<Vec<LaunchableComponent>>;

    /// Launcher icon for `component`, rendered at `size` x `size`.
    fn component_icon(&self, component: &LaunchableComponent, size: u32) -> Result<Bitmap>;
}

/// List installed icon packs, deduplicated by package and sorted by label.
///
/// Packages whose label cannot be loaded are left out; a failing action query
/// only drops that action's results.
pub fn installed_icon_packs<S: AsRef<str>>(
    enumerator: &dyn ComponentEnumerator,
    actions: &[S],
) -> Vec<IconPackInfo> {
    let mut seen = BTreeSet::new();
    let mut packs = Vec::new();
    for action in actions {
        let action = action.as_ref();
        let packages = match enumerator.packages_for_action(action) {
            Ok(packages) => packages,
            Err(err) => {
                tracing::warn!(action, error = %format!("{err:#}"), "icon pack query failed");
                continue;
            }
        };
        for package in packages {
            if !seen.insert(package.clone()) {
                continue;
            }
            match enumerator.package_label(&package) {
                Ok(name) => packs.push(IconPackInfo { name, package }),
                Err(err) => {
                    tracing::debug!(
                        package = %package,
                        error = %format!("{err:#}"),
                        "ignoring package without label"
                    )
                }
            }
        }
    }
    packs.sort_by(|a, b| a.name.cmp(&b.name));
    packs
}

/// One line of the "my appfilters" export.
///
/// Single-quoted pseudo-JSON; values are written verbatim without escaping.
pub fn component_record(component: &LaunchableComponent) -> String {
    format!(
        "{{'package':'{}','activity':'{}','name':'{}'}}",
        component.component.package, component.component.class_name, component.label
    )
}
