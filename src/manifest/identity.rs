use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Folder tag appended to raw-stream exports (`com_example_pack_icon_pack_xml`).
pub const RAW_FOLDER_TAG: &str = "_icon_pack_xml";
/// Folder tag appended to decoded-bitmap exports (`com_example_pack_icon_pack`).
pub const BITMAP_FOLDER_TAG: &str = "_icon_pack";
/// Fixed folder for launcher icons of every installed component.
pub const DEVICE_ICONS_FOLDER: &str = "deviceAppIcons";

/// Identity of an installed application bundle (e.g., `com.example.pack`).
///
/// Used as the namespace key when resolving resources that live inside a
/// foreign package rather than our own.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIdentity(pub String);

impl PackageIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Export folder for this package: dots become underscores, then `tag`.
    pub fn folder_name(&self, tag: &str) -> String {
        format!("{}{tag}", self.0.replace('.', "_"))
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A launchable component on the device: owning package plus activity class.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ComponentName {
    pub package: PackageIdentity,
    pub class_name: String,
}

impl ComponentName {
    pub fn new(package: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            package: PackageIdentity::new(package),
            class_name: class_name.into(),
        }
    }

    /// The `ComponentInfo{package/class}` form used by appfilter documents.
    pub fn flatten(&self) -> String {
        format!("ComponentInfo{{{}/{}}}", self.package, self.class_name)
    }
}

/// Export operations offered by the tool.
///
/// Known variants keep CLI names and summary output consistent; unknown names
/// are rejected rather than carried along.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExportMode {
    Appfilter,
    Drawables,
    Bitmaps,
    DeviceIcons,
    MyAppfilters,
}

impl ExportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportMode::Appfilter => "appfilter",
            ExportMode::Drawables => "drawables",
            ExportMode::Bitmaps => "bitmaps",
            ExportMode::DeviceIcons => "device-icons",
            ExportMode::MyAppfilters => "my-appfilters",
        }
    }

    /// Whether the mode operates on a single icon pack's manifest.
    pub fn needs_icon_pack(&self) -> bool {
        matches!(
            self,
            ExportMode::Appfilter | ExportMode::Drawables | ExportMode::Bitmaps
        )
    }
}

impl TryFrom<&str> for ExportMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "appfilter" => Ok(ExportMode::Appfilter),
            "drawables" => Ok(ExportMode::Drawables),
            "bitmaps" => Ok(ExportMode::Bitmaps),
            "device-icons" => Ok(ExportMode::DeviceIcons),
            "my-appfilters" => Ok(ExportMode::MyAppfilters),
            other => anyhow::bail!("unknown export mode: {other}"),
        }
    }
}

impl Serialize for ExportMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExportMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        ExportMode::try_from(value.as_str()).map_err(serde::de::Error::custom)
    }
}
