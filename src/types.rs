// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logical bucket an asset is sorted into.
///
/// The classified variants double as the names of the directories created
/// under the output directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Assets,
    Config,
    Layout,
    Locales,
    Sections,
    Snippets,
    Templates,
    #[default]
    Unclassified,
}

impl AssetType {
    /// Every type that can own an output directory, in default pattern order.
    pub const CLASSIFIED: [AssetType; 7] = [
        AssetType::Assets,
        AssetType::Config,
        AssetType::Layout,
        AssetType::Locales,
        AssetType::Sections,
        AssetType::Snippets,
        AssetType::Templates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Assets => "assets",
            AssetType::Config => "config",
            AssetType::Layout => "layout",
            AssetType::Locales => "locales",
            AssetType::Sections => "sections",
            AssetType::Snippets => "snippets",
            AssetType::Templates => "templates",
            AssetType::Unclassified => "unclassified",
        }
    }

    pub fn is_classified(&self) -> bool {
        *self != AssetType::Unclassified
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assets" => Ok(AssetType::Assets),
            "config" => Ok(AssetType::Config),
            "layout" => Ok(AssetType::Layout),
            "locales" => Ok(AssetType::Locales),
            "sections" => Ok(AssetType::Sections),
            "snippets" => Ok(AssetType::Snippets),
            "templates" => Ok(AssetType::Templates),
            "unclassified" => Ok(AssetType::Unclassified),
            other => Err(format!(
                "unknown asset type: {other} (expected one of assets, config, layout, locales, sections, snippets, templates)"
            )),
        }
    }
}

/// File-system event kind that triggered a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetAction {
    Add,
    Update,
    Remove,
}

impl AssetAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetAction::Add => "add",
            AssetAction::Update => "update",
            AssetAction::Remove => "remove",
        }
    }

    /// Whether this action writes the target (as opposed to deleting it).
    pub fn is_write(&self) -> bool {
        matches!(self, AssetAction::Add | AssetAction::Update)
    }
}

impl fmt::Display for AssetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
