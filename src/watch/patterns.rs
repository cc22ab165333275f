// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indexmap::IndexMap;
use regex::Regex;

use crate::types::AssetType;

/// Ordered mapping from asset type to the regular expressions that select it.
///
/// Order matters twice: types are tried in map order, and patterns within a
/// type in list order. The first match wins.
pub type PathPatterns = IndexMap<AssetType, Vec<String>>;

/// Directory name whose children keep their parent in the output filename.
pub const CUSTOMERS_SEGMENT: &str = "customers";

/// Built-in classification table.
///
/// ```toml
/// [paths]
/// assets = ['assets/[^/]*\.*$']
/// config = ['config/[^/]*\.json$']
/// layout = ['layout/[^/]*\.liquid$']
/// locales = ['locales/[^/]*\.json$']
/// sections = ['sections/[^/]*\.liquid$']
/// snippets = ['snippets/[^/]*\.liquid$']
/// templates = [
///     'templates/[^/]*\.liquid$',
///     'templates/[^/]*\.json$',
///     'templates/customers/[^/]*\.liquid$',
///     'templates/customers/[^/]*\.json$',
/// ]
/// ```
pub fn default_path_patterns() -> PathPatterns {
    let table: [(AssetType, &[&str]); 7] = [
        (AssetType::Assets, &[r"assets/[^/]*\.*$"]),
        (AssetType::Config, &[r"config/[^/]*\.json$"]),
        (AssetType::Layout, &[r"layout/[^/]*\.liquid$"]),
        (AssetType::Locales, &[r"locales/[^/]*\.json$"]),
        (AssetType::Sections, &[r"sections/[^/]*\.liquid$"]),
        (AssetType::Snippets, &[r"snippets/[^/]*\.liquid$"]),
        (
            AssetType::Templates,
            &[
                r"templates/[^/]*\.liquid$",
                r"templates/[^/]*\.json$",
                r"templates/customers/[^/]*\.liquid$",
                r"templates/customers/[^/]*\.json$",
            ],
        ),
    ];

    table
        .into_iter()
        .map(|(ty, pats)| (ty, pats.iter().map(|p| p.to_string()).collect()))
        .collect()
}

/// Merge user patterns over the defaults.
///
/// A type present in `user` replaces that type's default list in place.
pub fn merge_path_patterns(user: &PathPatterns) -> PathPatterns {
    let mut merged = default_path_patterns();
    for (ty, patterns) in user {
        // `insert` keeps the slot of an existing key.
        merged.insert(*ty, patterns.clone());
    }
    merged
}

/// Compiled, ordered regex classifier.
#[derive(Clone)]
pub struct PathClassifier {
    rules: Vec<(AssetType, Vec<Regex>)>,
}

impl fmt::Debug for PathClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathClassifier")
            .field(
                "types",
                &self.rules.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl PathClassifier {
    pub fn new(patterns: &PathPatterns) -> Result<Self> {
        let mut rules = Vec::with_capacity(patterns.len());
        for (ty, pats) in patterns {
            let mut compiled = Vec::with_capacity(pats.len());
            for pat in pats {
                let re = Regex::new(pat)
                    .with_context(|| format!("invalid pattern for type {ty}: {pat}"))?;
                compiled.push(re);
            }
            rules.push((*ty, compiled));
        }
        Ok(Self { rules })
    }

    /// Classifier over [`default_path_patterns`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(&default_path_patterns())
    }

    /// Return the first type whose pattern matches `rel_path`, if any.
    ///
    /// Patterns are searched, not anchored: `sections/a.liquid` matches both
    /// `sections/a.liquid` and `theme/sections/a.liquid`.
    pub fn classify(&self, rel_path: &str) -> Option<AssetType> {
        let normalized = normalize_path(rel_path);
        self.rules
            .iter()
            .find(|(_, res)| res.iter().any(|re| re.is_match(&normalized)))
            .map(|(ty, _)| *ty)
    }
}

/// Forward slashes only.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Filename a source path is emitted under.
///
/// Normally the last path segment. When the file lives directly inside a
/// `customers` directory the last two segments are kept, so
/// `templates/customers/account.liquid` becomes `customers/account.liquid`.
pub fn output_filename(rel_path: &str) -> String {
    let normalized = normalize_path(rel_path);
    let mut segments = normalized.rsplit('/').filter(|s| !s.is_empty());
    let Some(file) = segments.next() else {
        return String::new();
    };
    match segments.next() {
        Some(parent) if parent == CUSTOMERS_SEGMENT => format!("{parent}/{file}"),
        _ => file.to_string(),
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// `None` when there is nothing to ignore.
pub fn build_ignore_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    build_globset(patterns)
        .context("building ignore globset")
        .map(Some)
}
