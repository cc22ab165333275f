// src/plugins/mod.rs

//! Plugin capability and the registry of plugins compiled into the binary.
//!
//! A plugin registers taps on the compiler's hooks in [`Plugin::apply`],
//! which runs once when the compiler is built. Plugins named in
//! `[[plugins]]` are resolved through [`PluginRegistry`]; programmatic users
//! pass plugin values directly to [`crate::melter_with_plugins`].

pub mod paths;
pub mod replace;
pub mod stats;

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::compiler::{Compiler, ErrorOptions};
use crate::config::PluginSpec;

pub use paths::PathsPlugin;
pub use replace::ReplacePlugin;
pub use stats::{StatsPlugin, StatsSummary};

pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Register taps. Must not block.
    fn apply(&self, compiler: &Compiler);
}

/// Builds a plugin from its config entry, or lists what is wrong with it.
pub type PluginFactory = fn(&PluginSpec) -> Result<Box<dyn Plugin>, Vec<String>>;

/// Name → factory table for plugins addressable from configuration.
#[derive(Clone)]
pub struct PluginRegistry {
    factories: IndexMap<&'static str, PluginFactory>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    /// Registry of every plugin shipped with melter.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(replace::PLUGIN_NAME, ReplacePlugin::from_spec);
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: PluginFactory) {
        self.factories.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// `None` if no plugin is registered under `spec.name`.
    pub fn create(&self, spec: &PluginSpec) -> Option<Result<Box<dyn Plugin>, Vec<String>>> {
        self.factories.get(spec.name.as_str()).map(|factory| factory(spec))
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Instantiate configured plugins, reporting unknown names and invalid
/// options through [`Compiler::add_errors`] with `bail`.
pub fn resolve_plugins(
    compiler: &Compiler,
    registry: &PluginRegistry,
    specs: &[PluginSpec],
) -> Vec<Box<dyn Plugin>> {
    let mut plugins = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        match registry.create(spec) {
            Some(Ok(plugin)) => {
                debug!(plugin = plugin.name(), index = i, "resolved configured plugin");
                plugins.push(plugin);
            }
            Some(Err(problems)) => compiler.add_errors(
                &format!("Invalid options for plugin '{}' (plugins[{i}])", spec.name),
                &problems,
                ErrorOptions { bail: true },
            ),
            None => compiler.add_errors(
                &format!("Unknown plugin '{}' (plugins[{i}])", spec.name),
                &[],
                ErrorOptions { bail: true },
            ),
        }
    }
    plugins
}

/// Built-ins enabled by the compiler's configuration, in load order.
pub fn builtin_plugins(compiler: &Compiler) -> Vec<Box<dyn Plugin>> {
    let mut plugins: Vec<Box<dyn Plugin>> = Vec::new();
    if compiler.config().stats {
        plugins.push(Box::new(StatsPlugin));
    }
    if let Some(classifier) = compiler.classifier() {
        plugins.push(Box::new(PathsPlugin::new(classifier.clone())));
    }
    plugins
}
