// src/plugins/stats.rs

use std::time::Duration;

use tracing::{error, info, warn};

use crate::compilation::CompilationStats;
use crate::compiler::Compiler;
use crate::plugins::Plugin;

pub const PLUGIN_NAME: &str = "StatsPlugin";

/// Reports each finished compilation: errors, else warnings, else success.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsPlugin;

/// What [`StatsPlugin`] reports for one compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsSummary {
    Failed { errors: usize },
    Warnings { warnings: usize },
    Success { elapsed: Duration },
}

impl StatsSummary {
    pub fn of(stats: &CompilationStats) -> Self {
        if stats.has_errors() {
            StatsSummary::Failed {
                errors: stats.errors.len(),
            }
        } else if stats.has_warnings() {
            StatsSummary::Warnings {
                warnings: stats.warnings.len(),
            }
        } else {
            StatsSummary::Success {
                elapsed: stats.time,
            }
        }
    }
}

fn report(stats: &CompilationStats) {
    match StatsSummary::of(stats) {
        StatsSummary::Failed { errors } => {
            error!(errors, "Compilation failed");
            for e in &stats.errors {
                error!("{e}");
            }
        }
        StatsSummary::Warnings { warnings } => {
            warn!(warnings, "Compiled with {warnings} warnings");
            for w in &stats.warnings {
                warn!("{w}");
            }
        }
        StatsSummary::Success { elapsed } => {
            info!(
                assets = stats.assets.len(),
                "Successfully compiled in {} ms",
                elapsed.as_millis()
            );
        }
    }
}

impl Plugin for StatsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn apply(&self, compiler: &Compiler) {
        compiler.hooks().done.tap_sync(PLUGIN_NAME, |stats| {
            report(stats);
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_take_precedence_over_warnings() {
        let mut stats = CompilationStats::default();
        stats.add_warning("w");
        assert_eq!(StatsSummary::of(&stats), StatsSummary::Warnings { warnings: 1 });
        stats.add_error("e");
        assert_eq!(StatsSummary::of(&stats), StatsSummary::Failed { errors: 1 });
    }

    #[test]
    fn clean_run_reports_elapsed_time() {
        let stats = CompilationStats {
            time: Duration::from_millis(12),
            ..CompilationStats::default()
        };
        assert_eq!(
            StatsSummary::of(&stats),
            StatsSummary::Success {
                elapsed: Duration::from_millis(12)
            }
        );
    }
}
