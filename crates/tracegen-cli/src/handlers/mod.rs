//! Command handlers, one module per subcommand
//!
//! Each handler keeps its pure helpers public so they can be tested without
//! spawning the binary.

pub mod analyze;
pub mod emit;
pub mod generate;
pub mod inspect;
pub mod plan;

pub use analyze::{analyzer_options, execute_analyze};
pub use emit::execute_emit;
pub use generate::{execute_generate, generate, resolve_options, resolve_strategy};
pub use inspect::{describe, execute_inspect};
pub use plan::{execute_plan, plan, PlanOutput};

use crate::config::CliConfig;
use std::fmt::Write as _;
use tracegen::StrategyRegistry;

/// One line per strategy: name, availability and description.
#[must_use]
pub fn list_strategies(registry: &StrategyRegistry) -> String {
    let mut out = String::new();
    for info in registry.describe() {
        let availability = if info.available { "built-in" } else { "external" };
        let _ = writeln!(
            out,
            "{:<22} {:<9} {}",
            info.strategy.as_str(),
            availability,
            info.description
        );
    }
    out
}

/// Execute the strategies command
pub fn execute_strategies(_config: &CliConfig) {
    print!("{}", list_strategies(&StrategyRegistry::new()));
}
