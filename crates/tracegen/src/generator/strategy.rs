//! Generation strategies and the registry that resolves them.

use super::{NaiveGenerator, TemporalGenerator, TestGenerator};
use crate::config::TraceMode;
use crate::result::{TracegenError, TracegenResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a trace is turned into scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationStrategy {
    /// Replay each distinct observed tuple
    #[default]
    TraceBasedBasic,
    /// Per-receiver state transitions
    TraceBasedAdvanced,
    /// Delegated to an external language-model service
    AiAssisted,
}

impl GenerationStrategy {
    /// Every strategy, in declaration order.
    pub const ALL: &'static [Self] = &[
        Self::TraceBasedBasic,
        Self::TraceBasedAdvanced,
        Self::AiAssisted,
    ];

    /// Configuration name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TraceBasedBasic => "trace-based-basic",
            Self::TraceBasedAdvanced => "trace-based-advanced",
            Self::AiAssisted => "ai-assisted",
        }
    }

    /// One-line description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::TraceBasedBasic => "one test per distinct observed invocation",
            Self::TraceBasedAdvanced => "state transitions per receiver, with field deltas",
            Self::AiAssisted => "external language-model generator",
        }
    }

    /// Shipped with this crate.
    #[must_use]
    pub const fn is_builtin(self) -> bool {
        !matches!(self, Self::AiAssisted)
    }

    /// Built-in strategy matching a capture shape.
    #[must_use]
    pub const fn for_trace_mode(mode: TraceMode) -> Self {
        match mode {
            TraceMode::Naive => Self::TraceBasedBasic,
            TraceMode::Temporal => Self::TraceBasedAdvanced,
        }
    }
}

impl std::fmt::Display for GenerationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStrategy {
    type Err = TracegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                TracegenError::configuration(format!(
                    "unknown generation strategy '{s}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

/// Listing entry for `strategies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategyInfo {
    /// Strategy
    pub strategy: GenerationStrategy,
    /// Description
    pub description: &'static str,
    /// A generator is available
    pub available: bool,
}

/// Resolves a [`GenerationStrategy`] to a generator.
///
/// The basic and advanced strategies are built in. Registered generators
/// take precedence over the built-ins for their strategy.
pub struct StrategyRegistry {
    naive: NaiveGenerator,
    temporal: TemporalGenerator,
    external: Vec<Box<dyn TestGenerator>>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let external: Vec<GenerationStrategy> =
            self.external.iter().map(|g| g.strategy()).collect();
        f.debug_struct("StrategyRegistry")
            .field("external", &external)
            .finish_non_exhaustive()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyRegistry {
    /// Registry with the built-in generators only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            naive: NaiveGenerator,
            temporal: TemporalGenerator,
            external: Vec::new(),
        }
    }

    /// Add a generator, replacing any earlier registration for its strategy.
    pub fn register(&mut self, generator: Box<dyn TestGenerator>) {
        let strategy = generator.strategy();
        self.external.retain(|g| g.strategy() != strategy);
        tracing::debug!(%strategy, "generator registered");
        self.external.push(generator);
    }

    /// Generator for `strategy`.
    pub fn generator(&self, strategy: GenerationStrategy) -> TracegenResult<&dyn TestGenerator> {
        if let Some(external) = self.external.iter().find(|g| g.strategy() == strategy) {
            return Ok(external.as_ref());
        }
        match strategy {
            GenerationStrategy::TraceBasedBasic => Ok(&self.naive),
            GenerationStrategy::TraceBasedAdvanced => Ok(&self.temporal),
            GenerationStrategy::AiAssisted => Err(TracegenError::configuration(format!(
                "strategy '{strategy}' needs an external generator and none is registered"
            ))),
        }
    }

    /// Every strategy with its availability.
    #[must_use]
    pub fn describe(&self) -> Vec<StrategyInfo> {
        GenerationStrategy::ALL
            .iter()
            .map(|&strategy| StrategyInfo {
                strategy,
                description: strategy.description(),
                available: self.generator(strategy).is_ok(),
            })
            .collect()
    }
}
