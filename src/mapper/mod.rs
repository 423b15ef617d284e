//! Ordered graph transformation stages.
//!
//! A [`GraphMapper`] takes a [`Graph`] and a [`MapperEnvironment`] by value
//! and returns a [`MapperOutput`]: the next graph, the side effects it wants
//! performed, and the amended environment. A [`SequentialGraphMapper`]
//! threads one output into the next mapper and accumulates side effects.
//! Stages never run concurrently and the first error aborts the run without
//! publishing a partial graph.
//!
//! # Examples
//!
//! ```
//! use graphmill::graph::Graph;
//! use graphmill::mapper::{FocusTargetsGraphMapper, SequentialGraphMapper};
//!
//! let pipeline = SequentialGraphMapper::new(vec![Box::new(
//!     FocusTargetsGraphMapper::default(),
//! )])
//! .expect("valid order");
//! let output = pipeline.run(Graph::default()).expect("mapped");
//! assert!(output.side_effects.is_empty());
//! ```

mod cached_artifacts;
mod environment;
mod focus;
mod foreign_build;
mod foreign_build_side_effects;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};

use crate::error::MapperError;
use crate::graph::Graph;
use crate::side_effect::SideEffectDescriptor;

pub use cached_artifacts::{ArtifactKind, CachedArtifact, CachedArtifactsGraphMapper};
pub use environment::{MapperEnvironment, ReplacementRecord};
pub use focus::FocusTargetsGraphMapper;
pub use foreign_build::{FOREIGN_BUILD_AGGREGATE_TAG, ForeignBuildGraphMapper, script_phase_name};
pub use foreign_build_side_effects::{
    ArtifactProbe, FileSystemProbe, ForeignBuildSideEffectsGraphMapper, WORKING_DIRECTORY_ENV,
};

/// Position of a mapper in the pipeline. Stages must not decrease along a
/// sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperStage {
    /// Reshapes the graph for every consumer, pruned or not.
    Wiring,
    /// Decides the active build set.
    Selection,
    /// Swaps live targets for prebuilt artefacts.
    Caching,
    /// Emits work for what is still live.
    SideEffects,
}

impl fmt::Display for MapperStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Wiring => "wiring",
            Self::Selection => "selection",
            Self::Caching => "caching",
            Self::SideEffects => "side-effects",
        };
        f.write_str(label)
    }
}

/// Result of one mapper run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperOutput {
    /// The transformed graph.
    pub graph: Graph,
    /// Side effects requested so far.
    pub side_effects: Vec<SideEffectDescriptor>,
    /// Cross-stage bookkeeping.
    pub environment: MapperEnvironment,
}

impl MapperOutput {
    /// An output with no side effects.
    #[must_use]
    pub const fn unchanged(graph: Graph, environment: MapperEnvironment) -> Self {
        Self {
            graph,
            side_effects: Vec::new(),
            environment,
        }
    }
}

/// A single graph transformation stage.
pub trait GraphMapper: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Where this mapper sits in the pipeline.
    fn stage(&self) -> MapperStage;

    /// Transform `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError`] when the transformation cannot complete.
    fn map(&self, graph: Graph, environment: MapperEnvironment)
    -> Result<MapperOutput, MapperError>;
}

/// Runs mappers one after another.
pub struct SequentialGraphMapper {
    mappers: Vec<Box<dyn GraphMapper>>,
}

impl fmt::Debug for SequentialGraphMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.mappers.iter().map(|mapper| mapper.name()))
            .finish()
    }
}

impl SequentialGraphMapper {
    /// Assemble a pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::StageOutOfOrder`] when a mapper's stage comes
    /// before the stage of a mapper listed ahead of it.
    pub fn new(mappers: Vec<Box<dyn GraphMapper>>) -> Result<Self, MapperError> {
        let mut previous: Option<MapperStage> = None;
        for mapper in &mappers {
            let stage = mapper.stage();
            if let Some(prev) = previous
                && stage < prev
            {
                return Err(MapperError::StageOutOfOrder {
                    mapper: mapper.name(),
                    stage,
                    previous: prev,
                });
            }
            previous = Some(stage);
        }
        Ok(Self { mappers })
    }

    /// Names of the mappers in execution order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.mappers.iter().map(|mapper| mapper.name())
    }

    /// Run every mapper starting from an empty environment.
    ///
    /// # Errors
    ///
    /// Returns the first [`MapperError`] raised by any mapper.
    pub fn run(&self, graph: Graph) -> Result<MapperOutput, MapperError> {
        self.map(graph, MapperEnvironment::default())
    }

    /// Run every mapper, threading `environment` through.
    ///
    /// # Errors
    ///
    /// Returns the first [`MapperError`] raised by any mapper.
    pub fn map(
        &self,
        graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<MapperOutput, MapperError> {
        let mut output = MapperOutput::unchanged(graph, environment);
        for mapper in &self.mappers {
            let span = debug_span!("mapper", name = mapper.name(), stage = %mapper.stage());
            let _entered = span.enter();
            let MapperOutput {
                graph: next_graph,
                side_effects,
                environment: next_environment,
            } = mapper.map(output.graph, output.environment)?;
            debug!(side_effects = side_effects.len(), "mapper finished");
            output.graph = next_graph;
            output.environment = next_environment;
            output.side_effects.extend(side_effects);
        }
        info!(
            mappers = self.mappers.len(),
            side_effects = output.side_effects.len(),
            pruned = output.graph.pruned_targets().len(),
            "graph mapping complete",
        );
        Ok(output)
    }
}
