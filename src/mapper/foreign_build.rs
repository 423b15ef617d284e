//! Wiring for targets built by an external script.
//!
//! Each foreign-build target becomes an aggregate driven by a pre-build
//! script phase, and every consumer gains an extra edge to a synthesised
//! [`GraphDependency::ForeignBuildOutput`] sink it can link against. The
//! original edges are left in place. Deciding whether the script actually
//! has to run is deferred to
//! [`ForeignBuildSideEffectsGraphMapper`](super::ForeignBuildSideEffectsGraphMapper),
//! which runs after pruning.

use tracing::debug;

use super::{GraphMapper, MapperEnvironment, MapperOutput, MapperStage};
use crate::error::MapperError;
use crate::graph::{
    ForeignBuild, Graph, GraphDependency, GraphTraverser, Product, ScriptOrder, TargetReference,
    TargetScript,
};

/// Tag added to targets rewritten into foreign-build aggregates.
pub const FOREIGN_BUILD_AGGREGATE_TAG: &str = "graphmill:foreign-build-aggregate";

/// Name of the script phase generated for the foreign-build target `name`.
///
/// ```
/// assert_eq!(graphmill::mapper::script_phase_name("RustLib"), "Foreign Build: RustLib");
/// ```
#[must_use]
pub fn script_phase_name(target_name: &str) -> String {
    format!("Foreign Build: {target_name}")
}

/// Rewrites foreign-build targets into aggregates and wires their output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForeignBuildGraphMapper;

impl ForeignBuildGraphMapper {
    fn script_phase(target_name: &str, foreign_build: &ForeignBuild) -> TargetScript {
        TargetScript {
            name: script_phase_name(target_name),
            order: ScriptOrder::PreBuild,
            script: foreign_build.script.clone(),
            input_paths: foreign_build
                .inputs
                .iter()
                .filter_map(|input| input.declared_path().map(ToOwned::to_owned))
                .collect(),
            output_paths: vec![foreign_build.output.path.clone()],
        }
    }

    fn wire(graph: &mut Graph, reference: &TargetReference, foreign_build: &ForeignBuild) {
        if let Some(target) = graph.target_mut(&reference.path, &reference.name) {
            let phase = Self::script_phase(&reference.name, foreign_build);
            target.scripts.retain(|script| script.name != phase.name);
            target.scripts.insert(0, phase);
            target.product = Product::Aggregate;
            target
                .metadata
                .tags
                .insert(FOREIGN_BUILD_AGGREGATE_TAG.to_owned());
        }

        let output = GraphDependency::foreign_build_output(
            reference.name.clone(),
            reference.path.clone(),
            foreign_build.output.linking,
        );
        graph.dependencies.entry(output.clone()).or_default();

        let mut consumers = 0_usize;
        for deps in graph.dependencies.values_mut() {
            if deps.iter().any(|dep| dep.is_target(&reference.path, &reference.name)) {
                deps.insert(output.clone());
                consumers += 1;
            }
        }
        debug!(foreign_target = %reference, consumers, "wired foreign build output");
    }
}

impl GraphMapper for ForeignBuildGraphMapper {
    fn name(&self) -> &'static str {
        "foreign-build"
    }

    fn stage(&self) -> MapperStage {
        MapperStage::Wiring
    }

    fn map(
        &self,
        mut graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<MapperOutput, MapperError> {
        let foreign_builds: Vec<(TargetReference, ForeignBuild)> =
            GraphTraverser::new(&graph)
                .foreign_build_targets()
                .into_iter()
                .filter_map(|target| {
                    target
                        .target
                        .foreign_build
                        .clone()
                        .map(|foreign_build| (target.reference(), foreign_build))
                })
                .collect();

        for (reference, foreign_build) in &foreign_builds {
            Self::wire(&mut graph, reference, foreign_build);
        }
        Ok(MapperOutput::unchanged(graph, environment))
    }
}
