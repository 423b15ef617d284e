//! Swap live targets for prebuilt artefacts supplied by the caller.
//!
//! The caller decides which artefacts are available; this mapper performs no
//! I/O. Consumers' edges to a replaced target (and to its foreign-build
//! output, if any) are redirected to the artefact, the target is pruned, and
//! a [`ReplacementRecord`] tells later stages what happened. Targets that
//! were only live because a replaced target needed them are pruned as well.

use std::collections::{BTreeMap, BTreeSet};

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GraphMapper, MapperEnvironment, MapperOutput, MapperStage, ReplacementRecord};
use crate::error::MapperError;
use crate::graph::{
    BinaryLinking, Graph, GraphDependency, GraphTarget, GraphTraverser, TargetReference,
};

/// Shape of a prebuilt artefact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Framework bundle.
    Framework,
    /// Plain library.
    Library,
}

/// A prebuilt artefact that can stand in for a target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedArtifact {
    /// Artefact location.
    pub path: Utf8PathBuf,
    /// Artefact shape.
    pub kind: ArtifactKind,
    /// How consumers link the artefact.
    pub linking: BinaryLinking,
}

impl CachedArtifact {
    /// The edge consumers depend on once the artefact replaces its target.
    #[must_use]
    pub fn dependency(&self) -> GraphDependency {
        match self.kind {
            ArtifactKind::Framework => GraphDependency::Framework {
                path: self.path.clone(),
                linking: self.linking,
            },
            ArtifactKind::Library => GraphDependency::Library {
                path: self.path.clone(),
                linking: self.linking,
            },
        }
    }
}

/// Replaces live targets with cached artefacts, keyed by target name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CachedArtifactsGraphMapper {
    artifacts: BTreeMap<String, CachedArtifact>,
}

impl CachedArtifactsGraphMapper {
    /// Replace targets named in `artifacts`.
    #[must_use]
    pub const fn new(artifacts: BTreeMap<String, CachedArtifact>) -> Self {
        Self { artifacts }
    }

    fn replace(graph: &mut Graph, reference: &TargetReference, artifact: &CachedArtifact) {
        let prebuilt = artifact.dependency();
        let mut consumers = 0_usize;
        for deps in graph.dependencies.values_mut() {
            let before = deps.len();
            deps.retain(|dep| {
                !dep.is_target(&reference.path, &reference.name)
                    && !dep.is_foreign_build_output_of(&reference.path, &reference.name)
            });
            if deps.len() != before {
                deps.insert(prebuilt.clone());
                consumers += 1;
            }
        }
        if let Some(target) = graph.target_mut(&reference.path, &reference.name) {
            target.prune = true;
        }
        debug!(
            replaced_target = %reference,
            artifact = %artifact.path,
            consumers,
            "replaced target with cached artifact",
        );
    }
}

impl GraphMapper for CachedArtifactsGraphMapper {
    fn name(&self) -> &'static str {
        "cached-artifacts"
    }

    fn stage(&self) -> MapperStage {
        MapperStage::Caching
    }

    fn map(
        &self,
        mut graph: Graph,
        mut environment: MapperEnvironment,
    ) -> Result<MapperOutput, MapperError> {
        if self.artifacts.is_empty() {
            return Ok(MapperOutput::unchanged(graph, environment));
        }
        let traverser = GraphTraverser::new(&graph);
        let live: BTreeSet<GraphTarget<'_>> = traverser
            .all_targets()
            .into_iter()
            .filter(|target| !target.target.prune)
            .collect();
        let replacements: Vec<(TargetReference, &CachedArtifact)> = live
            .iter()
            .filter_map(|target| {
                self.artifacts
                    .get(target.name())
                    .map(|artifact| (target.reference(), artifact))
            })
            .collect();
        if replacements.is_empty() {
            return Ok(MapperOutput::unchanged(graph, environment));
        }
        let roots = live_roots(&traverser, &live, &environment);

        for (reference, artifact) in replacements {
            Self::replace(&mut graph, &reference, artifact);
            environment.record_replacement(ReplacementRecord {
                target: reference,
                artifact: artifact.clone(),
            });
        }
        prune_unreachable(&mut graph, &roots)?;
        Ok(MapperOutput::unchanged(graph, environment))
    }
}

/// Live targets no other live target depends on, plus every explicitly
/// requested target. Everything that stays live must be reachable from one
/// of them.
fn live_roots(
    traverser: &GraphTraverser<'_>,
    live: &BTreeSet<GraphTarget<'_>>,
    environment: &MapperEnvironment,
) -> BTreeSet<TargetReference> {
    let consumed: BTreeSet<TargetReference> = live
        .iter()
        .flat_map(|target| traverser.direct_target_dependencies(target.path, target.name()))
        .map(|target| target.reference())
        .collect();
    live.iter()
        .map(GraphTarget::reference)
        .filter(|reference| !consumed.contains(reference) || environment.is_requested(reference))
        .collect()
}

/// Prune live targets no longer reachable from a live root.
fn prune_unreachable(
    graph: &mut Graph,
    roots: &BTreeSet<TargetReference>,
) -> Result<(), MapperError> {
    let reachable: BTreeSet<TargetReference> = {
        let traverser = GraphTraverser::new(graph);
        let sources: BTreeSet<GraphTarget<'_>> = roots
            .iter()
            .filter_map(|root| traverser.target(&root.path, &root.name))
            .filter(|target| !target.target.prune)
            .collect();
        traverser
            .transitive_target_dependencies(&sources)?
            .iter()
            .map(GraphTarget::reference)
            .collect()
    };
    let mut pruned = 0_usize;
    for (path, target) in graph.targets_mut() {
        if !target.prune && !reachable.contains(&TargetReference::new(path, target.name.as_str())) {
            target.prune = true;
            pruned += 1;
        }
    }
    debug!(pruned, "pruned targets only needed by cached targets");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{foreign_build, workspace_graph};
    use crate::graph::{Product, Project, ProjectKind, Target};
    use crate::mapper::ForeignBuildGraphMapper;
    use camino::Utf8Path;
    use rstest::{fixture, rstest};

    #[fixture]
    fn core_framework() -> CachedArtifact {
        CachedArtifact {
            path: "/cache/Core.framework".into(),
            kind: ArtifactKind::Framework,
            linking: BinaryLinking::Dynamic,
        }
    }

    /// `/P: App -> Core -> Rust`, where `Rust` is a foreign build.
    fn layered_graph() -> Graph {
        let mut graph = Graph::default();
        graph.add_project(
            Project::new("/P", "P", ProjectKind::Local)
                .with_target(Target::new("App", Product::App))
                .with_target(Target::new("Core", Product::Framework))
                .with_target(
                    Target::new("Rust", Product::StaticLibrary)
                        .with_foreign_build(foreign_build("/missing/librust.a")),
                ),
        );
        graph.add_dependency(
            GraphDependency::target("App", "/P"),
            GraphDependency::target("Core", "/P"),
        );
        graph.add_dependency(
            GraphDependency::target("Core", "/P"),
            GraphDependency::target("Rust", "/P"),
        );
        graph
    }

    fn pruned_names(graph: &Graph) -> Vec<String> {
        graph
            .pruned_targets()
            .into_iter()
            .map(|target| target.name)
            .collect()
    }

    fn mapper(name: &str, artifact: CachedArtifact) -> CachedArtifactsGraphMapper {
        CachedArtifactsGraphMapper::new(BTreeMap::from([(name.to_owned(), artifact)]))
    }

    #[rstest]
    fn consumers_are_redirected_to_the_artifact(core_framework: CachedArtifact) {
        let output = mapper("Core", core_framework.clone())
            .map(workspace_graph("/out/lib.a"), MapperEnvironment::default())
            .expect("map");
        let app = output
            .graph
            .dependencies
            .get(&GraphDependency::target("App", "/App"))
            .expect("App edges");
        assert!(!app.contains(&GraphDependency::target("Core", "/App")));
        assert!(app.contains(&core_framework.dependency()));
    }

    #[rstest]
    fn replaced_target_is_pruned_and_recorded(core_framework: CachedArtifact) {
        let output = mapper("Core", core_framework.clone())
            .map(workspace_graph("/out/lib.a"), MapperEnvironment::default())
            .expect("map");
        let reference = TargetReference::new("/App", "Core");
        assert!(
            output
                .graph
                .target(Utf8Path::new("/App"), "Core")
                .is_some_and(|t| t.prune)
        );
        assert_eq!(
            output.environment.replacement_for(&reference),
            Some(&ReplacementRecord {
                target: reference.clone(),
                artifact: core_framework,
            })
        );
    }

    #[rstest]
    fn foreign_build_output_edges_are_replaced_too() {
        let wired = ForeignBuildGraphMapper
            .map(workspace_graph("/out/lib.a"), MapperEnvironment::default())
            .expect("wire");
        let artifact = CachedArtifact {
            path: "/cache/librust.a".into(),
            kind: ArtifactKind::Library,
            linking: BinaryLinking::Static,
        };
        let output = mapper("RustLib", artifact.clone())
            .map(wired.graph, wired.environment)
            .expect("map");
        let app = output
            .graph
            .dependencies
            .get(&GraphDependency::target("App", "/App"))
            .expect("App edges");
        assert!(app.iter().all(|dep| {
            !dep.is_target(Utf8Path::new("/Native"), "RustLib")
                && !dep.is_foreign_build_output_of(Utf8Path::new("/Native"), "RustLib")
        }));
        assert!(app.contains(&artifact.dependency()));
    }

    #[rstest]
    fn pruned_targets_are_left_alone(core_framework: CachedArtifact) {
        let mut graph = workspace_graph("/out/lib.a");
        if let Some(target) = graph.target_mut(Utf8Path::new("/App"), "Core") {
            target.prune = true;
        }
        let output = mapper("Core", core_framework)
            .map(graph.clone(), MapperEnvironment::default())
            .expect("map");
        assert_eq!(output.graph, graph);
        assert_eq!(output.environment, MapperEnvironment::default());
    }

    #[rstest]
    fn dependencies_only_needed_by_the_replaced_target_are_pruned(
        core_framework: CachedArtifact,
    ) {
        let output = mapper("Core", core_framework)
            .map(layered_graph(), MapperEnvironment::default())
            .expect("map");
        assert_eq!(pruned_names(&output.graph), vec!["Core", "Rust"]);
    }

    #[rstest]
    fn dependencies_with_another_live_consumer_stay_live(core_framework: CachedArtifact) {
        let mut graph = layered_graph();
        graph.add_dependency(
            GraphDependency::target("App", "/P"),
            GraphDependency::target("Rust", "/P"),
        );
        let output = mapper("Core", core_framework)
            .map(graph, MapperEnvironment::default())
            .expect("map");
        assert_eq!(pruned_names(&output.graph), vec!["Core"]);
    }

    #[rstest]
    fn requested_targets_stay_live(core_framework: CachedArtifact) {
        let mut environment = MapperEnvironment::default();
        environment.record_requested_targets([
            TargetReference::new("/P", "App"),
            TargetReference::new("/P", "Rust"),
        ]);
        let output = mapper("Core", core_framework)
            .map(layered_graph(), environment)
            .expect("map");
        assert_eq!(pruned_names(&output.graph), vec!["Core"]);
    }
}
