//! Read-only queries over a single [`Graph`] snapshot.
//!
//! A [`GraphTraverser`] borrows the graph it answers questions about, so the
//! borrow checker guarantees the snapshot cannot change underneath it.
//! Mappers build one over their input graph, collect owned answers, and drop
//! it before producing their output.

use std::collections::BTreeSet;

use camino::Utf8Path;
use tracing::debug;

use super::{Graph, GraphDependency, GraphTarget, TargetReference, TestPlan};
use crate::error::MapperError;
use crate::toposort::topological_sort;

/// Selection criteria for [`GraphTraverser::filter_included_targets`].
#[derive(Clone, Copy, Debug)]
pub struct TargetFilter<'a> {
    /// Restrict to this test plan's targets when no names are included.
    pub test_plan: Option<&'a str>,
    /// Keep only targets with these names. Empty keeps everything.
    pub included_targets: &'a BTreeSet<String>,
    /// Drop targets with these names.
    pub excluded_targets: &'a BTreeSet<String>,
    /// Drop targets declared by external projects.
    pub excluding_external_targets: bool,
}

/// Query facade over a borrowed [`Graph`].
#[derive(Clone, Copy, Debug)]
pub struct GraphTraverser<'g> {
    graph: &'g Graph,
}

impl<'g> GraphTraverser<'g> {
    /// Wrap `graph`.
    #[must_use]
    pub const fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    /// The graph being queried.
    #[must_use]
    pub const fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Every target in every project.
    #[must_use]
    pub fn all_targets(&self) -> BTreeSet<GraphTarget<'g>> {
        self.graph
            .projects
            .values()
            .flat_map(|project| {
                project
                    .targets
                    .values()
                    .map(move |target| GraphTarget::new(project, target))
            })
            .collect()
    }

    /// Look up a single target.
    #[must_use]
    pub fn target(&self, path: &Utf8Path, name: &str) -> Option<GraphTarget<'g>> {
        let project = self.graph.projects.get(path)?;
        let target = project.targets.get(name)?;
        Some(GraphTarget::new(project, target))
    }

    /// Every target declared by the project at `path`.
    #[must_use]
    pub fn targets_at(&self, path: &Utf8Path) -> BTreeSet<GraphTarget<'g>> {
        self.graph
            .projects
            .get(path)
            .map(|project| {
                project
                    .targets
                    .values()
                    .map(|target| GraphTarget::new(project, target))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every target carrying a foreign-build descriptor.
    #[must_use]
    pub fn foreign_build_targets(&self) -> BTreeSet<GraphTarget<'g>> {
        self.all_targets()
            .into_iter()
            .filter(|target| target.target.foreign_build.is_some())
            .collect()
    }

    /// All outgoing edges of a target, of any kind.
    #[must_use]
    pub fn dependencies_of(&self, path: &Utf8Path, name: &str) -> BTreeSet<&'g GraphDependency> {
        self.graph
            .dependencies
            .get(&GraphDependency::target(name, path))
            .map(|deps| deps.iter().collect())
            .unwrap_or_default()
    }

    /// Nodes with an edge pointing at `dependency`.
    #[must_use]
    pub fn consumers_of(&self, dependency: &GraphDependency) -> BTreeSet<&'g GraphDependency> {
        self.graph
            .dependencies
            .iter()
            .filter(|(_, deps)| deps.contains(dependency))
            .map(|(from, _)| from)
            .collect()
    }

    /// Targets reachable from `path`/`name` through exactly one `target`
    /// edge. Other edge kinds are not traversable and are left out.
    #[must_use]
    pub fn direct_target_dependencies(
        &self,
        path: &Utf8Path,
        name: &str,
    ) -> BTreeSet<GraphTarget<'g>> {
        self.dependencies_of(path, name)
            .into_iter()
            .filter_map(|dependency| match dependency {
                GraphDependency::Target {
                    name: dep_name,
                    path: dep_path,
                } => {
                    let found = self.target(dep_path, dep_name);
                    if found.is_none() {
                        debug!(
                            missing = %dep_name,
                            project = %dep_path,
                            dependent = %name,
                            "skipping target dependency missing from graph",
                        );
                    }
                    found
                }
                GraphDependency::ForeignBuildOutput { .. }
                | GraphDependency::Framework { .. }
                | GraphDependency::Library { .. }
                | GraphDependency::Package { .. }
                | GraphDependency::Sdk { .. } => None,
            })
            .collect()
    }

    /// The first test plan named `name`, searching projects in path order.
    #[must_use]
    pub fn test_plan(&self, name: &str) -> Option<&'g TestPlan> {
        self.graph
            .projects
            .values()
            .flat_map(|project| &project.test_plans)
            .find(|plan| plan.name == name)
    }

    /// Every target referenced by any test plan named `name`.
    #[must_use]
    pub fn test_plan_targets(&self, name: &str) -> BTreeSet<TargetReference> {
        self.graph
            .projects
            .values()
            .flat_map(|project| &project.test_plans)
            .filter(|plan| plan.name == name)
            .flat_map(|plan| plan.targets.iter().cloned())
            .collect()
    }

    /// Narrow `based_on` according to `filter`.
    ///
    /// In order: restrict to the test plan when one is named and no targets
    /// are explicitly included, restrict to included names, drop excluded
    /// names, then drop external targets if requested.
    #[must_use]
    pub fn filter_included_targets<I>(
        &self,
        based_on: I,
        filter: &TargetFilter<'_>,
    ) -> BTreeSet<GraphTarget<'g>>
    where
        I: IntoIterator<Item = GraphTarget<'g>>,
    {
        let plan_members = filter
            .test_plan
            .filter(|_| filter.included_targets.is_empty())
            .map(|plan| self.test_plan_targets(plan));

        based_on
            .into_iter()
            .filter(|target| {
                plan_members
                    .as_ref()
                    .is_none_or(|members| members.contains(&target.reference()))
            })
            .filter(|target| {
                filter.included_targets.is_empty()
                    || filter.included_targets.contains(target.name())
            })
            .filter(|target| !filter.excluded_targets.contains(target.name()))
            .filter(|target| !(filter.excluding_external_targets && target.project.is_external()))
            .collect()
    }

    /// `sources` plus every target they reach through `target` edges.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::CyclicDependency`] when the reachable targets
    /// contain a cycle.
    pub fn transitive_target_dependencies(
        &self,
        sources: &BTreeSet<GraphTarget<'g>>,
    ) -> Result<BTreeSet<GraphTarget<'g>>, MapperError> {
        let order = topological_sort(sources.iter().copied(), |target: &GraphTarget<'g>| {
            self.direct_target_dependencies(target.path, target.name())
        })
        .map_err(|cycle| MapperError::CyclicDependency {
            cycle: cycle
                .nodes()
                .iter()
                .map(GraphTarget::reference)
                .collect(),
        })?;
        Ok(order.into_iter().collect())
    }
}

#[cfg(test)]
mod tests;
