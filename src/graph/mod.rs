//! In-memory model of a generated workspace.
//!
//! A [`Graph`] owns every [`Project`] keyed by path and an adjacency map of
//! [`GraphDependency`] edges. Pruning never removes nodes: targets are
//! flagged so they stay addressable by `(path, name)` for later stages and
//! diagnostics.
//!
//! # Examples
//!
//! ```
//! use graphmill::graph::{Graph, GraphDependency, Product, Project, ProjectKind, Target};
//!
//! let mut graph = Graph::default();
//! graph.add_project(
//!     Project::new("/work/App", "App", ProjectKind::Local)
//!         .with_target(Target::new("App", Product::App))
//!         .with_target(Target::new("Core", Product::Framework)),
//! );
//! graph.add_dependency(
//!     GraphDependency::target("App", "/work/App"),
//!     GraphDependency::target("Core", "/work/App"),
//! );
//! assert_eq!(graph.targets().count(), 2);
//! ```

mod dependency;
mod project;
mod target;
pub mod traverser;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

pub use dependency::{BinaryLinking, GraphDependency, TargetReference};
pub use project::{Project, ProjectKind, TestPlan};
pub use target::{
    ForeignBuild, ForeignBuildArtifact, ForeignBuildInput, Product, ScriptOrder, Target,
    TargetMetadata, TargetScript,
};
pub use traverser::{GraphTraverser, TargetFilter};

/// Adjacency map from a dependency node to the nodes it depends on.
pub type DependencyMap = BTreeMap<GraphDependency, BTreeSet<GraphDependency>>;

/// Projects, targets, and the typed edges between them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    /// Projects keyed by their unique path.
    #[serde(default)]
    pub projects: BTreeMap<Utf8PathBuf, Project>,
    /// Edge set. Every source is a target present in some project, except
    /// synthesised foreign-build output sinks.
    #[serde(default, with = "edge_list")]
    pub dependencies: DependencyMap,
}

impl Graph {
    /// Insert `project`, replacing any project at the same path.
    pub fn add_project(&mut self, project: Project) {
        self.projects.insert(project.path.clone(), project);
    }

    /// Record that `from` depends on `to`.
    pub fn add_dependency(&mut self, from: GraphDependency, to: GraphDependency) {
        self.dependencies.entry(from).or_default().insert(to);
    }

    /// Look up a target by identity.
    #[must_use]
    pub fn target(&self, path: &Utf8Path, name: &str) -> Option<&Target> {
        self.projects.get(path)?.targets.get(name)
    }

    /// Look up a target by identity for mutation.
    pub fn target_mut(&mut self, path: &Utf8Path, name: &str) -> Option<&mut Target> {
        self.projects.get_mut(path)?.targets.get_mut(name)
    }

    /// Iterate over every target in every project.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.projects
            .values()
            .flat_map(|project| project.targets.values())
    }

    /// Iterate mutably over every target with its owning project path.
    pub fn targets_mut(&mut self) -> impl Iterator<Item = (&Utf8Path, &mut Target)> {
        self.projects.values_mut().flat_map(|project| {
            let Project { path, targets, .. } = project;
            let path: &Utf8PathBuf = path;
            targets
                .values_mut()
                .map(move |target| (path.as_path(), target))
        })
    }

    /// Identities of every target flagged as pruned.
    #[must_use]
    pub fn pruned_targets(&self) -> BTreeSet<TargetReference> {
        self.projects
            .values()
            .flat_map(|project| {
                project
                    .targets
                    .values()
                    .filter(|target| target.prune)
                    .map(|target| TargetReference::new(project.path.clone(), target.name.clone()))
            })
            .collect()
    }
}

/// A target seen through the graph: its project path, the target, and the
/// project that owns it.
///
/// Equality, ordering, and hashing only consider `(path, name)`.
#[derive(Clone, Copy, Debug)]
pub struct GraphTarget<'g> {
    /// Path of the owning project.
    pub path: &'g Utf8Path,
    /// The target itself.
    pub target: &'g Target,
    /// The owning project.
    pub project: &'g Project,
}

impl<'g> GraphTarget<'g> {
    /// Borrow `target` from `project`.
    #[must_use]
    pub fn new(project: &'g Project, target: &'g Target) -> Self {
        Self {
            path: &project.path,
            target,
            project,
        }
    }

    /// Target name.
    #[must_use]
    pub fn name(&self) -> &'g str {
        &self.target.name
    }

    /// Owned identity of this target.
    #[must_use]
    pub fn reference(&self) -> TargetReference {
        TargetReference::new(self.path, self.target.name.as_str())
    }

    /// The `target` edge pointing at this target.
    #[must_use]
    pub fn to_dependency(&self) -> GraphDependency {
        GraphDependency::target(self.target.name.as_str(), self.path)
    }

    fn key(&self) -> (&Utf8Path, &str) {
        (self.path, &self.target.name)
    }
}

impl PartialEq for GraphTarget<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for GraphTarget<'_> {}

impl PartialOrd for GraphTarget<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GraphTarget<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for GraphTarget<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// JSON object keys must be strings, so the adjacency map is written as a
/// list of `{ "from": .., "to": [..] }` entries.
mod edge_list {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{DependencyMap, GraphDependency};

    #[derive(Serialize)]
    struct EdgeRef<'a> {
        from: &'a GraphDependency,
        to: &'a BTreeSet<GraphDependency>,
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Edge {
        from: GraphDependency,
        #[serde(default)]
        to: BTreeSet<GraphDependency>,
    }

    pub(super) fn serialize<S>(map: &DependencyMap, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(map.iter().map(|(from, to)| EdgeRef { from, to }))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<DependencyMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        let edges = Vec::<Edge>::deserialize(deserializer)?;
        let mut map = DependencyMap::new();
        for edge in edges {
            map.entry(edge.from).or_default().extend(edge.to);
        }
        Ok(map)
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
