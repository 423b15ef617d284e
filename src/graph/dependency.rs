//! Typed dependency edges between graph nodes.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// How a prebuilt or externally produced binary is linked by its consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryLinking {
    /// Linked into the consumer at build time.
    Static,
    /// Loaded by the consumer at run time.
    Dynamic,
}

/// A node in the dependency adjacency map.
///
/// The set of kinds is closed: traversal code matches exhaustively, so a new
/// kind has to be handled everywhere before the crate compiles again.
///
/// ```
/// use graphmill::graph::GraphDependency;
///
/// let dep = GraphDependency::target("App", "/work/App");
/// assert_eq!(
///     dep.target_reference().map(|r| r.name),
///     Some(String::from("App")),
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphDependency {
    /// Edge to another target that lives in the graph.
    Target {
        /// Name of the referenced target.
        name: String,
        /// Path of the project declaring the target.
        path: Utf8PathBuf,
    },
    /// Synthesised sink for the artefact of a foreign build.
    ForeignBuildOutput {
        /// Name of the foreign-build target producing the artefact.
        name: String,
        /// Path of the project declaring that target.
        path: Utf8PathBuf,
        /// How consumers link the artefact.
        linking: BinaryLinking,
    },
    /// Prebuilt framework bundle.
    Framework {
        /// Location of the framework on disk.
        path: Utf8PathBuf,
        /// How consumers link the framework.
        linking: BinaryLinking,
    },
    /// Prebuilt library.
    Library {
        /// Location of the library on disk.
        path: Utf8PathBuf,
        /// How consumers link the library.
        linking: BinaryLinking,
    },
    /// Product vended by a resolved package.
    Package {
        /// Product name.
        product: String,
    },
    /// Library or framework shipped with the platform SDK.
    Sdk {
        /// SDK component name.
        name: String,
    },
}

impl GraphDependency {
    /// Build a [`GraphDependency::Target`] edge.
    #[must_use]
    pub fn target(name: impl Into<String>, path: impl Into<Utf8PathBuf>) -> Self {
        Self::Target {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build a [`GraphDependency::ForeignBuildOutput`] sink.
    #[must_use]
    pub fn foreign_build_output(
        name: impl Into<String>,
        path: impl Into<Utf8PathBuf>,
        linking: BinaryLinking,
    ) -> Self {
        Self::ForeignBuildOutput {
            name: name.into(),
            path: path.into(),
            linking,
        }
    }

    /// Return the target this node points at when it is a `target` edge.
    #[must_use]
    pub fn target_reference(&self) -> Option<TargetReference> {
        match self {
            Self::Target { name, path } => Some(TargetReference::new(path.clone(), name.clone())),
            Self::ForeignBuildOutput { .. }
            | Self::Framework { .. }
            | Self::Library { .. }
            | Self::Package { .. }
            | Self::Sdk { .. } => None,
        }
    }

    /// Report whether this node is a `target` edge to `path`/`name`.
    #[must_use]
    pub fn is_target(&self, path: &Utf8Path, name: &str) -> bool {
        match self {
            Self::Target {
                name: dep_name,
                path: dep_path,
            } => dep_path == path && dep_name == name,
            Self::ForeignBuildOutput { .. }
            | Self::Framework { .. }
            | Self::Library { .. }
            | Self::Package { .. }
            | Self::Sdk { .. } => false,
        }
    }

    /// Report whether this node is the foreign-build sink owned by
    /// `path`/`name`, regardless of its linking mode.
    #[must_use]
    pub fn is_foreign_build_output_of(&self, path: &Utf8Path, name: &str) -> bool {
        match self {
            Self::ForeignBuildOutput {
                name: dep_name,
                path: dep_path,
                ..
            } => dep_path == path && dep_name == name,
            Self::Target { .. }
            | Self::Framework { .. }
            | Self::Library { .. }
            | Self::Package { .. }
            | Self::Sdk { .. } => false,
        }
    }
}

/// Owned `(project path, target name)` identity of a target.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetReference {
    /// Path of the project declaring the target.
    pub path: Utf8PathBuf,
    /// Target name, unique within its project.
    pub name: String,
}

impl TargetReference {
    /// Create a reference from its parts.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// The `target` edge pointing at this reference.
    #[must_use]
    pub fn to_dependency(&self) -> GraphDependency {
        GraphDependency::target(self.name.clone(), self.path.clone())
    }
}

impl std::fmt::Display for TargetReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path, self.name)
    }
}
