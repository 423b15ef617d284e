//! Targets and the foreign-build descriptors they may carry.

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use super::BinaryLinking;

/// Kind of product a target builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    /// Runnable application.
    App,
    /// Dynamic framework bundle.
    Framework,
    /// Static framework bundle.
    StaticFramework,
    /// Static library.
    StaticLibrary,
    /// Dynamic library.
    DynamicLibrary,
    /// Unit test bundle.
    UnitTests,
    /// UI test bundle.
    UiTests,
    /// Script-only target that compiles nothing itself.
    Aggregate,
}

/// When a build script runs relative to the native compile phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOrder {
    /// Before sources are compiled.
    PreBuild,
    /// After the product is linked.
    PostBuild,
}

/// A shell build phase attached to a target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetScript {
    /// Display name of the phase.
    pub name: String,
    /// Position relative to the compile phases.
    pub order: ScriptOrder,
    /// Shell script body.
    pub script: String,
    /// Files and folders the phase reads.
    #[serde(default)]
    pub input_paths: Vec<Utf8PathBuf>,
    /// Files the phase produces.
    #[serde(default)]
    pub output_paths: Vec<Utf8PathBuf>,
}

/// Free-form annotations downstream tooling can key off.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMetadata {
    /// Marker tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// One input declared by a foreign build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForeignBuildInput {
    /// A single file the script reads.
    File {
        /// File location.
        path: Utf8PathBuf,
    },
    /// A directory tree the script reads.
    Folder {
        /// Directory location.
        path: Utf8PathBuf,
    },
    /// Script text that influences the build. Informational only.
    Script {
        /// Script contents.
        script: String,
    },
}

impl ForeignBuildInput {
    /// The path to declare as a build-phase input, if this input has one.
    #[must_use]
    pub fn declared_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::File { path } | Self::Folder { path } => Some(path),
            Self::Script { .. } => None,
        }
    }
}

/// The artefact a foreign build produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignBuildArtifact {
    /// Artefact location. Relative paths resolve against the owning project.
    pub path: Utf8PathBuf,
    /// How consumers link the artefact.
    pub linking: BinaryLinking,
}

/// Describes a target built by an external script instead of the native
/// toolchain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignBuild {
    /// Shell script that produces the artefact.
    pub script: String,
    /// Inputs the script consumes.
    #[serde(default)]
    pub inputs: Vec<ForeignBuildInput>,
    /// The artefact produced.
    pub output: ForeignBuildArtifact,
}

/// A buildable unit inside a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Name, unique within the owning project.
    pub name: String,
    /// What the target produces.
    pub product: Product,
    /// Excluded from the active build set but kept in the model.
    #[serde(default)]
    pub prune: bool,
    /// Shell build phases.
    #[serde(default)]
    pub scripts: Vec<TargetScript>,
    /// Marker annotations.
    #[serde(default)]
    pub metadata: TargetMetadata,
    /// Present when an external script builds this target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_build: Option<ForeignBuild>,
}

impl Target {
    /// Create a live target with no scripts, tags, or foreign build.
    #[must_use]
    pub fn new(name: impl Into<String>, product: Product) -> Self {
        Self {
            name: name.into(),
            product,
            prune: false,
            scripts: Vec::new(),
            metadata: TargetMetadata::default(),
            foreign_build: None,
        }
    }

    /// Attach a foreign-build descriptor.
    #[must_use]
    pub fn with_foreign_build(mut self, foreign_build: ForeignBuild) -> Self {
        self.foreign_build = Some(foreign_build);
        self
    }

    /// Report whether the target carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.contains(tag)
    }
}
