//! Projects group targets under a unique path.

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Target, TargetReference};

/// Where a project's sources come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// Authored in the workspace.
    #[default]
    Local,
    /// Pulled in from an external dependency source.
    External,
}

/// A named selection of targets to test together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    /// Plan name.
    pub name: String,
    /// Targets the plan runs.
    #[serde(default)]
    pub targets: Vec<TargetReference>,
}

/// A project: a path and the targets declared there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identity of the project within the graph.
    pub path: Utf8PathBuf,
    /// Display name.
    pub name: String,
    /// Origin of the project.
    #[serde(default)]
    pub kind: ProjectKind,
    /// Targets keyed by name, in declaration order.
    #[serde(default)]
    pub targets: IndexMap<String, Target>,
    /// Test plans declared by this project.
    #[serde(default)]
    pub test_plans: Vec<TestPlan>,
}

impl Project {
    /// Create an empty project of the given kind.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, name: impl Into<String>, kind: ProjectKind) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            kind,
            targets: IndexMap::new(),
            test_plans: Vec::new(),
        }
    }

    /// Add `target`, replacing any target with the same name.
    #[must_use]
    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.insert(target.name.clone(), target);
        self
    }

    /// Add a test plan.
    #[must_use]
    pub fn with_test_plan(mut self, plan: TestPlan) -> Self {
        self.test_plans.push(plan);
        self
    }

    /// Report whether this project comes from an external source.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self.kind, ProjectKind::External)
    }
}
