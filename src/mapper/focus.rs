//! Target selection: prune everything the requested targets do not need.

use std::collections::BTreeSet;

use tracing::debug;

use super::{GraphMapper, MapperEnvironment, MapperOutput, MapperStage};
use crate::error::MapperError;
use crate::graph::{Graph, GraphTarget, GraphTraverser, TargetFilter, TargetReference};

/// Flags every target outside the closure of the selected targets as pruned.
///
/// Selection starts from local targets matching the test plan, included and
/// excluded names. With no test plan and no included names every local
/// target is a source. Nothing is removed from the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FocusTargetsGraphMapper {
    /// Test plan whose targets form the sources when no names are included.
    pub test_plan: Option<String>,
    /// Names of the targets to focus on.
    pub included_targets: BTreeSet<String>,
    /// Names of targets never used as sources.
    pub excluded_targets: BTreeSet<String>,
}

impl FocusTargetsGraphMapper {
    /// Focus on `included_targets`.
    #[must_use]
    pub fn new<I, S>(included_targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            included_targets: included_targets.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Never use targets named in `excluded_targets` as sources.
    #[must_use]
    pub fn excluding<I, S>(mut self, excluded_targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_targets = excluded_targets.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict sources to a test plan.
    #[must_use]
    pub fn with_test_plan(mut self, test_plan: impl Into<String>) -> Self {
        self.test_plan = Some(test_plan.into());
        self
    }

    /// The test plan that narrows the sources. A plan is ignored once
    /// targets are included by name.
    fn selecting_test_plan(&self) -> Option<&str> {
        self.test_plan
            .as_deref()
            .filter(|_| self.included_targets.is_empty())
    }

    /// The closure to keep live, plus the sources when the selection was
    /// explicit.
    fn focused_targets(&self, graph: &Graph) -> Result<Focus, MapperError> {
        let traverser = GraphTraverser::new(graph);
        if let Some(plan) = self.selecting_test_plan()
            && traverser.test_plan(plan).is_none()
        {
            return Err(MapperError::TestPlanNotFound {
                name: plan.to_owned(),
            });
        }

        let filter = TargetFilter {
            test_plan: self.test_plan.as_deref(),
            included_targets: &self.included_targets,
            excluded_targets: &self.excluded_targets,
            excluding_external_targets: true,
        };
        let sources = traverser.filter_included_targets(traverser.all_targets(), &filter);

        let found: BTreeSet<&str> = sources.iter().map(|target| target.name()).collect();
        let missing: Vec<String> = self
            .included_targets
            .iter()
            .filter(|name| !found.contains(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(MapperError::TargetsNotFound { targets: missing });
        }

        let closure = traverser.transitive_target_dependencies(&sources)?;
        debug!(
            sources = sources.len(),
            focused = closure.len(),
            "computed focus closure"
        );
        let explicit = !self.included_targets.is_empty() || self.selecting_test_plan().is_some();
        Ok(Focus {
            closure: closure.iter().map(GraphTarget::reference).collect(),
            requested: if explicit {
                sources.iter().map(GraphTarget::reference).collect()
            } else {
                BTreeSet::new()
            },
        })
    }
}

struct Focus {
    closure: BTreeSet<TargetReference>,
    requested: BTreeSet<TargetReference>,
}

impl GraphMapper for FocusTargetsGraphMapper {
    fn name(&self) -> &'static str {
        "focus-targets"
    }

    fn stage(&self) -> MapperStage {
        MapperStage::Selection
    }

    fn map(
        &self,
        mut graph: Graph,
        mut environment: MapperEnvironment,
    ) -> Result<MapperOutput, MapperError> {
        let Focus { closure, requested } = self.focused_targets(&graph)?;
        let mut pruned = 0_usize;
        for (path, target) in graph.targets_mut() {
            let keep = closure.contains(&TargetReference::new(path, target.name.as_str()));
            target.prune = !keep;
            if !keep {
                pruned += 1;
            }
        }
        debug!(pruned, "pruned unfocused targets");
        environment.record_requested_targets(requested);
        Ok(MapperOutput::unchanged(graph, environment))
    }
}
