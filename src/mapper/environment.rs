//! Bookkeeping shared between the stages of one pipeline run.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::CachedArtifact;
use crate::graph::TargetReference;

/// A live target swapped for a prebuilt artefact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementRecord {
    /// The replaced target.
    pub target: TargetReference,
    /// What consumers now depend on instead.
    pub artifact: CachedArtifact,
}

/// Accumulator threaded through a pipeline run.
///
/// Created empty when the run starts, amended by stages that need later
/// stages to know what they did, and discarded when the run ends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperEnvironment {
    /// Replacement records keyed by target name.
    #[serde(default)]
    pub replacements: BTreeMap<String, Vec<ReplacementRecord>>,
    /// Targets named by an explicit selection (included names or a test
    /// plan). Empty when every local target was selected.
    #[serde(default)]
    pub requested_targets: BTreeSet<TargetReference>,
}

impl MapperEnvironment {
    /// Remember that `record.target` was replaced.
    pub fn record_replacement(&mut self, record: ReplacementRecord) {
        let records = self
            .replacements
            .entry(record.target.name.clone())
            .or_default();
        records.retain(|existing| existing.target != record.target);
        records.push(record);
    }

    /// The replacement recorded for `target`, if any.
    #[must_use]
    pub fn replacement_for(&self, target: &TargetReference) -> Option<&ReplacementRecord> {
        self.replacements
            .get(&target.name)?
            .iter()
            .find(|record| &record.target == target)
    }

    /// Replace the set of explicitly requested targets.
    pub fn record_requested_targets<I>(&mut self, targets: I)
    where
        I: IntoIterator<Item = TargetReference>,
    {
        self.requested_targets = targets.into_iter().collect();
    }

    /// Report whether `target` was named by an explicit selection.
    #[must_use]
    pub fn is_requested(&self, target: &TargetReference) -> bool {
        self.requested_targets.contains(target)
    }

    /// Report whether `target` was replaced by a prebuilt artefact.
    #[must_use]
    pub fn is_replaced(&self, target: &TargetReference) -> bool {
        self.replacement_for(target).is_some()
    }
}
