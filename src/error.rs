//! Fatal errors raised while mapping a graph.
//!
//! Every variant aborts the pipeline. No stage downgrades another stage's
//! error into a warning.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use camino::Utf8PathBuf;
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::graph::TargetReference;
use crate::mapper::MapperStage;

/// Errors raised by graph mappers and pipeline assembly.
#[derive(Debug, Error, Diagnostic)]
pub enum MapperError {
    /// Explicitly included targets did not survive filtering.
    #[error("targets not found: {}", .targets.join(", "))]
    #[diagnostic(
        code(graphmill::mapper::targets_not_found),
        help("check the target names, and that they are not excluded or external")
    )]
    TargetsNotFound {
        /// Missing target names, sorted.
        targets: Vec<String>,
    },

    /// A focus request named a test plan no project declares.
    #[error("test plan '{name}' not found")]
    #[diagnostic(code(graphmill::mapper::test_plan_not_found))]
    TestPlanNotFound {
        /// The requested plan.
        name: String,
    },

    /// Target dependencies loop back on themselves.
    #[error("cyclic dependency detected: {}", .cycle.iter().join(" -> "))]
    #[diagnostic(
        code(graphmill::mapper::cyclic_dependency),
        help("break the cycle by removing one of the listed dependencies")
    )]
    CyclicDependency {
        /// The loop, starting and ending at the same target.
        cycle: Vec<TargetReference>,
    },

    /// Checking whether a foreign-build artefact exists failed.
    #[error("failed to check foreign build output {path}")]
    #[diagnostic(code(graphmill::mapper::artifact_probe))]
    ArtifactProbe {
        /// The artefact that could not be checked.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A pipeline was assembled with a stage running before one it depends
    /// on.
    #[error("mapper '{mapper}' ({stage}) cannot run after a {previous} mapper")]
    #[diagnostic(
        code(graphmill::mapper::stage_out_of_order),
        help("order mappers as wiring, selection, caching, then side effects")
    )]
    StageOutOfOrder {
        /// Name of the misplaced mapper.
        mapper: &'static str,
        /// Its stage.
        stage: MapperStage,
        /// The later stage that already ran.
        previous: MapperStage,
    },
}
