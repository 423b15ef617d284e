//! Decide which foreign builds must actually run.
//!
//! Runs after selection and caching so that pruned or replaced targets never
//! trigger an external build. A live foreign-build target produces exactly
//! one command when its artefact is missing and nothing when it exists.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use shell_quote::{QuoteRefExt, Sh};
use tracing::debug;

use super::{GraphMapper, MapperEnvironment, MapperOutput, MapperStage};
use crate::error::MapperError;
use crate::graph::{Graph, GraphTarget, GraphTraverser};
use crate::side_effect::{CommandDescriptor, SideEffectDescriptor};

/// Environment variable exported to foreign-build scripts, set to the
/// owning project's directory.
pub const WORKING_DIRECTORY_ENV: &str = "SRCROOT";

const SHELL: &str = "/bin/sh";

/// Answers whether an artefact is already on disk.
pub trait ArtifactProbe: Send + Sync {
    /// Report whether `path` exists.
    ///
    /// # Errors
    ///
    /// Returns an error when existence cannot be determined. A missing path
    /// is `Ok(false)`, not an error.
    fn exists(&self, path: &Utf8Path) -> io::Result<bool>;
}

/// [`ArtifactProbe`] backed by the local filesystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FileSystemProbe;

impl ArtifactProbe for FileSystemProbe {
    fn exists(&self, path: &Utf8Path) -> io::Result<bool> {
        path.try_exists()
    }
}

/// Emits a build command for every live foreign-build target whose artefact
/// is missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForeignBuildSideEffectsGraphMapper<P = FileSystemProbe> {
    probe: P,
}

impl ForeignBuildSideEffectsGraphMapper {
    /// Probe the local filesystem.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            probe: FileSystemProbe,
        }
    }
}

impl<P: ArtifactProbe> ForeignBuildSideEffectsGraphMapper<P> {
    /// Use `probe` for existence checks.
    #[must_use]
    pub const fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    fn side_effect_for(
        &self,
        target: &GraphTarget<'_>,
    ) -> Result<Option<SideEffectDescriptor>, MapperError> {
        let Some(foreign_build) = target.target.foreign_build.as_ref() else {
            return Ok(None);
        };
        let artifact = resolve_artifact(target.path, &foreign_build.output.path);
        let exists = self
            .probe
            .exists(&artifact)
            .map_err(|source| MapperError::ArtifactProbe {
                path: artifact.clone(),
                source,
            })?;
        if exists {
            debug!(%artifact, "foreign build output present, skipping");
            return Ok(None);
        }
        debug!(%artifact, "foreign build output missing, scheduling build");
        Ok(Some(SideEffectDescriptor::Command(build_command(
            target.path,
            &foreign_build.script,
        ))))
    }
}

impl<P: ArtifactProbe> GraphMapper for ForeignBuildSideEffectsGraphMapper<P> {
    fn name(&self) -> &'static str {
        "foreign-build-side-effects"
    }

    fn stage(&self) -> MapperStage {
        MapperStage::SideEffects
    }

    fn map(
        &self,
        graph: Graph,
        environment: MapperEnvironment,
    ) -> Result<MapperOutput, MapperError> {
        let traverser = GraphTraverser::new(&graph);
        let mut side_effects = Vec::new();
        for target in traverser.foreign_build_targets() {
            let reference = target.reference();
            if target.target.prune || environment.is_replaced(&reference) {
                debug!(foreign_target = %reference, "skipping inactive foreign build");
                continue;
            }
            if let Some(side_effect) = self.side_effect_for(&target)? {
                side_effects.push(side_effect);
            }
        }
        Ok(MapperOutput {
            graph,
            side_effects,
            environment,
        })
    }
}

/// Relative artefact paths are anchored at the owning project.
fn resolve_artifact(project_path: &Utf8Path, artifact: &Utf8Path) -> Utf8PathBuf {
    if artifact.is_absolute() {
        artifact.to_owned()
    } else {
        project_path.join(artifact)
    }
}

fn shell_quote(value: &str) -> String {
    let bytes: Vec<u8> = value.quoted(Sh);
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug_assert!(false, "shell quoting produced non UTF-8 bytes: {err}");
            String::from_utf8_lossy(&err.into_bytes()).into_owned()
        }
    }
}

fn build_command(project_path: &Utf8Path, script: &str) -> CommandDescriptor {
    let dir = shell_quote(project_path.as_str());
    CommandDescriptor::new(vec![
        SHELL.to_owned(),
        "-c".to_owned(),
        format!("cd {dir} && export {WORKING_DIRECTORY_ENV}={dir} && {script}"),
    ])
}
