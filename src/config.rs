//! Caller-supplied settings for a pipeline run.
//!
//! ```
//! use graphmill::config::PipelineConfig;
//!
//! let config: PipelineConfig =
//!     serde_json::from_str(r#"{ "included_targets": ["App"] }"#).expect("parse");
//! let pipeline = config.pipeline().expect("assemble");
//! assert_eq!(
//!     pipeline.names().collect::<Vec<_>>(),
//!     ["foreign-build", "focus-targets", "cached-artifacts", "foreign-build-side-effects"],
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MapperError;
use crate::mapper::{
    ArtifactProbe, CachedArtifact, CachedArtifactsGraphMapper, FocusTargetsGraphMapper,
    ForeignBuildGraphMapper, ForeignBuildSideEffectsGraphMapper, SequentialGraphMapper,
};

/// Errors raised while loading a [`PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}")]
    Read {
        /// Config location.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid config document.
    #[error("failed to parse config {path}")]
    Parse {
        /// Config location.
        path: Utf8PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Focus and caching settings for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Test plan to focus on when no targets are included.
    pub test_plan: Option<String>,
    /// Targets to focus on.
    pub included_targets: BTreeSet<String>,
    /// Targets never used as focus sources.
    pub excluded_targets: BTreeSet<String>,
    /// Prebuilt artefacts keyed by the name of the target they replace.
    pub cached_artifacts: BTreeMap<String, CachedArtifact>,
}

impl PipelineConfig {
    /// Read a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Layer command-line choices over this config. A test plan replaces the
    /// configured one; target names extend the configured sets.
    #[must_use]
    pub fn merged_with<I, E>(mut self, test_plan: Option<String>, include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        if test_plan.is_some() {
            self.test_plan = test_plan;
        }
        self.included_targets.extend(include);
        self.excluded_targets.extend(exclude);
        self
    }

    fn focus_mapper(&self) -> FocusTargetsGraphMapper {
        FocusTargetsGraphMapper {
            test_plan: self.test_plan.clone(),
            included_targets: self.included_targets.clone(),
            excluded_targets: self.excluded_targets.clone(),
        }
    }

    /// Assemble the canonical pipeline, probing the local filesystem.
    ///
    /// # Errors
    ///
    /// Propagates [`SequentialGraphMapper::new`] errors.
    pub fn pipeline(&self) -> Result<SequentialGraphMapper, MapperError> {
        self.pipeline_with_probe(crate::mapper::FileSystemProbe)
    }

    /// Assemble the canonical pipeline with a custom artefact probe:
    /// wiring, focus, cached artefacts, then foreign-build side effects.
    ///
    /// # Errors
    ///
    /// Propagates [`SequentialGraphMapper::new`] errors.
    pub fn pipeline_with_probe<P>(&self, probe: P) -> Result<SequentialGraphMapper, MapperError>
    where
        P: ArtifactProbe + 'static,
    {
        SequentialGraphMapper::new(vec![
            Box::new(ForeignBuildGraphMapper),
            Box::new(self.focus_mapper()),
            Box::new(CachedArtifactsGraphMapper::new(self.cached_artifacts.clone())),
            Box::new(ForeignBuildSideEffectsGraphMapper::with_probe(probe)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn utf8(file: &NamedTempFile) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(file.path().to_path_buf()).expect("utf-8 path")
    }

    #[rstest]
    fn empty_document_yields_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, PipelineConfig::default());
    }

    #[rstest]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<PipelineConfig>(r#"{ "include": ["App"] }"#)
            .expect_err("unknown field");
        assert!(err.to_string().contains("unknown field"));
    }

    #[rstest]
    fn from_path_reads_cached_artifacts() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{
                "test_plan": "Smoke",
                "cached_artifacts": {{
                    "Core": {{ "path": "/cache/Core.framework", "kind": "framework", "linking": "dynamic" }}
                }}
            }}"#
        )
        .expect("write config");
        let config = PipelineConfig::from_path(&utf8(&file)).expect("load");
        assert_eq!(config.test_plan.as_deref(), Some("Smoke"));
        assert!(config.cached_artifacts.contains_key("Core"));
    }

    #[rstest]
    fn from_path_reports_parse_failures() {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write config");
        let err = PipelineConfig::from_path(&utf8(&file)).expect_err("invalid");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[rstest]
    fn from_path_reports_missing_files() {
        let err = PipelineConfig::from_path(Utf8Path::new("/definitely/not/here.json"))
            .expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[rstest]
    fn command_line_values_layer_over_file_values() {
        let config = PipelineConfig {
            test_plan: Some("Smoke".into()),
            included_targets: BTreeSet::from(["App".to_owned()]),
            ..PipelineConfig::default()
        }
        .merged_with(
            Some("Nightly".into()),
            ["Core".to_owned()],
            ["Tests".to_owned()],
        );
        assert_eq!(config.test_plan.as_deref(), Some("Nightly"));
        assert_eq!(
            config.included_targets,
            BTreeSet::from(["App".to_owned(), "Core".to_owned()])
        );
        assert_eq!(config.excluded_targets, BTreeSet::from(["Tests".to_owned()]));
    }

    #[rstest]
    fn absent_command_line_plan_keeps_configured_plan() {
        let config = PipelineConfig {
            test_plan: Some("Smoke".into()),
            ..PipelineConfig::default()
        }
        .merged_with(None, Vec::new(), Vec::new());
        assert_eq!(config.test_plan.as_deref(), Some("Smoke"));
    }
}
