//! CLI execution.
//!
//! Keeps `main` minimal: loads the graph and configuration named by the
//! [`Cli`], runs the canonical pipeline, and writes the result as JSON. Side
//! effects are reported, never executed.

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use camino::Utf8Path;
use miette::{GraphicalReportHandler, GraphicalTheme};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config::PipelineConfig;
use crate::error::MapperError;
use crate::graph::Graph;
use crate::mapper::MapperOutput;

/// Execute the parsed [`Cli`].
///
/// # Errors
///
/// Returns an error when an input cannot be loaded, a mapper fails, or the
/// output cannot be written.
pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let graph = load_graph(&cli.graph)?;
    let pipeline = config.pipeline().context("assembling mapper pipeline")?;
    debug!(mappers = ?pipeline.names().collect::<Vec<_>>(), "running pipeline");
    let output = pipeline.run(graph).context("mapping graph")?;
    write_output(&cli.output, &output)
}

/// Format a failure for the user.
///
/// Mapper failures are rendered as miette diagnostics so their code and help
/// text are shown under the outermost context. Anything else prints its
/// context chain.
#[must_use]
pub fn render_error(err: &anyhow::Error) -> String {
    let Some(diagnostic) = err.downcast_ref::<MapperError>() else {
        return format!("{err:#}");
    };
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut report = String::new();
    match handler.render_report(&mut report, diagnostic) {
        Ok(()) => format!("{err}\n{report}"),
        Err(_) => format!("{err:#}"),
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let base = match &cli.config {
        Some(path) => PipelineConfig::from_path(path).context("loading pipeline config")?,
        None => PipelineConfig::default(),
    };
    Ok(base.merged_with(
        cli.test_plan.clone(),
        cli.include.iter().cloned(),
        cli.exclude.iter().cloned(),
    ))
}

fn load_graph(path: &Utf8Path) -> Result<Graph> {
    let text = fs::read_to_string(path).with_context(|| format!("reading graph at {path}"))?;
    let graph: Graph =
        serde_json::from_str(&text).with_context(|| format!("parsing graph at {path}"))?;
    debug!(projects = graph.projects.len(), "loaded graph");
    Ok(graph)
}

/// Return `true` when `path` is the sentinel for "write to stdout".
fn is_stdout_path(path: &Utf8Path) -> bool {
    path.as_str() == "-"
}

fn write_output(path: &Utf8Path, output: &MapperOutput) -> Result<()> {
    if is_stdout_path(path) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, output).context("writing result to stdout")?;
        writeln!(handle).context("writing result to stdout")?;
        handle.flush().context("flushing stdout")?;
        return Ok(());
    }
    let json = serde_json::to_string_pretty(output).context("serialising result")?;
    fs::write(path, json).with_context(|| format!("writing result to {path}"))?;
    info!("Wrote mapped graph to {path}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("-", true)]
    #[case("out.json", false)]
    #[case("./-", false)]
    fn stdout_sentinel_is_exact(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_stdout_path(Utf8Path::new(path)), expected);
    }

    #[rstest]
    fn mapper_errors_render_code_and_help() {
        let err = anyhow::Error::new(MapperError::TargetsNotFound {
            targets: vec!["Missing".to_owned()],
        })
        .context("mapping graph");
        let rendered = render_error(&err);
        assert!(rendered.starts_with("mapping graph"), "{rendered}");
        assert!(rendered.contains("targets not found: Missing"), "{rendered}");
        assert!(
            rendered.contains("graphmill::mapper::targets_not_found"),
            "{rendered}"
        );
        assert!(
            rendered.contains("check the target names"),
            "{rendered}"
        );
    }

    #[rstest]
    fn other_errors_render_their_context_chain() {
        let err = anyhow::anyhow!("disk full").context("writing result");
        assert_eq!(render_error(&err), "writing result: disk full");
    }

    #[rstest]
    fn missing_graph_reports_path() {
        let err = load_graph(Utf8Path::new("/definitely/not/graph.json")).expect_err("missing");
        assert!(format!("{err:#}").contains("/definitely/not/graph.json"));
    }
}
