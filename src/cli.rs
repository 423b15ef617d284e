//! Command line interface definition using clap.

use camino::Utf8PathBuf;
use clap::Parser;

/// Map a project dependency graph: focus on targets, substitute cached
/// artefacts, and list the foreign builds that still need to run.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON graph to map.
    #[arg(short, long, value_name = "FILE", default_value = "graph.json")]
    pub graph: Utf8PathBuf,

    /// JSON pipeline configuration. Command-line options layer on top.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Focus on the targets of this test plan.
    #[arg(long, value_name = "NAME")]
    pub test_plan: Option<String>,

    /// Focus on this target. May be repeated.
    #[arg(short, long = "include", value_name = "TARGET")]
    pub include: Vec<String>,

    /// Never focus on this target. May be repeated.
    #[arg(short = 'x', long = "exclude", value_name = "TARGET")]
    pub exclude: Vec<String>,

    /// Where to write the mapped graph and side effects; `-` is stdout.
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub output: Utf8PathBuf,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            graph: Utf8PathBuf::from("graph.json"),
            config: None,
            test_plan: None,
            include: Vec::new(),
            exclude: Vec::new(),
            output: Utf8PathBuf::from("-"),
            verbose: false,
        }
    }
}
