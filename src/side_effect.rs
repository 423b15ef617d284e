//! Descriptions of work to perform outside the graph.
//!
//! Nothing in this crate executes a side effect; the caller hands the
//! accumulated list to whatever executor it uses.

use serde::{Deserialize, Serialize};

/// An action to perform once mapping completes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideEffectDescriptor {
    /// Run a process.
    Command(CommandDescriptor),
}

/// A process invocation, program first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Program followed by its arguments.
    pub arguments: Vec<String>,
}

impl CommandDescriptor {
    /// Wrap an argument vector.
    #[must_use]
    pub const fn new(arguments: Vec<String>) -> Self {
        Self { arguments }
    }
}
