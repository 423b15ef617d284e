//! Graphmill core library.
//!
//! Holds an in-memory model of a project's targets and their dependencies
//! and runs an ordered pipeline of mappers over it: wiring foreign builds,
//! focusing on the requested targets, substituting cached artefacts, and
//! deciding which external builds still have to run.

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod mapper;
pub mod runner;
pub mod side_effect;
pub mod toposort;
