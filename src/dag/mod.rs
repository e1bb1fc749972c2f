// src/dag/mod.rs

//! Dependency ordering for topological managers.
//!
//! - [`graph`] accumulates "must run before" edges between workers and sorts
//!   them with petgraph.
//! - [`builder`] is the only way to construct a topological manager: it
//!   validates the order before the manager exists.

pub mod builder;
pub mod graph;

pub use builder::TopologicalBuilder;
pub use graph::DependencyGraph;
