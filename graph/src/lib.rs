// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

#![deny(warnings)]
// Enable all clippy lints except for many of the pedantic ones. It's a shame this needs to be copied and pasted across crates, but there doesn't appear to be a way to include inner attributes from a common source.
#![deny(
    clippy::all,
    clippy::default_trait_access,
    clippy::expl_impl_clone_on_copy,
    clippy::if_not_else,
    clippy::needless_continue,
    clippy::unseparated_literal_suffix,
    clippy::used_underscore_binding
)]
// It is often more clear to show that nothing is being moved.
#![allow(clippy::match_ref_pats)]
// Subjective style.
#![allow(clippy::len_without_is_empty, clippy::redundant_field_names, clippy::too_many_arguments)]
// Default isn't as big a deal as people seem to think it is.
#![allow(clippy::new_without_default, clippy::new_ret_no_self)]
// Arc<Mutex> can be more clear than needing to grok Orderings:
#![allow(clippy::mutex_atomic)]

//!
//! An asynchronous, at-most-once dependency-graph evaluator.
//!
//! The central type is [`Node`]: a cheaply-cloneable, `Arc`-backed handle to a computation that
//! runs at most once no matter how many callers race to apply it, and that broadcasts its single
//! settled result to every caller (see [`node`] for the evaluation model). Nodes are assembled
//! either directly (see [`value`] for leaf constructors and [`combinators`] for the functional
//! ones) or from a reusable [`builder::NodeKind`] template bound to concrete dependencies via
//! [`Builder`].

pub mod boolean;
pub mod builder;
pub mod combinators;
pub mod conditional;
pub mod debug;
pub mod error;
pub mod node;
pub mod presence;
pub mod subgraph;
pub mod value;

#[cfg(test)]
mod tests;

pub use crate::builder::{Builder, NodeKind, SlotSpec, SlotValues};
pub use crate::debug::{DebugSink, LoggingDebugSink, NullDebugSink};
pub use crate::error::{BuildError, GraphError};
pub use crate::node::{Node, NodeFuture, NodeResult};
pub use crate::presence::MaybeAbsent;
pub use crate::subgraph::{ExposedBy, Subgraph};
