// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt;
use std::sync::Arc;

/// The error type a `NodeKind::run` body (or any other Node body that can fail with an
/// application-defined error) returns. The builder wraps it in [`GraphError::BodyThrew`],
/// attaching the owning node's name, rather than letting it surface to a dependent unadorned.
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

///
/// Errors raised while building or evaluating a Node.
///
/// `Build` errors are raised synchronously from `Builder::build()` and never observed through a
/// settled Node. All other variants are the kinds of failure a Node's result promise can settle
/// with: dependency failures are propagated by cloning the child's `GraphError` directly (no
/// wrapping variant is needed for that case), which is why this type implements `Clone` cheaply
/// (large payloads are held behind `Arc`).
///
#[derive(Clone, Debug)]
pub enum GraphError {
    /// A kind-set/slot-binding mistake, raised synchronously at build time.
    Build(BuildError),
    /// A required dependency settled with `None`/absent rather than with a value.
    RequiredNull { node: String, slot: &'static str },
    /// The node's body function panicked or returned an error.
    BodyThrew {
        node: String,
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
    /// The node's body produced no value, but the node has no absent representation.
    BodyReturnedNull { node: String },
    /// The node's decider suppressed execution, and the node has no absent representation.
    DeciderOff {
        node: String,
        decider_key: Option<String>,
    },
    /// `emit()` was called before the node's promise settled.
    EmitOnUnsettled { node: String },
    /// `emit()` was called on a node whose promise settled with a failure.
    EmitOnFailed { node: String, source: Arc<GraphError> },
}

impl GraphError {
    pub fn body_threw<E: std::error::Error + Send + Sync + 'static>(node: impl Into<String>, source: E) -> Self {
        GraphError::BodyThrew {
            node: node.into(),
            source: Arc::new(source),
        }
    }

    pub fn required_null(node: impl Into<String>, slot: &'static str) -> Self {
        GraphError::RequiredNull {
            node: node.into(),
            slot,
        }
    }

    pub fn body_returned_null(node: impl Into<String>) -> Self {
        GraphError::BodyReturnedNull { node: node.into() }
    }

    pub fn decider_off(node: impl Into<String>, decider_key: Option<String>) -> Self {
        GraphError::DeciderOff {
            node: node.into(),
            decider_key,
        }
    }

    pub fn emit_on_unsettled(node: impl Into<String>) -> Self {
        GraphError::EmitOnUnsettled { node: node.into() }
    }

    pub fn emit_on_failed(node: impl Into<String>, source: GraphError) -> Self {
        GraphError::EmitOnFailed {
            node: node.into(),
            source: Arc::new(source),
        }
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Build(e) => write!(f, "{e}"),
            GraphError::RequiredNull { node, slot } => {
                write!(f, "{node}: required slot `{slot}` resolved to no value")
            }
            GraphError::BodyThrew { node, source } => write!(f, "{node}: body failed: {source}"),
            GraphError::BodyReturnedNull { node } => {
                write!(f, "{node}: body produced no value, but the node cannot emit null")
            }
            GraphError::DeciderOff { node, decider_key } => match decider_key {
                Some(key) => write!(f, "{node}: decider `{key}` suppressed execution"),
                None => write!(f, "{node}: decider suppressed execution"),
            },
            GraphError::EmitOnUnsettled { node } => write!(f, "{node}: emit() called before the node settled"),
            GraphError::EmitOnFailed { node, source } => {
                write!(f, "{node}: emit() called on a failed node: {source}")
            }
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::BodyThrew { source, .. } => Some(source.as_ref()),
            GraphError::EmitOnFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

///
/// Synchronous build-time failures, raised from `Builder::build()`.
///
#[derive(Clone, Debug)]
pub enum BuildError {
    MissingRequiredSlots { kind: &'static str, slots: Vec<&'static str> },
    DoubleBoundSlot { kind: &'static str, slot: &'static str },
    UnknownSlot { kind: &'static str, slot: String },
    /// Part of the documented build-error taxonomy (spec.md §7.1); not constructible through
    /// `build!` or `Builder`, since the macro only accepts `slot => node` pairs and so can never
    /// assemble an odd argument list in the first place.
    OddPositionalArgs { kind: &'static str },
    /// Part of the documented build-error taxonomy (spec.md §7.1); unreachable in this crate,
    /// which has no anonymous-default-slot `NodeKind` (every kind declares a named `SLOTS` set)
    /// for a dependency count to overflow.
    TooManyDependencies { kind: &'static str, max: usize, got: usize },
    ExposedSubgraphEmpty { subgraph: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::MissingRequiredSlots { kind, slots } => {
                write!(f, "{kind}: missing required slot(s): {}", slots.join(", "))
            }
            BuildError::DoubleBoundSlot { kind, slot } => {
                write!(f, "{kind}: slot `{slot}` was bound more than once")
            }
            BuildError::UnknownSlot { kind, slot } => {
                write!(f, "{kind}: `{slot}` is not a declared slot of this kind")
            }
            BuildError::OddPositionalArgs { kind } => {
                write!(f, "{kind}: positional build() args must come in (slot, node) pairs")
            }
            BuildError::TooManyDependencies { kind, max, got } => {
                write!(f, "{kind}: {got} dependencies exceeds the default-slot cardinality of {max}")
            }
            BuildError::ExposedSubgraphEmpty { subgraph } => {
                write!(f, "subgraph `{subgraph}`: markExposed() called with no exposed nodes")
            }
        }
    }
}

impl std::error::Error for BuildError {}

impl From<BuildError> for GraphError {
    fn from(e: BuildError) -> Self {
        GraphError::Build(e)
    }
}
