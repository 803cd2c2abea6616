// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::OnceCell;

use crate::debug::DebugSink;
use crate::error::GraphError;
use crate::presence::MaybeAbsent;

/// The settled (or pending) result of a Node's evaluation.
pub type NodeResult<T> = Result<T, GraphError>;

/// A boxed future producing a Node's result. Every Node body and combinator is expressed in
/// terms of this alias so that heterogeneous bodies can be stored behind one object-safe type.
pub type NodeFuture<T> = BoxFuture<'static, NodeResult<T>>;

pub(crate) type BodyFn<T> = Arc<dyn Fn() -> NodeFuture<T> + Send + Sync>;

pub(crate) type SinkFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct Inner<T: MaybeAbsent> {
    name: String,
    key: Option<String>,
    cell: OnceCell<NodeResult<T>>,
    body: BodyFn<T>,
    sinks: Vec<SinkFn>,
    debug_sink: Option<Arc<dyn DebugSink>>,
}

///
/// A node in the dependency graph: a named, at-most-once-evaluated asynchronous computation.
///
/// A `Node<T>` is a cheap, `Arc`-backed handle: cloning it does not duplicate work, it hands out
/// another reference to the same underlying promise. Every clone that calls [`Node::apply`]
/// observes the same settlement, and the node's body runs at most once regardless of how many
/// concurrent callers race to apply it first.
///
pub struct Node<T: MaybeAbsent>(Arc<Inner<T>>);

impl<T: MaybeAbsent> Clone for Node<T> {
    fn clone(&self) -> Self {
        Node(self.0.clone())
    }
}

impl<T: MaybeAbsent> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.0.name)
            .field("key", &self.0.key)
            .field("settled", &self.0.cell.initialized())
            .finish()
    }
}

impl<T: MaybeAbsent> Node<T> {
    pub(crate) fn from_body(name: impl Into<String>, body: BodyFn<T>) -> Node<T> {
        Node(Arc::new(Inner {
            name: name.into(),
            key: None,
            cell: OnceCell::new(),
            body,
            sinks: Vec::new(),
            debug_sink: None,
        }))
    }

    pub(crate) fn from_parts(
        name: String,
        key: Option<String>,
        body: BodyFn<T>,
        sinks: Vec<SinkFn>,
        debug_sink: Option<Arc<dyn DebugSink>>,
    ) -> Node<T> {
        Node(Arc::new(Inner {
            name,
            key,
            cell: OnceCell::new(),
            body,
            sinks,
            debug_sink,
        }))
    }

    /// The display name assigned at construction (the `NodeKind`'s name, or a combinator-chosen
    /// label such as `"x.map"`).
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The caching/debugging key assigned via `Builder::with_key`, if any.
    pub fn key(&self) -> Option<&str> {
        self.0.key.as_deref()
    }

    ///
    /// Evaluates this node, returning its settled result.
    ///
    /// The first caller (across all clones of this node) to reach this point runs the node's
    /// body; every other concurrent or subsequent caller is handed the same settled result
    /// without re-running it. Once this node settles, success or failure, its sinks are each
    /// dispatched exactly once, via `tokio::spawn`, and their results discarded.
    ///
    pub fn apply(&self) -> NodeFuture<T> {
        let inner = self.0.clone();
        async move {
            log::trace!("applying node `{}`", inner.name);
            let result = inner
                .cell
                .get_or_init(|| {
                    let inner = inner.clone();
                    async move {
                        if let Some(sink) = &inner.debug_sink {
                            sink.on_apply(&inner.name);
                        }
                        let result = (inner.body)().await;
                        match &result {
                            Ok(_) => log::trace!("node `{}` settled successfully", inner.name),
                            Err(e) => log::debug!("node `{}` failed: {e}", inner.name),
                        }
                        if let Some(sink) = &inner.debug_sink {
                            sink.on_settle(&inner.name, result.is_ok());
                        }
                        // Sinks observe this node settling, not this node succeeding: a failed
                        // or decider-gated-off node still fires its sinks.
                        inner.fire_sinks();
                        result
                    }
                })
                .await
                .clone();
            result
        }
        .boxed()
    }

    ///
    /// Returns this node's already-settled result without triggering evaluation.
    ///
    /// Errors with [`GraphError::EmitOnUnsettled`] if `apply()` has not yet settled this node,
    /// and with [`GraphError::EmitOnFailed`] if it settled with a failure.
    ///
    pub fn emit(&self) -> NodeResult<T> {
        match self.0.cell.get() {
            None => Err(GraphError::emit_on_unsettled(self.name())),
            Some(Ok(v)) => Ok(v.clone()),
            Some(Err(e)) => Err(GraphError::emit_on_failed(self.name(), e.clone())),
        }
    }

    ///
    /// Adapts this node into one that never fails: a body failure or a required-slot error
    /// collapses to `None`, and a successful settlement of `v` becomes `Some(v)`.
    ///
    pub fn to_safe_handle(&self) -> Node<Option<T>> {
        let this = self.clone();
        let name = format!("{}.toSafeHandle", this.name());
        Node::from_body(name, Arc::new(move || {
            let this = this.clone();
            async move { Ok(this.apply().await.ok()) }.boxed()
        }))
    }
}

///
/// Wraps a body so that it first consults an optional decider.
///
/// If the decider is absent, the body runs unconditionally. If present and it returns `false`,
/// the body never runs: the node settles with `T::absent()` when the type supports it, or with
/// [`GraphError::DeciderOff`] otherwise.
///
pub(crate) fn gate_with_decider<T: MaybeAbsent>(
    name: String,
    decider: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
    decider_key: Option<String>,
    body: BodyFn<T>,
) -> BodyFn<T> {
    match decider {
        None => body,
        Some(decider) => Arc::new(move || {
            let name = name.clone();
            let decider = decider.clone();
            let decider_key = decider_key.clone();
            let body = body.clone();
            async move {
                if decider() {
                    body().await
                } else if let Some(absent) = T::absent() {
                    log::trace!("node `{name}` gated off by decider, emitting absent value");
                    Ok(absent)
                } else {
                    Err(GraphError::decider_off(name, decider_key))
                }
            }
            .boxed()
        }),
    }
}

impl<T: MaybeAbsent> Inner<T> {
    fn fire_sinks(&self) {
        for sink in &self.sinks {
            let sink = sink.clone();
            log::trace!("dispatching sink for node `{}`", self.name);
            if let Some(debug_sink) = &self.debug_sink {
                debug_sink.on_sink_dispatch(&self.name);
            }
            tokio::spawn(async move { sink().await });
        }
    }
}
