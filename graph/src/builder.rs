// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use fnv::FnvHashMap as HashMap;
use futures::future::join_all;
use futures::FutureExt;

use crate::debug::DebugSink;
use crate::error::{BodyError, BuildError, GraphError};
use crate::node::{gate_with_decider, BodyFn, Node, SinkFn};
use crate::presence::MaybeAbsent;

///
/// The declaration of one of a `NodeKind`'s dependency slots.
///
/// `required` slots must be bound before `build()` will succeed, and their dependency must
/// settle to a present value or the built node fails. Unbound optional slots, and bound ones
/// whose dependency fails or settles absent, simply have no value for [`SlotValues::get`] to
/// return.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotSpec {
    pub id: &'static str,
    pub required: bool,
}

impl SlotSpec {
    pub const fn required(id: &'static str) -> SlotSpec {
        SlotSpec { id, required: true }
    }

    pub const fn optional(id: &'static str) -> SlotSpec {
        SlotSpec { id, required: false }
    }
}

///
/// The body, slot declaration, and display name of a family of Nodes.
///
/// A `NodeKind` is a template: [`Builder`] binds concrete dependency Nodes to its declared
/// slots and produces one [`Node`] per `build()` call. Multiple built nodes may share the
/// same `NodeKind` instance (for example, a stateless `Sum` kind reused across many bindings).
///
#[async_trait]
pub trait NodeKind: Send + Sync + 'static {
    /// The type this kind's nodes settle with.
    type Output: MaybeAbsent;

    /// This kind's dependency slots. Referenced by `id` from `Builder::depends_on`.
    const SLOTS: &'static [SlotSpec];

    /// The name used in error messages and as a built node's default display name.
    fn display_name() -> &'static str;

    ///
    /// Computes this kind's output from its bound dependency values.
    ///
    /// An `Err` returned here is this node's own body failing (§7.4's "Body-threw" kind, not a
    /// dependency failure): `Builder::build` wraps it in [`GraphError::BodyThrew`] with this
    /// node's name before it reaches a dependent, so `run` itself returns the plain
    /// application-level error rather than a pre-wrapped `GraphError`.
    ///
    async fn run(&self, values: &SlotValues) -> Result<Self::Output, BodyError>;
}

///
/// The type-erased, resolved dependency values passed to [`NodeKind::run`].
///
/// A slot has a value in this map exactly when its bound dependency settled to a present,
/// non-absent value; a failed or absent optional dependency is indistinguishable from an
/// unbound one.
///
#[derive(Default)]
pub struct SlotValues {
    values: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl SlotValues {
    /// The value bound to `slot`, if any, downcast to `V`.
    pub fn get<V: Clone + 'static>(&self, slot: &'static str) -> Option<V> {
        self.values.get(slot).and_then(|v| v.downcast_ref::<V>()).cloned()
    }

    /// The value bound to a required slot. Panics if absent: `Builder::build` guarantees a
    /// required slot cannot reach `run()` without a present value.
    pub fn require<V: Clone + 'static>(&self, slot: &'static str) -> V {
        self.get(slot)
            .unwrap_or_else(|| panic!("slot `{slot}` missing at run() time; this is a builder bug"))
    }
}

#[async_trait]
trait ErasedDep: Send + Sync {
    fn slot(&self) -> &'static str;
    async fn resolve(&self) -> Result<Option<Box<dyn Any + Send + Sync>>, GraphError>;
}

struct RequiredDep<V: MaybeAbsent> {
    slot: &'static str,
    kind: &'static str,
    node: Node<V>,
}

#[async_trait]
impl<V: MaybeAbsent> ErasedDep for RequiredDep<V> {
    fn slot(&self) -> &'static str {
        self.slot
    }

    async fn resolve(&self) -> Result<Option<Box<dyn Any + Send + Sync>>, GraphError> {
        let v = self.node.apply().await?;
        if v.is_absent() {
            return Err(GraphError::required_null(self.kind, self.slot));
        }
        Ok(Some(Box::new(v)))
    }
}

struct OptionalDep<V: MaybeAbsent> {
    slot: &'static str,
    node: Node<V>,
}

#[async_trait]
impl<V: MaybeAbsent> ErasedDep for OptionalDep<V> {
    fn slot(&self) -> &'static str {
        self.slot
    }

    async fn resolve(&self) -> Result<Option<Box<dyn Any + Send + Sync>>, GraphError> {
        match self.node.apply().await {
            Ok(v) if !v.is_absent() => Ok(Some(Box::new(v))),
            _ => Ok(None),
        }
    }
}

fn erase_sink<S: MaybeAbsent>(sink: Node<S>) -> SinkFn {
    Arc::new(move || {
        let sink = sink.clone();
        async move {
            let _ = sink.apply().await;
        }
        .boxed()
    })
}

///
/// Assembles a [`Node`] from a [`NodeKind`] and its bound dependencies, decider, sinks, and key.
///
/// Slot binding and required-slot presence are validated eagerly in [`Builder::build`]; nothing
/// about an invalid binding is deferred to evaluation time.
///
pub struct Builder<K: NodeKind> {
    kind: K,
    deps: HashMap<&'static str, Arc<dyn ErasedDep>>,
    decider: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
    decider_key: Option<String>,
    sinks: Vec<SinkFn>,
    key: Option<String>,
    debug_sink: Option<Arc<dyn DebugSink>>,
}

impl<K: NodeKind> Builder<K> {
    pub fn new(kind: K) -> Builder<K> {
        Builder {
            kind,
            deps: HashMap::default(),
            decider: None,
            decider_key: None,
            sinks: Vec::new(),
            key: None,
            debug_sink: None,
        }
    }

    /// Binds `node` to `slot`. Errors if `slot` is not one of `K::SLOTS`, or if it has already
    /// been bound.
    pub fn depends_on<V: MaybeAbsent>(mut self, slot: &'static str, node: Node<V>) -> Result<Builder<K>, GraphError> {
        let spec = K::SLOTS
            .iter()
            .find(|s| s.id == slot)
            .ok_or_else(|| BuildError::UnknownSlot {
                kind: K::display_name(),
                slot: slot.to_string(),
            })?;
        if self.deps.contains_key(slot) {
            return Err(BuildError::DoubleBoundSlot {
                kind: K::display_name(),
                slot,
            }
            .into());
        }
        let dep: Arc<dyn ErasedDep> = if spec.required {
            Arc::new(RequiredDep {
                slot,
                kind: K::display_name(),
                node,
            })
        } else {
            Arc::new(OptionalDep { slot, node })
        };
        self.deps.insert(slot, dep);
        Ok(self)
    }

    /// Installs a decider, keyed for error reporting, gating whether this node's body runs at
    /// all.
    pub fn with_decider<F>(mut self, key: impl Into<String>, decider: F) -> Builder<K>
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.decider = Some(Arc::new(decider));
        self.decider_key = Some(key.into());
        self
    }

    /// Registers a fire-and-forget node to be applied (its own result discarded) once this node
    /// settles, whether it succeeds or fails.
    pub fn with_sink<S: MaybeAbsent>(mut self, sink: Node<S>) -> Builder<K> {
        self.sinks.push(erase_sink(sink));
        self
    }

    /// Registers several sinks at once. See [`Builder::with_sink`].
    pub fn with_sinks<S: MaybeAbsent>(mut self, sinks: impl IntoIterator<Item = Node<S>>) -> Builder<K> {
        for sink in sinks {
            self.sinks.push(erase_sink(sink));
        }
        self
    }

    /// Assigns this node a caching/debugging key, overriding its default display name.
    pub fn with_key(mut self, key: impl Into<String>) -> Builder<K> {
        self.key = Some(key.into());
        self
    }

    /// Installs a [`DebugSink`] observing this node's apply/settle/sink-dispatch lifecycle.
    pub fn with_debug_sink(mut self, sink: Arc<dyn DebugSink>) -> Builder<K> {
        self.debug_sink = Some(sink);
        self
    }

    /// Validates slot bindings and produces the built [`Node`].
    pub fn build(self) -> Result<Node<K::Output>, GraphError> {
        let missing: Vec<&'static str> = K::SLOTS
            .iter()
            .filter(|s| s.required && !self.deps.contains_key(s.id))
            .map(|s| s.id)
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::MissingRequiredSlots {
                kind: K::display_name(),
                slots: missing,
            }
            .into());
        }

        let name = self.key.clone().unwrap_or_else(|| K::display_name().to_string());
        let kind = Arc::new(self.kind);
        let deps: Vec<Arc<dyn ErasedDep>> = self.deps.into_values().collect();
        let body_name = name.clone();

        let raw_body: BodyFn<K::Output> = Arc::new(move || {
            let kind = kind.clone();
            let deps = deps.clone();
            let body_name = body_name.clone();
            async move {
                let resolved = join_all(deps.iter().map(|d| d.resolve())).await;
                let mut values = SlotValues::default();
                for (dep, r) in deps.iter().zip(resolved) {
                    if let Some(boxed) = r? {
                        values.values.insert(dep.slot(), boxed);
                    }
                }
                // A dependency failure (above, via `?`) is propagated verbatim; only a failure
                // from this node's own `run()` gets wrapped with its name as Body-threw.
                kind.run(&values).await.map_err(|e| GraphError::body_threw(body_name, e))
            }
            .boxed()
        });

        let body = gate_with_decider(name.clone(), self.decider, self.decider_key, raw_body);
        Ok(Node::from_parts(name, self.key, body, self.sinks, self.debug_sink))
    }
}

///
/// Builds a node from a kind and a flat list of `slot => node` pairs, without the fluent
/// `Builder` chain. Mirrors the positional constructor of the reference design; Rust's lack of
/// heterogeneous varargs makes this a macro rather than a function.
///
#[macro_export]
macro_rules! build {
    ($kind:expr $(, $slot:expr => $node:expr)* $(,)?) => {{
        let builder = $crate::Builder::new($kind);
        $(
            let builder = builder.depends_on($slot, $node)?;
        )*
        builder.build()
    }};
}
