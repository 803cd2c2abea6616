// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;

use crate::error::GraphError;
use crate::node::{BodyFn, Node, NodeResult};
use crate::presence::MaybeAbsent;

/// A node that settles immediately with a fixed, already-known value.
pub fn value<T: MaybeAbsent>(v: T, name: impl Into<String>) -> Node<T> {
    let v = Arc::new(v);
    let body: BodyFn<T> = Arc::new(move || {
        let v = v.clone();
        async move { Ok((*v).clone()) }.boxed()
    });
    Node::from_body(name, body)
}

/// A node whose value is computed synchronously, at most once, the first time it is applied.
pub fn value_from_supplier<T, F>(name: impl Into<String>, supplier: F) -> Node<T>
where
    T: MaybeAbsent,
    F: Fn() -> T + Send + Sync + 'static,
{
    let supplier = Arc::new(supplier);
    let body: BodyFn<T> = Arc::new(move || {
        let supplier = supplier.clone();
        async move { Ok(supplier()) }.boxed()
    });
    Node::from_body(name, body)
}

///
/// Adapts an arbitrary one-shot async producer (for example, a remote call) into a Node.
///
/// Unlike `value_from_supplier`, the producer is an `async` computation that may itself fail;
/// its `FnOnce` is consumed on the single occasion the node's body actually runs.
///
pub fn wrap_future<T, F, Fut>(name: impl Into<String>, f: F) -> Node<T>
where
    T: MaybeAbsent,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = NodeResult<T>> + Send + 'static,
{
    let slot = Arc::new(Mutex::new(Some(f)));
    let body: BodyFn<T> = Arc::new(move || {
        let slot = slot.clone();
        async move {
            let f = slot.lock().take().expect("wrap_future body invoked more than once");
            f().await
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// A node that settles immediately with the given failure.
pub fn fail<T: MaybeAbsent>(name: impl Into<String>, err: GraphError) -> Node<T> {
    let err = Arc::new(err);
    let body: BodyFn<T> = Arc::new(move || {
        let err = err.clone();
        async move { Err((*err).clone()) }.boxed()
    });
    Node::from_body(name, body)
}

///
/// A node that settles with `T`'s absent value.
///
/// Panics at construction time if `T` has no absent representation (i.e. `T` is not an
/// `Option<U>`); this is a programmer error akin to misdeclaring a slot, not a runtime failure.
///
pub fn absent<T: MaybeAbsent>(name: impl Into<String>) -> Node<T> {
    let v = T::absent().expect("absent() requires a type with an absent representation, e.g. Option<U>");
    value(v, name)
}

/// Equivalent to [`absent`] with a fixed, conventional name.
pub fn no_value<T: MaybeAbsent>() -> Node<T> {
    absent("noValue")
}

/// The constant `true` node.
pub fn literal_true() -> Node<bool> {
    value(true, "true")
}

/// The constant `false` node.
pub fn literal_false() -> Node<bool> {
    value(false, "false")
}

///
/// Converts a nullable dependency into a required one: a `Some(v)` settlement unwraps to `v`,
/// and a `None` settlement becomes [`GraphError::BodyReturnedNull`].
///
pub fn require_present<T: MaybeAbsent>(source: Node<Option<T>>) -> Node<T> {
    let name = format!("{}.requirePresent", source.name());
    let body: BodyFn<T> = Arc::new(move || {
        let source = source.clone();
        async move {
            match source.apply().await? {
                Some(v) => Ok(v),
                None => Err(GraphError::body_returned_null(source.name())),
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}
