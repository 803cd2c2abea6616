// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;

use crate::error::GraphError;
use crate::node::{gate_with_decider, BodyFn, Node};
use crate::presence::MaybeAbsent;

/// Transforms a settled value with a synchronous function. A source failure short-circuits:
/// `f` is never called and the failure propagates unchanged.
pub fn map<A, B, F>(name: impl Into<String>, source: Node<A>, f: F) -> Node<B>
where
    A: MaybeAbsent,
    B: MaybeAbsent,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let body: BodyFn<B> = Arc::new(move || {
        let source = source.clone();
        let f = f.clone();
        async move { Ok(f(source.apply().await?)) }.boxed()
    });
    Node::from_body(name, body)
}

///
///
/// Like [`map`], but masks rather than propagates a non-present source: if `source` fails or
/// settles absent, `f` is never called and this node settles absent itself (when `B` admits one,
/// else with [`GraphError::BodyReturnedNull`]) instead of carrying `source`'s failure forward.
/// Use this when `f` is only meaningful applied to a genuinely present value.
///
pub fn map_on_success<A, B, F>(name: impl Into<String>, source: Node<A>, f: F) -> Node<B>
where
    A: MaybeAbsent,
    B: MaybeAbsent,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    let name = name.into();
    let f = Arc::new(f);
    let body: BodyFn<B> = {
        let name = name.clone();
        Arc::new(move || {
            let name = name.clone();
            let source = source.clone();
            let f = f.clone();
            async move {
                match source.apply().await {
                    Ok(v) if !v.is_absent() => Ok(f(v)),
                    _ => B::absent().ok_or_else(|| GraphError::body_returned_null(name.clone())),
                }
            }
            .boxed()
        })
    };
    Node::from_body(name, body)
}

/// Tests a settled value against a named predicate, producing a boolean node. A source failure
/// propagates unchanged, same as [`map`]; `name` is typically derived from the predicate itself
/// (e.g. `"x.isEven"`) so the boolean node reads clearly in logs and debug output.
pub fn predicate<T, F>(name: impl Into<String>, source: Node<T>, f: F) -> Node<bool>
where
    T: MaybeAbsent,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    map(name, source, move |v| f(&v))
}

/// `true` when `source` settles absent (or fails): the inverse of [`is_not_null`].
pub fn is_null<T: MaybeAbsent>(name: impl Into<String>, source: Node<T>) -> Node<bool> {
    let name = name.into();
    let body: BodyFn<bool> = Arc::new(move || {
        let source = source.clone();
        async move {
            match source.apply().await {
                Ok(v) => Ok(v.is_absent()),
                Err(_) => Ok(true),
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// `true` when `source` settles to a present value. The complement of [`is_null`].
pub fn is_not_null<T: MaybeAbsent>(name: impl Into<String>, source: Node<T>) -> Node<bool> {
    let name = name.into();
    let inverted = is_null(format!("{name}.isNull"), source);
    crate::boolean::not(name, inverted)
}

/// A [`map`] gated by a decider: if the decider returns `false`, neither `source` nor `f` runs.
pub fn map_with_decider<A, B, F, D>(name: impl Into<String>, decider_key: impl Into<String>, decider: D, source: Node<A>, f: F) -> Node<B>
where
    A: MaybeAbsent,
    B: MaybeAbsent,
    F: Fn(A) -> B + Send + Sync + 'static,
    D: Fn() -> bool + Send + Sync + 'static,
{
    let name = name.into();
    let f = Arc::new(f);
    let raw: BodyFn<B> = Arc::new(move || {
        let source = source.clone();
        let f = f.clone();
        async move { Ok(f(source.apply().await?)) }.boxed()
    });
    let body = gate_with_decider(name.clone(), Some(Arc::new(decider)), Some(decider_key.into()), raw);
    Node::from_body(name, body)
}

/// Transforms a settled value into another Node and chains into it. A source failure
/// short-circuits: `f` is never called.
pub fn flat_map<A, B, F>(name: impl Into<String>, source: Node<A>, f: F) -> Node<B>
where
    A: MaybeAbsent,
    B: MaybeAbsent,
    F: Fn(A) -> Node<B> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let body: BodyFn<B> = Arc::new(move || {
        let source = source.clone();
        let f = f.clone();
        async move {
            let v = source.apply().await?;
            f(v).apply().await
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// A [`flat_map`] gated by a decider: if the decider returns `false`, neither `source` nor `f`
/// (nor the node `f` would have produced) runs.
pub fn flat_map_with_decider<A, B, F, D>(
    name: impl Into<String>,
    decider_key: impl Into<String>,
    decider: D,
    source: Node<A>,
    f: F,
) -> Node<B>
where
    A: MaybeAbsent,
    B: MaybeAbsent,
    F: Fn(A) -> Node<B> + Send + Sync + 'static,
    D: Fn() -> bool + Send + Sync + 'static,
{
    let name = name.into();
    let f = Arc::new(f);
    let raw: BodyFn<B> = Arc::new(move || {
        let source = source.clone();
        let f = f.clone();
        async move {
            let v = source.apply().await?;
            f(v).apply().await
        }
        .boxed()
    });
    let body = gate_with_decider(name.clone(), Some(Arc::new(decider)), Some(decider_key.into()), raw);
    Node::from_body(name, body)
}

macro_rules! map_n {
    ($name:ident, $flat_name:ident; $($t:ident : $n:ident),+) => {
        /// Joins several dependencies concurrently and combines them with a synchronous function.
        /// Any failure short-circuits the rest.
        pub fn $name<$($t,)+ B, F>(name: impl Into<String>, $($n: Node<$t>,)+ f: F) -> Node<B>
        where
            $($t: MaybeAbsent,)+
            B: MaybeAbsent,
            F: Fn($($t),+) -> B + Send + Sync + 'static,
        {
            let f = Arc::new(f);
            let body: BodyFn<B> = Arc::new(move || {
                $(let $n = $n.clone();)+
                let f = f.clone();
                async move {
                    let ($($n,)+) = tokio::try_join!($($n.apply()),+)?;
                    Ok(f($($n),+))
                }
                .boxed()
            });
            Node::from_body(name, body)
        }

        /// Like the sibling `map` of the same arity, but `f` produces a Node to chain into.
        pub fn $flat_name<$($t,)+ B, F>(name: impl Into<String>, $($n: Node<$t>,)+ f: F) -> Node<B>
        where
            $($t: MaybeAbsent,)+
            B: MaybeAbsent,
            F: Fn($($t),+) -> Node<B> + Send + Sync + 'static,
        {
            let f = Arc::new(f);
            let body: BodyFn<B> = Arc::new(move || {
                $(let $n = $n.clone();)+
                let f = f.clone();
                async move {
                    let ($($n,)+) = tokio::try_join!($($n.apply()),+)?;
                    f($($n),+).apply().await
                }
                .boxed()
            });
            Node::from_body(name, body)
        }
    };
}

map_n!(map2, flat_map2; A1:n1, A2:n2);
map_n!(map3, flat_map3; A1:n1, A2:n2, A3:n3);
map_n!(map4, flat_map4; A1:n1, A2:n2, A3:n3, A4:n4);
map_n!(map5, flat_map5; A1:n1, A2:n2, A3:n3, A4:n4, A5:n5);
map_n!(map6, flat_map6; A1:n1, A2:n2, A3:n3, A4:n4, A5:n5, A6:n6);
map_n!(map7, flat_map7; A1:n1, A2:n2, A3:n3, A4:n4, A5:n5, A6:n6, A7:n7);
map_n!(map8, flat_map8; A1:n1, A2:n2, A3:n3, A4:n4, A5:n5, A6:n6, A7:n7, A8:n8);

/// Applies every node concurrently and collects their settled values, in order. The first
/// failure (by completion order of the underlying join, not list order) fails the whole node.
pub fn collect<T: MaybeAbsent>(name: impl Into<String>, nodes: Vec<Node<T>>) -> Node<Vec<T>> {
    let body: BodyFn<Vec<T>> = Arc::new(move || {
        let nodes = nodes.clone();
        async move {
            join_all(nodes.iter().map(|n| n.apply()))
                .await
                .into_iter()
                .collect::<Result<Vec<T>, GraphError>>()
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// Like [`collect`], but over a map of keyed nodes, preserving keys.
pub fn collect_map<K, T>(name: impl Into<String>, nodes: HashMap<K, Node<T>>) -> Node<HashMap<K, T>>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    T: MaybeAbsent,
{
    let body: BodyFn<HashMap<K, T>> = Arc::new(move || {
        let nodes = nodes.clone();
        async move {
            let keys: Vec<K> = nodes.keys().cloned().collect();
            let results = join_all(nodes.values().map(|n| n.apply())).await;
            let mut out = HashMap::with_capacity(results.len());
            for (k, r) in keys.into_iter().zip(results) {
                out.insert(k, r?);
            }
            Ok(out)
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// Splits a settled list into one node per element via `f`, applies them concurrently, and
/// collects the results back into a list, in the original order.
pub fn split_and_collect<A, B, F>(name: impl Into<String>, source: Node<Vec<A>>, f: F) -> Node<Vec<B>>
where
    A: MaybeAbsent,
    B: MaybeAbsent,
    F: Fn(A) -> Node<B> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    let body: BodyFn<Vec<B>> = Arc::new(move || {
        let source = source.clone();
        let f = f.clone();
        async move {
            let items = source.apply().await?;
            let nodes: Vec<Node<B>> = items.into_iter().map(|a| f(a)).collect();
            join_all(nodes.iter().map(|n| n.apply()))
                .await
                .into_iter()
                .collect::<Result<Vec<B>, GraphError>>()
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// A type-erased handle used only to sequence a prerequisite node ahead of another via
/// [`wait_on`]; both its settled value and any failure are discarded.
pub type WaitHandle = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps `node` as a prerequisite for [`wait_on`].
pub fn wait_for<W: MaybeAbsent>(node: Node<W>) -> WaitHandle {
    Arc::new(move || {
        let node = node.clone();
        async move {
            let _ = node.apply().await;
        }
        .boxed()
    })
}

///
/// Applies `waits` in order, each one fully settling before the next starts, then applies and
/// returns `source`. A failure in any `wait` does not propagate and does not stop the rest of
/// `waits`, or `source`, from running.
///
/// This differs from a sink: a sink fires *after* a node settles and its outcome is discarded;
/// `wait_on` runs its prerequisites *before* its source, with their outcomes equally discarded.
///
pub fn wait_on<T: MaybeAbsent>(name: impl Into<String>, waits: Vec<WaitHandle>, source: Node<T>) -> Node<T> {
    let body: BodyFn<T> = Arc::new(move || {
        let waits = waits.clone();
        let source = source.clone();
        async move {
            for wait in &waits {
                wait().await;
            }
            source.apply().await
        }
        .boxed()
    });
    Node::from_body(name, body)
}
