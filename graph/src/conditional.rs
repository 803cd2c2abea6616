// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::sync::Arc;

use futures::FutureExt;

use crate::boolean::not;
use crate::error::GraphError;
use crate::node::{BodyFn, Node};
use crate::presence::MaybeAbsent;

/// Evaluates `cond`, then applies exactly one of `if_true` or `if_false` — the other branch is
/// never applied, so it never runs its body or fires its sinks.
pub fn if_then_else<T: MaybeAbsent>(name: impl Into<String>, cond: Node<bool>, if_true: Node<T>, if_false: Node<T>) -> Node<T> {
    let body: BodyFn<T> = Arc::new(move || {
        let cond = cond.clone();
        let if_true = if_true.clone();
        let if_false = if_false.clone();
        async move {
            if cond.apply().await? {
                if_true.apply().await
            } else {
                if_false.apply().await
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// Applies `if_true` only when `cond` settles `true`; otherwise settles `None` without applying
/// it at all.
pub fn if_then<T: MaybeAbsent>(name: impl Into<String>, cond: Node<bool>, if_true: Node<T>) -> Node<Option<T>> {
    let body: BodyFn<Option<T>> = Arc::new(move || {
        let cond = cond.clone();
        let if_true = if_true.clone();
        async move {
            if cond.apply().await? {
                Ok(Some(if_true.apply().await?))
            } else {
                Ok(None)
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}

///
/// Applies `node` only when `cond` settles `true`. Unlike [`if_then`], the result type is not
/// wrapped: when `cond` is `false`, this settles to `T::absent()` if `T` admits one, or to a
/// [`GraphError::DeciderOff`] otherwise.
///
pub fn when<T: MaybeAbsent>(name: impl Into<String>, cond: Node<bool>, node: Node<T>) -> Node<T> {
    let body: BodyFn<T> = Arc::new(move || {
        let cond = cond.clone();
        let node = node.clone();
        async move {
            if cond.apply().await? {
                node.apply().await
            } else if let Some(absent) = T::absent() {
                Ok(absent)
            } else {
                Err(GraphError::decider_off(node.name(), None))
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// The complement of [`when`]: applies `node` only when `cond` settles `false`.
pub fn unless<T: MaybeAbsent>(name: impl Into<String>, cond: Node<bool>, node: Node<T>) -> Node<T> {
    let name = name.into();
    let inverted = not(format!("{name}.!cond"), cond);
    when(name, inverted, node)
}

///
/// Applies `node` only when `cond` settles to a present value (success and non-absent), rather
/// than to a separate boolean. Unlike [`if_success_then`], the result type is not `Option`-wrapped:
/// when `cond` is absent or fails, this settles to `T::absent()` if `T` admits one, or to a
/// [`GraphError::DeciderOff`] otherwise. The sugar counterpart of [`when`] for success-gating.
///
pub fn when_success<C, T>(name: impl Into<String>, cond: Node<C>, node: Node<T>) -> Node<T>
where
    C: MaybeAbsent,
    T: MaybeAbsent,
{
    let body: BodyFn<T> = Arc::new(move || {
        let cond = cond.clone();
        let node = node.clone();
        async move {
            match cond.apply().await {
                Ok(v) if !v.is_absent() => node.apply().await,
                _ => T::absent().ok_or_else(|| GraphError::decider_off(node.name(), None)),
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// Applies `primary`; if it settles absent or fails, falls back to applying `fallback` instead.
pub fn or_else<T: MaybeAbsent>(name: impl Into<String>, primary: Node<Option<T>>, fallback: Node<T>) -> Node<T> {
    let body: BodyFn<T> = Arc::new(move || {
        let primary = primary.clone();
        let fallback = fallback.clone();
        async move {
            match primary.apply().await {
                Ok(Some(v)) => Ok(v),
                _ => fallback.apply().await,
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}

///
/// Branches on whether `predicate` itself settles to a present value, rather than on a separate
/// boolean condition: `if_success` runs when `predicate` succeeds with a present value,
/// `if_failure` runs otherwise (predicate failure or absence).
///
pub fn if_success_then_else<P, T>(name: impl Into<String>, predicate: Node<P>, if_success: Node<T>, if_failure: Node<T>) -> Node<T>
where
    P: MaybeAbsent,
    T: MaybeAbsent,
{
    let body: BodyFn<T> = Arc::new(move || {
        let predicate = predicate.clone();
        let if_success = if_success.clone();
        let if_failure = if_failure.clone();
        async move {
            match predicate.apply().await {
                Ok(v) if !v.is_absent() => if_success.apply().await,
                _ => if_failure.apply().await,
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// Like [`if_success_then_else`], but with no failure branch: settles `None` when `predicate`
/// fails or is absent.
pub fn if_success_then<P, T>(name: impl Into<String>, predicate: Node<P>, if_success: Node<T>) -> Node<Option<T>>
where
    P: MaybeAbsent,
    T: MaybeAbsent,
{
    let body: BodyFn<Option<T>> = Arc::new(move || {
        let predicate = predicate.clone();
        let if_success = if_success.clone();
        async move {
            match predicate.apply().await {
                Ok(v) if !v.is_absent() => Ok(Some(if_success.apply().await?)),
                _ => Ok(None),
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}

///
/// Applies `cond`, `if_true`, and `if_false` all concurrently — unlike [`if_then_else`], both
/// branches always run to completion — and then selects the branch matching `cond`.
///
/// Useful when both branches have side effects (sinks, cache warming) that should happen
/// regardless of which one is logically selected.
///
pub fn if_then_else_eager<T: MaybeAbsent>(name: impl Into<String>, cond: Node<bool>, if_true: Node<T>, if_false: Node<T>) -> Node<T> {
    let body: BodyFn<T> = Arc::new(move || {
        let cond = cond.clone();
        let if_true = if_true.clone();
        let if_false = if_false.clone();
        async move {
            let (cond, true_branch, false_branch) = tokio::join!(cond.apply(), if_true.apply(), if_false.apply());
            if cond? {
                true_branch
            } else {
                false_branch
            }
        }
        .boxed()
    });
    Node::from_body(name, body)
}
