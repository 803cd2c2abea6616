// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;

use crate::combinators::map2;
use crate::node::{BodyFn, Node};

///
/// Evaluates every operand concurrently, then ANDs them together as if they had been evaluated
/// left to right with short-circuit: the first operand, in list order, that is not `Ok(true)`
/// decides the result — `Ok(false)` settles this node `false` even if a later operand failed,
/// and a failure settles this node with that failure even if a later operand is `false`. Only
/// the decisive operand's outcome is reported; its position, not completion order, is what
/// matters, since sequential `b1 && b2 && ...` never evaluates past the first non-true operand.
///
pub fn and_eager(name: impl Into<String>, nodes: Vec<Node<bool>>) -> Node<bool> {
    assert!(nodes.len() >= 2, "and_eager requires at least 2 operands");
    let body: BodyFn<bool> = Arc::new(move || {
        let nodes = nodes.clone();
        async move {
            let results = join_all(nodes.iter().map(|n| n.apply())).await;
            for r in results {
                match r {
                    Ok(true) => continue,
                    Ok(false) => return Ok(false),
                    Err(e) => return Err(e),
                }
            }
            Ok(true)
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// Evaluates operands left to right, stopping at the first `false` or the first failure.
pub fn and_lazy(name: impl Into<String>, nodes: Vec<Node<bool>>) -> Node<bool> {
    assert!(nodes.len() >= 2, "and_lazy requires at least 2 operands");
    let body: BodyFn<bool> = Arc::new(move || {
        let nodes = nodes.clone();
        async move {
            for n in &nodes {
                if !n.apply().await? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        .boxed()
    });
    Node::from_body(name, body)
}

///
/// Evaluates every operand concurrently, then ORs them together as if they had been evaluated
/// left to right with short-circuit: the first operand, in list order, that is not `Ok(false)`
/// decides the result — `Ok(true)` settles this node `true` even if a later operand failed, and
/// a failure settles this node with that failure even if a later operand is `true`. Symmetric to
/// [`and_eager`]: sequential `b1 || b2 || ...` never evaluates past the first non-false operand.
///
pub fn or_eager(name: impl Into<String>, nodes: Vec<Node<bool>>) -> Node<bool> {
    assert!(nodes.len() >= 2, "or_eager requires at least 2 operands");
    let body: BodyFn<bool> = Arc::new(move || {
        let nodes = nodes.clone();
        async move {
            let results = join_all(nodes.iter().map(|n| n.apply())).await;
            for r in results {
                match r {
                    Ok(false) => continue,
                    Ok(true) => return Ok(true),
                    Err(e) => return Err(e),
                }
            }
            Ok(false)
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// Evaluates operands left to right, stopping at the first `true` or the first failure.
pub fn or_lazy(name: impl Into<String>, nodes: Vec<Node<bool>>) -> Node<bool> {
    assert!(nodes.len() >= 2, "or_lazy requires at least 2 operands");
    let body: BodyFn<bool> = Arc::new(move || {
        let nodes = nodes.clone();
        async move {
            for n in &nodes {
                if n.apply().await? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        .boxed()
    });
    Node::from_body(name, body)
}

/// Logical negation.
pub fn not(name: impl Into<String>, node: Node<bool>) -> Node<bool> {
    crate::combinators::map(name, node, |v| !v)
}

/// `true` when both operands settle to equal values.
pub fn equals<T>(name: impl Into<String>, a: Node<T>, b: Node<T>) -> Node<bool>
where
    T: PartialEq + crate::presence::MaybeAbsent,
{
    map2(name, a, b, |a, b| a == b)
}
