// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{BuildError, GraphError};

/// The name of the subgraph a node was exposed through, if any. Set at most once, by
/// [`Subgraph::mark_exposed`]; purely informational, it has no effect on evaluation.
#[derive(Default, Clone)]
pub struct ExposedBy(Arc<Mutex<Option<String>>>);

impl ExposedBy {
    pub fn get(&self) -> Option<String> {
        self.0.lock().clone()
    }

    fn set(&self, subgraph: &str) {
        let mut guard = self.0.lock();
        if guard.is_none() {
            *guard = Some(subgraph.to_string());
        }
    }
}

///
/// A named, structural grouping of nodes.
///
/// A `Subgraph` has no evaluation semantics of its own: it exists for exposure bookkeeping, so
/// that tooling built on this crate can report which named grouping produced a given node.
///
pub struct Subgraph {
    name: String,
    exposed: Vec<ExposedBy>,
}

impl Subgraph {
    pub fn new(name: impl Into<String>) -> Subgraph {
        Subgraph {
            name: name.into(),
            exposed: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    ///
    /// Marks `handle` as exposed by this subgraph, for later lookup via [`ExposedBy::get`].
    /// Collected until [`Subgraph::mark_exposed`] is called; calling it with nothing collected
    /// is a build error.
    ///
    pub fn expose(&mut self, handle: ExposedBy) {
        self.exposed.push(handle);
    }

    /// Finalizes exposure: every handle collected via [`Subgraph::expose`] is stamped with this
    /// subgraph's name. Errors if nothing was ever exposed.
    pub fn mark_exposed(&self) -> Result<(), GraphError> {
        if self.exposed.is_empty() {
            return Err(BuildError::ExposedSubgraphEmpty {
                subgraph: self.name.clone(),
            }
            .into());
        }
        for handle in &self.exposed {
            handle.set(&self.name);
        }
        Ok(())
    }
}
