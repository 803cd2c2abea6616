// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

///
/// A pluggable observer of node lifecycle events, for debugging and tracing tooling built on
/// top of this crate. This crate ships no remote-facing sink of its own, only a no-op default
/// and one that forwards to the `log` facade.
///
pub trait DebugSink: Send + Sync {
    /// Called once, the first time a node is applied.
    fn on_apply(&self, node: &str) {
        let _ = node;
    }

    /// Called once a node's promise settles, successfully or not.
    fn on_settle(&self, node: &str, succeeded: bool) {
        let _ = (node, succeeded);
    }

    /// Called once per sink dispatched after a node settles, whether it succeeded or failed.
    fn on_sink_dispatch(&self, node: &str) {
        let _ = node;
    }
}

/// A [`DebugSink`] that does nothing. The default when no sink is configured.
#[derive(Default, Clone, Copy)]
pub struct NullDebugSink;

impl DebugSink for NullDebugSink {}

/// A [`DebugSink`] that forwards every event to the `log` facade at `trace` level.
#[derive(Default, Clone, Copy)]
pub struct LoggingDebugSink;

impl DebugSink for LoggingDebugSink {
    fn on_apply(&self, node: &str) {
        log::trace!("debug: applying `{node}`");
    }

    fn on_settle(&self, node: &str, succeeded: bool) {
        log::trace!("debug: `{node}` settled (succeeded={succeeded})");
    }

    fn on_sink_dispatch(&self, node: &str) {
        log::trace!("debug: dispatching sink from `{node}`");
    }
}
