// Copyright 2026 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::boolean::{and_eager, and_lazy, equals, not, or_eager, or_lazy};
use crate::builder::{Builder, NodeKind, SlotSpec, SlotValues};
use crate::combinators::{
    collect, flat_map, is_not_null, is_null, map, map2, map_on_success, map_with_decider, predicate, split_and_collect, wait_for, wait_on,
};
use crate::conditional::{if_success_then_else, if_then, if_then_else, if_then_else_eager, or_else, unless, when, when_success};
use crate::debug::DebugSink;
use crate::error::{BodyError, BuildError, GraphError};
use crate::node::Node;
use crate::subgraph::{ExposedBy, Subgraph};
use crate::value::{fail, literal_false, literal_true, no_value, require_present, value, value_from_supplier};

#[tokio::test]
async fn value_node_settles_once() {
    let _logger = env_logger::try_init();
    let n = value(42i64, "answer");
    assert_eq!(n.apply().await.unwrap(), 42);
    assert_eq!(n.emit().unwrap(), 42);
}

#[tokio::test]
async fn body_runs_at_most_once_under_concurrent_callers() {
    let _logger = env_logger::try_init();
    let counter = Arc::new(AtomicUsize::new(0));
    let n = {
        let counter = counter.clone();
        value_from_supplier("counted", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            7i64
        })
    };
    let (a, b, c) = tokio::join!(n.apply(), n.apply(), n.apply());
    assert_eq!(a.unwrap(), 7);
    assert_eq!(b.unwrap(), 7);
    assert_eq!(c.unwrap(), 7);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn emit_before_settle_errors() {
    let _logger = env_logger::try_init();
    let n = value(1i64, "n");
    match n.emit() {
        Err(GraphError::EmitOnUnsettled { .. }) => {}
        other => panic!("expected EmitOnUnsettled, got {other:?}"),
    }
}

#[tokio::test]
async fn emit_after_failure_wraps_the_source_error() {
    let _logger = env_logger::try_init();
    let n: Node<i64> = fail("boom", GraphError::body_returned_null("inner"));
    let _ = n.apply().await;
    match n.emit() {
        Err(GraphError::EmitOnFailed { .. }) => {}
        other => panic!("expected EmitOnFailed, got {other:?}"),
    }
}

struct Sum;

#[async_trait]
impl NodeKind for Sum {
    type Output = i64;

    const SLOTS: &'static [SlotSpec] = &[
        SlotSpec::required("a"),
        SlotSpec::required("b"),
        SlotSpec::required("c"),
        SlotSpec::optional("d"),
    ];

    fn display_name() -> &'static str {
        "Sum"
    }

    async fn run(&self, values: &SlotValues) -> Result<i64, BodyError> {
        let a: i64 = values.require("a");
        let b: i64 = values.require("b");
        let c: i64 = values.require("c");
        let d: i64 = values.get("d").unwrap_or(0);
        Ok(a + b + c + d)
    }
}

struct Failing;

#[async_trait]
impl NodeKind for Failing {
    type Output = i64;

    const SLOTS: &'static [SlotSpec] = &[SlotSpec::required("x")];

    fn display_name() -> &'static str {
        "Failing"
    }

    async fn run(&self, values: &SlotValues) -> Result<i64, BodyError> {
        let _: i64 = values.require("x");
        Err("the body threw".into())
    }
}

#[tokio::test]
async fn missing_required_slot_fails_build() {
    let _logger = env_logger::try_init();
    let result = Builder::new(Sum).depends_on("a", value(1i64, "a")).unwrap().depends_on("b", value(2i64, "b")).unwrap().build();
    match result {
        Err(GraphError::Build(BuildError::MissingRequiredSlots { slots, .. })) => {
            assert_eq!(slots, vec!["c"]);
        }
        other => panic!("expected MissingRequiredSlots, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_slot_fails_build() {
    let _logger = env_logger::try_init();
    let result = Builder::new(Sum).depends_on("zzz", value(1i64, "zzz"));
    match result {
        Err(GraphError::Build(BuildError::UnknownSlot { slot, .. })) => assert_eq!(slot, "zzz"),
        other => panic!("expected UnknownSlot, got {other:?}"),
    }
}

#[tokio::test]
async fn double_bound_slot_fails_build() {
    let _logger = env_logger::try_init();
    let result = Builder::new(Sum).depends_on("a", value(1i64, "a")).unwrap().depends_on("a", value(2i64, "a2"));
    match result {
        Err(GraphError::Build(BuildError::DoubleBoundSlot { slot, .. })) => assert_eq!(slot, "a"),
        other => panic!("expected DoubleBoundSlot, got {other:?}"),
    }
}

#[tokio::test]
async fn sum_of_required_and_optional_slots() {
    let _logger = env_logger::try_init();
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", value(3i64, "c"))
        .unwrap()
        .depends_on("d", value(4i64, "d"))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(node.apply().await.unwrap(), 10);
}

#[tokio::test]
async fn sum_without_optional_slot_defaults_to_zero() {
    let _logger = env_logger::try_init();
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", value(3i64, "c"))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(node.apply().await.unwrap(), 6);
}

#[tokio::test]
async fn required_slot_settling_absent_is_an_error() {
    let _logger = env_logger::try_init();
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", no_value::<Option<i64>>())
        .unwrap()
        .build()
        .unwrap();
    match node.apply().await {
        Err(GraphError::RequiredNull { slot, .. }) => assert_eq!(slot, "c"),
        other => panic!("expected RequiredNull, got {other:?}"),
    }
}

#[tokio::test]
async fn optional_slot_failure_is_absorbed() {
    let _logger = env_logger::try_init();
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", value(3i64, "c"))
        .unwrap()
        .depends_on("d", fail::<i64>("d_fails", GraphError::body_returned_null("d")))
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(node.apply().await.unwrap(), 6);
}

#[tokio::test]
async fn a_failing_run_body_is_wrapped_with_the_nodes_name() {
    let _logger = env_logger::try_init();
    let node = Builder::new(Failing)
        .depends_on("x", value(1i64, "x"))
        .unwrap()
        .with_key("failing-node")
        .build()
        .unwrap();
    match node.apply().await {
        Err(GraphError::BodyThrew { node, source }) => {
            assert_eq!(node, "failing-node");
            assert_eq!(source.to_string(), "the body threw");
        }
        other => panic!("expected BodyThrew, got {other:?}"),
    }
}

#[tokio::test]
async fn a_required_dependency_failure_is_not_wrapped_as_body_threw() {
    let _logger = env_logger::try_init();
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", fail::<i64>("c_fails", GraphError::body_returned_null("c")))
        .unwrap()
        .build()
        .unwrap();
    match node.apply().await {
        Err(GraphError::BodyReturnedNull { node }) => assert_eq!(node, "c"),
        other => panic!("expected the dependency's own BodyReturnedNull to propagate unwrapped, got {other:?}"),
    }
}

#[tokio::test]
async fn decider_off_without_absent_representation_errors() {
    let _logger = env_logger::try_init();
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", value(3i64, "c"))
        .unwrap()
        .with_decider("always-off", || false)
        .build()
        .unwrap();
    match node.apply().await {
        Err(GraphError::DeciderOff { .. }) => {}
        other => panic!("expected DeciderOff, got {other:?}"),
    }
}

#[tokio::test]
async fn decider_off_with_absent_representation_settles_none() {
    let _logger = env_logger::try_init();
    let source = value(5i64, "five");
    let mapped: Node<Option<i64>> = map_with_decider("double", "always-off", || false, source, |v| Some(v * 2));
    assert_eq!(mapped.apply().await.unwrap(), None);
}

#[tokio::test]
async fn map_on_success_masks_a_failing_source_instead_of_propagating() {
    let _logger = env_logger::try_init();
    let failing: Node<i64> = fail("boom", GraphError::body_returned_null("boom"));
    let mapped: Node<Option<i64>> = map_on_success("doubled", failing, |v| Some(v * 2));
    assert_eq!(mapped.apply().await.unwrap(), None);
}

#[tokio::test]
async fn map_on_success_runs_f_on_a_present_source() {
    let _logger = env_logger::try_init();
    let source = value(5i64, "five");
    let mapped: Node<Option<i64>> = map_on_success("doubled", source, |v| Some(v * 2));
    assert_eq!(mapped.apply().await.unwrap(), Some(10));
}

#[tokio::test]
async fn to_safe_handle_turns_failure_into_none() {
    let _logger = env_logger::try_init();
    let failing: Node<i64> = fail("boom", GraphError::body_returned_null("boom"));
    let safe = failing.to_safe_handle();
    assert_eq!(safe.apply().await.unwrap(), None);

    let ok = value(9i64, "nine").to_safe_handle();
    assert_eq!(ok.apply().await.unwrap(), Some(9));
}

#[tokio::test]
async fn require_present_unwraps_or_errors() {
    let _logger = env_logger::try_init();
    let present = value(Some(3i64), "present");
    let unwrapped = require_present(present);
    assert_eq!(unwrapped.apply().await.unwrap(), 3);

    let missing: Node<Option<i64>> = no_value();
    let unwrapped_missing = require_present(missing);
    match unwrapped_missing.apply().await {
        Err(GraphError::BodyReturnedNull { .. }) => {}
        other => panic!("expected BodyReturnedNull, got {other:?}"),
    }
}

#[tokio::test]
async fn map_transforms_and_propagates_failure() {
    let _logger = env_logger::try_init();
    let n = map("double", value(21i64, "twentyone"), |v: i64| v * 2);
    assert_eq!(n.apply().await.unwrap(), 42);

    let failing: Node<i64> = fail("boom", GraphError::body_returned_null("boom"));
    let mapped = map("double_fail", failing, |v: i64| v * 2);
    assert!(mapped.apply().await.is_err());
}

#[tokio::test]
async fn predicate_tests_a_settled_value() {
    let _logger = env_logger::try_init();
    let even = predicate("isEven", value(4i64, "four"), |v: &i64| v % 2 == 0);
    assert!(even.apply().await.unwrap());
    let odd = predicate("isEven", value(3i64, "three"), |v: &i64| v % 2 == 0);
    assert!(!odd.apply().await.unwrap());
}

#[tokio::test]
async fn is_null_and_is_not_null_observe_absence() {
    let _logger = env_logger::try_init();
    let present: Node<Option<i64>> = value(Some(1), "present");
    assert!(!is_null("isNull", present.clone()).apply().await.unwrap());
    assert!(is_not_null("isNotNull", present).apply().await.unwrap());

    let absent: Node<Option<i64>> = no_value();
    assert!(is_null("isNull", absent.clone()).apply().await.unwrap());
    assert!(!is_not_null("isNotNull", absent).apply().await.unwrap());

    let failing: Node<Option<i64>> = fail("boom", GraphError::body_returned_null("boom"));
    assert!(is_null("isNull", failing).apply().await.unwrap());
}

#[tokio::test]
async fn flat_map_chains_into_another_node() {
    let _logger = env_logger::try_init();
    let n = flat_map("lookup", value(2i64, "two"), |v: i64| value(v * 10, "looked_up"));
    assert_eq!(n.apply().await.unwrap(), 20);
}

#[tokio::test]
async fn map2_joins_concurrently() {
    let _logger = env_logger::try_init();
    let n = map2("sum2", value(1i64, "a"), value(2i64, "b"), |a: i64, b: i64| a + b);
    assert_eq!(n.apply().await.unwrap(), 3);
}

#[tokio::test]
async fn collect_gathers_all_values_in_order() {
    let _logger = env_logger::try_init();
    let nodes = vec![value(1i64, "a"), value(2i64, "b"), value(3i64, "c")];
    let n = collect("all", nodes);
    assert_eq!(n.apply().await.unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn collect_propagates_a_failure() {
    let _logger = env_logger::try_init();
    let nodes = vec![value(1i64, "a"), fail("bad", GraphError::body_returned_null("bad")), value(3i64, "c")];
    let n = collect("all", nodes);
    assert!(n.apply().await.is_err());
}

#[tokio::test]
async fn split_and_collect_maps_each_element() {
    let _logger = env_logger::try_init();
    let source = value(vec![1i64, 2, 3], "nums");
    let n = split_and_collect("doubled", source, |v: i64| value(v * 2, "doubled_item"));
    assert_eq!(n.apply().await.unwrap(), vec![2, 4, 6]);
}

#[tokio::test]
async fn wait_on_runs_prerequisites_before_source_in_order() {
    let _logger = env_logger::try_init();
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let marker = |label: &'static str, log: Arc<Mutex<Vec<&'static str>>>| {
        value_from_supplier(label, move || {
            log.lock().push(label);
        })
    };
    let first = marker("first", log.clone());
    let second = marker("second", log.clone());
    let source = {
        let log = log.clone();
        value_from_supplier("source", move || {
            log.lock().push("source");
            99i64
        })
    };
    let n = wait_on("sequenced", vec![wait_for(first), wait_for(second)], source);
    assert_eq!(n.apply().await.unwrap(), 99);
    assert_eq!(*log.lock(), vec!["first", "second", "source"]);
}

#[tokio::test]
async fn wait_on_does_not_propagate_a_failing_prerequisite() {
    let _logger = env_logger::try_init();
    let failing: Node<i64> = fail("prereq", GraphError::body_returned_null("prereq"));
    let source = value(5i64, "source");
    let n = wait_on("waited", vec![wait_for(failing)], source);
    assert_eq!(n.apply().await.unwrap(), 5);
}

#[tokio::test]
async fn and_lazy_short_circuits_on_first_false() {
    let _logger = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let a = value(false, "a");
    let b = {
        let calls = calls.clone();
        value_from_supplier("b", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        })
    };
    let n = and_lazy("a_and_b", vec![a, b]);
    assert!(!n.apply().await.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn and_eager_evaluates_every_operand() {
    let _logger = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let a = value(false, "a");
    let b = {
        let calls = calls.clone();
        value_from_supplier("b", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        })
    };
    let n = and_eager("a_and_b", vec![a, b]);
    assert!(!n.apply().await.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn or_lazy_short_circuits_on_first_true() {
    let _logger = env_logger::try_init();
    let calls = Arc::new(AtomicUsize::new(0));
    let a = value(true, "a");
    let b = {
        let calls = calls.clone();
        value_from_supplier("b", move || {
            calls.fetch_add(1, Ordering::SeqCst);
            false
        })
    };
    let n = or_lazy("a_or_b", vec![a, b]);
    assert!(n.apply().await.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn or_eager_succeeds_even_if_another_operand_fails() {
    let _logger = env_logger::try_init();
    let a = value(true, "a");
    let b: Node<bool> = fail("b_fails", GraphError::body_returned_null("b"));
    let n = or_eager("a_or_b", vec![a, b]);
    assert!(n.apply().await.unwrap());
}

#[tokio::test]
async fn and_eager_reports_an_earlier_false_over_a_later_failure() {
    let _logger = env_logger::try_init();
    let a = value(false, "a");
    let b: Node<bool> = fail("b_fails", GraphError::body_returned_null("b"));
    let n = and_eager("a_and_b", vec![a, b]);
    assert!(!n.apply().await.unwrap());
}

#[tokio::test]
async fn or_eager_reports_an_earlier_failure_over_a_later_true() {
    let _logger = env_logger::try_init();
    let a: Node<bool> = fail("a_fails", GraphError::body_returned_null("a"));
    let b = value(true, "b");
    let n = or_eager("a_or_b", vec![a, b]);
    assert!(n.apply().await.is_err());
}

#[tokio::test]
async fn not_negates() {
    let _logger = env_logger::try_init();
    let n = not("flip", literal_true());
    assert!(!n.apply().await.unwrap());
}

#[tokio::test]
async fn equals_compares_settled_values() {
    let _logger = env_logger::try_init();
    let same = equals("same", value(5i64, "a"), value(5i64, "b"));
    assert!(same.apply().await.unwrap());
    let diff = equals("diff", value(5i64, "a"), value(6i64, "b"));
    assert!(!diff.apply().await.unwrap());
}

#[tokio::test]
async fn if_then_else_runs_exactly_one_branch() {
    let _logger = env_logger::try_init();
    let true_calls = Arc::new(AtomicUsize::new(0));
    let false_calls = Arc::new(AtomicUsize::new(0));
    let if_true = {
        let c = true_calls.clone();
        value_from_supplier("if_true", move || {
            c.fetch_add(1, Ordering::SeqCst);
            1i64
        })
    };
    let if_false = {
        let c = false_calls.clone();
        value_from_supplier("if_false", move || {
            c.fetch_add(1, Ordering::SeqCst);
            2i64
        })
    };
    let n = if_then_else("choice", literal_true(), if_true, if_false);
    assert_eq!(n.apply().await.unwrap(), 1);
    assert_eq!(true_calls.load(Ordering::SeqCst), 1);
    assert_eq!(false_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn if_then_settles_none_when_condition_is_false() {
    let _logger = env_logger::try_init();
    let n = if_then("maybe", literal_false(), value(1i64, "one"));
    assert_eq!(n.apply().await.unwrap(), None);
}

#[tokio::test]
async fn when_and_unless_are_complementary() {
    let _logger = env_logger::try_init();
    let w = when("w", literal_true(), value(Some(1i64), "one"));
    assert_eq!(w.apply().await.unwrap(), Some(1));
    let u = unless("u", literal_true(), value(Some(1i64), "one"));
    assert_eq!(u.apply().await.unwrap(), None);
}

#[tokio::test]
async fn when_success_gates_on_a_nodes_presence_not_a_boolean() {
    let _logger = env_logger::try_init();
    let succeeding: Node<i64> = value(1, "ok");
    let gated = when_success("gated", succeeding, value(Some(9i64), "nine"));
    assert_eq!(gated.apply().await.unwrap(), Some(9));

    let failing: Node<i64> = fail("boom", GraphError::body_returned_null("boom"));
    let gated_off = when_success("gated", failing, value(Some(9i64), "nine"));
    assert_eq!(gated_off.apply().await.unwrap(), None);
}

#[tokio::test]
async fn or_else_falls_back_on_absence() {
    let _logger = env_logger::try_init();
    let primary: Node<Option<i64>> = no_value();
    let fallback = value(7i64, "fallback");
    let n = or_else("with_fallback", primary, fallback);
    assert_eq!(n.apply().await.unwrap(), 7);
}

#[tokio::test]
async fn if_success_then_else_branches_on_predicate_outcome() {
    let _logger = env_logger::try_init();
    let predicate_ok: Node<i64> = value(1, "ok");
    let n = if_success_then_else("branch", predicate_ok, value(1i64, "success"), value(0i64, "failure"));
    assert_eq!(n.apply().await.unwrap(), 1);

    let predicate_failing: Node<i64> = fail("boom", GraphError::body_returned_null("boom"));
    let n2 = if_success_then_else("branch2", predicate_failing, value(1i64, "success"), value(0i64, "failure"));
    assert_eq!(n2.apply().await.unwrap(), 0);
}

#[tokio::test]
async fn if_then_else_eager_runs_both_branches() {
    let _logger = env_logger::try_init();
    let true_calls = Arc::new(AtomicUsize::new(0));
    let false_calls = Arc::new(AtomicUsize::new(0));
    let if_true = {
        let c = true_calls.clone();
        value_from_supplier("if_true", move || {
            c.fetch_add(1, Ordering::SeqCst);
            1i64
        })
    };
    let if_false = {
        let c = false_calls.clone();
        value_from_supplier("if_false", move || {
            c.fetch_add(1, Ordering::SeqCst);
            2i64
        })
    };
    let n = if_then_else_eager("choice", literal_true(), if_true, if_false);
    assert_eq!(n.apply().await.unwrap(), 1);
    assert_eq!(true_calls.load(Ordering::SeqCst), 1);
    assert_eq!(false_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn subgraph_requires_at_least_one_exposed_node() {
    let _logger = env_logger::try_init();
    let subgraph = Subgraph::new("pipeline");
    match subgraph.mark_exposed() {
        Err(GraphError::Build(BuildError::ExposedSubgraphEmpty { .. })) => {}
        other => panic!("expected ExposedSubgraphEmpty, got {other:?}"),
    }
}

#[tokio::test]
async fn subgraph_stamps_exposed_nodes_with_its_name() {
    let _logger = env_logger::try_init();
    let mut subgraph = Subgraph::new("pipeline");
    let handle = ExposedBy::default();
    subgraph.expose(handle.clone());
    subgraph.mark_exposed().unwrap();
    assert_eq!(handle.get(), Some("pipeline".to_string()));
}

#[tokio::test]
async fn sinks_fire_after_successful_settlement() {
    let _logger = env_logger::try_init();
    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let sink = {
        let tx = tx.clone();
        value_from_supplier("sink", move || {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(());
            }
            0i32
        })
    };
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", value(3i64, "c"))
        .unwrap()
        .with_sink(sink)
        .build()
        .unwrap();
    assert_eq!(node.apply().await.unwrap(), 6);
    rx.await.expect("sink should have fired");
}

#[tokio::test]
async fn sinks_fire_after_failed_settlement_too() {
    let _logger = env_logger::try_init();
    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let sink = {
        let tx = tx.clone();
        value_from_supplier("sink", move || {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(());
            }
            0i32
        })
    };
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", fail("c", GraphError::body_returned_null("c")))
        .unwrap()
        .with_sink(sink)
        .build()
        .unwrap();
    assert!(node.apply().await.is_err());
    rx.await.expect("sink should have fired even though the node failed");
}

#[derive(Default)]
struct RecordingDebugSink {
    applies: Mutex<Vec<String>>,
    settles: Mutex<Vec<(String, bool)>>,
}

impl DebugSink for RecordingDebugSink {
    fn on_apply(&self, node: &str) {
        self.applies.lock().push(node.to_string());
    }

    fn on_settle(&self, node: &str, succeeded: bool) {
        self.settles.lock().push((node.to_string(), succeeded));
    }
}

#[tokio::test]
async fn debug_sink_observes_apply_and_settle_exactly_once() {
    let _logger = env_logger::try_init();
    let sink = Arc::new(RecordingDebugSink::default());
    let node = Builder::new(Sum)
        .depends_on("a", value(1i64, "a"))
        .unwrap()
        .depends_on("b", value(2i64, "b"))
        .unwrap()
        .depends_on("c", value(3i64, "c"))
        .unwrap()
        .with_debug_sink(sink.clone())
        .with_key("sum")
        .build()
        .unwrap();

    // Race several concurrent callers; the debug sink should still observe exactly one
    // apply/settle pair, matching the at-most-once body execution guarantee.
    let (a, b, c) = tokio::join!(node.apply(), node.apply(), node.apply());
    assert_eq!(a.unwrap(), 6);
    assert_eq!(b.unwrap(), 6);
    assert_eq!(c.unwrap(), 6);

    assert_eq!(*sink.applies.lock(), vec!["sum".to_string()]);
    assert_eq!(*sink.settles.lock(), vec![("sum".to_string(), true)]);
}

#[tokio::test]
async fn body_runs_at_most_once_under_randomized_concurrent_callers() {
    use rand::Rng;

    let _logger = env_logger::try_init();
    let counter = Arc::new(AtomicUsize::new(0));
    let node = {
        let counter = counter.clone();
        value_from_supplier("jittered", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            99i64
        })
    };

    let mut handles = Vec::new();
    for _ in 0..16 {
        let node = node.clone();
        let jitter_ms = rand::rng().random_range(0..5);
        handles.push(tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(jitter_ms)).await;
            node.apply().await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 99);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
