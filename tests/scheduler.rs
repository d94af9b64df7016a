mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::*;
use coreflow::attributes::{AttrType, AttrValue};
use coreflow::components::ComponentRegistry;
use coreflow::plans::ComputationPlan;
use coreflow::reference::ReferenceStore;
use coreflow::scheduler::{FailurePolicy, PropagationScheduler, RunStatus, SchedulerError};
use coreflow::workflows::{ConfigurationError, RunBinder, WorkflowGraph};

#[tokio::test]
async fn split_workflow_marks_every_record_and_purges_scratch() {
    // A splits even/odd depths into two branches both targeting B; B marks
    // a durable age and a transient scratch value on each record.
    let mut components = ComponentRegistry::new();
    components.register("A", SplitEvenOdd::default);
    components.register("B", MarkAges::default);
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("split");
    graph.connect("A", "B");

    let attributes = registry_with(&[
        ("age", AttrType::Float, true),
        ("scratch", AttrType::Float, false),
    ]);
    let plan = ComputationPlan::new("run");
    let mut core = core_with_depths("c", &[10.0, 20.0, 30.0]);

    let mut network = binder.instantiate(&graph, &plan).await.unwrap();
    let mut view = core.new_computation("run").unwrap();
    let status = PropagationScheduler::new()
        .run(&mut network, &mut view, &attributes, || false)
        .await
        .unwrap();
    assert_eq!(status, RunStatus::Completed);

    for (depth, sample) in core.iter() {
        let layer = sample.layer("run").unwrap();
        assert_eq!(
            layer.get("age"),
            Some(&AttrValue::Float(depth.value() * 10.0)),
            "every record gets an age"
        );
        assert!(
            !layer.contains_key("scratch"),
            "transients are purged at end of run"
        );
    }
}

#[tokio::test]
async fn purge_is_idempotent() {
    let mut components = ComponentRegistry::new();
    components.register("B", MarkAges::default);
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.add_slot("B");

    let attributes = registry_with(&[
        ("age", AttrType::Float, true),
        ("scratch", AttrType::Float, false),
    ]);
    let plan = ComputationPlan::new("run");
    let mut core = core_with_depths("c", &[10.0, 20.0]);

    let mut network = binder.instantiate(&graph, &plan).await.unwrap();
    {
        let mut view = core.new_computation("run").unwrap();
        PropagationScheduler::new()
            .run(&mut network, &mut view, &attributes, || false)
            .await
            .unwrap();
    }
    let after_first: Vec<usize> = core
        .iter()
        .map(|(_, s)| s.layer("run").map(|l| l.len()).unwrap_or(0))
        .collect();

    // running the purge again removes nothing further
    let mut view = core.view("run").unwrap();
    for mut sample in view.iter_mut() {
        sample.purge_intermediates(&attributes);
    }
    let after_second: Vec<usize> = core
        .iter()
        .map(|(_, s)| s.layer("run").map(|l| l.len()).unwrap_or(0))
        .collect();
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn cancelled_before_first_dequeue_leaves_records_untouched() {
    coreflow::telemetry::init();
    let mut components = ComponentRegistry::new();
    components.register("B", MarkAges::default);
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.add_slot("B");

    let attributes = registry_with(&[("age", AttrType::Float, true)]);
    let plan = ComputationPlan::new("run");
    let mut core = core_with_depths("c", &[10.0, 20.0]);

    let mut network = binder.instantiate(&graph, &plan).await.unwrap();
    let mut view = core.new_computation("run").unwrap();
    let status = PropagationScheduler::new()
        .run(&mut network, &mut view, &attributes, || true)
        .await
        .unwrap();
    assert_eq!(status, RunStatus::Cancelled);
    drop(view);

    for (_, sample) in core.iter() {
        assert!(
            sample
                .layer("run")
                .map(|l| l.is_empty())
                .unwrap_or(true),
            "no derived value may appear on a cancelled-before-start run"
        );
    }
}

#[tokio::test]
async fn cancellation_fires_between_work_items() {
    // The probe flips after the first invocation; the second never starts.
    let mut components = ComponentRegistry::new();
    components.register("A", MarkAges::default);
    components.register("B", MarkAges::default);
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.connect("A", "B");

    let attributes = registry_with(&[("age", AttrType::Float, true)]);
    let plan = ComputationPlan::new("run");
    let mut core = core_with_depths("c", &[10.0]);

    let cancelled = Arc::new(AtomicBool::new(false));
    let probe = {
        let cancelled = cancelled.clone();
        move || {
            // report the previous state, then trip
            cancelled.swap(true, Ordering::SeqCst)
        }
    };

    let mut network = binder.instantiate(&graph, &plan).await.unwrap();
    let mut view = core.new_computation("run").unwrap();
    let status = PropagationScheduler::new()
        .run(&mut network, &mut view, &attributes, probe)
        .await
        .unwrap();
    assert_eq!(status, RunStatus::Cancelled);
    drop(view);

    // A ran (mutations kept, no rollback), B never did, nothing was purged
    let sample = core.iter().next().map(|(_, s)| s).unwrap();
    let layer = sample.layer("run").unwrap();
    assert_eq!(layer.get("age"), Some(&AttrValue::Float(100.0)));
    assert!(layer.contains_key("scratch"));
}

#[tokio::test]
async fn missing_required_parameter_aborts_before_processing() {
    let mut components = ComponentRegistry::new();
    components.register_with_params("B", &["curve"], MarkAges::default);
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.add_slot("B");

    let plan = ComputationPlan::new("run");
    assert!(matches!(
        binder.instantiate(&graph, &plan).await,
        Err(ConfigurationError::MissingParameter { .. })
    ));
}

#[tokio::test]
async fn unknown_component_type_aborts_binding() {
    let components = ComponentRegistry::new();
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.add_slot("phantom");

    let plan = ComputationPlan::new("run");
    assert!(matches!(
        binder.instantiate(&graph, &plan).await,
        Err(ConfigurationError::UnknownComponent { .. })
    ));
}

#[tokio::test]
async fn reemitted_pairs_run_again_once_off_the_queue() {
    // Queue-membership dedup, not visited-forever: the same (component,
    // batch) pair must be allowed to run once per emission.
    let mut components = ComponentRegistry::new();
    components.register("loop", || ReemitComponent::new("loop", 3));
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.add_slot("loop");

    let attributes = registry_with(&[("iterations", AttrType::Integer, true)]);
    let plan = ComputationPlan::new("run");
    let mut core = core_with_depths("c", &[1.0]);

    let mut network = binder.instantiate(&graph, &plan).await.unwrap();
    let mut view = core.new_computation("run").unwrap();
    let status = PropagationScheduler::new()
        .run(&mut network, &mut view, &attributes, || false)
        .await
        .unwrap();
    assert_eq!(status, RunStatus::Completed);
    drop(view);

    let sample = core.iter().next().map(|(_, s)| s).unwrap();
    assert_eq!(
        sample.layer("run").and_then(|l| l.get("iterations")),
        Some(&AttrValue::Integer(3))
    );
}

#[tokio::test]
async fn component_failure_aborts_by_default() {
    let mut components = ComponentRegistry::new();
    components.register("bad", FailingComponent::default);
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.add_slot("bad");

    let attributes = registry_with(&[]);
    let plan = ComputationPlan::new("run");
    let mut core = core_with_depths("c", &[1.0]);

    let mut network = binder.instantiate(&graph, &plan).await.unwrap();
    let mut view = core.new_computation("run").unwrap();
    let err = PropagationScheduler::new()
        .run(&mut network, &mut view, &attributes, || false)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Component { .. }));
}

#[tokio::test]
async fn skip_and_log_policy_continues_past_failures() {
    // The failing branch is dropped; the rest of the network still runs.
    let mut components = ComponentRegistry::new();
    components.register("A", SplitEvenOdd::default);
    components.register("bad", FailingComponent::default);
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.connect("A", "bad");

    let attributes = registry_with(&[]);
    let plan = ComputationPlan::new("run");
    let mut core = core_with_depths("c", &[10.0, 15.0]);

    let mut network = binder.instantiate(&graph, &plan).await.unwrap();
    let mut view = core.new_computation("run").unwrap();
    let status = PropagationScheduler::new()
        .with_failure_policy(FailurePolicy::SkipAndLog)
        .run(&mut network, &mut view, &attributes, || false)
        .await
        .unwrap();
    assert_eq!(status, RunStatus::Completed);
}

#[tokio::test]
async fn empty_work_items_are_never_enqueued() {
    // A core with only odd depths: the even branch is an empty batch and
    // must be dropped rather than queued.
    let mut components = ComponentRegistry::new();
    components.register("A", SplitEvenOdd::default);
    components.register("B", MarkAges::default);
    let selectors = no_selectors();
    let reference = ReferenceStore::default();
    let binder = RunBinder::new(&components, &selectors, &reference);

    let mut graph = WorkflowGraph::new("w");
    graph.connect("A", "B");

    let attributes = registry_with(&[("age", AttrType::Float, true)]);
    let plan = ComputationPlan::new("run");
    let mut core = core_with_depths("c", &[11.0, 13.0]);

    let mut network = binder.instantiate(&graph, &plan).await.unwrap();
    let mut view = core.new_computation("run").unwrap();
    let status = PropagationScheduler::new()
        .run(&mut network, &mut view, &attributes, || false)
        .await
        .unwrap();
    assert_eq!(status, RunStatus::Completed);
    drop(view);

    for (depth, sample) in core.iter() {
        assert_eq!(
            sample.layer("run").and_then(|l| l.get("age")),
            Some(&AttrValue::Float(depth.value() * 10.0))
        );
    }
}
