//! The propagation scheduler.
//!
//! Drives a [`BoundNetwork`] against a per-run record view to a fixed
//! point. The algorithm is a FIFO work queue seeded with the network's
//! first component and every record:
//!
//! 1. Pop an item, invoke each of its components with the item's batch.
//! 2. Enqueue every returned work item whose component list and batch are
//!    both non-empty, unless a structurally equal item is already sitting
//!    in the queue.
//! 3. Repeat until the queue is empty.
//!
//! Termination relies on components eventually ceasing to produce new
//! distinct work items; the engine neither bounds iteration nor detects
//! cycles — that is the component graph's obligation. Deduplication is by
//! *queue membership*, tracked with a canonical-key set kept in lockstep
//! with the deque: an item that was processed and has left the queue may
//! legitimately be enqueued again, which is what lets convergence loops
//! re-run a pair over evolving record state.
//!
//! Cancellation is cooperative: the caller's probe is polled once per loop
//! iteration, before the next dequeue. An in-flight component invocation
//! always runs to completion; already-applied record mutations are left
//! as-is (no rollback).
//!
//! On normal completion every attribute the registry does not mark as
//! output is purged from every record's run layer.

use std::collections::VecDeque;

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::instrument;

use crate::attributes::AttributeRegistry;
use crate::components::{ComponentError, WorkItem};
use crate::samples::VirtualCore;
use crate::workflows::BoundNetwork;

/// How the run ended. Cancellation is a first-class outcome, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The queue drained; transient attributes have been purged.
    Completed,
    /// The cancellation probe fired; record state is whatever the already
    /// finished invocations left behind.
    Cancelled,
}

impl RunStatus {
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// What to do when a component invocation fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the run and surface the failure.
    #[default]
    Abort,
    /// Log the failure and continue with no work items from that
    /// invocation.
    SkipAndLog,
}

#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    #[error("component {component:?} failed during propagation")]
    #[diagnostic(code(coreflow::scheduler::component))]
    Component {
        component: String,
        #[source]
        source: ComponentError,
    },

    /// A work item routed to an instance the network does not hold.
    #[error("work item names unknown component {component:?}")]
    #[diagnostic(
        code(coreflow::scheduler::unknown_component),
        help("components must route work items to instances created at bind time")
    )]
    UnknownComponent { component: String },
}

/// Walks record batches through a bound component network to completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropagationScheduler {
    failure_policy: FailurePolicy,
}

impl PropagationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Drive the network over every record in the view.
    ///
    /// Returns [`RunStatus::Completed`] once the queue drains (after the
    /// end-of-run purge of transient attributes), or
    /// [`RunStatus::Cancelled`] as soon as the probe fires between work
    /// items. Component failures follow the configured [`FailurePolicy`].
    #[instrument(skip_all, fields(plan = view.plan(), first = network.first()))]
    pub async fn run(
        &self,
        network: &mut BoundNetwork,
        view: &mut VirtualCore<'_>,
        registry: &AttributeRegistry,
        is_cancelled: impl Fn() -> bool,
    ) -> Result<RunStatus, SchedulerError> {
        let seed = WorkItem::single(network.first().to_owned(), view.depths().into_iter().collect());
        let mut queue: VecDeque<WorkItem> = VecDeque::new();
        let mut pending: FxHashSet<WorkItem> = FxHashSet::default();
        pending.insert(seed.clone());
        queue.push_back(seed);

        loop {
            if is_cancelled() {
                tracing::info!("cancellation requested; stopping propagation");
                return Ok(RunStatus::Cancelled);
            }
            let Some(item) = queue.pop_front() else {
                break;
            };
            pending.remove(&item);

            for id in &item.components {
                let component = network.component_mut(id).ok_or_else(|| {
                    SchedulerError::UnknownComponent {
                        component: id.clone(),
                    }
                })?;
                tracing::debug!(component = %id, records = item.batch.len(), "invoking");
                let produced = match component.process(view, &item.batch).await {
                    Ok(items) => items,
                    Err(source) => match self.failure_policy {
                        FailurePolicy::Abort => {
                            return Err(SchedulerError::Component {
                                component: id.clone(),
                                source,
                            });
                        }
                        FailurePolicy::SkipAndLog => {
                            tracing::warn!(
                                component = %id,
                                error = %source,
                                "component failed; discarding its work items"
                            );
                            Vec::new()
                        }
                    },
                };
                for next in produced {
                    if next.components.is_empty() || next.batch.is_empty() {
                        continue;
                    }
                    if pending.insert(next.clone()) {
                        queue.push_back(next);
                    }
                }
            }
            // let concurrent tasks (the cancellation source among them)
            // make progress between work items
            tokio::task::yield_now().await;
        }

        for mut sample in view.iter_mut() {
            sample.purge_intermediates(registry);
        }
        tracing::debug!("propagation complete; transient attributes purged");
        Ok(RunStatus::Completed)
    }
}
