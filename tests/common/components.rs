use async_trait::async_trait;

use coreflow::attributes::AttrValue;
use coreflow::components::{Batch, Component, ComponentError, Ports, SlotId, WorkItem};
use coreflow::samples::VirtualCore;

/// Forwards its batch unchanged on the default port.
#[derive(Default)]
pub struct NoopComponent {
    ports: Ports,
}

#[async_trait]
impl Component for NoopComponent {
    fn connect(&mut self, target: SlotId, port: &str) {
        self.ports.connect(port, target);
    }

    async fn process(
        &mut self,
        _view: &mut VirtualCore<'_>,
        batch: &Batch,
    ) -> Result<Vec<WorkItem>, ComponentError> {
        Ok(self.ports.forward(batch.clone()))
    }
}

/// Appends its label to every record's `trail` attribute, then forwards.
/// Lets tests observe which instances ran, and in what order.
pub struct TrailComponent {
    label: String,
    ports: Ports,
}

impl TrailComponent {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ports: Ports::default(),
        }
    }
}

#[async_trait]
impl Component for TrailComponent {
    fn connect(&mut self, target: SlotId, port: &str) {
        self.ports.connect(port, target);
    }

    async fn process(
        &mut self,
        view: &mut VirtualCore<'_>,
        batch: &Batch,
    ) -> Result<Vec<WorkItem>, ComponentError> {
        for depth in batch.iter() {
            if let Some(mut sample) = view.sample(depth) {
                let trail = match sample.get("trail") {
                    Some(AttrValue::String(prior)) => format!("{prior}>{}", self.label),
                    _ => self.label.clone(),
                };
                sample.set("trail", AttrValue::String(trail));
            }
        }
        Ok(self.ports.forward(batch.clone()))
    }
}

/// Splits the batch into even and odd integral depths and fans both halves
/// out on the default port.
#[derive(Default)]
pub struct SplitEvenOdd {
    ports: Ports,
}

#[async_trait]
impl Component for SplitEvenOdd {
    fn connect(&mut self, target: SlotId, port: &str) {
        self.ports.connect(port, target);
    }

    async fn process(
        &mut self,
        _view: &mut VirtualCore<'_>,
        batch: &Batch,
    ) -> Result<Vec<WorkItem>, ComponentError> {
        let (even, odd) = batch.partition(|d| (d.value() as i64) % 2 == 0);
        let mut items = Vec::new();
        items.extend(self.ports.route("output", even));
        items.extend(self.ports.route("output", odd));
        Ok(items)
    }
}

/// Stamps `age` (durable) and `scratch` (transient) on every record.
#[derive(Default)]
pub struct MarkAges {
    ports: Ports,
}

#[async_trait]
impl Component for MarkAges {
    fn connect(&mut self, target: SlotId, port: &str) {
        self.ports.connect(port, target);
    }

    async fn process(
        &mut self,
        view: &mut VirtualCore<'_>,
        batch: &Batch,
    ) -> Result<Vec<WorkItem>, ComponentError> {
        for depth in batch.iter() {
            if let Some(mut sample) = view.sample(depth) {
                sample.set("age", AttrValue::Float(depth.value() * 10.0));
                sample.set("scratch", AttrValue::Float(depth.value()));
            }
        }
        Ok(self.ports.forward(batch.clone()))
    }
}

/// Fails every invocation without touching any record.
#[derive(Default)]
pub struct FailingComponent {
    ports: Ports,
}

#[async_trait]
impl Component for FailingComponent {
    fn connect(&mut self, target: SlotId, port: &str) {
        self.ports.connect(port, target);
    }

    async fn process(
        &mut self,
        _view: &mut VirtualCore<'_>,
        _batch: &Batch,
    ) -> Result<Vec<WorkItem>, ComponentError> {
        Err(ComponentError::Failed("intentional test failure".to_owned()))
    }
}

/// Re-targets itself until it has run `limit` times, recording the count,
/// then forwards. Exercises re-enqueueing of a previously processed pair.
pub struct ReemitComponent {
    id: SlotId,
    limit: i64,
    count: i64,
    ports: Ports,
}

impl ReemitComponent {
    pub fn new(id: impl Into<SlotId>, limit: i64) -> Self {
        Self {
            id: id.into(),
            limit,
            count: 0,
            ports: Ports::default(),
        }
    }
}

#[async_trait]
impl Component for ReemitComponent {
    fn connect(&mut self, target: SlotId, port: &str) {
        self.ports.connect(port, target);
    }

    async fn process(
        &mut self,
        view: &mut VirtualCore<'_>,
        batch: &Batch,
    ) -> Result<Vec<WorkItem>, ComponentError> {
        self.count += 1;
        for depth in batch.iter() {
            if let Some(mut sample) = view.sample(depth) {
                sample.set("iterations", AttrValue::Integer(self.count));
            }
        }
        if self.count < self.limit {
            Ok(vec![WorkItem::single(self.id.clone(), batch.clone())])
        } else {
            Ok(self.ports.forward(batch.clone()))
        }
    }
}
