use crate::{HandleKind, PipelineStage};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub sequence_no: u64,
    pub kind: PipelineEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineEventKind {
    StageEntered {
        stage: PipelineStage,
    },
    HandleReleased {
        handle: HandleKind,
    },
    Completed {
        state_count: usize,
        diagnostics_count: usize,
    },
    Failed {
        stage: PipelineStage,
        error_kind: String,
        reason: String,
    },
}

pub trait PipelineEventObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

impl<F> PipelineEventObserver for F
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn on_event(&self, event: &PipelineEvent) {
        self(event);
    }
}

pub type SharedPipelineEventObserver = Arc<dyn PipelineEventObserver>;
pub type PipelineEventSender = mpsc::UnboundedSender<PipelineEvent>;
pub type PipelineEventReceiver = mpsc::UnboundedReceiver<PipelineEvent>;

/// Fan-out for pipeline events. Clones share one sequence counter.
#[derive(Clone, Default)]
pub struct PipelineEventSink {
    observer: Option<SharedPipelineEventObserver>,
    sender: Option<PipelineEventSender>,
    sequence: Arc<AtomicU64>,
}

impl PipelineEventSink {
    pub fn with_observer(observer: SharedPipelineEventObserver) -> Self {
        Self {
            observer: Some(observer),
            ..Self::default()
        }
    }

    pub fn with_sender(sender: PipelineEventSender) -> Self {
        Self {
            sender: Some(sender),
            ..Self::default()
        }
    }

    pub fn observer(mut self, observer: SharedPipelineEventObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn sender(mut self, sender: PipelineEventSender) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.observer.is_some() || self.sender.is_some()
    }

    pub fn emit(&self, kind: PipelineEventKind) {
        if !self.is_enabled() {
            return;
        }
        let event = PipelineEvent {
            sequence_no: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            kind,
        };
        if let Some(observer) = self.observer.as_ref() {
            observer.on_event(&event);
        }
        if let Some(sender) = self.sender.as_ref() {
            let _ = sender.send(event);
        }
    }
}

pub fn pipeline_event_channel() -> (PipelineEventSender, PipelineEventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn pipeline_event_sink_observer_and_sender_expected_both_receive_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let observer_seen = Arc::clone(&seen);
        let observer: SharedPipelineEventObserver = Arc::new(move |event: &PipelineEvent| {
            observer_seen
                .lock()
                .expect("observer mutex should lock")
                .push(event.sequence_no);
        });
        let (tx, mut rx) = pipeline_event_channel();
        let sink = PipelineEventSink::with_observer(observer).sender(tx);
        sink.emit(PipelineEventKind::StageEntered {
            stage: PipelineStage::BuildingEnfa,
        });
        sink.emit(PipelineEventKind::HandleReleased {
            handle: HandleKind::Enfa,
        });

        let streamed = rx.try_recv().expect("channel should receive first event");
        assert_eq!(streamed.sequence_no, 1);
        assert_eq!(
            seen.lock().expect("observer mutex should lock").as_slice(),
            &[1, 2]
        );
    }

    #[test]
    fn pipeline_event_serialized_expected_tagged_snake_case() {
        let event = PipelineEvent {
            sequence_no: 3,
            kind: PipelineEventKind::StageEntered {
                stage: PipelineStage::ConvertingToNfa,
            },
        };
        let value = serde_json::to_value(&event).expect("event should serialize");
        assert_eq!(value["kind"]["kind"], "stage_entered");
        assert_eq!(value["kind"]["stage"], "converting_to_nfa");
    }
}
