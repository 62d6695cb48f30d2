use super::stats::RunStats;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Events sent from a run to whoever renders it
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrganizerEvent {
    /// Overall progress, 0-100, never decreasing within a run
    Progress { percent: u8 },
    Status { message: String },
    SystemInfo { message: String },
    FileProcessed { file_name: String, category: String },
    SignalsDetected {
        file_name: String,
        category: String,
        signals: Vec<String>,
    },
    DocumentAnalyzed {
        file_name: String,
        category: String,
        summary: String,
        metadata: String,
    },
    Error { message: String },
    /// Terminal event, sent exactly once per run
    Finished { success: bool, stats: RunStats },
}

/// Sending half of the event channel. Sending never blocks and a dropped
/// receiver is ignored, so workers can always emit.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<UnboundedSender<OrganizerEvent>>,
}

impl EventSink {
    pub fn new(sender: UnboundedSender<OrganizerEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Sink that drops everything
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, event: OrganizerEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.emit(OrganizerEvent::Status {
            message: message.into(),
        });
    }

    pub fn progress(&self, percent: u8) {
        self.emit(OrganizerEvent::Progress { percent });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_after_receiver_dropped_is_ignored() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        drop(rx);
        sink.status("still fine");
    }

    #[test]
    fn test_events_arrive_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = EventSink::new(tx);
        sink.progress(10);
        sink.progress(20);

        assert!(matches!(rx.try_recv(), Ok(OrganizerEvent::Progress { percent: 10 })));
        assert!(matches!(rx.try_recv(), Ok(OrganizerEvent::Progress { percent: 20 })));
    }
}
