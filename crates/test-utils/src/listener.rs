use std::sync::{Arc, Mutex};

use foreman::manager::{ErrorInfo, Manager, ManagerListener, Status};

/// What a [`RecordingListener`] saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerEvent {
    /// Manager id, completed count and status at the time of the callback.
    Complete {
        manager: String,
        num_complete: usize,
        status: Status,
    },
    Progress(String),
    /// Failed worker id and error message.
    Error { worker: Option<String>, message: String },
}

/// Listener that records every callback into a shared log.
///
/// Clone it before handing it to the manager; the clone kept by the test
/// sees the same events.
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<ListenerEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn completions(&self) -> usize {
        self.count(|e| matches!(e, ListenerEvent::Complete { .. }))
    }

    pub fn progress_ids(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ListenerEvent::Progress(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> usize {
        self.count(|e| matches!(e, ListenerEvent::Error { .. }))
    }

    fn count(&self, pred: impl Fn(&ListenerEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: ListenerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ManagerListener for RecordingListener {
    fn on_complete(&mut self, manager: &Manager) {
        self.push(ListenerEvent::Complete {
            manager: manager.id().to_string(),
            num_complete: manager.status_info().num_complete,
            status: manager.status(),
        });
    }

    fn on_progress(&mut self, worker_id: &str) {
        self.push(ListenerEvent::Progress(worker_id.to_string()));
    }

    fn on_error(&mut self, error: &ErrorInfo) {
        self.push(ListenerEvent::Error {
            worker: error.worker_id().map(str::to_string),
            message: error.message.clone(),
        });
    }
}
