use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

/// Outcome banner of the latest operation on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl InteractionStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// Page-local holder of the current `InteractionStatus`, shared by every
/// operation on the page. Each `set` supersedes the previous status.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    tx: Arc<watch::Sender<Option<InteractionStatus>>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<InteractionStatus> {
        self.tx.borrow().clone()
    }

    pub fn set(&self, status: InteractionStatus) {
        self.tx.send_replace(Some(status));
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<InteractionStatus>> {
        self.tx.subscribe()
    }
}
