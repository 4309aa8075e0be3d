use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::order::OrderDraft;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeKind {
    /// Confirmation of a submitted draft.
    OrderSnapshot { draft: OrderDraft },
    Warning { message: String },
    Info { message: String },
    Disconnected,
}

/// Non-blocking message raised by a view-model for the UI to show.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            kind,
            raised_at: Utc::now(),
        }
    }

    pub fn order_snapshot(draft: OrderDraft) -> Self {
        Self::new(NoticeKind::OrderSnapshot { draft })
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning {
            message: message.into(),
        })
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info {
            message: message.into(),
        })
    }

    pub fn disconnected() -> Self {
        Self::new(NoticeKind::Disconnected)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.kind, NoticeKind::Warning { .. } | NoticeKind::Disconnected)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NoticeKind::OrderSnapshot { draft } => write!(f, "Order Submitted: {}", draft),
            NoticeKind::Warning { message } => write!(f, "{}", message),
            NoticeKind::Info { message } => write!(f, "{}", message),
            NoticeKind::Disconnected => write!(f, "Disconnected from order server"),
        }
    }
}

/// Notices waiting to be shown, oldest first.
#[derive(Debug, Default, Clone)]
pub struct NoticeQueue {
    pending: Vec<Notice>,
}

impl NoticeQueue {
    pub fn push(&mut self, notice: Notice) {
        self.pending.push(notice);
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }
}
