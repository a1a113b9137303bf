//! User-facing notifications.
//!
//! Every operation reports its outcome to the user through a `Notifier`.
//! Notices travel over an unbounded channel so that background tasks can
//! raise them while the front-end drains the receiver once per frame.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

/// Severity of a notice, used by front-ends for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Sending half of the notice channel. Clone is cheap.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
}

/// Create a connected notifier and receiver pair.
pub fn channel() -> (Notifier, NoticeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, rx)
}

/// Take every notice currently queued, oldest first.
pub fn drain(rx: &mut NoticeReceiver) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

impl Notifier {
    pub fn info(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Info, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Error, message.into());
    }

    fn send(&self, level: NoticeLevel, message: String) {
        let notice = Notice {
            level,
            message,
            raised_at: Utc::now(),
        };
        if self.tx.send(notice).is_err() {
            debug!("Notice dropped - receiver closed");
        }
    }
}
