//! Notifier
//!
//! User-facing notices, e.g. "Failed to run: Dash". Rendering them on screen
//! is the host application's job.

use action_events::NetId;

/// Maximum notices retained by [`NoticeLog`].
pub const NOTICE_HISTORY: usize = 64;

/// A user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub agent: NetId,
    pub message: String,
}

/// Notice sink injected into the action core.
pub trait Notifier: Send + Sync {
    fn notify(&mut self, notice: Notice);

    /// Most recent notices, oldest first. Sinks that forward notices
    /// elsewhere may return nothing.
    fn recent(&self) -> &[Notice] {
        &[]
    }
}

/// Default [`Notifier`]: logs each notice and keeps a bounded history.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Vec<Notice>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, notice: Notice) {
        tracing::info!(agent = %notice.agent, "{}", notice.message);
        if self.notices.len() == NOTICE_HISTORY {
            self.notices.remove(0);
        }
        self.notices.push(notice);
    }

    fn recent(&self) -> &[Notice] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_history_bounded() {
        let mut log = NoticeLog::new();
        for i in 0..(NOTICE_HISTORY + 3) {
            log.notify(Notice {
                agent: NetId(1),
                message: format!("notice {}", i),
            });
        }
        assert_eq!(log.recent().len(), NOTICE_HISTORY);
        assert_eq!(log.recent()[0].message, "notice 3");
    }
}
