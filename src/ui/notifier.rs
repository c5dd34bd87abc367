// User-facing notices. Everything the user should see about the outcome of an
// action goes through a `Notifier`; diagnostic detail goes to `tracing`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Prints notices on stdout, one per line.
pub struct TerminalNotifier;

impl TerminalNotifier {
    fn format(notice: &Notice) -> String {
        let marker = match notice.level {
            NoticeLevel::Success => "[ok]",
            NoticeLevel::Error => "[!!]",
        };
        format!("{} {}", marker, notice.message)
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        println!("{}", Self::format(&notice));
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every notice so tests can assert on what the user was told.
    #[derive(Default)]
    pub struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        pub fn notices(&self) -> Vec<Notice> {
            self.notices.lock().unwrap().clone()
        }

        pub fn messages(&self) -> Vec<String> {
            self.notices().into_iter().map(|n| n.message).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_format_marks_the_level() {
        assert_eq!(
            TerminalNotifier::format(&Notice::success("Drafts cleared!")),
            "[ok] Drafts cleared!"
        );
        assert_eq!(
            TerminalNotifier::format(&Notice::error("Failed to fetch letters.")),
            "[!!] Failed to fetch letters."
        );
    }
}
