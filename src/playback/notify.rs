// User-facing notices raised by the engine

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Danger,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Danger => write!(f, "danger"),
        }
    }
}

/// Presentation seam: toasts and the loading indicator
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);

    fn loading(&self, active: bool);
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => tracing::info!("[Engine] {}", message),
            NoticeLevel::Warning => tracing::warn!("[Engine] {}", message),
            NoticeLevel::Danger => tracing::error!("[Engine] {}", message),
        }
    }

    fn loading(&self, active: bool) {
        tracing::debug!("[Engine] Loading indicator {}", if active { "shown" } else { "hidden" });
    }
}
