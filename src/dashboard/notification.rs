use serde::Serialize;

/// Default lifetime of a notification banner.
pub const DEFAULT_NOTIFICATION_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

/// The single transient message slot shown above the dashboard.
///
/// `id` increases with every emission. An expiry timer only clears the slot
/// while it still holds the id the timer was started for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}
