//! # Notification Port
//!
//! Fire-and-forget notification dispatch. Actual delivery (email, chat bot)
//! belongs to an external collaborator; this module only defines the
//! messages and decouples the send from the request path.
//!
//! ## Flow
//! ```text
//! service commits transaction
//!        │
//!        ▼
//! Notifier::send(..)  ── unbounded mpsc ──►  spawned worker (logs/delivers)
//! ```
//!
//! Sends happen strictly AFTER the storage transaction commits, and a send
//! failure is logged and swallowed: notification problems never fail a
//! booking or an order.

use chrono::NaiveDate;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Destination and sender identity for outbound notifications.
///
/// Always injected by the operator; nothing in this crate carries a
/// compiled-in address, token or chat id.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Address notifications are sent from.
    pub sender_address: String,
    /// Chat id that receives admin event notifications.
    pub admin_chat_id: String,
}

impl NotifierConfig {
    pub fn new(sender_address: impl Into<String>, admin_chat_id: impl Into<String>) -> Self {
        NotifierConfig {
            sender_address: sender_address.into(),
            admin_chat_id: admin_chat_id.into(),
        }
    }

    /// Loads the config from `CLIPSHOP_SENDER_ADDRESS` and
    /// `CLIPSHOP_ADMIN_CHAT_ID`. Returns `None` when either is unset, in
    /// which case callers run without notifications.
    pub fn from_env() -> Option<Self> {
        let sender_address = std::env::var("CLIPSHOP_SENDER_ADDRESS").ok()?;
        let admin_chat_id = std::env::var("CLIPSHOP_ADMIN_CHAT_ID").ok()?;
        Some(NotifierConfig {
            sender_address,
            admin_chat_id,
        })
    }
}

/// An outbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Sent to the customer when a booking is created.
    BookingConfirmation {
        email: String,
        service: String,
        date: NaiveDate,
        slot: String,
    },
    /// Sent to the admin chat on noteworthy events.
    AdminEvent { text: String },
}

/// Handle for queueing notifications.
///
/// Cloning is cheap; every clone feeds the same worker.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<UnboundedSender<Notification>>,
}

impl Notifier {
    /// Spawns the delivery worker and returns a handle to it.
    pub fn spawn(config: NotifierConfig) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                match &notification {
                    Notification::BookingConfirmation {
                        email,
                        service,
                        date,
                        slot,
                    } => {
                        info!(
                            from = %config.sender_address,
                            to = %email,
                            service = %service,
                            %date,
                            slot = %slot,
                            "Delivering booking confirmation"
                        );
                    }
                    Notification::AdminEvent { text } => {
                        info!(
                            chat = %config.admin_chat_id,
                            text = %text,
                            "Delivering admin event"
                        );
                    }
                }
            }
        });

        Notifier { tx: Some(tx) }
    }

    /// A notifier that silently drops everything. For callers running
    /// without notification config and for most tests.
    pub fn null() -> Self {
        Notifier { tx: None }
    }

    /// A notifier whose messages land in the returned receiver instead of a
    /// worker. Lets tests assert exactly what was queued.
    pub fn capture() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Notifier { tx: Some(tx) }, rx)
    }

    /// Queues a notification. Never fails: a closed channel is logged and
    /// the message dropped.
    pub fn send(&self, notification: Notification) {
        if let Some(tx) = &self.tx {
            if tx.send(notification).is_err() {
                warn!("notification worker gone, dropping notification");
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_receives_sent_notifications() {
        let (notifier, mut rx) = Notifier::capture();

        notifier.send(Notification::AdminEvent {
            text: "new product".to_string(),
        });

        let received = rx.recv().await.unwrap();
        assert_eq!(
            received,
            Notification::AdminEvent {
                text: "new product".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_null_notifier_swallows() {
        let notifier = Notifier::null();
        // Must not panic or block.
        notifier.send(Notification::AdminEvent {
            text: "ignored".to_string(),
        });
    }
}
