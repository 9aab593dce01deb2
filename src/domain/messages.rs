//! Contact message domain types
//!
//! Messages reference profiles by id and live independently of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Message status. Moves forward only: unread -> read -> replied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Unread,
    Read,
    Replied,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
            Self::Replied => "replied",
        }
    }

    /// Whether `self -> next` is an allowed lifecycle step
    pub fn can_transition_to(&self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (Self::Unread, Self::Read) | (Self::Unread, Self::Replied) | (Self::Read, Self::Replied)
        )
    }
}

impl From<String> for MessageStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "read" => Self::Read,
            "replied" => Self::Replied,
            _ => Self::Unread,
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Contact message entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ContactMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub subject: String,
    pub body: String,
    #[sqlx(try_from = "String")]
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Request to send a message
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    pub subject: String,
    pub body: String,
}

/// Request to reply to a received message
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyMessageRequest {
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

/// Which side of the conversation to list
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mailbox {
    #[default]
    Inbox,
    Sent,
}

/// Query params for listing messages
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MessageQuery {
    #[serde(default, rename = "box")]
    pub mailbox: Mailbox,
    #[serde(default)]
    pub status: Option<MessageStatus>,
}

/// Subject used for a reply when the caller gives none
pub fn reply_subject(original: &str) -> String {
    if original.to_lowercase().starts_with("re:") {
        original.to_string()
    } else {
        let subject = format!("Re: {}", original);
        subject.chars().take(100).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_only_moves_forward() {
        use MessageStatus::*;

        assert!(Unread.can_transition_to(Read));
        assert!(Unread.can_transition_to(Replied));
        assert!(Read.can_transition_to(Replied));

        assert!(!Read.can_transition_to(Unread));
        assert!(!Replied.can_transition_to(Unread));
        assert!(!Replied.can_transition_to(Read));
        assert!(!Read.can_transition_to(Read));
    }

    #[test]
    fn reply_subject_prefixes_once() {
        assert_eq!(reply_subject("Booking"), "Re: Booking");
        assert_eq!(reply_subject("Re: Booking"), "Re: Booking");
        assert_eq!(reply_subject(&"x".repeat(100)).chars().count(), 100);
    }
}
