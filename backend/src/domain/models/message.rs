use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::storage::layout::THREAD_PREFIX;

/// One entry of a conversation thread.
///
/// Messages have no id; their position in the thread is their identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
    /// `DD Month YYYY`, e.g. `05 March 2024`
    pub date: String,
    /// `hh:mm AM/PM`, e.g. `02:07 PM`
    pub time: String,
    pub sender: String,
}

impl Message {
    /// Build a message stamped with the date and minute of `at`
    pub fn stamped<Tz>(message: &str, sender: &str, at: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            message: message.to_string(),
            date: at.format("%d %B %Y").to_string(),
            time: at.format("%I:%M %p").to_string(),
            sender: sender.to_string(),
        }
    }
}

/// Per-user thread number, rendered as the document key `thread{N}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u64);

impl ThreadId {
    pub fn key(&self) -> String {
        format!("{}{}", THREAD_PREFIX, self.0)
    }

    /// Parse a document key such as `thread12`. Returns `None` for
    /// non-thread documents like the counter.
    pub fn parse(key: &str) -> Option<Self> {
        let digits = key.strip_prefix(THREAD_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(ThreadId)
    }
}

/// First message of a thread plus the thread length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub thread: ThreadId,
    pub first: Message,
    pub count: usize,
}
