//! Threaded patient-provider conversations.
//!
//! Each user owns a set of numbered threads under
//! `users/{username}/feedback/thread{N}`; every thread document holds one
//! `messages` array that is only ever appended to.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::domain::clock::Clock;
use crate::domain::error::{require, require_present, ServiceError, ServiceResult};
use crate::domain::models::{decode_document, ConversationSummary, Message, ThreadId};
use crate::domain::thread_counter::ThreadCounter;
use crate::storage::{layout, DocumentStore};

const MESSAGES: &str = "messages";

#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn DocumentStore>,
    counter: ThreadCounter,
    clock: Arc<dyn Clock>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn DocumentStore>, counter: ThreadCounter, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            counter,
            clock,
        }
    }

    /// Open a new thread holding `message` as its only entry.
    ///
    /// The thread number comes from the user's counter, so it never collides
    /// with an existing thread as long as the counter is not re-initialized.
    pub async fn start_thread(&self, username: &str, sender: &str, message: &str) -> ServiceResult<ThreadId> {
        let username = require("username", username)?;
        let sender = require_present("sender", sender)?;
        let text = require_present("message", message)?;

        let thread = ThreadId(self.counter.increment_and_get(username).await?);
        let path = layout::thread(username, &thread.key())?;
        let first = Message::stamped(text, sender, self.clock.now());

        self.store
            .set(&path, json!({ "messages": [serde_json::to_value(&first)?] }))
            .await?;

        info!("Started {} for {} (sender: {})", thread.key(), username, sender);
        Ok(thread)
    }

    /// Union-append a message to thread `index`.
    ///
    /// Two messages with identical text, sender, date and minute are the same
    /// value, so the second one is dropped. When the thread document does not
    /// exist it is created holding just this message.
    pub async fn append_message(&self, username: &str, index: u64, message: &str, sender: &str) -> ServiceResult<()> {
        let username = require("username", username)?;
        let sender = require_present("sender", sender)?;
        let text = require_present("message", message)?;
        let thread = Self::thread_id(index)?;

        let path = layout::thread(username, &thread.key())?;
        let entry = Message::stamped(text, sender, self.clock.now());

        self.store
            .array_union(&path, MESSAGES, vec![serde_json::to_value(&entry)?])
            .await?;

        info!("Appended message to {} for {} (sender: {})", thread.key(), username, sender);
        Ok(())
    }

    /// First message and length of every non-empty thread, ordered by thread
    /// number.
    pub async fn list_conversation_summaries(&self, username: &str) -> ServiceResult<Vec<ConversationSummary>> {
        let username = require("username", username)?;
        let collection = layout::feedback(username)?;

        let mut summaries = Vec::new();
        for doc in self.store.list(&collection).await? {
            let Some(thread) = ThreadId::parse(&doc.id) else {
                continue;
            };
            let messages = Self::decode_messages(&format!("{collection}/{}", doc.id), &doc.data)?;
            let count = messages.len();
            if let Some(first) = messages.into_iter().next() {
                summaries.push(ConversationSummary {
                    thread,
                    first,
                    count,
                });
            }
        }
        summaries.sort_by_key(|summary| summary.thread);

        info!("Found {} conversations for {}", summaries.len(), username);
        Ok(summaries)
    }

    /// Every message of thread `index`, or `None` when the thread does not exist
    pub async fn get_conversation(&self, username: &str, index: u64) -> ServiceResult<Option<Vec<Message>>> {
        let username = require("username", username)?;
        let thread = Self::thread_id(index)?;
        let path = layout::thread(username, &thread.key())?;

        match self.store.get(&path).await? {
            Some(doc) => Ok(Some(Self::decode_messages(&path.to_string(), &doc)?)),
            None => {
                warn!("Conversation {} not found for {}", thread.key(), username);
                Ok(None)
            }
        }
    }

    fn thread_id(index: u64) -> ServiceResult<ThreadId> {
        if index == 0 {
            return Err(ServiceError::Validation(
                "thread index must be at least 1".into(),
            ));
        }
        Ok(ThreadId(index))
    }

    fn decode_messages(path: &str, doc: &Value) -> ServiceResult<Vec<Message>> {
        match doc.get(MESSAGES) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(raw) => Ok(decode_document(path, raw.clone())?),
        }
    }
}
