//! Inbox state for one signed-in user.
//!
//! [`InboxSession`] owns everything the chat views render from: the user
//! directory, the conversation list, the focused conversation and the load
//! status. It calls the backend through [`MessageApi`] and delegates every
//! state transition to the pure functions in `clubhouse-inbox`.

use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use clubhouse_inbox::{
    aggregate, broadcast, merge_incoming, open_conversation, pending, place_by_recency, replies,
    search, seen, Conversation, ConversationKey, Directory, MessageThread,
};
use clubhouse_inbox::key::conversation_key;
use clubhouse_shared::protocol::{RealtimeEvent, Recipient};
use clubhouse_shared::{Delivery, Message, MessageId, User, UserId};

use crate::api::MessageApi;
use crate::error::{ClientError, Result};

/// Outcome of the last history fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum LoadState {
    /// Nothing fetched yet.
    Idle,
    Loaded,
    /// The fetch failed; the conversation list is empty until a retry.
    Failed(String),
}

pub struct InboxSession<A> {
    api: A,
    viewer: UserId,
    directory: Directory,
    conversations: Vec<Conversation>,
    focused: Option<ConversationKey>,
    load_state: LoadState,
    /// Unconfirmed local sends set aside while the list is empty after a
    /// failed load.
    held_drafts: Vec<Message>,
}

impl<A: MessageApi> InboxSession<A> {
    pub fn new(api: A, viewer: UserId) -> Self {
        Self {
            api,
            viewer,
            directory: Directory::default(),
            conversations: Vec::new(),
            focused: None,
            load_state: LoadState::Idle,
            held_drafts: Vec::new(),
        }
    }

    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, key: &ConversationKey) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == key)
    }

    pub fn focused(&self) -> Option<&ConversationKey> {
        self.focused.as_ref()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn held_drafts(&self) -> &[Message] {
        &self.held_drafts
    }

    pub fn total_unread(&self) -> usize {
        seen::total_unread(&self.conversations)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Fetch the directory and the viewer's history, then rebuild the
    /// conversation list.
    ///
    /// A directory failure is logged and the previous directory kept. A
    /// history failure empties the list, clears the focus, records
    /// [`LoadState::Failed`] and returns the error; the aggregator is not
    /// run. Unconfirmed local sends survive the failure in
    /// [`held_drafts`](Self::held_drafts) and return on the next successful
    /// load.
    pub async fn load(&mut self) -> Result<()> {
        match self.api.list_users().await {
            Ok(users) => self.directory = Directory::new(users),
            Err(e) => warn!(error = %e, "failed to load user directory, keeping previous"),
        }

        let messages = match self.api.list_messages(self.viewer).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(viewer = %self.viewer, error = %e, "failed to load message history");
                let previous = std::mem::take(&mut self.conversations);
                self.held_drafts
                    .extend(pending::unconfirmed(&previous).into_iter().cloned());
                self.focused = None;
                self.load_state = LoadState::Failed(e.to_string());
                return Err(e);
            }
        };

        let previous = std::mem::take(&mut self.conversations);
        let held = std::mem::take(&mut self.held_drafts);
        let mut rebuilt = aggregate(&messages, self.viewer, &self.directory);

        // Keep what the history cannot know about yet: unconfirmed local
        // sends and the focused conversation if it is still empty.
        for local in pending::unconfirmed(&previous).into_iter().chain(held.iter()) {
            rebuilt = merge_incoming(rebuilt, local, self.viewer, &self.directory, self.focused.as_ref());
        }
        if let Some(key) = &self.focused {
            if !rebuilt.iter().any(|c| &c.id == key) {
                if let Some(conv) = previous.into_iter().find(|c| &c.id == key) {
                    rebuilt.push(conv);
                }
            }
        }
        if let Some(key) = &self.focused {
            if !rebuilt.iter().any(|c| &c.id == key) {
                debug!(conversation = %key, "focused conversation gone after reload");
                self.focused = None;
            }
        }

        self.conversations = rebuilt;
        self.load_state = LoadState::Loaded;

        info!(
            viewer = %self.viewer,
            conversations = self.conversations.len(),
            unread = self.total_unread(),
            "inbox loaded"
        );
        Ok(())
    }

    /// Re-fetch the history with `other` and rebuild that conversation,
    /// keeping unconfirmed local sends.
    pub async fn load_thread(&mut self, other: UserId) -> Result<ConversationKey> {
        let messages = self.api.thread(self.viewer, other).await?;
        let key = conversation_key(self.viewer, other);

        let mut rebuilt = aggregate(&messages, self.viewer, &self.directory)
            .into_iter()
            .find(|c| c.id == key)
            .unwrap_or_else(|| Conversation::new(self.viewer, other, &self.directory));

        if let Some(pos) = self.conversations.iter().position(|c| c.id == key) {
            let old = self.conversations.remove(pos);
            for local in pending::unconfirmed(std::slice::from_ref(&old)) {
                rebuilt.insert_message(local.clone());
            }
        }
        place_by_recency(&mut self.conversations, rebuilt);

        debug!(conversation = %key, "thread reloaded");
        Ok(key)
    }

    // ------------------------------------------------------------------
    // Focus
    // ------------------------------------------------------------------

    /// Mark `key` as the conversation currently on screen. Live messages in
    /// it no longer raise its unread counter; the UI still calls
    /// [`mark_seen`](Self::mark_seen) to clear what was there.
    pub fn focus(&mut self, key: &ConversationKey) -> Result<()> {
        if self.conversation(key).is_none() {
            return Err(ClientError::UnknownConversation(key.clone()));
        }
        self.focused = Some(key.clone());
        Ok(())
    }

    pub fn unfocus(&mut self) {
        self.focused = None;
    }

    /// Open (or reuse) the conversation with `other` and focus it.
    pub fn start_conversation(&mut self, other: UserId) -> ConversationKey {
        let current = std::mem::take(&mut self.conversations);
        let (updated, key) = open_conversation(current, self.viewer, other, &self.directory);
        self.conversations = updated;
        self.focused = Some(key.clone());
        key
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Send `content` to `recipient`.
    ///
    /// The message appears immediately as a pending local entry. On success
    /// it is replaced by the server record, which is returned. On failure it
    /// stays in place marked failed and the error is returned.
    pub async fn send(&mut self, recipient: UserId, content: &str) -> Result<Message> {
        self.submit(recipient, content, None).await
    }

    /// Answer message `parent`, addressed to its other participant. Works
    /// like [`send`](Self::send).
    pub async fn reply(&mut self, parent: MessageId, content: &str) -> Result<Message> {
        let original = self
            .conversations
            .iter()
            .flat_map(|c| c.messages.iter())
            .find(|m| m.id == parent)
            .ok_or(ClientError::UnknownMessage(parent))?;
        let parent_id = original.id.server().ok_or(ClientError::UnknownMessage(parent))?;
        if !original.can_reply {
            return Err(ClientError::ReplyNotAllowed(parent_id));
        }
        let recipient = original.counterpart(self.viewer);
        self.submit(recipient, content, Some(parent_id)).await
    }

    /// Reply threads of conversation `key`, oldest root first.
    pub fn threads(&self, key: &ConversationKey) -> Vec<MessageThread<'_>> {
        self.conversation(key)
            .map(|c| replies::group_replies(&c.messages))
            .unwrap_or_default()
    }

    async fn submit(&mut self, recipient: UserId, content: &str, reply_to: Option<i64>) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyContent);
        }

        let current = std::mem::take(&mut self.conversations);
        let (updated, local_id) = pending::append_pending(
            current,
            self.viewer,
            recipient,
            content,
            reply_to,
            Utc::now(),
            &self.directory,
        );
        self.conversations = updated;

        self.deliver(local_id, recipient, content, reply_to).await
    }

    /// Re-send a failed local message, including one held back by a failed
    /// load.
    pub async fn retry(&mut self, local_id: MessageId) -> Result<Message> {
        let message = match pending::retry_pending(&mut self.conversations, local_id) {
            Some(message) => message,
            None => self
                .restore_held(local_id)
                .ok_or(ClientError::UnknownMessage(local_id))?,
        };
        self.deliver(local_id, message.recipient_id, &message.content, message.reply_to)
            .await
    }

    /// Move held draft `local_id` back into the list as pending.
    fn restore_held(&mut self, local_id: MessageId) -> Option<Message> {
        let pos = self.held_drafts.iter().position(|m| m.id == local_id)?;
        let mut draft = self.held_drafts.remove(pos);
        draft.delivery = Delivery::Pending;

        let current = std::mem::take(&mut self.conversations);
        self.conversations = merge_incoming(current, &draft, self.viewer, &self.directory, self.focused.as_ref());
        Some(draft)
    }

    async fn deliver(
        &mut self,
        local_id: MessageId,
        recipient: UserId,
        content: &str,
        reply_to: Option<i64>,
    ) -> Result<Message> {
        let result = match reply_to {
            Some(parent) => self.api.reply(self.viewer, recipient, content, parent).await,
            None => self.api.send(self.viewer, recipient, content).await,
        };
        match result {
            Ok(confirmed) => {
                if !pending::confirm_pending(&mut self.conversations, local_id, confirmed.clone()) {
                    self.apply_message(&confirmed);
                }
                info!(message = %confirmed.id, recipient = %recipient, "message sent");
                Ok(confirmed)
            }
            Err(e) => {
                pending::fail_pending(&mut self.conversations, local_id);
                warn!(local = %local_id, recipient = %recipient, error = %e, "message send failed");
                Err(e)
            }
        }
    }

    /// Send the same content to every resolved recipient, one message each.
    ///
    /// Every send is attempted and every confirmed record is merged. If all
    /// sends fail the first error is returned; if only some fail,
    /// [`ClientError::PartialBroadcast`] carries both sides.
    pub async fn broadcast(&mut self, recipients: &[Recipient], content: &str) -> Result<Vec<Message>> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyContent);
        }

        let targets = broadcast::resolve_recipients(recipients, &self.directory, self.viewer);
        if targets.is_empty() {
            return Err(ClientError::NoRecipients);
        }

        let api = &self.api;
        let viewer = self.viewer;
        let results = join_all(targets.iter().map(|&to| api.send(viewer, to, content))).await;

        let mut sent = Vec::new();
        let mut failed = Vec::new();
        let mut first_error = None;
        for (&to, result) in targets.iter().zip(results) {
            match result {
                Ok(message) => sent.push(message),
                Err(e) => {
                    warn!(recipient = %to, error = %e, "broadcast send failed");
                    failed.push(to);
                    first_error.get_or_insert(e);
                }
            }
        }

        for message in &sent {
            self.apply_message(message);
        }

        match first_error {
            None => {
                info!(recipients = sent.len(), "broadcast sent");
                Ok(sent)
            }
            Some(e) if sent.is_empty() => Err(e),
            Some(_) => {
                info!(sent = sent.len(), failed = failed.len(), "broadcast partially sent");
                Err(ClientError::PartialBroadcast { sent, failed })
            }
        }
    }

    // ------------------------------------------------------------------
    // Realtime
    // ------------------------------------------------------------------

    /// Apply a realtime event. Returns the affected conversation, or `None`
    /// when nothing changed (incomplete record, not addressed to the viewer,
    /// or a message already held).
    pub fn apply_event(&mut self, event: RealtimeEvent) -> Option<ConversationKey> {
        let name = event.name();
        let Some(message) = event.into_record().into_message() else {
            debug!(event = name, "dropping incomplete realtime message");
            return None;
        };
        self.apply_message(&message)
    }

    fn apply_message(&mut self, message: &Message) -> Option<ConversationKey> {
        if !message.involves(self.viewer) {
            return None;
        }
        let key = conversation_key(message.sender_id, message.recipient_id);
        if self.conversation(&key).is_some_and(|c| c.contains(&message.id)) {
            return None;
        }
        let current = std::mem::take(&mut self.conversations);
        self.conversations = merge_incoming(
            current,
            message,
            self.viewer,
            &self.directory,
            self.focused.as_ref(),
        );
        Some(key)
    }

    // ------------------------------------------------------------------
    // Seen
    // ------------------------------------------------------------------

    /// Mark everything the other party sent in `key` as seen, locally and on
    /// the backend. Returns how many messages changed.
    ///
    /// Local state is updated first. If some backend updates fail, the first
    /// error is returned after all of them were attempted.
    pub async fn mark_seen(&mut self, key: &ConversationKey) -> Result<usize> {
        if self.conversation(key).is_none() {
            return Err(ClientError::UnknownConversation(key.clone()));
        }

        let ids = seen::mark_seen(&mut self.conversations, key, self.viewer);
        let api = &self.api;
        let results = join_all(ids.iter().map(|&id| api.mark_seen(id))).await;

        let mut first_error = None;
        for (id, result) in ids.iter().zip(results) {
            if let Err(e) = result {
                warn!(message = id, error = %e, "failed to persist seen status");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(ids.len()),
        }
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn search(&self, query: &str) -> Vec<&Conversation> {
        search::filter_conversations(&self.conversations, query, self.viewer, &self.directory)
    }

    pub fn search_users(&self, query: &str) -> Vec<&User> {
        search::filter_users(&self.directory, query, self.viewer)
    }
}
