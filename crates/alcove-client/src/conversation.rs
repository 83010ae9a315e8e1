use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use alcove_api::ApiError;
use alcove_types::events::PushEvent;
use alcove_types::models::{Message, MessageStatus, Reaction, UserProfile};

use crate::backend::ChatBackend;

type AdoptionListener = Box<dyn Fn(&str) + Send + Sync>;

/// Visible state of the conversation view for one selected peer.
///
/// `messages` holds the server's authoritative list plus any optimistic
/// entries awaiting confirmation; after every settle point (a completed
/// refetch) it equals the server's list exactly.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub peer: Option<UserProfile>,
    pub conversation_id: Option<String>,
    pub messages: Vec<Message>,
    /// Message ids armed for batch deletion.
    pub selected: HashSet<String>,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped on every peer switch. In-flight remote calls capture the epoch
    /// at launch and discard their result if it moved, so a stale fetch can
    /// never overwrite the newly selected peer's list.
    epoch: u64,
}

struct ViewInner {
    backend: Arc<dyn ChatBackend>,
    me: UserProfile,
    state: RwLock<ViewState>,
    on_adopt: Mutex<Option<AdoptionListener>>,
}

/// Controller for the message thread of one selected peer.
///
/// Conversation lifecycle: starts with no conversation id, adopts one the
/// first time a send succeeds, and never reverts — a peer switch starts a
/// fresh instance of that state machine scoped to the new peer.
#[derive(Clone)]
pub struct ConversationView {
    inner: Arc<ViewInner>,
}

impl ConversationView {
    pub fn new(backend: Arc<dyn ChatBackend>, me: UserProfile) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                backend,
                me,
                state: RwLock::new(ViewState::default()),
                on_adopt: Mutex::new(None),
            }),
        }
    }

    /// Register a callback invoked with the conversation id the first time
    /// the server allocates one, so the owner can persist it to routing
    /// state.
    pub fn set_adoption_listener(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        *self.inner.on_adopt.lock().expect("listener lock poisoned") = Some(Box::new(f));
    }

    pub async fn snapshot(&self) -> ViewState {
        self.inner.state.read().await.clone()
    }

    /// Switch the view to `peer`. The list and selection clear immediately —
    /// the previous peer's messages must never flash under the new peer —
    /// then the conversation id is resolved and, if one exists, the list is
    /// fetched. With no conversation yet the list stays empty until the
    /// first send.
    pub async fn select_peer(&self, peer: UserProfile) {
        let epoch = {
            let mut st = self.inner.state.write().await;
            st.epoch += 1;
            st.peer = Some(peer.clone());
            st.conversation_id = None;
            st.messages.clear();
            st.selected.clear();
            st.error = None;
            st.loading = true;
            st.epoch
        };

        match self.inner.backend.conversation_with(&peer.email).await {
            Ok(Some(conversation_id)) => {
                {
                    let mut st = self.inner.state.write().await;
                    if st.epoch != epoch {
                        debug!("discarding conversation lookup for stale peer");
                        return;
                    }
                    st.conversation_id = Some(conversation_id);
                }
                self.refetch(epoch).await;
            }
            Ok(None) => {
                let mut st = self.inner.state.write().await;
                if st.epoch == epoch {
                    st.loading = false;
                }
            }
            Err(e) => {
                warn!("conversation lookup failed: {}", e);
                let mut st = self.inner.state.write().await;
                if st.epoch == epoch {
                    st.loading = false;
                    st.error = Some("Could not load conversation".into());
                }
            }
        }
    }

    /// Send `text` to the active peer.
    ///
    /// An optimistic entry (client-generated id, status `sent`) appears
    /// immediately. On success the server-allocated conversation id is
    /// adopted if none was known — exactly once, never re-adopted — and the
    /// full list is refetched so server-assigned fields replace the
    /// optimistic entry. On failure the optimistic entry is removed and
    /// nothing else is committed.
    pub async fn send(&self, text: &str) -> Result<(), ApiError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ApiError::Invalid("message text is empty".into()));
        }

        let (peer_id, epoch) = {
            let st = self.inner.state.read().await;
            let Some(peer) = &st.peer else {
                return Err(ApiError::Invalid("no peer selected".into()));
            };
            (peer.id.clone(), st.epoch)
        };

        let local_id = Uuid::new_v4().to_string();
        {
            let mut st = self.inner.state.write().await;
            st.messages.push(Message {
                id: local_id.clone(),
                sender_id: self.inner.me.id.clone(),
                receiver_id: Some(peer_id.clone()),
                content: content.to_string(),
                timestamp: Utc::now(),
                status: MessageStatus::Sent,
                reactions: Vec::new(),
            });
        }

        match self.inner.backend.send_message(&peer_id, content).await {
            Ok(sent) => {
                let adopted = {
                    let mut st = self.inner.state.write().await;
                    if st.epoch != epoch {
                        debug!("discarding send confirmation for stale peer");
                        return Ok(());
                    }
                    if st.conversation_id.is_none() {
                        st.conversation_id = Some(sent.conversation.clone());
                        true
                    } else {
                        false
                    }
                };
                if adopted {
                    if let Some(listener) =
                        &*self.inner.on_adopt.lock().expect("listener lock poisoned")
                    {
                        listener(&sent.conversation);
                    }
                }
                self.refetch(epoch).await;
                Ok(())
            }
            Err(e) => {
                warn!("send failed: {}", e);
                let mut st = self.inner.state.write().await;
                st.messages.retain(|m| m.id != local_id);
                Err(e)
            }
        }
    }

    /// Delete one of the current user's messages. Peer messages are refused
    /// up front; the server is not trusted to be the only gate.
    pub async fn delete_message(&self, message_id: &str) -> Result<(), ApiError> {
        let epoch = {
            let st = self.inner.state.read().await;
            let Some(message) = st.messages.iter().find(|m| m.id == message_id) else {
                return Err(ApiError::Invalid("unknown message".into()));
            };
            if message.sender_id != self.inner.me.id {
                return Err(ApiError::Invalid("only own messages can be deleted".into()));
            }
            st.epoch
        };

        match self.inner.backend.delete_message(message_id).await {
            Ok(()) => {
                {
                    let mut st = self.inner.state.write().await;
                    if st.epoch == epoch {
                        st.messages.retain(|m| m.id != message_id);
                        st.selected.remove(message_id);
                    }
                }
                self.refetch(epoch).await;
                Ok(())
            }
            Err(e) => {
                // Local state stays as-is; no automatic retry.
                warn!("delete failed for {}: {}", message_id, e);
                Err(e)
            }
        }
    }

    /// Arm or disarm a message for batch deletion. Only own messages are
    /// selectable.
    pub async fn toggle_select(&self, message_id: &str) {
        let mut st = self.inner.state.write().await;
        let owned = st
            .messages
            .iter()
            .any(|m| m.id == message_id && m.sender_id == self.inner.me.id);
        if !owned {
            return;
        }
        if !st.selected.remove(message_id) {
            st.selected.insert(message_id.to_string());
        }
    }

    /// Delete every selected message. The calls run concurrently and are
    /// judged as a set: one failure fails the batch and nothing is removed
    /// locally — partial removal must never be observed. On full success the
    /// selection clears and the list is refetched.
    pub async fn delete_selected(&self) -> Result<(), ApiError> {
        let (ids, epoch) = {
            let st = self.inner.state.read().await;
            (st.selected.iter().cloned().collect::<Vec<_>>(), st.epoch)
        };
        if ids.is_empty() {
            return Ok(());
        }

        let results = join_all(
            ids.iter()
                .map(|id| self.inner.backend.delete_message(id)),
        )
        .await;

        if let Some(e) = results.into_iter().find_map(Result::err) {
            warn!("batch delete failed, keeping local state: {}", e);
            return Err(e);
        }

        {
            let mut st = self.inner.state.write().await;
            if st.epoch == epoch {
                st.selected.clear();
            }
        }
        self.refetch(epoch).await;
        Ok(())
    }

    /// Toggle the current user's reaction on a message: a second toggle of
    /// the same emoji removes it.
    ///
    /// The local flip is applied immediately; the persistence call runs in
    /// the background and its failure is only logged, never rolled back —
    /// the inconsistency window closes at the next refetch.
    pub async fn toggle_reaction(&self, message_id: &str, emoji: &str) {
        let me = self.inner.me.id.clone();
        let had = {
            let mut st = self.inner.state.write().await;
            let Some(message) = st.messages.iter_mut().find(|m| m.id == message_id) else {
                return;
            };
            if message.has_reaction(&me, emoji) {
                message
                    .reactions
                    .retain(|r| !(r.user_id == me && r.emoji == emoji));
                true
            } else {
                message.reactions.push(Reaction {
                    user_id: me.clone(),
                    emoji: emoji.to_string(),
                    timestamp: Utc::now(),
                });
                false
            }
        };

        let inner = self.inner.clone();
        let message_id = message_id.to_string();
        let emoji = emoji.to_string();
        tokio::spawn(async move {
            let result = if had {
                inner.backend.remove_reaction(&message_id, &emoji).await
            } else {
                inner.backend.add_reaction(&message_id, &emoji).await
            };
            if let Err(e) = result {
                warn!("reaction persistence failed for {}: {}", message_id, e);
            }
        });
    }

    /// Flip a peer message to `read` locally. The service exposes no
    /// read-receipt endpoint, so nothing is sent remotely.
    pub async fn mark_read(&self, message_id: &str) {
        let mut st = self.inner.state.write().await;
        if let Some(message) = st.messages.iter_mut().find(|m| m.id == message_id) {
            if message.sender_id != self.inner.me.id {
                message.status = MessageStatus::Read;
            }
        }
    }

    /// React to a push event: refetch only when the event's actor is the
    /// active peer. Events for other peers belong to the notification feed,
    /// not this view.
    pub async fn handle_push(&self, event: &PushEvent) {
        let (peer_id, epoch) = {
            let st = self.inner.state.read().await;
            match &st.peer {
                Some(peer) => (peer.id.clone(), st.epoch),
                None => return,
            }
        };

        match event.actor_id() {
            Some(actor) if actor == peer_id => self.refetch(epoch).await,
            _ => {}
        }
    }

    /// Fetch the authoritative list for the active conversation and replace
    /// local state with it, unless the view moved on (epoch mismatch) while
    /// the fetch was in flight.
    async fn refetch(&self, epoch: u64) {
        let conversation_id = {
            let st = self.inner.state.read().await;
            if st.epoch != epoch {
                return;
            }
            match &st.conversation_id {
                Some(id) => id.clone(),
                None => return,
            }
        };

        {
            let mut st = self.inner.state.write().await;
            if st.epoch == epoch {
                st.loading = true;
            }
        }

        match self.inner.backend.fetch_messages(&conversation_id).await {
            Ok(messages) => {
                let mut st = self.inner.state.write().await;
                if st.epoch != epoch {
                    debug!("discarding fetched messages for stale peer");
                    return;
                }
                st.messages = messages;
                st.loading = false;
                st.error = None;
            }
            Err(e) => {
                warn!("message fetch failed: {}", e);
                let mut st = self.inner.state.write().await;
                if st.epoch == epoch {
                    st.loading = false;
                    st.error = Some("Could not load messages".into());
                }
            }
        }
    }
}
