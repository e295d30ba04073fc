//! Normalized chat event model.
//!
//! The diff processor fans one remote table batch out into these events and
//! hands them to the host's event sink. Events are plain values except for
//! two capability objects: a lazy chat-info fetch and a lazy message
//! conversion, both invoked by the host only when it actually needs the
//! result.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use weft_proto::InsertMessage;

use crate::ids::{LoginId, PortalId, UserId, make_user_id, make_user_login_id};

/// Normalized id of one remote message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Borrow the id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalized reaction emoji key.
///
/// The remote network allows at most one reaction per (message, sender), so
/// the bridge uses a constant placeholder key instead of deriving one from
/// the emoji itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmojiId(pub String);

impl EmojiId {
    /// The placeholder key used for every reaction.
    pub fn placeholder() -> Self {
        Self("reaction".to_string())
    }
}

/// Uniquely identifies one conversation for one logged-in account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalKey {
    /// Normalized thread identifier.
    pub id: PortalId,
    /// The receiving login.
    pub receiver: LoginId,
}

/// Who produced an event, derived from a remote sender id and the current
/// login. Recomputed per use, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSender {
    /// Whether the sender is the logged-in account itself.
    pub is_from_me: bool,
    /// Normalized user id of the sender.
    pub sender: UserId,
    /// Login id the sender's own account would use.
    pub sender_login: LoginId,
}

impl EventSender {
    /// Derive a sender from a remote contact id.
    pub fn from_remote(remote_id: i64, login: &LoginId) -> Self {
        let sender_login = make_user_login_id(remote_id);
        Self {
            is_from_me: sender_login == *login,
            sender: make_user_id(remote_id),
            sender_login,
        }
    }

    /// The logged-in account as a sender.
    pub fn for_login(login: &LoginId) -> Self {
        Self {
            is_from_me: true,
            sender: UserId::from(login.as_str()),
            sender_login: login.clone(),
        }
    }
}

/// Membership state of one chat member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Joined member.
    Join,
    /// Departed member.
    Leave,
}

/// Normalized room kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// One-to-one conversation.
    DirectMessage,
    /// Group conversation.
    Group,
    /// Anything else.
    Default,
}

/// Profile data for a remote user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    /// Display name, when known.
    pub name: Option<String>,
}

/// One member entry in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMember {
    /// Who the member is.
    pub sender: EventSender,
    /// Join/leave state.
    pub membership: Membership,
    /// Per-chat nickname, when set.
    pub nickname: Option<String>,
}

/// A list of chat members, full or delta depending on context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMemberList {
    /// The member entries.
    pub members: Vec<ChatMember>,
}

/// Full chat state as known from one resync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatInfo {
    /// Chat display name.
    pub name: Option<String>,
    /// Chat topic/description.
    pub topic: Option<String>,
    /// Member list.
    pub members: Option<ChatMemberList>,
    /// Room kind.
    pub kind: Option<RoomKind>,
}

/// Incremental chat state change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatInfoDelta {
    /// Member additions/departures.
    pub member_changes: Option<ChatMemberList>,
    /// Changed info fields (unset fields are untouched).
    pub info: Option<ChatInfo>,
}

/// Lazily evaluated log-context decorator.
///
/// Events carry one of these instead of a pre-rendered string so that
/// diagnostic detail is only materialized when something actually logs it.
#[derive(Clone)]
pub struct LogContext(Arc<dyn Fn() -> Vec<(&'static str, String)> + Send + Sync>);

impl LogContext {
    /// Wrap a field-producing closure.
    pub fn new<F>(fields: F) -> Self
    where
        F: Fn() -> Vec<(&'static str, String)> + Send + Sync + 'static,
    {
        Self(Arc::new(fields))
    }

    /// Materialize the diagnostic fields.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        (self.0)()
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogContext(..)")
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(Vec::new)
    }
}

/// Shared metadata carried by every normalized event.
#[derive(Debug, Clone)]
pub struct EventMeta {
    /// Which conversation the event belongs to.
    pub portal_key: PortalKey,
    /// Create the portal if it does not exist yet.
    pub create_portal: bool,
    /// Lazy diagnostic context.
    pub log_context: LogContext,
}

/// Failure reported by a lazy chat-info fetch.
#[derive(Debug, Error)]
#[error("chat info fetch failed: {reason}")]
pub struct InfoFetchError {
    /// What went wrong.
    pub reason: String,
}

/// Capability to fetch richer chat info on demand.
///
/// Attached to a chat-resync when the originating row carried no name or
/// topic. The host invokes it only when it needs the info, passing whether
/// the portal already has a room bound; an unmaterialized portal triggers an
/// explicit create/sync request to the remote network.
#[async_trait]
pub trait ChatInfoFetch: Send + Sync {
    /// Fetch chat info, pulling richer data from the remote network when
    /// the portal is not yet materialized.
    async fn fetch_chat_info(&self, portal_materialized: bool) -> Result<ChatInfo, InfoFetchError>;
}

/// Failure reported by a lazy message conversion.
#[derive(Debug, Error)]
#[error("message conversion failed: {reason}")]
pub struct MessageConvertError {
    /// What went wrong.
    pub reason: String,
}

/// One part of a converted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    /// Plain text body.
    Text {
        /// The body.
        body: String,
    },
}

/// Host-facing form of one remote message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedMessage {
    /// Ordered message parts.
    pub parts: Vec<MessagePart>,
}

/// Capability to convert a raw remote message into its host-facing form.
///
/// Invoked lazily by the host, keeping rich-content conversion off the
/// ingestion worker's critical path when the host chooses to defer it.
#[async_trait]
pub trait ConvertMessage: Send + Sync {
    /// Convert the raw remote payload.
    async fn convert(&self, raw: &InsertMessage) -> Result<ConvertedMessage, MessageConvertError>;
}

/// One normalized event emitted toward the host.
#[derive(Clone)]
pub enum RemoteEvent {
    /// Full chat state resynchronization.
    ChatResync {
        /// Event metadata.
        meta: EventMeta,
        /// Eagerly known chat info, when the row carried it.
        info: Option<ChatInfo>,
        /// Lazy fetch capability, when richer data must be pulled on demand.
        info_fetch: Option<Arc<dyn ChatInfoFetch>>,
    },
    /// Incremental chat state change.
    ChatInfoChange {
        /// Event metadata.
        meta: EventMeta,
        /// The delta.
        change: ChatInfoDelta,
    },
    /// New remote message.
    Message {
        /// Event metadata.
        meta: EventMeta,
        /// Remote message id.
        id: MessageId,
        /// Who sent it.
        sender: EventSender,
        /// Raw remote payload; conversion is deferred to `convert`.
        raw: InsertMessage,
        /// Lazy conversion capability.
        convert: Arc<dyn ConvertMessage>,
    },
    /// Reaction added or replaced.
    ReactionAdd {
        /// Event metadata.
        meta: EventMeta,
        /// The reacted-to message.
        target: MessageId,
        /// Who reacted.
        sender: EventSender,
        /// Placeholder reaction key.
        emoji_id: EmojiId,
        /// The emoji as sent by the network.
        emoji: String,
    },
    /// Reaction removed.
    ReactionRemove {
        /// Event metadata.
        meta: EventMeta,
        /// The reacted-to message.
        target: MessageId,
        /// Whose reaction was removed.
        sender: EventSender,
        /// Placeholder reaction key.
        emoji_id: EmojiId,
    },
}

impl RemoteEvent {
    /// Shared metadata of the event.
    pub fn meta(&self) -> &EventMeta {
        match self {
            Self::ChatResync { meta, .. }
            | Self::ChatInfoChange { meta, .. }
            | Self::Message { meta, .. }
            | Self::ReactionAdd { meta, .. }
            | Self::ReactionRemove { meta, .. } => meta,
        }
    }
}

impl fmt::Debug for RemoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChatResync { meta, info, info_fetch } => f
                .debug_struct("ChatResync")
                .field("meta", meta)
                .field("info", info)
                .field("info_fetch", &info_fetch.is_some())
                .finish(),
            Self::ChatInfoChange { meta, change } => f
                .debug_struct("ChatInfoChange")
                .field("meta", meta)
                .field("change", change)
                .finish(),
            Self::Message { meta, id, sender, raw, .. } => f
                .debug_struct("Message")
                .field("meta", meta)
                .field("id", id)
                .field("sender", sender)
                .field("raw", raw)
                .finish(),
            Self::ReactionAdd { meta, target, sender, emoji_id, emoji } => f
                .debug_struct("ReactionAdd")
                .field("meta", meta)
                .field("target", target)
                .field("sender", sender)
                .field("emoji_id", emoji_id)
                .field("emoji", emoji)
                .finish(),
            Self::ReactionRemove { meta, target, sender, emoji_id } => f
                .debug_struct("ReactionRemove")
                .field("meta", meta)
                .field("target", target)
                .field("sender", sender)
                .field("emoji_id", emoji_id)
                .finish(),
        }
    }
}
