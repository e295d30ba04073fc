//! Host collaborator seam and host-facing value types.
//!
//! The host is the generic message-routing side of the bridge: it owns
//! portals, ghost identities, and login persistence. The engine only talks
//! to it through the [`Bridge`] trait.

use async_trait::async_trait;
use weft_core::{LoginId, MessageId, PortalKey, RemoteEvent, UserId, UserInfo};

use crate::error::HostError;
use crate::transport::Credentials;

/// The normalized event sink and host services consumed by the engine.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Queue one normalized event for the given login. The host processes
    /// queued events in submission order.
    async fn queue_remote_event(&self, login: &LoginId, event: RemoteEvent);

    /// Fetch-or-create the ghost identity for a remote user and update its
    /// profile data.
    async fn update_ghost(&self, user: &UserId, info: UserInfo) -> Result<(), HostError>;

    /// Persist refreshed session credentials for the login.
    async fn persist_credentials(
        &self,
        login: &LoginId,
        credentials: &Credentials,
    ) -> Result<(), HostError>;

    /// The login's connection is live.
    async fn mark_connected(&self, login: &LoginId);
}

/// Content of one outgoing message from the normalized side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// Plain text message.
    Text {
        /// The body.
        body: String,
    },
    /// Notice (bot output). Not bridged.
    Notice {
        /// The body.
        body: String,
    },
    /// Anything the engine cannot represent remotely.
    Unsupported {
        /// The original content kind, for diagnostics.
        kind: String,
    },
}

/// One outgoing message accepted from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Host-side event id of the message.
    pub event_id: String,
    /// Host-side user claimed as the sender.
    pub sender: String,
    /// Target conversation.
    pub portal: PortalKey,
    /// The content.
    pub content: MessageContent,
}

/// Result of a confirmed delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    /// Host-side event id the record binds to.
    pub event_id: String,
    /// The conversation the message was delivered into.
    pub portal: PortalKey,
    /// The delivering login's user id.
    pub sender: UserId,
    /// Server-confirmed remote message id. Absent when the response table
    /// carried no correlated row (logged as an anomaly, not a failure).
    pub remote_message_id: Option<MessageId>,
}

/// A chat created while resolving an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedChat {
    /// Key of the new (or existing) portal.
    pub portal_key: PortalKey,
}

/// Result of resolving a user identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentifier {
    /// Normalized user id of the resolved entity.
    pub user_id: UserId,
    /// Profile data, when the resolution produced any.
    pub user_info: Option<UserInfo>,
    /// The chat created on request, if any.
    pub chat: Option<CreatedChat>,
}
