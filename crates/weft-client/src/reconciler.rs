//! Chat state reconciliation.
//!
//! Builds normalized chat info from thread rows: room kind derivation,
//! initial member lists, and the lazy info-fetch capability used when a
//! bare existence-verify row carries no name or topic.

use std::sync::Arc;

use async_trait::async_trait;
use weft_core::{
    ChatInfo, ChatInfoFetch, ChatMember, ChatMemberList, EventSender, InfoFetchError, LoginId,
    Membership, PortalKey, RoomKind, make_portal_id,
};
use weft_proto::{RemoteTask, ThreadKind};

use crate::transport::Transport;

/// Builds chat info for one login.
#[derive(Debug, Clone)]
pub struct ChatReconciler {
    login: LoginId,
}

impl ChatReconciler {
    /// Create a reconciler for the given login.
    pub fn new(login: LoginId) -> Self {
        Self { login }
    }

    /// Derive an event sender from a remote contact id.
    pub fn sender_from_id(&self, remote_id: i64) -> EventSender {
        EventSender::from_remote(remote_id, &self.login)
    }

    /// Portal key for a remote thread, scoped to this login.
    pub fn portal_key(&self, thread_key: i64) -> PortalKey {
        PortalKey { id: make_portal_id(thread_key), receiver: self.login.clone() }
    }

    /// Map the remote thread type onto a normalized room kind.
    pub fn room_kind(kind: ThreadKind) -> RoomKind {
        match kind {
            ThreadKind::OneToOne => RoomKind::DirectMessage,
            ThreadKind::Group => RoomKind::Group,
            ThreadKind::Other => RoomKind::Default,
        }
    }

    /// Initial member list for a thread row.
    ///
    /// The local login is always a joined member. For one-to-one threads the
    /// counterpart is derived from the thread key; group members arrive via
    /// separate participant-add rows.
    pub fn initial_members(&self, thread_key: i64, kind: ThreadKind) -> ChatMemberList {
        let mut members = vec![ChatMember {
            sender: EventSender::for_login(&self.login),
            membership: Membership::Join,
            nickname: None,
        }];
        if kind == ThreadKind::OneToOne {
            members.push(ChatMember {
                sender: self.sender_from_id(thread_key),
                membership: Membership::Join,
                nickname: None,
            });
        }
        ChatMemberList { members }
    }

    /// Full chat info for a thread upsert row.
    pub fn thread_info(
        &self,
        thread_key: i64,
        kind: ThreadKind,
        name: Option<String>,
        topic: Option<String>,
    ) -> ChatInfo {
        ChatInfo {
            name,
            topic,
            members: Some(self.initial_members(thread_key, kind)),
            kind: Some(Self::room_kind(kind)),
        }
    }
}

/// Lazy chat-info fetch for a bare thread-existence row.
///
/// When the host invokes this for a portal that has no room bound yet, the
/// fetcher asks the remote network for a full thread sync before returning
/// the locally derivable info; the richer data then arrives as a regular
/// table batch. For an already-materialized portal no request is issued, so
/// repeated invocations stay idempotent.
pub struct ThreadInfoFetcher {
    transport: Arc<dyn Transport>,
    thread_key: i64,
    info: ChatInfo,
}

impl ThreadInfoFetcher {
    /// Create a fetcher returning `info`, pulling a sync for `thread_key`
    /// on first materialization.
    pub fn new(transport: Arc<dyn Transport>, thread_key: i64, info: ChatInfo) -> Self {
        Self { transport, thread_key, info }
    }
}

#[async_trait]
impl ChatInfoFetch for ThreadInfoFetcher {
    async fn fetch_chat_info(&self, portal_materialized: bool) -> Result<ChatInfo, InfoFetchError> {
        if !portal_materialized {
            match self
                .transport
                .execute_tasks(&[RemoteTask::create_thread_sync(self.thread_key)])
                .await
            {
                Ok(response) => {
                    tracing::debug!(
                        thread_key = self.thread_key,
                        rows = !response.is_empty(),
                        "Requested more thread info"
                    );
                },
                Err(err) => {
                    // Best effort: the stub info below is still usable.
                    tracing::error!(
                        thread_key = self.thread_key,
                        error = %err,
                        "Failed to request more thread info"
                    );
                },
            }
        }
        Ok(self.info.clone())
    }
}
