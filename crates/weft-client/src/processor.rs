//! Table diff processor.
//!
//! Fans one remote table batch out into normalized events. Row lists are
//! consumed in a fixed order so that referenced entities exist before their
//! dependents: contacts before threads, threads before membership changes,
//! membership before messages, messages before reactions.

use std::sync::Arc;

use weft_core::{
    ChatInfo, ChatInfoDelta, ChatMember, ChatMemberList, EmojiId, EventMeta, LogContext, LoginId,
    Membership, MessageId, RemoteEvent, UserInfo, make_user_id,
};
use weft_proto::Table;

use crate::bridge::Bridge;
use crate::context::ExecContext;
use crate::convert::MessageConverter;
use crate::reconciler::{ChatReconciler, ThreadInfoFetcher};
use crate::transport::Transport;

/// Turns remote table batches into normalized events for one login.
pub struct TableProcessor {
    login: LoginId,
    bridge: Arc<dyn Bridge>,
    transport: Arc<dyn Transport>,
    reconciler: ChatReconciler,
    converter: Arc<MessageConverter>,
}

/// Empty remote strings mean "unset".
fn optional(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}

impl TableProcessor {
    /// Create a processor for the given login and collaborators.
    pub fn new(
        login: LoginId,
        bridge: Arc<dyn Bridge>,
        transport: Arc<dyn Transport>,
        converter: Arc<MessageConverter>,
    ) -> Self {
        let reconciler = ChatReconciler::new(login.clone());
        Self { login, bridge, transport, reconciler, converter }
    }

    fn meta(&self, thread_key: i64, create_portal: bool) -> EventMeta {
        EventMeta {
            portal_key: self.reconciler.portal_key(thread_key),
            create_portal,
            log_context: LogContext::new(move || {
                vec![("thread_key", thread_key.to_string())]
            }),
        }
    }

    async fn queue(&self, event: RemoteEvent) {
        self.bridge.queue_remote_event(&self.login, event).await;
    }

    /// Process one table batch, emitting events in dependency order.
    ///
    /// Cancellation is honored at list boundaries: rows already emitted stay
    /// emitted, the remainder of the batch is dropped.
    pub async fn process_table(&self, ctx: &ExecContext, table: &Table) {
        for row in &table.delete_then_insert_contact {
            tracing::warn!(contact_id = row.id, "Contact row was replaced");
            self.update_ghost(row.id, &row.name).await;
        }
        for row in &table.verify_contact_row_exists {
            self.update_ghost(row.contact_id, &row.name).await;
        }
        if self.bail(ctx, "contacts") {
            return;
        }

        for row in &table.delete_then_insert_thread {
            let info = self.reconciler.thread_info(
                row.thread_key,
                row.thread_kind,
                optional(&row.thread_name),
                optional(&row.thread_description),
            );
            self.queue(RemoteEvent::ChatResync {
                meta: self.meta(row.thread_key, true),
                info: Some(info),
                info_fetch: None,
            })
            .await;
        }
        if self.bail(ctx, "threads") {
            return;
        }

        for row in &table.add_participant_to_thread {
            let member = ChatMember {
                sender: self.reconciler.sender_from_id(row.contact_id),
                membership: Membership::Join,
                nickname: optional(&row.nickname),
            };
            self.queue(RemoteEvent::ChatInfoChange {
                meta: self.meta(row.thread_key, false),
                change: ChatInfoDelta {
                    member_changes: Some(ChatMemberList { members: vec![member] }),
                    info: None,
                },
            })
            .await;
        }
        for row in &table.remove_participant_from_thread {
            let member = ChatMember {
                sender: self.reconciler.sender_from_id(row.participant_id),
                membership: Membership::Leave,
                nickname: None,
            };
            self.queue(RemoteEvent::ChatInfoChange {
                meta: self.meta(row.thread_key, false),
                change: ChatInfoDelta {
                    member_changes: Some(ChatMemberList { members: vec![member] }),
                    info: None,
                },
            })
            .await;
        }
        if self.bail(ctx, "participants") {
            return;
        }

        for row in &table.verify_thread_exists {
            let info = self.reconciler.thread_info(row.thread_key, row.thread_kind, None, None);
            let fetcher =
                ThreadInfoFetcher::new(self.transport.clone(), row.thread_key, info);
            self.queue(RemoteEvent::ChatResync {
                meta: self.meta(row.thread_key, true),
                info: None,
                info_fetch: Some(Arc::new(fetcher)),
            })
            .await;
        }

        for row in &table.update_thread_mute_setting {
            // Mute state stays host-local for now.
            tracing::debug!(
                thread_key = row.thread_key,
                mute_expire_ms = row.mute_expire_ms,
                "Ignoring mute setting change"
            );
        }

        for row in &table.update_thread_name {
            self.queue(RemoteEvent::ChatInfoChange {
                meta: self.meta(row.thread_key, false),
                change: ChatInfoDelta {
                    member_changes: None,
                    info: Some(ChatInfo {
                        name: optional(&row.thread_name),
                        ..ChatInfo::default()
                    }),
                },
            })
            .await;
        }
        if self.bail(ctx, "thread updates") {
            return;
        }

        for row in &table.upsert_message_ranges {
            tracing::trace!(
                thread_key = row.thread_key,
                min_timestamp_ms = row.min_timestamp_ms,
                max_timestamp_ms = row.max_timestamp_ms,
                has_more_before = row.has_more_before,
                "Received message range marker"
            );
        }

        for row in &table.insert_message {
            self.queue(RemoteEvent::Message {
                meta: self.meta(row.thread_key, true),
                id: MessageId(row.message_id.clone()),
                sender: self.reconciler.sender_from_id(row.sender_id),
                raw: row.clone(),
                convert: self.converter.clone(),
            })
            .await;
        }
        if self.bail(ctx, "messages") {
            return;
        }

        for row in &table.upsert_reaction {
            self.queue(RemoteEvent::ReactionAdd {
                meta: self.meta(row.thread_key, false),
                target: MessageId(row.message_id.clone()),
                sender: self.reconciler.sender_from_id(row.actor_id),
                emoji_id: EmojiId::placeholder(),
                emoji: row.reaction.clone(),
            })
            .await;
        }
        for row in &table.delete_reaction {
            self.queue(RemoteEvent::ReactionRemove {
                meta: self.meta(row.thread_key, false),
                target: MessageId(row.message_id.clone()),
                sender: self.reconciler.sender_from_id(row.actor_id),
                emoji_id: EmojiId::placeholder(),
            })
            .await;
        }
    }

    async fn update_ghost(&self, contact_id: i64, name: &str) {
        let user = make_user_id(contact_id);
        let info = UserInfo { name: optional(name) };
        if let Err(err) = self.bridge.update_ghost(&user, info).await {
            tracing::error!(
                contact_id,
                error = %err,
                "Failed to update ghost profile"
            );
        }
    }

    fn bail(&self, ctx: &ExecContext, stage: &'static str) -> bool {
        if ctx.is_cancelled() {
            tracing::debug!(login = %self.login, stage, "Table processing cancelled");
            return true;
        }
        false
    }
}
