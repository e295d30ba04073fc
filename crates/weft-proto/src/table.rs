//! Table diff model.
//!
//! A [`Table`] is one batch of incremental state changes from the remote
//! network: an ordered collection of typed row-operation lists. Rows within
//! one list are meaningful in list order; the lists themselves are consumed
//! in the fixed order documented on the diff processor.
//!
//! A table is transient. It is built by the transport from a decoded
//! publish payload, handed to the processor exactly once, and dropped.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Remote thread type discriminant.
///
/// The wire value is a small integer; anything the bridge does not know how
/// to map lands on [`ThreadKind::Other`] and is treated as a default room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i64)]
pub enum ThreadKind {
    /// Direct conversation between the viewer and one counterpart. The
    /// thread key doubles as the counterpart's contact id.
    OneToOne = 1,
    /// Multi-participant group thread.
    Group = 2,
    /// Any other thread type (communities, marketplace, ...).
    #[serde(other)]
    Other = 0,
}

/// Contact row replacement (delete old row, insert fresh state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteThenInsertContact {
    /// Remote contact id.
    pub id: i64,
    /// Current display name.
    pub name: String,
}

/// Assertion that a contact row exists, carrying its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyContactRowExists {
    /// Remote contact id.
    pub contact_id: i64,
    /// Current display name.
    pub name: String,
}

/// Thread row replacement with full metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteThenInsertThread {
    /// Remote thread key.
    pub thread_key: i64,
    /// Thread type discriminant.
    pub thread_kind: ThreadKind,
    /// Thread display name.
    pub thread_name: String,
    /// Thread description (topic).
    pub thread_description: String,
}

/// Assertion that a thread row exists. Carries no name or topic; richer
/// data must be pulled on demand when the conversation is not yet known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyThreadExists {
    /// Remote thread key.
    pub thread_key: i64,
    /// Thread type discriminant.
    pub thread_kind: ThreadKind,
}

/// Participant joined a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddParticipantToThread {
    /// Remote thread key.
    pub thread_key: i64,
    /// Remote contact id of the new participant.
    pub contact_id: i64,
    /// Per-thread nickname, empty when unset.
    pub nickname: String,
}

/// Participant left (or was removed from) a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveParticipantFromThread {
    /// Remote thread key.
    pub thread_key: i64,
    /// Remote contact id of the departed participant.
    pub participant_id: i64,
}

/// Mute setting change for a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateThreadMuteSetting {
    /// Remote thread key.
    pub thread_key: i64,
    /// Expiry of the mute in unix milliseconds, `-1` for indefinite,
    /// `0` for unmuted.
    pub mute_expire_ms: i64,
}

/// Thread rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateThreadName {
    /// Remote thread key.
    pub thread_key: i64,
    /// New thread display name.
    pub thread_name: String,
}

/// Range marker for a batch of upserted history messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertMessageRange {
    /// Remote thread key the range belongs to.
    pub thread_key: i64,
    /// Lower bound of the range in unix milliseconds.
    pub min_timestamp_ms: i64,
    /// Upper bound of the range in unix milliseconds.
    pub max_timestamp_ms: i64,
    /// Whether more history exists before the range.
    pub has_more_before: bool,
}

/// Newly inserted message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertMessage {
    /// Remote message id.
    pub message_id: String,
    /// Offline threading id the sender correlated this message with, if any.
    pub otid: Option<String>,
    /// Remote thread key.
    pub thread_key: i64,
    /// Remote contact id of the sender.
    pub sender_id: i64,
    /// Send time in unix milliseconds.
    pub timestamp_ms: i64,
    /// Plain-text body, empty for attachment-only messages.
    pub text: String,
}

/// Reaction added or replaced. The network allows at most one reaction per
/// (message, actor) pair, so an upsert always supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertReaction {
    /// Remote id of the reacted-to message.
    pub message_id: String,
    /// Remote thread key.
    pub thread_key: i64,
    /// Remote contact id of the reacting user.
    pub actor_id: i64,
    /// Reaction emoji as sent by the network.
    pub reaction: String,
}

/// Reaction removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReaction {
    /// Remote id of the reacted-to message.
    pub message_id: String,
    /// Remote thread key.
    pub thread_key: i64,
    /// Remote contact id of the user whose reaction was removed.
    pub actor_id: i64,
}

/// Server confirmation that an optimistically sent message was accepted.
/// Correlated with the submitting task by the offline threading id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOptimisticMessage {
    /// String form of the client-chosen offline threading id.
    pub offline_threading_id: String,
    /// Final server-assigned message id.
    pub message_id: String,
}

/// Server rejection of an optimistically sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkOptimisticMessageFailed {
    /// String form of the client-chosen offline threading id.
    pub otid: String,
    /// Human-readable rejection reason from the server.
    pub message: String,
}

/// Server-side task failure notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleFailedTask {
    /// Id of the failed task.
    pub task_id: i64,
    /// String form of the offline threading id the task carried.
    pub otid: String,
    /// Human-readable failure reason from the server.
    pub message: String,
}

/// One user-search result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertSearchResult {
    /// Remote id of the matched entity.
    pub result_id: i64,
    /// Display name of the matched entity.
    pub display_name: String,
    /// Thread type the result would open.
    pub thread_kind: ThreadKind,
    /// Whether the viewer is allowed to message this entity.
    pub can_viewer_message: bool,
}

/// One batch of typed row-operation lists.
///
/// Field order mirrors the processing order; see the diff processor for the
/// rationale. An empty table is valid and produces no events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Contact replacements.
    pub delete_then_insert_contact: Vec<DeleteThenInsertContact>,
    /// Contact existence assertions.
    pub verify_contact_row_exists: Vec<VerifyContactRowExists>,
    /// Thread replacements.
    pub delete_then_insert_thread: Vec<DeleteThenInsertThread>,
    /// Participant additions.
    pub add_participant_to_thread: Vec<AddParticipantToThread>,
    /// Participant removals.
    pub remove_participant_from_thread: Vec<RemoveParticipantFromThread>,
    /// Thread existence assertions.
    pub verify_thread_exists: Vec<VerifyThreadExists>,
    /// Mute setting changes.
    pub update_thread_mute_setting: Vec<UpdateThreadMuteSetting>,
    /// Thread renames.
    pub update_thread_name: Vec<UpdateThreadName>,
    /// History upsert range markers.
    pub upsert_message_ranges: Vec<UpsertMessageRange>,
    /// New message rows.
    pub insert_message: Vec<InsertMessage>,
    /// Reaction upserts.
    pub upsert_reaction: Vec<UpsertReaction>,
    /// Reaction deletions.
    pub delete_reaction: Vec<DeleteReaction>,
    /// Optimistic-send confirmations (task responses only).
    pub replace_optimistic_message: Vec<ReplaceOptimisticMessage>,
    /// Optimistic-send rejections (task responses only).
    pub mark_optimistic_message_failed: Vec<MarkOptimisticMessageFailed>,
    /// Failed-task notices (task responses only).
    pub handle_failed_task: Vec<HandleFailedTask>,
    /// Search result rows (search responses only).
    pub insert_search_result: Vec<InsertSearchResult>,
}

impl Table {
    /// Returns true if the table carries no rows at all.
    pub fn is_empty(&self) -> bool {
        self.delete_then_insert_contact.is_empty()
            && self.verify_contact_row_exists.is_empty()
            && self.delete_then_insert_thread.is_empty()
            && self.add_participant_to_thread.is_empty()
            && self.remove_participant_from_thread.is_empty()
            && self.verify_thread_exists.is_empty()
            && self.update_thread_mute_setting.is_empty()
            && self.update_thread_name.is_empty()
            && self.upsert_message_ranges.is_empty()
            && self.insert_message.is_empty()
            && self.upsert_reaction.is_empty()
            && self.delete_reaction.is_empty()
            && self.replace_optimistic_message.is_empty()
            && self.mark_optimistic_message_failed.is_empty()
            && self.handle_failed_task.is_empty()
            && self.insert_search_result.is_empty()
    }
}
