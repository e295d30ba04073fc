//! Outbound task payloads.
//!
//! Tasks are the write half of the remote protocol: the bridge submits one
//! or more tasks in a single request and receives a response [`Table`]
//! whose rows are correlated back by the offline threading id.
//!
//! [`Table`]: crate::table::Table

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Remote network flavor the session is logged into.
///
/// The flavors share the table protocol but differ in a handful of request
/// knobs (search surface type, supported search kinds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformFlavor {
    /// The messenger-branded deployment.
    Messenger,
    /// The photo-app-branded deployment.
    Instagram,
}

impl PlatformFlavor {
    /// Returns true for the messenger-branded deployment.
    pub fn is_messenger(self) -> bool {
        matches!(self, Self::Messenger)
    }
}

/// Entity categories a user search may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i64)]
pub enum SearchKind {
    /// Known contact.
    Contact = 1,
    /// Group thread.
    Group = 2,
    /// Public page.
    Page = 3,
    /// User outside the contact list.
    NonContact = 4,
    /// Followed contact (photo-app flavor).
    IgContactFollowing = 5,
    /// Unfollowed contact (photo-app flavor).
    IgContactNonFollowing = 6,
    /// Followed non-contact (photo-app flavor).
    IgNonContactFollowing = 7,
    /// Unfollowed non-contact (photo-app flavor).
    IgNonContactNonFollowing = 8,
    /// Community messaging thread (messenger flavor only).
    CommunityMessagingThread = 9,
}

/// One task submitted to the remote network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteTask {
    /// Deliver a message into a thread. The `otid` is chosen by the bridge
    /// and echoed back in the correlated response rows.
    SendMessage {
        /// Target thread key.
        thread_key: i64,
        /// Client-chosen offline threading id.
        otid: i64,
        /// Plain-text body.
        text: String,
        /// Sync group the send belongs to.
        sync_group: i64,
    },
    /// Create a thread on the remote side, or ask for a full metadata sync
    /// of an existing one.
    CreateThread {
        /// Target thread key.
        thread_key: i64,
        /// Force replacing an existing row.
        force_upsert: i64,
        /// Use the open messenger transport.
        use_open_messenger_transport: i64,
        /// Sync group the request belongs to.
        sync_group: i64,
        /// Only fetch metadata, skip message history.
        metadata_only: i64,
        /// Only fetch a preview.
        preview_only: i64,
    },
    /// Search for users or threads.
    SearchUser {
        /// Free-text query.
        query: String,
        /// Entity categories to match.
        supported_kinds: Vec<SearchKind>,
        /// Surface the search is issued from; flavor dependent.
        surface_type: i64,
        /// Secondary (best-effort shadow) request flag. The remote network's
        /// own client always issues the search twice; the secondary response
        /// carries nothing of interest.
        secondary: bool,
    },
}

impl RemoteTask {
    /// Create-thread request with the defaults the remote client uses for a
    /// plain "materialize this thread" sync.
    pub fn create_thread_sync(thread_key: i64) -> Self {
        Self::CreateThread {
            thread_key,
            force_upsert: 0,
            use_open_messenger_transport: 0,
            sync_group: 1,
            metadata_only: 0,
            preview_only: 0,
        }
    }

    /// String form of the offline threading id, if this task carries one.
    pub fn otid_str(&self) -> Option<String> {
        match self {
            Self::SendMessage { otid, .. } => Some(otid.to_string()),
            Self::CreateThread { .. } | Self::SearchUser { .. } => None,
        }
    }
}
