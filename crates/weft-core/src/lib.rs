//! Core model for the Weft bridge.
//!
//! This crate holds everything the engine and the host share:
//!
//! - [`ids`]: pure mappings between remote numeric ids and normalized ids
//! - [`event`]: the normalized chat event model with its lazy capability
//!   seams (chat-info fetch, message conversion)
//! - [`store`]: persistence interfaces for read markers and reaction rows,
//!   with in-memory implementations
//!
//! No I/O happens here; the engine lives in `weft-client`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod event;
pub mod ids;
pub mod store;

pub use event::{
    ChatInfo, ChatInfoDelta, ChatInfoFetch, ChatMember, ChatMemberList, ConvertMessage,
    ConvertedMessage, EmojiId, EventMeta, EventSender, InfoFetchError, LogContext, Membership,
    MessageConvertError, MessageId, MessagePart, PortalKey, RemoteEvent, RoomKind, UserInfo,
};
pub use ids::{
    IdParseError, LoginId, PortalId, UserId, make_portal_id, make_user_id, make_user_login_id,
    parse_id,
};
pub use store::{
    MemoryReactionStore, MemoryUserPortalStore, ReactionRow, ReactionStore, StoreError,
    UserPortalStore,
};
