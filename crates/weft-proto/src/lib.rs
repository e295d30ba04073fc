//! Remote network data model for the Weft bridge.
//!
//! The remote network publishes state as incremental "table" diffs over a
//! persistent socket: each batch is an ordered collection of typed
//! row-operation lists. This crate holds those row types, the outbound task
//! payloads submitted back to the network, and the tagged event variants
//! delivered by the transport.
//!
//! Everything here is plain data. Deserialization from the wire byte format
//! is the transport's concern; this crate only describes the shapes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod table;
mod task;

pub use event::TransportEvent;
pub use table::{
    AddParticipantToThread, DeleteReaction, DeleteThenInsertContact, DeleteThenInsertThread,
    HandleFailedTask, InsertMessage, InsertSearchResult, MarkOptimisticMessageFailed,
    RemoveParticipantFromThread, ReplaceOptimisticMessage, Table, ThreadKind,
    UpdateThreadMuteSetting, UpdateThreadName, UpsertMessageRange, UpsertReaction,
    VerifyContactRowExists, VerifyThreadExists,
};
pub use task::{PlatformFlavor, RemoteTask, SearchKind};
