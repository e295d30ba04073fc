//! Bridge engine for one remote-network login.
//!
//! Sits between a proprietary messaging transport (which delivers state as
//! incremental table batches) and a normalized chat host. Inbound, table
//! batches flow through a bounded single-worker ingestion queue into the
//! diff processor, which emits normalized events. Outbound, host messages
//! run through the delivery pipeline with OTID-correlated confirmation.
//!
//! # Architecture
//!
//! ```text
//! transport callback → ingestion queue → TableProcessor → Bridge sink
//!                                          │
//!                                          └─ ChatReconciler (chat info)
//!
//! host message → DeliveryPipeline → Transport tasks → response correlation
//! ```
//!
//! The [`WeftClient`] session controller owns the lifecycle: connect,
//! disconnect, and the host-facing outbound operations.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod context;
pub mod convert;
pub mod error;
pub mod outbound;
pub mod processor;
pub mod reconciler;
pub mod session;
pub mod transport;

pub use bridge::{
    Bridge, CreatedChat, DeliveryRecord, MessageContent, OutgoingMessage, ResolvedIdentifier,
};
pub use context::ExecContext;
pub use convert::{MessageConverter, new_otid};
pub use error::{ClientError, ConvertError, HostError, SendError, TransportError};
pub use outbound::DeliveryPipeline;
pub use processor::TableProcessor;
pub use reconciler::{ChatReconciler, ThreadInfoFetcher};
pub use session::WeftClient;
pub use transport::{BoxFuture, Credentials, EventHandler, PageMeta, Transport};
