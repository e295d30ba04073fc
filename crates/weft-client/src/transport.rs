//! Transport collaborator seam.
//!
//! The transport owns the persistent socket to the remote network. It is
//! assumed reliable at the byte level; this crate only sees decoded
//! [`TransportEvent`]s and already-deserialized [`Table`]s.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use weft_proto::{RemoteTask, Table, TransportEvent};

use crate::error::TransportError;

/// Boxed future for the event handler callback.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Callback the transport invokes for every decoded socket event.
///
/// The returned future applies backpressure: the transport must await it
/// before delivering the next event, which keeps the per-login event stream
/// totally ordered.
pub type EventHandler = Box<dyn Fn(TransportEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Metadata from the initial full-state page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    /// Remote id of the logged-in viewer.
    pub viewer_id: i64,
}

/// Opaque session credentials, refreshed by the transport on connect.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Serialized session token material.
    pub session_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("session_token", &format!("<redacted {} bytes>", self.session_token.len()))
            .finish()
    }
}

/// The socket client for one login.
///
/// Implementations deliver events from their own execution context, never
/// concurrently within one login's callback.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the persistent connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tear down the connection. Safe to call when not connected.
    async fn disconnect(&self);

    /// Install the event callback. Must be called before [`connect`].
    ///
    /// [`connect`]: Transport::connect
    fn set_event_handler(&self, handler: EventHandler);

    /// Fetch the initial full-state snapshot.
    async fn load_messages_page(&self) -> Result<(PageMeta, Table), TransportError>;

    /// Submit tasks and return the correlated response table.
    async fn execute_tasks(&self, tasks: &[RemoteTask]) -> Result<Table, TransportError>;

    /// Block until the transport can send messages, up to `timeout`.
    async fn wait_until_can_send(&self, timeout: Duration) -> Result<(), TransportError>;

    /// Current session credentials, including any refresh performed during
    /// connect.
    fn credentials(&self) -> Credentials;
}
