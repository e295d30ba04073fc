//! Session controller.
//!
//! Owns the transport handle for one login: connection lifecycle, the
//! bounded ingestion queue with its single worker, and the host-facing
//! outbound operations.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use weft_core::{LoginId, PortalKey, UserInfo, make_portal_id, make_user_id, parse_id};
use weft_proto::{PlatformFlavor, RemoteTask, SearchKind, ThreadKind, TransportEvent};

use crate::bridge::{Bridge, CreatedChat, DeliveryRecord, OutgoingMessage, ResolvedIdentifier};
use crate::context::ExecContext;
use crate::convert::MessageConverter;
use crate::error::{ClientError, SendError};
use crate::outbound::DeliveryPipeline;
use crate::processor::TableProcessor;
use crate::transport::Transport;

/// Bound on events buffered between the transport callback and the worker.
const QUEUE_CAPACITY: usize = 8;

/// Delay before the shadow search request, mirroring the remote client.
const SECONDARY_SEARCH_DELAY: Duration = Duration::from_millis(10);

/// One unit of work on the ingestion queue.
///
/// The stop sentinel lives on the same channel as events so the worker
/// drains everything enqueued before it and nothing after.
enum QueuedEvent {
    /// A decoded transport event with its execution context.
    Event {
        ctx: ExecContext,
        event: TransportEvent,
    },
    /// Terminate the worker.
    Stop,
}

/// Live connection state, present only between connect and disconnect.
struct Running {
    events_tx: mpsc::Sender<QueuedEvent>,
    worker: JoinHandle<()>,
    cancel: CancellationToken,
}

/// The bridge engine for one logged-in account.
pub struct WeftClient {
    login: LoginId,
    flavor: PlatformFlavor,
    bridge: Arc<dyn Bridge>,
    transport: Arc<dyn Transport>,
    processor: Arc<TableProcessor>,
    pipeline: DeliveryPipeline,
    running: Mutex<Option<Running>>,
}

impl WeftClient {
    /// Create a client for one login.
    ///
    /// `login_user` is the host-side user the login belongs to. The client
    /// is idle until [`connect`] is called.
    ///
    /// [`connect`]: WeftClient::connect
    pub fn new(
        login: LoginId,
        login_user: String,
        flavor: PlatformFlavor,
        bridge: Arc<dyn Bridge>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let converter = Arc::new(MessageConverter::new(flavor));
        let processor = Arc::new(TableProcessor::new(
            login.clone(),
            bridge.clone(),
            transport.clone(),
            converter.clone(),
        ));
        let pipeline =
            DeliveryPipeline::new(login.clone(), login_user, transport.clone(), converter);
        Self {
            login,
            flavor,
            bridge,
            transport,
            processor,
            pipeline,
            running: Mutex::new(None),
        }
    }

    /// Connect the session.
    ///
    /// Fetches the initial full-state snapshot and processes it before the
    /// live event callback is registered, so no live event can be handled
    /// ahead of the baseline state. The ingestion worker starts only once
    /// the connection is open.
    ///
    /// # Errors
    ///
    /// [`ClientError::AlreadyConnected`] when already connected; otherwise
    /// the underlying transport error, or [`ClientError::Host`] when the
    /// refreshed credentials cannot be persisted.
    pub async fn connect(&self, ctx: &ExecContext) -> Result<(), ClientError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(ClientError::AlreadyConnected);
        }

        let (meta, initial) = self.transport.load_messages_page().await?;
        tracing::info!(login = %self.login, viewer_id = meta.viewer_id, "Loaded initial state");
        self.processor.process_table(ctx, &initial).await;

        let (events_tx, mut events_rx) = mpsc::channel::<QueuedEvent>(QUEUE_CAPACITY);
        let cancel = CancellationToken::new();

        let handler_tx = events_tx.clone();
        let handler_cancel = cancel.clone();
        self.transport.set_event_handler(Box::new(move |event| {
            let tx = handler_tx.clone();
            let event_ctx = ExecContext::child_of(&handler_cancel);
            Box::pin(async move {
                if tx.send(QueuedEvent::Event { ctx: event_ctx, event }).await.is_err() {
                    tracing::warn!("Dropping event for closed session queue");
                }
            })
        }));

        self.transport.connect().await?;

        if let Err(err) =
            self.bridge.persist_credentials(&self.login, &self.transport.credentials()).await
        {
            self.transport.disconnect().await;
            return Err(err.into());
        }

        let worker = {
            let processor = self.processor.clone();
            let bridge = self.bridge.clone();
            let login = self.login.clone();
            tokio::spawn(async move {
                while let Some(item) = events_rx.recv().await {
                    match item {
                        QueuedEvent::Stop => {
                            tracing::debug!(login = %login, "Ingestion worker stopping");
                            break;
                        },
                        QueuedEvent::Event { ctx, event } => match event {
                            TransportEvent::Table(table) => {
                                processor.process_table(&ctx, &table).await;
                            },
                            TransportEvent::ConnectionReady => {
                                tracing::info!(login = %login, "Connection is ready");
                                bridge.mark_connected(&login).await;
                            },
                            TransportEvent::Unrecognized(kind) => {
                                tracing::warn!(login = %login, kind, "Unrecognized event");
                            },
                        },
                    }
                }
            })
        };

        *running = Some(Running { events_tx, worker, cancel });
        Ok(())
    }

    /// Disconnect the session.
    ///
    /// Events enqueued before the call are drained; the transport is torn
    /// down afterwards. Safe to call when not connected; the client is
    /// reusable after a fresh [`connect`].
    ///
    /// [`connect`]: WeftClient::connect
    pub async fn disconnect(&self) {
        let Some(Running { events_tx, worker, cancel }) = self.running.lock().await.take() else {
            return;
        };

        if events_tx.send(QueuedEvent::Stop).await.is_err() {
            tracing::debug!(login = %self.login, "Ingestion worker already gone");
        }
        drop(events_tx);
        if worker.await.is_err() {
            tracing::warn!(login = %self.login, "Ingestion worker ended abnormally");
        }
        cancel.cancel();
        self.transport.disconnect().await;
    }

    /// Deliver one outgoing message from the host.
    ///
    /// Returns `Ok(None)` for content that is deliberately not bridged.
    ///
    /// # Errors
    ///
    /// See [`SendError`] for the failure taxonomy.
    pub async fn handle_matrix_message(
        &self,
        ctx: &ExecContext,
        msg: &OutgoingMessage,
    ) -> Result<Option<DeliveryRecord>, SendError> {
        self.pipeline.deliver(ctx, msg).await
    }

    /// Resolve a remote user identifier, optionally materializing the
    /// one-to-one chat with them.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidIdentifier`] when the identifier is not a
    /// remote numeric id.
    pub async fn resolve_identifier(
        &self,
        ctx: &ExecContext,
        identifier: &str,
        create_chat: bool,
    ) -> Result<ResolvedIdentifier, ClientError> {
        if ctx.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        let remote_id = parse_id(identifier)?;

        let chat = if create_chat {
            // One-to-one thread keys double as the counterpart's id.
            if let Err(err) =
                self.transport.execute_tasks(&[RemoteTask::create_thread_sync(remote_id)]).await
            {
                tracing::error!(
                    login = %self.login,
                    remote_id,
                    error = %err,
                    "Failed to request chat creation"
                );
            }
            Some(CreatedChat {
                portal_key: PortalKey {
                    id: make_portal_id(remote_id),
                    receiver: self.login.clone(),
                },
            })
        } else {
            None
        };

        Ok(ResolvedIdentifier { user_id: make_user_id(remote_id), user_info: None, chat })
    }

    /// Search for remote users matching `query`.
    ///
    /// Issues the primary search plus, shortly after, a best-effort shadow
    /// request whose response is discarded, mirroring the remote network's
    /// own client. Only messageable one-to-one results are returned.
    ///
    /// # Errors
    ///
    /// Propagates transport failures of the primary request.
    pub async fn search_users(
        &self,
        ctx: &ExecContext,
        query: &str,
    ) -> Result<Vec<ResolvedIdentifier>, ClientError> {
        let primary = self.search_task(query, false);
        let secondary = self.search_task(query, true);

        let transport = self.transport.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SECONDARY_SEARCH_DELAY).await;
            let result = transport.execute_tasks(&[secondary]).await;
            tracing::trace!(ok = result.is_ok(), "Shadow search request finished");
        });

        let primary_tasks = [primary];
        let response = tokio::select! {
            () = ctx.cancelled() => return Err(ClientError::Cancelled),
            result = self.transport.execute_tasks(&primary_tasks) => result?,
        };

        Ok(response
            .insert_search_result
            .iter()
            .filter(|row| {
                row.thread_kind == ThreadKind::OneToOne
                    && row.can_viewer_message
                    && row.result_id != 0
            })
            .map(|row| ResolvedIdentifier {
                user_id: make_user_id(row.result_id),
                user_info: Some(UserInfo {
                    name: (!row.display_name.is_empty()).then(|| row.display_name.clone()),
                }),
                chat: None,
            })
            .collect())
    }

    fn search_task(&self, query: &str, secondary: bool) -> RemoteTask {
        let mut supported_kinds = vec![
            SearchKind::Contact,
            SearchKind::Group,
            SearchKind::Page,
            SearchKind::NonContact,
            SearchKind::IgContactFollowing,
            SearchKind::IgContactNonFollowing,
            SearchKind::IgNonContactFollowing,
            SearchKind::IgNonContactNonFollowing,
        ];
        let mut surface_type = 15;
        if self.flavor.is_messenger() {
            surface_type = 5;
            supported_kinds.push(SearchKind::CommunityMessagingThread);
        }
        RemoteTask::SearchUser { query: query.to_string(), supported_kinds, surface_type, secondary }
    }
}
