//! Outbound delivery pipeline.
//!
//! Converts an accepted host message into remote send tasks, submits them
//! with bounded retries, and correlates the response table back to the send
//! through the offline threading id (OTID).

use std::sync::Arc;
use std::time::Duration;

use weft_core::{LoginId, MessageId, UserId, parse_id};
use weft_proto::Table;

use crate::bridge::{DeliveryRecord, MessageContent, OutgoingMessage};
use crate::context::ExecContext;
use crate::convert::{MessageConverter, new_otid};
use crate::error::{SendError, TransportError};
use crate::transport::Transport;

/// How many submission attempts a send gets before giving up.
const MAX_SEND_ATTEMPTS: u32 = 5;

/// How long each attempt waits for the transport to become sendable.
const SEND_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Delivers host messages to the remote network for one login.
pub struct DeliveryPipeline {
    login: LoginId,
    login_user: String,
    transport: Arc<dyn Transport>,
    converter: Arc<MessageConverter>,
}

impl DeliveryPipeline {
    /// Create a pipeline for the given login.
    ///
    /// `login_user` is the host-side user id the login belongs to; it is the
    /// only sender the pipeline accepts messages from.
    pub fn new(
        login: LoginId,
        login_user: String,
        transport: Arc<dyn Transport>,
        converter: Arc<MessageConverter>,
    ) -> Self {
        Self { login, login_user, transport, converter }
    }

    /// Deliver one outgoing message.
    ///
    /// Returns `Ok(None)` for content that is deliberately not bridged.
    /// Retries transport failures up to [`MAX_SEND_ATTEMPTS`] times, waiting
    /// up to [`SEND_READY_TIMEOUT`] for send readiness before each attempt.
    ///
    /// # Errors
    ///
    /// - [`SendError::RetriesExhausted`] when every attempt failed.
    /// - [`SendError::ServerRejected`] when the server refused the message.
    /// - [`SendError::SenderMismatch`] when the claimed sender is not the
    ///   active login.
    /// - [`SendError::Cancelled`] when the context was cancelled mid-send.
    pub async fn deliver(
        &self,
        ctx: &ExecContext,
        msg: &OutgoingMessage,
    ) -> Result<Option<DeliveryRecord>, SendError> {
        if let MessageContent::Notice { .. } = msg.content {
            tracing::warn!(event_id = %msg.event_id, "Dropping notice message");
            return Ok(None);
        }

        let thread_key = parse_id(msg.portal.id.as_str())?;
        let otid = new_otid();
        let tasks = self.converter.to_tasks(&msg.content, thread_key, otid)?;

        let response = self.submit_with_retries(ctx, thread_key, otid, &tasks).await?;
        let remote_message_id = classify_response(&response, &otid.to_string())?;

        if msg.sender != self.login_user {
            return Err(SendError::SenderMismatch { sender: msg.sender.clone() });
        }

        Ok(Some(DeliveryRecord {
            event_id: msg.event_id.clone(),
            portal: msg.portal.clone(),
            sender: UserId::from(self.login.as_str()),
            remote_message_id,
        }))
    }

    async fn submit_with_retries(
        &self,
        ctx: &ExecContext,
        thread_key: i64,
        otid: i64,
        tasks: &[weft_proto::RemoteTask],
    ) -> Result<Table, SendError> {
        let mut attempts: u32 = 0;
        let mut last = TransportError::NotReady;

        while attempts < MAX_SEND_ATTEMPTS {
            if ctx.is_cancelled() {
                return Err(SendError::Cancelled);
            }

            let ready = tokio::select! {
                () = ctx.cancelled() => return Err(SendError::Cancelled),
                result = self.transport.wait_until_can_send(SEND_READY_TIMEOUT) => result,
            };
            match ready {
                Ok(()) => match self.transport.execute_tasks(tasks).await {
                    Ok(table) => return Ok(table),
                    Err(err) => {
                        tracing::warn!(
                            thread_key,
                            otid,
                            attempt = attempts + 1,
                            error = %err,
                            "Message submission failed"
                        );
                        last = err;
                    },
                },
                Err(err) => {
                    tracing::warn!(
                        thread_key,
                        otid,
                        attempt = attempts + 1,
                        error = %err,
                        "Transport not ready to send"
                    );
                    last = err;
                },
            }
            attempts += 1;
        }

        Err(SendError::RetriesExhausted { attempts, last })
    }
}

/// Correlate a task response table with the send identified by `otid_str`.
///
/// A confirmation row yields the final message id. A rejection or failed-task
/// row yields a server rejection. A response with no correlated row at all is
/// logged as an anomaly and treated as a success without a message id.
pub(crate) fn classify_response(
    response: &Table,
    otid_str: &str,
) -> Result<Option<MessageId>, SendError> {
    for row in &response.replace_optimistic_message {
        if row.offline_threading_id == otid_str {
            return Ok(Some(MessageId(row.message_id.clone())));
        }
    }
    for row in &response.mark_optimistic_message_failed {
        if row.otid == otid_str {
            return Err(SendError::ServerRejected { message: row.message.clone() });
        }
    }
    for row in &response.handle_failed_task {
        if row.otid == otid_str {
            return Err(SendError::ServerRejected { message: row.message.clone() });
        }
    }
    tracing::warn!(otid = otid_str, "Send response carried no correlated row");
    Ok(None)
}
