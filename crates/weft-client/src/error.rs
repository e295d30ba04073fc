//! Engine error types.

use thiserror::Error;
use weft_core::IdParseError;

/// Errors from the transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network I/O failed during a request.
    #[error("transport i/o failed: {reason}")]
    Io {
        /// Transport-provided failure description.
        reason: String,
    },

    /// The send-readiness wait timed out.
    #[error("timed out waiting for send readiness")]
    NotReady,

    /// The transport is not connected.
    #[error("transport is not connected")]
    NotConnected,
}

/// Errors reported by the host collaborator.
#[derive(Debug, Error)]
#[error("host operation failed: {reason}")]
pub struct HostError {
    /// Host-provided failure description.
    pub reason: String,
}

/// Errors during outbound message conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The server mandated a page reload before anything else can be sent.
    #[error("server requested a page reload")]
    ReloadRequired,

    /// The session credentials were invalidated.
    #[error("session credentials were invalidated")]
    CredentialsInvalidated,

    /// The content type cannot be represented on the remote network.
    #[error("unsupported content type: {kind}")]
    UnsupportedContent {
        /// The rejected content kind.
        kind: String,
    },
}

/// Errors from one outbound delivery.
#[derive(Debug, Error)]
pub enum SendError {
    /// Transient transport failure during a single attempt.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// All attempts failed; carries the last observed transport error.
    #[error("send failed after {attempts} attempts")]
    RetriesExhausted {
        /// How many attempts were made.
        attempts: u32,
        /// The last transport error observed.
        #[source]
        last: TransportError,
    },

    /// The server mandated a page reload during conversion.
    #[error("server requested a page reload")]
    ReloadRequired,

    /// The session credentials were invalidated during conversion.
    #[error("session credentials were invalidated")]
    CredentialsInvalidated,

    /// The server rejected the send with a correlated failure row.
    #[error("sending message failed: {message}")]
    ServerRejected {
        /// Server-provided rejection reason.
        message: String,
    },

    /// The content type cannot be sent to the remote network.
    #[error("unsupported content type: {kind}")]
    UnsupportedContent {
        /// The rejected content kind.
        kind: String,
    },

    /// The portal id could not be parsed into a remote thread key.
    #[error("failed to parse thread id")]
    InvalidPortalId(#[from] IdParseError),

    /// The event's claimed sender does not match the active login.
    #[error("sender mismatch with user login: {sender}")]
    SenderMismatch {
        /// The claimed sender.
        sender: String,
    },

    /// The caller cancelled the send.
    #[error("send was cancelled")]
    Cancelled,
}

impl SendError {
    /// Returns true if a single attempt with this error may be retried.
    ///
    /// Only transient transport failures are retryable; everything else is
    /// terminal for the send.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Returns true if the error signals a broken session that the session
    /// controller (not the delivery pipeline) must recover.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::ReloadRequired | Self::CredentialsInvalidated)
    }
}

impl From<ConvertError> for SendError {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::ReloadRequired => Self::ReloadRequired,
            ConvertError::CredentialsInvalidated => Self::CredentialsInvalidated,
            ConvertError::UnsupportedContent { kind } => Self::UnsupportedContent { kind },
        }
    }
}

/// Errors from session lifecycle operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session is already connected.
    #[error("session is already connected")]
    AlreadyConnected,

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The host rejected an operation, e.g. persisting refreshed
    /// credentials during connect.
    #[error(transparent)]
    Host(#[from] HostError),

    /// An identifier could not be parsed.
    #[error("failed to parse identifier")]
    InvalidIdentifier(#[from] IdParseError),

    /// The caller cancelled the operation.
    #[error("operation was cancelled")]
    Cancelled,
}
