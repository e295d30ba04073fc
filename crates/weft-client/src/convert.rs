//! Message conversion between the normalized and remote models.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::Rng;
use weft_core::{ConvertMessage, ConvertedMessage, MessageConvertError, MessagePart};
use weft_proto::{InsertMessage, PlatformFlavor, RemoteTask};

use crate::bridge::MessageContent;
use crate::error::ConvertError;

/// Sync group used for all message sends.
const SEND_SYNC_GROUP: i64 = 1;

/// Bits of entropy packed below the timestamp in an OTID.
const OTID_RANDOM_BITS: u32 = 22;

/// Allocate a fresh offline threading id.
///
/// The remote network's scheme: unix milliseconds shifted left, low bits
/// random. Uniqueness per login holds for the lifetime of one outstanding
/// send, which is all the correlation needs.
pub fn new_otid() -> i64 {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));
    let random: i64 = rand::thread_rng().gen_range(0..(1 << OTID_RANDOM_BITS));
    (now_ms << OTID_RANDOM_BITS) | random
}

/// Converts messages in both directions.
///
/// Outbound: normalized content into remote send tasks. Inbound: raw
/// message rows into their host-facing form, invoked lazily through the
/// [`ConvertMessage`] capability attached to message events.
#[derive(Debug, Clone)]
pub struct MessageConverter {
    /// Which deployment flavor the session talks to.
    pub flavor: PlatformFlavor,
}

impl MessageConverter {
    /// Create a converter for the given flavor.
    pub fn new(flavor: PlatformFlavor) -> Self {
        Self { flavor }
    }

    /// Build the remote tasks delivering `content` into `thread_key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UnsupportedContent`] for content the remote
    /// network cannot represent. Implementations backed by media uploads
    /// also surface [`ConvertError::ReloadRequired`] and
    /// [`ConvertError::CredentialsInvalidated`] from here; both are fatal
    /// for the send and handled by the session controller.
    pub fn to_tasks(
        &self,
        content: &MessageContent,
        thread_key: i64,
        otid: i64,
    ) -> Result<Vec<RemoteTask>, ConvertError> {
        match content {
            MessageContent::Text { body } => Ok(vec![RemoteTask::SendMessage {
                thread_key,
                otid,
                text: body.clone(),
                sync_group: SEND_SYNC_GROUP,
            }]),
            MessageContent::Notice { .. } => {
                Err(ConvertError::UnsupportedContent { kind: "notice".to_string() })
            },
            MessageContent::Unsupported { kind } => {
                Err(ConvertError::UnsupportedContent { kind: kind.clone() })
            },
        }
    }
}

#[async_trait]
impl ConvertMessage for MessageConverter {
    async fn convert(&self, raw: &InsertMessage) -> Result<ConvertedMessage, MessageConvertError> {
        if raw.text.is_empty() {
            return Err(MessageConvertError {
                reason: format!("message {} has no convertible content", raw.message_id),
            });
        }
        Ok(ConvertedMessage { parts: vec![MessagePart::Text { body: raw.text.clone() }] })
    }
}
